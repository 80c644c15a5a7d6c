//! mdattrs - inspect combined item and fluid container layouts
//!
//! `slots` prints the global slot map of a TOML layout; `fluid-key` shows how
//! a registry identity is persisted and sent over the wire.

mod config;
mod layout;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use config::LayoutConfig;
use layout::Layout;
use mdattrs_core::entry::registry_from_code;
use mdattrs_core::{FixedSlotView, Identifier, PacketWriter, RegistryEntry};
use mdattrs_fluid::builtin_registries;
use serde_json::{json, Map};
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about = "Fixed-slot container inspection for mdattrs", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the global slot map of a container layout as JSON
    Slots {
        /// TOML layout file listing inventories and tanks
        #[arg(short, long)]
        layout: PathBuf,
    },
    /// Print the persisted tag and wire bytes of a registry identity
    FluidKey {
        /// Registry code (`f`, `p`) or full registry identifier
        registry: String,
        /// Object identifier, e.g. `mdm:water`
        id: String,
    },
}

fn main() -> Result<()> {
    // Initialize tracing with WARN level by default (can be overridden via RUST_LOG env var)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let args = Args::parse();
    match args.command {
        Command::Slots { layout } => print_slots(&layout),
        Command::FluidKey { registry, id } => print_fluid_key(&registry, &id),
    }
}

fn print_slots(path: &Path) -> Result<()> {
    let registries = builtin_registries().context("failed to build built-in registries")?;
    let config = LayoutConfig::load_from_path(path)?;
    let layout = Layout::build(&config, &registries)?;
    info!(
        item_slots = layout.items().slot_count(),
        tanks = layout.fluids().slot_count(),
        "loaded layout from {}",
        path.display()
    );
    let json = serde_json::to_string_pretty(&layout.slot_map())?;
    println!("{json}");
    Ok(())
}

fn print_fluid_key(registry: &str, id: &str) -> Result<()> {
    let registries = builtin_registries().context("failed to build built-in registries")?;
    let view = registry_from_code(registry, registries.root())
        .with_context(|| format!("unknown registry {registry:?}"))?;
    let id = Identifier::parse(id).with_context(|| format!("invalid identifier {id:?}"))?;
    let entry = RegistryEntry::from_id(view, id)?;

    let mut tag = Map::new();
    entry.to_tag(&mut tag);
    let mut wire = PacketWriter::new();
    entry.to_wire(&mut wire)?;
    let hex: String = wire
        .as_bytes()
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect();

    let report = json!({
        "entry": format!("{entry:?}"),
        "empty": entry.is_empty(),
        "stable_hash": format!("{:016x}", entry.stable_hash()),
        "tag": tag,
        "wire": hex,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
