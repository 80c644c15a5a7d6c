use anyhow::{Context, Result};
use mdattrs_item::{ItemId, DEFAULT_STACK_SIZE};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

/// Containers to combine, in the order they appear in the file.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub inventory: Vec<InventoryConfig>,
    pub tank: Vec<TankConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InventoryConfig {
    pub name: String,
    pub slots: usize,
    #[serde(default = "default_max_stack")]
    pub max_stack: u8,
    /// Item ids accepted by every slot; empty accepts anything.
    #[serde(default)]
    pub allow: Vec<ItemId>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TankConfig {
    pub name: String,
    pub tanks: usize,
    /// Capacity of each tank in millibuckets.
    pub capacity: u64,
    /// Fluid identifiers accepted by every tank; empty accepts anything.
    #[serde(default)]
    pub fluids: Vec<String>,
}

fn default_max_stack() -> u8 {
    DEFAULT_STACK_SIZE
}

impl LayoutConfig {
    /// Load a layout from an explicit path.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read layout {}", path.display()))?;
        Self::from_toml(&contents)
            .with_context(|| format!("failed to parse layout {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }
}
