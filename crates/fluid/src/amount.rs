//! Fluid quantities.

use std::fmt;
use std::ops::{Add, Sub};

use serde::{Deserialize, Serialize};

use crate::key::FluidKey;

/// An amount of fluid in millibuckets.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct FluidAmount(u64);

impl FluidAmount {
    /// No fluid.
    pub const ZERO: Self = Self(0);
    /// One bucket (1000 millibuckets).
    pub const BUCKET: Self = Self(1000);
    /// One ingot's worth of molten metal (a ninth of a bucket, rounded down).
    pub const INGOT: Self = Self(111);

    /// An amount of `millibuckets`.
    pub const fn from_millibuckets(millibuckets: u64) -> Self {
        Self(millibuckets)
    }

    /// `count` whole buckets.
    pub const fn buckets(count: u64) -> Self {
        Self(count * Self::BUCKET.0)
    }

    /// The amount in millibuckets.
    pub const fn as_millibuckets(self) -> u64 {
        self.0
    }

    /// Returns true for [`FluidAmount::ZERO`].
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Subtract, stopping at zero.
    pub const fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }

    /// Add, returning `None` on overflow.
    pub const fn checked_add(self, other: Self) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(sum) => Some(Self(sum)),
            None => None,
        }
    }
}

impl Add for FluidAmount {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sub for FluidAmount {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl fmt::Display for FluidAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} mB", self.0)
    }
}

/// A quantity of one fluid.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FluidVolume {
    key: FluidKey,
    amount: FluidAmount,
}

impl FluidVolume {
    /// `amount` of the fluid identified by `key`.
    pub fn new(key: FluidKey, amount: FluidAmount) -> Self {
        Self { key, amount }
    }

    /// Identity of the fluid.
    pub fn key(&self) -> &FluidKey {
        &self.key
    }

    /// Quantity held.
    pub fn amount(&self) -> FluidAmount {
        self.amount
    }

    /// Whether the volume holds nothing, either by amount or by identity.
    pub fn is_empty(&self) -> bool {
        self.amount.is_zero() || self.key.is_empty()
    }

    /// Whether `other` holds the same fluid.
    pub fn can_merge(&self, other: &FluidVolume) -> bool {
        self.key == other.key
    }

    /// Split off up to `amount` into a new volume.
    ///
    /// Returns `None` when nothing can be taken.
    pub fn split(&mut self, amount: FluidAmount) -> Option<FluidVolume> {
        let taken = amount.min(self.amount);
        if taken.is_zero() {
            return None;
        }
        self.amount = self.amount - taken;
        Some(FluidVolume {
            key: self.key.clone(),
            amount: taken,
        })
    }
}

impl fmt::Display for FluidVolume {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.amount, self.key)
    }
}
