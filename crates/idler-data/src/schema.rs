//! Serde data file structs for game content definitions.
//!
//! These structs define the on-disk format for recipes, spirits, zones,
//! upgrades and session tuning. They are deserialized from RON, JSON, or TOML
//! data files and then resolved into core types by the loader. TOML lists
//! sit under a key named after the file. Cross references are by name;
//! times are plain seconds.

use idler_core::buff::BuffTarget;
use idler_core::resource::{DropRange, ResourceKind};
use idler_core::shop::UpgradeEffect;
use serde::Deserialize;
use std::collections::BTreeMap;

// ===========================================================================
// Recipes
// ===========================================================================

/// A tea recipe. Missing ingredient counts default to 0.
#[derive(Debug, Clone, Deserialize)]
pub struct RecipeData {
    pub name: String,
    #[serde(default)]
    pub leaf: u32,
    #[serde(default)]
    pub berry: u32,
    #[serde(default)]
    pub flower: u32,
    pub brew_seconds: f64,
}

// ===========================================================================
// Spirits
// ===========================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct BuffData {
    pub target: BuffTarget,
    pub multiplier: f64,
    pub seconds: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpiritData {
    pub name: String,
    /// Recipe names.
    #[serde(default)]
    pub favorites: Vec<String>,
    pub buff: BuffData,
    #[serde(default)]
    pub starts_unlocked: bool,
}

// ===========================================================================
// Zones
// ===========================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct ZoneData {
    pub name: String,
    /// Spirit names.
    pub spirits: Vec<String>,
    pub explore_seconds: f64,
    #[serde(default)]
    pub starts_unlocked: bool,
}

// ===========================================================================
// Upgrades
// ===========================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct UpgradeData {
    pub name: String,
    pub cost: u64,
    pub effect: UpgradeEffect,
}

// ===========================================================================
// Session tuning
// ===========================================================================

/// Overrides applied on top of `SessionConfig::default()`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ConfigData {
    pub drop_ranges: BTreeMap<ResourceKind, DropRange>,
    pub basket_capacity: Option<usize>,
    pub base_reward: Option<u64>,
    pub helper_interval_seconds: Option<f64>,
    pub starting_resources: BTreeMap<ResourceKind, u64>,
    pub event_capacity: Option<usize>,
}
