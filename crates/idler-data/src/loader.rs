//! Resolution pipeline: reads data files, resolves cross-references, builds registry.
//!
//! Provides format detection (RON/JSON/TOML), file discovery, and deserialization
//! helpers used by [`load_game_data`].

use idler_core::config::SessionConfig;
use idler_core::buff::BuffEffect;
use idler_core::fixed::{Fixed64, Seconds};
use idler_core::id::{RecipeId, SpiritId};
use idler_core::recipe::IngredientCounts;
use idler_core::registry::{Registry, RegistryBuilder, RegistryError};
use serde::de::DeserializeOwned;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use crate::schema::*;

// ===========================================================================
// Errors
// ===========================================================================

/// Errors that can occur during data loading.
#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    /// A required data file was not found in the given directory.
    #[error("required file '{file}' not found in {dir}")]
    MissingRequired { file: String, dir: PathBuf },

    /// The file has an extension we don't support.
    #[error("unsupported format for file: {file}")]
    UnsupportedFormat { file: PathBuf },

    /// Two files with the same base name but different formats exist.
    #[error("conflicting formats: {a} and {b}")]
    ConflictingFormats { a: PathBuf, b: PathBuf },

    /// A deserialization error occurred.
    #[error("parse error in {file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    /// A name reference could not be resolved.
    #[error("unresolved {expected_kind} reference '{name}' in {file}")]
    UnresolvedRef {
        file: PathBuf,
        name: String,
        expected_kind: &'static str,
    },

    /// A duplicate name was found.
    #[error("duplicate name '{name}' in {file}")]
    DuplicateName { file: PathBuf, name: String },

    /// A number is NaN, infinite, or out of fixed-point range.
    #[error("invalid {field} {value} for '{name}' in {file}")]
    InvalidNumber {
        file: PathBuf,
        name: String,
        field: &'static str,
        value: f64,
    },

    /// The resolved definitions failed registry validation.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ===========================================================================
// Format detection
// ===========================================================================

/// Supported data file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ron,
    Toml,
    Json,
}

/// Detect the format of a file based on its extension.
pub fn detect_format(path: &Path) -> Result<Format, DataLoadError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("ron") => Ok(Format::Ron),
        Some("toml") => Ok(Format::Toml),
        Some("json") => Ok(Format::Json),
        _ => Err(DataLoadError::UnsupportedFormat {
            file: path.to_path_buf(),
        }),
    }
}

// ===========================================================================
// File discovery
// ===========================================================================

/// Scan a directory for a data file with the given base name (without extension).
///
/// Looks for `{base_name}.ron`, `{base_name}.toml`, and `{base_name}.json`.
/// Returns `Ok(None)` if no file is found, or `Err(ConflictingFormats)` if
/// multiple formats exist for the same base name.
pub fn find_data_file(dir: &Path, base_name: &str) -> Result<Option<PathBuf>, DataLoadError> {
    let mut found: Option<PathBuf> = None;

    for ext in ["ron", "toml", "json"] {
        let candidate = dir.join(format!("{base_name}.{ext}"));
        if candidate.exists() {
            if let Some(ref existing) = found {
                return Err(DataLoadError::ConflictingFormats {
                    a: existing.clone(),
                    b: candidate,
                });
            }
            found = Some(candidate);
        }
    }

    Ok(found)
}

/// Like [`find_data_file`], but returns an error if no file is found.
pub fn require_data_file(dir: &Path, base_name: &str) -> Result<PathBuf, DataLoadError> {
    find_data_file(dir, base_name)?.ok_or_else(|| DataLoadError::MissingRequired {
        file: base_name.to_string(),
        dir: dir.to_path_buf(),
    })
}

// ===========================================================================
// Deserialization
// ===========================================================================

fn parse_error(path: &Path, e: impl std::fmt::Display) -> DataLoadError {
    DataLoadError::Parse {
        file: path.to_path_buf(),
        detail: e.to_string(),
    }
}

/// Read a file and deserialize it according to its format (detected from extension).
pub fn deserialize_file<T: DeserializeOwned>(path: &Path) -> Result<T, DataLoadError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;

    match format {
        Format::Ron => ron::from_str(&content).map_err(|e| parse_error(path, e)),
        Format::Json => serde_json::from_str(&content).map_err(|e| parse_error(path, e)),
        Format::Toml => toml::from_str(&content).map_err(|e| parse_error(path, e)),
    }
}

/// Deserialize a list from a file. For TOML files, extracts the array at the
/// given `toml_key` from a top-level table. For RON and JSON, deserializes
/// directly as `Vec<T>`.
pub fn deserialize_list<T: DeserializeOwned>(
    path: &Path,
    toml_key: &str,
) -> Result<Vec<T>, DataLoadError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;

    match format {
        Format::Ron => ron::from_str(&content).map_err(|e| parse_error(path, e)),
        Format::Json => serde_json::from_str(&content).map_err(|e| parse_error(path, e)),
        Format::Toml => {
            let table: toml::Value = toml::from_str(&content).map_err(|e| parse_error(path, e))?;
            let array = table
                .get(toml_key)
                .ok_or_else(|| parse_error(path, format!("missing key '{toml_key}' in TOML file")))?
                .clone();
            array
                .try_into()
                .map_err(|e: toml::de::Error| parse_error(path, e))
        }
    }
}

// ===========================================================================
// Name resolution helpers
// ===========================================================================

/// Look up a name in a map, returning an `UnresolvedRef` error if not found.
pub fn resolve_name<'a, V>(
    map: &'a HashMap<String, V>,
    name: &str,
    file: &Path,
    expected_kind: &'static str,
) -> Result<&'a V, DataLoadError> {
    map.get(name).ok_or_else(|| DataLoadError::UnresolvedRef {
        file: file.to_path_buf(),
        name: name.to_string(),
        expected_kind,
    })
}

/// Return a `DuplicateName` error if `contains` reports the name as taken.
pub fn check_duplicate(
    contains: impl FnOnce(&str) -> bool,
    name: &str,
    file: &Path,
) -> Result<(), DataLoadError> {
    if contains(name) {
        Err(DataLoadError::DuplicateName {
            file: file.to_path_buf(),
            name: name.to_string(),
        })
    } else {
        Ok(())
    }
}

fn to_fixed(
    value: f64,
    file: &Path,
    name: &str,
    field: &'static str,
) -> Result<Fixed64, DataLoadError> {
    Fixed64::checked_from_num(value)
        .filter(|_| value.is_finite())
        .ok_or_else(|| DataLoadError::InvalidNumber {
            file: file.to_path_buf(),
            name: name.to_string(),
            field,
            value,
        })
}

// ===========================================================================
// Loading pipeline
// ===========================================================================

/// Everything a session needs, loaded from one data directory.
#[derive(Debug)]
pub struct GameData {
    pub registry: Registry,
    pub config: SessionConfig,
}

/// Load a data directory.
///
/// Required files: `recipes`, `spirits`, `zones`. Optional: `upgrades`,
/// `config`. Each may be `.ron`, `.toml` or `.json`; TOML lists live under a
/// key named after the file.
pub fn load_game_data(dir: &Path) -> Result<GameData, DataLoadError> {
    let mut builder = RegistryBuilder::new();

    // Recipes. Registration order is match order.
    let recipes_path = require_data_file(dir, "recipes")?;
    let recipes: Vec<RecipeData> = deserialize_list(&recipes_path, "recipes")?;
    let mut recipe_ids: HashMap<String, RecipeId> = HashMap::new();
    for r in &recipes {
        check_duplicate(|n| recipe_ids.contains_key(n), &r.name, &recipes_path)?;
        let duration = to_fixed(r.brew_seconds, &recipes_path, &r.name, "brew_seconds")?;
        let id = builder.register_recipe(
            &r.name,
            IngredientCounts::new(r.leaf, r.berry, r.flower),
            duration,
        );
        recipe_ids.insert(r.name.clone(), id);
    }

    // Spirits.
    let spirits_path = require_data_file(dir, "spirits")?;
    let spirits: Vec<SpiritData> = deserialize_list(&spirits_path, "spirits")?;
    let mut spirit_ids: HashMap<String, SpiritId> = HashMap::new();
    for s in &spirits {
        check_duplicate(|n| spirit_ids.contains_key(n), &s.name, &spirits_path)?;
        let favorites = s
            .favorites
            .iter()
            .map(|name| resolve_name(&recipe_ids, name, &spirits_path, "recipe").copied())
            .collect::<Result<Vec<_>, _>>()?;
        let buff = BuffEffect {
            target: s.buff.target,
            multiplier: to_fixed(s.buff.multiplier, &spirits_path, &s.name, "multiplier")?,
            duration: to_fixed(s.buff.seconds, &spirits_path, &s.name, "buff seconds")?,
        };
        let id = builder.register_spirit(&s.name, favorites, buff, s.starts_unlocked);
        spirit_ids.insert(s.name.clone(), id);
    }

    // Zones.
    let zones_path = require_data_file(dir, "zones")?;
    let zones: Vec<ZoneData> = deserialize_list(&zones_path, "zones")?;
    let mut zone_names: HashSet<String> = HashSet::new();
    for z in &zones {
        check_duplicate(|n| zone_names.contains(n), &z.name, &zones_path)?;
        let members = z
            .spirits
            .iter()
            .map(|name| resolve_name(&spirit_ids, name, &zones_path, "spirit").copied())
            .collect::<Result<Vec<_>, _>>()?;
        let duration: Seconds =
            to_fixed(z.explore_seconds, &zones_path, &z.name, "explore_seconds")?;
        builder.register_zone(&z.name, members, duration, z.starts_unlocked);
        zone_names.insert(z.name.clone());
    }

    // Upgrades (optional).
    let mut upgrade_count = 0;
    if let Some(upgrades_path) = find_data_file(dir, "upgrades")? {
        let upgrades: Vec<UpgradeData> = deserialize_list(&upgrades_path, "upgrades")?;
        let mut upgrade_names: HashSet<String> = HashSet::new();
        for u in &upgrades {
            check_duplicate(|n| upgrade_names.contains(n), &u.name, &upgrades_path)?;
            builder.register_upgrade(&u.name, u.cost, u.effect);
            upgrade_names.insert(u.name.clone());
        }
        upgrade_count = upgrades.len();
    }

    let registry = builder.build()?;

    // Session tuning (optional).
    let config = match find_data_file(dir, "config")? {
        Some(config_path) => {
            let data: ConfigData = deserialize_file(&config_path)?;
            apply_config(data, &config_path)?
        }
        None => SessionConfig::default(),
    };

    tracing::info!(
        dir = %dir.display(),
        recipes = recipes.len(),
        spirits = spirits.len(),
        zones = zones.len(),
        upgrades = upgrade_count,
        "loaded game data"
    );

    Ok(GameData { registry, config })
}

fn apply_config(data: ConfigData, file: &Path) -> Result<SessionConfig, DataLoadError> {
    let mut config = SessionConfig::default();
    for (kind, range) in data.drop_ranges {
        if range.min > range.max {
            return Err(parse_error(
                file,
                format!("drop range for {} has min > max", kind.name()),
            ));
        }
        config.drop_ranges[kind] = range;
    }
    for (kind, amount) in data.starting_resources {
        config.starting_resources[kind] = amount;
    }
    if let Some(capacity) = data.basket_capacity {
        config.basket_capacity = capacity;
    }
    if let Some(reward) = data.base_reward {
        config.base_reward = reward;
    }
    if let Some(interval) = data.helper_interval_seconds {
        let interval = to_fixed(interval, file, "config", "helper_interval_seconds")?;
        if interval <= Seconds::ZERO {
            return Err(parse_error(file, "helper_interval_seconds must be positive"));
        }
        config.helper_interval = interval;
    }
    if let Some(capacity) = data.event_capacity {
        config.event_capacity = capacity;
    }
    Ok(config)
}

// ===========================================================================
// Tests
// ===========================================================================
