use crate::buff::BuffEffect;
use crate::fixed::{Fixed64, Seconds};
use crate::id::*;
use crate::recipe::{self, IngredientCategory, IngredientCounts, RecipeDef};
use crate::shop::{UpgradeDef, UpgradeEffect};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// A discoverable spirit. Immutable; whether it has been found lives in the
/// session's progress record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpiritDef {
    pub name: String,
    /// Teas this spirit enjoys. A brewed tea rewards one of the unlocked
    /// spirits whose list contains it.
    pub favorite_recipes: Vec<RecipeId>,
    pub buff: BuffEffect,
    /// Whether a new session starts with this spirit already found.
    pub starts_unlocked: bool,
}

/// An exploration zone with a finite pool of spirits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneDef {
    pub name: String,
    pub spirits: Vec<SpiritId>,
    pub exploration_duration: Seconds,
    pub starts_unlocked: bool,
}

/// Errors detected while freezing the registry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("duplicate {kind} name: {name}")]
    DuplicateName { kind: &'static str, name: String },

    #[error("recipe '{0}' requires no ingredients")]
    EmptyRecipe(String),

    #[error("{kind} '{name}' has a zero duration")]
    ZeroDuration { kind: &'static str, name: String },

    #[error("spirit '{0}' has a non-positive buff multiplier")]
    InvalidMultiplier(String),

    #[error("invalid recipe reference {recipe:?} in spirit '{spirit}'")]
    InvalidRecipeRef { spirit: String, recipe: RecipeId },

    #[error("invalid spirit reference {spirit:?} in zone '{zone}'")]
    InvalidSpiritRef { zone: String, spirit: SpiritId },

    #[error("upgrade '{0}' has a zero cauldron divisor")]
    InvalidUpgrade(String),
}

/// Builder for constructing an immutable Registry.
/// Collects definitions, then validates and freezes them with [`RegistryBuilder::build`].
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    recipes: Vec<RecipeDef>,
    recipe_name_to_id: HashMap<String, RecipeId>,
    spirits: Vec<SpiritDef>,
    spirit_name_to_id: HashMap<String, SpiritId>,
    zones: Vec<ZoneDef>,
    zone_name_to_id: HashMap<String, ZoneId>,
    upgrades: Vec<UpgradeDef>,
    upgrade_name_to_id: HashMap<String, UpgradeId>,
    duplicates: Vec<(&'static str, String)>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a recipe. Registration order is match order.
    pub fn register_recipe(
        &mut self,
        name: &str,
        requires: IngredientCounts,
        brew_duration: Seconds,
    ) -> RecipeId {
        let id = RecipeId(self.recipes.len() as u32);
        self.recipes.push(RecipeDef {
            name: name.to_string(),
            requires,
            brew_duration,
        });
        if self.recipe_name_to_id.insert(name.to_string(), id).is_some() {
            self.duplicates.push(("recipe", name.to_string()));
        }
        id
    }

    /// Register a spirit. Returns its ID.
    pub fn register_spirit(
        &mut self,
        name: &str,
        favorite_recipes: Vec<RecipeId>,
        buff: BuffEffect,
        starts_unlocked: bool,
    ) -> SpiritId {
        let id = SpiritId(self.spirits.len() as u32);
        self.spirits.push(SpiritDef {
            name: name.to_string(),
            favorite_recipes,
            buff,
            starts_unlocked,
        });
        if self.spirit_name_to_id.insert(name.to_string(), id).is_some() {
            self.duplicates.push(("spirit", name.to_string()));
        }
        id
    }

    /// Register a zone. Its ID doubles as the UI zone index.
    pub fn register_zone(
        &mut self,
        name: &str,
        spirits: Vec<SpiritId>,
        exploration_duration: Seconds,
        starts_unlocked: bool,
    ) -> ZoneId {
        let id = ZoneId(self.zones.len() as u32);
        self.zones.push(ZoneDef {
            name: name.to_string(),
            spirits,
            exploration_duration,
            starts_unlocked,
        });
        if self.zone_name_to_id.insert(name.to_string(), id).is_some() {
            self.duplicates.push(("zone", name.to_string()));
        }
        id
    }

    /// Register a shop upgrade. Returns its ID.
    pub fn register_upgrade(&mut self, name: &str, cost: u64, effect: UpgradeEffect) -> UpgradeId {
        let id = UpgradeId(self.upgrades.len() as u32);
        self.upgrades.push(UpgradeDef {
            name: name.to_string(),
            cost,
            effect,
        });
        if self.upgrade_name_to_id.insert(name.to_string(), id).is_some() {
            self.duplicates.push(("upgrade", name.to_string()));
        }
        id
    }

    /// Validate cross-references and freeze.
    pub fn build(self) -> Result<Registry, RegistryError> {
        if let Some((kind, name)) = self.duplicates.into_iter().next() {
            return Err(RegistryError::DuplicateName { kind, name });
        }

        let mut seen_requirements: HashMap<IngredientCounts, &str> = HashMap::new();
        for recipe in &self.recipes {
            if recipe.requires.total() == 0 {
                return Err(RegistryError::EmptyRecipe(recipe.name.clone()));
            }
            if recipe.brew_duration <= Seconds::ZERO {
                return Err(RegistryError::ZeroDuration {
                    kind: "recipe",
                    name: recipe.name.clone(),
                });
            }
            if let Some(first) = seen_requirements.get(&recipe.requires) {
                tracing::warn!(
                    recipe = %recipe.name,
                    shadowed_by = %first,
                    "recipe has the same requirements as an earlier one and can never match"
                );
            } else {
                seen_requirements.insert(recipe.requires, &recipe.name);
            }
        }

        for spirit in &self.spirits {
            for &recipe in &spirit.favorite_recipes {
                if recipe.0 as usize >= self.recipes.len() {
                    return Err(RegistryError::InvalidRecipeRef {
                        spirit: spirit.name.clone(),
                        recipe,
                    });
                }
            }
            if spirit.buff.multiplier <= Fixed64::ZERO {
                return Err(RegistryError::InvalidMultiplier(spirit.name.clone()));
            }
            if spirit.buff.duration <= Seconds::ZERO {
                return Err(RegistryError::ZeroDuration {
                    kind: "buff",
                    name: spirit.name.clone(),
                });
            }
        }

        let mut placed: HashSet<SpiritId> = HashSet::new();
        for zone in &self.zones {
            for &spirit in &zone.spirits {
                if spirit.0 as usize >= self.spirits.len() {
                    return Err(RegistryError::InvalidSpiritRef {
                        zone: zone.name.clone(),
                        spirit,
                    });
                }
                placed.insert(spirit);
            }
            if zone.exploration_duration <= Seconds::ZERO {
                return Err(RegistryError::ZeroDuration {
                    kind: "zone",
                    name: zone.name.clone(),
                });
            }
        }
        for (idx, spirit) in self.spirits.iter().enumerate() {
            if !spirit.starts_unlocked && !placed.contains(&SpiritId(idx as u32)) {
                tracing::warn!(spirit = %spirit.name, "spirit is in no zone and can never be found");
            }
        }

        for upgrade in &self.upgrades {
            if upgrade.effect == UpgradeEffect::CauldronUpgrade(0) {
                return Err(RegistryError::InvalidUpgrade(upgrade.name.clone()));
            }
        }

        Ok(Registry {
            recipes: self.recipes,
            recipe_name_to_id: self.recipe_name_to_id,
            spirits: self.spirits,
            spirit_name_to_id: self.spirit_name_to_id,
            zones: self.zones,
            zone_name_to_id: self.zone_name_to_id,
            upgrades: self.upgrades,
            upgrade_name_to_id: self.upgrade_name_to_id,
        })
    }
}

/// Immutable content definitions. Frozen after build(). Thread-safe to share
/// between sessions.
#[derive(Debug)]
pub struct Registry {
    recipes: Vec<RecipeDef>,
    recipe_name_to_id: HashMap<String, RecipeId>,
    spirits: Vec<SpiritDef>,
    spirit_name_to_id: HashMap<String, SpiritId>,
    zones: Vec<ZoneDef>,
    zone_name_to_id: HashMap<String, ZoneId>,
    upgrades: Vec<UpgradeDef>,
    upgrade_name_to_id: HashMap<String, UpgradeId>,
}

impl Registry {
    // -- Recipes --

    pub fn recipe(&self, id: RecipeId) -> Option<&RecipeDef> {
        self.recipes.get(id.0 as usize)
    }

    pub fn recipe_id(&self, name: &str) -> Option<RecipeId> {
        self.recipe_name_to_id.get(name).copied()
    }

    /// All recipes in registration order.
    pub fn recipes(&self) -> &[RecipeDef] {
        &self.recipes
    }

    /// The recipe an unordered basket satisfies exactly, if any.
    pub fn find_recipe(&self, basket: &[IngredientCategory]) -> Option<RecipeId> {
        recipe::find_match(&self.recipes, basket)
    }

    // -- Spirits --

    pub fn spirit(&self, id: SpiritId) -> Option<&SpiritDef> {
        self.spirits.get(id.0 as usize)
    }

    pub fn spirit_id(&self, name: &str) -> Option<SpiritId> {
        self.spirit_name_to_id.get(name).copied()
    }

    pub fn spirits(&self) -> impl Iterator<Item = (SpiritId, &SpiritDef)> {
        self.spirits
            .iter()
            .enumerate()
            .map(|(i, s)| (SpiritId(i as u32), s))
    }

    pub fn spirit_count(&self) -> usize {
        self.spirits.len()
    }

    /// Spirits whose favorites include `recipe`, in registration order.
    pub fn spirits_liking(&self, recipe: RecipeId) -> impl Iterator<Item = SpiritId> + '_ {
        self.spirits()
            .filter(move |(_, s)| s.favorite_recipes.contains(&recipe))
            .map(|(id, _)| id)
    }

    // -- Zones --

    pub fn zone(&self, id: ZoneId) -> Option<&ZoneDef> {
        self.zones.get(id.0 as usize)
    }

    pub fn zone_id(&self, name: &str) -> Option<ZoneId> {
        self.zone_name_to_id.get(name).copied()
    }

    pub fn zones(&self) -> impl Iterator<Item = (ZoneId, &ZoneDef)> {
        self.zones
            .iter()
            .enumerate()
            .map(|(i, z)| (ZoneId(i as u32), z))
    }

    pub fn zone_count(&self) -> usize {
        self.zones.len()
    }

    // -- Upgrades --

    pub fn upgrade(&self, id: UpgradeId) -> Option<&UpgradeDef> {
        self.upgrades.get(id.0 as usize)
    }

    pub fn upgrade_id(&self, name: &str) -> Option<UpgradeId> {
        self.upgrade_name_to_id.get(name).copied()
    }

    pub fn upgrades(&self) -> impl Iterator<Item = (UpgradeId, &UpgradeDef)> {
        self.upgrades
            .iter()
            .enumerate()
            .map(|(i, u)| (UpgradeId(i as u32), u))
    }
}
