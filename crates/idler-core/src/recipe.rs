//! Ingredient categories, recipe definitions, and the exact-match recipe
//! matcher.

use crate::fixed::Seconds;
use crate::id::RecipeId;
use crate::resource::ResourceKind;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Ingredients
// ---------------------------------------------------------------------------

/// An ingredient that can go into the basket. Each maps to one resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IngredientCategory {
    Leaf,
    Berry,
    Flower,
}

impl IngredientCategory {
    pub const ALL: [IngredientCategory; 3] = [
        IngredientCategory::Leaf,
        IngredientCategory::Berry,
        IngredientCategory::Flower,
    ];

    /// The ledger counter this ingredient is drawn from.
    pub fn resource(self) -> ResourceKind {
        match self {
            IngredientCategory::Leaf => ResourceKind::Leaves,
            IngredientCategory::Berry => ResourceKind::Berries,
            IngredientCategory::Flower => ResourceKind::Flowers,
        }
    }
}

impl fmt::Display for IngredientCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            IngredientCategory::Leaf => "leaf",
            IngredientCategory::Berry => "berry",
            IngredientCategory::Flower => "flower",
        })
    }
}

/// Per-category ingredient counts. Used both as a recipe requirement and as
/// the tally of a basket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct IngredientCounts {
    #[serde(default)]
    pub leaf: u32,
    #[serde(default)]
    pub berry: u32,
    #[serde(default)]
    pub flower: u32,
}

impl IngredientCounts {
    pub const fn new(leaf: u32, berry: u32, flower: u32) -> Self {
        Self {
            leaf,
            berry,
            flower,
        }
    }

    /// Count each category in an unordered basket.
    pub fn tally(basket: &[IngredientCategory]) -> Self {
        let mut counts = Self::default();
        for &ingredient in basket {
            *counts.get_mut(ingredient) += 1;
        }
        counts
    }

    pub fn get(&self, category: IngredientCategory) -> u32 {
        match category {
            IngredientCategory::Leaf => self.leaf,
            IngredientCategory::Berry => self.berry,
            IngredientCategory::Flower => self.flower,
        }
    }

    fn get_mut(&mut self, category: IngredientCategory) -> &mut u32 {
        match category {
            IngredientCategory::Leaf => &mut self.leaf,
            IngredientCategory::Berry => &mut self.berry,
            IngredientCategory::Flower => &mut self.flower,
        }
    }

    pub fn total(&self) -> u32 {
        self.leaf + self.berry + self.flower
    }
}

// ---------------------------------------------------------------------------
// Recipes
// ---------------------------------------------------------------------------

/// A tea recipe. Immutable once registered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeDef {
    /// Name of the tea this recipe brews.
    pub name: String,
    /// Exact per-category counts a basket must hold.
    pub requires: IngredientCounts,
    /// Base brewing time before cauldron upgrades.
    pub brew_duration: Seconds,
}

impl RecipeDef {
    /// Exact match: every category count equals the requirement.
    pub fn matches(&self, tally: &IngredientCounts) -> bool {
        self.requires == *tally
    }
}

/// Scan `recipes` in registration order and return the first whose
/// requirement equals the basket tally exactly.
pub fn find_match(recipes: &[RecipeDef], basket: &[IngredientCategory]) -> Option<RecipeId> {
    let tally = IngredientCounts::tally(basket);
    recipes
        .iter()
        .position(|recipe| recipe.matches(&tally))
        .map(|idx| RecipeId(idx as u32))
}
