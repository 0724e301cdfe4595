//! The cauldron: a bounded ingredient basket and a timed brewing process.
//!
//! ```text
//! Idle --start_brew--> Brewing --tick--> Resolved --resolve--> Idle
//!                         |
//!                         +--cancel_brew--> Idle (basket refunded)
//! ```
//!
//! The recipe is matched when brewing starts, not when it finishes. A basket
//! that matches nothing is refunded immediately and the cauldron stays idle.

use crate::error::ActionError;
use crate::fixed::{Fixed64, Seconds, clamp_non_negative, round_to_u64};
use crate::id::{RecipeId, SpiritId};
use crate::progress::Progress;
use crate::recipe::IngredientCategory;
use crate::registry::Registry;
use crate::resource::{Ledger, ResourceKind};
use rand::Rng;
use rand::seq::SliceRandom;

/// Default basket size.
pub const DEFAULT_BASKET_CAPACITY: usize = 6;

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BrewState {
    #[default]
    Idle,
    Brewing {
        recipe: RecipeId,
        remaining: Seconds,
    },
    /// Countdown finished; waiting for [`Brewer::resolve`].
    Resolved { recipe: RecipeId },
}

impl BrewState {
    pub fn name(&self) -> &'static str {
        match self {
            BrewState::Idle => "idle",
            BrewState::Brewing { .. } => "brewing",
            BrewState::Resolved { .. } => "resolving",
        }
    }
}

/// How a finished brew turned out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrewOutcome {
    /// An unlocked spirit enjoyed the tea. The reward has been credited; the
    /// caller activates the spirit's buff.
    Rewarded {
        recipe: RecipeId,
        spirit: SpiritId,
        reward: u64,
    },
    /// No unlocked spirit likes this tea. The basket was refunded.
    NothingNewFound {
        recipe: RecipeId,
        refunded: Vec<IngredientCategory>,
    },
}

// ---------------------------------------------------------------------------
// Brewer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Brewer {
    basket: Vec<IngredientCategory>,
    capacity: usize,
    state: BrewState,
}

impl Default for Brewer {
    fn default() -> Self {
        Self::new(DEFAULT_BASKET_CAPACITY)
    }
}

impl Brewer {
    pub fn new(capacity: usize) -> Self {
        Self {
            basket: Vec::with_capacity(capacity),
            capacity,
            state: BrewState::Idle,
        }
    }

    // -- Queries --

    pub fn basket(&self) -> &[IngredientCategory] {
        &self.basket
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn state(&self) -> BrewState {
        self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == BrewState::Idle
    }

    /// Seconds until the current brew finishes; zero unless brewing.
    pub fn time_left(&self) -> Seconds {
        match self.state {
            BrewState::Brewing { remaining, .. } => remaining,
            _ => Seconds::ZERO,
        }
    }

    // -- Commands --

    /// Spend one unit of `ingredient` and put it in the basket.
    pub fn add_ingredient(
        &mut self,
        ingredient: IngredientCategory,
        ledger: &mut Ledger,
        buff_active: bool,
    ) -> Result<(), ActionError> {
        self.require_idle("add ingredients")?;
        if buff_active {
            return Err(ActionError::BuffActive);
        }
        let kind = ingredient.resource();
        if !ledger.can_afford(kind, 1) {
            return Err(ActionError::InsufficientResource {
                resource: kind,
                needed: 1,
                available: ledger.get(kind),
            });
        }
        if self.basket.len() >= self.capacity {
            return Err(ActionError::BasketFull {
                capacity: self.capacity,
            });
        }
        ledger.spend(kind, 1)?;
        self.basket.push(ingredient);
        Ok(())
    }

    /// Match the basket and start the countdown. Returns the recipe and its
    /// effective duration after dividing by `speed`.
    ///
    /// With no match the basket is refunded and emptied, and the refunded
    /// ingredients are reported in [`ActionError::NoMatch`].
    pub fn start_brew(
        &mut self,
        registry: &Registry,
        speed: u32,
        ledger: &mut Ledger,
        buff_active: bool,
    ) -> Result<(RecipeId, Seconds), ActionError> {
        self.require_idle("start brewing")?;
        if buff_active {
            return Err(ActionError::BuffActive);
        }
        if self.basket.is_empty() {
            return Err(ActionError::EmptyBasket);
        }

        let matched = registry
            .find_recipe(&self.basket)
            .and_then(|id| registry.recipe(id).map(|def| (id, def)));
        let Some((recipe, def)) = matched else {
            let refunded = self.refund_basket(ledger);
            tracing::debug!(ingredients = refunded.len(), "no recipe matched, basket refunded");
            return Err(ActionError::NoMatch { refunded });
        };

        let duration = def.brew_duration / Fixed64::from_num(speed.max(1));
        self.state = BrewState::Brewing {
            recipe,
            remaining: duration,
        };
        tracing::debug!(recipe = %def.name, duration = %duration, "brew started");
        Ok((recipe, duration))
    }

    /// Run the countdown by `dt`. Returns the recipe when it finishes.
    pub fn tick(&mut self, dt: Seconds) -> Option<RecipeId> {
        let BrewState::Brewing { recipe, remaining } = self.state else {
            return None;
        };
        let remaining = clamp_non_negative(remaining - dt);
        if remaining == Seconds::ZERO {
            self.state = BrewState::Resolved { recipe };
            Some(recipe)
        } else {
            self.state = BrewState::Brewing { recipe, remaining };
            None
        }
    }

    /// Settle a finished brew and return to idle.
    ///
    /// One unlocked spirit that likes the recipe is picked uniformly at
    /// random and `round(base_reward * multiplier)` droplets are credited.
    /// If no unlocked spirit likes it the basket is refunded instead.
    pub fn resolve(
        &mut self,
        registry: &Registry,
        progress: &Progress,
        ledger: &mut Ledger,
        base_reward: u64,
        rng: &mut impl Rng,
    ) -> Result<BrewOutcome, ActionError> {
        let BrewState::Resolved { recipe } = self.state else {
            return Err(ActionError::InvalidTransition {
                action: "resolve a brew",
                state: self.state.name(),
            });
        };
        self.state = BrewState::Idle;

        let candidates: Vec<SpiritId> = registry
            .spirits_liking(recipe)
            .filter(|s| progress.is_spirit_unlocked(*s))
            .collect();

        let chosen = candidates
            .choose(rng)
            .copied()
            .and_then(|id| registry.spirit(id).map(|def| (id, def)));

        let Some((spirit, def)) = chosen else {
            let refunded = self.refund_basket(ledger);
            tracing::debug!(recipe = recipe.0, "nobody likes this tea, basket refunded");
            return Ok(BrewOutcome::NothingNewFound { recipe, refunded });
        };

        let reward = round_to_u64(
            Fixed64::saturating_from_num(base_reward).saturating_mul(def.buff.multiplier),
        );
        ledger.credit(ResourceKind::Droplets, reward);
        self.basket.clear();
        tracing::debug!(recipe = recipe.0, spirit = %def.name, reward, "brew resolved");

        Ok(BrewOutcome::Rewarded {
            recipe,
            spirit,
            reward,
        })
    }

    /// Stop a running brew and refund its basket.
    pub fn cancel_brew(&mut self, ledger: &mut Ledger) -> Result<Vec<IngredientCategory>, ActionError> {
        if !matches!(self.state, BrewState::Brewing { .. }) {
            return Err(ActionError::InvalidTransition {
                action: "cancel brewing",
                state: self.state.name(),
            });
        }
        self.state = BrewState::Idle;
        let refunded = self.refund_basket(ledger);
        tracing::debug!(ingredients = refunded.len(), "brew cancelled");
        Ok(refunded)
    }

    /// Return every basket ingredient to the ledger. Only while idle.
    pub fn clear_basket(&mut self, ledger: &mut Ledger) -> Result<Vec<IngredientCategory>, ActionError> {
        self.require_idle("clear the basket")?;
        Ok(self.refund_basket(ledger))
    }

    fn require_idle(&self, action: &'static str) -> Result<(), ActionError> {
        if self.is_idle() {
            Ok(())
        } else {
            Err(ActionError::InvalidTransition {
                action,
                state: self.state.name(),
            })
        }
    }

    fn refund_basket(&mut self, ledger: &mut Ledger) -> Vec<IngredientCategory> {
        let refunded = std::mem::take(&mut self.basket);
        for &ingredient in &refunded {
            ledger.refund(ingredient.resource(), 1);
        }
        refunded
    }
}
