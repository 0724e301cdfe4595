//! Shop upgrades bought with droplets.
//!
//! One-shot upgrades are recorded as purchased in [`Progress`]. Helpers are
//! repeatable: each purchase adds a helper and doubles that upgrade's price.

use crate::error::ActionError;
use crate::id::UpgradeId;
use crate::progress::Progress;
use crate::registry::Registry;
use crate::resource::{Ledger, ResourceKind};
use serde::{Deserialize, Serialize};

/// What buying an upgrade does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpgradeEffect {
    /// Raise the droplet baseline multiplier.
    DropletMultiplier(u32),
    /// Raise the leaf, berry and flower baseline multipliers.
    IngredientBoost(u32),
    /// One more helper producing passive income.
    Helper,
    /// Divide every brew duration by this factor.
    CauldronUpgrade(u32),
}

impl UpgradeEffect {
    pub fn is_repeatable(self) -> bool {
        matches!(self, UpgradeEffect::Helper)
    }
}

/// A shop item. Immutable once registered; the current price of repeatable
/// items lives in [`Progress`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpgradeDef {
    pub name: String,
    /// Base price in droplets.
    pub cost: u64,
    pub effect: UpgradeEffect,
}

/// A successful purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Purchase {
    pub upgrade: UpgradeId,
    pub paid: u64,
    /// Price of the next purchase for repeatable upgrades.
    pub next_cost: Option<u64>,
}

/// Current price of `id`, accounting for repeat purchases.
pub fn current_cost(registry: &Registry, progress: &Progress, id: UpgradeId) -> Option<u64> {
    let def = registry.upgrade(id)?;
    Some(progress.upgrade_cost_override(id).unwrap_or(def.cost))
}

/// Buy `id`: check, charge droplets, apply the effect.
pub fn purchase(
    registry: &Registry,
    id: UpgradeId,
    ledger: &mut Ledger,
    progress: &mut Progress,
) -> Result<Purchase, ActionError> {
    let def = registry.upgrade(id).ok_or(ActionError::UnknownUpgrade(id))?;

    if !def.effect.is_repeatable() && progress.is_purchased(id) {
        return Err(ActionError::AlreadyPurchased(id));
    }

    let cost = progress.upgrade_cost_override(id).unwrap_or(def.cost);
    ledger.spend(ResourceKind::Droplets, cost)?;

    let mut next_cost = None;
    match def.effect {
        UpgradeEffect::DropletMultiplier(by) => {
            ledger.raise_baseline(ResourceKind::Droplets, by);
        }
        UpgradeEffect::IngredientBoost(by) => {
            for kind in [
                ResourceKind::Leaves,
                ResourceKind::Berries,
                ResourceKind::Flowers,
            ] {
                ledger.raise_baseline(kind, by);
            }
        }
        UpgradeEffect::Helper => {
            progress.add_helper();
            let doubled = cost.saturating_mul(2);
            progress.set_upgrade_cost(id, doubled);
            next_cost = Some(doubled);
        }
        UpgradeEffect::CauldronUpgrade(divisor) => {
            progress.speed_up_brewing(divisor);
        }
    }

    if !def.effect.is_repeatable() {
        progress.mark_purchased(id);
    }

    tracing::info!(upgrade = %def.name, paid = cost, "upgrade purchased");

    Ok(Purchase {
        upgrade: id,
        paid: cost,
        next_cost,
    })
}
