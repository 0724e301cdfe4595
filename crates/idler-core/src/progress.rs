//! Per-session mutable progress, kept apart from the immutable definitions in
//! the [`Registry`].
//!
//! Spirit and zone unlock sets only ever grow.

use crate::id::{SpiritId, UpgradeId, ZoneId};
use crate::registry::{Registry, ZoneDef};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

fn one() -> u32 {
    1
}

/// Everything a player has unlocked or bought.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    #[serde(default)]
    unlocked_spirits: BTreeSet<SpiritId>,
    #[serde(default)]
    unlocked_zones: BTreeSet<ZoneId>,
    #[serde(default)]
    purchased_upgrades: BTreeSet<UpgradeId>,
    /// Current price of repeatable upgrades that have been bought at least
    /// once.
    #[serde(default)]
    upgrade_costs: BTreeMap<UpgradeId, u64>,
    #[serde(default)]
    helpers: u32,
    /// Divisor applied to every recipe's brew duration.
    #[serde(default = "one")]
    brew_speed: u32,
}

impl Default for Progress {
    fn default() -> Self {
        Self {
            unlocked_spirits: BTreeSet::new(),
            unlocked_zones: BTreeSet::new(),
            purchased_upgrades: BTreeSet::new(),
            upgrade_costs: BTreeMap::new(),
            helpers: 0,
            brew_speed: 1,
        }
    }
}

/// Display summary of one zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoneStatus {
    pub found: usize,
    pub total: usize,
    pub unlocked: bool,
    pub complete: bool,
}

impl Progress {
    /// Fresh progress seeded with every spirit and zone marked
    /// `starts_unlocked`.
    pub fn new(registry: &Registry) -> Self {
        let mut progress = Self::default();
        for (id, spirit) in registry.spirits() {
            if spirit.starts_unlocked {
                progress.unlocked_spirits.insert(id);
            }
        }
        for (id, zone) in registry.zones() {
            if zone.starts_unlocked {
                progress.unlocked_zones.insert(id);
            }
        }
        progress
    }

    // -- Spirits --

    /// Returns `true` if the spirit was newly unlocked.
    pub fn unlock_spirit(&mut self, id: SpiritId) -> bool {
        self.unlocked_spirits.insert(id)
    }

    pub fn is_spirit_unlocked(&self, id: SpiritId) -> bool {
        self.unlocked_spirits.contains(&id)
    }

    pub fn unlocked_spirits(&self) -> &BTreeSet<SpiritId> {
        &self.unlocked_spirits
    }

    // -- Zones --

    /// Returns `true` if the zone was newly unlocked.
    pub fn unlock_zone(&mut self, id: ZoneId) -> bool {
        self.unlocked_zones.insert(id)
    }

    pub fn is_zone_unlocked(&self, id: ZoneId) -> bool {
        self.unlocked_zones.contains(&id)
    }

    pub fn unlocked_zones(&self) -> &BTreeSet<ZoneId> {
        &self.unlocked_zones
    }

    /// Spirits of `zone` that are still undiscovered, in zone order.
    pub fn unfound_in(&self, zone: &ZoneDef) -> Vec<SpiritId> {
        zone.spirits
            .iter()
            .copied()
            .filter(|s| !self.unlocked_spirits.contains(s))
            .collect()
    }

    /// A zone is complete once every one of its spirits is unlocked. A zone
    /// with no spirits is trivially complete.
    pub fn is_zone_complete(&self, zone: &ZoneDef) -> bool {
        zone.spirits
            .iter()
            .all(|s| self.unlocked_spirits.contains(s))
    }

    pub fn zone_status(&self, id: ZoneId, zone: &ZoneDef) -> ZoneStatus {
        let total = zone.spirits.len();
        let found = zone
            .spirits
            .iter()
            .filter(|s| self.unlocked_spirits.contains(s))
            .count();
        ZoneStatus {
            found,
            total,
            unlocked: self.is_zone_unlocked(id),
            complete: found == total,
        }
    }

    // -- Shop --

    pub fn is_purchased(&self, id: UpgradeId) -> bool {
        self.purchased_upgrades.contains(&id)
    }

    pub fn purchased_upgrades(&self) -> &BTreeSet<UpgradeId> {
        &self.purchased_upgrades
    }

    pub(crate) fn mark_purchased(&mut self, id: UpgradeId) {
        self.purchased_upgrades.insert(id);
    }

    pub fn upgrade_cost_override(&self, id: UpgradeId) -> Option<u64> {
        self.upgrade_costs.get(&id).copied()
    }

    /// Upgrades whose price has moved away from the definition's cost.
    pub fn upgrade_cost_overrides(&self) -> &BTreeMap<UpgradeId, u64> {
        &self.upgrade_costs
    }

    pub(crate) fn set_upgrade_cost(&mut self, id: UpgradeId, cost: u64) {
        self.upgrade_costs.insert(id, cost);
    }

    pub fn helpers(&self) -> u32 {
        self.helpers
    }

    pub(crate) fn add_helper(&mut self) {
        self.helpers = self.helpers.saturating_add(1);
    }

    pub fn brew_speed(&self) -> u32 {
        self.brew_speed.max(1)
    }

    pub(crate) fn speed_up_brewing(&mut self, factor: u32) {
        self.brew_speed = self.brew_speed().saturating_mul(factor.max(1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;

    #[test]
    fn new_progress_seeds_starting_unlocks() {
        let reg = tea_garden_registry();
        let p = Progress::new(&reg);
        assert!(p.is_spirit_unlocked(reg.spirit_id("hearth_sprite").unwrap()));
        assert!(!p.is_spirit_unlocked(reg.spirit_id("moss_fox").unwrap()));
        assert!(p.is_zone_unlocked(reg.zone_id("forest").unwrap()));
        assert!(!p.is_zone_unlocked(reg.zone_id("mountain").unwrap()));
        assert_eq!(p.brew_speed(), 1);
        assert_eq!(p.helpers(), 0);
    }

    #[test]
    fn unlocks_are_idempotent() {
        let mut p = Progress::default();
        assert!(p.unlock_spirit(SpiritId(3)));
        assert!(!p.unlock_spirit(SpiritId(3)));
        assert!(p.unlock_zone(ZoneId(1)));
        assert!(!p.unlock_zone(ZoneId(1)));
        assert_eq!(p.unlocked_spirits().len(), 1);
    }

    #[test]
    fn zone_completion_tracks_unfound() {
        let reg = tea_garden_registry();
        let mut p = Progress::new(&reg);
        let forest_id = reg.zone_id("forest").unwrap();
        let forest = reg.zone(forest_id).unwrap();

        assert_eq!(p.unfound_in(forest).len(), forest.spirits.len());
        assert!(!p.is_zone_complete(forest));

        for &s in &forest.spirits {
            p.unlock_spirit(s);
        }
        assert!(p.unfound_in(forest).is_empty());
        assert!(p.is_zone_complete(forest));

        let status = p.zone_status(forest_id, forest);
        assert_eq!(status.found, status.total);
        assert!(status.unlocked && status.complete);
    }

    #[test]
    fn missing_brew_speed_deserializes_to_one() {
        let p: Progress = serde_json::from_str("{}").unwrap();
        assert_eq!(p.brew_speed(), 1);
        assert_eq!(p, Progress::default());
    }

    #[test]
    fn progress_survives_json() {
        let mut p = Progress::default();
        p.unlock_spirit(SpiritId(2));
        p.unlock_zone(ZoneId(0));
        p.mark_purchased(UpgradeId(1));
        p.set_upgrade_cost(UpgradeId(2), 400);
        p.add_helper();
        p.speed_up_brewing(2);

        let json = serde_json::to_string(&p).unwrap();
        let back: Progress = serde_json::from_str(&json).unwrap();
        assert_eq!(back, p);
    }
}
