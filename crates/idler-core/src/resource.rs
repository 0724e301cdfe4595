//! The resource ledger: four counters, four integer multipliers, and the
//! randomized drop actions that feed them.
//!
//! The ledger is the only writer of resource counts. Multipliers are split
//! into a permanent baseline (raised by shop upgrades) and a buff bonus that
//! only the buff controller adds and removes, so a buff revert always lands
//! back on the baseline exactly.

use crate::error::ActionError;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::ops::{Index, IndexMut};

// ---------------------------------------------------------------------------
// Resource kinds
// ---------------------------------------------------------------------------

/// A named resource counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Droplets,
    Leaves,
    Berries,
    Flowers,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 4] = [
        ResourceKind::Droplets,
        ResourceKind::Leaves,
        ResourceKind::Berries,
        ResourceKind::Flowers,
    ];

    fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            ResourceKind::Droplets => "droplets",
            ResourceKind::Leaves => "leaves",
            ResourceKind::Berries => "berries",
            ResourceKind::Flowers => "flowers",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One value per [`ResourceKind`], indexable by kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResourceMap<T> {
    pub droplets: T,
    pub leaves: T,
    pub berries: T,
    pub flowers: T,
}

impl<T: Copy> ResourceMap<T> {
    /// The same value for every resource.
    pub fn splat(v: T) -> Self {
        Self {
            droplets: v,
            leaves: v,
            berries: v,
            flowers: v,
        }
    }

    /// `(kind, value)` pairs in [`ResourceKind::ALL`] order.
    pub fn iter(&self) -> impl Iterator<Item = (ResourceKind, T)> + '_ {
        ResourceKind::ALL.into_iter().map(move |k| (k, self[k]))
    }
}

impl<T> Index<ResourceKind> for ResourceMap<T> {
    type Output = T;

    fn index(&self, kind: ResourceKind) -> &T {
        match kind {
            ResourceKind::Droplets => &self.droplets,
            ResourceKind::Leaves => &self.leaves,
            ResourceKind::Berries => &self.berries,
            ResourceKind::Flowers => &self.flowers,
        }
    }
}

impl<T> IndexMut<ResourceKind> for ResourceMap<T> {
    fn index_mut(&mut self, kind: ResourceKind) -> &mut T {
        match kind {
            ResourceKind::Droplets => &mut self.droplets,
            ResourceKind::Leaves => &mut self.leaves,
            ResourceKind::Berries => &mut self.berries,
            ResourceKind::Flowers => &mut self.flowers,
        }
    }
}

// ---------------------------------------------------------------------------
// Drop ranges
// ---------------------------------------------------------------------------

/// Inclusive base yield range of a drop, before multipliers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropRange {
    pub min: u32,
    pub max: u32,
}

impl DropRange {
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    /// Inclusive bounds scaled by `multiplier`. A reversed range is read as
    /// its ordered form.
    pub fn scaled(self, multiplier: u32) -> (u64, u64) {
        let lo = u64::from(self.min.min(self.max)) * u64::from(multiplier);
        let hi = u64::from(self.min.max(self.max)) * u64::from(multiplier);
        (lo, hi)
    }
}

// ---------------------------------------------------------------------------
// Drop results
// ---------------------------------------------------------------------------

/// What a single forage (bush) drop produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForageYield {
    pub leaves: u64,
    /// Either berries or flowers, chosen 50/50.
    pub bonus: ResourceKind,
    pub bonus_amount: u64,
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

/// Owns resource counts and multipliers for one session.
#[derive(Debug, Clone)]
pub struct Ledger {
    resources: ResourceMap<u64>,
    baseline: ResourceMap<u32>,
    buff_bonus: ResourceMap<u32>,
    drop_ranges: ResourceMap<DropRange>,
    /// Resources touched since the last [`Ledger::take_changed`].
    changed: BTreeSet<ResourceKind>,
}

impl Ledger {
    /// A ledger with the given drop ranges, zero resources, and baseline
    /// multipliers of 1.
    pub fn new(drop_ranges: ResourceMap<DropRange>) -> Self {
        Self {
            resources: ResourceMap::default(),
            baseline: ResourceMap::splat(1),
            buff_bonus: ResourceMap::default(),
            drop_ranges,
            changed: BTreeSet::new(),
        }
    }

    /// Rebuild a ledger from saved counts and baseline multipliers. Baselines
    /// below 1 are raised to 1.
    pub fn restore(
        drop_ranges: ResourceMap<DropRange>,
        resources: ResourceMap<u64>,
        baseline: ResourceMap<u32>,
    ) -> Self {
        let mut ledger = Self::new(drop_ranges);
        ledger.resources = resources;
        for kind in ResourceKind::ALL {
            ledger.baseline[kind] = baseline[kind].max(1);
        }
        ledger
    }

    // -- Queries --

    pub fn get(&self, kind: ResourceKind) -> u64 {
        self.resources[kind]
    }

    pub fn resources(&self) -> ResourceMap<u64> {
        self.resources
    }

    /// Effective multiplier: baseline plus any active buff bonus.
    pub fn multiplier(&self, kind: ResourceKind) -> u32 {
        self.baseline[kind].saturating_add(self.buff_bonus[kind])
    }

    pub fn multipliers(&self) -> ResourceMap<u32> {
        let mut out = ResourceMap::default();
        for kind in ResourceKind::ALL {
            out[kind] = self.multiplier(kind);
        }
        out
    }

    /// Multipliers with buff bonuses removed.
    pub fn baseline_multipliers(&self) -> ResourceMap<u32> {
        self.baseline
    }

    pub fn can_afford(&self, kind: ResourceKind, amount: u64) -> bool {
        self.resources[kind] >= amount
    }

    // -- Counts --

    /// Draw a uniform amount in `[range.min * m, range.max * m]` (inclusive),
    /// where `m` is the current multiplier for `kind`, and add it.
    pub fn grant_random_drop(
        &mut self,
        kind: ResourceKind,
        range: DropRange,
        rng: &mut impl Rng,
    ) -> u64 {
        let (lo, hi) = range.scaled(self.multiplier(kind));
        let amount = rng.gen_range(lo..=hi);
        self.credit(kind, amount);
        tracing::debug!(resource = %kind, amount, lo, hi, "drop granted");
        amount
    }

    /// The cloud click: one droplet drop at the configured range.
    pub fn droplet_drop(&mut self, rng: &mut impl Rng) -> u64 {
        let range = self.drop_ranges[ResourceKind::Droplets];
        self.grant_random_drop(ResourceKind::Droplets, range, rng)
    }

    /// The bush click: always leaves, then exactly one of berries or flowers
    /// with equal probability.
    pub fn forage_drop(&mut self, rng: &mut impl Rng) -> ForageYield {
        let leaves_range = self.drop_ranges[ResourceKind::Leaves];
        let leaves = self.grant_random_drop(ResourceKind::Leaves, leaves_range, rng);

        let bonus = if rng.gen_bool(0.5) {
            ResourceKind::Berries
        } else {
            ResourceKind::Flowers
        };
        let bonus_range = self.drop_ranges[bonus];
        let bonus_amount = self.grant_random_drop(bonus, bonus_range, rng);

        ForageYield {
            leaves,
            bonus,
            bonus_amount,
        }
    }

    /// Add a fixed amount (rewards, helper income).
    pub fn credit(&mut self, kind: ResourceKind, amount: u64) {
        if amount == 0 {
            return;
        }
        self.resources[kind] = self.resources[kind].saturating_add(amount);
        self.changed.insert(kind);
    }

    /// Remove `amount`, or reject without touching the balance.
    pub fn spend(&mut self, kind: ResourceKind, amount: u64) -> Result<(), ActionError> {
        let available = self.resources[kind];
        if available < amount {
            return Err(ActionError::InsufficientResource {
                resource: kind,
                needed: amount,
                available,
            });
        }
        if amount > 0 {
            self.resources[kind] = available - amount;
            self.changed.insert(kind);
        }
        Ok(())
    }

    /// Give back what [`Ledger::spend`] took.
    pub fn refund(&mut self, kind: ResourceKind, amount: u64) {
        self.credit(kind, amount);
    }

    // -- Multipliers --

    /// Permanent multiplier increase from a purchased upgrade.
    pub(crate) fn raise_baseline(&mut self, kind: ResourceKind, by: u32) {
        self.baseline[kind] = self.baseline[kind].saturating_add(by);
        self.changed.insert(kind);
    }

    /// Called only by the buff controller.
    pub(crate) fn apply_buff_bonus(&mut self, kind: ResourceKind, delta: u32) {
        self.buff_bonus[kind] = self.buff_bonus[kind].saturating_add(delta);
        self.changed.insert(kind);
    }

    /// Called only by the buff controller, with the exact delta it applied.
    pub(crate) fn revert_buff_bonus(&mut self, kind: ResourceKind, delta: u32) {
        debug_assert!(self.buff_bonus[kind] >= delta);
        self.buff_bonus[kind] = self.buff_bonus[kind].saturating_sub(delta);
        self.changed.insert(kind);
    }

    // -- Change tracking --

    pub fn has_changes(&self) -> bool {
        !self.changed.is_empty()
    }

    /// Resources touched since the last call, in kind order.
    pub fn take_changed(&mut self) -> Vec<ResourceKind> {
        std::mem::take(&mut self.changed).into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn ranges() -> ResourceMap<DropRange> {
        ResourceMap {
            droplets: DropRange::new(2, 5),
            leaves: DropRange::new(1, 3),
            berries: DropRange::new(1, 2),
            flowers: DropRange::new(1, 2),
        }
    }

    #[test]
    fn new_ledger_is_empty_with_unit_multipliers() {
        let ledger = Ledger::new(ranges());
        for kind in ResourceKind::ALL {
            assert_eq!(ledger.get(kind), 0);
            assert_eq!(ledger.multiplier(kind), 1);
        }
        assert!(!ledger.has_changes());
    }

    #[test]
    fn leaf_drop_stays_in_one_to_three() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut ledger = Ledger::new(ranges());
        let mut seen = BTreeSet::new();
        for _ in 0..500 {
            let before = ledger.get(ResourceKind::Leaves);
            ledger.grant_random_drop(ResourceKind::Leaves, DropRange::new(1, 3), &mut rng);
            let gained = ledger.get(ResourceKind::Leaves) - before;
            assert!((1..=3).contains(&gained), "gained {gained}");
            seen.insert(gained);
        }
        // Both ends of the inclusive range are reachable.
        assert_eq!(seen.into_iter().collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn drop_scales_with_multiplier() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let mut ledger = Ledger::new(ranges());
        ledger.raise_baseline(ResourceKind::Droplets, 2);
        for _ in 0..200 {
            let amount = ledger.droplet_drop(&mut rng);
            assert!((6..=15).contains(&amount), "amount {amount}");
        }
    }

    #[test]
    fn forage_always_grants_leaves_and_one_bonus() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut ledger = Ledger::new(ranges());
        let mut berries_seen = false;
        let mut flowers_seen = false;
        for _ in 0..100 {
            let before = ledger.resources();
            let y = ledger.forage_drop(&mut rng);
            assert!(y.leaves >= 1);
            let after = ledger.resources();
            assert_eq!(after.leaves - before.leaves, y.leaves);
            match y.bonus {
                ResourceKind::Berries => {
                    berries_seen = true;
                    assert_eq!(after.flowers, before.flowers);
                    assert_eq!(after.berries - before.berries, y.bonus_amount);
                }
                ResourceKind::Flowers => {
                    flowers_seen = true;
                    assert_eq!(after.berries, before.berries);
                    assert_eq!(after.flowers - before.flowers, y.bonus_amount);
                }
                other => panic!("unexpected bonus {other}"),
            }
        }
        assert!(berries_seen && flowers_seen);
    }

    #[test]
    fn spend_rejects_overdraw_without_change() {
        let mut ledger = Ledger::new(ranges());
        ledger.credit(ResourceKind::Berries, 2);
        ledger.take_changed();

        let err = ledger.spend(ResourceKind::Berries, 3).unwrap_err();
        assert_eq!(
            err,
            ActionError::InsufficientResource {
                resource: ResourceKind::Berries,
                needed: 3,
                available: 2
            }
        );
        assert_eq!(ledger.get(ResourceKind::Berries), 2);
        assert!(!ledger.has_changes());

        ledger.spend(ResourceKind::Berries, 2).unwrap();
        assert_eq!(ledger.get(ResourceKind::Berries), 0);
        ledger.refund(ResourceKind::Berries, 2);
        assert_eq!(ledger.get(ResourceKind::Berries), 2);
    }

    #[test]
    fn buff_bonus_reverts_to_baseline() {
        let mut ledger = Ledger::new(ranges());
        ledger.raise_baseline(ResourceKind::Flowers, 1);
        ledger.apply_buff_bonus(ResourceKind::Flowers, 3);
        assert_eq!(ledger.multiplier(ResourceKind::Flowers), 5);
        assert_eq!(ledger.baseline_multipliers().flowers, 2);
        ledger.revert_buff_bonus(ResourceKind::Flowers, 3);
        assert_eq!(ledger.multiplier(ResourceKind::Flowers), 2);
    }

    #[test]
    fn take_changed_reports_touched_kinds_once() {
        let mut ledger = Ledger::new(ranges());
        ledger.credit(ResourceKind::Leaves, 1);
        ledger.credit(ResourceKind::Droplets, 4);
        ledger.credit(ResourceKind::Leaves, 1);
        assert_eq!(
            ledger.take_changed(),
            vec![ResourceKind::Droplets, ResourceKind::Leaves]
        );
        assert!(ledger.take_changed().is_empty());
    }

    #[test]
    fn restore_clamps_baseline_to_one() {
        let ledger = Ledger::restore(
            ranges(),
            ResourceMap::splat(9),
            ResourceMap {
                droplets: 3,
                leaves: 0,
                berries: 1,
                flowers: 1,
            },
        );
        assert_eq!(ledger.get(ResourceKind::Flowers), 9);
        assert_eq!(ledger.multiplier(ResourceKind::Droplets), 3);
        assert_eq!(ledger.multiplier(ResourceKind::Leaves), 1);
    }

    #[test]
    fn huge_baseline_with_buff_saturates() {
        let mut ledger = Ledger::restore(
            ranges(),
            ResourceMap::default(),
            ResourceMap::splat(u32::MAX),
        );
        ledger.apply_buff_bonus(ResourceKind::Droplets, 1);
        assert_eq!(ledger.multiplier(ResourceKind::Droplets), u32::MAX);

        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let amount = ledger.droplet_drop(&mut rng);
        assert!(amount >= 2 * u64::from(u32::MAX));

        ledger.revert_buff_bonus(ResourceKind::Droplets, 1);
        assert_eq!(ledger.multipliers(), ResourceMap::splat(u32::MAX));
    }
}
