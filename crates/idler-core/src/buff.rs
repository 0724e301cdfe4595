//! Single-slot, timed spirit buffs.
//!
//! At most one buff is active per session. Activating a new buff first
//! reverts the old one's multiplier deltas, then applies the new ones. The
//! controller remembers the exact deltas it added so that expiry or
//! replacement restores every multiplier to its pre-activation value.

use crate::fixed::{Fixed64, Seconds, clamp_non_negative};
use crate::id::SpiritId;
use crate::resource::{Ledger, ResourceKind};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Definitions
// ---------------------------------------------------------------------------

/// Which ledger multipliers a spirit's buff raises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuffTarget {
    Droplets,
    BerriesAndFlowers,
}

impl BuffTarget {
    pub fn resources(self) -> &'static [ResourceKind] {
        match self {
            BuffTarget::Droplets => &[ResourceKind::Droplets],
            BuffTarget::BerriesAndFlowers => &[ResourceKind::Berries, ResourceKind::Flowers],
        }
    }
}

/// The buff a spirit grants when it enjoys a brewed tea.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuffEffect {
    pub target: BuffTarget,
    /// Strength of the buff. Also scales the droplet reward of the brew
    /// that triggered it.
    pub multiplier: Fixed64,
    pub duration: Seconds,
}

impl BuffEffect {
    /// Integer amount added to each targeted multiplier: the multiplier
    /// rounded to the nearest whole number, minus the baseline 1.
    pub fn multiplier_bonus(&self) -> u32 {
        let whole: i64 = self.multiplier.round().to_num();
        (whole.max(1) - 1) as u32
    }
}

// ---------------------------------------------------------------------------
// Runtime state
// ---------------------------------------------------------------------------

/// The buff currently held in the slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveBuff {
    pub source: SpiritId,
    pub multiplier: Fixed64,
    pub duration: Seconds,
    pub expires_at: Seconds,
    /// Exactly what was added to the ledger, per resource.
    applied: Vec<(ResourceKind, u32)>,
}

impl ActiveBuff {
    pub fn is_active(&self, now: Seconds) -> bool {
        now < self.expires_at
    }

    pub fn time_left(&self, now: Seconds) -> Seconds {
        clamp_non_negative(self.expires_at - now)
    }
}

/// Owns the single buff slot. The only component that writes buff bonuses
/// into the ledger.
#[derive(Debug, Clone, Default)]
pub struct BuffController {
    active: Option<ActiveBuff>,
}

impl BuffController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace whatever is in the slot with `effect` from `source`. Returns
    /// the buff that was displaced, already reverted.
    pub fn activate(
        &mut self,
        source: SpiritId,
        effect: &BuffEffect,
        now: Seconds,
        ledger: &mut Ledger,
    ) -> Option<ActiveBuff> {
        let displaced = self.clear(ledger);

        let bonus = effect.multiplier_bonus();
        let mut applied = Vec::with_capacity(effect.target.resources().len());
        for &kind in effect.target.resources() {
            ledger.apply_buff_bonus(kind, bonus);
            applied.push((kind, bonus));
        }

        tracing::debug!(
            spirit = source.0,
            target = ?effect.target,
            bonus,
            duration = %effect.duration,
            "buff applied"
        );

        self.active = Some(ActiveBuff {
            source,
            multiplier: effect.multiplier,
            duration: effect.duration,
            expires_at: now + effect.duration,
            applied,
        });

        displaced
    }

    /// Expire the buff if `now` has reached its end. Returns the expired buff.
    pub fn tick(&mut self, now: Seconds, ledger: &mut Ledger) -> Option<ActiveBuff> {
        match &self.active {
            Some(buff) if !buff.is_active(now) => self.clear(ledger),
            _ => None,
        }
    }

    /// Revert and drop the current buff, if any.
    pub fn clear(&mut self, ledger: &mut Ledger) -> Option<ActiveBuff> {
        let buff = self.active.take()?;
        for &(kind, delta) in &buff.applied {
            ledger.revert_buff_bonus(kind, delta);
        }
        tracing::debug!(spirit = buff.source.0, "buff reverted");
        Some(buff)
    }

    /// Whether a buff occupies the slot at `now`.
    pub fn is_active(&self, now: Seconds) -> bool {
        self.active.as_ref().is_some_and(|b| b.is_active(now))
    }

    pub fn time_left(&self, now: Seconds) -> Seconds {
        self.active
            .as_ref()
            .map_or(Seconds::ZERO, |b| b.time_left(now))
    }

    pub fn active(&self) -> Option<&ActiveBuff> {
        self.active.as_ref()
    }
}
