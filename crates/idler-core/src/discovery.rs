//! Zone exploration: a timed draw without replacement from a zone's spirits.
//!
//! A zone is first selected, then explored. When the countdown finishes one
//! undiscovered spirit of the zone is drawn uniformly at random and added to
//! the progress record. Only one exploration runs at a time.

use crate::error::ActionError;
use crate::fixed::{Seconds, clamp_non_negative};
use crate::id::{SpiritId, ZoneId};
use crate::progress::Progress;
use crate::registry::{Registry, ZoneDef};
use rand::Rng;
use rand::seq::SliceRandom;

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExploreState {
    #[default]
    Idle,
    Exploring {
        zone: ZoneId,
        remaining: Seconds,
    },
}

impl ExploreState {
    pub fn name(&self) -> &'static str {
        match self {
            ExploreState::Idle => "idle",
            ExploreState::Exploring { .. } => "exploring",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExplorationOutcome {
    Found { zone: ZoneId, spirit: SpiritId },
    /// Every spirit of the zone was already known when the countdown ended.
    NothingNewFound { zone: ZoneId },
}

/// How a zone button is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoneBadge {
    Locked,
    Complete,
    Open,
}

/// Zone button state, recomputed on every read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoneButton {
    pub zone: ZoneId,
    pub badge: ZoneBadge,
    pub interactable: bool,
}

impl ZoneButton {
    pub fn compute(zone: ZoneId, unlocked: bool, complete: bool, exploring: bool) -> Self {
        let badge = if !unlocked {
            ZoneBadge::Locked
        } else if complete {
            ZoneBadge::Complete
        } else {
            ZoneBadge::Open
        };
        Self {
            zone,
            badge,
            interactable: unlocked && !complete && !exploring,
        }
    }
}

// ---------------------------------------------------------------------------
// Explorer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct Explorer {
    selected: Option<ZoneId>,
    state: ExploreState,
}

impl Explorer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected(&self) -> Option<ZoneId> {
        self.selected
    }

    pub fn state(&self) -> ExploreState {
        self.state
    }

    pub fn is_exploring(&self) -> bool {
        matches!(self.state, ExploreState::Exploring { .. })
    }

    pub fn time_left(&self) -> Seconds {
        match self.state {
            ExploreState::Exploring { remaining, .. } => remaining,
            ExploreState::Idle => Seconds::ZERO,
        }
    }

    /// Choose the zone the next exploration will visit. `index` is the
    /// zone's position in registration order.
    pub fn select_zone(
        &mut self,
        index: u32,
        registry: &Registry,
        progress: &Progress,
    ) -> Result<ZoneId, ActionError> {
        if self.is_exploring() {
            return Err(ActionError::InvalidTransition {
                action: "select a zone",
                state: self.state.name(),
            });
        }
        let zone = ZoneId(index);
        let Some(def) = registry.zone(zone) else {
            tracing::warn!(index, zones = registry.zone_count(), "unknown zone index");
            return Err(ActionError::UnknownZone(index));
        };
        check_explorable(zone, def, progress)?;
        self.selected = Some(zone);
        Ok(zone)
    }

    /// Drop the current selection. Returns the zone that was selected.
    pub fn cancel_selection(&mut self) -> Option<ZoneId> {
        self.selected.take()
    }

    /// Start exploring the selected zone.
    pub fn start_exploration(
        &mut self,
        registry: &Registry,
        progress: &Progress,
    ) -> Result<(ZoneId, Seconds), ActionError> {
        if self.is_exploring() {
            return Err(ActionError::InvalidTransition {
                action: "start exploring",
                state: self.state.name(),
            });
        }
        let zone = self.selected.ok_or(ActionError::NoZoneSelected)?;
        let def = registry
            .zone(zone)
            .ok_or(ActionError::UnknownZone(zone.0))?;
        check_explorable(zone, def, progress)?;

        self.selected = None;
        self.state = ExploreState::Exploring {
            zone,
            remaining: def.exploration_duration,
        };
        tracing::debug!(zone = %def.name, duration = %def.exploration_duration, "exploration started");
        Ok((zone, def.exploration_duration))
    }

    /// Abandon a running exploration. No spirit is awarded.
    pub fn cancel_exploration(&mut self) -> Result<ZoneId, ActionError> {
        let ExploreState::Exploring { zone, .. } = self.state else {
            return Err(ActionError::InvalidTransition {
                action: "cancel exploring",
                state: self.state.name(),
            });
        };
        self.state = ExploreState::Idle;
        tracing::debug!(zone = zone.0, "exploration cancelled");
        Ok(zone)
    }

    /// Run the countdown by `dt`. When it reaches zero, draw one undiscovered
    /// spirit, unlock it, and return to idle.
    pub fn tick(
        &mut self,
        dt: Seconds,
        registry: &Registry,
        progress: &mut Progress,
        rng: &mut impl Rng,
    ) -> Option<ExplorationOutcome> {
        let ExploreState::Exploring { zone, remaining } = self.state else {
            return None;
        };
        let remaining = clamp_non_negative(remaining - dt);
        if remaining > Seconds::ZERO {
            self.state = ExploreState::Exploring { zone, remaining };
            return None;
        }
        self.state = ExploreState::Idle;

        let found = registry
            .zone(zone)
            .and_then(|def| draw_unfound(def, progress, rng));
        let outcome = match found {
            Some(spirit) => {
                progress.unlock_spirit(spirit);
                ExplorationOutcome::Found { zone, spirit }
            }
            None => ExplorationOutcome::NothingNewFound { zone },
        };
        tracing::debug!(zone = zone.0, ?outcome, "exploration resolved");
        Some(outcome)
    }
}

/// Uniformly pick a spirit of `zone` that is not yet unlocked.
pub fn draw_unfound(zone: &ZoneDef, progress: &Progress, rng: &mut impl Rng) -> Option<SpiritId> {
    progress.unfound_in(zone).choose(rng).copied()
}

fn check_explorable(zone: ZoneId, def: &ZoneDef, progress: &Progress) -> Result<(), ActionError> {
    if !progress.is_zone_unlocked(zone) {
        return Err(ActionError::ZoneLocked(zone));
    }
    if progress.is_zone_complete(def) {
        return Err(ActionError::ZoneComplete(zone));
    }
    Ok(())
}
