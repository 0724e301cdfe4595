//! Read-only snapshot types for the UI collaborator.
//!
//! All types are owned copies; nothing borrows from the session.

use crate::brewing::BrewState;
use crate::discovery::{ExploreState, ZoneButton};
use crate::fixed::{Fixed64, Seconds};
use crate::id::{SpiritId, ZoneId};
use crate::progress::ZoneStatus;
use crate::recipe::IngredientCategory;
use crate::resource::ResourceMap;

/// The buff slot as seen at snapshot time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuffSnapshot {
    pub source: SpiritId,
    pub multiplier: Fixed64,
    pub time_left: Seconds,
}

/// Per-zone display data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneSnapshot {
    pub id: ZoneId,
    pub name: String,
    pub status: ZoneStatus,
    pub button: ZoneButton,
}

/// Per-spirit display data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpiritSnapshot {
    pub id: SpiritId,
    pub name: String,
    pub unlocked: bool,
}

/// Everything a UI needs to redraw after a tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub now: Seconds,
    pub resources: ResourceMap<u64>,
    pub multipliers: ResourceMap<u32>,
    pub basket: Vec<IngredientCategory>,
    pub brew_state: BrewState,
    pub brew_time_left: Seconds,
    pub buff: Option<BuffSnapshot>,
    pub explore_state: ExploreState,
    pub explore_time_left: Seconds,
    pub selected_zone: Option<ZoneId>,
    pub zones: Vec<ZoneSnapshot>,
    pub spirits: Vec<SpiritSnapshot>,
    pub helpers: u32,
}
