use crate::brewing::DEFAULT_BASKET_CAPACITY;
use crate::fixed::{Seconds, secs};
use crate::resource::{DropRange, ResourceMap};
use serde::{Deserialize, Serialize};

/// Tuning for one game session. Every field has a default, so a partial
/// config file only overrides what it names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Base yield range per resource, before multipliers.
    pub drop_ranges: ResourceMap<DropRange>,
    pub basket_capacity: usize,
    /// Droplets granted by a rewarded brew before the spirit's multiplier.
    pub base_reward: u64,
    /// Seconds between helper payouts.
    pub helper_interval: Seconds,
    pub starting_resources: ResourceMap<u64>,
    /// Ring buffer capacity of the event bus.
    pub event_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            drop_ranges: ResourceMap {
                droplets: DropRange::new(1, 3),
                leaves: DropRange::new(1, 3),
                berries: DropRange::new(1, 2),
                flowers: DropRange::new(1, 2),
            },
            basket_capacity: DEFAULT_BASKET_CAPACITY,
            base_reward: 10,
            helper_interval: secs(5),
            starting_resources: ResourceMap::default(),
            event_capacity: 256,
        }
    }
}
