use crate::id::{SpiritId, UpgradeId, ZoneId};
use crate::recipe::IngredientCategory;
use crate::resource::ResourceKind;

/// Recoverable, user-facing rejections returned by session commands.
///
/// Every variant except [`ActionError::NoMatch`] leaves state untouched.
/// `NoMatch` is reported after the basket has been refunded.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ActionError {
    #[error("not enough {resource}: need {needed}, have {available}")]
    InsufficientResource {
        resource: ResourceKind,
        needed: u64,
        available: u64,
    },

    #[error("cannot {action} while {state}")]
    InvalidTransition {
        action: &'static str,
        state: &'static str,
    },

    #[error("basket is full ({capacity} ingredients)")]
    BasketFull { capacity: usize },

    #[error("basket is empty")]
    EmptyBasket,

    #[error("a spirit buff is active; the cauldron is resting")]
    BuffActive,

    #[error("no recipe matches the basket; {} ingredients returned", refunded.len())]
    NoMatch { refunded: Vec<IngredientCategory> },

    #[error("zone {0:?} is locked")]
    ZoneLocked(ZoneId),

    #[error("every spirit in zone {0:?} has already been found")]
    ZoneComplete(ZoneId),

    #[error("no zone selected")]
    NoZoneSelected,

    #[error("upgrade {0:?} has already been purchased")]
    AlreadyPurchased(UpgradeId),

    #[error("unknown zone index {0}")]
    UnknownZone(u32),

    #[error("unknown spirit {0:?}")]
    UnknownSpirit(SpiritId),

    #[error("unknown upgrade {0:?}")]
    UnknownUpgrade(UpgradeId),
}

impl ActionError {
    /// Contract violations by the calling collaborator rather than game-state
    /// rejections.
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            ActionError::UnknownZone(_)
                | ActionError::UnknownSpirit(_)
                | ActionError::UnknownUpgrade(_)
        )
    }
}
