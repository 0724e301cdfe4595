//! Idler Core -- the progression core of a cozy tea-garden idle game.
//!
//! Player clicks turn into resources, resources go into a basket, a basket
//! that exactly matches a recipe brews a tea, and a spirit that likes the
//! tea pays out droplets and grants a timed buff. Exploring zones discovers
//! new spirits, drawn without replacement.
//!
//! # Components
//!
//! Leaves first:
//!
//! - [`resource::Ledger`] -- four resource counters, baseline multipliers,
//!   and the randomized drop actions.
//! - [`recipe::find_match`] -- exact, order-independent recipe matching.
//! - [`brewing::Brewer`] -- the basket and the brewing state machine.
//! - [`buff::BuffController`] -- the single buff slot; the only writer of
//!   buff bonuses into the ledger.
//! - [`discovery::Explorer`] -- timed zone exploration.
//! - [`shop`] and [`income`] -- upgrades and helper income.
//! - [`session::GameSession`] -- owns all of the above plus the clock, the
//!   seeded RNG, and the [`event::EventBus`].
//!
//! # Definitions vs progress
//!
//! Recipes, spirits, zones and upgrades are frozen in a
//! [`registry::Registry`] that any number of sessions can share. Everything a
//! player changes lives in [`progress::Progress`] and the ledger.
//!
//! # Time
//!
//! Nothing runs on its own. The caller drives every countdown with
//! [`session::GameSession::advance`] and a [`fixed::Seconds`] delta.

pub mod brewing;
pub mod buff;
pub mod config;
pub mod discovery;
pub mod error;
pub mod event;
pub mod fixed;
pub mod id;
pub mod income;
pub mod progress;
pub mod query;
pub mod recipe;
pub mod registry;
pub mod resource;
pub mod session;
pub mod shop;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
