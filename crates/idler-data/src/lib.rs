//! Data-driven content loading for the idler core.
//!
//! A data directory holds `recipes`, `spirits`, `zones`, and optionally
//! `upgrades` and `config`, each in RON, TOML or JSON. [`load_game_data`]
//! resolves name references and returns a validated registry plus session
//! tuning.

pub mod loader;
pub mod schema;

pub use loader::{DataLoadError, GameData, load_game_data};
