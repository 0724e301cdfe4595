//! Shared test helpers for unit and integration tests.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]` so other crates
//! can use them through the `test-utils` feature.

use crate::buff::{BuffEffect, BuffTarget};
use crate::config::SessionConfig;
use crate::fixed::Fixed64;
use crate::recipe::IngredientCounts;
use crate::registry::{Registry, RegistryBuilder};
use crate::resource::{Ledger, ResourceKind};
use crate::session::GameSession;
use crate::shop::UpgradeEffect;
use std::sync::Arc;

pub use crate::fixed::secs;

// ===========================================================================
// Fixed-point helper
// ===========================================================================

pub fn fixed(v: f64) -> Fixed64 {
    Fixed64::from_num(v)
}

// ===========================================================================
// Sample content
// ===========================================================================

fn buff(target: BuffTarget, multiplier: f64, duration: u32) -> BuffEffect {
    BuffEffect {
        target,
        multiplier: fixed(multiplier),
        duration: secs(duration),
    }
}

/// A small garden used across tests.
///
/// Recipes (leaf, berry, flower): `berry_tea` (2,1,0) 5s, `flower_tea`
/// (2,0,1) 5s, `meadow_tea` (1,1,1) 8s, `forest_tea` (3,0,0) 4s.
///
/// Spirits: `hearth_sprite` starts unlocked and likes forest and berry tea
/// (droplets x2, 30s). The forest holds `moss_fox` and `dew_moth`; the
/// locked mountain holds `stone_owl` and `cloud_yak`.
///
/// Upgrades: `rain_barrel` 100, `fertile_soil` 250, `garden_helper` 200,
/// `copper_cauldron` 300.
pub fn tea_garden_registry() -> Registry {
    let mut b = RegistryBuilder::new();

    let berry_tea = b.register_recipe("berry_tea", IngredientCounts::new(2, 1, 0), secs(5));
    let flower_tea = b.register_recipe("flower_tea", IngredientCounts::new(2, 0, 1), secs(5));
    let meadow_tea = b.register_recipe("meadow_tea", IngredientCounts::new(1, 1, 1), secs(8));
    let forest_tea = b.register_recipe("forest_tea", IngredientCounts::new(3, 0, 0), secs(4));

    b.register_spirit(
        "hearth_sprite",
        vec![forest_tea, berry_tea],
        buff(BuffTarget::Droplets, 2.0, 30),
        true,
    );
    let moss_fox = b.register_spirit(
        "moss_fox",
        vec![berry_tea, meadow_tea],
        buff(BuffTarget::BerriesAndFlowers, 2.0, 20),
        false,
    );
    let dew_moth = b.register_spirit(
        "dew_moth",
        vec![flower_tea],
        buff(BuffTarget::Droplets, 3.0, 15),
        false,
    );
    let stone_owl = b.register_spirit(
        "stone_owl",
        vec![meadow_tea],
        buff(BuffTarget::BerriesAndFlowers, 3.0, 25),
        false,
    );
    let cloud_yak = b.register_spirit(
        "cloud_yak",
        vec![flower_tea, forest_tea],
        buff(BuffTarget::Droplets, 1.5, 40),
        false,
    );

    b.register_zone("forest", vec![moss_fox, dew_moth], secs(10), true);
    b.register_zone("mountain", vec![stone_owl, cloud_yak], secs(20), false);

    b.register_upgrade("rain_barrel", 100, UpgradeEffect::DropletMultiplier(1));
    b.register_upgrade("fertile_soil", 250, UpgradeEffect::IngredientBoost(1));
    b.register_upgrade("garden_helper", 200, UpgradeEffect::Helper);
    b.register_upgrade("copper_cauldron", 300, UpgradeEffect::CauldronUpgrade(2));

    match b.build() {
        Ok(registry) => registry,
        Err(e) => panic!("sample registry is invalid: {e}"),
    }
}

// ===========================================================================
// Ledgers
// ===========================================================================

/// Empty ledger with the default drop ranges.
pub fn sample_ledger() -> Ledger {
    Ledger::new(SessionConfig::default().drop_ranges)
}

/// Ledger holding `n` of every resource, with the change set cleared.
pub fn stocked_ledger(n: u64) -> Ledger {
    let mut ledger = sample_ledger();
    for kind in ResourceKind::ALL {
        ledger.credit(kind, n);
    }
    ledger.take_changed();
    ledger
}

// ===========================================================================
// Sessions
// ===========================================================================

/// Fresh session over the sample registry with default config.
pub fn sample_session(seed: u64) -> GameSession {
    GameSession::new(
        Arc::new(tea_garden_registry()),
        SessionConfig::default(),
        seed,
    )
}

/// Sample session that starts with `n` of every resource.
pub fn stocked_session(seed: u64, n: u64) -> GameSession {
    let mut config = SessionConfig::default();
    for kind in ResourceKind::ALL {
        config.starting_resources[kind] = n;
    }
    GameSession::new(Arc::new(tea_garden_registry()), config, seed)
}
