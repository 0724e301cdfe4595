//! Headless session: load the bundled data directory and play a few minutes.
//!
//! Clicks for resources, brews whatever the basket can make, explores the
//! forest, and buys upgrades when affordable. Prints the event stream as it
//! goes.
//!
//! Run with: `RUST_LOG=debug cargo run -p idler-data --example headless_session`

use idler_core::brewing::BrewOutcome;
use idler_core::fixed::{fixed64_to_f64, secs};
use idler_core::recipe::IngredientCategory;
use idler_core::resource::ResourceKind;
use idler_core::session::GameSession;
use std::path::Path;
use std::sync::Arc;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("data");
    let data = idler_data::load_game_data(&dir).expect("load bundled data");
    let registry = Arc::new(data.registry);
    let mut session = GameSession::new(Arc::clone(&registry), data.config, 2024);

    let forest = registry.zone_id("forest").expect("forest zone");
    let forest_tea = registry.recipe_id("forest_tea").expect("forest tea");
    let recipe = registry.recipe(forest_tea).expect("forest tea def");

    for minute in 0..3 {
        for _ in 0..60 {
            // A click a second on each source.
            session.droplet_drop();
            session.forage_drop();

            if session.brew_state().name() == "idle" && !session.is_buff_active() {
                let needed = recipe.requires.get(IngredientCategory::Leaf);
                if session.resource(ResourceKind::Leaves) >= u64::from(needed) {
                    for _ in 0..needed {
                        session
                            .add_ingredient(IngredientCategory::Leaf)
                            .expect("add leaf");
                    }
                    session.start_brew().expect("forest tea matches");
                }
            }

            if session.explore_state().name() != "exploring"
                && session.select_zone(forest.0).is_ok()
            {
                session.start_exploration().expect("forest is open");
            }

            let report = session.advance(secs(1));
            if let Some(BrewOutcome::Rewarded { reward, spirit, .. }) = report.brew {
                let name = &registry.spirit(spirit).expect("spirit def").name;
                println!("  {name} enjoyed the tea: +{reward} droplets");
            }
        }

        for (id, def) in registry.upgrades() {
            if session.purchase_upgrade(id).is_ok() {
                println!("  bought {}", def.name);
            }
        }

        let snapshot = session.snapshot();
        println!(
            "minute {}: t={:.1}s droplets={} leaves={} berries={} flowers={} helpers={}",
            minute + 1,
            fixed64_to_f64(snapshot.now),
            snapshot.resources.droplets,
            snapshot.resources.leaves,
            snapshot.resources.berries,
            snapshot.resources.flowers,
            snapshot.helpers,
        );
        for zone in &snapshot.zones {
            println!(
                "  {}: {}/{} spirits found",
                zone.name, zone.status.found, zone.status.total
            );
        }
    }

    let events = session.drain_events();
    println!("{} events buffered at the end", events.len());
}
