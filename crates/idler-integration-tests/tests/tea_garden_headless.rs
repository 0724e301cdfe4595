//! Headless play-throughs of the bundled tea-garden data.
//!
//! Loads `idler-data/data` from disk, builds sessions on the resulting
//! registry, and drives them the way a UI would: clicks, brewing, exploring,
//! shopping, listeners, and saving/restoring.

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;

use idler_core::brewing::BrewOutcome;
use idler_core::discovery::ZoneBadge;
use idler_core::event::{Event, EventKind};
use idler_core::fixed::secs;
use idler_core::recipe::IngredientCategory;
use idler_core::resource::ResourceKind;
use idler_core::session::{GameSession, SessionState};
use idler_data::{GameData, load_game_data};

fn bundled_data() -> GameData {
    let dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../idler-data/data");
    load_game_data(&dir).unwrap()
}

fn bundled_session(seed: u64) -> GameSession {
    let data = bundled_data();
    GameSession::new(Arc::new(data.registry), data.config, seed)
}

fn rich_session(seed: u64, droplets: u64) -> GameSession {
    let data = bundled_data();
    let mut config = data.config;
    config.starting_resources[ResourceKind::Droplets] = droplets;
    GameSession::new(Arc::new(data.registry), config, seed)
}

/// Explore `zone` until every spirit in it has been found.
fn clear_zone(s: &mut GameSession, zone_name: &str) {
    let zone = s.registry().zone_id(zone_name).unwrap();
    while !s.zone_status(zone).unwrap().complete {
        s.select_zone(zone.0).unwrap();
        let (_, duration) = s.start_exploration().unwrap();
        s.advance(duration);
    }
}

// ===========================================================================
// Test 1: Bundled data loads with the expected shape
// ===========================================================================

#[test]
fn bundled_data_loads() {
    let data = bundled_data();
    let reg = &data.registry;
    assert_eq!(reg.recipes().len(), 6);
    assert_eq!(reg.spirit_count(), 6);
    assert_eq!(reg.zone_count(), 3);
    assert_eq!(reg.upgrades().count(), 4);
    assert_eq!(data.config.base_reward, 10);

    let s = GameSession::new(Arc::new(data.registry), data.config, 1);
    let hearth = s.registry().spirit_id("hearth_sprite").unwrap();
    assert!(s.is_spirit_unlocked(hearth));
    let forest = s.registry().zone_id("forest").unwrap();
    let mountain = s.registry().zone_id("mountain").unwrap();
    assert_eq!(s.zone_button(forest).unwrap().badge, ZoneBadge::Open);
    assert_eq!(s.zone_button(mountain).unwrap().badge, ZoneBadge::Locked);
}

// ===========================================================================
// Test 2: Every spirit can be found
// ===========================================================================

#[test]
fn every_zone_can_be_cleared() {
    let mut s = bundled_session(17);
    clear_zone(&mut s, "forest");

    for name in ["mountain", "riverbank"] {
        let zone = s.registry().zone_id(name).unwrap();
        assert!(s.unlock_zone(zone).unwrap());
        assert!(!s.unlock_zone(zone).unwrap());
        clear_zone(&mut s, name);
    }

    let all_found = s
        .registry()
        .spirits()
        .all(|(id, _)| s.is_spirit_unlocked(id));
    assert!(all_found);
    let snapshot = s.snapshot();
    assert!(snapshot.zones.iter().all(|z| z.button.badge == ZoneBadge::Complete));
    assert!(snapshot.zones.iter().all(|z| !z.button.interactable));
    // 10 + 10 + 20 + 20 + 15
    assert_eq!(s.now(), secs(75));
}

// ===========================================================================
// Test 3: Clicking into a brew
// ===========================================================================

#[test]
fn clicks_pay_for_a_forest_tea() {
    let mut s = bundled_session(3);
    while s.resource(ResourceKind::Leaves) < 3 {
        s.forage_drop();
    }
    for _ in 0..3 {
        s.add_ingredient(IngredientCategory::Leaf).unwrap();
    }
    let forest_tea = s.registry().recipe_id("forest_tea").unwrap();
    let (recipe, duration) = s.start_brew().unwrap();
    assert_eq!(recipe, forest_tea);
    assert_eq!(duration, secs(4));

    // hearth_sprite is the only unlocked spirit that likes forest tea.
    let hearth = s.registry().spirit_id("hearth_sprite").unwrap();
    let report = s.advance(duration);
    assert_eq!(
        report.brew,
        Some(BrewOutcome::Rewarded {
            recipe: forest_tea,
            spirit: hearth,
            reward: 20,
        })
    );
    assert!(s.is_buff_active());
    assert_eq!(s.buff_time_left(), secs(30));
}

// ===========================================================================
// Test 4: Shop and helper income
// ===========================================================================

#[test]
fn helpers_pay_every_interval() {
    let mut s = rich_session(5, 1000);
    let reg = Arc::clone(s.registry());
    let barrel = reg.upgrade_id("rain_barrel").unwrap();
    let helper = reg.upgrade_id("garden_helper").unwrap();

    s.purchase_upgrade(barrel).unwrap();
    let first = s.purchase_upgrade(helper).unwrap();
    assert_eq!(first.paid, 200);
    assert_eq!(s.upgrade_cost(helper), Some(400));
    assert_eq!(s.resource(ResourceKind::Droplets), 700);

    let report = s.advance(secs(4));
    assert!(report.helper_income.is_none());
    let payout = s.advance(secs(1)).helper_income.unwrap();
    assert_eq!(payout.helpers, 1);
    assert_eq!(payout.granted.droplets, 2);
    assert_eq!(payout.granted.leaves, 1);
    assert_eq!(s.resource(ResourceKind::Droplets), 702);

    s.purchase_upgrade(helper).unwrap();
    let payout = s.advance(secs(5)).helper_income.unwrap();
    assert_eq!(payout.helpers, 2);
    assert_eq!(payout.granted.droplets, 4);
    assert_eq!(payout.granted.flowers, 2);
}

#[test]
fn copper_cauldron_halves_brew_time() {
    let mut s = rich_session(8, 1000);
    let cauldron = s.registry().upgrade_id("copper_cauldron").unwrap();
    s.purchase_upgrade(cauldron).unwrap();
    while s.resource(ResourceKind::Leaves) < 3 {
        s.forage_drop();
    }
    for _ in 0..3 {
        s.add_ingredient(IngredientCategory::Leaf).unwrap();
    }
    let (_, duration) = s.start_brew().unwrap();
    assert_eq!(duration, secs(2));
    assert!(s.purchase_upgrade(cauldron).is_err());
}

// ===========================================================================
// Test 5: Passive listeners
// ===========================================================================

#[test]
fn listeners_hear_discoveries_by_name() {
    let mut s = bundled_session(21);
    let reg = Arc::clone(s.registry());
    let heard: Rc<RefCell<BTreeSet<String>>> = Rc::new(RefCell::new(BTreeSet::new()));
    let sink = Rc::clone(&heard);
    s.on_event(
        EventKind::SpiritUnlocked,
        Box::new(move |event| {
            if let Event::SpiritUnlocked { spirit, .. } = event {
                let name = reg.spirit(*spirit).unwrap().name.clone();
                sink.borrow_mut().insert(name);
            }
        }),
    );

    clear_zone(&mut s, "forest");
    assert!(heard.borrow().is_empty());
    s.deliver_events();

    let expected: BTreeSet<String> = ["dew_moth", "moss_fox"].iter().map(|n| n.to_string()).collect();
    assert_eq!(*heard.borrow(), expected);
    assert_eq!(s.events_mut().buffered_count(), 0);
}

// ===========================================================================
// Test 6: Save, reload data, restore
// ===========================================================================

#[test]
fn save_survives_a_fresh_data_load() {
    let mut s = rich_session(13, 600);
    let helper = s.registry().upgrade_id("garden_helper").unwrap();
    s.purchase_upgrade(helper).unwrap();
    clear_zone(&mut s, "forest");

    let json = serde_json::to_string(&s.export_state()).unwrap();

    // A new process loads the data again and restores the save.
    let data = bundled_data();
    let state: SessionState = serde_json::from_str(&json).unwrap();
    let mut restored = GameSession::from_state(Arc::new(data.registry), data.config, state, 13).unwrap();

    assert_eq!(restored.resources(), s.resources());
    assert_eq!(restored.progress(), s.progress());
    assert_eq!(restored.upgrade_cost(helper), Some(400));
    let forest = restored.registry().zone_id("forest").unwrap();
    assert_eq!(restored.zone_button(forest).unwrap().badge, ZoneBadge::Complete);

    let payout = restored.advance(secs(5)).helper_income.unwrap();
    assert_eq!(payout.helpers, 1);
}
