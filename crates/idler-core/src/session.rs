//! The game session: owns every per-player component and wires them together.
//!
//! # Advance order
//!
//! Each call to [`GameSession::advance`] runs, in order:
//!
//! 1. **Clock** -- add `dt` to session time.
//! 2. **Buff expiry** -- revert the buff if its time is up.
//! 3. **Brewing** -- count down; a finished brew is resolved, its reward
//!    credited and the chosen spirit's buff activated as of the moment the
//!    brew finished. A buff that already ran out within `dt` expires here.
//! 4. **Exploration** -- count down; a finished exploration draws a spirit.
//! 5. **Helpers** -- pay passive income for each full interval.
//!
//! Events are buffered throughout. The caller delivers or drains them.

use crate::brewing::{BrewOutcome, BrewState, Brewer};
use crate::buff::{ActiveBuff, BuffController};
use crate::config::SessionConfig;
use crate::discovery::{ExplorationOutcome, ExploreState, Explorer, ZoneButton};
use crate::error::ActionError;
use crate::event::{Event, EventBus, EventKind, PassiveListener};
use crate::fixed::{Seconds, clamp_non_negative};
use crate::id::{RecipeId, SpiritId, UpgradeId, ZoneId};
use crate::income::{HelperPayout, HelperTimer};
use crate::progress::{Progress, ZoneStatus};
use crate::query::{BuffSnapshot, SessionSnapshot, SpiritSnapshot, ZoneSnapshot};
use crate::recipe::IngredientCategory;
use crate::registry::Registry;
use crate::resource::{DropRange, ForageYield, Ledger, ResourceKind, ResourceMap};
use crate::shop::{self, Purchase};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// The durable part of a session. The caller picks the serializer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub resources: ResourceMap<u64>,
    /// Multipliers without any buff bonus.
    pub baseline_multipliers: ResourceMap<u32>,
    pub progress: Progress,
}

/// What happened during one [`GameSession::advance`] call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdvanceReport {
    pub buff_expired: Option<SpiritId>,
    pub brew: Option<BrewOutcome>,
    pub exploration: Option<ExplorationOutcome>,
    pub helper_income: Option<HelperPayout>,
}

pub struct GameSession {
    registry: Arc<Registry>,
    config: SessionConfig,
    ledger: Ledger,
    brewer: Brewer,
    buffs: BuffController,
    explorer: Explorer,
    progress: Progress,
    helper_timer: HelperTimer,
    now: Seconds,
    rng: ChaCha8Rng,
    events: EventBus,
}

impl std::fmt::Debug for GameSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameSession")
            .field("now", &self.now)
            .field("ledger", &self.ledger)
            .field("brewer", &self.brewer)
            .field("buffs", &self.buffs)
            .field("explorer", &self.explorer)
            .field("progress", &self.progress)
            .finish_non_exhaustive()
    }
}

impl GameSession {
    /// A new player: starting resources from `config`, starting unlocks from
    /// the registry.
    pub fn new(registry: Arc<Registry>, config: SessionConfig, seed: u64) -> Self {
        let ledger = Ledger::restore(
            config.drop_ranges,
            config.starting_resources,
            ResourceMap::splat(1),
        );
        let progress = Progress::new(&registry);
        Self::assemble(registry, config, ledger, progress, seed)
    }

    /// Resume from saved state. Every id in the saved progress must exist
    /// in `registry`. Starting unlocks added to the registry since the save
    /// are granted.
    pub fn from_state(
        registry: Arc<Registry>,
        config: SessionConfig,
        state: SessionState,
        seed: u64,
    ) -> Result<Self, ActionError> {
        let SessionState {
            resources,
            baseline_multipliers,
            mut progress,
        } = state;

        if let Some(&id) = progress
            .unlocked_spirits()
            .iter()
            .find(|id| registry.spirit(**id).is_none())
        {
            return Err(ActionError::UnknownSpirit(id));
        }
        if let Some(&id) = progress
            .unlocked_zones()
            .iter()
            .find(|id| registry.zone(**id).is_none())
        {
            return Err(ActionError::UnknownZone(id.0));
        }
        if let Some(&id) = progress
            .purchased_upgrades()
            .iter()
            .chain(progress.upgrade_cost_overrides().keys())
            .find(|id| registry.upgrade(**id).is_none())
        {
            return Err(ActionError::UnknownUpgrade(id));
        }
        for (id, zone) in registry.zones() {
            if zone.starts_unlocked {
                progress.unlock_zone(id);
            }
        }
        for (id, spirit) in registry.spirits() {
            if spirit.starts_unlocked {
                progress.unlock_spirit(id);
            }
        }

        let ledger = Ledger::restore(config.drop_ranges, resources, baseline_multipliers);
        Ok(Self::assemble(registry, config, ledger, progress, seed))
    }

    fn assemble(
        registry: Arc<Registry>,
        config: SessionConfig,
        ledger: Ledger,
        progress: Progress,
        seed: u64,
    ) -> Self {
        let events = EventBus::new(config.event_capacity);
        let brewer = Brewer::new(config.basket_capacity);
        Self {
            registry,
            config,
            ledger,
            brewer,
            buffs: BuffController::new(),
            explorer: Explorer::new(),
            progress,
            helper_timer: HelperTimer::new(),
            now: Seconds::ZERO,
            rng: ChaCha8Rng::seed_from_u64(seed),
            events,
        }
    }

    /// Durable state. Ingredients sitting in the basket are counted back
    /// into resources, and buff bonuses are left out of the multipliers.
    pub fn export_state(&self) -> SessionState {
        let mut resources = self.ledger.resources();
        for ingredient in self.brewer.basket() {
            let kind = ingredient.resource();
            resources[kind] = resources[kind].saturating_add(1);
        }
        SessionState {
            resources,
            baseline_multipliers: self.ledger.baseline_multipliers(),
            progress: self.progress.clone(),
        }
    }

    // -----------------------------------------------------------------------
    // Time
    // -----------------------------------------------------------------------

    /// Advance the session by `dt` seconds. Negative `dt` is treated as 0.
    pub fn advance(&mut self, dt: Seconds) -> AdvanceReport {
        let dt = clamp_non_negative(dt);
        self.now += dt;
        let mut report = AdvanceReport::default();

        if let Some(expired) = self.buffs.tick(self.now, &mut self.ledger) {
            report.buff_expired = Some(expired.source);
            self.emit_buff_expired(&expired);
        }

        let brew_left = self.brewer.time_left();
        if self.brewer.tick(dt).is_some() {
            let finished_at = self.now - dt + brew_left;
            report.brew = self.finish_brew(finished_at);
            // A long step may carry the new buff past its own expiry.
            if let Some(expired) = self.buffs.tick(self.now, &mut self.ledger) {
                report.buff_expired = Some(expired.source);
                self.emit_buff_expired(&expired);
            }
        }

        if let Some(outcome) =
            self.explorer
                .tick(dt, &self.registry, &mut self.progress, &mut self.rng)
        {
            if let ExplorationOutcome::Found { spirit, .. } = outcome {
                if let Some(def) = self.registry.spirit(spirit) {
                    tracing::info!(spirit = %def.name, "spirit discovered");
                }
                self.events.emit(Event::SpiritUnlocked {
                    spirit,
                    at: self.now,
                });
            }
            self.events.emit(Event::ExplorationResolved {
                outcome,
                at: self.now,
            });
            report.exploration = Some(outcome);
        }

        report.helper_income = self.helper_timer.tick(
            dt,
            self.config.helper_interval,
            self.progress.helpers(),
            &mut self.ledger,
        );

        self.flush_resource_changes();
        report
    }

    /// Resolve the brew that completed at `finished_at`; its buff starts then.
    fn finish_brew(&mut self, finished_at: Seconds) -> Option<BrewOutcome> {
        let outcome = match self.brewer.resolve(
            &self.registry,
            &self.progress,
            &mut self.ledger,
            self.config.base_reward,
            &mut self.rng,
        ) {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!(error = %e, "finished brew could not be resolved");
                return None;
            }
        };

        if let BrewOutcome::Rewarded { spirit, .. } = &outcome
            && let Some(buff) = self.registry.spirit(*spirit).map(|def| def.buff.clone())
        {
            if let Some(displaced) =
                self.buffs
                    .activate(*spirit, &buff, finished_at, &mut self.ledger)
            {
                self.emit_buff_expired(&displaced);
            }
            self.events.emit(Event::BuffApplied {
                spirit: *spirit,
                expires_at: finished_at + buff.duration,
                at: self.now,
            });
        }

        self.events.emit(Event::BrewResolved {
            outcome: outcome.clone(),
            at: self.now,
        });
        Some(outcome)
    }

    fn emit_buff_expired(&mut self, buff: &ActiveBuff) {
        self.events.emit(Event::BuffExpired {
            spirit: buff.source,
            at: self.now,
        });
    }

    fn flush_resource_changes(&mut self) {
        if self.ledger.has_changes() {
            let changed = self.ledger.take_changed();
            self.events.emit(Event::ResourcesChanged {
                changed,
                at: self.now,
            });
        }
    }

    // -----------------------------------------------------------------------
    // Drops
    // -----------------------------------------------------------------------

    /// Grant a drop of `kind` drawn from `range` scaled by its multiplier.
    pub fn grant_random_drop(&mut self, kind: ResourceKind, range: DropRange) -> u64 {
        let amount = self.ledger.grant_random_drop(kind, range, &mut self.rng);
        self.flush_resource_changes();
        amount
    }

    /// Cloud click.
    pub fn droplet_drop(&mut self) -> u64 {
        let amount = self.ledger.droplet_drop(&mut self.rng);
        self.flush_resource_changes();
        amount
    }

    /// Bush click.
    pub fn forage_drop(&mut self) -> ForageYield {
        let yielded = self.ledger.forage_drop(&mut self.rng);
        self.flush_resource_changes();
        yielded
    }

    // -----------------------------------------------------------------------
    // Brewing
    // -----------------------------------------------------------------------

    pub fn add_ingredient(&mut self, ingredient: IngredientCategory) -> Result<(), ActionError> {
        let buff_active = self.buffs.is_active(self.now);
        self.brewer
            .add_ingredient(ingredient, &mut self.ledger, buff_active)?;
        self.flush_resource_changes();
        Ok(())
    }

    pub fn start_brew(&mut self) -> Result<(RecipeId, Seconds), ActionError> {
        let buff_active = self.buffs.is_active(self.now);
        let result = self.brewer.start_brew(
            &self.registry,
            self.progress.brew_speed(),
            &mut self.ledger,
            buff_active,
        );
        // A rejected basket may have been refunded.
        self.flush_resource_changes();
        let (recipe, duration) = result?;
        self.events.emit(Event::BrewStarted {
            recipe,
            duration,
            at: self.now,
        });
        Ok((recipe, duration))
    }

    pub fn cancel_brew(&mut self) -> Result<Vec<IngredientCategory>, ActionError> {
        let refunded = self.brewer.cancel_brew(&mut self.ledger)?;
        self.flush_resource_changes();
        self.events.emit(Event::BrewCancelled {
            refunded: refunded.clone(),
            at: self.now,
        });
        Ok(refunded)
    }

    pub fn clear_basket(&mut self) -> Result<Vec<IngredientCategory>, ActionError> {
        let refunded = self.brewer.clear_basket(&mut self.ledger)?;
        self.flush_resource_changes();
        Ok(refunded)
    }

    // -----------------------------------------------------------------------
    // Exploration
    // -----------------------------------------------------------------------

    pub fn select_zone(&mut self, index: u32) -> Result<ZoneId, ActionError> {
        self.explorer
            .select_zone(index, &self.registry, &self.progress)
    }

    pub fn cancel_selection(&mut self) -> Option<ZoneId> {
        self.explorer.cancel_selection()
    }

    pub fn start_exploration(&mut self) -> Result<(ZoneId, Seconds), ActionError> {
        let (zone, duration) = self
            .explorer
            .start_exploration(&self.registry, &self.progress)?;
        self.events.emit(Event::ExplorationStarted {
            zone,
            duration,
            at: self.now,
        });
        Ok((zone, duration))
    }

    pub fn cancel_exploration(&mut self) -> Result<ZoneId, ActionError> {
        let zone = self.explorer.cancel_exploration()?;
        self.events.emit(Event::ExplorationCancelled { zone, at: self.now });
        Ok(zone)
    }

    /// Make `zone` explorable. Returns `true` if it was newly unlocked.
    pub fn unlock_zone(&mut self, zone: ZoneId) -> Result<bool, ActionError> {
        let Some(def) = self.registry.zone(zone) else {
            tracing::warn!(zone = zone.0, "unlock requested for unknown zone");
            return Err(ActionError::UnknownZone(zone.0));
        };
        let newly = self.progress.unlock_zone(zone);
        if newly {
            tracing::info!(zone = %def.name, "zone unlocked");
            self.events.emit(Event::ZoneUnlocked { zone, at: self.now });
        }
        Ok(newly)
    }

    // -----------------------------------------------------------------------
    // Shop
    // -----------------------------------------------------------------------

    pub fn purchase_upgrade(&mut self, upgrade: UpgradeId) -> Result<Purchase, ActionError> {
        let purchase = shop::purchase(
            &self.registry,
            upgrade,
            &mut self.ledger,
            &mut self.progress,
        )
        .inspect_err(|e| {
            if e.is_contract_violation() {
                tracing::warn!(upgrade = upgrade.0, "purchase requested for unknown upgrade");
            }
        })?;
        self.flush_resource_changes();
        self.events.emit(Event::UpgradePurchased {
            upgrade,
            paid: purchase.paid,
            at: self.now,
        });
        Ok(purchase)
    }

    /// Current price of `upgrade`, or `None` for an unknown id.
    pub fn upgrade_cost(&self, upgrade: UpgradeId) -> Option<u64> {
        shop::current_cost(&self.registry, &self.progress, upgrade)
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn now(&self) -> Seconds {
        self.now
    }

    pub fn resource(&self, kind: ResourceKind) -> u64 {
        self.ledger.get(kind)
    }

    pub fn resources(&self) -> ResourceMap<u64> {
        self.ledger.resources()
    }

    pub fn multipliers(&self) -> ResourceMap<u32> {
        self.ledger.multipliers()
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn progress(&self) -> &Progress {
        &self.progress
    }

    pub fn basket(&self) -> &[IngredientCategory] {
        self.brewer.basket()
    }

    pub fn brew_state(&self) -> BrewState {
        self.brewer.state()
    }

    pub fn brew_time_left(&self) -> Seconds {
        self.brewer.time_left()
    }

    pub fn is_buff_active(&self) -> bool {
        self.buffs.is_active(self.now)
    }

    pub fn buff_time_left(&self) -> Seconds {
        self.buffs.time_left(self.now)
    }

    pub fn active_buff(&self) -> Option<&ActiveBuff> {
        self.buffs.active()
    }

    pub fn explore_state(&self) -> ExploreState {
        self.explorer.state()
    }

    pub fn exploration_time_left(&self) -> Seconds {
        self.explorer.time_left()
    }

    pub fn selected_zone(&self) -> Option<ZoneId> {
        self.explorer.selected()
    }

    pub fn is_spirit_unlocked(&self, spirit: SpiritId) -> bool {
        self.progress.is_spirit_unlocked(spirit)
    }

    pub fn zone_status(&self, zone: ZoneId) -> Result<ZoneStatus, ActionError> {
        let def = self
            .registry
            .zone(zone)
            .ok_or(ActionError::UnknownZone(zone.0))?;
        Ok(self.progress.zone_status(zone, def))
    }

    pub fn zone_button(&self, zone: ZoneId) -> Result<ZoneButton, ActionError> {
        let status = self.zone_status(zone)?;
        Ok(ZoneButton::compute(
            zone,
            status.unlocked,
            status.complete,
            self.explorer.is_exploring(),
        ))
    }

    /// Owned view of everything on screen.
    pub fn snapshot(&self) -> SessionSnapshot {
        let exploring = self.explorer.is_exploring();
        let zones = self
            .registry
            .zones()
            .map(|(id, def)| {
                let status = self.progress.zone_status(id, def);
                ZoneSnapshot {
                    id,
                    name: def.name.clone(),
                    status,
                    button: ZoneButton::compute(id, status.unlocked, status.complete, exploring),
                }
            })
            .collect();
        let spirits = self
            .registry
            .spirits()
            .map(|(id, def)| SpiritSnapshot {
                id,
                name: def.name.clone(),
                unlocked: self.progress.is_spirit_unlocked(id),
            })
            .collect();
        let buff = self
            .buffs
            .active()
            .filter(|b| b.is_active(self.now))
            .map(|b| BuffSnapshot {
                source: b.source,
                multiplier: b.multiplier,
                time_left: b.time_left(self.now),
            });

        SessionSnapshot {
            now: self.now,
            resources: self.ledger.resources(),
            multipliers: self.ledger.multipliers(),
            basket: self.brewer.basket().to_vec(),
            brew_state: self.brewer.state(),
            brew_time_left: self.brewer.time_left(),
            buff,
            explore_state: self.explorer.state(),
            explore_time_left: self.explorer.time_left(),
            selected_zone: self.explorer.selected(),
            zones,
            spirits,
            helpers: self.progress.helpers(),
        }
    }

    // -----------------------------------------------------------------------
    // Events
    // -----------------------------------------------------------------------

    pub fn on_event(&mut self, kind: EventKind, listener: PassiveListener) {
        self.events.on_passive(kind, listener);
    }

    pub fn events_mut(&mut self) -> &mut EventBus {
        &mut self.events
    }

    /// Run listeners for every buffered event.
    pub fn deliver_events(&mut self) {
        self.events.deliver();
    }

    /// Take buffered events without running listeners.
    pub fn drain_events(&mut self) -> Vec<Event> {
        self.events.drain()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;
    use IngredientCategory::*;

    fn brew(session: &mut GameSession, items: &[IngredientCategory]) -> (RecipeId, Seconds) {
        for &i in items {
            session.add_ingredient(i).unwrap();
        }
        session.start_brew().unwrap()
    }

    #[test]
    fn new_session_uses_starting_resources() {
        let s = stocked_session(1, 5);
        assert_eq!(s.resources(), ResourceMap::splat(5));
        assert_eq!(s.multipliers(), ResourceMap::splat(1));
        assert_eq!(s.now(), Seconds::ZERO);
    }

    #[test]
    fn drops_emit_resources_changed() {
        let mut s = sample_session(3);
        let amount = s.droplet_drop();
        assert!((1..=3).contains(&amount));
        let events = s.drain_events();
        assert_eq!(
            events,
            vec![Event::ResourcesChanged {
                changed: vec![ResourceKind::Droplets],
                at: Seconds::ZERO
            }]
        );
    }

    #[test]
    fn rewarded_brew_activates_buff_and_blocks_cauldron() {
        let mut s = stocked_session(7, 6);
        let (_, duration) = brew(&mut s, &[Leaf, Leaf, Leaf]);
        let report = s.advance(duration);

        let hearth = s.registry().spirit_id("hearth_sprite").unwrap();
        assert!(matches!(
            report.brew,
            Some(BrewOutcome::Rewarded { spirit, reward: 20, .. }) if spirit == hearth
        ));
        assert_eq!(s.resource(ResourceKind::Droplets), 26);
        assert!(s.is_buff_active());
        assert_eq!(s.buff_time_left(), secs(30));
        assert_eq!(s.multipliers().droplets, 2);

        assert_eq!(s.add_ingredient(Leaf), Err(ActionError::BuffActive));

        let report = s.advance(secs(30));
        assert_eq!(report.buff_expired, Some(hearth));
        assert_eq!(s.multipliers(), ResourceMap::splat(1));
        s.add_ingredient(Leaf).unwrap();
    }

    #[test]
    fn brew_events_in_order() {
        let mut s = stocked_session(7, 6);
        let (recipe, duration) = brew(&mut s, &[Leaf, Leaf, Leaf]);
        s.advance(duration);
        let kinds: Vec<EventKind> = s.drain_events().iter().map(Event::kind).collect();
        assert_eq!(
            kinds,
            vec![
                EventKind::ResourcesChanged,
                EventKind::ResourcesChanged,
                EventKind::ResourcesChanged,
                EventKind::BrewStarted,
                EventKind::BuffApplied,
                EventKind::BrewResolved,
                EventKind::ResourcesChanged,
            ]
        );
        assert_eq!(s.registry().recipe(recipe).unwrap().name, "forest_tea");
    }

    #[test]
    fn cancel_brew_restores_counts() {
        let mut s = stocked_session(2, 4);
        let before = s.resources();
        brew(&mut s, &[Leaf, Berry, Leaf]);
        s.advance(secs(2));
        s.cancel_brew().unwrap();
        assert_eq!(s.resources(), before);
        assert_eq!(s.brew_state(), BrewState::Idle);
        assert_eq!(s.advance(secs(10)).brew, None);
    }

    #[test]
    fn exploration_unlocks_spirit() {
        let mut s = sample_session(11);
        let forest = s.registry().zone_id("forest").unwrap();
        s.select_zone(forest.0).unwrap();
        s.start_exploration().unwrap();
        assert!(!s.zone_button(forest).unwrap().interactable);

        let report = s.advance(secs(10));
        let Some(ExplorationOutcome::Found { spirit, .. }) = report.exploration else {
            panic!("expected a spirit, got {:?}", report.exploration);
        };
        assert!(s.is_spirit_unlocked(spirit));
        assert_eq!(s.zone_status(forest).unwrap().found, 1);
        assert!(
            s.drain_events()
                .contains(&Event::SpiritUnlocked { spirit, at: secs(10) })
        );
    }

    #[test]
    fn unlock_zone_is_idempotent() {
        let mut s = sample_session(0);
        let mountain = s.registry().zone_id("mountain").unwrap();
        assert_eq!(s.select_zone(mountain.0), Err(ActionError::ZoneLocked(mountain)));
        assert_eq!(s.unlock_zone(mountain), Ok(true));
        assert_eq!(s.unlock_zone(mountain), Ok(false));
        assert_eq!(s.select_zone(mountain.0), Ok(mountain));
        assert_eq!(s.unlock_zone(ZoneId(99)), Err(ActionError::UnknownZone(99)));
    }

    #[test]
    fn helpers_pay_on_interval() {
        let mut s = stocked_session(0, 0);
        s.ledger.credit(ResourceKind::Droplets, 200);
        let helper = s.registry().upgrade_id("garden_helper").unwrap();
        s.purchase_upgrade(helper).unwrap();
        assert_eq!(s.upgrade_cost(helper), Some(400));

        assert_eq!(s.advance(secs(4)).helper_income, None);
        let payout = s.advance(secs(1)).helper_income.unwrap();
        assert_eq!(payout.granted.leaves, 1);
        assert_eq!(s.resources(), ResourceMap::splat(1));
    }

    #[test]
    fn cauldron_upgrade_halves_brew_time() {
        let mut s = stocked_session(0, 6);
        s.ledger.credit(ResourceKind::Droplets, 300);
        let cauldron = s.registry().upgrade_id("copper_cauldron").unwrap();
        s.purchase_upgrade(cauldron).unwrap();
        let (_, duration) = brew(&mut s, &[Leaf, Leaf, Leaf]);
        assert_eq!(duration, secs(2));
    }

    #[test]
    fn export_counts_basket_and_drops_buff() {
        let mut s = stocked_session(7, 6);
        let (_, duration) = brew(&mut s, &[Leaf, Leaf, Leaf]);
        s.advance(duration);
        assert_eq!(s.multipliers().droplets, 2);

        let mut s2 = stocked_session(1, 2);
        s2.add_ingredient(Berry).unwrap();
        let state = s2.export_state();
        assert_eq!(state.resources.berries, 2);

        let state = s.export_state();
        assert_eq!(state.baseline_multipliers, ResourceMap::splat(1));

        let restored = GameSession::from_state(
            Arc::clone(s.registry()),
            SessionConfig::default(),
            state.clone(),
            9,
        )
        .unwrap();
        assert_eq!(restored.resources(), state.resources);
        assert_eq!(restored.progress(), s.progress());
        assert!(!restored.is_buff_active());
    }

    #[test]
    fn from_state_rejects_unknown_spirit() {
        let s = sample_session(0);
        let mut state = s.export_state();
        state.progress.unlock_spirit(SpiritId(77));
        let err = GameSession::from_state(
            Arc::clone(s.registry()),
            SessionConfig::default(),
            state,
            0,
        )
        .unwrap_err();
        assert_eq!(err, ActionError::UnknownSpirit(SpiritId(77)));
    }

    #[test]
    fn from_state_rejects_unknown_zone() {
        let s = sample_session(0);
        let mut state = s.export_state();
        state.progress.unlock_zone(ZoneId(99));
        let err = GameSession::from_state(
            Arc::clone(s.registry()),
            SessionConfig::default(),
            state,
            0,
        )
        .unwrap_err();
        assert_eq!(err, ActionError::UnknownZone(99));
    }

    #[test]
    fn from_state_rejects_unknown_upgrade_cost() {
        let s = sample_session(0);
        let mut state = s.export_state();
        state.progress.set_upgrade_cost(UpgradeId(42), 800);
        let err = GameSession::from_state(
            Arc::clone(s.registry()),
            SessionConfig::default(),
            state,
            0,
        )
        .unwrap_err();
        assert_eq!(err, ActionError::UnknownUpgrade(UpgradeId(42)));
    }

    #[test]
    fn add_ingredient_rejected_mid_brew() {
        let mut s = stocked_session(2, 4);
        brew(&mut s, &[Leaf, Leaf, Leaf]);
        let before = s.resources();
        assert_eq!(
            s.add_ingredient(Flower),
            Err(ActionError::InvalidTransition {
                action: "add ingredients",
                state: "brewing",
            })
        );
        assert_eq!(s.resources(), before);
        assert_eq!(s.basket(), &[Leaf, Leaf, Leaf]);
    }

    #[test]
    fn buff_starts_when_the_brew_finishes() {
        let mut s = stocked_session(7, 6);
        let hearth = s.registry().spirit_id("hearth_sprite").unwrap();

        // forest_tea takes 4s; the buff lasts 30s from t=4.
        brew(&mut s, &[Leaf, Leaf, Leaf]);
        s.advance(secs(10));
        assert!(s.is_buff_active());
        assert_eq!(s.buff_time_left(), secs(24));

        // A single long step runs the buff out entirely.
        let mut s = stocked_session(7, 6);
        brew(&mut s, &[Leaf, Leaf, Leaf]);
        let report = s.advance(secs(100));
        assert!(matches!(report.brew, Some(BrewOutcome::Rewarded { .. })));
        assert_eq!(report.buff_expired, Some(hearth));
        assert!(!s.is_buff_active());
        assert_eq!(s.multipliers(), ResourceMap::splat(1));
        s.add_ingredient(Leaf).unwrap();

        let applied = s
            .drain_events()
            .into_iter()
            .find_map(|e| match e {
                Event::BuffApplied { expires_at, .. } => Some(expires_at),
                _ => None,
            });
        assert_eq!(applied, Some(secs(34)));
    }

    #[test]
    fn snapshot_reflects_state() {
        let mut s = stocked_session(4, 3);
        s.add_ingredient(Flower).unwrap();
        let snap = s.snapshot();
        assert_eq!(snap.basket, vec![Flower]);
        assert_eq!(snap.resources.flowers, 2);
        assert_eq!(snap.zones.len(), 2);
        assert_eq!(snap.spirits.iter().filter(|sp| sp.unlocked).count(), 1);
        assert!(snap.buff.is_none());
    }

    #[test]
    fn listeners_receive_delivered_events() {
        use std::cell::Cell;
        use std::rc::Rc;

        let mut s = sample_session(0);
        let count = Rc::new(Cell::new(0));
        let c = Rc::clone(&count);
        s.on_event(
            EventKind::ResourcesChanged,
            Box::new(move |_| c.set(c.get() + 1)),
        );
        s.droplet_drop();
        s.forage_drop();
        s.deliver_events();
        assert_eq!(count.get(), 2);
        assert!(s.drain_events().is_empty());
    }
}
