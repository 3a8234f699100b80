//! The engine facade: one owner for companions, effects, and config.
//!
//! [`Engine`] is the single entry point a host application talks to. It
//! keeps the companion manager and the effect registry consistent: every
//! structural change to a companion (population, forms, active form, level
//! reset, evolution, XP award) is followed by a registry sync, so no caller
//! ever observes a registry that disagrees with the companions.
//!
//! Time is always supplied by the caller. The engine never reads a clock.

use chrono::{DateTime, Utc};
use reverie_effects::{EffectRegistry, EventOutcome, SyncReport};
use reverie_progression::{CompanionManager, ProgressionError, RepairWarning, XpOutcome};
use reverie_types::{
    Companion, CompanionId, CompanionView, EffectId, EffectRecord, EventCategory, EvolutionRecord,
    Form, FormId, XpSource,
};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::config::EngineConfig;
use crate::snapshot::{Snapshot, SnapshotError, SnapshotStore};

/// Decimal places kept when scaling a clarity reward.
const CLARITY_DECIMAL_PLACES: u32 = 2;

/// Result of one XP award across one or more companions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XpAward {
    /// Compound XP multiplier applied to every companion.
    pub multiplier: Decimal,
    /// Per-companion outcomes, for ids that were found.
    pub outcomes: Vec<XpOutcome>,
    /// Expired effect records pruned before the award.
    pub pruned: Vec<EffectId>,
    /// Registry changes made by the post-award sync.
    pub sync: SyncReport,
}

impl XpAward {
    /// Every evolution triggered by the award, in order.
    pub fn evolutions(&self) -> impl Iterator<Item = &EvolutionRecord> {
        self.outcomes.iter().flat_map(|o| o.evolutions.iter())
    }
}

/// Companion progression and effect engine.
#[derive(Debug, Clone)]
pub struct Engine {
    config: EngineConfig,
    manager: CompanionManager,
    effects: EffectRegistry,
}

impl Engine {
    /// An engine with no companions and an empty registry.
    pub const fn new(config: EngineConfig) -> Self {
        let manager = CompanionManager::new(config.progression());
        Self {
            config,
            manager,
            effects: EffectRegistry::new(),
        }
    }

    /// Hydrate an engine from a snapshot, repairing it and syncing once.
    ///
    /// Returns the repairs applied to companion data. Registry drift is
    /// corrected silently by the initial sync.
    pub fn load(config: EngineConfig, snapshot: Snapshot) -> (Self, Vec<RepairWarning>) {
        let Snapshot {
            companions,
            effects,
            recent_evolutions,
            recent_xp,
        } = snapshot;
        let (manager, warnings) = CompanionManager::restore(
            config.progression(),
            companions,
            recent_evolutions,
            recent_xp,
        );
        let mut engine = Self {
            config,
            manager,
            effects,
        };
        let report = engine.sync();
        tracing::info!(
            companions = engine.manager.companions().len(),
            effects = engine.effects.len(),
            repairs = warnings.len(),
            registry_writes = report.writes(),
            "engine loaded"
        );
        (engine, warnings)
    }

    /// Load from `store`, or start empty if it holds nothing yet.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError`] if the store cannot be read or decoded.
    pub fn open(
        config: EngineConfig,
        store: &impl SnapshotStore,
    ) -> Result<(Self, Vec<RepairWarning>), SnapshotError> {
        let snapshot = store.load()?.unwrap_or_default();
        Ok(Self::load(config, snapshot))
    }

    /// Capture the full state for persistence.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            companions: self.manager.companions().to_vec(),
            effects: self.effects.clone(),
            recent_evolutions: self.manager.recent_evolutions().iter().cloned().collect(),
            recent_xp: self.manager.recent_xp().iter().cloned().collect(),
        }
    }

    /// Write the current state to `store`.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError`] if the store rejects the write.
    pub fn save(&self, store: &mut impl SnapshotStore) -> Result<(), SnapshotError> {
        store.save(&self.snapshot())
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Active configuration.
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The companion manager, for read access.
    pub const fn manager(&self) -> &CompanionManager {
        &self.manager
    }

    /// The effect registry, for read access.
    pub const fn effects(&self) -> &EffectRegistry {
        &self.effects
    }

    /// Every companion, in display order.
    pub fn companions(&self) -> &[Companion] {
        self.manager.companions()
    }

    /// Display view of one companion.
    pub fn view(&self, id: &CompanionId) -> Option<CompanionView> {
        self.manager.view(id)
    }

    /// Display views of every companion.
    pub fn views(&self) -> Vec<CompanionView> {
        self.manager.views()
    }

    /// Records that are active and unexpired at `now`.
    pub fn active_effects(&self, now: DateTime<Utc>) -> Vec<&EffectRecord> {
        self.effects.active_records(now).collect()
    }

    /// Compound multiplier for `category` at `now`, without side effects.
    pub fn multiplier(&self, category: EventCategory, now: DateTime<Utc>) -> Decimal {
        reverie_effects::multiplier_for(&self.effects, category, now)
    }

    /// Aggregate effects for one event without pruning or rounding.
    pub fn preview_event(
        &self,
        category: EventCategory,
        base: Decimal,
        now: DateTime<Utc>,
    ) -> EventOutcome {
        reverie_effects::apply_event(&self.effects, category, base, now)
    }

    // -----------------------------------------------------------------------
    // Events
    // -----------------------------------------------------------------------

    /// Award `source` XP to each of `ids`, scaled by the current XP
    /// multiplier.
    ///
    /// Expired records found while aggregating are pruned first. Unknown ids
    /// are skipped.
    pub fn award_xp(
        &mut self,
        ids: &[CompanionId],
        source: XpSource,
        now: DateTime<Utc>,
    ) -> XpAward {
        let event = reverie_effects::apply_event(&self.effects, EventCategory::Xp, Decimal::ONE, now);
        let pruned = self.prune(event.expired);
        let outcomes = self
            .manager
            .gain_xp_for_many(ids, source, event.multiplier, now);
        let sync = self.sync();
        XpAward {
            multiplier: event.multiplier,
            outcomes,
            pruned,
            sync,
        }
    }

    /// Award a raw XP amount to one companion, scaled by the current XP
    /// multiplier. Negative amounts are clamped to zero.
    pub fn award_xp_amount(
        &mut self,
        id: &CompanionId,
        amount: i64,
        now: DateTime<Utc>,
    ) -> Option<XpOutcome> {
        let event = reverie_effects::apply_event(&self.effects, EventCategory::Xp, Decimal::ONE, now);
        self.prune(event.expired);
        let outcome = self
            .manager
            .gain_xp_amount(id, amount, event.multiplier, now);
        self.sync();
        outcome
    }

    /// Scale a non-XP reward by every valid effect for `category`.
    ///
    /// The result is rounded to a whole number, except clarity which keeps
    /// two decimal places. Non-positive results are reported as zero.
    pub fn scale_reward(
        &mut self,
        category: EventCategory,
        base: Decimal,
        now: DateTime<Utc>,
    ) -> Decimal {
        let event = reverie_effects::apply_event(&self.effects, category, base, now);
        if !self.prune(event.expired).is_empty() {
            self.sync();
        }
        let places = match category {
            EventCategory::Clarity => CLARITY_DECIMAL_PLACES,
            EventCategory::Xp | EventCategory::Obedience | EventCategory::Tokens => 0,
        };
        let rounded = event
            .value
            .round_dp_with_strategy(places, RoundingStrategy::MidpointAwayFromZero);
        rounded.max(Decimal::ZERO)
    }

    // -----------------------------------------------------------------------
    // Companion edits
    // -----------------------------------------------------------------------

    /// Add a companion. See [`CompanionManager::add_companion`].
    pub fn add_companion(
        &mut self,
        companion: Companion,
    ) -> Result<Vec<RepairWarning>, ProgressionError> {
        let warnings = self.manager.add_companion(companion)?;
        self.sync();
        Ok(warnings)
    }

    /// Remove a companion and every effect it sourced.
    pub fn remove_companion(&mut self, id: &CompanionId) -> Option<Companion> {
        let removed = self.manager.remove_companion(id);
        if removed.is_some() {
            self.sync();
        }
        removed
    }

    /// Apply an arbitrary edit. See [`CompanionManager::update_companion`].
    pub fn update_companion(
        &mut self,
        id: &CompanionId,
        edit: impl FnOnce(&mut Companion),
    ) -> Result<Vec<RepairWarning>, ProgressionError> {
        let warnings = self.manager.update_companion(id, edit)?;
        self.sync();
        Ok(warnings)
    }

    /// Append a form. See [`CompanionManager::add_form`].
    pub fn add_form(
        &mut self,
        id: &CompanionId,
        form: Form,
    ) -> Result<Vec<RepairWarning>, ProgressionError> {
        let warnings = self.manager.add_form(id, form)?;
        self.sync();
        Ok(warnings)
    }

    /// Remove a form. See [`CompanionManager::remove_form`].
    pub fn remove_form(
        &mut self,
        id: &CompanionId,
        form_id: &FormId,
    ) -> Result<(Form, Vec<RepairWarning>), ProgressionError> {
        let removed = self.manager.remove_form(id, form_id)?;
        self.sync();
        Ok(removed)
    }

    /// Switch to an owned, unlocked form.
    pub fn set_active_form(&mut self, id: &CompanionId, form_id: &FormId) -> bool {
        let changed = self.manager.set_active_form(id, form_id);
        if changed {
            self.sync();
        }
        changed
    }

    /// Turn auto-evolution on or off. Takes effect on the next XP gain.
    pub fn set_auto_evolve(&mut self, id: &CompanionId, enabled: bool) -> bool {
        self.manager.set_auto_evolve(id, enabled)
    }

    /// Return a companion to level 1 and its root form.
    pub fn reset_evolution(&mut self, id: &CompanionId) -> bool {
        let changed = self.manager.reset_evolution(id);
        if changed {
            self.sync();
        }
        changed
    }

    /// Manually evolve one hop.
    pub fn evolve_companion(
        &mut self,
        id: &CompanionId,
        now: DateTime<Utc>,
    ) -> Option<EvolutionRecord> {
        let record = self.manager.evolve_companion(id, now);
        if record.is_some() {
            self.sync();
        }
        record
    }

    /// Drain the recent-evolutions log.
    pub fn acknowledge_recent_evolutions(&mut self) -> Vec<EvolutionRecord> {
        self.manager.acknowledge_recent_evolutions()
    }

    // -----------------------------------------------------------------------
    // Effect windows
    // -----------------------------------------------------------------------

    /// Set or clear the expiry of one record. Returns `false` if unknown.
    ///
    /// A window is not one-shot. Once it lapses the record stops
    /// contributing, and the next event that aggregates over it prunes it.
    /// The sync that follows re-derives the record from its form without an
    /// expiry, so the buff applies again from then on. To end a buff
    /// for good, change the companion's form or remove the buff from it.
    pub fn set_effect_expiry(&mut self, id: &EffectId, expires_at: Option<DateTime<Utc>>) -> bool {
        self.effects.set_expiry(id, expires_at)
    }

    /// Expire a record after a human-readable duration such as `"1h 30m"`.
    ///
    /// Returns the new expiry, or `None` if the record is unknown or the
    /// duration does not parse to a positive span. The window lapses and
    /// then resets as described on [`Engine::set_effect_expiry`].
    pub fn expire_effect_in(
        &mut self,
        id: &EffectId,
        duration: &str,
        now: DateTime<Utc>,
    ) -> Option<DateTime<Utc>> {
        let span = reverie_effects::parse_duration(duration)?;
        let expires_at = now.checked_add_signed(span)?;
        self.effects
            .set_expiry(id, Some(expires_at))
            .then_some(expires_at)
    }

    /// Reconcile the registry with the companions.
    ///
    /// Every mutation above already does this; call it directly only after
    /// loading state through some other path.
    pub fn sync(&mut self) -> SyncReport {
        reverie_effects::sync(&mut self.effects, self.manager.companions())
    }

    fn prune(&mut self, expired: Vec<EffectId>) -> Vec<EffectId> {
        if expired.is_empty() {
            return expired;
        }
        let removed = self.effects.prune(&expired);
        tracing::info!(count = removed, "pruned expired effects");
        expired
    }
}
