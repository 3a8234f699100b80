//! Companion ownership and mutation.
//!
//! The [`CompanionManager`] owns the companion list and the two bounded
//! notification logs. It applies XP awards (looping level-ups), cascading
//! auto-evolution, and CRUD-style edits. It never consults the effect
//! registry: callers compute the multiplier first and pass it in, which
//! keeps the crate graph acyclic.
//!
//! Unknown ids and ineligible requests are silent no-ops that leave state
//! untouched and emit a `debug` event. Structural edits that can be
//! rejected return [`ProgressionError`] instead; an error also leaves
//! state untouched.

use std::collections::{BTreeSet, VecDeque};

use chrono::{DateTime, Utc};
use reverie_types::{
    Companion, CompanionId, CompanionView, EvolutionRecord, Form, FormId, XpGainRecord, XpSource,
};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::config::ProgressionConfig;
use crate::error::ProgressionError;
use crate::evolution;
use crate::repair::{self, RepairWarning};
use crate::view;

/// Outcome of one XP award to one companion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XpOutcome {
    /// The companion that received the award.
    pub companion_id: CompanionId,
    /// XP applied after scaling.
    pub amount: u64,
    /// Level before the award.
    pub level_before: u32,
    /// Level after the award.
    pub level_after: u32,
    /// Auto-evolution hops triggered by the award, in order.
    pub evolutions: Vec<EvolutionRecord>,
}

impl XpOutcome {
    /// Whether the award changed the companion's level.
    pub const fn leveled_up(&self) -> bool {
        self.level_after > self.level_before
    }
}

/// Owns companions and applies progression to them.
#[derive(Debug, Clone)]
pub struct CompanionManager {
    config: ProgressionConfig,
    companions: Vec<Companion>,
    recent_evolutions: VecDeque<EvolutionRecord>,
    recent_xp: VecDeque<XpGainRecord>,
}

impl CompanionManager {
    /// Create an empty manager.
    pub const fn new(config: ProgressionConfig) -> Self {
        Self {
            config,
            companions: Vec::new(),
            recent_evolutions: VecDeque::new(),
            recent_xp: VecDeque::new(),
        }
    }

    /// Hydrate a manager from persisted state, repairing anything corrupt.
    ///
    /// Duplicate companion ids keep the first occurrence. Logs longer than
    /// the configured capacity keep their newest entries.
    pub fn restore(
        config: ProgressionConfig,
        companions: Vec<Companion>,
        recent_evolutions: Vec<EvolutionRecord>,
        recent_xp: Vec<XpGainRecord>,
    ) -> (Self, Vec<RepairWarning>) {
        let mut manager = Self::new(config);
        let mut warnings = Vec::new();
        let mut seen = BTreeSet::new();

        for mut companion in companions {
            if !seen.insert(companion.id.clone()) {
                tracing::warn!(companion_id = %companion.id, "dropping duplicate companion");
                warnings.push(RepairWarning::DuplicateCompanion {
                    companion_id: companion.id,
                });
                continue;
            }
            warnings.extend(repair::normalize(&mut companion, &manager.config.leveling));
            manager.companions.push(companion);
        }

        for record in recent_evolutions {
            push_capped(
                &mut manager.recent_evolutions,
                record,
                manager.config.evolution_log_capacity,
            );
        }
        for record in recent_xp {
            push_capped(&mut manager.recent_xp, record, manager.config.xp_log_capacity);
        }

        (manager, warnings)
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// The configuration in use.
    pub const fn config(&self) -> &ProgressionConfig {
        &self.config
    }

    /// All companions, in insertion order.
    pub fn companions(&self) -> &[Companion] {
        &self.companions
    }

    /// Look up a companion by id.
    pub fn companion(&self, id: &CompanionId) -> Option<&Companion> {
        self.companions.iter().find(|c| &c.id == id)
    }

    /// Case-insensitive lookup by display name or id.
    pub fn companion_by_name(&self, name: &str) -> Option<&Companion> {
        let wanted = name.to_lowercase();
        self.companions
            .iter()
            .find(|c| c.name.to_lowercase() == wanted || c.id.as_str().to_lowercase() == wanted)
    }

    /// Display view of one companion.
    pub fn view(&self, id: &CompanionId) -> Option<CompanionView> {
        self.companion(id)
            .map(|c| view::companion_view(c, &self.config.leveling))
    }

    /// Display views of every companion.
    pub fn views(&self) -> Vec<CompanionView> {
        self.companions
            .iter()
            .map(|c| view::companion_view(c, &self.config.leveling))
            .collect()
    }

    /// Recent evolutions, oldest first.
    pub const fn recent_evolutions(&self) -> &VecDeque<EvolutionRecord> {
        &self.recent_evolutions
    }

    /// Recent XP awards, oldest first.
    pub const fn recent_xp(&self) -> &VecDeque<XpGainRecord> {
        &self.recent_xp
    }

    /// Drain the recent-evolutions log once a notification UI has shown it.
    pub fn acknowledge_recent_evolutions(&mut self) -> Vec<EvolutionRecord> {
        self.recent_evolutions.drain(..).collect()
    }

    // -----------------------------------------------------------------------
    // Population
    // -----------------------------------------------------------------------

    /// Add a companion, normalizing it first.
    ///
    /// Returns the repairs applied to the incoming record.
    pub fn add_companion(
        &mut self,
        mut companion: Companion,
    ) -> Result<Vec<RepairWarning>, ProgressionError> {
        if self.companion(&companion.id).is_some() {
            return Err(ProgressionError::DuplicateCompanion(companion.id));
        }
        let warnings = repair::normalize(&mut companion, &self.config.leveling);
        tracing::info!(companion_id = %companion.id, "companion added");
        self.companions.push(companion);
        Ok(warnings)
    }

    /// Remove a companion. Returns it, or `None` if it was not managed.
    pub fn remove_companion(&mut self, id: &CompanionId) -> Option<Companion> {
        let Some(index) = self.companions.iter().position(|c| &c.id == id) else {
            tracing::debug!(companion_id = %id, "remove ignored: unknown companion");
            return None;
        };
        tracing::info!(companion_id = %id, "companion removed");
        Some(self.companions.remove(index))
    }

    /// Apply an arbitrary edit, then re-normalize.
    ///
    /// The companion id is immutable; an edit that changes it is reverted.
    pub fn update_companion(
        &mut self,
        id: &CompanionId,
        edit: impl FnOnce(&mut Companion),
    ) -> Result<Vec<RepairWarning>, ProgressionError> {
        let curve = self.config.leveling;
        let companion = self.companion_mut(id)?;
        edit(companion);
        companion.id.clone_from(id);
        Ok(repair::normalize(companion, &curve))
    }

    /// Append a form to a companion's chain, then re-normalize.
    pub fn add_form(
        &mut self,
        id: &CompanionId,
        form: Form,
    ) -> Result<Vec<RepairWarning>, ProgressionError> {
        let curve = self.config.leveling;
        let companion = self.companion_mut(id)?;
        if companion.owns_form(&form.id) {
            return Err(ProgressionError::DuplicateForm {
                companion_id: id.clone(),
                form_id: form.id,
            });
        }
        companion.forms.push(form);
        Ok(repair::normalize(companion, &curve))
    }

    /// Remove a form from a companion's chain.
    ///
    /// The last remaining form cannot be removed. Removing the active form
    /// falls back to the root form. Returns the removed form together with
    /// the repairs the shortened chain needed.
    pub fn remove_form(
        &mut self,
        id: &CompanionId,
        form_id: &FormId,
    ) -> Result<(Form, Vec<RepairWarning>), ProgressionError> {
        let curve = self.config.leveling;
        let companion = self.companion_mut(id)?;
        let index = companion
            .forms
            .iter()
            .position(|f| &f.id == form_id)
            .ok_or_else(|| ProgressionError::FormNotFound {
                companion_id: id.clone(),
                form_id: form_id.clone(),
            })?;
        if companion.forms.len() <= 1 {
            return Err(ProgressionError::LastForm(id.clone()));
        }
        let removed = companion.forms.remove(index);
        if &companion.active_form_id == form_id {
            if let Some(root) = evolution::root_form(companion).map(|f| f.id.clone()) {
                companion.active_form_id = root;
            }
        }
        let warnings = repair::normalize(companion, &curve);
        Ok((removed, warnings))
    }

    // -----------------------------------------------------------------------
    // Evolution controls
    // -----------------------------------------------------------------------

    /// Switch to an owned, unlocked form.
    ///
    /// No-op (returns `false`) if the companion or form is unknown or the
    /// form unlocks above the current level.
    pub fn set_active_form(&mut self, id: &CompanionId, form_id: &FormId) -> bool {
        let Some(companion) = self.find_mut(id) else {
            return false;
        };
        let unlocked = companion
            .form(form_id)
            .is_some_and(|f| f.unlock_level <= companion.level);
        if !unlocked {
            tracing::debug!(companion_id = %id, form_id = %form_id, "form change ignored");
            return false;
        }
        companion.active_form_id.clone_from(form_id);
        true
    }

    /// Turn auto-evolution on or off. Returns `false` for unknown ids.
    pub fn set_auto_evolve(&mut self, id: &CompanionId, enabled: bool) -> bool {
        let Some(companion) = self.find_mut(id) else {
            return false;
        };
        companion.auto_evolve = enabled;
        true
    }

    /// Return a companion to level 1, zero XP, and its root form.
    ///
    /// The only backward transition of the evolution state machine.
    pub fn reset_evolution(&mut self, id: &CompanionId) -> bool {
        let Some(companion) = self.find_mut(id) else {
            return false;
        };
        companion.level = 1;
        companion.xp = 0;
        if let Some(root) = evolution::root_form(companion).map(|f| f.id.clone()) {
            companion.active_form_id = root;
        }
        tracing::info!(companion_id = %id, "evolution reset");
        true
    }

    /// Manually evolve one hop. Never cascades.
    ///
    /// Returns the logged record, or `None` if unknown or ineligible.
    pub fn evolve_companion(
        &mut self,
        id: &CompanionId,
        now: DateTime<Utc>,
    ) -> Option<EvolutionRecord> {
        let companion = self.find_mut(id)?;
        let Some((from, to)) = evolution::evolve_step(companion) else {
            tracing::debug!(companion_id = %id, "evolve ignored: not eligible");
            return None;
        };
        let record = EvolutionRecord {
            companion_id: id.clone(),
            from_form_id: from,
            to_form_id: to,
            at: now,
            auto: false,
        };
        self.log_evolution(&record);
        Some(record)
    }

    // -----------------------------------------------------------------------
    // Experience
    // -----------------------------------------------------------------------

    /// Award the configured base XP for `source`, scaled by `multiplier`.
    ///
    /// A non-positive multiplier is treated as neutral (1). Returns `None`
    /// for unknown ids.
    pub fn gain_xp(
        &mut self,
        id: &CompanionId,
        source: XpSource,
        multiplier: Decimal,
        now: DateTime<Utc>,
    ) -> Option<XpOutcome> {
        let base = self.config.xp_rewards.base_for(source);
        let amount = scale_amount(base, multiplier);
        self.apply_gain(id, Some(source), amount, now)
    }

    /// Award a raw XP amount, scaled by `multiplier`.
    ///
    /// Negative amounts are clamped to zero.
    pub fn gain_xp_amount(
        &mut self,
        id: &CompanionId,
        amount: i64,
        multiplier: Decimal,
        now: DateTime<Utc>,
    ) -> Option<XpOutcome> {
        let base = u64::try_from(amount).unwrap_or(0);
        let scaled = scale_amount(base, multiplier);
        self.apply_gain(id, None, scaled, now)
    }

    /// Award `source` to several companions independently.
    ///
    /// Unknown ids are skipped without affecting the others. Returns the
    /// outcomes of the companions that were found.
    pub fn gain_xp_for_many(
        &mut self,
        ids: &[CompanionId],
        source: XpSource,
        multiplier: Decimal,
        now: DateTime<Utc>,
    ) -> Vec<XpOutcome> {
        ids.iter()
            .filter_map(|id| self.gain_xp(id, source, multiplier, now))
            .collect()
    }

    fn apply_gain(
        &mut self,
        id: &CompanionId,
        source: Option<XpSource>,
        amount: u64,
        now: DateTime<Utc>,
    ) -> Option<XpOutcome> {
        let curve = self.config.leveling;
        let companion = self.find_mut(id)?;
        let level_before = companion.level;

        let progress = curve.apply_xp_gain(
            companion.level,
            companion.xp,
            i64::try_from(amount).unwrap_or(i64::MAX),
        );
        companion.level = progress.level;
        companion.xp = progress.xp;

        let hops = if companion.auto_evolve {
            evolution::evolve_cascade(companion)
        } else {
            Vec::new()
        };

        if progress.levels_gained > 0 {
            tracing::info!(
                companion_id = %id,
                level_before,
                level_after = progress.level,
                "companion leveled up"
            );
        }

        let evolutions: Vec<EvolutionRecord> = hops
            .into_iter()
            .map(|(from, to)| EvolutionRecord {
                companion_id: id.clone(),
                from_form_id: from,
                to_form_id: to,
                at: now,
                auto: true,
            })
            .collect();
        for record in &evolutions {
            self.log_evolution(record);
        }

        if amount > 0 {
            let capacity = self.config.xp_log_capacity;
            push_capped(
                &mut self.recent_xp,
                XpGainRecord {
                    companion_id: id.clone(),
                    source,
                    amount,
                    level_before,
                    level_after: progress.level,
                    at: now,
                },
                capacity,
            );
        }

        Some(XpOutcome {
            companion_id: id.clone(),
            amount,
            level_before,
            level_after: progress.level,
            evolutions,
        })
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn find_mut(&mut self, id: &CompanionId) -> Option<&mut Companion> {
        let found = self.companions.iter_mut().find(|c| &c.id == id);
        if found.is_none() {
            tracing::debug!(companion_id = %id, "ignored: unknown companion");
        }
        found
    }

    fn companion_mut(&mut self, id: &CompanionId) -> Result<&mut Companion, ProgressionError> {
        self.companions
            .iter_mut()
            .find(|c| &c.id == id)
            .ok_or_else(|| ProgressionError::CompanionNotFound(id.clone()))
    }

    fn log_evolution(&mut self, record: &EvolutionRecord) {
        tracing::info!(
            companion_id = %record.companion_id,
            from_form = %record.from_form_id,
            to_form = %record.to_form_id,
            auto = record.auto,
            "companion evolved"
        );
        let capacity = self.config.evolution_log_capacity;
        push_capped(&mut self.recent_evolutions, record.clone(), capacity);
    }
}

/// Scale a base XP amount, rounding half away from zero.
///
/// Non-positive multipliers are neutral; overflow falls back to the base.
fn scale_amount(base: u64, multiplier: Decimal) -> u64 {
    let multiplier = if multiplier > Decimal::ZERO {
        multiplier
    } else {
        tracing::warn!(%multiplier, "non-positive xp multiplier treated as neutral");
        Decimal::ONE
    };
    Decimal::from(base)
        .checked_mul(multiplier)
        .map(|v| v.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|v| v.to_u64())
        .unwrap_or(base)
}

fn push_capped<T>(log: &mut VecDeque<T>, entry: T, capacity: usize) {
    log.push_back(entry);
    while log.len() > capacity {
        log.pop_front();
    }
}
