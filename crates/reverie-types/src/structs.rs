//! Core entity structs: companions, forms, effect records, and the
//! bounded notification logs.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{EffectKind, XpSource};
use crate::ids::{CompanionId, EffectId, EffectSource, FormId};

// ---------------------------------------------------------------------------
// Form
// ---------------------------------------------------------------------------

/// Mapping from effect kind to the multiplier a form grants.
pub type BuffMap = BTreeMap<EffectKind, Decimal>;

/// One stage of a companion's evolution chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Form {
    /// Identifier, unique within the owning companion.
    pub id: FormId,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Minimum companion level at which this form can be taken.
    #[serde(default = "default_unlock_level")]
    pub unlock_level: u32,
    /// Multipliers granted while this is the active form. Empty means none.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    #[ts(type = "Record<string, string>")]
    pub buff: BuffMap,
    /// Display glyph.
    #[serde(default)]
    pub icon: Option<String>,
    /// Flavor text.
    #[serde(default)]
    pub description: Option<String>,
}

const fn default_unlock_level() -> u32 {
    1
}

impl Form {
    /// Create a form with no buff and no display extras.
    pub fn new(id: impl Into<FormId>, name: impl Into<String>, unlock_level: u32) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            unlock_level,
            buff: BuffMap::new(),
            icon: None,
            description: None,
        }
    }

    /// Builder-style helper attaching one buff entry.
    #[must_use]
    pub fn with_buff(mut self, kind: EffectKind, value: Decimal) -> Self {
        self.buff.insert(kind, value);
        self
    }
}

// ---------------------------------------------------------------------------
// Companion
// ---------------------------------------------------------------------------

/// A leveling actor with an ordered evolution chain.
///
/// `forms` is kept sorted ascending by `unlock_level` with unique ids, and
/// `active_form_id` always names an owned, unlocked form. Deserialized
/// snapshots may violate this; they are repaired on load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Companion {
    /// Unique identifier.
    pub id: CompanionId,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Free-form backstory.
    #[serde(default)]
    pub lore: Option<String>,
    /// Current level (at least 1).
    #[serde(default = "default_level")]
    pub level: u32,
    /// Experience accumulated toward the next level.
    #[serde(default)]
    pub xp: u64,
    /// Evolution chain, ascending by unlock level.
    #[serde(default)]
    pub forms: Vec<Form>,
    /// The form currently in effect.
    #[serde(default)]
    pub active_form_id: FormId,
    /// Whether level-ups walk the evolution chain automatically.
    #[serde(default)]
    pub auto_evolve: bool,
}

const fn default_level() -> u32 {
    1
}

impl Companion {
    /// Create a level 1 companion whose active form is the first of `forms`.
    pub fn new(id: impl Into<CompanionId>, name: impl Into<String>, forms: Vec<Form>) -> Self {
        let active_form_id = forms.first().map(|f| f.id.clone()).unwrap_or_default();
        Self {
            id: id.into(),
            name: name.into(),
            lore: None,
            level: 1,
            xp: 0,
            forms,
            active_form_id,
            auto_evolve: false,
        }
    }

    /// Look up an owned form by id.
    pub fn form(&self, form_id: &FormId) -> Option<&Form> {
        self.forms.iter().find(|f| &f.id == form_id)
    }

    /// Whether this companion owns a form with the given id.
    pub fn owns_form(&self, form_id: &FormId) -> bool {
        self.form(form_id).is_some()
    }
}

// ---------------------------------------------------------------------------
// Effect record
// ---------------------------------------------------------------------------

/// A derived registry entry granting a multiplicative bonus to one effect
/// kind.
///
/// Records are never authored directly: the synchronizer derives them from
/// companion state. Only `expires_at` may be set from outside.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct EffectRecord {
    /// Deterministic id of the `(companion, form, kind)` triple.
    pub id: EffectId,
    /// Display name, e.g. `"Lumen · Ember Wisp"`.
    pub name: String,
    /// The `(companion, form)` pair that grants this record.
    pub source: EffectSource,
    /// Which reward stream the record scales.
    pub kind: EffectKind,
    /// Multiplier applied when the record is active and unexpired.
    #[ts(as = "String")]
    pub value: Decimal,
    /// Whether the granting form is its companion's active form.
    pub active: bool,
    /// Display glyph copied from the granting form.
    #[serde(default)]
    pub icon: Option<String>,
    /// Absolute expiry; the record is expired once `now >= expires_at`.
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

impl EffectRecord {
    /// Whether the record has expired at `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

// ---------------------------------------------------------------------------
// Notification logs
// ---------------------------------------------------------------------------

/// One step along an evolution chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct EvolutionRecord {
    /// The companion that evolved.
    pub companion_id: CompanionId,
    /// Form before the step.
    pub from_form_id: FormId,
    /// Form after the step.
    pub to_form_id: FormId,
    /// When the step happened (caller-supplied clock).
    pub at: DateTime<Utc>,
    /// `true` when triggered by auto-evolution, `false` for a manual evolve.
    pub auto: bool,
}

/// One experience award applied to a companion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct XpGainRecord {
    /// The companion that gained experience.
    pub companion_id: CompanionId,
    /// Journal activity behind the award, if it came from one.
    pub source: Option<XpSource>,
    /// Experience applied after scaling.
    pub amount: u64,
    /// Level before the award.
    pub level_before: u32,
    /// Level after the award.
    pub level_after: u32,
    /// When the award happened (caller-supplied clock).
    pub at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Read view
// ---------------------------------------------------------------------------

/// Read-only projection of a companion for gallery and detail panels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct CompanionView {
    /// Companion id.
    pub id: CompanionId,
    /// Display name.
    pub name: String,
    /// Current level.
    pub level: u32,
    /// Experience toward the next level.
    pub xp: u64,
    /// Experience the next level requires.
    pub xp_needed: u64,
    /// `xp / xp_needed`, clamped to `[0, 1]`.
    #[ts(as = "String")]
    pub xp_ratio: Decimal,
    /// Lifetime experience implied by level and progress.
    pub total_xp: u64,
    /// The form currently in effect.
    pub active_form: Option<Form>,
    /// The next form up the chain, if any.
    pub next_form: Option<Form>,
    /// Whether a manual evolve would succeed right now.
    pub evolution_ready: bool,
    /// Whether auto-evolution is on.
    pub auto_evolve: bool,
}
