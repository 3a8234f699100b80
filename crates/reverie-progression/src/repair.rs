//! Normalization of companion records.
//!
//! Persisted snapshots and hand-edited companions may break the structural
//! invariants the engine relies on. [`normalize`] restores them and reports
//! each fix as a [`RepairWarning`]; it never fails.
//!
//! Repairs, in order:
//!
//! 1. Empty evolution chain: synthesize a single dormant root form.
//! 2. Duplicate form ids: keep the first occurrence.
//! 3. Unlock levels below 1: raise to 1.
//! 4. Sort forms ascending by unlock level (stable).
//! 5. Root form unlock above 1: lower to 1 so the chain is always enterable.
//! 6. Level below 1: raise to 1.
//! 7. XP at or above the next threshold: clamp just below it.
//! 8. Dangling active form: fall back to the root form.
//! 9. Active form locked above the level: fall back to the highest unlocked form.

use std::collections::BTreeSet;

use reverie_types::{Companion, CompanionId, Form, FormId};

use crate::evolution;
use crate::leveling::LevelingCurve;

/// A recoverable inconsistency that [`normalize`] corrected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepairWarning {
    /// The companion had no forms; a dormant root form was synthesized.
    #[error("companion {companion_id} had no forms; synthesized {form_id}")]
    SynthesizedForm {
        /// The repaired companion.
        companion_id: CompanionId,
        /// Id of the synthesized form.
        form_id: FormId,
    },

    /// A form id appeared more than once; later copies were dropped.
    #[error("companion {companion_id} listed form {form_id} more than once")]
    DuplicateForm {
        /// The repaired companion.
        companion_id: CompanionId,
        /// The duplicated form id.
        form_id: FormId,
    },

    /// A form's unlock level was raised to 1.
    #[error("form {form_id} of companion {companion_id} had unlock level 0")]
    UnlockLevelRaised {
        /// The repaired companion.
        companion_id: CompanionId,
        /// The repaired form.
        form_id: FormId,
    },

    /// Forms were not in ascending unlock order.
    #[error("forms of companion {companion_id} were out of order")]
    FormsReordered {
        /// The repaired companion.
        companion_id: CompanionId,
    },

    /// The root form unlocked above level 1 and was lowered.
    #[error("root form {form_id} of companion {companion_id} unlocked at {was}; lowered to 1")]
    RootFormLowered {
        /// The repaired companion.
        companion_id: CompanionId,
        /// The root form.
        form_id: FormId,
        /// The original unlock level.
        was: u32,
    },

    /// Level was 0 and was raised to 1.
    #[error("companion {companion_id} had level 0")]
    LevelRaised {
        /// The repaired companion.
        companion_id: CompanionId,
    },

    /// XP met or exceeded the next threshold and was clamped.
    #[error("companion {companion_id} held {was} xp; clamped to {now}")]
    XpClamped {
        /// The repaired companion.
        companion_id: CompanionId,
        /// XP before clamping.
        was: u64,
        /// XP after clamping.
        now: u64,
    },

    /// The active form id named no owned form.
    #[error("companion {companion_id} referenced missing form {was}; reset to {now}")]
    ActiveFormDangling {
        /// The repaired companion.
        companion_id: CompanionId,
        /// The dangling id.
        was: FormId,
        /// The fallback form.
        now: FormId,
    },

    /// The active form was locked above the companion's level.
    #[error("companion {companion_id} used locked form {was}; fell back to {now}")]
    ActiveFormLocked {
        /// The repaired companion.
        companion_id: CompanionId,
        /// The locked form.
        was: FormId,
        /// The fallback form.
        now: FormId,
    },

    /// A companion id appeared more than once in a snapshot.
    #[error("companion {companion_id} appeared more than once; later copies dropped")]
    DuplicateCompanion {
        /// The duplicated companion id.
        companion_id: CompanionId,
    },
}

/// Restore every structural invariant on `companion`.
///
/// Returns the list of repairs made; empty when the companion was already
/// well-formed. Each repair is also logged at `warn` level.
pub fn normalize(companion: &mut Companion, curve: &LevelingCurve) -> Vec<RepairWarning> {
    let mut warnings = Vec::new();
    let id = companion.id.clone();

    if companion.forms.is_empty() {
        let form_id = FormId::new(format!("{id}-dormant"));
        companion.forms.push(Form::new(form_id.clone(), "Dormant", 1));
        companion.active_form_id = form_id.clone();
        warnings.push(RepairWarning::SynthesizedForm {
            companion_id: id.clone(),
            form_id,
        });
    }

    let mut seen = BTreeSet::new();
    companion.forms.retain(|form| {
        if seen.insert(form.id.clone()) {
            true
        } else {
            warnings.push(RepairWarning::DuplicateForm {
                companion_id: id.clone(),
                form_id: form.id.clone(),
            });
            false
        }
    });

    for form in &mut companion.forms {
        if form.unlock_level == 0 {
            form.unlock_level = 1;
            warnings.push(RepairWarning::UnlockLevelRaised {
                companion_id: id.clone(),
                form_id: form.id.clone(),
            });
        }
    }

    if !companion.forms.is_sorted_by_key(|f| f.unlock_level) {
        companion.forms.sort_by_key(|f| f.unlock_level);
        warnings.push(RepairWarning::FormsReordered {
            companion_id: id.clone(),
        });
    }

    if let Some(root) = companion.forms.first_mut() {
        if root.unlock_level > 1 {
            warnings.push(RepairWarning::RootFormLowered {
                companion_id: id.clone(),
                form_id: root.id.clone(),
                was: root.unlock_level,
            });
            root.unlock_level = 1;
        }
    }

    if companion.level == 0 {
        companion.level = 1;
        warnings.push(RepairWarning::LevelRaised {
            companion_id: id.clone(),
        });
    }

    let clamped = curve.clamp_xp(companion.level, companion.xp);
    if clamped != companion.xp {
        warnings.push(RepairWarning::XpClamped {
            companion_id: id.clone(),
            was: companion.xp,
            now: clamped,
        });
        companion.xp = clamped;
    }

    match evolution::active_form(companion).map(|f| f.unlock_level) {
        None => {
            if let Some(root) = evolution::root_form(companion).map(|f| f.id.clone()) {
                let was = std::mem::replace(&mut companion.active_form_id, root.clone());
                warnings.push(RepairWarning::ActiveFormDangling {
                    companion_id: id.clone(),
                    was,
                    now: root,
                });
            }
        }
        Some(unlock) if unlock > companion.level => {
            if let Some(fallback) = evolution::highest_unlocked_form(companion).map(|f| f.id.clone()) {
                let was = std::mem::replace(&mut companion.active_form_id, fallback.clone());
                warnings.push(RepairWarning::ActiveFormLocked {
                    companion_id: id.clone(),
                    was,
                    now: fallback,
                });
            }
        }
        Some(_) => {}
    }

    for warning in &warnings {
        tracing::warn!(companion_id = %id, "repaired companion: {warning}");
    }

    warnings
}
