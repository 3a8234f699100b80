//! Registry synchronization: derive the records that should exist, then diff.
//!
//! Rather than pushing and popping effects when a form activates, every
//! sync recomputes the full required set from companion state and applies
//! the minimal set of writes:
//!
//! - **add** records that are required but missing,
//! - **update** records whose derived fields differ (keeping `expires_at`),
//! - **remove** records whose key is no longer derivable.
//!
//! Keys are pure functions of `(companion, form, kind)`, so a second sync
//! with no intervening mutation performs zero writes.

use std::collections::BTreeMap;

use reverie_types::{Companion, EffectId, EffectRecord, EffectSource};
use rust_decimal::Decimal;

use crate::registry::EffectRegistry;

/// Writes performed by one [`sync`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Records inserted.
    pub added: Vec<EffectId>,
    /// Records rewritten in place.
    pub updated: Vec<EffectId>,
    /// Records deleted.
    pub removed: Vec<EffectId>,
}

impl SyncReport {
    /// Whether the sync changed nothing.
    pub fn is_noop(&self) -> bool {
        self.added.is_empty() && self.updated.is_empty() && self.removed.is_empty()
    }

    /// Total number of writes.
    pub fn writes(&self) -> usize {
        self.added
            .len()
            .saturating_add(self.updated.len())
            .saturating_add(self.removed.len())
    }
}

/// Every record implied by the current companion state, keyed by id.
///
/// One candidate per companion, owned form, and positive buff entry.
/// Records of non-active forms are included with `active = false`.
pub fn derive_required(companions: &[Companion]) -> BTreeMap<EffectId, EffectRecord> {
    let mut required = BTreeMap::new();
    for companion in companions {
        for form in &companion.forms {
            let source = EffectSource::derive(&companion.id, &form.id);
            let active = form.id == companion.active_form_id;
            for (&kind, &value) in &form.buff {
                if value <= Decimal::ZERO {
                    continue;
                }
                let id = EffectId::derive(&companion.id, &form.id, kind);
                required.insert(
                    id.clone(),
                    EffectRecord {
                        id,
                        name: format!("{} · {}", companion.name, form.name),
                        source: source.clone(),
                        kind,
                        value,
                        active,
                        icon: form.icon.clone(),
                        expires_at: None,
                    },
                );
            }
        }
    }
    required
}

/// Reconverge `registry` with `companions`.
pub fn sync(registry: &mut EffectRegistry, companions: &[Companion]) -> SyncReport {
    let required = derive_required(companions);
    let mut report = SyncReport::default();

    let orphans: Vec<EffectId> = registry
        .ids()
        .filter(|id| !required.contains_key(*id))
        .cloned()
        .collect();
    for id in orphans {
        registry.remove(&id);
        report.removed.push(id);
    }

    for (id, mut candidate) in required {
        match registry.get(&id) {
            None => {
                registry.upsert(candidate);
                report.added.push(id);
            }
            Some(existing) => {
                candidate.expires_at = existing.expires_at;
                if &candidate != existing {
                    registry.upsert(candidate);
                    report.updated.push(id);
                }
            }
        }
    }

    if !report.is_noop() {
        tracing::debug!(
            added = report.added.len(),
            updated = report.updated.len(),
            removed = report.removed.len(),
            "effect registry synchronized"
        );
    }

    report
}
