//! The effect registry: every derived effect record, keyed by id.
//!
//! The registry is an explicit value threaded through calls rather than
//! ambient global state. Callers cannot author records; only the
//! synchronizer inserts them. What callers may do is open a timed window on
//! a record ([`EffectRegistry::set_expiry`]) and prune records that the
//! aggregation engine reported as expired.
//!
//! Persisted as a flat list of records. On load, a later duplicate id
//! replaces an earlier one; any leftover inconsistency is corrected by the
//! next sync.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use reverie_types::{EffectId, EffectRecord, EffectSource};
use serde::{Deserialize, Serialize};

/// All effect records currently known, ordered by id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<EffectRecord>", into = "Vec<EffectRecord>")]
pub struct EffectRegistry {
    records: BTreeMap<EffectId, EffectRecord>,
}

impl From<Vec<EffectRecord>> for EffectRegistry {
    fn from(records: Vec<EffectRecord>) -> Self {
        Self {
            records: records.into_iter().map(|r| (r.id.clone(), r)).collect(),
        }
    }
}

impl From<EffectRegistry> for Vec<EffectRecord> {
    fn from(registry: EffectRegistry) -> Self {
        registry.records.into_values().collect()
    }
}

impl EffectRegistry {
    /// Create an empty registry.
    pub const fn new() -> Self {
        Self {
            records: BTreeMap::new(),
        }
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the registry holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Look up a record by id.
    pub fn get(&self, id: &EffectId) -> Option<&EffectRecord> {
        self.records.get(id)
    }

    /// All records, ordered by id.
    pub fn records(&self) -> impl Iterator<Item = &EffectRecord> {
        self.records.values()
    }

    /// All record ids, ordered.
    pub fn ids(&self) -> impl Iterator<Item = &EffectId> {
        self.records.keys()
    }

    /// Records that are active and unexpired at `now`, for effect display.
    pub fn active_records(&self, now: DateTime<Utc>) -> impl Iterator<Item = &EffectRecord> {
        self.records
            .values()
            .filter(move |r| r.active && !r.is_expired(now))
    }

    /// Records granted by one `(companion, form)` source.
    pub fn by_source<'a>(
        &'a self,
        source: &'a EffectSource,
    ) -> impl Iterator<Item = &'a EffectRecord> + 'a {
        self.records.values().filter(move |r| &r.source == source)
    }

    /// Set or clear a record's expiry. Returns `false` for unknown ids.
    pub fn set_expiry(&mut self, id: &EffectId, expires_at: Option<DateTime<Utc>>) -> bool {
        let Some(record) = self.records.get_mut(id) else {
            tracing::debug!(effect_id = %id, "set_expiry ignored: unknown effect");
            return false;
        };
        record.expires_at = expires_at;
        true
    }

    /// Time left before a record expires.
    ///
    /// `None` for unknown or untimed records; zero once expired.
    pub fn remaining(&self, id: &EffectId, now: DateTime<Utc>) -> Option<Duration> {
        let expires_at = self.records.get(id)?.expires_at?;
        let left = expires_at.signed_duration_since(now);
        Some(left.max(Duration::zero()))
    }

    /// Remove the given records. Returns how many were present.
    pub fn prune(&mut self, ids: &[EffectId]) -> usize {
        let removed = ids
            .iter()
            .filter(|id| self.records.remove(*id).is_some())
            .count();
        if removed > 0 {
            tracing::debug!(removed, "pruned expired effects");
        }
        removed
    }

    pub(crate) fn upsert(&mut self, record: EffectRecord) {
        self.records.insert(record.id.clone(), record);
    }

    pub(crate) fn remove(&mut self, id: &EffectId) -> Option<EffectRecord> {
        self.records.remove(id)
    }
}
