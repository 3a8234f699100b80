//! Effect aggregation: compounding every valid multiplier for one event.
//!
//! Stacking is multiplicative. Three +25% effects compound to
//! `1.25^3 = 1.953125`, not `1.75`.
//!
//! A record contributes when all of the following hold at `now`:
//!
//! - it is not expired (`expires_at > now` or untimed),
//! - it is active,
//! - its kind is scaled by the event category,
//! - its value is positive.
//!
//! Expired records are reported in [`EventOutcome::expired`] whether or not
//! they are active, so the caller can prune them. Aggregation itself never
//! mutates the registry.

use chrono::{DateTime, Utc};
use reverie_types::{EffectId, EventCategory};
use rust_decimal::Decimal;

use crate::registry::EffectRegistry;

/// Result of scaling a base value for one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventOutcome {
    /// `base * multiplier`, unrounded.
    pub value: Decimal,
    /// Product of every contributing record's value (1 when none apply).
    pub multiplier: Decimal,
    /// Records that contributed, in registry order.
    pub applied: Vec<EffectId>,
    /// Records found expired at `now`.
    pub expired: Vec<EffectId>,
}

/// Scale `base` by every valid effect for `category`.
pub fn apply_event(
    registry: &EffectRegistry,
    category: EventCategory,
    base: Decimal,
    now: DateTime<Utc>,
) -> EventOutcome {
    let mut multiplier = Decimal::ONE;
    let mut applied = Vec::new();
    let mut expired = Vec::new();

    for record in registry.records() {
        if record.is_expired(now) {
            expired.push(record.id.clone());
            continue;
        }
        if !record.active || !category.is_scaled_by(record.kind) {
            continue;
        }
        if record.value <= Decimal::ZERO {
            tracing::warn!(effect_id = %record.id, value = %record.value, "excluding non-positive effect value");
            continue;
        }
        match multiplier.checked_mul(record.value) {
            Some(product) => {
                multiplier = product;
                applied.push(record.id.clone());
            }
            None => {
                tracing::warn!(effect_id = %record.id, "excluding effect: multiplier overflow");
            }
        }
    }

    EventOutcome {
        value: base.saturating_mul(multiplier),
        multiplier,
        applied,
        expired,
    }
}

/// Just the compounded multiplier for `category` at `now`.
pub fn multiplier_for(
    registry: &EffectRegistry,
    category: EventCategory,
    now: DateTime<Utc>,
) -> Decimal {
    apply_event(registry, category, Decimal::ONE, now).multiplier
}
