//! Derived effects for the Reverie engine.
//!
//! Forms grant passive multipliers ("buffs"). This crate keeps a registry of
//! the effect records implied by companion state and compounds them when a
//! reward event fires.
//!
//! # Architecture
//!
//! - [`registry`] -- The [`EffectRegistry`] value: records keyed by
//!   deterministic id, expiry windows, pruning.
//! - [`sync`] -- Derive-then-diff reconciliation with companion state.
//! - [`aggregation`] -- Multiplicative stacking for one event category.
//! - [`duration`] -- Parsing of `"1d 2h"`-style durations for timed windows.
//!
//! # Usage
//!
//! ```
//! use chrono::Utc;
//! use reverie_effects::{EffectRegistry, apply_event, sync};
//! use reverie_types::{Companion, EffectKind, EventCategory, Form};
//! use rust_decimal::Decimal;
//!
//! let companion = Companion::new(
//!     "lumen",
//!     "Lumen",
//!     vec![Form::new("seed", "Seed", 1).with_buff(EffectKind::XpMultiplier, Decimal::new(15, 1))],
//! );
//!
//! let mut registry = EffectRegistry::new();
//! sync(&mut registry, &[companion]);
//!
//! let outcome = apply_event(&registry, EventCategory::Xp, Decimal::new(10, 0), Utc::now());
//! assert_eq!(outcome.value, Decimal::new(15, 0));
//! ```

pub mod aggregation;
pub mod duration;
pub mod registry;
pub mod sync;

// Re-export primary types at crate root.
pub use aggregation::{EventOutcome, apply_event, multiplier_for};
pub use duration::parse_duration;
pub use registry::EffectRegistry;
pub use sync::{SyncReport, derive_required, sync};
