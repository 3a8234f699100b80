//! Shared type definitions for the Reverie companion progression engine.
//!
//! This crate is the single source of truth for the data exchanged between
//! the progression core and the journaling front-end. Types flow downstream
//! to `TypeScript` via `ts-rs`.
//!
//! # Modules
//!
//! - [`ids`] -- Typed identifiers, including deterministic effect keys
//! - [`enums`] -- Effect kinds, reward event categories, XP sources
//! - [`structs`] -- Companions, forms, effect records, logs, read views

pub mod enums;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{EffectKind, EventCategory, XpSource};
pub use ids::{CompanionId, EffectId, EffectSource, FormId};
pub use structs::{
    BuffMap, Companion, CompanionView, EffectRecord, EvolutionRecord, Form, XpGainRecord,
};
