//! Companion progression for the Reverie engine.
//!
//! This crate is the logic layer for companions: everything that changes
//! level, experience, or evolution stage without touching the effect
//! registry or any I/O. It sits between `reverie-types` (data structures)
//! and `reverie-effects`/`reverie-core` (derived effects and orchestration).
//!
//! # Modules
//!
//! - [`config`] -- Tunable progression parameters ([`ProgressionConfig`])
//! - [`error`] -- Error types for companion mutations ([`ProgressionError`])
//! - [`evolution`] -- Active/next form lookup and single-hop evolution
//! - [`leveling`] -- XP thresholds and level-up mechanics ([`LevelingCurve`])
//! - [`manager`] -- Companion ownership, XP awards, cascading auto-evolution
//! - [`repair`] -- Normalization of corrupt or hand-edited companions
//! - [`view`] -- Read-only display projections

pub mod config;
pub mod error;
pub mod evolution;
pub mod leveling;
pub mod manager;
pub mod repair;
pub mod view;

// Re-export primary types at crate root for convenience.
pub use config::{ProgressionConfig, XpRewards};
pub use error::ProgressionError;
pub use evolution::{active_form, can_evolve, evolve_cascade, evolve_step, next_form};
pub use leveling::{LevelProgress, LevelingCurve};
pub use manager::{CompanionManager, XpOutcome};
pub use repair::{RepairWarning, normalize};
pub use view::companion_view;
