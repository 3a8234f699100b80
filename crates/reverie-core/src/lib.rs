//! Engine facade, configuration, and persistence for Reverie companions.
//!
//! This crate ties the progression manager and the effect registry together
//! behind a single [`Engine`], loads tunables from `reverie-config.yaml`,
//! and defines the snapshot format a host persists between sessions.
//!
//! # Modules
//!
//! - [`config`] -- Configuration loading from `reverie-config.yaml` into
//!   strongly-typed structs.
//! - [`engine`] -- [`Engine`], which keeps companions and effects in sync.
//! - [`snapshot`] -- [`Snapshot`] plus the [`SnapshotStore`] trait with
//!   file and in-memory implementations.
//!
//! # Example
//!
//! ```
//! use chrono::{TimeZone, Utc};
//! use reverie_core::{Engine, EngineConfig, Snapshot};
//! use reverie_types::{Companion, CompanionId, Form, FormId, XpSource};
//!
//! let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
//! let (mut engine, warnings) = Engine::load(EngineConfig::default(), Snapshot::default());
//! assert!(warnings.is_empty());
//!
//! let forms = vec![Form::new(FormId::new("wisp"), "Wisp", 1)];
//! engine
//!     .add_companion(Companion::new(CompanionId::new("moth"), "Moth", forms))
//!     .unwrap();
//!
//! let award = engine.award_xp(&[CompanionId::new("moth")], XpSource::Dream, now);
//! assert_eq!(award.outcomes.len(), 1);
//! ```

pub mod config;
pub mod engine;
pub mod snapshot;

pub use config::{ConfigError, EngineConfig};
pub use engine::{Engine, XpAward};
pub use snapshot::{JsonFileStore, MemoryStore, Snapshot, SnapshotError, SnapshotStore};
