//! Persisted engine state and the stores that hold it.
//!
//! A [`Snapshot`] is everything the engine needs to resume: companions, the
//! effect registry, and both notification logs. It is deliberately
//! permissive on input (every section defaults to empty) because the engine
//! repairs whatever it loads.
//!
//! Storage sits behind [`SnapshotStore`] so the engine never performs I/O
//! itself. [`JsonFileStore`] writes pretty JSON to disk; [`MemoryStore`]
//! holds the snapshot in process for tests and embedders.

use std::path::{Path, PathBuf};

use reverie_effects::EffectRegistry;
use reverie_types::{Companion, EvolutionRecord, XpGainRecord};
use serde::{Deserialize, Serialize};

/// Errors raised while encoding, decoding, or storing a snapshot.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    /// The snapshot is not valid JSON or does not match the schema.
    #[error("snapshot JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The backing file could not be read or written.
    #[error("snapshot I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Complete persisted state of the engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Every companion, in display order.
    #[serde(default)]
    pub companions: Vec<Companion>,
    /// The effect registry.
    #[serde(default)]
    pub effects: EffectRegistry,
    /// Recent evolutions, oldest first.
    #[serde(default)]
    pub recent_evolutions: Vec<EvolutionRecord>,
    /// Recent XP gains, oldest first.
    #[serde(default)]
    pub recent_xp: Vec<XpGainRecord>,
}

impl Snapshot {
    /// Decode a snapshot from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::Json`] if the input is malformed.
    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Encode the snapshot as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::Json`] if serialization fails.
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Somewhere a snapshot can be loaded from and saved to.
pub trait SnapshotStore {
    /// Load the stored snapshot, or `None` if nothing has been saved yet.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError`] if the stored data cannot be read or
    /// decoded.
    fn load(&self) -> Result<Option<Snapshot>, SnapshotError>;

    /// Replace the stored snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError`] if the snapshot cannot be encoded or
    /// written.
    fn save(&mut self, snapshot: &Snapshot) -> Result<(), SnapshotError>;
}

/// Snapshot stored as a JSON file.
///
/// Saves write a sibling temporary file and rename it over the target, so
/// a crash mid-write leaves the previous snapshot intact.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Store backed by the file at `path`. The file need not exist yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_default();
        name.push(format!(".{}.tmp", uuid::Uuid::now_v7().simple()));
        self.path.with_file_name(name)
    }
}

impl SnapshotStore for JsonFileStore {
    fn load(&self) -> Result<Option<Snapshot>, SnapshotError> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "no snapshot on disk");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };
        Snapshot::from_json(&contents).map(Some)
    }

    fn save(&mut self, snapshot: &Snapshot) -> Result<(), SnapshotError> {
        let json = snapshot.to_json()?;
        let temp = self.temp_path();
        std::fs::write(&temp, json)?;
        if let Err(e) = std::fs::rename(&temp, &self.path) {
            let _ = std::fs::remove_file(&temp);
            return Err(e.into());
        }
        tracing::debug!(
            path = %self.path.display(),
            companions = snapshot.companions.len(),
            effects = snapshot.effects.len(),
            "snapshot saved"
        );
        Ok(())
    }
}

/// Snapshot held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    snapshot: Option<Snapshot>,
}

impl MemoryStore {
    /// An empty store.
    pub const fn new() -> Self {
        Self { snapshot: None }
    }

    /// A store pre-populated with `snapshot`.
    pub const fn with_snapshot(snapshot: Snapshot) -> Self {
        Self {
            snapshot: Some(snapshot),
        }
    }
}

impl SnapshotStore for MemoryStore {
    fn load(&self) -> Result<Option<Snapshot>, SnapshotError> {
        Ok(self.snapshot.clone())
    }

    fn save(&mut self, snapshot: &Snapshot) -> Result<(), SnapshotError> {
        self.snapshot = Some(snapshot.clone());
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use reverie_types::{CompanionId, Form, FormId};

    use super::*;

    fn sample() -> Snapshot {
        let forms = vec![
            Form::new(FormId::new("wisp"), "Wisp", 1),
            Form::new(FormId::new("shade"), "Shade", 3),
        ];
        Snapshot {
            companions: vec![Companion::new(CompanionId::new("moth"), "Moth", forms)],
            ..Snapshot::default()
        }
    }

    fn temp_file() -> PathBuf {
        std::env::temp_dir().join(format!("reverie-snapshot-{}.json", uuid::Uuid::now_v7()))
    }

    #[test]
    fn empty_object_decodes_to_default() {
        let snapshot = Snapshot::from_json("{}").unwrap();
        assert_eq!(snapshot, Snapshot::default());
    }

    #[test]
    fn malformed_json_is_error() {
        let result = Snapshot::from_json("{\"companions\": [");
        assert!(matches!(result, Err(SnapshotError::Json(_))));
    }

    #[test]
    fn json_preserves_companions() {
        let snapshot = sample();
        let decoded = Snapshot::from_json(&snapshot.to_json().unwrap()).unwrap();
        assert_eq!(decoded, snapshot);
    }

    #[test]
    fn memory_store_starts_empty() {
        let store = MemoryStore::new();
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn memory_store_replaces_snapshot() {
        let mut store = MemoryStore::with_snapshot(Snapshot::default());
        store.save(&sample()).unwrap();
        assert_eq!(store.load().unwrap(), Some(sample()));
    }

    #[test]
    fn file_store_missing_file_is_none() {
        let store = JsonFileStore::new(temp_file());
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn file_store_save_then_load() {
        let path = temp_file();
        let mut store = JsonFileStore::new(&path);
        store.save(&sample()).unwrap();
        let loaded = store.load().unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(loaded, Some(sample()));
    }

    #[test]
    fn file_store_corrupt_file_is_error() {
        let path = temp_file();
        std::fs::write(&path, "not json").unwrap();
        let result = JsonFileStore::new(&path).load();
        std::fs::remove_file(&path).unwrap();
        assert!(matches!(result, Err(SnapshotError::Json(_))));
    }
}
