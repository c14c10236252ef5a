use log::{error, warn};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::io::ErrorKind;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use crate::atomic::write_atomic;
use crate::error::{StoreError, StoreResult};

/// A single JSON document on disk holding one value of type `T`
///
/// The process treats these files as the source of truth on restart, so every
/// save goes through [`write_atomic`]. Documents are pretty-printed to stay
/// human-editable.
#[derive(Debug, Clone)]
pub struct JsonDocument<T> {
    path: PathBuf,
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonDocument<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _marker: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Load the document.
    ///
    /// Returns `Ok(None)` when the file does not exist and
    /// `Err(StoreError::Corrupt)` when it exists but does not parse as `T`.
    pub fn load(&self) -> StoreResult<Option<T>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::io(&self.path, e)),
        };

        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| StoreError::Corrupt {
                path: self.path.clone(),
                reason: e.to_string(),
            })
    }

    /// Persist `value`, replacing the previous document atomically
    pub fn save(&self, value: &T) -> StoreResult<()> {
        let bytes = serde_json::to_vec_pretty(value).map_err(|e| StoreError::Serialization {
            path: self.path.clone(),
            source: e,
        })?;
        write_atomic(&self.path, &bytes)
    }

    /// Load the document, falling back to `fallback()` when it is missing or
    /// unreadable. Never fails: a corrupt document is logged, moved aside to
    /// `<name>.corrupt` so the next save starts clean, and replaced by the
    /// fallback value in memory.
    pub fn load_or_else(&self, fallback: impl FnOnce() -> T) -> T {
        match self.load() {
            Ok(Some(value)) => value,
            Ok(None) => fallback(),
            Err(e) => {
                error!("[STORE] {} is unreadable, using defaults: {}", self.path.display(), e);
                if e.is_corruption() {
                    self.quarantine();
                }
                fallback()
            }
        }
    }

    /// Move an unreadable document out of the way, keeping it for inspection
    fn quarantine(&self) {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".corrupt");
        let target = self.path.with_file_name(name);
        if let Err(e) = fs::rename(&self.path, &target) {
            warn!(
                "[STORE] Could not move {} aside: {}",
                self.path.display(),
                e
            );
        } else {
            warn!("[STORE] Corrupt document kept at {}", target.display());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Sample {
        name: String,
        count: u32,
    }

    fn sample() -> Sample {
        Sample {
            name: "spot".to_string(),
            count: 3,
        }
    }

    #[test]
    fn test_missing_document_loads_none() {
        let dir = tempfile::tempdir().unwrap();
        let doc: JsonDocument<Sample> = JsonDocument::new(dir.path().join("missing.json"));
        assert!(doc.load().unwrap().is_none());
        assert!(!doc.exists());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let doc = JsonDocument::new(dir.path().join("sample.json"));
        doc.save(&sample()).unwrap();

        assert_eq!(doc.load().unwrap(), Some(sample()));
        // Pretty-printed for hand editing
        let raw = fs::read_to_string(doc.path()).unwrap();
        assert!(raw.contains('\n'));
    }

    #[test]
    fn test_corrupt_document_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.json");
        fs::write(&path, "{ not json").unwrap();

        let doc: JsonDocument<Sample> = JsonDocument::new(&path);
        let err = doc.load().unwrap_err();
        assert!(err.is_corruption());
    }

    #[test]
    fn test_load_or_else_quarantines_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.json");
        fs::write(&path, "[1, 2").unwrap();

        let doc: JsonDocument<Sample> = JsonDocument::new(&path);
        let value = doc.load_or_else(sample);

        assert_eq!(value, sample());
        assert!(!path.exists());
        assert!(dir.path().join("sample.json.corrupt").exists());
    }

    #[test]
    fn test_load_or_else_missing_uses_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let doc: JsonDocument<Sample> = JsonDocument::new(dir.path().join("none.json"));
        assert_eq!(doc.load_or_else(sample), sample());
    }
}
