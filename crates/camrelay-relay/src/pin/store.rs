//! PIN persistence backends.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::RelayError;
use crate::pin::gate::Pin;

/// Durable backing for the PIN gate.
///
/// The gate loads once at construction and calls [`persist`](Self::persist)
/// before every state change, so the store and the in-memory PIN never
/// disagree.
pub trait PinStore: Send + Sync {
    /// Read the persisted PIN, if any.
    fn load(&self) -> Result<Option<Pin>, RelayError>;

    /// Persist the new PIN state (`None` clears it).
    fn persist(&self, pin: Option<&Pin>) -> Result<(), RelayError>;

    /// Whether persisted state survives a process restart.
    fn is_durable(&self) -> bool;
}

/// Process-lifetime only: nothing is written anywhere.
#[derive(Debug, Default, Clone, Copy)]
pub struct MemoryPinStore;

impl PinStore for MemoryPinStore {
    fn load(&self) -> Result<Option<Pin>, RelayError> {
        Ok(None)
    }

    fn persist(&self, _pin: Option<&Pin>) -> Result<(), RelayError> {
        Ok(())
    }

    fn is_durable(&self) -> bool {
        false
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct PinFile {
    pin: Option<String>,
}

/// Write-through JSON file store.
#[derive(Debug, Clone)]
pub struct FilePinStore {
    path: PathBuf,
}

impl FilePinStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PinStore for FilePinStore {
    /// A missing file means no PIN has been set yet.
    fn load(&self) -> Result<Option<Pin>, RelayError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let data = std::fs::read_to_string(&self.path).map_err(|e| {
            RelayError::PinStorage(format!("Failed to read {}: {e}", self.path.display()))
        })?;
        let file: PinFile = serde_json::from_str(&data).map_err(|e| {
            RelayError::PinStorage(format!("Failed to parse {}: {e}", self.path.display()))
        })?;
        file.pin
            .as_deref()
            .map(Pin::parse)
            .transpose()
            .map_err(|_| {
                RelayError::PinStorage(format!("{} holds a malformed PIN", self.path.display()))
            })
    }

    /// Writes to a sibling temp file and renames it over the target.
    ///
    /// Blocking I/O; [`PinGate`](crate::pin::PinGate) calls this on the
    /// blocking pool.
    fn persist(&self, pin: Option<&Pin>) -> Result<(), RelayError> {
        let io_err = |e: std::io::Error| {
            RelayError::PinStorage(format!("Failed to write {}: {e}", self.path.display()))
        };

        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir).map_err(io_err)?;
        }
        let file = PinFile {
            pin: pin.map(|p| p.as_str().to_string()),
        };
        let json = serde_json::to_string(&file)
            .map_err(|e| RelayError::PinStorage(format!("Failed to serialize PIN: {e}")))?;

        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, json).map_err(io_err)?;
        std::fs::rename(&tmp, &self.path).map_err(io_err)?;
        Ok(())
    }

    fn is_durable(&self) -> bool {
        true
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_loads_as_unset() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilePinStore::new(dir.path().join("pin.json"));
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn persist_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("pin.json");
        let store = FilePinStore::new(&path);

        store.persist(Some(&Pin::parse("4821").unwrap())).unwrap();
        let reopened = FilePinStore::new(&path);
        assert_eq!(reopened.load().unwrap().unwrap().as_str(), "4821");

        store.persist(None).unwrap();
        assert!(reopened.load().unwrap().is_none());
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pin.json");
        std::fs::write(&path, "garbage").unwrap();
        assert!(matches!(
            FilePinStore::new(&path).load(),
            Err(RelayError::PinStorage(_))
        ));

        std::fs::write(&path, r#"{"pin":"12a4"}"#).unwrap();
        assert!(matches!(
            FilePinStore::new(&path).load(),
            Err(RelayError::PinStorage(_))
        ));
    }

    #[test]
    fn memory_store_is_not_durable() {
        let store = MemoryPinStore;
        store.persist(Some(&Pin::parse("1234").unwrap())).unwrap();
        assert!(store.load().unwrap().is_none());
        assert!(!store.is_durable());
        assert!(FilePinStore::new("/tmp/x").is_durable());
    }
}
