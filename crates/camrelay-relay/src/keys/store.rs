//! In-memory key store.
//!
//! Maps a client-chosen version string to a 256-bit key. Keys live for the
//! process lifetime; re-registering a version overwrites it. The most
//! recently registered version is tracked as the current one and is what
//! outbound commands get encrypted under.

use std::collections::HashMap;

use tokio::sync::RwLock;
use tracing::{debug, info};

use camrelay_crypto::SymmetricKey;

/// A registered key together with its version label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyRecord {
    pub version: String,
    pub key: SymmetricKey,
}

#[derive(Default)]
struct Keys {
    by_version: HashMap<String, SymmetricKey>,
    current: Option<String>,
}

/// Thread-safe registry of versioned keys.
#[derive(Default)]
pub struct KeyStore {
    inner: RwLock<Keys>,
}

impl KeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or overwrite) the key for `version` and make it current.
    ///
    /// Returns `true` if an existing key for that version was replaced.
    pub async fn register(&self, version: &str, key: SymmetricKey) -> bool {
        let mut keys = self.inner.write().await;
        let replaced = keys.by_version.insert(version.to_string(), key).is_some();
        keys.current = Some(version.to_string());
        drop(keys);

        if replaced {
            info!(version, "Key version re-registered");
        } else {
            info!(version, "Key version registered");
        }
        replaced
    }

    /// Look up the key for a version.
    pub async fn lookup(&self, version: &str) -> Option<SymmetricKey> {
        let key = self.inner.read().await.by_version.get(version).cloned();
        if key.is_none() {
            debug!(version, "Key lookup miss");
        }
        key
    }

    /// The most recently registered key, if any.
    pub async fn current(&self) -> Option<KeyRecord> {
        let keys = self.inner.read().await;
        let version = keys.current.as_ref()?;
        keys.by_version.get(version).map(|key| KeyRecord {
            version: version.clone(),
            key: key.clone(),
        })
    }

    pub async fn current_version(&self) -> Option<String> {
        self.inner.read().await.current.clone()
    }

    /// Number of distinct registered versions.
    pub async fn len(&self) -> usize {
        self.inner.read().await.by_version.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.by_version.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn lookup_unknown_version_is_none() {
        let store = KeyStore::new();
        assert!(store.lookup("v1").await.is_none());
        assert!(store.current().await.is_none());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn register_and_lookup() {
        let store = KeyStore::new();
        let key = SymmetricKey::generate();
        assert!(!store.register("v1", key.clone()).await);
        assert_eq!(store.lookup("v1").await, Some(key));
    }

    #[tokio::test]
    async fn re_registering_overwrites() {
        let store = KeyStore::new();
        let first = SymmetricKey::from_bytes([1; 32]);
        let second = SymmetricKey::from_bytes([2; 32]);

        store.register("v1", first).await;
        assert!(store.register("v1", second.clone()).await);

        assert_eq!(store.lookup("v1").await, Some(second));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn current_tracks_most_recent_registration() {
        let store = KeyStore::new();
        let v2 = SymmetricKey::from_bytes([2; 32]);
        store.register("v1", SymmetricKey::from_bytes([1; 32])).await;
        store.register("v2", v2.clone()).await;

        let current = store.current().await.unwrap();
        assert_eq!(current.version, "v2");
        assert_eq!(current.key, v2);

        // Re-registering an older version makes it current again.
        store.register("v1", SymmetricKey::from_bytes([3; 32])).await;
        assert_eq!(store.current_version().await.as_deref(), Some("v1"));
        assert_eq!(store.len().await, 2);
    }
}
