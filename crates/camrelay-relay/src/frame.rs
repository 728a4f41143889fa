//! Single-slot latest-frame channel.
//!
//! Holds at most one frame. Publishing replaces whatever was there; a slow
//! reader sees the same frame repeatedly and a fast writer silently drops
//! older ones. There is no history and no sequencing.

use axum::body::Bytes;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::debug;

/// Number of hex characters in a [`FrameDigest::short_hash`].
const SHORT_HASH_LEN: usize = 16;

/// SHA-512 integrity fingerprint of a frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameDigest {
    /// SHA-512 over the frame's base64 text, lowercase hex.
    pub hash: String,
    pub short_hash: String,
    /// Frame size in bytes.
    pub size: usize,
}

impl FrameDigest {
    fn of(frame: &[u8]) -> Self {
        let hash = camrelay_crypto::sha512_hex(&STANDARD.encode(frame));
        let short_hash = hash[..SHORT_HASH_LEN].to_string();
        Self {
            hash,
            short_hash,
            size: frame.len(),
        }
    }
}

#[derive(Default)]
pub struct FrameChannel {
    slot: RwLock<Option<Bytes>>,
}

impl FrameChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the held frame unconditionally.
    pub async fn publish(&self, frame: impl Into<Bytes>) {
        let frame = frame.into();
        let size = frame.len();
        let previous = self.slot.write().await.replace(frame);
        debug!(size, replaced = previous.is_some(), "Frame published");
    }

    /// The most recently published frame, if any.
    pub async fn latest(&self) -> Option<Bytes> {
        self.slot.read().await.clone()
    }

    /// Fingerprint of the latest frame, if any.
    pub async fn digest(&self) -> Option<FrameDigest> {
        let frame = self.latest().await?;
        Some(FrameDigest::of(&frame))
    }
}
