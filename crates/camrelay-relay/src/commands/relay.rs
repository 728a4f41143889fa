//! Time-bounded command queue with drain-on-poll.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::commands::envelope::{CommandEnvelope, CommandPayload};
use crate::error::RelayError;
use crate::keys::KeyStore;

/// How long an undelivered command stays queued. Fixed, not configurable.
pub const COMMAND_TTL: Duration = Duration::from_millis(5000);

/// Current wall-clock time as Unix milliseconds.
pub fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
}

/// Queue of encrypted outbound commands.
pub struct CommandRelay {
    keys: Arc<KeyStore>,
    queue: Mutex<VecDeque<CommandEnvelope>>,
}

impl CommandRelay {
    pub fn new(keys: Arc<KeyStore>) -> Self {
        Self {
            keys,
            queue: Mutex::new(VecDeque::new()),
        }
    }

    /// Encrypt a command under the current key version and enqueue it.
    ///
    /// Fails with [`RelayError::NoKeyRegistered`] until a key exists. Each
    /// envelope gets a fresh IV.
    pub async fn submit(
        &self,
        action: &str,
        command_id: &str,
    ) -> Result<CommandEnvelope, RelayError> {
        let record = self.keys.current().await.ok_or(RelayError::NoKeyRegistered)?;

        let payload = CommandPayload {
            action: action.to_string(),
            timestamp: unix_millis(),
            command_id: command_id.to_string(),
        };
        let plaintext = serde_json::to_vec(&payload)
            .map_err(|e| RelayError::Internal(format!("Unserializable command: {e}")))?;

        let iv = camrelay_crypto::generate_iv();
        let ciphertext = camrelay_crypto::encrypt(&plaintext, record.key.as_bytes(), &iv)?;

        let envelope = CommandEnvelope {
            command_id: command_id.to_string(),
            encrypted_content: STANDARD.encode(ciphertext),
            key_version: record.version,
            iv: STANDARD.encode(iv),
            timestamp: unix_millis(),
            enqueued_at: Instant::now(),
        };

        let mut queue = self.queue.lock().await;
        queue.push_back(envelope.clone());
        let pending = queue.len();
        drop(queue);

        info!(
            command_id,
            key_version = %envelope.key_version,
            pending,
            "Command queued"
        );
        Ok(envelope)
    }

    /// Evict expired envelopes, then return and remove everything left.
    ///
    /// Runs as one critical section: an envelope is either returned by
    /// exactly one poll or evicted, never both and never neither.
    pub async fn poll_and_drain(&self) -> Vec<CommandEnvelope> {
        let mut queue = self.queue.lock().await;
        let evicted = evict(&mut queue, Instant::now());
        let drained: Vec<CommandEnvelope> = queue.drain(..).collect();
        drop(queue);

        if evicted > 0 {
            debug!(evicted, "Dropped expired commands before drain");
        }
        if !drained.is_empty() {
            info!(count = drained.len(), "Commands drained");
        }
        drained
    }

    /// Drop expired envelopes without draining. Returns how many were removed.
    pub async fn evict_expired(&self) -> usize {
        let evicted = evict(&mut *self.queue.lock().await, Instant::now());
        if evicted > 0 {
            debug!(evicted, "Expired commands evicted");
        }
        evicted
    }

    /// Number of queued envelopes, expired or not.
    pub async fn pending(&self) -> usize {
        self.queue.lock().await.len()
    }
}

/// Remove every envelope whose age is at least [`COMMAND_TTL`].
fn evict(queue: &mut VecDeque<CommandEnvelope>, now: Instant) -> usize {
    let before = queue.len();
    queue.retain(|envelope| now.duration_since(envelope.enqueued_at) < COMMAND_TTL);
    before - queue.len()
}
