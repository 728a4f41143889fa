//! Wire types for queued commands.

use serde::{Deserialize, Serialize};
use tokio::time::Instant;

/// An encrypted command awaiting delivery.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandEnvelope {
    pub command_id: String,
    /// Base64 AES-256-CTR ciphertext of a [`CommandPayload`].
    pub encrypted_content: String,
    pub key_version: String,
    /// Base64 of the 16-byte IV used for this envelope only.
    pub iv: String,
    /// Enqueue time, Unix milliseconds.
    pub timestamp: u64,
    /// Monotonic enqueue time used for expiry.
    #[serde(skip)]
    pub enqueued_at: Instant,
}

/// Plaintext that gets encrypted into [`CommandEnvelope::encrypted_content`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandPayload {
    pub action: String,
    /// Submission time, Unix milliseconds.
    pub timestamp: u64,
    pub command_id: String,
}
