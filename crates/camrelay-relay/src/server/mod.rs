//! HTTP surface for the relay.

pub mod camera;
pub mod command;
pub mod error;
pub mod pin;
pub mod status;

use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tower_http::trace::TraceLayer;
use tracing::info;

use camrelay_core::Config;

use crate::commands::{CommandRelay, relay::unix_millis};
use crate::error::RelayError;
use crate::frame::FrameChannel;
use crate::keys::KeyStore;
use crate::pin::{FilePinStore, MemoryPinStore, PinGate, PinStore};

/// Identity of this relay process, reported by `GET /api/config`.
#[derive(Debug, Clone)]
pub struct SessionInfo {
    pub client_id: String,
    /// Process start, Unix milliseconds.
    pub started_at_ms: u64,
    pub port: u16,
}

impl SessionInfo {
    fn new(port: u16) -> Self {
        let id = uuid::Uuid::new_v4().simple().to_string();
        Self {
            client_id: format!("CLI-{}-SEC", id[..8].to_ascii_uppercase()),
            started_at_ms: unix_millis(),
            port,
        }
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub keys: Arc<KeyStore>,
    pub pins: Arc<PinGate>,
    pub frames: Arc<FrameChannel>,
    pub commands: Arc<CommandRelay>,
    pub session: Arc<SessionInfo>,
}

impl AppState {
    pub fn new(pins: PinGate, port: u16) -> Self {
        let keys = Arc::new(KeyStore::new());
        Self {
            commands: Arc::new(CommandRelay::new(Arc::clone(&keys))),
            keys,
            pins: Arc::new(pins),
            frames: Arc::new(FrameChannel::new()),
            session: Arc::new(SessionInfo::new(port)),
        }
    }

    /// Build state from resolved configuration, opening the PIN store.
    pub fn from_config(config: &Config) -> Result<Self, RelayError> {
        let store: Box<dyn PinStore> = match config.pin.resolved_path()? {
            Some(path) => {
                let store = FilePinStore::new(path);
                info!(path = %store.path().display(), "Persisting PIN to file");
                Box::new(store)
            }
            None => Box::new(MemoryPinStore),
        };
        let pins = PinGate::new(store, config.pin.unset_policy)?;
        Ok(Self::new(pins, config.server.addr.port()))
    }
}

/// Build the axum router with all relay routes.
pub fn build_router(state: AppState, max_payload_bytes: usize) -> Router {
    Router::new()
        .route("/api/camera", get(camera::latest_frame).post(camera::ingest))
        .route("/api/camera/digest", get(camera::frame_digest))
        .route("/api/command", get(command::poll).post(command::submit))
        .route("/api/pin", post(pin::set_pin).delete(pin::clear_pin))
        .route("/api/config", get(status::session_config))
        .route("/healthz", get(status::health))
        .layer(DefaultBodyLimit::max(max_payload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Treat empty strings the same as absent fields.
pub(crate) fn present(field: Option<String>) -> Option<String> {
    field.filter(|s| !s.is_empty())
}

/// Decode standard base64, tolerating embedded whitespace.
pub(crate) fn decode_base64(text: &str) -> Option<Vec<u8>> {
    let compact: String = text.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    STANDARD.decode(compact).ok()
}
