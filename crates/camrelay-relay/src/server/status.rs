//! Session status and liveness.

use axum::Json;
use axum::extract::State;
use axum::http::HeaderMap;
use serde::Serialize;

use super::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigResponse {
    pub port: u16,
    pub full_address: String,
    pub session: SessionStatus,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatus {
    pub client_id: String,
    pub encryption: &'static str,
    pub hash_algorithm: &'static str,
    /// Unix milliseconds.
    pub session_start: u64,
    pub device_type: &'static str,
    /// `Connected` once a PIN is set, `Listening` before.
    pub connection_status: &'static str,
    pub key_version: Option<String>,
    pub pending_commands: usize,
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// `GET /api/config`
pub async fn session_config(
    headers: HeaderMap,
    State(state): State<AppState>,
) -> Json<ConfigResponse> {
    let session = &state.session;
    let scheme = header_str(&headers, "x-forwarded-proto").unwrap_or("http");
    let host = header_str(&headers, "host").map_or_else(
        || format!("localhost:{}", session.port),
        str::to_string,
    );

    let connection_status = if state.pins.is_set().await {
        "Connected"
    } else {
        "Listening"
    };

    Json(ConfigResponse {
        port: session.port,
        full_address: format!("{scheme}://{host}"),
        session: SessionStatus {
            client_id: session.client_id.clone(),
            encryption: "AES-256-CTR",
            hash_algorithm: "SHA-512",
            session_start: session.started_at_ms,
            device_type: "Web Interface",
            connection_status,
            key_version: state.keys.current_version().await,
            pending_commands: state.commands.pending().await,
        },
    })
}

/// `GET /healthz`
pub async fn health() -> &'static str {
    "ok"
}
