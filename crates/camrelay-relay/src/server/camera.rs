//! `/api/camera` handlers: key registration, frame ingest and frame reads.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use camrelay_crypto::SymmetricKey;

use super::{AppState, decode_base64, present};
use crate::error::RelayError;
use crate::frame::FrameDigest;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegisterKeyRequest {
    version: Option<String>,
    key: Option<String>,
    access_key: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FrameDataRequest {
    encrypted_content: Option<String>,
    key_version: Option<String>,
    iv: Option<String>,
    encryption_date: Option<String>,
}

fn parse<T: DeserializeOwned>(body: Value) -> Result<T, RelayError> {
    serde_json::from_value(body).map_err(|e| {
        debug!(error = %e, "Request body has wrong field types");
        RelayError::Validation("Invalid request body".into())
    })
}

/// `POST /api/camera`: dispatch on the body's `type` field.
pub async fn ingest(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, RelayError> {
    let Json(body) = body?;
    let kind = body.get("type").and_then(Value::as_str).map(str::to_owned);
    match kind.as_deref() {
        Some("register_key") => register_key(&state, parse(body)?).await,
        Some("data") => ingest_frame(&state, parse(body)?).await,
        other => {
            debug!(request_type = ?other, "Unknown camera request type");
            Err(RelayError::Validation("Unknown request type".into()))
        }
    }
}

async fn register_key(
    state: &AppState,
    req: RegisterKeyRequest,
) -> Result<Json<Value>, RelayError> {
    let (Some(version), Some(key)) = (present(req.version), present(req.key)) else {
        return Err(RelayError::Validation("Missing version or key".into()));
    };

    let access_key = present(req.access_key);
    let access = state.pins.check_access(access_key.as_deref()).await?;

    let key = decode_base64(&key)
        .and_then(|raw| SymmetricKey::from_slice(&raw).ok())
        .ok_or_else(|| RelayError::Validation("Key must be 32 bytes, base64 encoded".into()))?;

    // The PIN that admitted this request stays in force until the key is in.
    state.keys.register(&version, key).await;
    drop(access);
    Ok(Json(json!({
        "success": true,
        "message": "Key registered successfully",
    })))
}

async fn ingest_frame(state: &AppState, req: FrameDataRequest) -> Result<Json<Value>, RelayError> {
    let (Some(content), Some(version), Some(iv)) = (
        present(req.encrypted_content),
        present(req.key_version),
        present(req.iv),
    ) else {
        return Err(RelayError::Validation("Invalid encrypted data format".into()));
    };

    let key = state
        .keys
        .lookup(&version)
        .await
        .ok_or_else(|| RelayError::NotFound(format!("Key not found for version: {version}")))?;

    let (Some(ciphertext), Some(iv)) = (decode_base64(&content), decode_base64(&iv)) else {
        return Err(RelayError::Validation("Invalid encrypted data format".into()));
    };

    if let Some(date) = req.encryption_date.as_deref() {
        debug!(key_version = %version, encryption_date = date, "Frame encryption date");
    }

    let (decrypted_length, frame) = open_frame(&ciphertext, &key, &iv).inspect_err(|e| {
        warn!(key_version = %version, error = %e, "Frame decryption failed");
    })?;

    let frame_len = frame.len();
    state.frames.publish(frame).await;
    info!(key_version = %version, decrypted_length, frame_len, "Frame received");

    Ok(Json(json!({
        "success": true,
        "message": "Data received and decrypted",
        "decryptedLength": decrypted_length,
    })))
}

/// Decrypt a frame payload. The plaintext is the base64 text of the image.
///
/// Returns the plaintext length and the decoded image bytes. Any failure
/// along the way is reported as [`RelayError::DecryptionFailed`].
fn open_frame(
    ciphertext: &[u8],
    key: &SymmetricKey,
    iv: &[u8],
) -> Result<(usize, Vec<u8>), RelayError> {
    let plaintext = camrelay_crypto::decrypt(ciphertext, key.as_bytes(), iv).map_err(|e| {
        debug!(error = %e, "Cipher rejected frame");
        RelayError::DecryptionFailed
    })?;
    let text = String::from_utf8(plaintext).map_err(|_| RelayError::DecryptionFailed)?;
    let frame = decode_base64(&text).ok_or(RelayError::DecryptionFailed)?;
    Ok((text.len(), frame))
}

/// `GET /api/camera`: the latest frame as JPEG.
pub async fn latest_frame(State(state): State<AppState>) -> Result<Response, RelayError> {
    let frame = state
        .frames
        .latest()
        .await
        .ok_or_else(|| RelayError::NotFound("No frame available".into()))?;
    Ok((
        [
            (header::CONTENT_TYPE, "image/jpeg"),
            (header::CACHE_CONTROL, "no-store, max-age=0"),
        ],
        frame,
    )
        .into_response())
}

/// `GET /api/camera/digest`: SHA-512 fingerprint of the latest frame.
pub async fn frame_digest(State(state): State<AppState>) -> Result<Json<FrameDigest>, RelayError> {
    state
        .frames
        .digest()
        .await
        .map(Json)
        .ok_or_else(|| RelayError::NotFound("No frame available".into()))
}
