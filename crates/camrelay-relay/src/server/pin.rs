//! `/api/pin` handlers.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use serde_json::{Value, json};

use super::AppState;
use crate::error::RelayError;
use crate::pin::Pin;

/// `POST /api/pin`: set or replace the shared PIN.
pub async fn set_pin(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, RelayError> {
    let Json(body) = body?;
    let raw = body.get("pin").and_then(Value::as_str).unwrap_or_default();
    state.pins.set_pin(Pin::parse(raw)?).await?;
    Ok(Json(json!({
        "success": true,
        "message": "PIN set successfully",
    })))
}

/// `DELETE /api/pin`: return the gate to the unset state.
pub async fn clear_pin(State(state): State<AppState>) -> Result<Json<Value>, RelayError> {
    state.pins.clear_pin().await?;
    Ok(Json(json!({ "success": true, "message": "PIN cleared" })))
}
