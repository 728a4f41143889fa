//! `/api/command` handlers.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::{AppState, present};
use crate::commands::CommandEnvelope;
use crate::error::RelayError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmitCommandRequest {
    action: Option<String>,
    command_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PollResponse {
    pub commands: Vec<CommandEnvelope>,
}

/// Pull a usable `accessKey` out of the body, if it parsed at all.
fn access_key(body: &Result<Json<Value>, JsonRejection>) -> Option<&str> {
    let Ok(Json(body)) = body else {
        return None;
    };
    body.get("accessKey")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

/// `POST /api/command`: encrypt and queue a command for the phone.
///
/// Checks run PIN first, then required fields, then key availability. A
/// body that is not JSON at all still hits the PIN gate before it is
/// rejected.
pub async fn submit(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, RelayError> {
    let access = state.pins.check_command_access(access_key(&body)).await?;

    let Json(body) = body?;
    let req: SubmitCommandRequest = serde_json::from_value(body)
        .map_err(|_| RelayError::Validation("Missing action or commandId".into()))?;
    let (Some(action), Some(command_id)) = (present(req.action), present(req.command_id)) else {
        return Err(RelayError::Validation("Missing action or commandId".into()));
    };

    let envelope = state.commands.submit(&action, &command_id).await?;
    drop(access);

    Ok(Json(json!({
        "success": true,
        "message": "Command queued",
        "commandId": envelope.command_id,
    })))
}

/// `GET /api/command`: drain every unexpired command.
pub async fn poll(State(state): State<AppState>) -> Json<PollResponse> {
    Json(PollResponse {
        commands: state.commands.poll_and_drain().await,
    })
}
