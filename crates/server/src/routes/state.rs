use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use service::state::StateStore;

use crate::errors::ApiError;
use crate::routes::ServerState;

#[derive(Debug, Deserialize)]
pub struct SaveStateRequest {
    #[serde(default)]
    pub state: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct StateResponse {
    pub state: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct OkResponse {
    pub ok: bool,
}

/// GET /api/state/:user_id
pub async fn get_state<S: StateStore + 'static>(
    State(state): State<ServerState<S>>,
    Path(user_id): Path<String>,
) -> Result<Json<StateResponse>, ApiError> {
    let value = state.states.read_state(&user_id).await?;
    Ok(Json(StateResponse { state: value }))
}

/// POST /api/state/:user_id with `{"state": {...}}`
///
/// Bodies that are not JSON, or lack `state`, are handed to the service as an
/// absent state so validation stays in one place. Oversized bodies stop here.
pub async fn save_state<S: StateStore + 'static>(
    State(state): State<ServerState<S>>,
    Path(user_id): Path<String>,
    body: Result<Json<SaveStateRequest>, JsonRejection>,
) -> Result<Json<OkResponse>, ApiError> {
    let value = match body {
        Ok(Json(req)) => req.state,
        Err(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            warn!(%user_id, "request body over limit");
            return Err(ApiError::payload_too_large());
        }
        Err(rejection) => {
            debug!(%user_id, error = %rejection.body_text(), "unreadable state body");
            None
        }
    };
    state.states.write_state(&user_id, value).await?;
    Ok(Json(OkResponse { ok: true }))
}

/// `/api/state` and `/api/state/` carry no user id.
pub async fn missing_user_id() -> ApiError {
    ApiError::missing_user_id()
}
