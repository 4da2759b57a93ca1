use crate::error::PromptdeskError;
use crate::server::router::PromptdeskState;
use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use serde::Deserialize;
use std::collections::BTreeMap;

#[derive(Debug, Deserialize)]
pub struct SetConfigBody {
    #[serde(default)]
    pub value: String,
}

/// GET /api/config
pub async fn get_config(
    State(state): State<PromptdeskState>,
) -> Result<Json<BTreeMap<String, String>>, PromptdeskError> {
    Ok(Json(state.store.get_config().await?))
}

/// PUT /api/config/{key}
pub async fn set_config(
    State(state): State<PromptdeskState>,
    Path(key): Path<String>,
    payload: Result<Json<SetConfigBody>, JsonRejection>,
) -> Result<StatusCode, PromptdeskError> {
    let Json(body) = payload?;
    state.store.set_config(&key, &body.value).await?;
    Ok(StatusCode::NO_CONTENT)
}
