use crate::db::Template;
use crate::error::PromptdeskError;
use crate::server::router::PromptdeskState;
use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
pub struct UpsertTemplateBody {
    pub name: String,
    pub data: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameTemplateBody {
    pub old_name: String,
    /// Omitted or empty keeps the current name.
    #[serde(default)]
    pub new_name: Option<String>,
    pub data: Value,
}

/// GET /api/templates
pub async fn list_templates(
    State(state): State<PromptdeskState>,
) -> Result<Json<Vec<Template>>, PromptdeskError> {
    Ok(Json(state.store.list().await?))
}

/// GET /api/templates/{name}
pub async fn get_template(
    State(state): State<PromptdeskState>,
    Path(name): Path<String>,
) -> Result<Json<Template>, PromptdeskError> {
    Ok(Json(state.store.get(&name).await?))
}

/// POST /api/templates
pub async fn upsert_template(
    State(state): State<PromptdeskState>,
    payload: Result<Json<UpsertTemplateBody>, JsonRejection>,
) -> Result<Json<Vec<Template>>, PromptdeskError> {
    let Json(body) = payload?;
    Ok(Json(state.store.upsert(&body.name, body.data).await?))
}

/// POST /api/templates:rename
pub async fn rename_template(
    State(state): State<PromptdeskState>,
    payload: Result<Json<RenameTemplateBody>, JsonRejection>,
) -> Result<Json<Vec<Template>>, PromptdeskError> {
    let Json(body) = payload?;
    let list = state
        .store
        .rename(&body.old_name, body.new_name.as_deref(), body.data)
        .await?;
    Ok(Json(list))
}

/// DELETE /api/templates/{name}
pub async fn delete_template(
    State(state): State<PromptdeskState>,
    Path(name): Path<String>,
) -> Result<Json<Vec<Template>>, PromptdeskError> {
    Ok(Json(state.store.delete(&name).await?))
}
