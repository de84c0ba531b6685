use axum::extract::rejection::JsonRejection;
use axum::{extract::State, Json};
use flowchart::{FlowChartSnapshot, Generated, StepAdded, Synced};
use gateway::Step;
use serde::Deserialize;
use serde_json::Value;

use super::AppState;
use crate::error::ApiError;

// Required text fields default to empty so that a missing field is reported
// by the editor's own validation. Bodies that fail to parse at all become a
// 400 through `From<JsonRejection> for ApiError`.

#[derive(Deserialize)]
pub struct GenerateSqlDto {
    #[serde(default)]
    pub natural_language: String,
    /// Free-form schema description; non-string JSON is passed on as JSON text.
    #[serde(default)]
    pub schema: Option<Value>,
}

#[derive(Deserialize)]
pub struct UpdateFlowchartDto {
    #[serde(default)]
    pub steps: Vec<Step>,
}

#[derive(Deserialize)]
pub struct AddStepDto {
    #[serde(default)]
    pub step_type: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub after_id: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateStepDto {
    #[serde(default)]
    pub step_id: String,
    #[serde(default)]
    pub new_text: String,
    #[serde(default)]
    pub new_type: Option<String>,
}

#[derive(Deserialize)]
pub struct RemoveStepDto {
    #[serde(default)]
    pub step_id: String,
}

fn schema_text(schema: Option<Value>) -> Option<String> {
    match schema? {
        Value::Null => None,
        Value::String(text) => Some(text),
        other => Some(other.to_string()),
    }
}

pub async fn generate_sql(
    State(state): State<AppState>,
    payload: Result<Json<GenerateSqlDto>, JsonRejection>,
) -> Result<Json<Generated>, ApiError> {
    let Json(payload) = payload?;
    let schema = schema_text(payload.schema);
    let generated = state
        .editor
        .generate(&payload.natural_language, schema.as_deref())
        .await?;
    Ok(Json(generated))
}

pub async fn update_flowchart(
    State(state): State<AppState>,
    payload: Result<Json<UpdateFlowchartDto>, JsonRejection>,
) -> Result<Json<Synced>, ApiError> {
    let Json(payload) = payload?;
    Ok(Json(state.editor.resync(&payload.steps).await?))
}

pub async fn add_step(
    State(state): State<AppState>,
    payload: Result<Json<AddStepDto>, JsonRejection>,
) -> Result<Json<StepAdded>, ApiError> {
    let Json(payload) = payload?;
    let added = state
        .editor
        .add_step(
            payload.step_type.as_deref(),
            &payload.description,
            payload.after_id.as_deref(),
        )
        .await?;
    Ok(Json(added))
}

pub async fn update_step(
    State(state): State<AppState>,
    payload: Result<Json<UpdateStepDto>, JsonRejection>,
) -> Result<Json<Synced>, ApiError> {
    let Json(payload) = payload?;
    let synced = state
        .editor
        .update_step(&payload.step_id, &payload.new_text, payload.new_type.as_deref())
        .await?;
    Ok(Json(synced))
}

pub async fn remove_step(
    State(state): State<AppState>,
    payload: Result<Json<RemoveStepDto>, JsonRejection>,
) -> Result<Json<Synced>, ApiError> {
    let Json(payload) = payload?;
    Ok(Json(state.editor.remove_step(&payload.step_id).await?))
}

pub async fn current(State(state): State<AppState>) -> Json<FlowChartSnapshot> {
    Json(state.editor.snapshot().await)
}
