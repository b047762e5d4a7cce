use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use db::{NewWorkflow, WorkflowRow, WorkflowStatus, WorkflowUpdate};
use graph::{from_steps, to_steps, Canvas, Step, WorkflowNode};
use serde::Deserialize;
use serde_json::Value;
use tracing::{instrument, warn};
use uuid::Uuid;

use crate::extract::{ApiJson, ApiPath};
use crate::{error::ApiError, tenant::tenant_from_headers, AppState};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateWorkflowDto {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<WorkflowStatus>,
    /// Canvas nodes to save as the initial steps.
    #[serde(default)]
    pub nodes: Option<Vec<WorkflowNode>>,
}

/// A save from the editor.  Fields left out keep their stored value.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateWorkflowDto {
    /// The `version` the editor loaded.
    pub expected_version: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<WorkflowStatus>,
    #[serde(default)]
    pub nodes: Option<Vec<WorkflowNode>>,
}

pub async fn list(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<WorkflowRow>>, ApiError> {
    let tenant = tenant_from_headers(&headers)?;
    Ok(Json(state.store.list(&tenant).await?))
}

pub async fn get(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    headers: HeaderMap,
) -> Result<Json<WorkflowRow>, ApiError> {
    let tenant = tenant_from_headers(&headers)?;
    Ok(Json(state.store.get(&tenant, id).await?))
}

#[instrument(skip_all, fields(name = %payload.name))]
pub async fn create(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiJson(payload): ApiJson<CreateWorkflowDto>,
) -> Result<(StatusCode, Json<WorkflowRow>), ApiError> {
    let tenant = tenant_from_headers(&headers)?;
    let name = required_name(&payload.name)?;
    let steps = steps_value(payload.nodes.as_deref().unwrap_or_default())?;

    let row = state
        .store
        .create(
            &tenant,
            NewWorkflow {
                name,
                description: payload.description,
                status: payload.status.unwrap_or_default(),
                steps,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(row)))
}

#[instrument(skip_all, fields(workflow_id = %id, expected_version = payload.expected_version))]
pub async fn update(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    headers: HeaderMap,
    ApiJson(payload): ApiJson<UpdateWorkflowDto>,
) -> Result<Json<WorkflowRow>, ApiError> {
    let tenant = tenant_from_headers(&headers)?;
    let current = state.store.get(&tenant, id).await?;

    let mut update = WorkflowUpdate::from_row(&current)?;
    update.expected_version = payload.expected_version;
    if let Some(name) = payload.name {
        update.name = required_name(&name)?;
    }
    if let Some(description) = payload.description {
        update.description = Some(description);
    }
    if let Some(status) = payload.status {
        update.status = status;
    }
    if let Some(nodes) = payload.nodes {
        update.steps = steps_value(&nodes)?;
    }

    Ok(Json(state.store.update(&tenant, id, update).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    let tenant = tenant_from_headers(&headers)?;
    state.store.delete(&tenant, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// The stored steps rebuilt as canvas nodes.  Edges are not stored, so the
/// canvas comes back without any.
pub async fn canvas(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    headers: HeaderMap,
) -> Result<Json<Canvas>, ApiError> {
    let tenant = tenant_from_headers(&headers)?;
    let row = state.store.get(&tenant, id).await?;
    let nodes = from_steps(&decode_steps(&row));
    Ok(Json(Canvas::new(nodes, Vec::new())))
}

fn required_name(name: &str) -> Result<String, ApiError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ApiError::BadRequest("workflow name must not be empty".into()));
    }
    Ok(name.to_owned())
}

fn steps_value(nodes: &[WorkflowNode]) -> Result<Value, ApiError> {
    Ok(serde_json::to_value(to_steps(nodes))?)
}

/// Imported rows keep their steps verbatim, so entries that do not look
/// like a step are skipped.
fn decode_steps(row: &WorkflowRow) -> Vec<Step> {
    let Some(items) = row.steps.as_array() else {
        warn!(workflow_id = %row.id, "stored steps are not an array");
        return Vec::new();
    };

    items
        .iter()
        .enumerate()
        .filter_map(|(index, item)| match serde_json::from_value::<Step>(item.clone()) {
            Ok(step) => Some(step),
            Err(e) => {
                warn!(workflow_id = %row.id, index, "skipping unreadable step: {}", e);
                None
            }
        })
        .collect()
}
