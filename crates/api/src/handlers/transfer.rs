//! Export to and import from `<slug>_automation.json` files.

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use db::{NewWorkflow, WorkflowRow, WorkflowStatus};
use graph::transfer::{read_import, unique_import_name};
use graph::{ExportDocument, ExportMetadata};
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use crate::extract::{ApiJson, ApiPath};
use crate::{error::ApiError, tenant::tenant_from_headers, AppState};

/// Shown as `exportedBy` when the caller sent no `x-user-email`.
const UNKNOWN_EXPORTER: &str = "unknown";

pub async fn export(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let tenant = tenant_from_headers(&headers)?;
    let row = state.store.get(&tenant, id).await?;

    let metadata = ExportMetadata {
        exported_at: Utc::now(),
        exported_by: tenant.user_email.clone().unwrap_or_else(|| UNKNOWN_EXPORTER.to_owned()),
        original_id: row.id.to_string(),
    };
    let document = ExportDocument::new(row.name.clone(), row.description.clone(), &row.steps, metadata);
    let disposition = format!("attachment; filename=\"{}\"", document.file_name());

    info!(workflow_id = %row.id, "workflow exported");
    Ok(([(header::CONTENT_DISPOSITION, disposition)], Json(document)))
}

/// Store an uploaded export as a new draft, renaming it on collision.
pub async fn import(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiJson(raw): ApiJson<Value>,
) -> Result<(StatusCode, Json<WorkflowRow>), ApiError> {
    let tenant = tenant_from_headers(&headers)?;
    let document = read_import(&raw)?;

    let existing = state.store.names(&tenant).await?;
    let name = unique_import_name(&document.name, existing.iter().map(String::as_str));

    let row = state
        .store
        .create(
            &tenant,
            NewWorkflow {
                name,
                description: document.description,
                status: WorkflowStatus::Draft,
                steps: Value::Array(document.steps),
            },
        )
        .await?;

    info!(workflow_id = %row.id, name = %row.name, "workflow imported");
    Ok((StatusCode::CREATED, Json(row)))
}
