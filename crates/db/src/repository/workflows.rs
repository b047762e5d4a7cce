//! Workflow CRUD operations.
//!
//! Every query is scoped by `tenant_id`; a row belonging to another tenant
//! is reported as `NotFound`.

use chrono::Utc;
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    DbError,
    models::{NewWorkflow, WorkflowRow, WorkflowUpdate},
};

const COLUMNS: &str =
    "id, tenant_id, name, description, status, steps, execution_count, version, created_at, updated_at";

/// Insert a new workflow at version 1.
#[instrument(skip(pool, new), fields(name = %new.name))]
pub async fn create_workflow(
    pool: &PgPool,
    tenant_id: Uuid,
    new: &NewWorkflow,
) -> Result<WorkflowRow, DbError> {
    let id = Uuid::new_v4();
    let now = Utc::now();

    let sql = format!(
        r#"
        INSERT INTO workflows
            (id, tenant_id, name, description, status, steps, execution_count, version, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, 0, 1, $7, $7)
        RETURNING {COLUMNS}
        "#
    );

    sqlx::query_as::<_, WorkflowRow>(&sql)
        .bind(id)
        .bind(tenant_id)
        .bind(&new.name)
        .bind(&new.description)
        .bind(new.status.to_string())
        .bind(&new.steps)
        .bind(now)
        .fetch_one(pool)
        .await
        .map_err(|e| DbError::from_write(e, &new.name))
}

/// Fetch a single workflow of this tenant.
pub async fn get_workflow(pool: &PgPool, tenant_id: Uuid, id: Uuid) -> Result<WorkflowRow, DbError> {
    let sql = format!("SELECT {COLUMNS} FROM workflows WHERE id = $1 AND tenant_id = $2");

    sqlx::query_as::<_, WorkflowRow>(&sql)
        .bind(id)
        .bind(tenant_id)
        .fetch_optional(pool)
        .await?
        .ok_or(DbError::NotFound)
}

/// Return all of a tenant's workflows, most recently updated first.
pub async fn list_workflows(pool: &PgPool, tenant_id: Uuid) -> Result<Vec<WorkflowRow>, DbError> {
    let sql = format!("SELECT {COLUMNS} FROM workflows WHERE tenant_id = $1 ORDER BY updated_at DESC");

    let rows = sqlx::query_as::<_, WorkflowRow>(&sql)
        .bind(tenant_id)
        .fetch_all(pool)
        .await?;

    Ok(rows)
}

/// Replace the mutable columns if the row is still at `expected_version`.
///
/// Returns `DbError::VersionConflict` when another writer got there first
/// and `DbError::NotFound` when the row does not exist.
#[instrument(skip(pool, update), fields(expected_version = update.expected_version))]
pub async fn update_workflow(
    pool: &PgPool,
    tenant_id: Uuid,
    id: Uuid,
    update: &WorkflowUpdate,
) -> Result<WorkflowRow, DbError> {
    let sql = format!(
        r#"
        UPDATE workflows
        SET name = $1, description = $2, status = $3, steps = $4,
            version = version + 1, updated_at = $5
        WHERE id = $6 AND tenant_id = $7 AND version = $8
        RETURNING {COLUMNS}
        "#
    );

    let updated = sqlx::query_as::<_, WorkflowRow>(&sql)
        .bind(&update.name)
        .bind(&update.description)
        .bind(update.status.to_string())
        .bind(&update.steps)
        .bind(Utc::now())
        .bind(id)
        .bind(tenant_id)
        .bind(update.expected_version)
        .fetch_optional(pool)
        .await
        .map_err(|e| DbError::from_write(e, &update.name))?;

    if let Some(row) = updated {
        return Ok(row);
    }

    // Nothing matched: tell a stale version apart from a missing row.
    let current: Option<(i64,)> =
        sqlx::query_as("SELECT version FROM workflows WHERE id = $1 AND tenant_id = $2")
            .bind(id)
            .bind(tenant_id)
            .fetch_optional(pool)
            .await?;

    match current {
        Some((actual,)) => Err(DbError::VersionConflict {
            expected: update.expected_version,
            actual,
        }),
        None => Err(DbError::NotFound),
    }
}

/// Permanently delete a workflow.
///
/// Returns `DbError::NotFound` if no row was deleted.
pub async fn delete_workflow(pool: &PgPool, tenant_id: Uuid, id: Uuid) -> Result<(), DbError> {
    let result = sqlx::query("DELETE FROM workflows WHERE id = $1 AND tenant_id = $2")
        .bind(id)
        .bind(tenant_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }

    Ok(())
}
