//! The `WorkflowStore` trait and its two implementations.
//!
//! - [`PgWorkflowStore`] delegates to the repository functions.
//! - [`MemoryWorkflowStore`] keeps rows in a map with the same rules
//!   (tenant scoping, unique names, version checks) for tests and demos.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    DbError, DbPool,
    models::{NewWorkflow, TenantContext, WorkflowRow, WorkflowUpdate},
    repository::workflows as repo,
};

/// Tenant-scoped persistence for workflow rows.
#[async_trait]
pub trait WorkflowStore: Send + Sync {
    async fn create(&self, tenant: &TenantContext, new: NewWorkflow) -> Result<WorkflowRow, DbError>;

    async fn get(&self, tenant: &TenantContext, id: Uuid) -> Result<WorkflowRow, DbError>;

    /// Most recently updated first.
    async fn list(&self, tenant: &TenantContext) -> Result<Vec<WorkflowRow>, DbError>;

    /// Rejects with [`DbError::VersionConflict`] when `update.expected_version`
    /// is not the stored version.
    async fn update(&self, tenant: &TenantContext, id: Uuid, update: WorkflowUpdate) -> Result<WorkflowRow, DbError>;

    async fn delete(&self, tenant: &TenantContext, id: Uuid) -> Result<(), DbError>;

    /// Names of all of the tenant's workflows.
    async fn names(&self, tenant: &TenantContext) -> Result<Vec<String>, DbError> {
        Ok(self.list(tenant).await?.into_iter().map(|row| row.name).collect())
    }
}

// ---------------------------------------------------------------------------
// Postgres
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct PgWorkflowStore {
    pool: DbPool,
}

impl PgWorkflowStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WorkflowStore for PgWorkflowStore {
    #[instrument(skip_all, fields(tenant_id = %tenant.tenant_id, name = %new.name))]
    async fn create(&self, tenant: &TenantContext, new: NewWorkflow) -> Result<WorkflowRow, DbError> {
        let row = repo::create_workflow(&self.pool, tenant.tenant_id, &new).await?;
        info!(workflow_id = %row.id, "workflow created");
        Ok(row)
    }

    async fn get(&self, tenant: &TenantContext, id: Uuid) -> Result<WorkflowRow, DbError> {
        repo::get_workflow(&self.pool, tenant.tenant_id, id).await
    }

    async fn list(&self, tenant: &TenantContext) -> Result<Vec<WorkflowRow>, DbError> {
        repo::list_workflows(&self.pool, tenant.tenant_id).await
    }

    #[instrument(skip_all, fields(tenant_id = %tenant.tenant_id, workflow_id = %id))]
    async fn update(&self, tenant: &TenantContext, id: Uuid, update: WorkflowUpdate) -> Result<WorkflowRow, DbError> {
        let row = repo::update_workflow(&self.pool, tenant.tenant_id, id, &update).await?;
        info!(workflow_id = %row.id, version = row.version, "workflow saved");
        Ok(row)
    }

    #[instrument(skip_all, fields(tenant_id = %tenant.tenant_id, workflow_id = %id))]
    async fn delete(&self, tenant: &TenantContext, id: Uuid) -> Result<(), DbError> {
        repo::delete_workflow(&self.pool, tenant.tenant_id, id).await?;
        info!(workflow_id = %id, "workflow deleted");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// In-memory
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MemoryWorkflowStore {
    rows: RwLock<HashMap<Uuid, WorkflowRow>>,
}

impl MemoryWorkflowStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn name_taken(rows: &HashMap<Uuid, WorkflowRow>, tenant_id: Uuid, name: &str, except: Option<Uuid>) -> bool {
    rows.values()
        .any(|r| r.tenant_id == tenant_id && r.name == name && Some(r.id) != except)
}

#[async_trait]
impl WorkflowStore for MemoryWorkflowStore {
    #[instrument(skip_all, fields(tenant_id = %tenant.tenant_id, name = %new.name))]
    async fn create(&self, tenant: &TenantContext, new: NewWorkflow) -> Result<WorkflowRow, DbError> {
        let mut rows = self.rows.write().await;
        if name_taken(&rows, tenant.tenant_id, &new.name, None) {
            return Err(DbError::DuplicateName(new.name));
        }

        let now = Utc::now();
        let row = WorkflowRow {
            id: Uuid::new_v4(),
            tenant_id: tenant.tenant_id,
            name: new.name,
            description: new.description,
            status: new.status.to_string(),
            steps: new.steps,
            execution_count: 0,
            version: 1,
            created_at: now,
            updated_at: now,
        };
        rows.insert(row.id, row.clone());
        info!(workflow_id = %row.id, "workflow created");
        Ok(row)
    }

    async fn get(&self, tenant: &TenantContext, id: Uuid) -> Result<WorkflowRow, DbError> {
        self.rows
            .read()
            .await
            .get(&id)
            .filter(|r| r.tenant_id == tenant.tenant_id)
            .cloned()
            .ok_or(DbError::NotFound)
    }

    async fn list(&self, tenant: &TenantContext) -> Result<Vec<WorkflowRow>, DbError> {
        let rows = self.rows.read().await;
        let mut owned: Vec<WorkflowRow> = rows
            .values()
            .filter(|r| r.tenant_id == tenant.tenant_id)
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(owned)
    }

    #[instrument(skip_all, fields(tenant_id = %tenant.tenant_id, workflow_id = %id))]
    async fn update(&self, tenant: &TenantContext, id: Uuid, update: WorkflowUpdate) -> Result<WorkflowRow, DbError> {
        let mut rows = self.rows.write().await;

        let current = rows
            .get(&id)
            .filter(|r| r.tenant_id == tenant.tenant_id)
            .ok_or(DbError::NotFound)?;
        if current.version != update.expected_version {
            return Err(DbError::VersionConflict {
                expected: update.expected_version,
                actual: current.version,
            });
        }
        if name_taken(&rows, tenant.tenant_id, &update.name, Some(id)) {
            return Err(DbError::DuplicateName(update.name));
        }

        let row = rows.get_mut(&id).ok_or(DbError::NotFound)?;
        row.name = update.name;
        row.description = update.description;
        row.status = update.status.to_string();
        row.steps = update.steps;
        row.version += 1;
        row.updated_at = Utc::now();
        info!(workflow_id = %row.id, version = row.version, "workflow saved");
        Ok(row.clone())
    }

    #[instrument(skip_all, fields(tenant_id = %tenant.tenant_id, workflow_id = %id))]
    async fn delete(&self, tenant: &TenantContext, id: Uuid) -> Result<(), DbError> {
        let mut rows = self.rows.write().await;
        let owned = rows.get(&id).is_some_and(|r| r.tenant_id == tenant.tenant_id);
        if !owned {
            return Err(DbError::NotFound);
        }
        rows.remove(&id);
        info!(workflow_id = %id, "workflow deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::WorkflowStatus;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    fn tenant() -> TenantContext {
        TenantContext::new(Uuid::new_v4())
    }

    fn new_workflow(name: &str) -> NewWorkflow {
        NewWorkflow {
            name: name.into(),
            description: None,
            status: WorkflowStatus::Draft,
            steps: json!([]),
        }
    }

    #[tokio::test]
    async fn create_starts_at_version_one() {
        let store = MemoryWorkflowStore::new();
        let row = store.create(&tenant(), new_workflow("Lead intake")).await.unwrap();

        assert_eq!(row.version, 1);
        assert_eq!(row.execution_count, 0);
        assert_eq!(row.status, "draft");
    }

    #[tokio::test]
    async fn stale_update_is_rejected_and_row_is_unchanged() {
        let store = MemoryWorkflowStore::new();
        let t = tenant();
        let row = store.create(&t, new_workflow("Billing")).await.unwrap();

        // Two editors read version 1.
        let mut first = WorkflowUpdate::from_row(&row).unwrap();
        let mut second = WorkflowUpdate::from_row(&row).unwrap();
        first.steps = json!([{ "id": "a" }]);
        second.steps = json!([{ "id": "b" }]);

        let saved = store.update(&t, row.id, first).await.unwrap();
        assert_eq!(saved.version, 2);

        let err = store.update(&t, row.id, second).await.unwrap_err();
        assert!(matches!(err, DbError::VersionConflict { expected: 1, actual: 2 }));

        let current = store.get(&t, row.id).await.unwrap();
        assert_eq!(current.steps, json!([{ "id": "a" }]));
        assert_eq!(current.version, 2);
    }

    #[tokio::test]
    async fn rows_are_invisible_to_other_tenants() {
        let store = MemoryWorkflowStore::new();
        let owner = tenant();
        let other = tenant();
        let row = store.create(&owner, new_workflow("Private")).await.unwrap();

        assert!(matches!(store.get(&other, row.id).await, Err(DbError::NotFound)));
        assert!(matches!(store.delete(&other, row.id).await, Err(DbError::NotFound)));
        assert!(store.list(&other).await.unwrap().is_empty());

        // The same name is free in another tenant.
        store.create(&other, new_workflow("Private")).await.unwrap();
    }

    #[tokio::test]
    async fn duplicate_names_are_a_constraint_violation() {
        let store = MemoryWorkflowStore::new();
        let t = tenant();
        store.create(&t, new_workflow("Same")).await.unwrap();

        let err = store.create(&t, new_workflow("Same")).await.unwrap_err();
        assert!(matches!(err, DbError::DuplicateName(name) if name == "Same"));
    }

    #[tokio::test]
    async fn delete_then_get_is_not_found() {
        let store = MemoryWorkflowStore::new();
        let t = tenant();
        let row = store.create(&t, new_workflow("Temp")).await.unwrap();

        store.delete(&t, row.id).await.unwrap();
        assert!(matches!(store.get(&t, row.id).await, Err(DbError::NotFound)));
        assert!(matches!(store.delete(&t, row.id).await, Err(DbError::NotFound)));
    }

    #[tokio::test]
    async fn names_lists_the_tenant_names() {
        let store = MemoryWorkflowStore::new();
        let t = tenant();
        store.create(&t, new_workflow("A")).await.unwrap();
        store.create(&t, new_workflow("B")).await.unwrap();

        let mut names = store.names(&t).await.unwrap();
        names.sort();
        assert_eq!(names, vec!["A", "B"]);
    }

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn writes_are_logged_with_the_tenant() {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let store = MemoryWorkflowStore::new();
        let t = tenant();
        let row = store.create(&t, new_workflow("Audited")).await.unwrap();
        let saved = store
            .update(&t, row.id, WorkflowUpdate::from_row(&row).unwrap())
            .await
            .unwrap();
        store.delete(&t, saved.id).await.unwrap();

        let logs = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert!(logs.contains("workflow created"));
        assert!(logs.contains("workflow saved"));
        assert!(logs.contains("workflow deleted"));
        assert!(logs.contains(&t.tenant_id.to_string()));
    }
}
