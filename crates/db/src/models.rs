//! Row structs that map 1-to-1 onto database tables, plus the write
//! payloads the store accepts.
//!
//! These are *persistence* models and carry no domain behaviour.
//! Canvas types live in the `graph` crate; `steps` is kept as raw JSON here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::DbError;

// ---------------------------------------------------------------------------
// Tenant scope
// ---------------------------------------------------------------------------

/// Who is calling.  Every store operation is scoped to `tenant_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantContext {
    pub tenant_id: Uuid,
    /// Shown as `exportedBy` in export files.
    pub user_email: Option<String>,
}

impl TenantContext {
    pub fn new(tenant_id: Uuid) -> Self {
        Self { tenant_id, user_email: None }
    }

    pub fn with_user(mut self, email: impl Into<String>) -> Self {
        self.user_email = Some(email.into());
        self
    }
}

// ---------------------------------------------------------------------------
// workflows
// ---------------------------------------------------------------------------

/// Lifecycle status of an automation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    #[default]
    Draft,
    Active,
    Paused,
}

impl std::fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Draft  => write!(f, "draft"),
            Self::Active => write!(f, "active"),
            Self::Paused => write!(f, "paused"),
        }
    }
}

impl std::str::FromStr for WorkflowStatus {
    type Err = DbError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft"  => Ok(Self::Draft),
            "active" => Ok(Self::Active),
            "paused" => Ok(Self::Paused),
            other    => Err(DbError::InvalidStatus(other.to_owned())),
        }
    }
}

/// A persisted workflow row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct WorkflowRow {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    /// `draft`, `active` or `paused`.
    pub status: String,
    /// JSON array of steps (see `graph::Step`).
    pub steps: serde_json::Value,
    pub execution_count: i64,
    /// Optimistic concurrency counter; starts at 1.
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WorkflowRow {
    pub fn status(&self) -> Result<WorkflowStatus, DbError> {
        self.status.parse()
    }
}

/// Insert payload.
#[derive(Debug, Clone, PartialEq)]
pub struct NewWorkflow {
    pub name: String,
    pub description: Option<String>,
    pub status: WorkflowStatus,
    pub steps: serde_json::Value,
}

/// Full replacement of the mutable columns, guarded by `expected_version`.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowUpdate {
    pub name: String,
    pub description: Option<String>,
    pub status: WorkflowStatus,
    pub steps: serde_json::Value,
    pub expected_version: i64,
}

impl WorkflowUpdate {
    /// Start from the row as read, to change only some columns.
    pub fn from_row(row: &WorkflowRow) -> Result<Self, DbError> {
        Ok(Self {
            name: row.name.clone(),
            description: row.description.clone(),
            status: row.status()?,
            steps: row.steps.clone(),
            expected_version: row.version,
        })
    }
}
