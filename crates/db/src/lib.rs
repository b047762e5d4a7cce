//! `db` crate: pure persistence layer.
//!
//! Provides a connection pool, typed row structs, repository functions for
//! the `workflows` table, and the [`WorkflowStore`] trait the API talks to.
//! No business logic lives here.

pub mod error;
pub mod pool;
pub mod repository;
pub mod models;
pub mod store;

pub use pool::DbPool;
pub use error::DbError;
pub use models::{NewWorkflow, TenantContext, WorkflowRow, WorkflowStatus, WorkflowUpdate};
pub use store::{MemoryWorkflowStore, PgWorkflowStore, WorkflowStore};
