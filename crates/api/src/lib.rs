//! `api` crate: HTTP REST API layer.
//!
//! Exposes:
//!   GET    /healthz
//!   GET    /api/v1/workflows
//!   POST   /api/v1/workflows
//!   GET    /api/v1/workflows/{id}
//!   PUT    /api/v1/workflows/{id}
//!   DELETE /api/v1/workflows/{id}
//!   GET    /api/v1/workflows/{id}/canvas
//!   GET    /api/v1/workflows/{id}/export
//!   POST   /api/v1/workflows/import
//!   POST   /api/v1/canvas/generate
//!   GET    /api/v1/chat/{session}/messages
//!   POST   /api/v1/chat/{session}/messages
//!   DELETE /api/v1/chat/{session}/messages
//!   POST   /api/v1/chat/{session}/stop
//!   POST   /api/v1/chat/{session}/retry
//!
//! Every `/api/v1` call except `canvas/generate` needs an `x-tenant-id`
//! header.

pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod tenant;


use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use chat::{history_key, AssistantBackend, ChatSession, ChatState, HistoryStore, SendPolicy};
use db::{TenantContext, WorkflowStore};
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

pub use config::Config;
pub use error::ApiError;

/// Open sessions kept in memory before idle ones are dropped.  A dropped
/// session reopens from its history on next use.
pub const MAX_OPEN_SESSIONS: usize = 1024;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn WorkflowStore>,
    pub assistant: Arc<dyn AssistantBackend>,
    pub history: Arc<dyn HistoryStore>,
    pub policy: SendPolicy,
    /// Open chat sessions keyed by their history key.
    sessions: Arc<Mutex<HashMap<String, Arc<ChatSession>>>>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn WorkflowStore>,
        assistant: Arc<dyn AssistantBackend>,
        history: Arc<dyn HistoryStore>,
        policy: SendPolicy,
    ) -> Self {
        Self {
            store,
            assistant,
            history,
            policy,
            sessions: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// The tenant's session named `session`, opened from history on first use.
    pub async fn chat_session(&self, tenant: &TenantContext, session: &str) -> Arc<ChatSession> {
        let key = history_key(tenant.tenant_id, session);
        let mut sessions = self.sessions.lock().await;
        if !sessions.contains_key(&key) && sessions.len() >= MAX_OPEN_SESSIONS {
            evict_idle(&mut sessions);
        }
        sessions
            .entry(key.clone())
            .or_insert_with(|| {
                Arc::new(ChatSession::open(
                    key,
                    Arc::clone(&self.assistant),
                    Arc::clone(&self.history),
                    self.policy,
                ))
            })
            .clone()
    }

    /// Number of chat sessions currently held in memory.
    pub async fn open_sessions(&self) -> usize {
        self.sessions.lock().await.len()
    }
}

/// Drop every session nobody else holds and that has no request in flight.
fn evict_idle(sessions: &mut HashMap<String, Arc<ChatSession>>) {
    let before = sessions.len();
    sessions.retain(|_, session| Arc::strong_count(session) > 1 || session.state() == ChatState::Sending);
    debug!(evicted = before - sessions.len(), "idle chat sessions evicted");
}

pub fn router(state: AppState) -> Router {
    use handlers::{canvas, chat as chat_routes, transfer, workflows};

    let v1 = Router::new()
        .route("/workflows", get(workflows::list).post(workflows::create))
        .route("/workflows/import", post(transfer::import))
        .route(
            "/workflows/{id}",
            get(workflows::get).put(workflows::update).delete(workflows::delete),
        )
        .route("/workflows/{id}/canvas", get(workflows::canvas))
        .route("/workflows/{id}/export", get(transfer::export))
        .route("/canvas/generate", post(canvas::generate))
        .route(
            "/chat/{session}/messages",
            get(chat_routes::messages).post(chat_routes::send).delete(chat_routes::clear),
        )
        .route("/chat/{session}/stop", post(chat_routes::stop))
        .route("/chat/{session}/retry", post(chat_routes::retry));

    Router::new()
        .route("/healthz", get(health_check))
        .nest("/api/v1", v1)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}

/// Bind `bind` and serve until Ctrl-C.
pub async fn serve(bind: &str, state: AppState) -> std::io::Result<()> {
    let listener = TcpListener::bind(bind).await?;
    info!("HALO API listening on {}", listener.local_addr()?);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("could not install Ctrl-C handler: {}", e);
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
