//! HTTP error type and its status mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chat::ChatError;
use db::DbError;
use graph::TransferError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("missing or invalid x-tenant-id header")]
    MissingTenant,

    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Db(#[from] DbError),

    #[error("invalid import file: {0}")]
    Transfer(#[from] TransferError),

    #[error(transparent)]
    Chat(#[from] ChatError),

    #[error("encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingTenant | Self::BadRequest(_) | Self::Transfer(_) => StatusCode::BAD_REQUEST,
            Self::Db(err) => match err {
                DbError::NotFound => StatusCode::NOT_FOUND,
                DbError::VersionConflict { .. } | DbError::DuplicateName(_) => StatusCode::CONFLICT,
                DbError::InvalidStatus(_) => StatusCode::BAD_REQUEST,
                DbError::Sqlx(_) | DbError::Migration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Chat(err) => match err {
                ChatError::Busy => StatusCode::CONFLICT,
                ChatError::EmptyMessage | ChatError::NothingToRetry => StatusCode::BAD_REQUEST,
                ChatError::Backend(_) => StatusCode::BAD_GATEWAY,
                ChatError::Store(_) | ChatError::Encoding(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Encoding(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "request rejected");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
