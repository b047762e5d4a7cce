//! Assistant chat, one session per `{session}` path segment and tenant.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use chat::{ChatMessage, ChatState, SendOutcome};
use serde::{Deserialize, Serialize};

use crate::extract::{ApiJson, ApiPath};
use crate::{error::ApiError, tenant::tenant_from_headers, AppState};

#[derive(Debug, Deserialize)]
pub struct SendMessageDto {
    pub content: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptDto {
    pub state: ChatState,
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendResultDto {
    /// The request was stopped or superseded before it was answered.
    pub cancelled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply: Option<ChatMessage>,
    pub state: ChatState,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StopResultDto {
    pub stopped: bool,
    pub state: ChatState,
}

pub async fn messages(
    State(state): State<AppState>,
    ApiPath(session): ApiPath<String>,
    headers: HeaderMap,
) -> Result<Json<TranscriptDto>, ApiError> {
    let tenant = tenant_from_headers(&headers)?;
    let session = state.chat_session(&tenant, &session).await;
    Ok(Json(TranscriptDto {
        state: session.state(),
        messages: session.messages(),
    }))
}

pub async fn send(
    State(state): State<AppState>,
    ApiPath(session): ApiPath<String>,
    headers: HeaderMap,
    ApiJson(payload): ApiJson<SendMessageDto>,
) -> Result<Json<SendResultDto>, ApiError> {
    let tenant = tenant_from_headers(&headers)?;
    let session = state.chat_session(&tenant, &session).await;
    let outcome = session.send(payload.content).await?;
    Ok(Json(send_result(outcome, session.state())))
}

pub async fn retry(
    State(state): State<AppState>,
    ApiPath(session): ApiPath<String>,
    headers: HeaderMap,
) -> Result<Json<SendResultDto>, ApiError> {
    let tenant = tenant_from_headers(&headers)?;
    let session = state.chat_session(&tenant, &session).await;
    let outcome = session.retry().await?;
    Ok(Json(send_result(outcome, session.state())))
}

pub async fn stop(
    State(state): State<AppState>,
    ApiPath(session): ApiPath<String>,
    headers: HeaderMap,
) -> Result<Json<StopResultDto>, ApiError> {
    let tenant = tenant_from_headers(&headers)?;
    let session = state.chat_session(&tenant, &session).await;
    let stopped = session.stop();
    Ok(Json(StopResultDto {
        stopped,
        state: session.state(),
    }))
}

/// Forget the transcript, in memory and in history.
pub async fn clear(
    State(state): State<AppState>,
    ApiPath(session): ApiPath<String>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    let tenant = tenant_from_headers(&headers)?;
    let session = state.chat_session(&tenant, &session).await;
    session.clear()?;
    Ok(StatusCode::NO_CONTENT)
}

fn send_result(outcome: SendOutcome, state: ChatState) -> SendResultDto {
    match outcome {
        SendOutcome::Replied(message) => SendResultDto {
            cancelled: false,
            reply: Some(message),
            state,
        },
        SendOutcome::Cancelled => SendResultDto {
            cancelled: true,
            reply: None,
            state,
        },
    }
}
