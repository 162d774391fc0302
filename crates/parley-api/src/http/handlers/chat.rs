//! Chat HTTP handlers.
//!
//! Every endpoint is scoped to the authenticated user; chats owned by
//! someone else answer exactly like chats that do not exist.

use std::time::Instant;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::Deserialize;

use parley_types::chat::{Chat, Exchange, Message};

use crate::http::error::AppError;
use crate::http::extractors::auth::CurrentUser;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// Request body carrying one user message.
#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub content: String,
}

/// Request body for renaming a chat.
#[derive(Debug, Deserialize)]
pub struct RenameChatRequest {
    pub title: String,
}

/// GET /api/chats
pub async fn list_chats(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<ApiResponse<Vec<Chat>>>, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    let chats = state.chats.list_chats(user.id).await?;

    let elapsed = start.elapsed().as_millis() as u64;
    Ok(Json(
        ApiResponse::success(chats, request_id, elapsed).with_link("self", "/api/chats"),
    ))
}

/// POST /api/chats/messages
pub async fn create_chat(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<SendMessageRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Exchange>>), AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    let exchange = state
        .chats
        .create_chat_with_first_message(user.id, &req.content)
        .await?;

    let elapsed = start.elapsed().as_millis() as u64;
    let messages = format!("/api/chats/{}/messages", exchange.chat.id);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(exchange, request_id, elapsed).with_link("messages", &messages)),
    ))
}

/// POST /api/chats/{id}/messages
pub async fn append_message(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(chat_id): Path<i64>,
    Json(req): Json<SendMessageRequest>,
) -> Result<Json<ApiResponse<Exchange>>, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    let exchange = state
        .chats
        .append_message(chat_id, user.id, &req.content)
        .await?;

    let elapsed = start.elapsed().as_millis() as u64;
    Ok(Json(ApiResponse::success(exchange, request_id, elapsed)))
}

/// GET /api/chats/{id}/messages
pub async fn chat_messages(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(chat_id): Path<i64>,
) -> Result<Json<ApiResponse<Vec<Message>>>, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    let messages = state.chats.chat_messages(chat_id, user.id).await?;

    let elapsed = start.elapsed().as_millis() as u64;
    let link = format!("/api/chats/{chat_id}/messages");
    Ok(Json(
        ApiResponse::success(messages, request_id, elapsed).with_link("self", &link),
    ))
}

/// PATCH /api/chats/{id}
pub async fn rename_chat(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(chat_id): Path<i64>,
    Json(req): Json<RenameChatRequest>,
) -> Result<Json<ApiResponse<Chat>>, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    let chat = state.chats.rename_chat(chat_id, user.id, &req.title).await?;

    let elapsed = start.elapsed().as_millis() as u64;
    Ok(Json(ApiResponse::success(chat, request_id, elapsed)))
}

/// DELETE /api/chats/{id}
pub async fn delete_chat(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(chat_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    state.chats.delete_chat(chat_id, user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}
