use axum::{Extension, Json, extract::{Path, State}};
use tracing::info;
use uuid::Uuid;

use tutor_types::api::{ChatDetailsResponse, ChatListResponse, ChatMessagesResponse, DeleteResponse};
use tutor_types::models::Chat;

use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::state::{AppState, with_db};

/// Path ids that are not UUIDs cannot name a stored chat.
fn chat_id(raw: &str) -> Result<String, ApiError> {
    raw.parse::<Uuid>()
        .map(|id| id.to_string())
        .map_err(|_| ApiError::NotFound("Chat not found"))
}

pub async fn list_chats(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<ChatListResponse>, ApiError> {
    let uid = auth.id.to_string();
    let chats = with_db(&state, move |db| {
        db.list_chats(&uid, None)?
            .into_iter()
            .map(|row| row.into_model())
            .collect::<anyhow::Result<Vec<Chat>>>()
    })
    .await?;

    Ok(Json(ChatListResponse { chats }))
}

/// GET /api/chats/{id} and /api/chats/{id}/messages
pub async fn get_messages(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<ChatMessagesResponse>, ApiError> {
    let cid = chat_id(&id)?;
    let uid = auth.id.to_string();

    let found = with_db(&state, move |db| {
        let Some(chat) = db.get_chat(&cid, &uid)? else {
            return Ok(None);
        };
        let messages = db
            .get_messages(&cid)?
            .into_iter()
            .map(|row| row.into_model())
            .collect::<anyhow::Result<Vec<_>>>()?;
        Ok(Some((chat.into_model()?, messages)))
    })
    .await?;

    let (chat, messages) = found.ok_or(ApiError::NotFound("Chat not found"))?;
    Ok(Json(ChatMessagesResponse { messages, chat }))
}

pub async fn get_details(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<ChatDetailsResponse>, ApiError> {
    let cid = chat_id(&id)?;
    let uid = auth.id.to_string();

    let chat = with_db(&state, move |db| db.get_chat(&cid, &uid))
        .await?
        .ok_or(ApiError::NotFound("Chat not found"))?
        .into_model()?;

    Ok(Json(ChatDetailsResponse { chat }))
}

pub async fn delete_chat(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let cid = chat_id(&id)?;
    let uid = auth.id.to_string();

    let deleted = {
        let cid = cid.clone();
        with_db(&state, move |db| db.delete_chat(&cid, &uid)).await?
    };
    if !deleted {
        return Err(ApiError::NotFound("Chat not found"));
    }

    info!("Deleted chat {}", cid);
    Ok(Json(DeleteResponse { success: true }))
}
