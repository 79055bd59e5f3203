use axum::{Extension, Json, extract::{State, rejection::JsonRejection}};
use tracing::{debug, info};
use uuid::Uuid;

use tutor_llm::{CompletionRequest, PromptMessage, extract, prompts};
use tutor_types::api::{AssistantMessage, ChatChoice, ChatReply, ChatTurn, SendChatRequest, SendChatResponse};
use tutor_types::models::Role;

use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::state::{AppState, with_db};

const TITLE_CHARS: usize = 50;

/// Title for a new chat, taken from its opening message.
pub fn chat_title(first: Option<&ChatTurn>) -> String {
    match first.map(|t| t.content.trim()).filter(|c| !c.is_empty()) {
        Some(content) => {
            let head: String = content.chars().take(TITLE_CHARS).collect();
            format!("{head}...")
        }
        None => "New Chat".to_string(),
    }
}

fn prompt_turn(turn: &ChatTurn) -> Result<PromptMessage, ApiError> {
    match turn.role.as_str() {
        "user" => Ok(PromptMessage::user(&turn.content)),
        "assistant" | "bot" => Ok(PromptMessage::assistant(&turn.content)),
        other => Err(ApiError::BadRequest(format!("Unsupported message role '{other}'"))),
    }
}

/// POST /api/chat: send the conversation to the tutor and persist the new turn.
pub async fn send_message(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    payload: Result<Json<SendChatRequest>, JsonRejection>,
) -> Result<Json<SendChatResponse>, ApiError> {
    let Json(req) = payload?;
    let Some(last) = req.messages.last() else {
        return Err(ApiError::BadRequest("Please provide at least one message".into()));
    };
    let user_content = last.content.clone();

    let mut messages = vec![PromptMessage::system(prompts::TUTOR_SYSTEM)];
    for turn in &req.messages {
        messages.push(prompt_turn(turn)?);
    }

    let llm = state.llm()?;
    let user_id = auth.id.to_string();

    // An existing chat must belong to the caller.
    let existing = match req.chat_id.as_deref().filter(|id| !id.is_empty()) {
        Some(raw) => {
            let chat_id: Uuid = raw.parse().map_err(|_| ApiError::NotFound("Chat not found"))?;
            let (cid, uid) = (chat_id.to_string(), user_id.clone());
            with_db(&state, move |db| db.get_chat(&cid, &uid))
                .await?
                .ok_or(ApiError::NotFound("Chat not found"))?;
            Some(chat_id)
        }
        None => None,
    };

    let completion = llm
        .complete(CompletionRequest { messages, temperature: None })
        .await?;
    debug!("Raw tutor reply: {}", completion.content);
    let reply: ChatReply = extract(&completion.content)?;

    let chat_id = existing.unwrap_or_else(Uuid::new_v4);
    let title = existing.is_none().then(|| chat_title(req.messages.first()));
    {
        let reply = reply.clone();
        let cid = chat_id.to_string();
        with_db(&state, move |db| {
            let now = chrono::Utc::now();
            if let Some(title) = title {
                db.create_chat(&cid, &user_id, &title, now)?;
                info!("Created chat {}", cid);
            }
            db.insert_message(&Uuid::new_v4().to_string(), &cid, Role::User, &user_content, None, now)?;
            db.insert_message(
                &Uuid::new_v4().to_string(),
                &cid,
                Role::Bot,
                &reply.quickrep,
                Some(&reply.explication),
                now,
            )?;
            db.touch_chat(&cid, &reply.quickrep, now)
        })
        .await?;
    }

    Ok(Json(SendChatResponse {
        choices: vec![ChatChoice {
            message: AssistantMessage {
                role: "assistant".to_string(),
                content: reply,
            },
            index: 0,
            finish_reason: completion.finish_reason,
        }],
        chat_id,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn turn(content: &str) -> ChatTurn {
        ChatTurn { role: "user".into(), content: content.into() }
    }

    #[test]
    fn title_is_truncated_on_char_boundaries() {
        let long = "é".repeat(80);
        let title = chat_title(Some(&turn(&long)));
        assert_eq!(title.chars().count(), TITLE_CHARS + 3);
        assert!(title.ends_with("..."));

        assert_eq!(chat_title(Some(&turn("Combien font 3 + 4 ?"))), "Combien font 3 + 4 ?...");
    }

    #[test]
    fn blank_opening_message_gets_default_title() {
        assert_eq!(chat_title(Some(&turn("   "))), "New Chat");
        assert_eq!(chat_title(None), "New Chat");
    }

    #[test]
    fn bot_turns_are_sent_as_assistant() {
        let msg = prompt_turn(&ChatTurn { role: "bot".into(), content: "4".into() }).unwrap();
        assert_eq!(msg, PromptMessage::assistant("4"));
        assert!(prompt_turn(&ChatTurn { role: "system".into(), content: "x".into() }).is_err());
    }
}
