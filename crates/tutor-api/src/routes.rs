use axum::{
    Json, Router, middleware,
    routing::{get, patch, post},
};
use serde_json::{Value, json};

use crate::middleware::require_auth;
use crate::state::AppState;
use crate::{auth, chat, chats, quiz, quizzes};

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// All API routes with state attached. Transport layers (CORS, tracing) are
/// added by the binary.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::<AppState>::new()
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/health", get(health));

    let protected_routes = Router::<AppState>::new()
        .route("/api/auth/me", get(auth::me))
        .route("/api/chat", post(chat::send_message))
        .route("/api/chats", get(chats::list_chats))
        .route("/api/chats/{id}", get(chats::get_messages).delete(chats::delete_chat))
        .route("/api/chats/{id}/messages", get(chats::get_messages))
        .route("/api/chats/{id}/details", get(chats::get_details))
        .route("/api/quiz/generate", post(quiz::generate_quiz))
        .route("/api/quiz/{id}", patch(quiz::submit_quiz))
        .route("/api/quizzes", get(quizzes::quiz_history))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}
