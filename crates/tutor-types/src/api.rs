use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Chat, Message, QuizQuestion, User};

// -- JWT Claims --

/// Bearer token claims, issued at register/login and checked by the auth gate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub exp: usize,
}

// -- Auth --

// Fields are optional so a missing one is reported as a 400 by the handler
// instead of a deserialization rejection.
#[derive(Debug, Default, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSummary {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub email: String,
    pub name: String,
}

impl From<User> for UserSummary {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub user: UserSummary,
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MeResponse {
    pub user: User,
}

// -- Chat --

/// One turn of conversation as sent by the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendChatRequest {
    #[serde(default)]
    pub messages: Vec<ChatTurn>,
    #[serde(default)]
    pub chat_id: Option<String>,
}

/// Structured tutor answer recovered from the model output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    pub quickrep: String,
    pub explication: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AssistantMessage {
    pub role: String,
    pub content: ChatReply,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatChoice {
    pub message: AssistantMessage,
    pub index: u32,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendChatResponse {
    pub choices: Vec<ChatChoice>,
    pub chat_id: Uuid,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatListResponse {
    pub chats: Vec<Chat>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatMessagesResponse {
    pub messages: Vec<Message>,
    pub chat: Chat,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatDetailsResponse {
    pub chat: Chat,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub success: bool,
}

// -- Quiz --

/// Question list recovered from the quiz-generation model output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizDraft {
    pub questions: Vec<DraftQuestion>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftQuestion {
    pub question: String,
    pub answer: String,
    pub explanation: String,
}

impl From<DraftQuestion> for QuizQuestion {
    fn from(q: DraftQuestion) -> Self {
        Self {
            question: q.question,
            answer: q.answer,
            explanation: q.explanation,
            from_chat_id: None,
            is_user_question: false,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SubmitQuizRequest {
    #[serde(default)]
    pub completed: Option<bool>,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub questions: Option<Vec<SubmittedQuestion>>,
}

/// A question as echoed back by the client after answering.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedQuestion {
    #[serde(default)]
    pub is_correct: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizHistoryEntry {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub score: u32,
    pub questions: Vec<QuizQuestion>,
    pub total_questions: u32,
    pub percentage: f64,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizStats {
    pub total_quizzes: usize,
    pub average_score: f64,
    pub best_score: u32,
    pub total_completed: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct QuizHistoryResponse {
    pub quizzes: Vec<QuizHistoryEntry>,
    pub stats: QuizStats,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}
