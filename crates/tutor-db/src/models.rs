//! Database row types. These map directly to SQLite rows and are converted
//! into `tutor-types` models at the edge of this crate.

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, SecondsFormat, Utc};
use uuid::Uuid;

use tutor_types::models::{Chat, Message, Quiz, QuizQuestion, Role, User};

pub struct UserRow {
    pub id: String,
    pub email: String,
    pub password: String,
    pub name: String,
    pub created_at: String,
}

pub struct ChatRow {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub last_message: String,
    pub created_at: String,
    pub updated_at: String,
}

pub struct MessageRow {
    pub id: String,
    pub chat_id: String,
    pub role: String,
    pub content: String,
    pub explanation: Option<String>,
    pub created_at: String,
}

pub struct QuizRow {
    pub id: String,
    pub user_id: String,
    pub score: i64,
    pub total_questions: i64,
    pub completed: bool,
    pub created_at: String,
    pub updated_at: String,
}

pub struct QuizQuestionRow {
    pub quiz_id: String,
    pub position: i64,
    pub question: String,
    pub answer: String,
    pub explanation: String,
    pub from_chat_id: Option<String>,
    pub is_user_question: bool,
}

/// Format used for every stored timestamp. Lexicographic order matches time order.
pub fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_time(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .with_context(|| format!("corrupt timestamp '{}'", raw))
}

fn parse_id(raw: &str) -> Result<Uuid> {
    raw.parse().with_context(|| format!("corrupt id '{}'", raw))
}

impl UserRow {
    pub fn into_model(self) -> Result<User> {
        Ok(User {
            id: parse_id(&self.id)?,
            email: self.email,
            name: self.name,
            created_at: parse_time(&self.created_at)?,
        })
    }
}

impl ChatRow {
    pub fn into_model(self) -> Result<Chat> {
        Ok(Chat {
            id: parse_id(&self.id)?,
            title: self.title,
            last_message: self.last_message,
            created_at: parse_time(&self.created_at)?,
            updated_at: parse_time(&self.updated_at)?,
        })
    }
}

impl MessageRow {
    pub fn into_model(self) -> Result<Message> {
        let role = Role::parse(&self.role)
            .ok_or_else(|| anyhow!("corrupt role '{}' on message '{}'", self.role, self.id))?;
        Ok(Message {
            id: parse_id(&self.id)?,
            role,
            content: self.content,
            explanation: self.explanation,
            created_at: parse_time(&self.created_at)?,
        })
    }
}

impl QuizQuestionRow {
    pub fn into_model(self) -> Result<QuizQuestion> {
        Ok(QuizQuestion {
            question: self.question,
            answer: self.answer,
            explanation: self.explanation,
            from_chat_id: self.from_chat_id.as_deref().map(parse_id).transpose()?,
            is_user_question: self.is_user_question,
        })
    }
}

impl QuizRow {
    pub fn into_model(self, questions: Vec<QuizQuestionRow>) -> Result<Quiz> {
        let questions = questions
            .into_iter()
            .map(QuizQuestionRow::into_model)
            .collect::<Result<Vec<_>>>()?;
        Ok(Quiz {
            id: parse_id(&self.id)?,
            user_id: parse_id(&self.user_id)?,
            questions,
            score: u32::try_from(self.score).context("negative quiz score")?,
            total_questions: u32::try_from(self.total_questions)
                .context("negative question count")?,
            completed: self.completed,
            created_at: parse_time(&self.created_at)?,
            updated_at: parse_time(&self.updated_at)?,
        })
    }
}
