use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Author of a stored chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Bot,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Bot => "bot",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "user" => Some(Self::User),
            "bot" => Some(Self::Bot),
            _ => None,
        }
    }
}

/// Public view of a user. The password hash never leaves the db layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chat {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub title: String,
    pub last_message: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub role: Role,
    pub content: String,
    pub explanation: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
    pub question: String,
    pub answer: String,
    pub explanation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_chat_id: Option<Uuid>,
    #[serde(default)]
    pub is_user_question: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quiz {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub user_id: Uuid,
    pub questions: Vec<QuizQuestion>,
    pub score: u32,
    pub total_questions: u32,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Quiz {
    /// Score as a percentage of the recorded question count.
    pub fn percentage(&self) -> f64 {
        if self.total_questions == 0 {
            return 0.0;
        }
        f64::from(self.score) / f64::from(self.total_questions) * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiz_serializes_with_frontend_field_names() {
        let now = Utc::now();
        let quiz = Quiz {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            questions: vec![QuizQuestion {
                question: "Combien font 2 + 2 ?".into(),
                answer: "4".into(),
                explanation: "On compte 2, puis 3, 4.".into(),
                from_chat_id: None,
                is_user_question: false,
            }],
            score: 1,
            total_questions: 1,
            completed: true,
            created_at: now,
            updated_at: now,
        };

        let json = serde_json::to_value(&quiz).unwrap();
        assert!(json.get("_id").is_some());
        assert_eq!(json["totalQuestions"], 1);
        assert_eq!(json["questions"][0]["isUserQuestion"], false);
        assert!(json["questions"][0].get("fromChatId").is_none());
    }

    #[test]
    fn percentage_handles_empty_quiz() {
        let now = Utc::now();
        let mut quiz = Quiz {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            questions: vec![],
            score: 0,
            total_questions: 0,
            completed: true,
            created_at: now,
            updated_at: now,
        };
        assert_eq!(quiz.percentage(), 0.0);

        quiz.score = 3;
        quiz.total_questions = 4;
        assert_eq!(quiz.percentage(), 75.0);
    }

    #[test]
    fn role_round_trips_through_str() {
        assert_eq!(Role::parse(Role::Bot.as_str()), Some(Role::Bot));
        assert_eq!(Role::parse("assistant"), None);
    }
}
