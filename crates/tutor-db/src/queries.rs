use crate::Database;
use crate::models::{ChatRow, MessageRow, QuizQuestionRow, QuizRow, UserRow, timestamp};
use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, ErrorCode, Row};

use tutor_types::models::{QuizQuestion, Role};

const USER_COLUMNS: &str = "id, email, password, name, created_at";
const CHAT_COLUMNS: &str = "id, user_id, title, last_message, created_at, updated_at";
const MESSAGE_COLUMNS: &str = "id, chat_id, role, content, explanation, created_at";
const QUIZ_COLUMNS: &str = "id, user_id, score, total_questions, completed, created_at, updated_at";

impl Database {
    // -- Users --

    pub fn create_user(
        &self,
        id: &str,
        email: &str,
        password_hash: &str,
        name: &str,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        // false when the email is already taken
        self.with_conn(|conn| {
            match conn.execute(
                "INSERT INTO users (id, email, password, name, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
                (id, email, password_hash, name, timestamp(now)),
            ) {
                Ok(_) => Ok(true),
                Err(rusqlite::Error::SqliteFailure(e, _)) if e.code == ErrorCode::ConstraintViolation => {
                    Ok(false)
                }
                Err(e) => Err(e.into()),
            }
        })
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1");
            conn.query_row(&sql, [email], user_row).optional()
        })
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1");
            conn.query_row(&sql, [id], user_row).optional()
        })
    }

    // -- Chats --

    pub fn create_chat(&self, id: &str, user_id: &str, title: &str, now: DateTime<Utc>) -> Result<()> {
        let now = timestamp(now);
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO chats (id, user_id, title, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?4)",
                (id, user_id, title, &now),
            )?;
            Ok(())
        })
    }

    /// Fetch a chat only if it belongs to `user_id`.
    pub fn get_chat(&self, id: &str, user_id: &str) -> Result<Option<ChatRow>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {CHAT_COLUMNS} FROM chats WHERE id = ?1 AND user_id = ?2");
            conn.query_row(&sql, [id, user_id], chat_row).optional()
        })
    }

    /// Most recently updated first. `limit` of `None` returns every chat.
    pub fn list_chats(&self, user_id: &str, limit: Option<u32>) -> Result<Vec<ChatRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {CHAT_COLUMNS} FROM chats WHERE user_id = ?1
                 ORDER BY updated_at DESC, rowid DESC
                 LIMIT ?2"
            );
            let limit = limit.map(i64::from).unwrap_or(-1);
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(rusqlite::params![user_id, limit], chat_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Record the latest message summary on a chat.
    pub fn touch_chat(&self, id: &str, last_message: &str, now: DateTime<Utc>) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE chats SET last_message = ?2, updated_at = ?3 WHERE id = ?1",
                (id, last_message, timestamp(now)),
            )?;
            Ok(())
        })
    }

    /// Delete a chat owned by `user_id` along with all of its messages.
    /// Returns false when no such chat exists for that user.
    pub fn delete_chat(&self, id: &str, user_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let tx = conn.unchecked_transaction()?;
            let deleted = tx.execute(
                "DELETE FROM chats WHERE id = ?1 AND user_id = ?2",
                [id, user_id],
            )?;
            if deleted > 0 {
                // Covered by ON DELETE CASCADE, kept explicit for databases
                // opened without foreign key enforcement.
                tx.execute("DELETE FROM messages WHERE chat_id = ?1", [id])?;
            }
            tx.commit()?;
            Ok(deleted > 0)
        })
    }

    // -- Messages --

    pub fn insert_message(
        &self,
        id: &str,
        chat_id: &str,
        role: Role,
        content: &str,
        explanation: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO messages (id, chat_id, role, content, explanation, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![id, chat_id, role.as_str(), content, explanation, timestamp(now)],
            )?;
            Ok(())
        })
    }

    /// Messages of one chat, oldest first.
    pub fn get_messages(&self, chat_id: &str) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {MESSAGE_COLUMNS} FROM messages WHERE chat_id = ?1
                 ORDER BY created_at ASC, rowid ASC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([chat_id], message_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Batch-fetch messages across several chats, newest first.
    pub fn get_messages_for_chats(&self, chat_ids: &[String]) -> Result<Vec<MessageRow>> {
        if chat_ids.is_empty() {
            return Ok(vec![]);
        }

        self.with_conn(|conn| {
            let placeholders: Vec<String> = (1..=chat_ids.len()).map(|i| format!("?{}", i)).collect();
            let sql = format!(
                "SELECT {MESSAGE_COLUMNS} FROM messages WHERE chat_id IN ({})
                 ORDER BY created_at DESC, rowid DESC",
                placeholders.join(", ")
            );

            let mut stmt = conn.prepare(&sql)?;
            let params: Vec<&dyn rusqlite::types::ToSql> = chat_ids
                .iter()
                .map(|id| id as &dyn rusqlite::types::ToSql)
                .collect();

            let rows = stmt
                .query_map(params.as_slice(), message_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    // -- Quizzes --

    /// Insert a new, not yet completed quiz with its questions in order.
    pub fn create_quiz(
        &self,
        id: &str,
        user_id: &str,
        questions: &[QuizQuestion],
        now: DateTime<Utc>,
    ) -> Result<()> {
        let now = timestamp(now);
        self.with_conn(|conn| {
            let tx = conn.unchecked_transaction()?;
            tx.execute(
                "INSERT INTO quizzes (id, user_id, total_questions, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?4)",
                rusqlite::params![id, user_id, questions.len() as i64, &now],
            )?;
            {
                let mut stmt = tx.prepare(
                    "INSERT INTO quiz_questions (quiz_id, position, question, answer, explanation, from_chat_id, is_user_question)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                )?;
                for (position, q) in questions.iter().enumerate() {
                    stmt.execute(rusqlite::params![
                        id,
                        position as i64,
                        &q.question,
                        &q.answer,
                        &q.explanation,
                        q.from_chat_id.map(|c| c.to_string()),
                        q.is_user_question,
                    ])?;
                }
            }
            tx.commit()?;
            Ok(())
        })
    }

    /// Fetch a quiz and its questions only if it belongs to `user_id`.
    pub fn get_quiz(&self, id: &str, user_id: &str) -> Result<Option<(QuizRow, Vec<QuizQuestionRow>)>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {QUIZ_COLUMNS} FROM quizzes WHERE id = ?1 AND user_id = ?2");
            let Some(quiz) = conn.query_row(&sql, [id, user_id], quiz_row).optional()? else {
                return Ok(None);
            };
            let questions = query_questions(conn, &quiz.id)?;
            Ok(Some((quiz, questions)))
        })
    }

    /// Record the outcome of an attempt. Only a quiz that is not yet completed
    /// is updated; returns whether a row changed.
    pub fn complete_quiz(
        &self,
        id: &str,
        user_id: &str,
        completed: bool,
        score: u32,
        total_questions: u32,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE quizzes SET completed = ?3, score = ?4, total_questions = ?5, updated_at = ?6
                 WHERE id = ?1 AND user_id = ?2 AND completed = 0",
                rusqlite::params![id, user_id, completed, score, total_questions, timestamp(now)],
            )?;
            Ok(changed > 0)
        })
    }

    /// Completed quizzes of a user, newest first, each with its questions.
    pub fn list_completed_quizzes(&self, user_id: &str) -> Result<Vec<(QuizRow, Vec<QuizQuestionRow>)>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {QUIZ_COLUMNS} FROM quizzes WHERE user_id = ?1 AND completed = 1
                 ORDER BY created_at DESC, rowid DESC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let quizzes = stmt
                .query_map([user_id], quiz_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            quizzes
                .into_iter()
                .map(|quiz| {
                    let questions = query_questions(conn, &quiz.id)?;
                    Ok((quiz, questions))
                })
                .collect()
        })
    }
}

fn query_questions(conn: &Connection, quiz_id: &str) -> Result<Vec<QuizQuestionRow>> {
    let mut stmt = conn.prepare(
        "SELECT quiz_id, position, question, answer, explanation, from_chat_id, is_user_question
         FROM quiz_questions WHERE quiz_id = ?1 ORDER BY position ASC",
    )?;
    let rows = stmt
        .query_map([quiz_id], |row| {
            Ok(QuizQuestionRow {
                quiz_id: row.get(0)?,
                position: row.get(1)?,
                question: row.get(2)?,
                answer: row.get(3)?,
                explanation: row.get(4)?,
                from_chat_id: row.get(5)?,
                is_user_question: row.get(6)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn user_row(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        email: row.get(1)?,
        password: row.get(2)?,
        name: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn chat_row(row: &Row<'_>) -> rusqlite::Result<ChatRow> {
    Ok(ChatRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        title: row.get(2)?,
        last_message: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

fn message_row(row: &Row<'_>) -> rusqlite::Result<MessageRow> {
    Ok(MessageRow {
        id: row.get(0)?,
        chat_id: row.get(1)?,
        role: row.get(2)?,
        content: row.get(3)?,
        explanation: row.get(4)?,
        created_at: row.get(5)?,
    })
}

fn quiz_row(row: &Row<'_>) -> rusqlite::Result<QuizRow> {
    Ok(QuizRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        score: row.get(2)?,
        total_questions: row.get(3)?,
        completed: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
