use axum::{Extension, Json, extract::State};

use tutor_types::api::{QuizHistoryEntry, QuizHistoryResponse, QuizStats};
use tutor_types::models::Quiz;

use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::state::{AppState, with_db};

pub fn stats_for(quizzes: &[Quiz]) -> QuizStats {
    if quizzes.is_empty() {
        return QuizStats::default();
    }
    let total: u32 = quizzes.iter().map(|q| q.score).sum();
    QuizStats {
        total_quizzes: quizzes.len(),
        average_score: f64::from(total) / quizzes.len() as f64,
        best_score: quizzes.iter().map(|q| q.score).max().unwrap_or(0),
        total_completed: quizzes.len(),
    }
}

/// GET /api/quizzes: completed quizzes, newest first, with aggregate stats.
pub async fn quiz_history(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<QuizHistoryResponse>, ApiError> {
    let uid = auth.id.to_string();
    let quizzes = with_db(&state, move |db| {
        db.list_completed_quizzes(&uid)?
            .into_iter()
            .map(|(row, questions)| row.into_model(questions))
            .collect::<anyhow::Result<Vec<_>>>()
    })
    .await?;

    let stats = stats_for(&quizzes);
    let quizzes = quizzes
        .into_iter()
        .map(|quiz| QuizHistoryEntry {
            id: quiz.id,
            score: quiz.score,
            percentage: quiz.percentage(),
            total_questions: quiz.total_questions,
            questions: quiz.questions,
            created_at: quiz.created_at,
            updated_at: quiz.updated_at,
        })
        .collect();

    Ok(Json(QuizHistoryResponse { quizzes, stats }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn quiz(score: u32, total: u32) -> Quiz {
        Quiz {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            questions: vec![],
            score,
            total_questions: total,
            completed: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn stats_are_zero_without_quizzes() {
        let stats = stats_for(&[]);
        assert_eq!(stats.total_quizzes, 0);
        assert_eq!(stats.average_score, 0.0);
        assert_eq!(stats.best_score, 0);
    }

    #[test]
    fn stats_average_and_best() {
        let stats = stats_for(&[quiz(4, 11), quiz(9, 11), quiz(5, 11)]);
        assert_eq!(stats.total_quizzes, 3);
        assert_eq!(stats.total_completed, 3);
        assert_eq!(stats.best_score, 9);
        assert_eq!(stats.average_score, 6.0);
    }
}
