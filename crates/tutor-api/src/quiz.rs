use axum::{Extension, Json, extract::{Path, State, rejection::JsonRejection}};
use tracing::{debug, info};
use uuid::Uuid;

use tutor_llm::{CompletionRequest, PromptMessage, extract, prompts};
use tutor_types::api::{QuizDraft, SubmitQuizRequest};
use tutor_types::models::{Quiz, QuizQuestion, Role};

use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::state::{AppState, with_db};

const NO_CHATS: &str = "Aucun historique de chat trouvé. Commence par discuter avec l'assistant !";
const NO_MESSAGES: &str = "Aucun message trouvé dans l'historique. Commence par discuter avec l'assistant !";

/// POST /api/quiz/generate: build a quiz from the caller's recent chats.
pub async fn generate_quiz(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<Quiz>, ApiError> {
    let llm = state.llm()?;
    let user_id = auth.id.to_string();

    let history = {
        let uid = user_id.clone();
        with_db(&state, move |db| {
            let chats = db.list_chats(&uid, Some(prompts::QUIZ_HISTORY_CHATS))?;
            if chats.is_empty() {
                return Ok(None);
            }
            let ids: Vec<String> = chats.into_iter().map(|c| c.id).collect();
            Ok(Some(db.get_messages_for_chats(&ids)?))
        })
        .await?
    };
    let history = history.ok_or_else(|| ApiError::BadRequest(NO_CHATS.into()))?;
    if history.is_empty() {
        return Err(ApiError::BadRequest(NO_MESSAGES.into()));
    }
    debug!("Generating quiz from {} messages", history.len());

    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(PromptMessage::system(prompts::QUIZ_SYSTEM));
    for row in history {
        messages.push(match Role::parse(&row.role) {
            Some(Role::User) => PromptMessage::user(row.content),
            _ => PromptMessage::assistant(row.content),
        });
    }
    messages.push(PromptMessage::user(prompts::QUIZ_INSTRUCTION));

    let completion = llm
        .complete(CompletionRequest {
            messages,
            temperature: Some(prompts::QUIZ_TEMPERATURE),
        })
        .await?;
    debug!("Raw quiz reply: {}", completion.content);
    let draft: QuizDraft = extract(&completion.content)?;

    let questions: Vec<QuizQuestion> = draft.questions.into_iter().map(Into::into).collect();
    let quiz_id = Uuid::new_v4();
    let now = chrono::Utc::now();
    {
        let (qid, uid, qs) = (quiz_id.to_string(), user_id, questions.clone());
        with_db(&state, move |db| db.create_quiz(&qid, &uid, &qs, now)).await?;
    }
    info!("Created quiz {} with {} questions", quiz_id, questions.len());

    Ok(Json(Quiz {
        id: quiz_id,
        user_id: auth.id,
        total_questions: questions.len() as u32,
        questions,
        score: 0,
        completed: false,
        created_at: now,
        updated_at: now,
    }))
}

/// PATCH /api/quiz/{id}: record the outcome of an attempt.
pub async fn submit_quiz(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(auth): Extension<AuthUser>,
    payload: Result<Json<SubmitQuizRequest>, JsonRejection>,
) -> Result<Json<Quiz>, ApiError> {
    let quiz_id: Uuid = id.parse().map_err(|_| ApiError::NotFound("Quiz not found"))?;
    let Json(req) = payload?;
    let (Some(completed), Some(_), Some(questions)) = (req.completed, req.score, req.questions) else {
        return Err(ApiError::BadRequest("Invalid request body".into()));
    };

    let (qid, uid) = (quiz_id.to_string(), auth.id.to_string());
    let existing = {
        let (qid, uid) = (qid.clone(), uid.clone());
        with_db(&state, move |db| db.get_quiz(&qid, &uid)).await?
    };
    let Some((row, stored)) = existing else {
        return Err(ApiError::NotFound("Quiz not found"));
    };
    if row.completed {
        return Err(ApiError::BadRequest("Quiz already completed".into()));
    }
    // One outcome per stored question keeps score <= total_questions.
    if questions.len() != stored.len() {
        return Err(ApiError::BadRequest(format!(
            "Expected {} answered questions, got {}",
            stored.len(),
            questions.len()
        )));
    }

    // The score is recomputed from the per-question outcomes.
    let score = questions.iter().filter(|q| q.is_correct == Some(true)).count() as u32;
    let total = stored.len() as u32;

    let quiz = with_db(&state, move |db| {
        if !db.complete_quiz(&qid, &uid, completed, score, total, chrono::Utc::now())? {
            return Ok(None);
        }
        match db.get_quiz(&qid, &uid)? {
            Some((row, questions)) => Ok(Some(row.into_model(questions)?)),
            None => Ok(None),
        }
    })
    .await?
    .ok_or_else(|| ApiError::BadRequest("Quiz already completed".into()))?;

    info!("Quiz {} submitted: {}/{}", quiz.id, quiz.score, quiz.total_questions);
    Ok(Json(quiz))
}
