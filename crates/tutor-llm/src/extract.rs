//! Recover a JSON record from raw model output.
//!
//! Models are asked for bare JSON but often wrap it in a ```` ```json ```` fence,
//! add commentary around it, or over-escape `*` and `?`. Extraction runs four
//! steps: locate the JSON slice, sanitize escapes, parse with an ordered list
//! of [`ParseStrategy`] values, then validate against a [`ReplySchema`].

use std::sync::LazyLock;

use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::debug;

use tutor_types::api::{ChatReply, QuizDraft};

static FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```json(.*?)```").expect("fence pattern"));
static ESCAPED_SYMBOL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\\([*?])").expect("escape pattern"));
static GREEDY_OBJECT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{.*\}").expect("greedy pattern"));
static NESTED_OBJECT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{(?:[^{}]|\{[^{}]*\})*\}").expect("nested pattern"));

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtractError {
    #[error("no JSON object found in model output")]
    NoJson,

    #[error("model output is not valid JSON: {0}")]
    Parse(String),

    #[error("model output does not match the expected shape: {0}")]
    Schema(String),
}

/// A record shape the extractor can validate and decode.
pub trait ReplySchema: DeserializeOwned {
    /// Check required fields on the raw JSON value. The message names the
    /// offending field.
    fn validate(value: &Value) -> Result<(), String>;
}

impl ReplySchema for ChatReply {
    fn validate(value: &Value) -> Result<(), String> {
        let obj = as_object(value, "reply")?;
        require_text(obj, "quickrep", "reply")?;
        require_text(obj, "explication", "reply")?;
        Ok(())
    }
}

impl ReplySchema for QuizDraft {
    fn validate(value: &Value) -> Result<(), String> {
        let obj = as_object(value, "quiz")?;
        let questions = obj
            .get("questions")
            .and_then(Value::as_array)
            .ok_or_else(|| "quiz: `questions` must be an array".to_string())?;
        if questions.is_empty() {
            return Err("quiz: `questions` is empty".to_string());
        }
        for (i, q) in questions.iter().enumerate() {
            let ctx = format!("questions[{i}]");
            let q = as_object(q, &ctx)?;
            require_text(q, "question", &ctx)?;
            require_text(q, "answer", &ctx)?;
            require_text(q, "explanation", &ctx)?;
        }
        Ok(())
    }
}

fn as_object<'a>(value: &'a Value, ctx: &str) -> Result<&'a Map<String, Value>, String> {
    value
        .as_object()
        .ok_or_else(|| format!("{ctx}: expected a JSON object"))
}

fn require_text(obj: &Map<String, Value>, field: &str, ctx: &str) -> Result<(), String> {
    match obj.get(field) {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(()),
        Some(Value::String(_)) => Err(format!("{ctx}: `{field}` is empty")),
        Some(_) => Err(format!("{ctx}: `{field}` must be a string")),
        None => Err(format!("{ctx}: `{field}` is missing")),
    }
}

/// Step 1: the interior of a ```` ```json ```` fence, else the span from the
/// first `{` to the last `}` inclusive. A fence without an object inside
/// does not count.
pub fn locate(raw: &str) -> Option<&str> {
    let fenced = FENCE
        .captures(raw)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim())
        .filter(|inner| brace_span(inner).is_some());
    fenced.or_else(|| brace_span(raw))
}

fn brace_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Step 2: drop backslashes in front of `*` and `?`, then collapse `\\` to `\`.
pub fn sanitize(slice: &str) -> String {
    ESCAPED_SYMBOL.replace_all(slice, "$1").replace(r"\\", r"\")
}

/// Candidate selection for step 3, tried in [`ParseStrategy::ORDER`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseStrategy {
    /// The whole sanitized slice.
    Strict,
    /// First `{` to last `}`.
    Greedy,
    /// First object with at most one level of nested braces.
    Nested,
}

impl ParseStrategy {
    pub const ORDER: [ParseStrategy; 3] = [Self::Strict, Self::Greedy, Self::Nested];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::Greedy => "greedy",
            Self::Nested => "nested",
        }
    }

    pub fn candidate<'a>(&self, text: &'a str) -> Option<&'a str> {
        match self {
            Self::Strict => Some(text.trim()),
            Self::Greedy => GREEDY_OBJECT.find(text).map(|m| m.as_str()),
            Self::Nested => NESTED_OBJECT.find(text).map(|m| m.as_str()),
        }
    }

    pub fn parse(&self, text: &str) -> Result<Value, String> {
        let candidate = self
            .candidate(text)
            .ok_or_else(|| format!("{} strategy found no candidate", self.name()))?;
        serde_json::from_str(candidate).map_err(|e| e.to_string())
    }
}

/// Step 3: the first strategy whose candidate parses wins.
pub fn parse(text: &str) -> Result<Value, ExtractError> {
    let mut last_error = String::from("no strategy attempted");
    for strategy in ParseStrategy::ORDER {
        match strategy.parse(text) {
            Ok(value) => {
                debug!("Parsed model output with {} strategy", strategy.name());
                return Ok(value);
            }
            Err(e) => last_error = e,
        }
    }
    Err(ExtractError::Parse(last_error))
}

/// Run all four steps and decode into `T`.
pub fn extract<T: ReplySchema>(raw: &str) -> Result<T, ExtractError> {
    let slice = locate(raw).ok_or(ExtractError::NoJson)?;
    let sanitized = sanitize(slice);
    let value = parse(&sanitized)?;
    T::validate(&value).map_err(ExtractError::Schema)?;
    serde_json::from_value(value).map_err(|e| ExtractError::Schema(e.to_string()))
}
