// src/models/quiz.rs

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::config::MAX_QUIZ_QUESTIONS;

/// Question kind. Serialized as `"mcq"` / `"written"` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuestionKind {
    #[serde(rename = "mcq")]
    MultipleChoice,
    #[serde(rename = "written")]
    Written,
}

impl QuestionKind {
    /// Case-insensitive; anything other than `written` is multiple choice.
    pub fn from_label(label: &str) -> Self {
        if label.trim().eq_ignore_ascii_case("written") {
            QuestionKind::Written
        } else {
            QuestionKind::MultipleChoice
        }
    }
}

/// One normalized quiz question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizItem {
    pub question: String,

    /// Mapped from the wire field `type` since `type` is a reserved keyword in Rust.
    #[serde(rename = "type")]
    pub kind: QuestionKind,

    /// Answer choices. Only meaningful for multiple choice; may be empty otherwise.
    pub options: Vec<String>,

    pub answer: String,
}

/// Ordered quiz; may be shorter than requested.
pub type Quiz = Vec<QuizItem>;

/// Body of `POST /api/make_quiz`. `num` is capped at `config::MAX_QUIZ_QUESTIONS`.
#[derive(Debug, Deserialize, Validate)]
pub struct MakeQuizRequest {
    #[validate(length(min = 1, message = "summary must not be empty"))]
    pub summary: String,
    #[serde(default)]
    pub difficulty: String,
    #[validate(range(min = 1, max = MAX_QUIZ_QUESTIONS, message = "num is out of range"))]
    pub num: usize,
}

/// A validated quiz generation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizRequest {
    pub source_text: String,
    /// Lower-cased difficulty label.
    pub difficulty: String,
    pub question_count: usize,
}

impl QuizRequest {
    pub fn new(source_text: impl Into<String>, difficulty: &str, question_count: usize) -> Self {
        Self {
            source_text: source_text.into(),
            difficulty: difficulty.trim().to_lowercase(),
            question_count,
        }
    }
}

impl From<MakeQuizRequest> for QuizRequest {
    fn from(req: MakeQuizRequest) -> Self {
        QuizRequest::new(req.summary, &req.difficulty, req.num)
    }
}
