// src/models/assistant.rs

use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct TranslateRequest {
    pub text: String,
    /// Target language. Empty means nothing to translate.
    #[serde(default)]
    pub lang: String,
}

#[derive(Debug, Serialize)]
pub struct TranslateResponse {
    pub translated: String,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub question: String,
    /// The summary the answer must be grounded in.
    #[serde(default)]
    pub context: String,
}

/// Shared by `/chat` and `/chat-image`.
#[derive(Debug, Serialize)]
pub struct AnswerResponse {
    pub answer: String,
}

#[derive(Debug, Deserialize)]
pub struct DefineRequest {
    pub term: String,
}

#[derive(Debug, Serialize)]
pub struct DefineResponse {
    pub definition: String,
}
