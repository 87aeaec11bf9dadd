// src/handlers/assistant.rs
//
// Single-shot prompt-and-return endpoints.

use std::sync::Arc;

use axum::{Json, extract::State};

use crate::{
    config::{CHAT_SAMPLING, DEFINE_SAMPLING, TRANSLATE_SAMPLING},
    error::AppError,
    models::assistant::{
        AnswerResponse, ChatRequest, DefineRequest, DefineResponse, TranslateRequest,
        TranslateResponse,
    },
    services::{
        llm::{ChatMessage, CompletionRequest, LlmGateway},
        prompts,
    },
};

/// Translates text, keeping bullet formatting. An empty `lang` short-circuits
/// to an empty translation without calling the model.
pub async fn translate(
    State(llm): State<Arc<dyn LlmGateway>>,
    Json(req): Json<TranslateRequest>,
) -> Result<Json<TranslateResponse>, AppError> {
    let lang = req.lang.trim();
    if lang.is_empty() {
        return Ok(Json(TranslateResponse {
            translated: String::new(),
        }));
    }

    let translated = llm
        .generate(CompletionRequest::prompt(
            prompts::translate_prompt(&req.text, lang),
            TRANSLATE_SAMPLING,
        ))
        .await?;

    Ok(Json(TranslateResponse { translated }))
}

/// Answers a question using only the supplied summary.
pub async fn chat(
    State(llm): State<Arc<dyn LlmGateway>>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<AnswerResponse>, AppError> {
    let mut messages = vec![ChatMessage::system(prompts::CHAT_SYSTEM)];
    if !req.context.trim().is_empty() {
        messages.push(ChatMessage::assistant(req.context));
    }
    messages.push(ChatMessage::user(req.question));

    let answer = llm
        .generate(CompletionRequest::new(messages, CHAT_SAMPLING))
        .await?;

    Ok(Json(AnswerResponse { answer }))
}

pub async fn define(
    State(llm): State<Arc<dyn LlmGateway>>,
    Json(req): Json<DefineRequest>,
) -> Result<Json<DefineResponse>, AppError> {
    if req.term.trim().is_empty() {
        return Err(AppError::BadRequest("term must not be empty".to_string()));
    }

    let definition = llm
        .generate(CompletionRequest::prompt(
            prompts::define_prompt(&req.term),
            DEFINE_SAMPLING,
        ))
        .await?;

    Ok(Json(DefineResponse { definition }))
}
