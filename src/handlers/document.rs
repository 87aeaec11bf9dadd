// src/handlers/document.rs

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    Json,
    body::Bytes,
    extract::{Multipart, State},
};

use crate::{
    config::{
        CHAT_IMAGE_SAMPLING, DEFAULT_READING_LEVEL, MIN_DOCUMENT_CHARS, MIN_PRESCRIPTION_CHARS,
        PRESCRIPTION_SAMPLING, SUMMARY_SAMPLING,
    },
    error::AppError,
    models::{
        assistant::AnswerResponse,
        document::{PrescriptionResponse, SummaryResponse},
    },
    services::{
        classifier::classify,
        extraction::TextExtractor,
        llm::{ChatMessage, CompletionRequest, LlmGateway},
        prompts,
    },
};

const UNREADABLE_DOCUMENT: &str = "Sorry, I couldn’t extract readable text.";
const UNREADABLE_PRESCRIPTION: &str = "Sorry — I couldn’t read that prescription clearly.";

/// An uploaded file part.
struct Upload {
    media_type: String,
    data: Bytes,
}

/// All parts of a multipart form, split into files and plain fields.
#[derive(Default)]
struct UploadForm {
    files: HashMap<String, Upload>,
    fields: HashMap<String, String>,
}

impl UploadForm {
    async fn read(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut form = UploadForm::default();

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();

            if field.file_name().is_some() {
                let media_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field.bytes().await?;
                tracing::debug!(field = %name, media_type = %media_type, bytes = data.len(), "Upload received");
                form.files.insert(name, Upload { media_type, data });
            } else {
                form.fields.insert(name, field.text().await?);
            }
        }

        Ok(form)
    }

    fn take_file(&mut self, name: &str) -> Result<Upload, AppError> {
        self.files
            .remove(name)
            .ok_or_else(|| AppError::BadRequest(format!("Missing file field '{}'", name)))
    }

    fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(|v| v.trim()).filter(|v| !v.is_empty())
    }
}

fn readable(text: &str, min_chars: usize) -> bool {
    text.trim().chars().count() >= min_chars
}

/// Extracts a document, classifies it and rewrites it for the requested
/// reading level.
pub async fn summarize(
    State(extractor): State<Arc<dyn TextExtractor>>,
    State(llm): State<Arc<dyn LlmGateway>>,
    multipart: Multipart,
) -> Result<Json<SummaryResponse>, AppError> {
    let mut form = UploadForm::read(multipart).await?;

    let level = match form.field("level") {
        Some(raw) => raw
            .parse::<u32>()
            .map_err(|_| AppError::BadRequest("level must be a non-negative integer".to_string()))?,
        None => DEFAULT_READING_LEVEL,
    };

    let upload = form.take_file("file")?;
    let text = extractor.extract(&upload.data, &upload.media_type).await?;

    if !readable(&text, MIN_DOCUMENT_CHARS) {
        tracing::info!(media_type = %upload.media_type, "No readable text in document");
        return Ok(Json(SummaryResponse {
            domain: "unknown".to_string(),
            summary: UNREADABLE_DOCUMENT.to_string(),
        }));
    }

    let domain = classify(&text);
    tracing::info!(domain = domain.as_str(), level, "Summarizing document");

    let summary = llm
        .generate(CompletionRequest::prompt(
            prompts::rewrite_prompt(&text, domain, level),
            SUMMARY_SAMPLING,
        ))
        .await?;

    Ok(Json(SummaryResponse {
        domain: domain.as_str().to_string(),
        summary,
    }))
}

/// OCRs a prescription image and explains it.
pub async fn prescription(
    State(extractor): State<Arc<dyn TextExtractor>>,
    State(llm): State<Arc<dyn LlmGateway>>,
    multipart: Multipart,
) -> Result<Json<PrescriptionResponse>, AppError> {
    let mut form = UploadForm::read(multipart).await?;
    let upload = form.take_file("file")?;
    let text = extractor.ocr(&upload.data, &upload.media_type).await?;

    if !readable(&text, MIN_PRESCRIPTION_CHARS) {
        return Ok(Json(PrescriptionResponse {
            rx: UNREADABLE_PRESCRIPTION.to_string(),
        }));
    }

    let rx = llm
        .generate(CompletionRequest::prompt(
            prompts::prescription_prompt(&text),
            PRESCRIPTION_SAMPLING,
        ))
        .await?;

    Ok(Json(PrescriptionResponse { rx }))
}

/// Answers about an uploaded image, with an optional summary as context.
pub async fn chat_image(
    State(extractor): State<Arc<dyn TextExtractor>>,
    State(llm): State<Arc<dyn LlmGateway>>,
    multipart: Multipart,
) -> Result<Json<AnswerResponse>, AppError> {
    let mut form = UploadForm::read(multipart).await?;
    let upload = form.take_file("image")?;
    let context = form.field("context").map(str::to_string);
    let text = extractor.ocr(&upload.data, &upload.media_type).await?;

    let mut messages = vec![ChatMessage::system(prompts::CHAT_IMAGE_SYSTEM)];
    if let Some(context) = context {
        messages.push(ChatMessage::assistant(context));
    }
    messages.push(ChatMessage::user(prompts::chat_image_prompt(&text)));

    let answer = llm
        .generate(CompletionRequest::new(messages, CHAT_IMAGE_SAMPLING))
        .await?;

    Ok(Json(AnswerResponse { answer }))
}
