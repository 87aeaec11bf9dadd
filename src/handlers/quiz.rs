// src/handlers/quiz.rs

use std::sync::Arc;

use axum::{Json, extract::State};
use rand::SeedableRng;
use rand::rngs::StdRng;
use validator::Validate;

use crate::{
    error::AppError,
    models::quiz::{MakeQuizRequest, Quiz, QuizRequest},
    services::{llm::LlmGateway, quiz::generate_quiz},
};

/// Generates a quiz from a summary.
///
/// * Validates `summary` and `num`.
/// * Runs the generate-and-repair loop against the language model.
/// * Returns whatever the last attempt produced, which may hold fewer than
///   `num` questions. Only an unreachable model is reported as an error.
pub async fn make_quiz(
    State(llm): State<Arc<dyn LlmGateway>>,
    Json(payload): Json<MakeQuizRequest>,
) -> Result<Json<Quiz>, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let request = QuizRequest::from(payload);
    let mut rng = StdRng::from_entropy();

    let quiz = generate_quiz(llm.as_ref(), &request, &mut rng).await?;

    Ok(Json(quiz))
}
