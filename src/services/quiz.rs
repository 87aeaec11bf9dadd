// src/services/quiz.rs
//
// Turns free-form model output into a well-formed `Quiz`.
//
// Records that are not JSON objects are dropped, never replaced. Objects get
// field-level defaults. Malformed output is never an error here: it shows up
// as a short (possibly empty) quiz and drives another repair round-trip.

use rand::Rng;
use rand::seq::SliceRandom;
use serde_json::{Map, Value};

use crate::config::{QUIZ_REPAIR_ATTEMPTS, QUIZ_SAMPLING};
use crate::models::quiz::{QuestionKind, Quiz, QuizItem, QuizRequest};
use crate::services::llm::{CompletionRequest, LlmError, LlmGateway, strip_code_fences};
use crate::services::prompts;

/// Number of options on a multiple choice item whose options had to be made up.
pub const FABRICATED_OPTION_COUNT: usize = 4;

/// Parses `raw` as a JSON array of quiz records and normalizes each one.
///
/// * Unparsable text yields an empty quiz.
/// * Non-object records are skipped.
/// * Multiple choice options are shuffled with `rng` on every call.
pub fn parse_and_repair<R: Rng + ?Sized>(raw: &str, rng: &mut R) -> Quiz {
    let Some(records) = parse_records(raw) else {
        tracing::debug!("Quiz candidate is not a JSON array");
        return Vec::new();
    };

    let total = records.len();
    let quiz: Quiz = records
        .iter()
        .filter_map(|record| record.as_object())
        .map(|record| normalize_item(record, &mut *rng))
        .collect();

    if quiz.len() < total {
        tracing::debug!(dropped = total - quiz.len(), "Dropped non-object quiz records");
    }

    quiz
}

/// Generates a quiz for `request`, repairing incomplete output up to
/// [`QUIZ_REPAIR_ATTEMPTS`] times.
///
/// Issues at most `1 + QUIZ_REPAIR_ATTEMPTS` gateway calls. The returned quiz
/// may be shorter than requested; only gateway failures are errors.
pub async fn generate_quiz<R>(
    gateway: &dyn LlmGateway,
    request: &QuizRequest,
    rng: &mut R,
) -> Result<Quiz, LlmError>
where
    R: Rng + Send + ?Sized,
{
    let wanted = request.question_count;
    let mut raw = ask(gateway, prompts::quiz_prompt(request)).await?;

    for attempt in 1..=QUIZ_REPAIR_ATTEMPTS {
        let quiz = parse_and_repair(&raw, &mut *rng);
        if quiz.len() == wanted {
            tracing::info!(attempt, wanted, "Quiz generated");
            return Ok(quiz);
        }

        tracing::info!(attempt, parsed = quiz.len(), wanted, "Quiz incomplete, requesting repair");
        raw = ask(gateway, prompts::quiz_repair_prompt(&raw)).await?;
    }

    let mut quiz = parse_and_repair(&raw, &mut *rng);
    if quiz.len() != wanted {
        tracing::warn!(parsed = quiz.len(), wanted, "Returning incomplete quiz after repairs");
    }
    quiz.truncate(wanted);
    Ok(quiz)
}

async fn ask(gateway: &dyn LlmGateway, prompt: String) -> Result<String, LlmError> {
    let reply = gateway
        .generate(CompletionRequest::prompt(prompt, QUIZ_SAMPLING))
        .await?;
    Ok(strip_code_fences(&reply))
}

/// Top-level JSON array, or the outermost `[...]` span when the model wrapped
/// it in commentary. A `{"questions": [...]}` envelope is unwrapped.
fn parse_records(raw: &str) -> Option<Vec<Value>> {
    let trimmed = raw.trim();
    let value = serde_json::from_str::<Value>(trimmed)
        .ok()
        .or_else(|| {
            let start = trimmed.find('[')?;
            let end = trimmed.rfind(']')?;
            if end <= start {
                return None;
            }
            serde_json::from_str(&trimmed[start..=end]).ok()
        })?;

    match value {
        Value::Array(records) => Some(records),
        Value::Object(mut envelope) => match envelope.remove("questions") {
            Some(Value::Array(records)) => Some(records),
            _ => None,
        },
        _ => None,
    }
}

fn normalize_item<R: Rng + ?Sized>(record: &Map<String, Value>, rng: &mut R) -> QuizItem {
    let question = field_text(record, "question").trim().to_string();
    let answer = field_text(record, "answer").trim().to_string();
    let kind = record
        .get("type")
        .map(|v| QuestionKind::from_label(&text_of(v)))
        .unwrap_or(QuestionKind::MultipleChoice);

    let supplied = read_options(record.get("options"));

    let options = match kind {
        QuestionKind::Written => supplied.unwrap_or_default(),
        QuestionKind::MultipleChoice => {
            let mut options = match supplied {
                Some(options) => include_answer(options, &answer),
                None => fabricate_options(&answer),
            };
            options.shuffle(rng);
            options
        }
    };

    QuizItem {
        question,
        kind,
        options,
        answer,
    }
}

fn field_text(record: &Map<String, Value>, key: &str) -> String {
    record.get(key).map(text_of).unwrap_or_default()
}

/// String form of a JSON scalar; `null` reads as empty.
fn text_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// `None` when the field is missing, not an array, or empty.
fn read_options(value: Option<&Value>) -> Option<Vec<String>> {
    let options: Vec<String> = value?
        .as_array()?
        .iter()
        .map(|v| text_of(v).trim().to_string())
        .collect();

    if options.is_empty() { None } else { Some(options) }
}

/// Guarantees the answer (even an empty one) is one of the options. A supplied
/// list missing the answer has its last entry replaced, so the count is unchanged.
fn include_answer(mut options: Vec<String>, answer: &str) -> Vec<String> {
    if !options.iter().any(|o| o == answer) {
        tracing::debug!("Answer missing from supplied options, substituting last option");
        if let Some(last) = options.last_mut() {
            *last = answer.to_string();
        }
    }
    options
}

/// The answer plus three `Option X` placeholders. Letters start at B and skip
/// any label equal to the answer.
fn fabricate_options(answer: &str) -> Vec<String> {
    let mut options = Vec::with_capacity(FABRICATED_OPTION_COUNT);
    options.push(answer.to_string());
    options.extend(
        ('B'..='Z')
            .map(|letter| format!("Option {}", letter))
            .filter(|label| label != answer)
            .take(FABRICATED_OPTION_COUNT - 1),
    );
    options
}
