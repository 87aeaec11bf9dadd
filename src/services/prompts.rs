// src/services/prompts.rs
//
// Prompt text for every language model call the service makes.

use crate::models::quiz::QuizRequest;
use crate::services::classifier::Domain;

/// Audience phrase for a numeric reading level (school grade, roughly).
pub fn level_phrase(level: u32) -> &'static str {
    match level {
        0..=8 => "for an everyday 8th-grade reader.",
        9..=10 => "for a 10th-grade reader.",
        11..=12 => "for a 12th-grade reader.",
        13..=16 => "for a college reader.",
        17..=18 => "for a master’s-level audience.",
        _ => "for a PhD-level audience.",
    }
}

pub fn rewrite_prompt(text: &str, domain: Domain, level: u32) -> String {
    format!(
        "Rewrite the following {} document {} \
         Start with one concise overview paragraph, then bullet-point key facts, \
         and finish with numbered ‘Next Steps’. Do not mention grade levels.\n\n{}",
        domain.as_str(),
        level_phrase(level),
        text
    )
}

pub fn prescription_prompt(ocr_text: &str) -> String {
    format!(
        "You are a pharmacy assistant. From the OCR text of a prescription, provide:\n\
         • **Drug name**\n\
         • **What it treats / how it works**\n\
         • **Dosage & timing**\n\
         • **Important precautions or side-effects**\n\
         Answer as concise Markdown bullet lists without referencing OCR.\n\n{}",
        ocr_text
    )
}

pub fn translate_prompt(text: &str, lang: &str) -> String {
    format!("Translate to {} keeping bullet formatting:\n\n{}", lang, text)
}

pub const CHAT_SYSTEM: &str = "Answer using only the provided summary.";

pub const CHAT_IMAGE_SYSTEM: &str =
    "If the image is a Rx, extract details; else say you can’t read it.";

pub fn chat_image_prompt(ocr_text: &str) -> String {
    format!("OCR:\n{}", ocr_text)
}

pub fn define_prompt(term: &str) -> String {
    format!("Explain in ≤30 plain words:\n{}", term)
}

/// Initial quiz generation prompt.
pub fn quiz_prompt(request: &QuizRequest) -> String {
    format!(
        "Create a {} quiz of {} questions based ONLY on the text below. \
         Use a mix of multiple-choice (label options A-D) and short-answer questions. \
         Return STRICT JSON array where each item has keys: question, type ('mcq'|'written'), \
         options (array), answer. NO markdown, no commentary.\n\nTEXT:\n{}",
        request.difficulty, request.question_count, request.source_text
    )
}

/// Repair prompt; embeds the previous output verbatim.
pub fn quiz_repair_prompt(previous: &str) -> String {
    format!(
        "Your previous response was malformed. \
         Return ONLY the JSON array with correct schema.\n{}",
        previous
    )
}
