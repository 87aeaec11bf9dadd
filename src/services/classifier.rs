// src/services/classifier.rs

use serde::Serialize;

const MEDICAL_KEYWORDS: &[&str] = &["patient", "diagnosis", "mg"];
const LEGAL_KEYWORDS: &[&str] = &["contract", "plaintiff", "liable"];

/// Subject area of an uploaded document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    Medical,
    Legal,
}

impl Domain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Medical => "medical",
            Domain::Legal => "legal",
        }
    }
}

/// Total case-insensitive occurrences of every keyword in `text`.
fn score(text: &str, keywords: &[&str]) -> usize {
    keywords.iter().map(|kw| text.matches(kw).count()).sum()
}

/// Labels `text` by keyword frequency. Ties go to [`Domain::Medical`].
pub fn classify(text: &str) -> Domain {
    let lower = text.to_lowercase();
    let medical = score(&lower, MEDICAL_KEYWORDS);
    let legal = score(&lower, LEGAL_KEYWORDS);

    tracing::debug!(medical, legal, "Domain keyword scores");

    if medical >= legal {
        Domain::Medical
    } else {
        Domain::Legal
    }
}
