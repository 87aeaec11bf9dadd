// src/models/document.rs

use serde::Serialize;

/// Response of `/summarize`. `domain` is `"unknown"` when no text could be read.
#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub domain: String,
    pub summary: String,
}

#[derive(Debug, Serialize)]
pub struct PrescriptionResponse {
    pub rx: String,
}
