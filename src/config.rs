// src/config.rs

use std::env;
use dotenvy::dotenv;
use url::Url;

use crate::services::llm::Sampling;

/// Maximum number of repair round-trips after the initial quiz generation call.
pub const QUIZ_REPAIR_ATTEMPTS: usize = 3;

/// Upper bound for `num` on the quiz endpoint.
pub const MAX_QUIZ_QUESTIONS: usize = 50;

/// Extracted documents shorter than this (after trimming) are treated as unreadable.
pub const MIN_DOCUMENT_CHARS: usize = 30;

/// OCR output shorter than this (after trimming) is treated as an unreadable prescription.
pub const MIN_PRESCRIPTION_CHARS: usize = 20;

/// Reading level used by `/summarize` when the form omits `level`.
pub const DEFAULT_READING_LEVEL: u32 = 10;

// Per-endpoint generation budgets.
pub const SUMMARY_SAMPLING: Sampling = Sampling::new(450, 0.5);
pub const PRESCRIPTION_SAMPLING: Sampling = Sampling::new(300, 0.4);
pub const TRANSLATE_SAMPLING: Sampling = Sampling::new(800, 0.3);
pub const CHAT_SAMPLING: Sampling = Sampling::new(300, 0.4);
pub const CHAT_IMAGE_SAMPLING: Sampling = Sampling::new(250, 0.4);
pub const DEFINE_SAMPLING: Sampling = Sampling::new(60, 0.3);
pub const QUIZ_SAMPLING: Sampling = Sampling::new(800, 0.7);

#[derive(Debug, Clone)]
pub struct Config {
    pub openai_api_key: String,
    pub openai_base_url: String,
    pub llm_model: String,
    /// Per-call timeout for the language model, in seconds.
    pub llm_timeout_secs: u64,
    pub jwt_secret: String,
    /// Token lifetime in seconds.
    pub jwt_expiration: u64,
    /// JSON file holding `username -> password hash`.
    pub users_file: String,
    /// Directory served for every non-API path.
    pub static_dir: String,
    pub port: u16,
    pub rust_log: String,
    pub max_upload_bytes: usize,
    pub tesseract_cmd: String,
    pub pdftotext_cmd: String,
    pub libreoffice_cmd: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let openai_api_key = env::var("OPENAI_API_KEY")
            .expect("OPENAI_API_KEY must be set");

        let openai_base_url = env::var("OPENAI_BASE_URL")
            .unwrap_or_else(|_| "https://api.openai.com/v1".to_string());
        Url::parse(&openai_base_url).expect("OPENAI_BASE_URL must be a valid URL");

        let jwt_secret = env::var("JWT_SECRET")
            .expect("JWT_SECRET must be set");

        Self {
            openai_api_key,
            openai_base_url,
            llm_model: var_or("LLM_MODEL", "gpt-3.5-turbo"),
            llm_timeout_secs: parse_or("LLM_TIMEOUT_SECS", 30),
            jwt_secret,
            jwt_expiration: parse_or("JWT_EXPIRATION", 86_400),
            users_file: var_or("USERS_FILE", "users.json"),
            static_dir: var_or("STATIC_DIR", "frontend"),
            port: parse_or("PORT", 5000),
            rust_log: var_or("RUST_LOG", "info"),
            max_upload_bytes: parse_or::<usize>("MAX_UPLOAD_MB", 16) * 1024 * 1024,
            tesseract_cmd: var_or("TESSERACT_CMD", "tesseract"),
            pdftotext_cmd: var_or("PDFTOTEXT_CMD", "pdftotext"),
            libreoffice_cmd: var_or("LIBREOFFICE_CMD", "libreoffice"),
        }
    }
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::warn!("Ignoring unparsable {}={:?}, using default", key, raw);
            default
        }),
        Err(_) => default,
    }
}
