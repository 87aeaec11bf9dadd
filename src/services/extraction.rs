// src/services/extraction.rs

use std::ffi::OsStr;
use std::path::Path;

use async_trait::async_trait;
use tempfile::NamedTempFile;
use tokio::process::Command;

use crate::config::Config;

#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("unsupported media type: {0}")]
    UnsupportedMediaType(String),
    #[error("failed to run {tool}: {source}")]
    ToolUnavailable {
        tool: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{tool} exited with {status}: {stderr}")]
    ToolFailed {
        tool: String,
        status: String,
        stderr: String,
    },
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// How an upload is turned into text, decided by its declared media type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Word,
    Text,
}

impl DocumentKind {
    pub fn from_mime(mime: &str) -> Self {
        let mime = mime.trim().to_ascii_lowercase();
        if mime == "application/pdf" {
            DocumentKind::Pdf
        } else if mime.ends_with("msword") || mime.ends_with("document") {
            DocumentKind::Word
        } else {
            DocumentKind::Text
        }
    }
}

/// Whether an upload may be handed to OCR. Browsers sometimes send images
/// as `application/octet-stream`, so that is accepted too.
pub fn is_image_mime(mime: &str) -> bool {
    let mime = mime.trim().to_ascii_lowercase();
    mime.starts_with("image/") || mime == "application/octet-stream"
}

/// Converts uploaded bytes into plain text.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    /// Text of a PDF, Word or plain-text upload. Unreadable PDFs yield `""`.
    async fn extract(&self, data: &[u8], media_type: &str) -> Result<String, ExtractionError>;

    /// OCR text of an image upload. Unreadable images yield `""`.
    async fn ocr(&self, data: &[u8], media_type: &str) -> Result<String, ExtractionError>;
}

/// Shells out to `pdftotext`, `libreoffice` and `tesseract`.
pub struct CommandExtractor {
    pdftotext: String,
    libreoffice: String,
    tesseract: String,
}

impl CommandExtractor {
    pub fn new(pdftotext: &str, libreoffice: &str, tesseract: &str) -> Self {
        Self {
            pdftotext: pdftotext.to_string(),
            libreoffice: libreoffice.to_string(),
            tesseract: tesseract.to_string(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.pdftotext_cmd,
            &config.libreoffice_cmd,
            &config.tesseract_cmd,
        )
    }

    async fn pdf_text(&self, data: &[u8]) -> Result<String, ExtractionError> {
        let file = spill(data, ".pdf").await?;
        match run_tool(&self.pdftotext, [file.path().as_os_str(), OsStr::new("-")]).await {
            Ok(stdout) => Ok(String::from_utf8_lossy(&stdout).into_owned()),
            Err(ExtractionError::ToolFailed { stderr, .. }) => {
                tracing::warn!(stderr = %stderr, "PDF could not be read, treating as empty");
                Ok(String::new())
            }
            Err(e) => Err(e),
        }
    }

    async fn word_text(&self, data: &[u8], media_type: &str) -> Result<String, ExtractionError> {
        let suffix = if media_type.ends_with("msword") { ".doc" } else { ".docx" };
        let file = spill(data, suffix).await?;
        let out_dir = tempfile::tempdir()?;

        run_tool(
            &self.libreoffice,
            [
                OsStr::new("--headless"),
                OsStr::new("--convert-to"),
                OsStr::new("txt:Text"),
                OsStr::new("--outdir"),
                out_dir.path().as_os_str(),
                file.path().as_os_str(),
            ],
        )
        .await?;

        let converted = out_dir.path().join(converted_name(file.path()));
        let text = tokio::fs::read_to_string(&converted).await?;

        Ok(text.lines().collect::<Vec<_>>().join(" "))
    }
}

#[async_trait]
impl TextExtractor for CommandExtractor {
    #[tracing::instrument(skip(self, data), fields(bytes = data.len()))]
    async fn extract(&self, data: &[u8], media_type: &str) -> Result<String, ExtractionError> {
        match DocumentKind::from_mime(media_type) {
            DocumentKind::Pdf => self.pdf_text(data).await,
            DocumentKind::Word => self.word_text(data, media_type).await,
            DocumentKind::Text => Ok(decode_text(data)),
        }
    }

    #[tracing::instrument(skip(self, data), fields(bytes = data.len()))]
    async fn ocr(&self, data: &[u8], media_type: &str) -> Result<String, ExtractionError> {
        if !is_image_mime(media_type) {
            return Err(ExtractionError::UnsupportedMediaType(media_type.to_string()));
        }

        let file = spill(data, ".img").await?;
        match run_tool(&self.tesseract, [file.path().as_os_str(), OsStr::new("stdout")]).await {
            Ok(stdout) => Ok(String::from_utf8_lossy(&stdout).into_owned()),
            Err(ExtractionError::ToolFailed { stderr, .. }) => {
                tracing::warn!(stderr = %stderr, "OCR failed, treating image as unreadable");
                Ok(String::new())
            }
            Err(e) => Err(e),
        }
    }
}

/// UTF-8 decode that drops invalid sequences instead of failing.
pub fn decode_text(data: &[u8]) -> String {
    String::from_utf8_lossy(data)
        .chars()
        .filter(|c| *c != char::REPLACEMENT_CHARACTER)
        .collect()
}

/// Writes the upload to a temporary file that is removed on drop.
async fn spill(data: &[u8], suffix: &str) -> Result<NamedTempFile, ExtractionError> {
    let file = tempfile::Builder::new()
        .prefix("upload-")
        .suffix(suffix)
        .tempfile()?;
    tokio::fs::write(file.path(), data).await?;
    Ok(file)
}

/// `libreoffice --convert-to txt` keeps the stem and swaps the extension.
fn converted_name(input: &Path) -> String {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("{}.txt", stem)
}

async fn run_tool<I, S>(program: &str, args: I) -> Result<Vec<u8>, ExtractionError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let output = Command::new(program)
        .args(args)
        .output()
        .await
        .map_err(|source| ExtractionError::ToolUnavailable {
            tool: program.to_string(),
            source,
        })?;

    if !output.status.success() {
        return Err(ExtractionError::ToolFailed {
            tool: program.to_string(),
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(output.stdout)
}
