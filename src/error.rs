//! Error types for the pdf2krav library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`Pdf2KravError`] — **Fatal**: the document cannot be processed at all
//!   (bad input file, wrong password, provider not configured). Returned as
//!   `Err(Pdf2KravError)` from the top-level `extract*` and `answer*`
//!   functions.
//!
//! * [`AnswerError`] — **Non-fatal**: a single question could not be answered
//!   (transient API error, timeout) but the rest of the document is fine.
//!   Stored inside [`crate::output::AnswerResult`] so callers can inspect
//!   partial success rather than losing every answer to one bad call.
//!
//! Extraction itself has no non-fatal taxonomy: it is a best-effort heuristic
//! over unstructured text, so thin input degrades to fewer (or zero) question
//! blocks instead of failing. Zero blocks is a valid output, never an `Err`.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the pdf2krav library.
///
/// Question-level answering failures use [`AnswerError`] and are stored in
/// [`crate::output::AnswerResult`] rather than propagated here.
#[derive(Debug, Error)]
pub enum Pdf2KravError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is not a valid file path or URL.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}\nTry repairing with: qpdf --decrypt input.pdf output.pdf")]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{path}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { path: PathBuf },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    /// pdfium-render could not produce the text layer for a specific page.
    #[error("Text extraction failed for page {page}: {detail}")]
    PageTextFailed { page: usize, detail: String },

    // ── LLM errors ────────────────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// Every submitted question failed after all retries; no answers at all.
    ///
    /// Attachment questions answered with the `"-"` placeholder do not count
    /// as failures here.
    #[error("All {total} questions failed after {retries} retries each.\nFirst error: {first_error}")]
    AllAnswersFailed {
        total: usize,
        retries: u32,
        first_error: String,
    },

    /// Some questions were answered but at least one failed.
    ///
    /// Returned by [`crate::output::AnswerOutput::into_result`] when the
    /// caller wants to treat any answering failure as an error.
    #[error("{failed}/{total} questions failed during answering")]
    PartialFailure {
        answered: usize,
        failed: usize,
        total: usize,
    },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the question text file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed, or a runtime argument was unusable.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Install a pdfium shared library and either:\n\
  • Set PDFIUM_LIB_PATH=/path/to/dir containing libpdfium, or\n\
  • Place libpdfium next to the executable, or\n\
  • Install it as a system library.\n\
Prebuilt binaries: https://github.com/bblanchon/pdfium-binaries/releases\n"
    )]
    PdfiumBindingFailed(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single question during answering.
///
/// Stored alongside [`crate::output::AnswerResult`] when a question fails.
/// The overall answering run continues unless ALL questions fail.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum AnswerError {
    /// LLM call failed after retries.
    #[error("Question {question}: LLM call failed after {retries} retries: {detail}")]
    LlmFailed {
        question: usize,
        retries: u8,
        detail: String,
    },

    /// LLM call timed out.
    #[error("Question {question}: LLM call timed out after {secs}s")]
    Timeout { question: usize, secs: u64 },
}

impl AnswerError {
    /// Ordinal of the question this error belongs to.
    pub fn question_index(&self) -> usize {
        match self {
            AnswerError::LlmFailed { question, .. } | AnswerError::Timeout { question, .. } => {
                *question
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_failure_display() {
        let e = Pdf2KravError::PartialFailure {
            answered: 9,
            failed: 1,
            total: 10,
        };
        let msg = e.to_string();
        assert!(msg.contains("1/10"), "got: {msg}");
    }

    #[test]
    fn all_answers_failed_display() {
        let e = Pdf2KravError::AllAnswersFailed {
            total: 4,
            retries: 3,
            first_error: "connection refused".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("4 questions"));
        assert!(msg.contains("connection refused"));
    }

    #[test]
    fn not_a_pdf_display_shows_magic() {
        let e = Pdf2KravError::NotAPdf {
            path: PathBuf::from("notes.txt"),
            magic: *b"Hej!",
        };
        assert!(e.to_string().contains("notes.txt"));
    }

    #[test]
    fn answer_error_llm_failed_display() {
        let e = AnswerError::LlmFailed {
            question: 3,
            retries: 2,
            detail: "HTTP 500".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("Question 3"));
        assert!(msg.contains("HTTP 500"));
    }

    #[test]
    fn answer_error_timeout_display() {
        let e = AnswerError::Timeout {
            question: 7,
            secs: 60,
        };
        assert!(e.to_string().contains("60s"));
        assert!(e.to_string().contains("Question 7"));
    }
}
