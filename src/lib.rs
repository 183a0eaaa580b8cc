//! # pdf2krav
//!
//! Extract requirement questions from Swedish procurement PDFs and answer
//! them with an LLM.
//!
//! ## Why this crate?
//!
//! Tender questionnaires exported from procurement portals bury their
//! questions in layout noise: every page repeats the same header and footer,
//! right-margin category markers get folded into body lines by the text
//! layer, and nothing marks where one question ends and the next begins.
//! This crate reverses those artefacts deterministically — no LLM involved —
//! and hands back clean question blocks. Answering the questions as a given
//! company is a separate, optional stage.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input      resolve local file or download from URL
//!  ├─ 2. Render     page text via pdfium (CPU-bound, spawn_blocking)
//!  ├─ 3. Furniture  strip recurring page headers and footers
//!  ├─ 4. Markers    lift right-margin category markers onto label lines
//!  ├─ 5. Segment    group lines into question blocks
//!  └─ 6. Answer     (optional) concurrent LLM calls as the bidding company
//! ```
//!
//! Stages 3–5 are pure text processing, driven by an injectable [`Lexicon`]
//! of template patterns; the Swedish procurement template is the default.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf2krav::{extract, answer_questions, ExtractionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ExtractionConfig::default();
//!     let output = extract("upphandling.pdf", &config).await?;
//!     println!("{}", output.to_text());
//!
//!     // Provider auto-detected from OPENAI_API_KEY / ANTHROPIC_API_KEY / …
//!     let profile = std::fs::read_to_string("foretag.txt")?;
//!     let answers = answer_questions(&output.questions, &profile, &config).await?;
//!     for a in &answers.answers {
//!         println!("{}: {}", a.question_index, a.answer);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2krav` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! pdf2krav = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod extract;
pub mod lexicon;
pub mod output;
pub mod pipeline;
pub mod prompts;
pub mod stream;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ExtractionConfig, ExtractionConfigBuilder};
pub use error::{AnswerError, Pdf2KravError};
pub use extract::{
    answer_questions, extract, extract_from_bytes, extract_sync, extract_to_file, inspect,
    questions_from_pages, write_questions_file,
};
pub use lexicon::{Lexicon, MarkerRule, DEFAULT_GAP_WIDTH};
pub use output::{
    AnswerOutput, AnswerResult, AnswerStats, DocumentMetadata, ExtractionOutput, ExtractionStats,
    QuestionBlock, SKIPPED_ANSWER,
};
pub use stream::{answer_stream, AnswerStream};
