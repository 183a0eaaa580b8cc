//! Eager (full-document) extraction and answering entry points.
//!
//! ## Why eager vs. streaming?
//!
//! This module provides the simpler API: run a stage to completion, then
//! return. [`extract`] never touches an LLM provider; [`answer_questions`]
//! waits for every answer before returning. Use
//! [`crate::stream::answer_stream`] instead when you want answers
//! progressively, e.g. to display them as they arrive.

use crate::config::ExtractionConfig;
use crate::error::Pdf2KravError;
use crate::lexicon::Lexicon;
use crate::output::{
    AnswerOutput, AnswerResult, AnswerStats, DocumentMetadata, ExtractionOutput, ExtractionStats,
    QuestionBlock,
};
use crate::pipeline::{answer, furniture, input, markers, render, segment};
use crate::prompts::{company_system_prompt, MIN_COMPANY_PROFILE_CHARS};
use edgequake_llm::{LLMProvider, ProviderFactory};
use futures::stream::{self, StreamExt};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Model used when the caller names a provider without naming a model.
const DEFAULT_MODEL: &str = "gpt-4.1-nano";

/// Extract requirement questions from a PDF file or URL.
///
/// This is the primary entry point for the library. It needs no LLM
/// provider: the pipeline is pure text processing once pdfium has produced
/// the page text.
///
/// # Arguments
/// * `input_str` — Local file path or HTTP/HTTPS URL to a PDF
/// * `config` — Extraction configuration
///
/// # Returns
/// `Ok(ExtractionOutput)` with the question blocks in document order. A
/// document yielding zero questions is a valid outcome, not an error.
///
/// # Errors
/// Returns `Err(Pdf2KravError)` only for fatal errors:
/// - File not found / permission denied / not a valid PDF
/// - Password-protected or corrupt document
/// - pdfium unable to produce page text
///
/// # Example
/// ```rust,no_run
/// use pdf2krav::{extract, ExtractionConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = ExtractionConfig::default();
/// let output = extract("upphandling.pdf", &config).await?;
/// for question in &output.questions {
///     println!("{}", question.title());
/// }
/// # Ok(())
/// # }
/// ```
pub async fn extract(
    input_str: impl AsRef<str>,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, Pdf2KravError> {
    let total_start = Instant::now();
    let input_str = input_str.as_ref();
    info!("Starting extraction: {}", input_str);

    // ── Step 1: Resolve input ────────────────────────────────────────────
    let resolved = input::resolve_input(input_str, config.download_timeout_secs).await?;
    let pdf_path = resolved.path().to_path_buf();

    // ── Step 2: Extract page text ────────────────────────────────────────
    let render_start = Instant::now();
    let pdf_text = render::extract_pdf_text(&pdf_path, config.password.as_deref()).await?;
    let render_duration_ms = render_start.elapsed().as_millis() as u64;
    info!(
        "Extracted text from {} pages in {}ms",
        pdf_text.pages.len(),
        render_duration_ms
    );

    // ── Step 3: Clean and segment ────────────────────────────────────────
    let cleaned = run_text_pipeline(&pdf_text.pages, &config.lexicon);
    info!(
        "Found {} questions in {} cleaned lines",
        cleaned.questions.len(),
        cleaned.lines.len()
    );

    // ── Step 4: Compute stats ────────────────────────────────────────────
    let stats = ExtractionStats {
        total_pages: pdf_text.pages.len(),
        headers_stripped: cleaned.headers_stripped,
        footers_stripped: cleaned.footers_stripped,
        cleaned_lines: cleaned.lines.len(),
        questions_found: cleaned.questions.len(),
        render_duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };

    Ok(ExtractionOutput {
        questions: cleaned.questions,
        metadata: pdf_text.metadata,
        stats,
    })
}

/// Extract questions and write their text form directly to a file.
///
/// Uses atomic write (temp file + rename) to prevent partial files. The
/// serialised form is `"Question:\n"` + block text per block, blank-line
/// separated, with a trailing newline.
pub async fn extract_to_file(
    input_str: impl AsRef<str>,
    output_path: impl AsRef<Path>,
    config: &ExtractionConfig,
) -> Result<ExtractionStats, Pdf2KravError> {
    let output = extract(input_str, config).await?;
    write_questions_file(&output, output_path).await?;
    Ok(output.stats)
}

/// Write an extraction's question text form to a file.
///
/// Same atomic write as [`extract_to_file`], for callers that already hold
/// an [`ExtractionOutput`]. A trailing newline is appended unless the
/// question list is empty.
pub async fn write_questions_file(
    output: &ExtractionOutput,
    output_path: impl AsRef<Path>,
) -> Result<(), Pdf2KravError> {
    let mut text = output.to_text();
    if !text.is_empty() {
        text.push('\n');
    }
    write_atomic(output_path.as_ref(), &text).await
}

/// Synchronous wrapper around [`extract`].
///
/// Creates a temporary tokio runtime internally.
pub fn extract_sync(
    input_str: impl AsRef<str>,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, Pdf2KravError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Pdf2KravError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(extract(input_str, config))
}

/// Extract questions from PDF bytes in memory.
///
/// This avoids the need for the caller to create a temporary file.
/// Internally the library writes `bytes` to a managed [`tempfile`] and cleans
/// it up automatically on return or panic.
///
/// This is the recommended API when PDF data comes from an upload, database,
/// or network stream rather than a file on disk.
///
/// # Example
/// ```rust,no_run
/// use pdf2krav::{extract_from_bytes, ExtractionConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let bytes: Vec<u8> = std::fs::read("upphandling.pdf")?;
/// let config = ExtractionConfig::default();
/// let output = extract_from_bytes(&bytes, &config).await?;
/// println!("{} questions", output.questions.len());
/// # Ok(())
/// # }
/// ```
pub async fn extract_from_bytes(
    bytes: &[u8],
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, Pdf2KravError> {
    let mut tmp = tempfile::NamedTempFile::new()
        .map_err(|e| Pdf2KravError::Internal(format!("tempfile: {e}")))?;
    tmp.write_all(bytes)
        .map_err(|e| Pdf2KravError::Internal(format!("tempfile write: {e}")))?;
    let path = tmp.path().to_string_lossy().to_string();
    // `tmp` is dropped (and the file deleted) when `extract` returns
    extract(&path, config).await
}

/// Extract PDF metadata without running the pipeline.
///
/// Does not require an LLM provider or API key.
pub async fn inspect(input_str: impl AsRef<str>) -> Result<DocumentMetadata, Pdf2KravError> {
    let resolved = input::resolve_input(input_str.as_ref(), 120).await?;
    let pdf_path = resolved.path().to_path_buf();
    render::extract_metadata(&pdf_path, None).await
}

/// Run the text pipeline over already-extracted page texts.
///
/// Entry point for callers that obtained page text elsewhere (another PDF
/// library, OCR, test fixtures). No I/O, no provider, no async.
pub fn questions_from_pages(pages: &[String], lexicon: &Lexicon) -> Vec<QuestionBlock> {
    run_text_pipeline(pages, lexicon).questions
}

/// Answer extracted questions as a representative of the given company.
///
/// The company profile is free-form text describing the answering company;
/// it becomes the system prompt via
/// [`company_system_prompt`](crate::prompts::company_system_prompt), unless
/// `config.system_prompt` overrides the scaffold entirely. Questions are
/// answered concurrently (`config.concurrency` in flight) and returned in
/// document order.
///
/// # Returns
/// `Ok(AnswerOutput)` even if some questions failed (check
/// `output.stats.failed`, or call [`AnswerOutput::into_result`]). Attachment
/// questions are answered with `"-"` without calling the provider.
///
/// # Errors
/// Fatal errors only:
/// - Company profile shorter than 50 characters (with no prompt override)
/// - No LLM provider could be resolved
/// - Every submitted question failed
pub async fn answer_questions(
    questions: &[QuestionBlock],
    company_profile: &str,
    config: &ExtractionConfig,
) -> Result<AnswerOutput, Pdf2KravError> {
    let total_start = Instant::now();

    let system_prompt = build_system_prompt(company_profile, config)?;

    let selected: &[QuestionBlock] = match config.answer_limit {
        Some(n) => &questions[..n.min(questions.len())],
        None => questions,
    };
    info!("Answering {} of {} questions", selected.len(), questions.len());

    if selected.is_empty() {
        return Ok(AnswerOutput {
            answers: vec![],
            stats: AnswerStats::default(),
        });
    }

    let provider = resolve_provider(config).await?;

    let mut answers: Vec<AnswerResult> = stream::iter(selected.iter().map(|question| {
        let provider = Arc::clone(&provider);
        let prompt = system_prompt.clone();
        let config = config.clone();
        async move { answer::answer_question(&provider, question, &prompt, &config).await }
    }))
    .buffer_unordered(config.concurrency)
    .collect()
    .await;

    // Sort back to document order for consistent output
    answers.sort_by_key(|a| a.question_index);

    let answered = answers.iter().filter(|a| a.is_answered()).count();
    let skipped = answers.iter().filter(|a| a.skipped).count();
    let failed = answers.iter().filter(|a| a.error.is_some()).count();

    if answered == 0 && failed > 0 {
        let first_error = answers
            .iter()
            .find_map(|a| a.error.as_ref())
            .map(|e| format!("{}", e))
            .unwrap_or_else(|| "Unknown error".to_string());

        return Err(Pdf2KravError::AllAnswersFailed {
            total: selected.len(),
            retries: config.max_retries,
            first_error,
        });
    }

    let stats = AnswerStats {
        total_questions: selected.len(),
        answered,
        skipped,
        failed,
        total_input_tokens: answers.iter().map(|a| a.input_tokens as u64).sum(),
        total_output_tokens: answers.iter().map(|a| a.output_tokens as u64).sum(),
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };

    info!(
        "Answered {}/{} questions ({} skipped, {} failed) in {}ms",
        answered, stats.total_questions, skipped, failed, stats.total_duration_ms
    );

    Ok(AnswerOutput { answers, stats })
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Result of the pure-text pipeline stages.
struct CleanedDocument {
    lines: Vec<String>,
    headers_stripped: usize,
    footers_stripped: usize,
    questions: Vec<QuestionBlock>,
}

/// Furniture stripping, marker relocation, segmentation.
fn run_text_pipeline(pages: &[String], lexicon: &Lexicon) -> CleanedDocument {
    let prints = furniture::PageFingerprints::collect(pages.iter().map(String::as_str));
    let normalized = furniture::normalize_document(pages.iter().map(String::as_str), &prints);
    debug!(
        "Stripped {} headers and {} footers",
        normalized.headers_stripped, normalized.footers_stripped
    );

    let lines = markers::relocate_margin_markers(&normalized.lines, lexicon);
    let questions = segment::segment_questions(&lines, lexicon);

    CleanedDocument {
        lines,
        headers_stripped: normalized.headers_stripped,
        footers_stripped: normalized.footers_stripped,
        questions,
    }
}

async fn write_atomic(path: &Path, contents: &str) -> Result<(), Pdf2KravError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| Pdf2KravError::OutputWriteFailed {
                path: path.to_path_buf(),
                source: e,
            })?;
    }

    // Atomic write: write to temp, then rename
    let tmp_path = path.with_extension("txt.tmp");
    tokio::fs::write(&tmp_path, contents)
        .await
        .map_err(|e| Pdf2KravError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| Pdf2KravError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    Ok(())
}

/// Assemble the answering system prompt, validating the company profile.
///
/// An explicit `config.system_prompt` wins outright; otherwise the profile
/// must be substantial enough to answer from.
pub(crate) fn build_system_prompt(
    company_profile: &str,
    config: &ExtractionConfig,
) -> Result<String, Pdf2KravError> {
    if let Some(ref prompt) = config.system_prompt {
        return Ok(prompt.clone());
    }

    let profile = company_profile.trim();
    if profile.chars().count() < MIN_COMPANY_PROFILE_CHARS {
        return Err(Pdf2KravError::InvalidConfig(format!(
            "Company profile too short: {} chars (minimum {}). \
             Describe the company well enough to answer from.",
            profile.chars().count(),
            MIN_COMPANY_PROFILE_CHARS
        )));
    }
    Ok(company_system_prompt(profile))
}

/// Instantiate a named provider with the given model.
fn create_provider(
    provider_name: &str,
    model: &str,
) -> Result<Arc<dyn LLMProvider>, Pdf2KravError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        Pdf2KravError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

/// Resolve the LLM provider, from most-specific to least-specific.
///
/// The four-level fallback chain lets library users and CLI users each set
/// exactly as much or as little as they need:
///
/// 1. **Pre-built provider** (`config.provider`) — the caller constructed and
///    configured the provider entirely; we use it as-is. Useful in tests or
///    when the caller needs custom middleware (caching, rate-limiting).
///
/// 2. **Named provider + model** (`config.provider_name`) — the caller named
///    a provider (e.g. `"openai"`) and optional model. We call
///    [`ProviderFactory::create_llm_provider`] which reads the corresponding
///    API key (`OPENAI_API_KEY`, etc.) from the environment.
///
/// 3. **Environment pair** (`EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`) —
///    Both env vars set means the caller chose a provider and model at the
///    execution environment level (Makefile, shell script, CI). Checked before
///    full auto-detection so the model choice is honoured even when multiple
///    API keys are present.
///
/// 4. **Full auto-detection** (`ProviderFactory::from_env`) — the factory
///    scans all known API key variables and picks the first available provider.
///    Convenient for `pdf2krav document.pdf --answer` with no other
///    configuration.
pub(crate) async fn resolve_provider(
    config: &ExtractionConfig,
) -> Result<Arc<dyn LLMProvider>, Pdf2KravError> {
    // 1) User-provided provider takes priority
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    // 2) Provider name + model
    if let Some(ref name) = config.provider_name {
        let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);
        return create_provider(name, model);
    }

    // 3) Auto-detect from environment; honour EDGEQUAKE_LLM_PROVIDER + EDGEQUAKE_MODEL when both set
    if let (Ok(prov), Ok(model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !model.is_empty() {
            return create_provider(&prov, &model);
        }
    }

    // Prefer OpenAI explicitly when an OpenAI API key is present. This ensures
    // users with multiple provider keys (e.g. Gemini + OpenAI) will default
    // to OpenAI unless they explicitly request another provider.
    if let Ok(openai_key) = std::env::var("OPENAI_API_KEY") {
        if !openai_key.is_empty() {
            let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);
            return create_provider("openai", model);
        }
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| Pdf2KravError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set OPENAI_API_KEY, ANTHROPIC_API_KEY, or configure a provider.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(llm_provider)
}
