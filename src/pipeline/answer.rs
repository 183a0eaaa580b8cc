//! LLM interaction: answer one requirement question as the bidding company.
//!
//! This module turns a question block into a chat completion call and returns
//! the answer text. It is intentionally thin — all prompt scaffolding lives
//! in [`crate::prompts`] so the company-representative framing can change
//! without touching retry or error-handling logic here.
//!
//! ## Retry Strategy
//!
//! HTTP 429 / 503 errors from LLM APIs are transient and frequent under
//! concurrent load. Exponential backoff (`retry_backoff_ms * 2^attempt`)
//! avoids thundering-herd: with 500 ms base and 3 retries the wait sequence
//! is 500 ms → 1 s → 2 s, totalling < 4 s of back-off per question. Each
//! attempt also runs under `api_timeout_secs` so a hung connection cannot
//! stall the whole questionnaire.

use crate::config::ExtractionConfig;
use crate::error::AnswerError;
use crate::output::{AnswerResult, QuestionBlock};
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider};
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{sleep, timeout, Duration};
use tracing::{debug, warn};

/// How far from the end of a question the answer-type trailer can sit.
const TRAILER_WINDOW_CHARS: usize = 20;

/// Whether the question asks for a file attachment instead of a text answer.
///
/// Attachment questions end in a `Bifogad fil` style trailer; no text
/// completion can satisfy them, so they are answered with a placeholder
/// rather than sent to the LLM. Only the trailing window is searched —
/// a question may well *mention* attachments in its body and still want a
/// written answer.
pub fn requests_attachment(question: &str) -> bool {
    let tail_start = question
        .char_indices()
        .rev()
        .nth(TRAILER_WINDOW_CHARS - 1)
        .map_or(0, |(i, _)| i);
    question[tail_start..].to_lowercase().contains("bifoga")
}

/// Answer a single question via the LLM.
///
/// ## Message Layout
///
/// The request contains (in order):
/// 1. **System message** — the company-representative scaffold wrapping the
///    company profile (see [`crate::prompts::company_system_prompt`])
/// 2. **User message** — the question block text, verbatim
///
/// ## Return Value
///
/// Always returns an [`AnswerResult`] — never propagates the error upward so
/// a single bad question doesn't abort the questionnaire. Callers check
/// `result.error` to decide whether to include or flag the answer.
pub async fn answer_question(
    provider: &Arc<dyn LLMProvider>,
    question: &QuestionBlock,
    system_prompt: &str,
    config: &ExtractionConfig,
) -> AnswerResult {
    let start = Instant::now();

    if requests_attachment(&question.text) {
        debug!(
            "Question {}: asks for a file attachment, answering with placeholder",
            question.index
        );
        return AnswerResult::skipped(question.index);
    }

    let messages = vec![
        ChatMessage::system(system_prompt),
        ChatMessage::user(question.text.as_str()),
    ];
    let options = build_options(config);

    let mut last_err: Option<String> = None;
    let mut last_was_timeout = false;

    for attempt in 0..=config.max_retries {
        if attempt > 0 {
            let backoff = config.retry_backoff_ms * 2u64.pow(attempt - 1);
            warn!(
                "Question {}: retry {}/{} after {}ms",
                question.index, attempt, config.max_retries, backoff
            );
            sleep(Duration::from_millis(backoff)).await;
        }

        let call = provider.chat(&messages, Some(&options));
        match timeout(Duration::from_secs(config.api_timeout_secs), call).await {
            Ok(Ok(response)) => {
                let duration = start.elapsed();
                debug!(
                    "Question {}: {} input tokens, {} output tokens, {:?}",
                    question.index, response.prompt_tokens, response.completion_tokens, duration
                );

                return AnswerResult {
                    question_index: question.index,
                    answer: response.content.trim().to_string(),
                    skipped: false,
                    input_tokens: response.prompt_tokens as usize,
                    output_tokens: response.completion_tokens as usize,
                    duration_ms: duration.as_millis() as u64,
                    retries: attempt as u8,
                    error: None,
                };
            }
            Ok(Err(e)) => {
                let err_msg = format!("{}", e);
                warn!(
                    "Question {}: attempt {} failed: {}",
                    question.index,
                    attempt + 1,
                    err_msg
                );
                last_err = Some(err_msg);
                last_was_timeout = false;
            }
            Err(_elapsed) => {
                warn!(
                    "Question {}: attempt {} timed out after {}s",
                    question.index,
                    attempt + 1,
                    config.api_timeout_secs
                );
                last_was_timeout = true;
            }
        }
    }

    // All retries exhausted
    let duration = start.elapsed();
    let error = if last_was_timeout {
        AnswerError::Timeout {
            question: question.index,
            secs: config.api_timeout_secs,
        }
    } else {
        AnswerError::LlmFailed {
            question: question.index,
            retries: config.max_retries as u8,
            detail: last_err.unwrap_or_else(|| "Unknown error".to_string()),
        }
    };

    AnswerResult {
        question_index: question.index,
        answer: String::new(),
        skipped: false,
        input_tokens: 0,
        output_tokens: 0,
        duration_ms: duration.as_millis() as u64,
        retries: config.max_retries as u8,
        error: Some(error),
    }
}

/// Build `CompletionOptions` from the extraction config.
fn build_options(config: &ExtractionConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(config.temperature),
        max_tokens: Some(config.max_tokens),
        ..Default::default()
    }
}
