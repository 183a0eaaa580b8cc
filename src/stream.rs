//! Streaming answering API: emit answers as they complete.
//!
//! ## Why stream?
//!
//! Answering a full questionnaire takes many provider round-trips. A
//! streams-based API lets callers display answers immediately and wire up
//! progress reporting instead of staring at a silent run.
//!
//! Unlike the eager [`crate::extract::answer_questions`] which returns only
//! after every question finishes, [`answer_stream`] yields results via a
//! `Stream` as each completes. Results arrive in completion order, not
//! document order — sort by `question_index` if order matters.

use crate::config::ExtractionConfig;
use crate::error::{AnswerError, Pdf2KravError};
use crate::extract::{build_system_prompt, resolve_provider};
use crate::output::{AnswerResult, QuestionBlock};
use crate::pipeline::answer;
use futures::stream::{self, StreamExt};
use std::fmt;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio_stream::Stream;
use tracing::info;

/// A boxed stream of answer results.
pub struct AnswerStream(Pin<Box<dyn Stream<Item = Result<AnswerResult, AnswerError>> + Send>>);

impl fmt::Debug for AnswerStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AnswerStream")
    }
}

impl Stream for AnswerStream {
    type Item = Result<AnswerResult, AnswerError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.0.as_mut().poll_next(cx)
    }
}

/// Answer extracted questions, streaming results as they are ready.
///
/// Semantics match [`crate::extract::answer_questions`]: the company profile
/// is validated and wrapped into the system prompt, `answer_limit` caps the
/// question list, attachment questions come back as skipped placeholders.
/// The aggregate error policy differs: there is no `AllAnswersFailed`
/// collapse, each failed question surfaces as an `Err` item instead.
///
/// # Returns
/// - `Ok(AnswerStream)` — a stream of `Result<AnswerResult, AnswerError>`
/// - `Err(Pdf2KravError)` — fatal error (bad profile, no provider)
///
/// # Example
/// ```rust,no_run
/// use pdf2krav::{answer_stream, extract, ExtractionConfig};
/// use futures::StreamExt;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = ExtractionConfig::default();
/// let output = extract("upphandling.pdf", &config).await?;
/// let profile = std::fs::read_to_string("foretag.txt")?;
///
/// let mut answers = answer_stream(&output.questions, &profile, &config).await?;
/// while let Some(item) = answers.next().await {
///     match item {
///         Ok(a) => println!("Fråga {}: {}", a.question_index, a.answer),
///         Err(e) => eprintln!("Error: {e}"),
///     }
/// }
/// # Ok(())
/// # }
/// ```
pub async fn answer_stream(
    questions: &[QuestionBlock],
    company_profile: &str,
    config: &ExtractionConfig,
) -> Result<AnswerStream, Pdf2KravError> {
    let system_prompt = build_system_prompt(company_profile, config)?;

    let selected: Vec<QuestionBlock> = match config.answer_limit {
        Some(n) => questions.iter().take(n).cloned().collect(),
        None => questions.to_vec(),
    };
    info!(
        "Streaming answers for {} of {} questions",
        selected.len(),
        questions.len()
    );

    if selected.is_empty() {
        return Ok(AnswerStream(Box::pin(stream::empty())));
    }

    let provider = resolve_provider(config).await?;
    let concurrency = config.concurrency;
    let config_clone = config.clone();

    let s = stream::iter(selected.into_iter().map(move |question| {
        let provider = Arc::clone(&provider);
        let prompt = system_prompt.clone();
        let cfg = config_clone.clone();
        async move {
            let mut result = answer::answer_question(&provider, &question, &prompt, &cfg).await;
            match result.error.take() {
                None => Ok(result),
                Some(err) => Err(err),
            }
        }
    }))
    .buffer_unordered(concurrency);

    Ok(AnswerStream(Box::pin(s)))
}
