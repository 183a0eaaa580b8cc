//! Output types: extracted question blocks, answers, stats, and metadata.
//!
//! Everything here is plain serialisable data. [`ExtractionOutput`] is what
//! the `extract*` functions return; [`AnswerOutput`] is what `answer*`
//! returns. Both keep per-item detail (line spans, token counts, per-question
//! errors) so callers can audit a run instead of trusting a summary.

use crate::error::{AnswerError, Pdf2KravError};
use serde::{Deserialize, Serialize};

/// Placeholder answer for questions that request a file attachment.
///
/// A text completion cannot attach anything, so these questions are never
/// sent to the provider.
pub const SKIPPED_ANSWER: &str = "-";

// ── Extraction ───────────────────────────────────────────────────────────

/// One extracted requirement item.
///
/// `text` is the full trimmed block; by convention its first line is the
/// question title and the remaining lines are the body. The line span refers
/// to the cleaned line sequence the segmenter ran over (0-based, inclusive),
/// which makes the document-order invariant observable: blocks never overlap
/// and their spans increase strictly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionBlock {
    /// 1-based ordinal in document order.
    pub index: usize,
    /// Index of the block's first line in the cleaned line sequence.
    pub start_line: usize,
    /// Index of the block's last line (the end-sentinel line).
    pub end_line: usize,
    /// Full trimmed text of the block.
    pub text: String,
}

impl QuestionBlock {
    /// The question title: the block's first line.
    pub fn title(&self) -> &str {
        self.text.lines().next().unwrap_or("")
    }

    /// The question body: everything after the first line, trimmed.
    ///
    /// Empty for single-line blocks.
    pub fn body(&self) -> &str {
        self.text
            .split_once('\n')
            .map(|(_, rest)| rest.trim())
            .unwrap_or("")
    }
}

/// Document metadata read from the PDF, without running the pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub page_count: usize,
    pub pdf_version: Option<String>,
}

/// Counters and timings for one extraction run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionStats {
    /// Pages the renderer produced text for.
    pub total_pages: usize,
    /// Pages whose recurring first line was stripped as a header.
    pub headers_stripped: usize,
    /// Pages whose recurring last line was stripped as a footer.
    pub footers_stripped: usize,
    /// Lines in the cleaned sequence fed to the segmenter.
    pub cleaned_lines: usize,
    /// Question blocks emitted.
    pub questions_found: usize,
    /// Wall-clock time spent in pdfium text extraction.
    pub render_duration_ms: u64,
    /// Wall-clock time for the whole run, input resolution included.
    pub total_duration_ms: u64,
}

/// Complete result of one extraction run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionOutput {
    /// Extracted question blocks in document order.
    pub questions: Vec<QuestionBlock>,
    /// Metadata of the source document.
    pub metadata: DocumentMetadata,
    /// Run counters and timings.
    pub stats: ExtractionStats,
}

impl ExtractionOutput {
    /// Serialise the question list to its text-file form:
    /// `"Question:\n"` + block text per block, blocks separated by one blank
    /// line. An empty question list serialises to an empty string.
    pub fn to_text(&self) -> String {
        self.questions
            .iter()
            .map(|q| format!("Question:\n{}", q.text))
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

// ── Answering ────────────────────────────────────────────────────────────

/// Outcome of answering a single question.
///
/// `error` is `Some` when the call failed after all retries; the run carries
/// on with the remaining questions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerResult {
    /// 1-based ordinal of the question ([`QuestionBlock::index`]).
    pub question_index: usize,
    /// Answer text; [`SKIPPED_ANSWER`] for attachment questions, empty when
    /// the call failed.
    pub answer: String,
    /// True when the question requested an attachment and was never sent.
    pub skipped: bool,
    /// Prompt tokens billed for this question.
    pub input_tokens: usize,
    /// Completion tokens billed for this question.
    pub output_tokens: usize,
    /// Wall-clock time for this question, retries included.
    pub duration_ms: u64,
    /// Retries consumed (0 = first attempt succeeded).
    pub retries: u8,
    /// Failure detail, if the question could not be answered.
    pub error: Option<AnswerError>,
}

impl AnswerResult {
    /// Placeholder result for an attachment question (never sent to the
    /// provider).
    pub fn skipped(question_index: usize) -> Self {
        Self {
            question_index,
            answer: SKIPPED_ANSWER.to_string(),
            skipped: true,
            input_tokens: 0,
            output_tokens: 0,
            duration_ms: 0,
            retries: 0,
            error: None,
        }
    }

    /// True when the provider produced an answer for this question.
    pub fn is_answered(&self) -> bool {
        !self.skipped && self.error.is_none()
    }
}

/// Counters and timings for one answering run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnswerStats {
    /// Questions submitted to the run (after `answer_limit`).
    pub total_questions: usize,
    /// Questions the provider answered.
    pub answered: usize,
    /// Attachment questions answered with the placeholder.
    pub skipped: usize,
    /// Questions that failed after all retries.
    pub failed: usize,
    pub total_input_tokens: u64,
    pub total_output_tokens: u64,
    /// Wall-clock time for the whole answering run.
    pub total_duration_ms: u64,
}

/// Complete result of one answering run, in document order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerOutput {
    pub answers: Vec<AnswerResult>,
    pub stats: AnswerStats,
}

impl AnswerOutput {
    /// Treat any per-question failure as fatal.
    ///
    /// Returns [`Pdf2KravError::PartialFailure`] if at least one question
    /// failed, otherwise passes `self` through unchanged.
    pub fn into_result(self) -> Result<Self, Pdf2KravError> {
        if self.stats.failed > 0 {
            return Err(Pdf2KravError::PartialFailure {
                answered: self.stats.answered,
                failed: self.stats.failed,
                total: self.stats.total_questions,
            });
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(index: usize, text: &str) -> QuestionBlock {
        QuestionBlock {
            index,
            start_line: index * 10,
            end_line: index * 10 + 2,
            text: text.to_string(),
        }
    }

    #[test]
    fn title_is_first_line_body_is_rest() {
        let q = block(1, "1.5 Miljökrav\nBeskriv ert miljöarbete.\n  Fritext");
        assert_eq!(q.title(), "1.5 Miljökrav");
        assert_eq!(q.body(), "Beskriv ert miljöarbete.\n  Fritext");
    }

    #[test]
    fn single_line_block_has_empty_body() {
        let q = block(1, "2. Systematiskt miljöarbete");
        assert_eq!(q.title(), "2. Systematiskt miljöarbete");
        assert_eq!(q.body(), "");
    }

    #[test]
    fn to_text_matches_file_form() {
        let output = ExtractionOutput {
            questions: vec![block(1, "1. Första\nInnehåll"), block(2, "2. Andra")],
            metadata: DocumentMetadata::default(),
            stats: ExtractionStats::default(),
        };
        assert_eq!(
            output.to_text(),
            "Question:\n1. Första\nInnehåll\n\nQuestion:\n2. Andra"
        );
    }

    #[test]
    fn to_text_of_empty_extraction_is_empty() {
        let output = ExtractionOutput {
            questions: vec![],
            metadata: DocumentMetadata::default(),
            stats: ExtractionStats::default(),
        };
        assert_eq!(output.to_text(), "");
    }

    #[test]
    fn skipped_result_uses_placeholder() {
        let r = AnswerResult::skipped(3);
        assert_eq!(r.answer, SKIPPED_ANSWER);
        assert!(r.skipped);
        assert!(!r.is_answered());
        assert!(r.error.is_none());
    }

    #[test]
    fn into_result_passes_clean_runs() {
        let output = AnswerOutput {
            answers: vec![],
            stats: AnswerStats {
                total_questions: 2,
                answered: 2,
                ..AnswerStats::default()
            },
        };
        assert!(output.into_result().is_ok());
    }

    #[test]
    fn into_result_rejects_partial_failure() {
        let output = AnswerOutput {
            answers: vec![],
            stats: AnswerStats {
                total_questions: 3,
                answered: 2,
                failed: 1,
                ..AnswerStats::default()
            },
        };
        let err = output.into_result().unwrap_err();
        assert!(matches!(err, Pdf2KravError::PartialFailure { failed: 1, .. }));
    }
}
