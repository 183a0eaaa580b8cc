//! Page furniture detection: strip headers and footers that repeat across pages.
//!
//! ## Why fingerprints?
//!
//! Layout-preserving text extraction reproduces whatever sits at the top and
//! bottom of every page — document title, portal name, page numbers — as
//! ordinary lines. Those lines are noise to the segmenter, but they cannot be
//! recognised in isolation: nothing marks a line as a header except that the
//! *same* line keeps coming back on other pages.
//!
//! So detection is frequency-based. Each page contributes a short fingerprint
//! of its first and last line (first [`FINGERPRINT_CHARS`] characters, which
//! tolerates per-page variation like `"Sida 3 av 12"` vs `"Sida 4 av 12"`),
//! and a first/last line is stripped only when its fingerprint was seen on at
//! least two pages. A fingerprint occurring once is document content, not
//! furniture — so single-page documents are never mutilated.
//!
//! The tables are scoped to one document's page set; reusing them across
//! documents would let one document's furniture eat another's content.

use std::collections::HashMap;
use tracing::debug;

/// Fingerprint length in characters (not bytes — page text is Swedish).
pub const FINGERPRINT_CHARS: usize = 4;

/// Head/tail fingerprint frequency tables for one document.
///
/// Built once per document from every page's raw text, read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct PageFingerprints {
    heads: HashMap<String, usize>,
    tails: HashMap<String, usize>,
}

impl PageFingerprints {
    /// Collect fingerprints from every page of a document, in page order.
    pub fn collect<'a>(pages: impl IntoIterator<Item = &'a str>) -> Self {
        let mut prints = Self::default();
        for page in pages {
            prints.record(page);
        }
        prints
    }

    /// Record one page's head and tail fingerprints.
    ///
    /// The head is taken from the raw page text; the tail from the stripped
    /// content after the final newline (the whole page when it has none).
    fn record(&mut self, page: &str) {
        let head: String = page.chars().take(FINGERPRINT_CHARS).collect();
        let last_line = page.rsplit_once('\n').map(|(_, last)| last).unwrap_or(page);
        let tail: String = last_line.trim().chars().take(FINGERPRINT_CHARS).collect();
        *self.heads.entry(head).or_insert(0) += 1;
        *self.tails.entry(tail).or_insert(0) += 1;
    }

    /// True if the (trimmed) page text begins with a head fingerprint seen on
    /// at least two pages. Empty fingerprints never match: they would prefix
    /// every page.
    fn recurring_head(&self, page_text: &str) -> bool {
        self.heads
            .iter()
            .any(|(fp, &count)| count > 1 && !fp.is_empty() && page_text.starts_with(fp.as_str()))
    }

    /// True if the stripped last line begins with a tail fingerprint seen on
    /// at least two pages.
    fn recurring_tail(&self, last_line: &str) -> bool {
        self.tails
            .iter()
            .any(|(fp, &count)| count > 1 && !fp.is_empty() && last_line.starts_with(fp.as_str()))
    }
}

/// One page after furniture stripping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrippedPage {
    /// Cleaned page text, trimmed.
    pub text: String,
    /// The first line was dropped as a recurring header.
    pub header_dropped: bool,
    /// The last line was dropped as a recurring footer.
    pub footer_dropped: bool,
}

/// Strip a recurring header and/or footer line from one page.
///
/// Header first, then footer, each against the current state of the page, so
/// a two-line page consisting of furniture only collapses to nothing. A
/// single-line page whose text matches a recurring fingerprint also becomes
/// empty: there is nothing left once its only line goes.
pub fn strip_page_furniture(page: &str, prints: &PageFingerprints) -> StrippedPage {
    let mut text = page.trim();

    let header_dropped = prints.recurring_head(text);
    if header_dropped {
        text = text.split_once('\n').map(|(_, rest)| rest).unwrap_or("");
    }

    let (prior, last) = match text.rsplit_once('\n') {
        Some((prior, last)) => (prior, last),
        None => ("", text),
    };
    let footer_dropped = prints.recurring_tail(last.trim());
    if footer_dropped {
        text = prior;
    }

    StrippedPage {
        text: text.trim().to_string(),
        header_dropped,
        footer_dropped,
    }
}

/// The whole document as one cleaned line sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedDocument {
    /// All pages' cleaned lines, in document order.
    pub lines: Vec<String>,
    /// Pages that lost their first line to furniture stripping.
    pub headers_stripped: usize,
    /// Pages that lost their last line to furniture stripping.
    pub footers_stripped: usize,
}

/// Strip furniture from every page and join the result into one line
/// sequence (pages joined with a single newline).
pub fn normalize_document<'a>(
    pages: impl IntoIterator<Item = &'a str>,
    prints: &PageFingerprints,
) -> NormalizedDocument {
    let mut texts = Vec::new();
    let mut headers_stripped = 0;
    let mut footers_stripped = 0;

    for (page_num, page) in pages.into_iter().enumerate() {
        let stripped = strip_page_furniture(page, prints);
        if stripped.header_dropped {
            debug!(page = page_num + 1, "stripped recurring header");
            headers_stripped += 1;
        }
        if stripped.footer_dropped {
            debug!(page = page_num + 1, "stripped recurring footer");
            footers_stripped += 1;
        }
        texts.push(stripped.text);
    }

    let joined = texts.join("\n");
    NormalizedDocument {
        lines: joined.lines().map(str::to_string).collect(),
        headers_stripped,
        footers_stripped,
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
