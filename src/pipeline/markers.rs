//! Inline right-margin marker relocation.
//!
//! ## Why markers end up mid-line
//!
//! The questionnaire layout carries a narrow right-hand column with per-item
//! annotations ("Obligatoriska krav", "Information", section names). Layout
//! extraction linearizes columns, so the annotation lands on the tail of the
//! content line it sat next to, separated by the column gap:
//!
//! ```text
//! Kravtext          Obligatoriska k...
//! ```
//!
//! This pass rewrites such lines: the annotation becomes its own label line
//! above the content (keeping the content line's indentation), the marker
//! text is removed from the content line, and the whitespace crater the
//! column left behind is collapsed.
//!
//! Rules are applied as a fold in lexicon order: each rule sees the line as
//! edited by the rules before it, and several rules may fire on one line,
//! each contributing a label. A marker at column 0 is never relocated — text
//! at the left edge is content, not a margin artefact (this also makes
//! emitted label lines immune to re-processing).

use crate::lexicon::Lexicon;
use tracing::debug;

/// Relocate inline margin markers in every line, in order.
///
/// Each source line yields its residual line, preceded by one label line per
/// matching rule with a non-empty label. Residuals are kept even when marker
/// removal leaves them empty, so line positions stay meaningful to a reader
/// comparing input and output.
pub fn relocate_margin_markers(lines: &[String], lexicon: &Lexicon) -> Vec<String> {
    let gap: String = " ".repeat(lexicon.gap_width);
    let mut out = Vec::with_capacity(lines.len());

    for (idx, line) in lines.iter().enumerate() {
        let mut current = line.clone();
        for rule in &lexicon.marker_rules {
            let Some(at) = current.find(rule.needle.as_str()) else {
                continue;
            };
            if at == 0 {
                continue;
            }
            if !rule.label.is_empty() {
                out.push(format!("{}{}", indentation(&current), rule.label));
            }
            debug!(line = idx + 1, marker = %rule.needle, "relocated inline marker");
            current.replace_range(at..at + rule.needle.len(), "");
            let trimmed_len = current.trim_end().len();
            current.truncate(trimmed_len);
            current = current.replace(gap.as_str(), " ");
        }
        out.push(current);
    }

    out
}

/// The leading whitespace of a line.
fn indentation(line: &str) -> &str {
    &line[..line.len() - line.trim_start().len()]
}

// ── Tests ────────────────────────────────────────────────────────────────────
