//! Document-template lexicon: the pattern tables the pipeline matches against.
//!
//! Procurement portals emit their questionnaires from one form template, so the
//! structural cues are fixed per template and per language: which inline
//! right-margin annotations occur ([`MarkerRule`]), how question headings are
//! numbered (`start_patterns`), and which answer-type trailers close a question
//! (`end_sentinels`). Bundling them in one [`Lexicon`] value keeps the pipeline
//! logic template-agnostic — supporting another portal or language means
//! supplying another `Lexicon`, not touching the pipeline.
//!
//! [`Lexicon::default`] is the Swedish procurement template this crate was
//! built against (TendSign-style layout, Swedish answer types).

use once_cell::sync::Lazy;
use regex::Regex;

/// Numbered-heading patterns for the default template: `1. `, `1.5 `,
/// `1.5.6 `, `1.5.6.7 ` — anchored at line start, no leading whitespace.
static SWEDISH_START_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![Regex::new(r"^(\d\.|\d\.\d|\d\.\d\.\d|\d\.\d\.\d\.\d) ").unwrap()]
});

/// Default width of the whitespace gap left behind where right-column text was
/// removed. Tied to the layout extractor's column spacing, hence configurable.
pub const DEFAULT_GAP_WIDTH: usize = 10;

/// One inline-marker relocation rule: where `needle` occurs mid-line, replace
/// it with a separate `label` line above the residual content.
///
/// An empty `label` removes the marker without emitting a label line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerRule {
    /// Literal substring to search for in each line.
    pub needle: String,
    /// Label emitted on its own line (with the source line's indentation),
    /// or empty to drop the marker silently.
    pub label: String,
}

impl MarkerRule {
    pub fn new(needle: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            needle: needle.into(),
            label: label.into(),
        }
    }
}

/// The complete pattern configuration for one document template.
///
/// Rules are ordered and order is load-bearing: marker rules are applied as a
/// fold over each line (an earlier rule's edit is visible to later rules), and
/// the first matching end sentinel wins.
#[derive(Debug, Clone)]
pub struct Lexicon {
    /// Inline right-margin markers, applied in order to every line.
    pub marker_rules: Vec<MarkerRule>,
    /// A line starting a question, e.g. `"1.5.6 Offentlighetsprincipen"`.
    pub start_patterns: Vec<Regex>,
    /// Literal, case-sensitive line prefixes closing a question, e.g.
    /// `"  Ja/Nej."`.
    pub end_sentinels: Vec<String>,
    /// Collapse runs of exactly this many spaces to one space after a marker
    /// is removed from a line.
    pub gap_width: usize,
}

impl Default for Lexicon {
    fn default() -> Self {
        Self::swedish_procurement()
    }
}

impl Lexicon {
    /// The Swedish procurement template: TendSign-style right-margin markers
    /// and the three Swedish answer-type trailers.
    pub fn swedish_procurement() -> Self {
        Self {
            marker_rules: vec![
                MarkerRule::new("Obligatoriska k...", "Obligatoriska krav"),
                MarkerRule::new("Generell del", "Generell del"),
                MarkerRule::new("     Information", "Information"),
                MarkerRule::new("Valfrihet vård- ...", ""),
                MarkerRule::new("Valfrihet inom ...", ""),
                MarkerRule::new("Gemensamma...", ""),
            ],
            start_patterns: SWEDISH_START_PATTERNS.clone(),
            end_sentinels: vec![
                "  Bifogad fil".to_string(),
                "  Fritext".to_string(),
                "  Ja/Nej.".to_string(),
            ],
            gap_width: DEFAULT_GAP_WIDTH,
        }
    }

    /// True if the line begins a question under any configured start pattern.
    ///
    /// Patterns are anchored (`^`), so leading whitespace never matches.
    pub fn matches_start(&self, line: &str) -> bool {
        self.start_patterns.iter().any(|re| re.is_match(line))
    }

    /// The first configured end sentinel that is a literal prefix of the
    /// line, if any.
    pub fn matching_end_sentinel(&self, line: &str) -> Option<&str> {
        self.end_sentinels
            .iter()
            .find(|sentinel| line.starts_with(sentinel.as_str()))
            .map(|s| s.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_pattern_matches_numbered_headings() {
        let lex = Lexicon::default();
        assert!(lex.matches_start("1.5.6 Offentlighetsprincipen/Sekretess"));
        assert!(lex.matches_start("1.6 Elektronisk avtalssignering"));
        assert!(lex.matches_start("2. Systematiskt miljöarbete"));
    }

    #[test]
    fn start_pattern_rejects_non_numbered_lines() {
        let lex = Lexicon::default();
        assert!(!lex.matches_start("a. Annat"));
        assert!(!lex.matches_start(" 2. Något"));
    }

    #[test]
    fn start_pattern_requires_literal_dots() {
        let lex = Lexicon::default();
        assert!(lex.matches_start("1.5 Krav på drift"));
        // A separator other than '.' is not a heading number.
        assert!(!lex.matches_start("1x5 Krav på drift"));
    }

    #[test]
    fn start_pattern_supports_four_levels() {
        let lex = Lexicon::default();
        assert!(lex.matches_start("1.2.3.4 Djupt nästlat krav"));
        assert!(!lex.matches_start("1.2.3.4.5 För djupt"));
    }

    #[test]
    fn end_sentinel_is_prefix_match() {
        let lex = Lexicon::default();
        assert_eq!(
            lex.matching_end_sentinel("  Ja/Nej. Besvaras av leverantör"),
            Some("  Ja/Nej.")
        );
        // Mid-line occurrence is not a sentinel.
        assert_eq!(lex.matching_end_sentinel("Något innehåll  Ja/Nej."), None);
        // Sentinels are indent-sensitive.
        assert_eq!(lex.matching_end_sentinel("Fritext"), None);
    }

    #[test]
    fn end_sentinels_checked_in_declaration_order() {
        let mut lex = Lexicon::default();
        lex.end_sentinels = vec!["  Ja".into(), "  Ja/Nej.".into()];
        // Both prefixes match; the first declared wins.
        assert_eq!(lex.matching_end_sentinel("  Ja/Nej."), Some("  Ja"));
    }

    #[test]
    fn custom_template_is_honoured() {
        let lex = Lexicon {
            marker_rules: vec![MarkerRule::new("[Mandatory]", "Mandatory")],
            start_patterns: vec![Regex::new(r"^Q\d+ ").unwrap()],
            end_sentinels: vec!["  Yes/No".into()],
            gap_width: 6,
        };
        assert!(lex.matches_start("Q12 Delivery times"));
        assert!(!lex.matches_start("1.2 Delivery times"));
        assert_eq!(lex.matching_end_sentinel("  Yes/No"), Some("  Yes/No"));
    }
}
