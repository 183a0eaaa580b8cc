//! Question segmentation: group cleaned lines into question blocks.
//!
//! ## How blocks are found
//!
//! The questionnaire gives no explicit block structure, but two cues survive
//! layout extraction: every question begins with a numbered heading
//! (`"1.5.6 …"`, start pattern) and ends with an answer-type trailer line
//! (`"  Ja/Nej."`, end sentinel). Headings alone are unreliable — section
//! headings without questions use the same numbering — so the scan is
//! anchored on the sentinels: walk the lines forward, and each time a
//! sentinel line is hit, walk *backward* to the nearest heading line and emit
//! everything in between (heading and sentinel included) as one block.
//!
//! The backward walk is bounded by the previous block's end line, so blocks
//! never overlap and stay in document order. Content after the last sentinel
//! is dropped: a trailing fragment without an answer type is not a question.
//!
//! A window with no heading line at all is emitted whole rather than
//! discarded — an oversized block reaching back to the previous boundary.
//! That trades precision for recall: the question is recovered, padded with
//! whatever preamble sat above it.

use crate::lexicon::Lexicon;
use crate::output::QuestionBlock;
use tracing::{debug, warn};

/// Segment the cleaned line sequence into question blocks.
///
/// Block spans (`start_line..=end_line`) index into `lines` and cover the
/// collected window; the block text is the joined window, trimmed, so a
/// blank edge line can be absent from the text while inside the span.
pub fn segment_questions(lines: &[String], lexicon: &Lexicon) -> Vec<QuestionBlock> {
    let mut blocks = Vec::new();
    // Index of the last line consumed by the previous block.
    let mut boundary: Option<usize> = None;

    for (i, line) in lines.iter().enumerate() {
        let Some(sentinel) = lexicon.matching_end_sentinel(line) else {
            continue;
        };

        let floor = boundary.map_or(0, |b| b + 1);
        let mut collected: Vec<&str> = Vec::new();
        let mut found_start = false;
        for j in (floor..=i).rev() {
            collected.push(lines[j].as_str());
            if lexicon.matches_start(&lines[j]) {
                found_start = true;
                break;
            }
        }

        let start_line = i + 1 - collected.len();
        collected.reverse();
        let text = collected.join("\n").trim().to_string();
        let index = blocks.len() + 1;

        if !found_start {
            warn!(
                block = index,
                start_line,
                end_line = i,
                "no heading line in scan window, emitting whole window"
            );
        }
        debug!(block = index, sentinel, start_line, end_line = i, "question block");

        blocks.push(QuestionBlock {
            index,
            start_line,
            end_line: i,
            text,
        });
        boundary = Some(i);
    }

    blocks
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(texts: &[&str]) -> Vec<String> {
        texts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn blocks_run_from_heading_to_sentinel() {
        let input = lines(&[
            "1. Fråga om miljö",
            "Något innehåll",
            "  Ja/Nej.",
            "1.1 Annan fråga",
            "Mer text",
            "  Fritext",
        ]);
        let blocks = segment_questions(&input, &Lexicon::default());
        assert_eq!(blocks.len(), 2);

        assert_eq!(blocks[0].title(), "1. Fråga om miljö");
        assert_eq!(blocks[0].body(), "Något innehåll\n  Ja/Nej.");
        assert_eq!((blocks[0].start_line, blocks[0].end_line), (0, 2));

        assert_eq!(blocks[1].title(), "1.1 Annan fråga");
        assert_eq!(blocks[1].body(), "Mer text\n  Fritext");
        assert_eq!((blocks[1].start_line, blocks[1].end_line), (3, 5));
        assert_eq!((blocks[0].index, blocks[1].index), (1, 2));
    }

    #[test]
    fn no_sentinel_means_no_blocks() {
        let input = lines(&["1. Fråga utan svarstyp", "bara text", "2. Ännu en rubrik"]);
        let blocks = segment_questions(&input, &Lexicon::default());
        assert!(blocks.is_empty());
    }

    #[test]
    fn trailing_content_without_sentinel_is_dropped() {
        let input = lines(&[
            "1. Fråga",
            "  Bifogad fil",
            "2. Påbörjad fråga",
            "som aldrig avslutas",
        ]);
        let blocks = segment_questions(&input, &Lexicon::default());
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].text, "1. Fråga\n  Bifogad fil");
    }

    #[test]
    fn window_without_heading_becomes_oversized_block() {
        // Known degradation: with no heading to stop at, the walk reaches the
        // previous boundary and the whole window is emitted as one block.
        let input = lines(&["ingress utan rubrik", "mer ingress", "  Fritext"]);
        let blocks = segment_questions(&input, &Lexicon::default());
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].text, "ingress utan rubrik\nmer ingress\n  Fritext");
        assert_eq!((blocks[0].start_line, blocks[0].end_line), (0, 2));
    }

    #[test]
    fn indented_heading_does_not_stop_the_walk() {
        let input = lines(&[" 2. Något", "innehåll", "  Fritext"]);
        let blocks = segment_questions(&input, &Lexicon::default());
        // " 2. Något" has leading whitespace, so it is not a heading; the
        // walk falls back to the whole window.
        assert_eq!(blocks.len(), 1);
        assert_eq!((blocks[0].start_line, blocks[0].end_line), (0, 2));
    }

    #[test]
    fn boundary_stops_the_next_backward_walk() {
        let input = lines(&["1. Fråga", "  Ja/Nej.", "  Fritext"]);
        let blocks = segment_questions(&input, &Lexicon::default());
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].text, "1. Fråga\n  Ja/Nej.");
        // The second walk may not reach past line 1; it sees only line 2.
        assert_eq!(blocks[1].text, "Fritext");
        assert_eq!((blocks[1].start_line, blocks[1].end_line), (2, 2));
    }

    #[test]
    fn sentinel_on_first_line_is_a_block_of_one() {
        let input = lines(&["  Ja/Nej."]);
        let blocks = segment_questions(&input, &Lexicon::default());
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].text, "Ja/Nej.");
        assert_eq!((blocks[0].start_line, blocks[0].end_line), (0, 0));
    }

    #[test]
    fn spans_increase_strictly_across_blocks() {
        let input = lines(&[
            "1. Första",
            "  Fritext",
            "mellanliggande skräp",
            "2. Andra",
            "innehåll",
            "  Ja/Nej.",
            "3. Tredje",
            "  Bifogad fil",
        ]);
        let blocks = segment_questions(&input, &Lexicon::default());
        assert_eq!(blocks.len(), 3);
        for pair in blocks.windows(2) {
            assert!(pair[0].end_line < pair[1].start_line);
        }
        for block in &blocks {
            assert!(block.start_line <= block.end_line);
        }
    }

    #[test]
    fn heading_line_is_collected_inclusively() {
        // An inline answer-type mention is not a sentinel; only the real
        // trailer line ends the block.
        let input = lines(&["spill", "1. Fråga  Ja/Nej-aktig", "  Fritext"]);
        let blocks = segment_questions(&input, &Lexicon::default());
        assert_eq!(blocks.len(), 1);
        // Walk from line 2 stops at line 1 (heading); line 0 is excluded.
        assert_eq!(blocks[0].text, "1. Fråga  Ja/Nej-aktig\n  Fritext");
        assert_eq!((blocks[0].start_line, blocks[0].end_line), (1, 2));
    }
}
