//! Splits a free-form model answer into summary and suggestions.
//!
//! The answer is scanned for two heading markers. Matching is case-insensitive and
//! tolerates markdown decoration around the heading (`## **Section 2: ... (Actionable
//! Suggestions)**`). Parser failure is an ordinary outcome, not an error.

use once_cell::sync::Lazy;
use regex::Regex;

pub const SUMMARY_HEADING: &str = "Ringkasan Ulasan";
pub const SUGGESTIONS_HEADING: &str = "Saran Perbaikan";

/// Decoration that may precede a heading on its line: `#`, `*`, `>`, list dashes,
/// `Section 2:` / `Bagian 2:` or a `2.` numbering.
static HEADING_PREFIX_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^[\s#*_>\-]*(?:(?:section|bagian)\s*\d+\s*[:.\-]?|\d+[.)])?[\s#*_]*$")
        .expect("heading prefix regex")
});

/// Decoration that may follow a heading: closing `**`, a colon, a parenthesised
/// translation such as `(Review Summary)`. The parenthesis only counts as decoration
/// when a colon, `**` or the end of the line comes right after it.
static HEADING_SUFFIX_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^[ \t*_#:]*(?:\([^)\n]*\)[ \t_#]*(?::|\*\*|$))?[ \t*_#:]*")
        .expect("heading suffix regex")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedResponse {
    /// Both sections found. Either may still be empty text.
    Sections { summary: String, suggestions: String },
    /// Only the summary heading was present.
    SummaryOnly { summary: String },
    /// Neither heading was present.
    Unrecognized,
}

pub fn parse_response(text: &str) -> ParsedResponse {
    if let Some(pos) = find_heading(text, SUGGESTIONS_HEADING) {
        let before = &text[..heading_start(text, pos)];
        let after = &text[heading_end(text, pos + SUGGESTIONS_HEADING.len())..];

        let summary = strip_heading(before, SUMMARY_HEADING);
        return ParsedResponse::Sections {
            summary: clean_section(&summary),
            suggestions: clean_section(after),
        };
    }

    if find_heading(text, SUMMARY_HEADING).is_some() {
        return ParsedResponse::SummaryOnly {
            summary: clean_section(&strip_heading(text, SUMMARY_HEADING)),
        };
    }

    ParsedResponse::Unrecognized
}

/// Byte offset of the heading marker, ignoring ASCII case.
///
/// An occurrence that starts its line (after optional decoration) wins over an earlier
/// mention inside prose. Without one, the first occurrence anywhere is used.
fn find_heading(text: &str, heading: &str) -> Option<usize> {
    let lowered = text.to_ascii_lowercase();
    let needle = heading.to_ascii_lowercase();
    let mut first = None;
    for (pos, _) in lowered.match_indices(&needle) {
        if is_heading_position(text, pos) {
            return Some(pos);
        }
        first.get_or_insert(pos);
    }
    first
}

fn line_start(text: &str, marker: usize) -> usize {
    text[..marker].rfind('\n').map(|i| i + 1).unwrap_or(0)
}

fn is_heading_position(text: &str, marker: usize) -> bool {
    HEADING_PREFIX_RE.is_match(&text[line_start(text, marker)..marker])
}

/// Where the heading's line decoration starts. Falls back to the marker itself when
/// the text before it on the same line is real content.
fn heading_start(text: &str, marker: usize) -> usize {
    if is_heading_position(text, marker) {
        line_start(text, marker)
    } else {
        marker
    }
}

/// First byte after the heading's trailing decoration.
fn heading_end(text: &str, marker_end: usize) -> usize {
    let rest = &text[marker_end..];
    marker_end + HEADING_SUFFIX_RE.find(rest).map(|m| m.end()).unwrap_or(0)
}

fn strip_heading(text: &str, heading: &str) -> String {
    match find_heading(text, heading) {
        Some(pos) => {
            let start = heading_start(text, pos);
            let end = heading_end(text, pos + heading.len());
            format!("{}{}", &text[..start], &text[end..])
        }
        None => text.to_string(),
    }
}

/// Trim whitespace plus dangling separators (`---`, stray `**`) left by the split.
fn clean_section(text: &str) -> String {
    text.trim()
        .trim_end_matches(|c: char| c.is_whitespace() || matches!(c, '-' | '*' | '#' | '_' | '='))
        .trim()
        .to_string()
}
