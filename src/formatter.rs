use once_cell::sync::Lazy;
use regex::Regex;

use crate::text::{clean, escape_markup};

pub const TITLE_OPEN: &str = "<b>";
pub const TITLE_CLOSE: &str = "</b>";
pub const KEYWORD_OPEN: &str = "<i>";
pub const KEYWORD_CLOSE: &str = "</i>";

/// Structural words that get keyword emphasis wherever they appear as a whole word.
///
/// Short ordinals like "First" will also fire in ordinary prose; the list is
/// kept as-is.
pub const KEYWORDS: &[&str] = &[
    "Important", "Key Point", "Note", "Conclusion", "Summary", "Introduction",
    "Therefore", "However", "Moreover", "Furthermore", "In conclusion", "To summarize",
    "Dear", "Respected", "Subject", "Date", "Sincerely", "Yours", "Main Point",
    "First", "Second", "Third", "Finally", "Body", "Opening", "Closing",
    "Arguments", "Counter", "Rebuttal", "Evidence", "Example", "Result",
    "HOOK", "INTRO", "INTRODUCTION", "MAIN CONTENT", "CALL TO ACTION", "OUTRO",
    "Paragraph", "Para", "Section",
];

static KEYWORD_PATTERN: Lazy<Regex> = Lazy::new(|| {
    // Case-insensitive duplicates collapse; longer phrases win at the same position.
    let mut terms: Vec<String> = Vec::new();
    for keyword in KEYWORDS {
        if !terms.iter().any(|t| t.eq_ignore_ascii_case(keyword)) {
            terms.push(keyword.to_string());
        }
    }
    terms.sort_by(|a, b| b.len().cmp(&a.len()));

    let alternation = terms
        .iter()
        .map(|t| regex::escape(t))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"(?i)\b(?:{})\b", alternation)).expect("keyword pattern is valid")
});

/// Clean the text and mark it up for display.
///
/// The first non-empty line is wrapped as the title and every keyword match
/// keeps its original casing inside the emphasis marker. Source text is not
/// escaped; use [`format_output_html`] for anything sent as HTML.
pub fn format_output(text: &str) -> String {
    mark_up(&clean(text))
}

/// Same as [`format_output`], but escapes markup-significant characters of the
/// cleaned text before any emphasis is added.
pub fn format_output_html(text: &str) -> String {
    // Escaping adds no forbidden characters, so the second clean is a no-op.
    format_output(&escape_markup(&clean(text)))
}

fn mark_up(cleaned: &str) -> String {
    if cleaned.is_empty() {
        return String::new();
    }

    let title_index = cleaned.split('\n').position(|line| !line.trim().is_empty());

    cleaned
        .split('\n')
        .enumerate()
        .map(|(i, line)| {
            let emphasized = emphasize_keywords(line);
            if Some(i) == title_index {
                format!("{}{}{}", TITLE_OPEN, emphasized, TITLE_CLOSE)
            } else {
                emphasized
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn emphasize_keywords(line: &str) -> String {
    KEYWORD_PATTERN
        .replace_all(line, |caps: &regex::Captures| {
            format!("{}{}{}", KEYWORD_OPEN, &caps[0], KEYWORD_CLOSE)
        })
        .into_owned()
}
