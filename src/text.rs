use once_cell::sync::Lazy;
use regex::Regex;

/// Characters the models are told to avoid and that never reach the display.
pub const FORBIDDEN_CHARS: [char; 4] = ['#', '*', '\'', '`'];

static MARKUP_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<[^>]*>").expect("markup tag pattern is valid"));

/// Remove every forbidden character, then trim surrounding whitespace.
pub fn clean(text: &str) -> String {
    text.chars()
        .filter(|c| !FORBIDDEN_CHARS.contains(c))
        .collect::<String>()
        .trim()
        .to_string()
}

/// Drop display markup so the text can go to a plain-text sink (copy).
pub fn strip_markup(text: &str) -> String {
    MARKUP_TAG.replace_all(text, "").into_owned()
}

/// Escape the characters Telegram HTML treats as markup.
pub fn escape_markup(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
