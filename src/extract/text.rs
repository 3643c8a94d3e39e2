//! Text clean-up shared by every extraction strategy.

/// Unescapes HTML entities and trims surrounding whitespace.
pub fn clean_text(raw: &str) -> String {
    html_escape::decode_html_entities(raw).trim().to_string()
}
