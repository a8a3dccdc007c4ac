//! Escaping of issue titles for flowchart node labels.

/// HTML-escape `title` and then remove every encoded double quote, which the
/// flowchart syntax cannot carry even as an entity.
///
/// A quote opening a word (after a space) becomes `&ldquo;`, one closing a
/// word (before a space) becomes `&rdquo;`, any other becomes `'`.
#[must_use]
pub fn escape_label(title: &str) -> String {
    replace_quotes(&escape_html(title))
}

/// Escape `&`, `<`, `>`, `'` and `"` as HTML entities.
#[must_use]
pub fn escape_html(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&#34;"),
            '\'' => result.push_str("&#39;"),
            _ => result.push(c),
        }
    }
    result
}

const QUOTE: &str = "&#34;";

fn replace_quotes(escaped: &str) -> String {
    let mut result = String::with_capacity(escaped.len());
    let mut rest = escaped;
    while let Some(c) = rest.chars().next() {
        if let Some(tail) = rest.strip_prefix(' ').and_then(|r| r.strip_prefix(QUOTE)) {
            result.push_str(" &ldquo;");
            rest = tail;
        } else if let Some(tail) = rest.strip_prefix(QUOTE).and_then(|r| r.strip_prefix(' ')) {
            result.push_str("&rdquo; ");
            rest = tail;
        } else if let Some(tail) = rest.strip_prefix(QUOTE) {
            result.push('\'');
            rest = tail;
        } else {
            result.push(c);
            rest = &rest[c.len_utf8()..];
        }
    }
    result
}
