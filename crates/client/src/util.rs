//! Small shared helpers: URL-to-title conversion, fragment extraction, and
//! heading/anchor normalization.

use percent_encoding::percent_decode_str;
use url::Url;

/// Percent-decode, falling back to the input on invalid escapes.
pub fn safe_decode(s: &str) -> String {
    percent_decode_str(s)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| s.to_string())
}

/// Convert a wiki URL to a page title (decoded, no fragment).
///
/// Handles `/wiki/Title` paths, `?title=` query parameters, and degrades to
/// the last path segment for anything else.
pub fn url_to_title(raw: &str) -> String {
    if let Ok(parsed) = Url::parse(raw) {
        if let Some(rest) = parsed.path().strip_prefix("/wiki/") {
            return strip_fragment(&safe_decode(rest));
        }
        if let Some((_, title)) = parsed.query_pairs().find(|(key, _)| key == "title") {
            return strip_fragment(&title);
        }
    }
    let tail = raw.split('/').next_back().unwrap_or("");
    strip_fragment(&safe_decode(tail)).replace('_', " ")
}

fn strip_fragment(s: &str) -> String {
    s.split('#').next().unwrap_or("").to_string()
}

/// Extract the hash fragment from a URL (without the leading '#').
pub fn extract_fragment(raw: &str) -> Option<String> {
    Url::parse(raw)
        .ok()?
        .fragment()
        .filter(|f| !f.is_empty())
        .map(str::to_string)
}

/// Display-friendly title: decode percent escapes and swap underscores for
/// spaces.
pub fn display_title(title: &str) -> String {
    safe_decode(title).replace('_', " ")
}

/// Normalize a heading for comparison: lowercase, separators to spaces,
/// en/em dashes to hyphens, punctuation stripped, whitespace collapsed.
pub fn normalize_heading(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.to_lowercase().chars() {
        match c {
            '_' | '-' | '/' => out.push(' '),
            '\u{2013}' | '\u{2014}' => out.push('-'),
            c if ('\u{2000}'..='\u{206F}').contains(&c) => {}
            c if c.is_alphanumeric() || c == '&' => out.push(c),
            c if c.is_whitespace() => out.push(' '),
            _ => {}
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_to_title_wiki_path() {
        assert_eq!(url_to_title("https://en.wikipedia.org/wiki/Example"), "Example");
        assert_eq!(
            url_to_title("https://en.wikipedia.org/wiki/Example_Page#History"),
            "Example_Page"
        );
        assert_eq!(
            url_to_title("https://en.wikipedia.org/wiki/C%2B%2B"),
            "C++"
        );
    }

    #[test]
    fn test_url_to_title_query_param() {
        assert_eq!(
            url_to_title("https://en.wikipedia.org/w/index.php?title=Example&action=view"),
            "Example"
        );
    }

    #[test]
    fn test_url_to_title_fallback() {
        assert_eq!(url_to_title("Example_Page"), "Example Page");
    }

    #[test]
    fn test_extract_fragment() {
        assert_eq!(
            extract_fragment("https://en.wikipedia.org/wiki/Example#History").as_deref(),
            Some("History")
        );
        assert_eq!(extract_fragment("https://en.wikipedia.org/wiki/Example"), None);
        assert_eq!(extract_fragment("not a url"), None);
    }

    #[test]
    fn test_display_title() {
        assert_eq!(display_title("Example_Page"), "Example Page");
        assert_eq!(display_title("C%2B%2B"), "C++");
    }

    #[test]
    fn test_normalize_heading() {
        assert_eq!(normalize_heading("See_Also"), "see also");
        assert_eq!(normalize_heading("  Notes   and  References "), "notes and references");
        assert_eq!(normalize_heading("Notes/References"), "notes references");
        assert_eq!(normalize_heading("History\u{2014}overview"), "history-overview");
        assert_eq!(normalize_heading("R&D"), "r&d");
    }

}
