//! Domain extraction from free-form text.
//!
//! Pasted input is rarely a clean list: it mixes prose, URLs, punctuation and
//! repeats. [`extract_domains`] pulls out every domain-like token and keeps the
//! first occurrence of each, in order.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use url::Url;

/// A domain token as typed by the user, optionally with a path.
///
/// Matching is exact and case-sensitive; nothing is resolved via DNS.
pub type Domain = String;

/// Google web search endpoint used for the human-facing `site:` link.
const GOOGLE_SEARCH_URL: &str = "https://www.google.com/search";

// One or more label segments, a final alphabetic label of 2+ chars,
// then an optional path running up to the next whitespace.
static DOMAIN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b((?:[a-zA-Z0-9-]+\.)+[a-zA-Z]{2,}(?:/[^\s]*)?)\b")
        .expect("Invalid regex")
});

/// Extracts unique domain-like tokens from `text` in first-seen order.
pub fn extract_domains(text: &str) -> Vec<Domain> {
    let mut seen = HashSet::new();
    DOMAIN_RE
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .filter(|d| seen.insert(*d))
        .map(str::to_string)
        .collect()
}

/// Splits already-filtered input into one domain per line.
///
/// Blank lines are dropped and surrounding whitespace trimmed; duplicates are
/// kept because the batch runner skips them via the cache anyway.
pub fn split_lines(text: &str) -> Vec<Domain> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

/// Returns the Google search URL for `site:<domain>`.
pub fn site_search_url(domain: &str) -> String {
    let query = format!("site:{domain}");
    match Url::parse_with_params(GOOGLE_SEARCH_URL, &[("q", query.as_str())]) {
        Ok(url) => url.to_string(),
        Err(_) => format!("{GOOGLE_SEARCH_URL}?q={query}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_dedups_in_order() {
        let text = "visit example.com/page and also news.example.org twice: news.example.org";
        assert_eq!(
            extract_domains(text),
            vec!["example.com/page".to_string(), "news.example.org".to_string()]
        );
    }

    #[test]
    fn test_extract_ignores_plain_words() {
        assert!(extract_domains("nothing to see here, move along").is_empty());
        assert!(extract_domains("version 1.2 and file.x").is_empty());
    }

    #[test]
    fn test_extract_trailing_punctuation() {
        let domains = extract_domains("See my-site.co.uk. Also (other.io), thanks");
        assert_eq!(domains, vec!["my-site.co.uk", "other.io"]);
    }

    #[test]
    fn test_extract_is_case_sensitive() {
        let domains = extract_domains("Example.com example.com");
        assert_eq!(domains, vec!["Example.com", "example.com"]);
    }

    #[test]
    fn test_extract_from_urls() {
        let domains = extract_domains("https://blog.example.com/posts/1\nhttp://shop.test.net");
        assert_eq!(domains, vec!["blog.example.com/posts/1", "shop.test.net"]);
    }

    #[test]
    fn test_split_lines() {
        let lines = split_lines("  a.com \n\n b.com\n");
        assert_eq!(lines, vec!["a.com", "b.com"]);
    }

    #[test]
    fn test_site_search_url() {
        let url = site_search_url("example.com");
        assert!(url.starts_with("https://www.google.com/search?q="));
        assert!(url.contains("example.com"));
    }
}
