//! URL and domain de-duplication

use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

fn host_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^https?://([^/?#]+)(?:[/?#]|$)").expect("valid regex"))
}

/// Host part of an http(s) URL; anything else is returned unchanged
pub fn extract_domain(url: &str) -> &str {
    host_regex()
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .unwrap_or(url)
}

/// Anything with a URL can be de-duplicated
pub trait HasUrl {
    fn url(&self) -> &str;
}

impl HasUrl for crate::research::SearchResult {
    fn url(&self) -> &str {
        &self.url
    }
}

impl HasUrl for super::SearchHit {
    fn url(&self) -> &str {
        &self.url
    }
}

impl HasUrl for super::ImageHit {
    fn url(&self) -> &str {
        &self.url
    }
}

/// Keeps an item only when both its URL and its domain are unseen.
/// First occurrence wins, order is preserved.
pub fn deduplicate_by_domain_and_url<T: HasUrl>(items: Vec<T>) -> Vec<T> {
    let mut seen_urls: HashSet<String> = HashSet::new();
    let mut seen_domains: HashSet<String> = HashSet::new();

    items
        .into_iter()
        .filter(|item| {
            let url = item.url();
            let domain = extract_domain(url);
            if seen_urls.contains(url) || seen_domains.contains(domain) {
                return false;
            }
            seen_urls.insert(url.to_string());
            seen_domains.insert(domain.to_string());
            true
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::research::{SearchResult, StepKind};

    fn result(url: &str) -> SearchResult {
        SearchResult {
            source: StepKind::Web,
            title: url.to_string(),
            url: url.to_string(),
            content: String::new(),
            published_date: None,
        }
    }

    #[test]
    fn test_extract_domain() {
        assert_eq!(extract_domain("https://a.com/x"), "a.com");
        assert_eq!(extract_domain("http://sub.b.org?q=1"), "sub.b.org");
        assert_eq!(extract_domain("HTTPS://C.NET#frag"), "C.NET");
        assert_eq!(extract_domain("https://d.io"), "d.io");
    }

    #[test]
    fn test_extract_domain_falls_back_to_input() {
        assert_eq!(extract_domain("ftp://a.com/x"), "ftp://a.com/x");
        assert_eq!(extract_domain("not a url"), "not a url");
    }

    #[test]
    fn test_dedup_by_domain() {
        let items = vec![
            result("https://a.com/x"),
            result("https://a.com/y"),
            result("https://b.com/z"),
        ];
        let deduped = deduplicate_by_domain_and_url(items);
        let urls: Vec<&str> = deduped.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(urls, vec!["https://a.com/x", "https://b.com/z"]);
    }

    #[test]
    fn test_dedup_exact_url() {
        let items = vec![result("not-a-url"), result("not-a-url")];
        assert_eq!(deduplicate_by_domain_and_url(items).len(), 1);
    }

    #[test]
    fn test_dedup_empty() {
        assert!(deduplicate_by_domain_and_url::<SearchResult>(vec![]).is_empty());
    }
}
