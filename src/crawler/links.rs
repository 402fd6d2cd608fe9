//! Link extraction
//!
//! Pulls hyperlink targets out of a raw content blob and normalizes them into
//! addresses. Extraction never fails: targets that cannot be resolved, or that
//! point outside the http(s) family, are skipped silently. Scope filtering is
//! left to the caller (see [`LinkScope`](crate::url::LinkScope)).

use crate::url::Address;
use scraper::{Html, Selector};
use std::collections::BTreeSet;

/// Schemes that never name a fetchable page
const SKIPPED_PREFIXES: &[&str] = &["javascript:", "mailto:", "tel:", "data:"];

/// Extracts every distinct hyperlink target from an HTML blob
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` anywhere in the document, resolved against `base`
/// - Fragment-only anchors, which resolve to `base` itself
///
/// **Exclude:**
/// - `<a href="..." download>`
/// - Empty hrefs
/// - `javascript:`, `mailto:`, `tel:` and `data:` targets
/// - Anything that does not resolve to an http(s) address with a host
///
/// # Example
///
/// ```
/// use sumi_harvest::crawler::extract_links;
/// use sumi_harvest::Address;
///
/// let base = Address::parse("https://example.com/docs/").unwrap();
/// let html = r#"<a href="intro#top">Intro</a><a href="intro">Again</a>"#;
///
/// let links = extract_links(&base, html);
/// assert_eq!(links.len(), 1);
/// assert!(links.contains(&Address::parse("https://example.com/docs/intro").unwrap()));
/// ```
pub fn extract_links(base: &Address, html: &str) -> BTreeSet<Address> {
    let document = Html::parse_document(html);
    let mut links = BTreeSet::new();

    let Ok(selector) = Selector::parse("a[href]") else {
        return links;
    };

    for element in document.select(&selector) {
        if element.value().attr("download").is_some() {
            continue;
        }

        if let Some(address) = element.value().attr("href").and_then(|href| resolve_link(base, href)) {
            links.insert(address);
        }
    }

    links
}

/// Returns the trimmed `<title>` text of an HTML blob
pub fn extract_title(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("title").ok()?;

    document
        .select(&selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

fn resolve_link(base: &Address, href: &str) -> Option<Address> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if SKIPPED_PREFIXES.iter().any(|prefix| lower.starts_with(prefix)) {
        return None;
    }

    Address::resolve(base, href).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Address {
        Address::parse("https://example.com/page").unwrap()
    }

    fn addr(s: &str) -> Address {
        Address::parse(s).unwrap()
    }

    #[test]
    fn test_extract_title() {
        let html = r#"<html><head><title>Test Page</title></head><body></body></html>"#;
        assert_eq!(extract_title(html), Some("Test Page".to_string()));
    }

    #[test]
    fn test_extract_title_with_whitespace() {
        let html = r#"<html><head><title>  Test Page  </title></head><body></body></html>"#;
        assert_eq!(extract_title(html), Some("Test Page".to_string()));
    }

    #[test]
    fn test_no_title() {
        assert_eq!(extract_title("<html><head></head><body></body></html>"), None);
    }

    #[test]
    fn test_extract_absolute_link() {
        let links = extract_links(&base(), r#"<a href="https://other.com/page">Link</a>"#);
        assert_eq!(links.into_iter().collect::<Vec<_>>(), vec![addr("https://other.com/page")]);
    }

    #[test]
    fn test_extract_relative_links() {
        let html = r#"<a href="/other">A</a><a href="sibling">B</a><a href="../up">C</a>"#;
        let links = extract_links(&addr("https://example.com/dir/page"), html);
        assert!(links.contains(&addr("https://example.com/other")));
        assert!(links.contains(&addr("https://example.com/dir/sibling")));
        assert!(links.contains(&addr("https://example.com/up")));
        assert_eq!(links.len(), 3);
    }

    #[test]
    fn test_fragments_collapse() {
        let html = r##"
            <a href="/a#one">1</a>
            <a href="/a#two">2</a>
            <a href="https://example.com/a">3</a>
        "##;
        let links = extract_links(&base(), html);
        assert_eq!(links.len(), 1);
        assert!(links.contains(&addr("https://example.com/a")));
    }

    #[test]
    fn test_fragment_only_resolves_to_base() {
        let links = extract_links(&base(), r##"<a href="#section">Jump</a>"##);
        assert_eq!(links.into_iter().collect::<Vec<_>>(), vec![base()]);
    }

    #[test]
    fn test_skip_special_schemes() {
        let html = r#"
            <a href="javascript:void(0)">js</a>
            <a href="JavaScript:alert(1)">js</a>
            <a href="mailto:test@example.com">mail</a>
            <a href="tel:+1234567890">tel</a>
            <a href="data:text/html,<h1>x</h1>">data</a>
            <a href="ftp://example.com/file">ftp</a>
            <a href="file:///etc/passwd">file</a>
        "#;
        assert!(extract_links(&base(), html).is_empty());
    }

    #[test]
    fn test_skip_download_and_empty() {
        let html = r#"<a href="/file.pdf" download>Download</a><a href="">Empty</a><a href="   ">Blank</a>"#;
        assert!(extract_links(&base(), html).is_empty());
    }

    #[test]
    fn test_malformed_targets_skipped() {
        let html = r#"<a href="http://">bad</a><a href="https://[::1">bad</a><a href="/ok">ok</a>"#;
        let links = extract_links(&base(), html);
        assert_eq!(links.into_iter().collect::<Vec<_>>(), vec![addr("https://example.com/ok")]);
    }

    #[test]
    fn test_follow_nofollow_links() {
        let links = extract_links(&base(), r#"<a href="/page" rel="nofollow">Link</a>"#);
        assert!(links.contains(&addr("https://example.com/page")));
    }

    #[test]
    fn test_links_in_chrome_are_still_found() {
        // Extraction reads raw content, so navigation links count
        let html = r#"<nav><a href="/nav-target">Nav</a></nav><footer><a href="/footer">F</a></footer>"#;
        assert_eq!(extract_links(&base(), html).len(), 2);
    }

    #[test]
    fn test_mixed_valid_and_invalid_links() {
        let html = r#"
            <a href="/valid">Valid</a>
            <a href="javascript:alert('no')">Invalid</a>
            <a href="mailto:test@example.com">Invalid</a>
            <a href="/another-valid">Valid</a>
            <a href="/valid">Duplicate</a>
        "#;
        assert_eq!(extract_links(&base(), html).len(), 2);
    }
}
