use crate::url::Address;

/// Extracts the lowercase host of an address
///
/// # Examples
///
/// ```
/// use sumi_harvest::url::{extract_domain, Address};
///
/// let address = Address::parse("https://Docs.Example.COM/guide").unwrap();
/// assert_eq!(extract_domain(&address), Some("docs.example.com".to_string()));
/// ```
pub fn extract_domain(address: &Address) -> Option<String> {
    address.host_str().map(|h| h.to_ascii_lowercase())
}

/// Checks a domain against an exact or `*.`-prefixed wildcard pattern
///
/// A wildcard pattern such as `*.example.com` covers the bare domain and
/// subdomains at any depth. Comparison ignores ASCII case.
///
/// # Examples
///
/// ```
/// use sumi_harvest::url::matches_wildcard;
///
/// assert!(matches_wildcard("example.com", "EXAMPLE.com"));
/// assert!(matches_wildcard("*.example.com", "example.com"));
/// assert!(matches_wildcard("*.example.com", "api.v2.example.com"));
/// assert!(!matches_wildcard("*.example.com", "myexample.com"));
/// ```
pub fn matches_wildcard(pattern: &str, domain: &str) -> bool {
    let pattern = pattern.to_ascii_lowercase();
    let domain = domain.to_ascii_lowercase();

    match pattern.strip_prefix("*.") {
        Some(base) => {
            domain == base
                || domain
                    .strip_suffix(base)
                    .map_or(false, |head| head.ends_with('.'))
        }
        None => domain == pattern,
    }
}
