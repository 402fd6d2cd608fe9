//! Scope filter for discovered links
//!
//! Extraction itself never restricts links; the crawler applies a [`LinkScope`]
//! built from the root address after normalization.

use crate::config::ScopeConfig;
use crate::url::{extract_domain, matches_wildcard, Address};
use std::collections::BTreeSet;

/// Decides which discovered addresses a crawl may follow
#[derive(Debug, Clone, Default)]
pub struct LinkScope {
    /// Host every link must share with the root (None = any host)
    root_host: Option<String>,

    /// Path prefix every link must start with (None = any path)
    path_prefix: Option<String>,

    /// Extra wildcard patterns accepted in addition to the root host
    allowed_domains: Vec<String>,
}

impl LinkScope {
    /// Builds the scope for a crawl rooted at `root`
    pub fn new(root: &Address, config: &ScopeConfig) -> Self {
        let root_host = if config.same_host {
            extract_domain(root)
        } else {
            None
        };

        let path_prefix = if config.same_path_prefix {
            Some(directory_prefix(root.path()).to_string())
        } else {
            None
        };

        Self {
            root_host,
            path_prefix,
            allowed_domains: config.allowed_domains.clone(),
        }
    }

    /// A scope that accepts every address
    pub fn unrestricted() -> Self {
        Self::default()
    }

    /// A scope restricted to the root's host
    pub fn same_host(root: &Address) -> Self {
        Self {
            root_host: extract_domain(root),
            ..Self::default()
        }
    }

    /// Returns true if the address is inside this scope
    pub fn allows(&self, address: &Address) -> bool {
        if let Some(root_host) = &self.root_host {
            let Some(host) = extract_domain(address) else {
                return false;
            };

            let host_ok = &host == root_host
                || self
                    .allowed_domains
                    .iter()
                    .any(|pattern| matches_wildcard(pattern, &host));

            if !host_ok {
                return false;
            }
        }

        match &self.path_prefix {
            Some(prefix) => address.path().starts_with(prefix.as_str()),
            None => true,
        }
    }

    /// Keeps only the in-scope addresses of a link set
    pub fn filter(&self, links: BTreeSet<Address>) -> BTreeSet<Address> {
        links.into_iter().filter(|link| self.allows(link)).collect()
    }
}

/// Returns the directory part of a path, up to and including its last `/`
fn directory_prefix(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[..=idx],
        None => "/",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(s: &str) -> Address {
        Address::parse(s).unwrap()
    }

    fn scope_config(same_host: bool, same_path_prefix: bool) -> ScopeConfig {
        ScopeConfig {
            same_host,
            same_path_prefix,
            allowed_domains: vec![],
        }
    }

    #[test]
    fn test_directory_prefix() {
        assert_eq!(directory_prefix("/docs/intro"), "/docs/");
        assert_eq!(directory_prefix("/docs/"), "/docs/");
        assert_eq!(directory_prefix("/"), "/");
        assert_eq!(directory_prefix(""), "/");
    }

    #[test]
    fn test_same_host_scope() {
        let scope = LinkScope::new(&addr("https://example.com/"), &scope_config(true, false));
        assert!(scope.allows(&addr("https://example.com/other")));
        assert!(scope.allows(&addr("http://EXAMPLE.com/x")));
        assert!(!scope.allows(&addr("https://other.com/")));
        assert!(!scope.allows(&addr("https://sub.example.com/")));
    }

    #[test]
    fn test_allowed_domains_extend_same_host() {
        let config = ScopeConfig {
            same_host: true,
            same_path_prefix: false,
            allowed_domains: vec!["*.example.com".to_string()],
        };
        let scope = LinkScope::new(&addr("https://example.com/"), &config);
        assert!(scope.allows(&addr("https://docs.example.com/")));
        assert!(!scope.allows(&addr("https://example.org/")));
    }

    #[test]
    fn test_same_path_prefix_scope() {
        let scope = LinkScope::new(
            &addr("https://example.com/docs/intro"),
            &scope_config(true, true),
        );
        assert!(scope.allows(&addr("https://example.com/docs/usage")));
        assert!(scope.allows(&addr("https://example.com/docs/api/types")));
        assert!(!scope.allows(&addr("https://example.com/blog/post")));
    }

    #[test]
    fn test_unrestricted_scope() {
        let scope = LinkScope::unrestricted();
        assert!(scope.allows(&addr("https://anything.net/at/all")));
    }

    #[test]
    fn test_filter_set() {
        let scope = LinkScope::same_host(&addr("https://example.com/"));
        let links: BTreeSet<Address> = [
            addr("https://example.com/a"),
            addr("https://other.com/b"),
            addr("https://example.com/c"),
        ]
        .into_iter()
        .collect();

        let filtered = scope.filter(links);
        assert_eq!(filtered.len(), 2);
        assert!(filtered.contains(&addr("https://example.com/a")));
        assert!(filtered.contains(&addr("https://example.com/c")));
    }
}
