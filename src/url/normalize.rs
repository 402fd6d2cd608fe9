use crate::{UrlError, UrlResult};
use std::fmt;
use std::str::FromStr;
use url::Url;

/// An absolute, fragment-free `http`/`https` resource locator
///
/// Every constructor strips the fragment, so two locators that differ only by
/// `#anchor` compare, hash and order as the same address. This is the key type
/// of the visited set and of crawl results.
///
/// # Examples
///
/// ```
/// use sumi_harvest::url::Address;
///
/// let a = Address::parse("https://example.com/docs#intro").unwrap();
/// let b = Address::parse("https://example.com/docs#usage").unwrap();
/// assert_eq!(a, b);
/// assert_eq!(a.as_str(), "https://example.com/docs");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address(Url);

impl Address {
    /// Parses an absolute address
    ///
    /// # Returns
    ///
    /// * `Ok(Address)` - Normalized address
    /// * `Err(UrlError)` - Unparsable input, unsupported scheme or missing host
    pub fn parse(input: &str) -> UrlResult<Self> {
        let url = Url::parse(input.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;
        Self::from_url(url)
    }

    /// Resolves a possibly relative hyperlink target against a base address
    pub fn resolve(base: &Address, href: &str) -> UrlResult<Self> {
        let url = base
            .0
            .join(href.trim())
            .map_err(|e| UrlError::Parse(e.to_string()))?;
        Self::from_url(url)
    }

    /// Validates and normalizes an already parsed URL
    pub fn from_url(mut url: Url) -> UrlResult<Self> {
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(UrlError::InvalidScheme(format!(
                "Only HTTP and HTTPS schemes are supported, got: {}",
                url.scheme()
            )));
        }

        if url.host_str().map_or(true, str::is_empty) {
            return Err(UrlError::MissingDomain);
        }

        url.set_fragment(None);
        Ok(Self(url))
    }

    /// Returns the serialized address
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Returns the underlying URL
    pub fn as_url(&self) -> &Url {
        &self.0
    }

    /// Returns the host, if any
    pub fn host_str(&self) -> Option<&str> {
        self.0.host_str()
    }

    /// Returns the path component
    pub fn path(&self) -> &str {
        self.0.path()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Address {
    type Err = UrlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for Address {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}
