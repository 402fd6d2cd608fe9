//! Crawler engine - depth-bounded traversal
//!
//! This module drives one traversal from a root address:
//! - Claiming addresses in the shared visited set before fetching them
//! - Bounding fetches in flight with a per-crawl limiter
//! - Cleaning each fetched page and extracting its links from the raw content
//! - Fanning out over child links and merging their results
//!
//! A failing address prunes only its own subtree; siblings keep going.

use crate::config::{Config, ScopeConfig};
use crate::content::{escape_text, HtmlCleaner};
use crate::crawler::{
    build_http_client, extract_links, ConcurrencyLimiter, HttpSource, RetrievalMode,
    RetryPolicy, RetryingFetcher,
};
use crate::state::{PageState, VisitedSet};
use crate::url::{Address, LinkScope};
use crate::{HarvestError, UrlResult};
use futures::future::{join_all, BoxFuture, FutureExt};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Content recorded for an address that was discovered but not downloaded
pub const DISCOVERED_SENTINEL: &str = "";

/// Mapping of address to cleaned content, ordered by address
///
/// Entries holding [`DISCOVERED_SENTINEL`] mark links found at the edge of the
/// depth budget that were listed without being fetched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlResult {
    pages: BTreeMap<Address, String>,
}

impl CrawlResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records content for an address, replacing any previous entry
    pub fn insert(&mut self, address: Address, content: String) {
        self.pages.insert(address, content);
    }

    /// Merges another result into this one; the other result wins on conflict
    pub fn merge(&mut self, other: CrawlResult) {
        self.pages.extend(other.pages);
    }

    pub fn get(&self, address: &Address) -> Option<&str> {
        self.pages.get(address).map(String::as_str)
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.pages.contains_key(address)
    }

    /// Returns true if the address was listed without being downloaded
    pub fn is_discovered(&self, address: &Address) -> bool {
        self.get(address) == Some(DISCOVERED_SENTINEL)
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Address, &str)> {
        self.pages.iter().map(|(a, c)| (a, c.as_str()))
    }

    /// Entries whose content was fetched
    pub fn downloaded(&self) -> impl Iterator<Item = (&Address, &str)> {
        self.iter().filter(|(_, c)| *c != DISCOVERED_SENTINEL)
    }

    /// Addresses that were listed but not fetched
    pub fn discovered(&self) -> impl Iterator<Item = &Address> {
        self.iter()
            .filter(|(_, c)| *c == DISCOVERED_SENTINEL)
            .map(|(a, _)| a)
    }

    pub fn into_inner(self) -> BTreeMap<Address, String> {
        self.pages
    }
}

impl IntoIterator for CrawlResult {
    type Item = (Address, String);
    type IntoIter = std::collections::btree_map::IntoIter<Address, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.pages.into_iter()
    }
}

/// Statistics about one crawl
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlStats {
    /// Addresses claimed during the crawl (fetched, failed or listed)
    pub visited: usize,

    /// Pages fetched and cleaned
    pub downloaded: usize,

    /// Links listed at the depth boundary without being fetched
    pub listed: usize,

    /// Pages whose retrieval failed after all retries
    pub failed: usize,

    /// Wall-clock duration of the crawl
    pub elapsed: Duration,
}

/// State shared by every branch of one crawl
///
/// Built fresh for each top-level crawl so nothing leaks between runs.
struct CrawlSession {
    visited: VisitedSet,
    limiter: ConcurrencyLimiter,
    scope: LinkScope,
}

/// Depth-bounded crawler
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use sumi_harvest::config::UserAgentConfig;
/// use sumi_harvest::content::HtmlCleaner;
/// use sumi_harvest::crawler::{
///     build_http_client, Crawler, HttpSource, RetrievalMode, RetryPolicy, RetryingFetcher,
/// };
/// use sumi_harvest::Address;
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let client = build_http_client(&UserAgentConfig::default(), std::time::Duration::from_secs(30))?;
/// let source = Arc::new(HttpSource::new(client, RetrievalMode::Direct));
/// let fetcher = RetryingFetcher::new(source, RetryPolicy::default());
/// let crawler = Crawler::new(fetcher, HtmlCleaner::default(), 3);
///
/// let root = Address::parse("https://example.com/docs/")?;
/// let result = crawler.crawl(&root, 2).await;
/// println!("{} entries", result.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Crawler {
    fetcher: RetryingFetcher,
    cleaner: HtmlCleaner,
    concurrency: usize,
    scope: ScopeConfig,
}

impl Crawler {
    /// Creates a crawler that keeps to the root's host
    ///
    /// # Arguments
    ///
    /// * `fetcher` - Retrieves raw content with retries
    /// * `cleaner` - Cleans each fetched page
    /// * `concurrency` - Maximum fetches in flight per crawl
    pub fn new(fetcher: RetryingFetcher, cleaner: HtmlCleaner, concurrency: usize) -> Self {
        Self {
            fetcher,
            cleaner,
            concurrency,
            scope: ScopeConfig::default(),
        }
    }

    /// Replaces the link scope rules
    pub fn with_scope_config(mut self, scope: ScopeConfig) -> Self {
        self.scope = scope;
        self
    }

    /// Builds a crawler from configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Crawler)` - Crawler wired to an HTTP source
    /// * `Err(HarvestError)` - Invalid retrieval settings or HTTP client failure
    pub fn from_config(config: &Config) -> Result<Self, HarvestError> {
        let client = build_http_client(
            &config.user_agent,
            Duration::from_secs(config.crawler.request_timeout_secs),
        )?;
        let mode = RetrievalMode::from_config(&config.retrieval)?;
        let source = Arc::new(HttpSource::new(client, mode));
        let fetcher = RetryingFetcher::new(
            source,
            RetryPolicy::from_millis(&config.crawler.retry_delays_ms),
        );

        Ok(Self::new(
            fetcher,
            HtmlCleaner::default(),
            config.crawler.max_concurrent_fetches as usize,
        )
        .with_scope_config(config.crawler.scope.clone()))
    }

    /// Crawls from `root` with the given depth budget
    ///
    /// Depth 0 fetches only the root. Depth 1 fetches the root and lists its
    /// links with [`DISCOVERED_SENTINEL`]. Larger depths recurse into each
    /// link with one less level of budget.
    ///
    /// Never fails: a root that cannot be fetched yields a result without
    /// the root's entry.
    pub async fn crawl(&self, root: &Address, depth: u32) -> CrawlResult {
        self.crawl_with_stats(root, depth).await.0
    }

    /// Parses `root` and crawls from it
    pub async fn crawl_url(&self, root: &str, depth: u32) -> UrlResult<CrawlResult> {
        let root = Address::parse(root)?;
        Ok(self.crawl(&root, depth).await)
    }

    /// Crawls from `root` and reports statistics alongside the result
    pub async fn crawl_with_stats(&self, root: &Address, depth: u32) -> (CrawlResult, CrawlStats) {
        let start = Instant::now();
        let session = CrawlSession {
            visited: VisitedSet::new(),
            limiter: ConcurrencyLimiter::new(self.concurrency),
            scope: LinkScope::new(root, &self.scope),
        };

        tracing::info!(
            "Starting crawl of {} (depth {}, {} concurrent fetches)",
            root,
            depth,
            session.limiter.capacity()
        );

        let result = self.visit(&session, root.clone(), depth).await;

        let stats = CrawlStats {
            visited: session.visited.len(),
            downloaded: result.downloaded().count(),
            listed: result.discovered().count(),
            failed: session.visited.count_in(PageState::Failed),
            elapsed: start.elapsed(),
        };

        if result.contains(root) {
            tracing::info!(
                "Crawl of {} finished: {} downloaded, {} listed, {} failed in {:?}",
                root,
                stats.downloaded,
                stats.listed,
                stats.failed,
                stats.elapsed
            );
        } else {
            tracing::warn!("Crawl of {} produced no content for the root address", root);
        }

        (result, stats)
    }

    /// Crawls one address and, budget permitting, its links
    fn visit<'a>(
        &'a self,
        session: &'a CrawlSession,
        address: Address,
        depth: u32,
    ) -> BoxFuture<'a, CrawlResult> {
        async move {
            let mut result = CrawlResult::new();

            if !session.visited.claim(&address) {
                tracing::trace!("Skipping {}: already claimed", address);
                return result;
            }

            session.visited.transition(&address, PageState::Fetching);
            let fetched = {
                let _permit = session.limiter.acquire().await;
                tracing::debug!("Fetching {} (depth {})", address, depth);
                self.fetcher.fetch(&address).await
            };

            let raw = match fetched {
                Ok(raw) => raw,
                Err(e) => {
                    tracing::warn!("Giving up on {}: {}", address, e);
                    session.visited.transition(&address, PageState::Failed);
                    return result;
                }
            };

            session.visited.transition(&address, PageState::Cleaning);
            let page = self.cleaner.clean_or_raw(&raw);
            result.insert(address.clone(), downloaded_content(page.html, &raw, &address));

            if depth == 0 {
                session.visited.transition(&address, PageState::Merged);
                return result;
            }

            session.visited.transition(&address, PageState::ExtractingLinks);
            let links = session.scope.filter(extract_links(&address, &raw));
            tracing::debug!("Found {} in-scope links on {}", links.len(), address);

            if depth == 1 {
                for link in links {
                    if session.visited.claim(&link) {
                        session.visited.transition(&link, PageState::Listed);
                        result.insert(link, DISCOVERED_SENTINEL.to_string());
                    }
                }
                session.visited.transition(&address, PageState::Merged);
                return result;
            }

            session.visited.transition(&address, PageState::Recursing);
            let children = links
                .into_iter()
                .map(move |link| self.visit(session, link, depth - 1));
            for child in join_all(children).await {
                result.merge(child);
            }

            session.visited.transition(&address, PageState::Merged);
            result
        }
        .boxed()
    }
}

/// Content stored for a fetched page; never the discovered sentinel
///
/// A page that cleans to nothing (a script-only shell, say) keeps its raw
/// content, and a blank body falls back to a heading naming the address.
fn downloaded_content(cleaned: String, raw: &str, address: &Address) -> String {
    if !cleaned.is_empty() {
        return cleaned;
    }
    tracing::debug!("{} cleaned to nothing, keeping less processed content", address);
    if !raw.trim().is_empty() {
        raw.to_string()
    } else {
        format!("<h1>{}</h1>", escape_text(address.as_str()))
    }
}
