use serde::Deserialize;

/// Main configuration structure for Sumi-Harvest
///
/// Every section falls back to its defaults, so an empty file (or no file at
/// all) yields a usable configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    pub retrieval: RetrievalConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub formatter: FormatterConfig,
    pub output: OutputConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CrawlerConfig {
    /// Depth budget used when the command line does not override it
    pub max_depth: u32,

    /// Maximum number of fetches in flight during one crawl
    pub max_concurrent_fetches: u32,

    /// Delays between fetch attempts (milliseconds), consumed left to right
    pub retry_delays_ms: Vec<u64>,

    /// Per-request timeout (seconds)
    pub request_timeout_secs: u64,

    /// Which discovered links may be followed
    pub scope: ScopeConfig,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_depth: 2,
            max_concurrent_fetches: 3,
            retry_delays_ms: vec![1000, 5000, 15000],
            request_timeout_secs: 30,
            scope: ScopeConfig::default(),
        }
    }
}

/// Link scope configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ScopeConfig {
    /// Only follow links on the root's host
    pub same_host: bool,

    /// Only follow links below the root's directory
    pub same_path_prefix: bool,

    /// Additional domain patterns (e.g., "*.example.com") treated as in scope
    pub allowed_domains: Vec<String>,
}

impl Default for ScopeConfig {
    fn default() -> Self {
        Self {
            same_host: true,
            same_path_prefix: false,
            allowed_domains: Vec::new(),
        }
    }
}

/// How raw page content is obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RetrievalModeKind {
    /// Plain GET of the address
    #[default]
    Direct,
    /// GET `{proxy-url}/proxy?url=...` on a local development proxy
    LocalProxy,
    /// POST `{"url": ...}` to a fetch-and-render service
    RenderProxy,
}

/// Content retrieval configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RetrievalConfig {
    pub mode: RetrievalModeKind,

    /// Proxy base URL or endpoint (required for the proxy modes)
    pub proxy_url: Option<String>,
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct UserAgentConfig {
    /// Name of the crawler
    pub crawler_name: String,

    /// Version of the crawler
    pub crawler_version: String,

    /// URL with information about the crawler
    pub contact_url: String,

    /// Email address for crawler-related contact
    pub contact_email: String,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "SumiHarvest".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: "https://example.com/sumi-harvest".to_string(),
            contact_email: "harvest@example.com".to_string(),
        }
    }
}

/// How `<img>` tags are treated before Markdown formatting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ImageMode {
    /// Leave images untouched
    #[default]
    Keep,
    /// Point images at local file names derived from their source
    LocalNames,
    /// Replace images with a textual placeholder block
    Describe,
}

/// Markdown formatter configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct FormatterConfig {
    /// Run the formatter after crawling
    pub enabled: bool,

    /// Chat-completions endpoint
    pub endpoint: String,

    /// Name of the environment variable holding the API key
    pub api_key_env: String,

    /// Model identifier sent with each request
    pub model: String,

    /// Sampling temperature
    pub temperature: f32,

    /// Maximum tokens in a reply
    pub max_tokens: u32,

    /// Maximum formatting requests in flight
    pub max_concurrent: u32,

    /// Delays between formatting attempts (milliseconds)
    pub retry_delays_ms: Vec<u64>,

    /// Image preprocessing
    pub images: ImageMode,
}

impl Default for FormatterConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: "https://openrouter.ai/api/v1/chat/completions".to_string(),
            api_key_env: "OPENROUTER_API_KEY".to_string(),
            model: "google/gemini-2.0-flash-exp:free".to_string(),
            temperature: 0.3,
            max_tokens: 4000,
            max_concurrent: 2,
            retry_delays_ms: vec![1000, 5000, 15000],
            images: ImageMode::Keep,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Directory receiving one file per page plus `index.md`
    pub directory: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: "./harvest".to_string(),
        }
    }
}
