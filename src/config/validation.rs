use crate::config::types::{
    Config, CrawlerConfig, FormatterConfig, OutputConfig, RetrievalConfig, RetrievalModeKind,
    UserAgentConfig,
};
use crate::ConfigError;
use url::Url;

/// Largest accepted depth budget
const MAX_DEPTH_LIMIT: u32 = 10;

/// Largest accepted fetch concurrency
const MAX_CONCURRENCY_LIMIT: u32 = 64;

/// Longest accepted single retry delay (5 minutes)
const MAX_RETRY_DELAY_MS: u64 = 300_000;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_retrieval_config(&config.retrieval)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_formatter_config(&config.formatter)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_depth > MAX_DEPTH_LIMIT {
        return Err(ConfigError::Validation(format!(
            "max_depth must be at most {}, got {}",
            MAX_DEPTH_LIMIT, config.max_depth
        )));
    }

    if config.max_concurrent_fetches < 1 || config.max_concurrent_fetches > MAX_CONCURRENCY_LIMIT
    {
        return Err(ConfigError::Validation(format!(
            "max_concurrent_fetches must be between 1 and {}, got {}",
            MAX_CONCURRENCY_LIMIT, config.max_concurrent_fetches
        )));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "request_timeout_secs must be >= 1".to_string(),
        ));
    }

    validate_retry_delays("crawler.retry_delays_ms", &config.retry_delays_ms)?;

    for pattern in &config.scope.allowed_domains {
        validate_domain_pattern(pattern)?;
    }

    Ok(())
}

/// Validates a retry delay list
fn validate_retry_delays(field: &str, delays: &[u64]) -> Result<(), ConfigError> {
    if let Some(delay) = delays.iter().find(|d| **d > MAX_RETRY_DELAY_MS) {
        return Err(ConfigError::Validation(format!(
            "{} entries must be <= {}ms, got {}ms",
            field, MAX_RETRY_DELAY_MS, delay
        )));
    }
    Ok(())
}

/// Validates retrieval configuration
fn validate_retrieval_config(config: &RetrievalConfig) -> Result<(), ConfigError> {
    if config.mode == RetrievalModeKind::Direct {
        return Ok(());
    }

    let proxy_url = config.proxy_url.as_deref().ok_or_else(|| {
        ConfigError::Validation(format!(
            "retrieval.proxy_url is required for mode {:?}",
            config.mode
        ))
    })?;

    let url = Url::parse(proxy_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid proxy_url: {}", e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "proxy_url must use HTTP or HTTPS, got '{}'",
            proxy_url
        )));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    validate_email(&config.contact_email)?;

    Ok(())
}

/// Validates formatter configuration (only checked when enabled)
fn validate_formatter_config(config: &FormatterConfig) -> Result<(), ConfigError> {
    if !config.enabled {
        return Ok(());
    }

    Url::parse(&config.endpoint)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid formatter endpoint: {}", e)))?;

    if config.model.trim().is_empty() {
        return Err(ConfigError::Validation(
            "formatter.model cannot be empty".to_string(),
        ));
    }

    if config.api_key_env.trim().is_empty() {
        return Err(ConfigError::Validation(
            "formatter.api_key_env cannot be empty".to_string(),
        ));
    }

    if config.max_concurrent < 1 || config.max_concurrent > 16 {
        return Err(ConfigError::Validation(format!(
            "formatter.max_concurrent must be between 1 and 16, got {}",
            config.max_concurrent
        )));
    }

    if !(0.0..=2.0).contains(&config.temperature) {
        return Err(ConfigError::Validation(format!(
            "formatter.temperature must be between 0.0 and 2.0, got {}",
            config.temperature
        )));
    }

    validate_retry_delays("formatter.retry_delays_ms", &config.retry_delays_ms)
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.directory.trim().is_empty() {
        return Err(ConfigError::Validation(
            "output.directory cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates a domain pattern (supports a leading `*.` wildcard)
fn validate_domain_pattern(pattern: &str) -> Result<(), ConfigError> {
    let domain = pattern.strip_prefix("*.").unwrap_or(pattern);

    if domain.is_empty() {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain pattern '{}' has no domain",
            pattern
        )));
    }

    if !domain
        .chars()
        .all(|c| c.is_alphanumeric() || c == '.' || c == '-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' contains invalid characters",
            domain
        )));
    }

    if domain.starts_with(['.', '-']) || domain.ends_with(['.', '-']) || domain.contains("..") {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' has misplaced '.' or '-'",
            domain
        )));
    }

    if !domain.contains('.') {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' must contain at least one dot (e.g., 'example.com')",
            domain
        )));
    }

    Ok(())
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    let Some((local, domain)) = email.split_once('@') else {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    };

    if local.is_empty() || domain.is_empty() || domain.contains('@') || !domain.contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    Ok(())
}
