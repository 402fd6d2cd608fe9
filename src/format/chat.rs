//! Markdown formatting through an OpenAI-compatible chat-completions API

use crate::config::FormatterConfig;
use crate::format::{FormatError, MarkdownFormatter};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// Marker the model is asked to end its reply with
const END_MARKER: &str = "<EOF>";

const CONVERSION_PROMPT: &str = "Convert the following HTML to Markdown.
Here are some rules:
1. Preserve the structure and formatting of the original content as much as possible.
2. Do not include href to any local links, only external links are allowed.
3. Do not include ``` or any other code block formatting, just plain text.

For example:
Do not include any of the following:
[Architecture](architecture)
[Base Protocol](basic)

The following are OK:
[#Learn More](#learn-more)
[RFC2119](https://datatracker.ietf.org/doc/html/rfc2119)
";

// --- OpenAI-compatible serde structs ---

#[derive(serde::Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    stream: bool,
    temperature: f32,
    max_tokens: u32,
}

#[derive(serde::Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(serde::Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(serde::Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(serde::Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Chat-completions client that turns HTML into Markdown
#[derive(Debug, Clone)]
pub struct ChatCompletionsFormatter {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl ChatCompletionsFormatter {
    /// Creates a formatter with an explicit API key
    pub fn new(client: Client, config: &FormatterConfig, api_key: String) -> Self {
        tracing::info!(
            "Markdown formatter configured: endpoint={}, model={}",
            config.endpoint,
            config.model
        );

        Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key,
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }

    /// Creates a formatter reading its API key from the configured variable
    ///
    /// # Returns
    ///
    /// * `Ok(ChatCompletionsFormatter)` - Ready to use
    /// * `Err(FormatError)` - The key variable is unset or empty, or the HTTP
    ///   client could not be built
    pub fn from_env(config: &FormatterConfig) -> Result<Self, FormatError> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| FormatError::MissingApiKey(config.api_key_env.clone()))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()?;

        Ok(Self::new(client, config, api_key))
    }
}

#[async_trait]
impl MarkdownFormatter for ChatCompletionsFormatter {
    async fn to_markdown(&self, html: &str) -> Result<String, FormatError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: format!("{}\n{}\n{}", CONVERSION_PROMPT, html, END_MARKER),
            }],
            stream: false,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FormatError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| FormatError::InvalidResponse(e.to_string()))?;

        let content = chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(FormatError::EmptyResponse)?;

        tracing::debug!("Formatter returned {} bytes", content.len());
        Ok(strip_end_marker(&content))
    }
}

/// Removes the first end marker and surrounding whitespace
fn strip_end_marker(content: &str) -> String {
    content.replacen(END_MARKER, "", 1).trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_end_marker() {
        assert_eq!(strip_end_marker("# Title\n\nBody\n<EOF>\n"), "# Title\n\nBody");
        assert_eq!(strip_end_marker("  plain  "), "plain");
    }

    #[test]
    fn test_from_env_missing_key() {
        let config = FormatterConfig {
            api_key_env: "SUMI_HARVEST_TEST_UNSET_KEY".to_string(),
            ..FormatterConfig::default()
        };
        assert!(matches!(
            ChatCompletionsFormatter::from_env(&config),
            Err(FormatError::MissingApiKey(_))
        ));
    }

    #[test]
    fn test_request_shape() {
        let request = ChatRequest {
            model: "m",
            messages: vec![ChatMessage {
                role: "user",
                content: "hi".to_string(),
            }],
            stream: false,
            temperature: 0.3,
            max_tokens: 4000,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["model"], "m");
        assert_eq!(value["messages"][0]["role"], "user");
        assert_eq!(value["max_tokens"], 4000);
        assert_eq!(value["stream"], false);
    }
}
