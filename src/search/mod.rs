//! Tavily web search client
//!
//! Covers general medical knowledge questions the databases cannot answer.
//! Results are capped and rendered as plain text for the agent to read;
//! provider failures become error strings at the tool layer, never process
//! failures.

use std::time::Duration;

use reqwest::Client;
use serde_json::{Value, json};

use crate::error::{MedAgentError, Result};

/// Tavily search endpoint
const TAVILY_API_URL: &str = "https://api.tavily.com/search";

/// Configuration for the search client
#[derive(Debug, Clone)]
pub struct TavilyConfig {
    pub max_results: usize,
    pub timeout: Duration,
}

impl Default for TavilyConfig {
    fn default() -> Self {
        Self {
            max_results: 3,
            timeout: Duration::from_secs(30),
        }
    }
}

/// Tavily search client
pub struct TavilyClient {
    client: Client,
    api_key: String,
    config: TavilyConfig,
}

impl TavilyClient {
    /// Create a new search client
    ///
    /// Reads TAVILY_API_KEY from the environment
    pub fn new(config: TavilyConfig) -> Result<Self> {
        let api_key = crate::config::require_env("TAVILY_API_KEY")?;
        Self::with_api_key(api_key, config)
    }

    /// Create a client with an explicit API key
    pub fn with_api_key(api_key: String, config: TavilyConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| MedAgentError::Search(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key,
            config,
        })
    }

    /// Run a search and return the results as text
    pub async fn search(&self, query: &str) -> Result<String> {
        let query = query.trim();
        if query.is_empty() {
            return Err(MedAgentError::Search("empty search query".to_string()));
        }

        let body = json!({
            "api_key": self.api_key,
            "query": query,
            "max_results": self.config.max_results
        });

        let response = self
            .client
            .post(TAVILY_API_URL)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| MedAgentError::Search(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(MedAgentError::Search(format!(
                "API error {}: {}",
                status, error_body
            )));
        }

        let raw: Value = response
            .json()
            .await
            .map_err(|e| MedAgentError::Search(format!("Failed to parse response: {}", e)))?;

        Ok(format_results(&raw, self.config.max_results))
    }
}

impl std::fmt::Debug for TavilyClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TavilyClient")
            .field("max_results", &self.config.max_results)
            .finish()
    }
}

/// Render a Tavily response body as numbered text blocks
fn format_results(raw: &Value, max_results: usize) -> String {
    let results = match raw.get("results").and_then(|r| r.as_array()) {
        Some(results) if !results.is_empty() => results,
        _ => return "No search results found for this query.".to_string(),
    };

    let mut blocks = Vec::new();
    for (i, result) in results.iter().take(max_results).enumerate() {
        let title = result.get("title").and_then(|t| t.as_str()).unwrap_or("(untitled)");
        let url = result.get("url").and_then(|u| u.as_str()).unwrap_or("");
        let content = result.get("content").and_then(|c| c.as_str()).unwrap_or("");
        blocks.push(format!("{}. {} — {}\n{}", i + 1, title, url, content));
    }

    blocks.join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_format_results_renders_blocks() {
        let raw = json!({
            "results": [
                {
                    "title": "Diabetes symptoms",
                    "url": "https://example.org/diabetes",
                    "content": "Common symptoms include increased thirst and frequent urination."
                },
                {
                    "title": "Type 2 overview",
                    "url": "https://example.org/type2",
                    "content": "Type 2 diabetes affects how the body processes blood sugar."
                }
            ]
        });

        let text = format_results(&raw, 3);
        assert!(text.starts_with("1. Diabetes symptoms — https://example.org/diabetes"));
        assert!(text.contains("2. Type 2 overview"));
        assert!(text.contains("increased thirst"));
    }

    #[test]
    fn test_format_results_caps_at_max() {
        let raw = json!({
            "results": [
                {"title": "a", "url": "u1", "content": "c1"},
                {"title": "b", "url": "u2", "content": "c2"},
                {"title": "c", "url": "u3", "content": "c3"},
                {"title": "d", "url": "u4", "content": "c4"}
            ]
        });

        let text = format_results(&raw, 3);
        assert!(text.contains("3. c"));
        assert!(!text.contains("4. d"));
    }

    #[test]
    fn test_format_results_empty() {
        let raw = json!({ "results": [] });
        assert_eq!(format_results(&raw, 3), "No search results found for this query.");
    }

    #[test]
    fn test_format_results_missing_results_key() {
        let raw = json!({});
        assert_eq!(format_results(&raw, 3), "No search results found for this query.");
    }

    #[test]
    fn test_format_results_tolerates_partial_fields() {
        let raw = json!({ "results": [ {"url": "u1"} ] });
        let text = format_results(&raw, 3);
        assert!(text.contains("(untitled)"));
    }

    #[test]
    fn test_client_missing_api_key_env() {
        unsafe {
            std::env::remove_var("TAVILY_API_KEY");
        }
        let err = TavilyClient::new(TavilyConfig::default()).unwrap_err();
        assert!(matches!(err, MedAgentError::Config(_)));
        assert!(err.to_string().contains("TAVILY_API_KEY"));
    }

    #[tokio::test]
    async fn test_search_rejects_empty_query() {
        let client = TavilyClient::with_api_key("tvly_test".into(), TavilyConfig::default()).unwrap();
        let err = client.search("   ").await.unwrap_err();
        assert!(matches!(err, MedAgentError::Search(_)));
    }
}
