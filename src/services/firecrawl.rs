// src/services/firecrawl.rs

//! Firecrawl rendering fetcher.
//!
//! Sends strategies to the Firecrawl scrape endpoint, which loads the page in
//! a browser, runs the interaction script and returns the rendered markup.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{FetcherConfig, PageAction};
use crate::services::fetcher::{FetchOptions, FetchedPage, PageFetcher};
use crate::utils::http::create_async_client;

/// Fetcher backed by the Firecrawl `/v1/scrape` API.
pub struct FirecrawlFetcher {
    client: reqwest::Client,
    endpoint: Url,
    api_key: String,
    timeout_ms: u64,
}

#[derive(Debug, Deserialize)]
struct ScrapeResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    data: Option<ScrapeData>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ScrapeData {
    #[serde(default)]
    html: Option<String>,
    #[serde(default)]
    markdown: Option<String>,
}

impl FirecrawlFetcher {
    pub fn new(config: &FetcherConfig, api_key: impl Into<String>) -> Result<Self> {
        let base = format!("{}/", config.api_url.trim_end_matches('/'));
        let endpoint = Url::parse(&base)?.join("v1/scrape")?;

        Ok(Self {
            client: create_async_client(config)?,
            endpoint,
            api_key: api_key.into(),
            timeout_ms: config.timeout_secs.saturating_mul(1000),
        })
    }

    fn request_body(&self, url: &str, options: &FetchOptions) -> Result<Value> {
        let mut body = json!({
            "url": url,
            "formats": options.formats,
            "waitFor": options.settle_delay_ms,
            "headers": options.headers,
            "timeout": self.timeout_ms,
        });

        if !options.actions.is_empty() {
            let actions = options
                .actions
                .iter()
                .map(firecrawl_action)
                .collect::<Result<Vec<_>>>()?;
            body["actions"] = Value::Array(actions);
        }

        Ok(body)
    }
}

/// Translate a page action into Firecrawl's action schema.
///
/// Firecrawl has no native select action, so selection runs as a script that
/// sets the value and fires `change`.
fn firecrawl_action(action: &PageAction) -> Result<Value> {
    Ok(match action {
        PageAction::Wait { milliseconds } => json!({
            "type": "wait",
            "milliseconds": milliseconds,
        }),
        PageAction::Click { selector } => json!({
            "type": "click",
            "selector": selector,
        }),
        PageAction::Select { selector, value } => {
            let script = format!(
                "(() => {{ const el = document.querySelector({}); if (!el) return; \
                 el.value = {}; el.dispatchEvent(new Event('change', {{ bubbles: true }})); }})()",
                serde_json::to_string(selector)?,
                serde_json::to_string(value)?,
            );
            json!({
                "type": "executeJavascript",
                "script": script,
            })
        }
    })
}

#[async_trait]
impl PageFetcher for FirecrawlFetcher {
    fn name(&self) -> &str {
        "firecrawl"
    }

    async fn fetch(&self, url: &str, options: &FetchOptions) -> Result<FetchedPage> {
        let body = self.request_body(url, options)?;

        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::fetch(url, e))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::fetch(
                url,
                format!("firecrawl returned {status}: {}", text.trim()),
            ));
        }

        let parsed: ScrapeResponse = response
            .json()
            .await
            .map_err(|e| AppError::fetch(url, format!("invalid firecrawl response: {e}")))?;

        if !parsed.success {
            let reason = parsed.error.unwrap_or_else(|| "unknown error".to_string());
            return Err(AppError::fetch(url, format!("firecrawl failed: {reason}")));
        }

        let data = parsed.data.unwrap_or(ScrapeData {
            html: None,
            markdown: None,
        });
        Ok(FetchedPage {
            html: data.html,
            markdown: data.markdown,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer) -> FetcherConfig {
        FetcherConfig {
            api_url: server.uri(),
            timeout_secs: 5,
            ..FetcherConfig::default()
        }
    }

    fn options() -> FetchOptions {
        let mut options = FetchOptions {
            formats: vec!["html".to_string()],
            settle_delay_ms: 3000,
            ..FetchOptions::default()
        };
        options
            .headers
            .insert("User-Agent".to_string(), "TestBot/1.0".to_string());
        options
    }

    #[test]
    fn test_endpoint_appends_scrape_path() {
        let config = FetcherConfig {
            api_url: "https://api.firecrawl.dev/".to_string(),
            ..FetcherConfig::default()
        };
        let fetcher = FirecrawlFetcher::new(&config, "key").unwrap();
        assert_eq!(fetcher.endpoint.as_str(), "https://api.firecrawl.dev/v1/scrape");
    }

    #[test]
    fn test_select_becomes_script_with_escaped_values() {
        let action = PageAction::Select {
            selector: "select[name=\"world\"]".to_string(),
            value: "Auroria".to_string(),
        };
        let value = firecrawl_action(&action).unwrap();
        assert_eq!(value["type"], "executeJavascript");

        let script = value["script"].as_str().unwrap();
        assert!(script.contains(r#"document.querySelector("select[name=\"world\"]")"#));
        assert!(script.contains(r#"el.value = "Auroria""#));
        assert!(script.contains("dispatchEvent"));
    }

    #[test]
    fn test_plain_request_omits_actions() {
        let fetcher = FirecrawlFetcher::new(&FetcherConfig::default(), "key").unwrap();
        let body = fetcher.request_body("https://example.com", &options()).unwrap();
        assert!(body.get("actions").is_none());
        assert_eq!(body["waitFor"], 3000);
        assert_eq!(body["timeout"], 60_000);
    }

    #[tokio::test]
    async fn test_fetch_returns_html() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/scrape"))
            .and(header("authorization", "Bearer test-key"))
            .and(body_partial_json(json!({
                "url": "https://game.example/?subtopic=latestdeaths",
                "formats": ["html"],
                "waitFor": 3000,
                "headers": { "User-Agent": "TestBot/1.0" },
                "actions": [
                    { "type": "wait", "milliseconds": 500 },
                    { "type": "click", "selector": "#submit" }
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": {
                    "html": "<table><tr><td>x</td></tr></table>",
                    "markdown": "| x |"
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = FirecrawlFetcher::new(&config_for(&server), "test-key").unwrap();
        let mut options = options();
        options.actions = vec![
            PageAction::Wait { milliseconds: 500 },
            PageAction::Click {
                selector: "#submit".to_string(),
            },
        ];

        let page = fetcher
            .fetch("https://game.example/?subtopic=latestdeaths", &options)
            .await
            .unwrap();
        assert_eq!(page.markup(), Some("<table><tr><td>x</td></tr></table>"));
        assert_eq!(page.markdown.as_deref(), Some("| x |"));
    }

    #[tokio::test]
    async fn test_unsuccessful_payload_is_fetch_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/scrape"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": false,
                "error": "blocked"
            })))
            .mount(&server)
            .await;

        let fetcher = FirecrawlFetcher::new(&config_for(&server), "test-key").unwrap();
        let err = fetcher
            .fetch("https://game.example", &options())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Fetch { .. }));
        assert!(err.to_string().contains("blocked"));
    }

    #[tokio::test]
    async fn test_http_error_status_is_fetch_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/scrape"))
            .respond_with(ResponseTemplate::new(402).set_body_string("payment required"))
            .mount(&server)
            .await;

        let fetcher = FirecrawlFetcher::new(&config_for(&server), "test-key").unwrap();
        let err = fetcher
            .fetch("https://game.example", &options())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("402"));
    }

    #[tokio::test]
    async fn test_missing_html_is_not_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/scrape"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": { "markdown": "nothing here" }
            })))
            .mount(&server)
            .await;

        let fetcher = FirecrawlFetcher::new(&config_for(&server), "test-key").unwrap();
        let page = fetcher.fetch("https://game.example", &options()).await.unwrap();
        assert_eq!(page.markup(), None);
    }
}
