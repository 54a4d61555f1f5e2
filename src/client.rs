//! HTTP transport bound to one store.
//!
//! `StoreClient` owns the reqwest client, the Admin API base URL, and the
//! access token. Every call waits its turn on the shared rate limiter
//! before hitting the network, keeping the process under the platform's
//! fixed calls-per-second ceiling independent of any retry behavior.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};

use crate::error::SyncError;
use crate::pagination::next_link;
use crate::resilience::RateLimiter;

const API_VERSION: &str = "2024-10";
const ACCESS_TOKEN_HEADER: &str = "X-Access-Token";

/// Platform quota is 2 REST calls per second per store.
const MIN_CALL_INTERVAL_MS: u64 = 500;

const REQUEST_TIMEOUT_SECS: u64 = 30;

const ERROR_BODY_MAX_LEN: usize = 300;

/// A parsed Admin API response.
#[derive(Debug)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
    /// `rel="next"` URL from the `Link` header, when the listing has
    /// another page
    pub next_link: Option<String>,
}

/// Client for one store's Admin API.
pub struct StoreClient {
    http: reqwest::Client,
    base_url: String,
    graphql_url: String,
    access_token: SecretString,
    limiter: RateLimiter,
}

impl StoreClient {
    /// Creates a client for `site` (e.g. `my-store.example.com`).
    pub fn new(site: &str, access_token: SecretString) -> Result<Self, SyncError> {
        let site = site.trim_end_matches('/');
        let site = site
            .strip_prefix("https://")
            .or_else(|| site.strip_prefix("http://"))
            .unwrap_or(site);
        if site.is_empty() {
            return Err(SyncError::Config("site domain is empty".into()));
        }
        let base_url = format!("https://{site}/admin/api/{API_VERSION}");
        let graphql_url = format!("{base_url}/graphql.json");
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            http,
            base_url,
            graphql_url,
            access_token,
            limiter: RateLimiter::new(Duration::from_millis(MIN_CALL_INTERVAL_MS)),
        })
    }

    /// Resolves a path like `/pages.json` against the API base. Absolute
    /// URLs (from `Link` headers) pass through unchanged.
    pub fn url(&self, path_or_url: &str) -> String {
        if path_or_url.starts_with("https://") || path_or_url.starts_with("http://") {
            path_or_url.to_string()
        } else {
            format!("{}{}", self.base_url, path_or_url)
        }
    }

    pub async fn get(&self, path_or_url: &str) -> Result<ApiResponse, SyncError> {
        self.send(reqwest::Method::GET, path_or_url, None).await
    }

    pub async fn post(&self, path: &str, body: &Value) -> Result<ApiResponse, SyncError> {
        self.send(reqwest::Method::POST, path, Some(body)).await
    }

    pub async fn put(&self, path: &str, body: &Value) -> Result<ApiResponse, SyncError> {
        self.send(reqwest::Method::PUT, path, Some(body)).await
    }

    pub async fn delete(&self, path: &str) -> Result<ApiResponse, SyncError> {
        self.send(reqwest::Method::DELETE, path, None).await
    }

    /// Posts a GraphQL query and returns the `data` payload.
    ///
    /// Top-level `errors` are mapped to a retryable 429 when the platform
    /// reports throttling, and to a permanent validation failure
    /// otherwise. Mutation-level `userErrors` stay in the payload; see
    /// [`user_errors`].
    pub async fn graphql(&self, query: &str, variables: Value) -> Result<Value, SyncError> {
        let body = json!({ "query": query, "variables": variables });
        let response = self
            .send(reqwest::Method::POST, &self.graphql_url, Some(&body))
            .await?;
        if let Some(errors) = response.body.get("errors").and_then(Value::as_array) {
            if !errors.is_empty() {
                let joined = errors
                    .iter()
                    .map(|e| {
                        e.get("message")
                            .and_then(Value::as_str)
                            .unwrap_or("unknown GraphQL error")
                            .to_string()
                    })
                    .collect::<Vec<_>>()
                    .join("; ");
                if joined.to_lowercase().contains("throttled") {
                    return Err(SyncError::Http {
                        status: 429,
                        message: joined,
                    });
                }
                return Err(SyncError::Validation(joined));
            }
        }
        Ok(response.body.get("data").cloned().unwrap_or(Value::Null))
    }

    async fn send(
        &self,
        method: reqwest::Method,
        path_or_url: &str,
        body: Option<&Value>,
    ) -> Result<ApiResponse, SyncError> {
        self.limiter.wait_turn().await;
        let url = self.url(path_or_url);
        log::debug!("{method} {url}");
        let mut request = self
            .http
            .request(method, &url)
            .header(ACCESS_TOKEN_HEADER, self.access_token.expose_secret());
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await?;
        into_api_response(response).await
    }
}

async fn into_api_response(response: reqwest::Response) -> Result<ApiResponse, SyncError> {
    let status = response.status();
    let link = response
        .headers()
        .get(reqwest::header::LINK)
        .and_then(|value| value.to_str().ok())
        .and_then(next_link);
    let text = response.text().await?;
    if !status.is_success() {
        let snippet = snippet(&text);
        return Err(match status.as_u16() {
            401 | 403 => SyncError::Auth(format!("status {status}: {snippet}")),
            404 => SyncError::NotFound(snippet),
            code => SyncError::Http {
                status: code,
                message: snippet,
            },
        });
    }
    let body = if text.trim().is_empty() {
        Value::Null
    } else {
        serde_json::from_str(&text)?
    };
    Ok(ApiResponse {
        status: status.as_u16(),
        body,
        next_link: link,
    })
}

fn snippet(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.len() <= ERROR_BODY_MAX_LEN {
        return trimmed.to_string();
    }
    let mut end = ERROR_BODY_MAX_LEN;
    while !trimmed.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &trimmed[..end])
}

/// Extracts `userErrors` messages from a GraphQL mutation payload.
///
/// Returns the joined messages when the mutation was rejected, so callers
/// can surface a permanent validation failure.
pub fn user_errors(mutation_payload: &Value) -> Option<String> {
    let errors = mutation_payload.get("userErrors")?.as_array()?;
    if errors.is_empty() {
        return None;
    }
    let joined = errors
        .iter()
        .map(|e| {
            let field = e
                .get("field")
                .and_then(Value::as_array)
                .map(|parts| {
                    parts
                        .iter()
                        .filter_map(Value::as_str)
                        .collect::<Vec<_>>()
                        .join(".")
                })
                .unwrap_or_default();
            let message = e
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("unknown user error");
            if field.is_empty() {
                message.to_string()
            } else {
                format!("{field}: {message}")
            }
        })
        .collect::<Vec<_>>()
        .join("; ");
    Some(joined)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_joins_paths_and_passes_absolute_urls_through() {
        let client =
            StoreClient::new("my-store.example.com", SecretString::new("tok".into())).unwrap();
        assert_eq!(
            client.url("/pages.json"),
            format!("https://my-store.example.com/admin/api/{API_VERSION}/pages.json")
        );
        let absolute = "https://my-store.example.com/admin/api/pages.json?page_info=x";
        assert_eq!(client.url(absolute), absolute);
    }

    #[test]
    fn new_strips_scheme_and_rejects_empty_site() {
        let client =
            StoreClient::new("https://my-store.example.com/", SecretString::new("tok".into()))
                .unwrap();
        assert!(client.url("/shop.json").starts_with("https://my-store.example.com/"));
        assert!(StoreClient::new("", SecretString::new("tok".into())).is_err());
    }

    #[test]
    fn user_errors_joins_field_and_message() {
        let payload = serde_json::json!({
            "userErrors": [
                { "field": ["handle"], "message": "has already been taken" },
                { "message": "title can't be blank" }
            ]
        });
        assert_eq!(
            user_errors(&payload).as_deref(),
            Some("handle: has already been taken; title can't be blank")
        );
    }

    #[test]
    fn user_errors_absent_or_empty_is_none() {
        assert_eq!(user_errors(&serde_json::json!({})), None);
        assert_eq!(
            user_errors(&serde_json::json!({ "userErrors": [] })),
            None
        );
    }
}
