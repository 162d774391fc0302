//! OpenAiCompatibleProvider -- [`CompletionProvider`] for any endpoint that
//! speaks the OpenAI chat completions protocol (OpenAI, DashScope, local
//! gateways).
//!
//! One non-streaming `POST {base_url}/chat/completions` per call. The API
//! key is wrapped in [`secrecy::SecretString`] and is only exposed when the
//! `Authorization` header is built.

mod types;

use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::RETRY_AFTER;
use secrecy::{ExposeSecret, SecretString};

use parley_core::llm::provider::CompletionProvider;
use parley_types::llm::{ChatTurn, CompletionError, MessageRole};

use self::types::{ChatCompletionRequest, ChatCompletionResponse, WireMessage};

/// Chat completion client for OpenAI-compatible endpoints.
///
/// Does not derive Debug; the key stays out of logs either way.
pub struct OpenAiCompatibleProvider {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
    model: String,
    timeout: Duration,
}

impl OpenAiCompatibleProvider {
    /// Create a provider. `base_url` is the API root (for example
    /// `https://api.openai.com/v1`); a trailing slash is ignored.
    pub fn new(
        base_url: impl Into<String>,
        api_key: SecretString,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, CompletionError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CompletionError::Provider(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            timeout,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    fn to_request<'a>(&'a self, history: &'a [ChatTurn]) -> ChatCompletionRequest<'a> {
        ChatCompletionRequest {
            model: &self.model,
            messages: history
                .iter()
                .map(|turn| WireMessage {
                    role: match turn.role {
                        MessageRole::User => "user",
                        MessageRole::Assistant => "assistant",
                    },
                    content: &turn.content,
                })
                .collect(),
        }
    }
}

/// Parse a `Retry-After` header given in seconds.
fn retry_after_ms(headers: &reqwest::header::HeaderMap) -> Option<u64> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(|secs| secs.saturating_mul(1000))
}

/// Map a non-success status onto the completion error taxonomy.
fn status_error(status: StatusCode, retry_after_ms: Option<u64>, body: &str) -> CompletionError {
    match status {
        StatusCode::TOO_MANY_REQUESTS => CompletionError::RateLimited { retry_after_ms },
        s if s.is_server_error() => CompletionError::Unavailable(format!("HTTP {s}")),
        s => CompletionError::Provider(format!("HTTP {s}: {body}")),
    }
}

impl CompletionProvider for OpenAiCompatibleProvider {
    async fn complete(&self, history: &[ChatTurn]) -> Result<String, CompletionError> {
        let body = self.to_request(history);

        tracing::debug!(model = %self.model, turns = history.len(), "sending completion request");

        let response = self
            .client
            .post(self.url())
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    CompletionError::Timeout(self.timeout.as_millis() as u64)
                } else {
                    CompletionError::Unavailable(format!("HTTP request failed: {e}"))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = retry_after_ms(response.headers());
            let error_body = response.text().await.unwrap_or_default();
            tracing::warn!(%status, "completion endpoint returned an error");
            return Err(status_error(status, retry_after, &error_body));
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| CompletionError::Provider(format!("failed to parse response: {e}")))?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| CompletionError::Provider("response contained no choices".to_string()))?;

        Ok(choice.message.content.unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::{HeaderMap, HeaderValue};

    fn provider() -> OpenAiCompatibleProvider {
        OpenAiCompatibleProvider::new(
            "https://example.invalid/v1/",
            SecretString::from("sk-test".to_string()),
            "qwen-plus",
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn test_url_ignores_trailing_slash() {
        assert_eq!(provider().url(), "https://example.invalid/v1/chat/completions");
    }

    #[test]
    fn test_request_body_shape() {
        let p = provider();
        let history = vec![
            ChatTurn::user("hi"),
            ChatTurn::assistant("hello"),
            ChatTurn::user("how are you?"),
        ];
        let json = serde_json::to_value(p.to_request(&history)).unwrap();
        assert_eq!(json["model"], "qwen-plus");
        assert_eq!(json["messages"].as_array().unwrap().len(), 3);
        assert_eq!(json["messages"][1]["role"], "assistant");
        assert_eq!(json["messages"][2]["content"], "how are you?");
    }

    #[test]
    fn test_rate_limit_maps_with_retry_after() {
        let mut headers = HeaderMap::new();
        headers.insert(RETRY_AFTER, HeaderValue::from_static("3"));
        let err = status_error(StatusCode::TOO_MANY_REQUESTS, retry_after_ms(&headers), "");
        assert!(matches!(
            err,
            CompletionError::RateLimited {
                retry_after_ms: Some(3000)
            }
        ));
    }

    #[test]
    fn test_server_error_is_unavailable() {
        let err = status_error(StatusCode::BAD_GATEWAY, None, "upstream down");
        assert!(matches!(err, CompletionError::Unavailable(_)));
    }

    #[test]
    fn test_client_error_is_provider() {
        let err = status_error(StatusCode::UNAUTHORIZED, None, "bad key");
        match err {
            CompletionError::Provider(msg) => assert!(msg.contains("bad key")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_missing_retry_after() {
        assert_eq!(retry_after_ms(&HeaderMap::new()), None);
    }

    #[test]
    fn test_response_without_content_parses() {
        let parsed: ChatCompletionResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"role":"assistant","content":null}}]}"#)
                .unwrap();
        assert!(parsed.choices[0].message.content.is_none());
    }
}
