//! Cloudflare Worker AI.
//!
//! Only a connectivity check exists. Text actions never reach Cloudflare: the dispatcher
//! has no adapter for it and reports the platform as unsupported.

use super::CHECK_PROMPT;
use crate::error::Failure;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Url;
use serde::{Deserialize, Serialize};

const NAME: &str = "Cloudflare";
const CHECK_MODEL: &str = "@cf/meta/llama-2-7b-chat-int8";

#[derive(Debug, Clone)]
pub struct CloudflareClient {
    http: reqwest::Client,
    api_base: Url,
}

impl CloudflareClient {
    pub fn new(http: reqwest::Client, api_base: Url) -> Self {
        Self { http, api_base }
    }

    fn build_url(&self, account_id: &str, model: &str) -> Result<Url, Failure> {
        self.api_base
            .join(&format!("client/v4/accounts/{account_id}/ai/run/{model}"))
            .map_err(|e| Failure::Api(format!("bad Cloudflare URL: {e}")))
    }

    pub async fn check(&self, account_id: &str, api_key: &str) -> Result<(), Failure> {
        let (account_id, api_key) = (account_id.trim(), api_key.trim());
        if account_id.is_empty() {
            return Err(Failure::MissingAccountId);
        }
        if api_key.is_empty() {
            return Err(Failure::MissingApiKey);
        }

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let auth = HeaderValue::from_str(&format!("Bearer {api_key}"))
            .map_err(|_| Failure::InvalidApiKey)?;
        headers.insert(AUTHORIZATION, auth);

        let body = RunRequest {
            messages: vec![Message {
                role: "user",
                content: CHECK_PROMPT,
            }],
        };

        let url = self.build_url(account_id, CHECK_MODEL)?;
        tracing::debug!(model = CHECK_MODEL, "sending Cloudflare Worker AI run");
        let resp = self
            .http
            .post(url)
            .headers(headers)
            .json(&body)
            .send()
            .await
            .map_err(|e| Failure::network(NAME, e))?;

        let status = resp.status();
        let text = resp.text().await.map_err(|e| Failure::network(NAME, e))?;
        let parsed: Option<RunResponse> = serde_json::from_str(&text).ok();

        if status.is_success() && parsed.as_ref().is_some_and(|p| p.success) {
            return Ok(());
        }
        tracing::warn!(%status, "Cloudflare check failed");
        let message = parsed
            .and_then(|p| p.errors.into_iter().next())
            .and_then(|e| e.message)
            .unwrap_or_else(|| "Unknown error occurred".to_string());
        Err(Failure::Api(message))
    }
}

#[derive(Debug, Serialize)]
struct RunRequest<'a> {
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct RunResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    errors: Vec<RunError>,
}

#[derive(Debug, Deserialize)]
struct RunError {
    #[serde(default)]
    message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::{matchers, Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> CloudflareClient {
        CloudflareClient::new(reqwest::Client::new(), Url::parse(&server.uri()).unwrap())
    }

    #[tokio::test]
    async fn test_check_success() {
        let server = MockServer::start().await;
        Mock::given(matchers::method("POST"))
            .and(matchers::path(
                "/client/v4/accounts/acc123/ai/run/@cf/meta/llama-2-7b-chat-int8",
            ))
            .and(matchers::header("authorization", "Bearer cf-key"))
            .and(matchers::body_partial_json(json!({
                "messages": [{"role": "user", "content": CHECK_PROMPT}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "result": {"response": "API test successful"},
                "success": true,
                "errors": [],
                "messages": []
            })))
            .expect(1)
            .mount(&server)
            .await;

        client(&server).check("acc123", "cf-key").await.unwrap();
    }

    #[tokio::test]
    async fn test_check_reports_first_error() {
        let server = MockServer::start().await;
        Mock::given(matchers::method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "success": false,
                "errors": [{"code": 10000, "message": "Authentication error"}]
            })))
            .mount(&server)
            .await;

        let err = client(&server).check("acc123", "bad").await.unwrap_err();
        assert_eq!(err.to_string(), "Authentication error");
    }

    #[tokio::test]
    async fn test_check_unparseable_body() {
        let server = MockServer::start().await;
        Mock::given(matchers::method("POST"))
            .respond_with(ResponseTemplate::new(502).set_body_string("Bad gateway"))
            .mount(&server)
            .await;

        let err = client(&server).check("acc123", "k").await.unwrap_err();
        assert_eq!(err.to_string(), "Unknown error occurred");
    }

    #[tokio::test]
    async fn test_check_requires_both_credentials() {
        let server = MockServer::start().await;
        Mock::given(matchers::any())
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let c = client(&server);
        assert!(matches!(c.check("", "k").await, Err(Failure::MissingAccountId)));
        assert!(matches!(c.check("acc", "").await, Err(Failure::MissingApiKey)));
        assert!(matches!(c.check("acc", "cf\u{7f}key").await, Err(Failure::InvalidApiKey)));
    }
}
