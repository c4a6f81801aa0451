use super::{Provider, ProviderConfig, Reply, TextRequest, CHECK_PROMPT};
use crate::error::Failure;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{StatusCode, Url};
use serde::{Deserialize, Serialize};

const NAME: &str = "OpenRouter";
const CHECK_MODEL: &str = "openai/gpt-3.5-turbo";

/// Attribution headers OpenRouter shows on its dashboard.
const REFERER: &str = "https://github.com/johnle/chromium-intelligence";
const TITLE: &str = "Chromium Intelligence";

#[derive(Debug, Clone)]
pub struct OpenRouterProvider {
    http: reqwest::Client,
    api_base: Url,
}

impl OpenRouterProvider {
    pub fn new(http: reqwest::Client, api_base: Url) -> Self {
        Self { http, api_base }
    }

    fn headers(api_key: &str, attribution: bool) -> Result<HeaderMap, Failure> {
        let mut h = HeaderMap::new();
        h.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let auth = HeaderValue::from_str(&format!("Bearer {api_key}"))
            .map_err(|_| Failure::InvalidApiKey)?;
        h.insert(AUTHORIZATION, auth);
        if attribution {
            h.insert(HeaderName::from_static("http-referer"), HeaderValue::from_static(REFERER));
            h.insert(HeaderName::from_static("x-title"), HeaderValue::from_static(TITLE));
        }
        Ok(h)
    }

    async fn post(
        &self,
        headers: HeaderMap,
        body: &ChatCompletionRequest<'_>,
    ) -> Result<(StatusCode, String), Failure> {
        let url = self
            .api_base
            .join("api/v1/chat/completions")
            .map_err(|e| Failure::Api(format!("bad OpenRouter base URL: {e}")))?;
        tracing::debug!(model = body.model, "sending OpenRouter chat completion");

        let resp = self
            .http
            .post(url)
            .headers(headers)
            .json(body)
            .send()
            .await
            .map_err(|e| Failure::network(NAME, e))?;

        let status = resp.status();
        let text = resp.text().await.map_err(|e| Failure::network(NAME, e))?;
        if !status.is_success() {
            tracing::warn!(%status, "OpenRouter API returned an error status");
        }
        Ok((status, text))
    }

    pub async fn check(&self, api_key: &str) -> Result<(), Failure> {
        if api_key.trim().is_empty() {
            return Err(Failure::MissingApiKey);
        }

        let body = ChatCompletionRequest {
            model: CHECK_MODEL,
            messages: vec![Message {
                role: "user",
                content: CHECK_PROMPT,
            }],
        };
        let (status, text) = self.post(Self::headers(api_key.trim(), true)?, &body).await?;

        let parsed: Option<ChatCompletionResponse> = serde_json::from_str(&text).ok();
        if status.is_success() && parsed.as_ref().and_then(first_content).is_some() {
            return Ok(());
        }
        let message = parsed
            .and_then(|p| p.error)
            .and_then(|e| e.message)
            .unwrap_or_else(|| "Unknown error occurred".to_string());
        Err(Failure::Api(message))
    }
}

#[async_trait]
impl Provider for OpenRouterProvider {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn send_text(&self, config: &ProviderConfig, req: &TextRequest) -> Result<Reply, Failure> {
        let user_text = req.user_text();
        let body = ChatCompletionRequest {
            model: &config.model,
            messages: vec![
                Message {
                    role: "system",
                    content: &req.system_instruction,
                },
                Message {
                    role: "user",
                    content: &user_text,
                },
            ],
        };

        let (status, text) = self.post(Self::headers(&config.api_key, false)?, &body).await?;
        if !status.is_success() {
            return Err(Failure::Http {
                status: status.as_u16(),
                body: text,
            });
        }

        serde_json::from_str::<ChatCompletionResponse>(&text)
            .ok()
            .as_ref()
            .and_then(first_content)
            .map(|text| Reply { text })
            .ok_or(Failure::NoValidResponse(NAME))
    }
}

/// `choices[0].message.content`
fn first_content(r: &ChatCompletionResponse) -> Option<String> {
    r.choices.first()?.message.as_ref()?.content.clone()
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    error: Option<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    #[serde(default)]
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    #[serde(default)]
    message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ProviderKind;
    use serde_json::json;
    use wiremock::{matchers, Mock, MockServer, ResponseTemplate};

    const PATH: &str = "/api/v1/chat/completions";

    fn provider(server: &MockServer) -> OpenRouterProvider {
        OpenRouterProvider::new(reqwest::Client::new(), Url::parse(&server.uri()).unwrap())
    }

    fn config() -> ProviderConfig {
        ProviderConfig {
            kind: ProviderKind::OpenRouter,
            model: "meta-llama/llama-3-8b-instruct".into(),
            api_key: "sk-or-test".into(),
            account_id: None,
        }
    }

    fn request() -> TextRequest {
        TextRequest {
            system_instruction: "You are a summarization assistant.".into(),
            pre_prompt: "Summarize this:\n\n".into(),
            text: "Long text.".into(),
        }
    }

    #[tokio::test]
    async fn test_send_text_success() {
        let server = MockServer::start().await;
        Mock::given(matchers::method("POST"))
            .and(matchers::path(PATH))
            .and(matchers::header("authorization", "Bearer sk-or-test"))
            .and(matchers::body_json(json!({
                "model": "meta-llama/llama-3-8b-instruct",
                "messages": [
                    {"role": "system", "content": "You are a summarization assistant."},
                    {"role": "user", "content": "Summarize this:\n\nLong text."}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "gen-1",
                "choices": [{"index": 0, "message": {"role": "assistant", "content": "Short."}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let reply = provider(&server).send_text(&config(), &request()).await.unwrap();
        assert_eq!(reply.text, "Short.");
    }

    #[tokio::test]
    async fn test_send_text_empty_choices() {
        let server = MockServer::start().await;
        Mock::given(matchers::method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
            .mount(&server)
            .await;

        let err = provider(&server).send_text(&config(), &request()).await.unwrap_err();
        assert_eq!(err.to_string(), "No valid response from OpenRouter API");
    }

    #[tokio::test]
    async fn test_send_text_error_status() {
        let server = MockServer::start().await;
        Mock::given(matchers::method("POST"))
            .respond_with(ResponseTemplate::new(402).set_body_string("insufficient credits"))
            .mount(&server)
            .await;

        let err = provider(&server).send_text(&config(), &request()).await.unwrap_err();
        assert!(matches!(err, Failure::Http { status: 402, .. }));
    }

    #[tokio::test]
    async fn test_multimodal_is_gemini_only() {
        let server = MockServer::start().await;
        Mock::given(matchers::any())
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let req = crate::provider::MultimodalRequest {
            prompt: "p".into(),
            inline: crate::provider::InlineData {
                base64_content: "AAAA".into(),
                mime_type: "image/png".into(),
            },
        };
        let err = provider(&server).send_multimodal(&config(), &req).await.unwrap_err();
        assert!(matches!(err, Failure::GeminiOnly(_)));
    }

    #[tokio::test]
    async fn test_unsendable_key_is_rejected_locally() {
        let server = MockServer::start().await;
        Mock::given(matchers::any())
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let cfg = ProviderConfig {
            api_key: "sk-or-\u{7f}bad".into(),
            ..config()
        };
        let err = provider(&server).send_text(&cfg, &request()).await.unwrap_err();
        assert!(matches!(err, Failure::InvalidApiKey));
        assert_eq!(err.kind(), crate::error::FailureKind::Configuration);

        let err = provider(&server).check("sk-or-\u{7f}bad").await.unwrap_err();
        assert!(matches!(err, Failure::InvalidApiKey));
    }

    #[tokio::test]
    async fn test_check_sends_attribution_headers() {
        let server = MockServer::start().await;
        Mock::given(matchers::method("POST"))
            .and(matchers::path(PATH))
            .and(matchers::header("http-referer", REFERER))
            .and(matchers::header("x-title", TITLE))
            .and(matchers::body_partial_json(json!({"model": "openai/gpt-3.5-turbo"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"content": "API test successful"}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        provider(&server).check("sk-or-test").await.unwrap();
    }

    #[tokio::test]
    async fn test_check_reports_api_message() {
        let server = MockServer::start().await;
        Mock::given(matchers::method("POST"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_json(json!({"error": {"message": "No auth credentials found", "code": 401}})),
            )
            .mount(&server)
            .await;

        let err = provider(&server).check("bad").await.unwrap_err();
        assert_eq!(err.to_string(), "No auth credentials found");
    }
}
