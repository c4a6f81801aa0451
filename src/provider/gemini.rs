use super::{
    MultimodalRequest, Provider, ProviderConfig, Reply, TextRequest, CHECK_PROMPT,
};
use crate::error::Failure;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{StatusCode, Url};
use serde::{Deserialize, Serialize};

const NAME: &str = "Gemini";

/// Model used by the connectivity check, independent of the configured one.
const CHECK_MODEL: &str = "gemini-1.5-pro";

#[derive(Debug, Clone)]
pub struct GeminiProvider {
    http: reqwest::Client,
    api_base: Url,
}

impl GeminiProvider {
    pub fn new(http: reqwest::Client, api_base: Url) -> Self {
        Self { http, api_base }
    }

    fn build_url(&self, model: &str, api_key: &str) -> Result<Url, Failure> {
        // Docs: https://ai.google.dev/api/rest/v1beta/models/generateContent
        let mut url = self
            .api_base
            .join(&format!("v1beta/models/{model}:generateContent"))
            .map_err(|_| Failure::InvalidModel(model.to_string()))?;
        url.query_pairs_mut().append_pair("key", api_key);
        Ok(url)
    }

    fn headers() -> HeaderMap {
        let mut h = HeaderMap::new();
        h.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        h
    }

    async fn post<B: Serialize + ?Sized>(
        &self,
        model: &str,
        api_key: &str,
        body: &B,
    ) -> Result<(StatusCode, String), Failure> {
        let url = self.build_url(model, api_key)?;
        tracing::debug!(model, "sending Gemini generateContent");

        let resp = self
            .http
            .post(url)
            .headers(Self::headers())
            .json(body)
            .send()
            .await
            .map_err(|e| Failure::network(NAME, e))?;

        let status = resp.status();
        let text = resp.text().await.map_err(|e| Failure::network(NAME, e))?;
        if !status.is_success() {
            tracing::warn!(%status, "Gemini API returned an error status");
        }
        Ok((status, text))
    }

    /// Send a fixed greeting with the given key and report whether a reply came back.
    pub async fn check(&self, api_key: &str) -> Result<(), Failure> {
        if api_key.trim().is_empty() {
            return Err(Failure::MissingApiKey);
        }

        let body = TextGenerateRequest {
            system_instruction: None,
            contents: PartsObject {
                parts: TextPart { text: CHECK_PROMPT },
            },
        };
        let (status, text) = self.post(CHECK_MODEL, api_key.trim(), &body).await?;

        let parsed: Option<GenerateContentResponse> = serde_json::from_str(&text).ok();
        if status.is_success() && parsed.as_ref().and_then(first_text).is_some() {
            return Ok(());
        }
        Err(Failure::Api(api_error_message(&text)))
    }
}

#[async_trait]
impl Provider for GeminiProvider {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn send_text(&self, config: &ProviderConfig, req: &TextRequest) -> Result<Reply, Failure> {
        let user_text = req.user_text();
        let body = TextGenerateRequest {
            system_instruction: Some(PartsObject {
                parts: TextPart {
                    text: &req.system_instruction,
                },
            }),
            contents: PartsObject {
                parts: TextPart { text: &user_text },
            },
        };

        let (status, text) = self.post(&config.model, &config.api_key, &body).await?;
        if !status.is_success() {
            return Err(Failure::Http {
                status: status.as_u16(),
                body: text,
            });
        }

        serde_json::from_str::<GenerateContentResponse>(&text)
            .ok()
            .as_ref()
            .and_then(first_text)
            .map(|text| Reply { text })
            .ok_or(Failure::NoValidResponse(NAME))
    }

    async fn send_multimodal(
        &self,
        config: &ProviderConfig,
        req: &MultimodalRequest,
    ) -> Result<Reply, Failure> {
        let body = MultimodalGenerateRequest {
            contents: vec![Content {
                parts: vec![
                    Part::Text { text: &req.prompt },
                    Part::InlineData {
                        inline_data: InlineBlob {
                            mime_type: &req.inline.mime_type,
                            data: &req.inline.base64_content,
                        },
                    },
                ],
            }],
        };

        tracing::debug!(
            mime_type = %req.inline.mime_type,
            bytes_b64 = req.inline.base64_content.len(),
            "sending Gemini inline data"
        );
        let (status, text) = self.post(&config.model, &config.api_key, &body).await?;
        if !status.is_success() {
            return Err(Failure::Http {
                status: status.as_u16(),
                body: text,
            });
        }

        let value: serde_json::Value =
            serde_json::from_str(&text).map_err(|_| Failure::InvalidResponse(text.clone()))?;
        serde_json::from_value::<GenerateContentResponse>(value.clone())
            .ok()
            .as_ref()
            .and_then(first_text)
            .map(|text| Reply { text })
            .ok_or_else(|| Failure::InvalidResponse(value.to_string()))
    }
}

/// `candidates[0].content.parts[0].text`
fn first_text(r: &GenerateContentResponse) -> Option<String> {
    let cand = r.candidates.first()?;
    let content = cand.content.as_ref()?;
    content.parts.first()?.text.clone()
}

fn api_error_message(body: &str) -> String {
    serde_json::from_str::<ApiErrorBody>(body)
        .ok()
        .and_then(|b| b.error)
        .and_then(|e| e.message)
        .unwrap_or_else(|| "Unknown error occurred".to_string())
}

#[derive(Debug, Serialize)]
struct TextGenerateRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<PartsObject<'a>>,
    contents: PartsObject<'a>,
}

#[derive(Debug, Serialize)]
struct PartsObject<'a> {
    parts: TextPart<'a>,
}

#[derive(Debug, Serialize)]
struct TextPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct MultimodalGenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part<'a> {
    Text { text: &'a str },
    InlineData { inline_data: InlineBlob<'a> },
}

#[derive(Debug, Serialize)]
struct InlineBlob<'a> {
    mime_type: &'a str,
    data: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Clone, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Clone, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Clone, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    error: Option<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    #[serde(default)]
    message: Option<String>,
}
