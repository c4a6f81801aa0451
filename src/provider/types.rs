use crate::error::Failure;
use crate::prompts::PromptTemplate;
use crate::settings::Settings;
use async_trait::async_trait;
use reqwest::Url;

/// The closed set of backends a settings file can select.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Gemini,
    OpenRouter,
    Cloudflare,
}

impl ProviderKind {
    /// Map a stored platform name to a provider.
    ///
    /// Matching ignores case and all whitespace, so "Cloudflare Worker AI" and
    /// "cloudflareworkerai" are the same. An empty value means Gemini.
    pub fn parse(raw: &str) -> Option<Self> {
        let key: String = raw
            .chars()
            .filter(|c| !c.is_whitespace())
            .flat_map(char::to_lowercase)
            .collect();
        match key.as_str() {
            "" | "gemini" => Some(Self::Gemini),
            "openrouter" => Some(Self::OpenRouter),
            "cloudflareworkerai" => Some(Self::Cloudflare),
            _ => None,
        }
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, Failure> {
        Self::parse(&settings.platform)
            .ok_or_else(|| Failure::UnsupportedPlatform(settings.platform.clone()))
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Gemini => "Gemini",
            Self::OpenRouter => "OpenRouter",
            Self::Cloudflare => "Cloudflare Worker AI",
        }
    }
}

/// Per-request credentials and model, resolved from one settings snapshot.
#[derive(Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    pub model: String,
    pub api_key: String,
    pub account_id: Option<String>,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("kind", &self.kind)
            .field("model", &self.model)
            .field("api_key", &"<redacted>")
            .field("account_id", &self.account_id)
            .finish()
    }
}

impl ProviderConfig {
    pub fn resolve(kind: ProviderKind, settings: &Settings) -> Result<Self, Failure> {
        let (api_key, model, account_id) = match kind {
            ProviderKind::Gemini => {
                let model = if settings.use_specific_model {
                    &settings.custom_model
                } else {
                    &settings.model
                };
                (&settings.gemini_api_key, model, None)
            }
            ProviderKind::OpenRouter => (&settings.openrouter_api_key, &settings.custom_model, None),
            ProviderKind::Cloudflare => (
                &settings.cloudflare_api_key,
                &settings.custom_model,
                Some(&settings.cloudflare_id),
            ),
        };

        if api_key.trim().is_empty() {
            return Err(Failure::MissingApiKey);
        }
        let account_id = match account_id {
            Some(id) if id.trim().is_empty() => return Err(Failure::MissingAccountId),
            Some(id) => Some(id.trim().to_string()),
            None => None,
        };
        if model.trim().is_empty() {
            return Err(Failure::MissingModel(kind.display_name()));
        }

        Ok(Self {
            kind,
            model: model.trim().to_string(),
            api_key: api_key.trim().to_string(),
            account_id,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRequest {
    pub system_instruction: String,
    pub pre_prompt: String,
    pub text: String,
}

impl TextRequest {
    pub fn from_template(template: &PromptTemplate, text: impl Into<String>) -> Self {
        Self {
            system_instruction: template.system_instruction.to_string(),
            pre_prompt: template.pre_prompt.to_string(),
            text: text.into(),
        }
    }

    /// The user turn sent to the model: pre-prompt immediately followed by the text.
    pub fn user_text(&self) -> String {
        format!("{}{}", self.pre_prompt, self.text)
    }
}

/// Base64 file content plus its MIME type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineData {
    pub base64_content: String,
    pub mime_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultimodalRequest {
    pub prompt: String,
    pub inline: InlineData,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
}

/// Base URLs of the remote APIs; tests point these at a mock server.
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub gemini: Url,
    pub openrouter: Url,
    pub cloudflare: Url,
}

impl Endpoints {
    #[cfg(test)]
    pub fn all_at(base: &Url) -> Self {
        Self {
            gemini: base.clone(),
            openrouter: base.clone(),
            cloudflare: base.clone(),
        }
    }

    pub fn production() -> anyhow::Result<Self> {
        Ok(Self {
            gemini: Url::parse("https://generativelanguage.googleapis.com/")?,
            openrouter: Url::parse("https://openrouter.ai/")?,
            cloudflare: Url::parse("https://api.cloudflare.com/")?,
        })
    }
}

/// Adapter interface.
///
/// Every adapter reports through the same `Result<Reply, Failure>` so callers never
/// branch on the provider after dispatch.
#[async_trait]
pub trait Provider: Send + Sync {
    fn name(&self) -> &'static str;

    async fn send_text(&self, config: &ProviderConfig, req: &TextRequest) -> Result<Reply, Failure>;

    /// Text plus one inline file. Only Gemini supports this.
    async fn send_multimodal(
        &self,
        _config: &ProviderConfig,
        _req: &MultimodalRequest,
    ) -> Result<Reply, Failure> {
        Err(Failure::GeminiOnly("File"))
    }
}
