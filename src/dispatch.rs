use crate::error::Failure;
use crate::fetch::{self, FileType};
use crate::prompts::{self, PromptTemplate};
use crate::provider::gemini::GeminiProvider;
use crate::provider::openrouter::OpenRouterProvider;
use crate::provider::{
    Endpoints, MultimodalRequest, Provider, ProviderConfig, ProviderKind, Reply, TextRequest,
};
use crate::settings::{Settings, SettingsStore};

/// Routes an action to the adapter selected by the current settings.
///
/// Every call takes its own settings snapshot, so concurrent calls share nothing
/// writable and a settings change never affects a request already in flight.
pub struct Dispatcher<S> {
    store: S,
    http: reqwest::Client,
    gemini: GeminiProvider,
    openrouter: OpenRouterProvider,
}

impl<S: SettingsStore> Dispatcher<S> {
    pub fn new(http: reqwest::Client, endpoints: &Endpoints, store: S) -> Self {
        Self {
            gemini: GeminiProvider::new(http.clone(), endpoints.gemini.clone()),
            openrouter: OpenRouterProvider::new(http.clone(), endpoints.openrouter.clone()),
            http,
            store,
        }
    }

    fn adapter(&self, kind: ProviderKind) -> Option<&dyn Provider> {
        match kind {
            ProviderKind::Gemini => Some(&self.gemini),
            ProviderKind::OpenRouter => Some(&self.openrouter),
            // Selectable and checkable, but there is no text adapter.
            ProviderKind::Cloudflare => None,
        }
    }

    async fn snapshot(&self) -> Result<Settings, Failure> {
        self.store
            .snapshot()
            .await
            .map_err(|e| Failure::Settings(format!("{e:#}")))
    }

    /// Resolve the provider, its adapter and credentials; no network access.
    fn select(&self, settings: &Settings) -> Result<(&dyn Provider, ProviderConfig), Failure> {
        let kind = ProviderKind::from_settings(settings)?;
        let adapter = self
            .adapter(kind)
            .ok_or_else(|| Failure::UnsupportedPlatform(settings.platform.clone()))?;
        let config = ProviderConfig::resolve(kind, settings)?;
        Ok((adapter, config))
    }

    pub async fn dispatch(&self, action_name: &str, input_text: &str) -> Result<Reply, Failure> {
        let template = prompts::lookup(action_name)
            .ok_or_else(|| Failure::UnknownAction(action_name.to_string()))?;
        self.dispatch_template(template, input_text).await
    }

    pub async fn dispatch_template(
        &self,
        template: &PromptTemplate,
        input_text: &str,
    ) -> Result<Reply, Failure> {
        let settings = self.snapshot().await?;
        let (adapter, config) = self.select(&settings)?;

        tracing::info!(
            action = template.action_name,
            provider = adapter.name(),
            model = %config.model,
            "dispatching text action"
        );
        let req = TextRequest::from_template(template, input_text);
        let result = adapter.send_text(&config, &req).await;
        if let Err(e) = &result {
            tracing::warn!(action = template.action_name, kind = ?e.kind(), error = %e, "text action failed");
        }
        result
    }

    pub async fn dispatch_multimodal(
        &self,
        file_url: &str,
        file_type: FileType,
        prompt: &str,
    ) -> Result<Reply, Failure> {
        let settings = self.snapshot().await?;
        if ProviderKind::parse(&settings.platform) != Some(ProviderKind::Gemini) {
            return Err(Failure::GeminiOnly(file_type.label()));
        }
        let (adapter, config) = self.select(&settings)?;

        tracing::info!(
            file_type = file_type.label(),
            provider = adapter.name(),
            model = %config.model,
            "dispatching file action"
        );
        let inline = fetch::load_inline(&self.http, file_url, file_type).await?;
        let req = MultimodalRequest {
            prompt: prompt.to_string(),
            inline,
        };
        let result = adapter.send_multimodal(&config, &req).await;
        if let Err(e) = &result {
            tracing::warn!(file_type = file_type.label(), kind = ?e.kind(), error = %e, "file action failed");
        }
        result
    }
}
