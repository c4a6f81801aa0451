use crate::cli::{CheckTarget, SettingsCommand};
use crate::dispatch::Dispatcher;
use crate::fetch::FileType;
use crate::provider::cloudflare::CloudflareClient;
use crate::provider::gemini::GeminiProvider;
use crate::provider::openrouter::OpenRouterProvider;
use crate::provider::{Endpoints, Reply};
use crate::settings::{FileStore, Settings, SettingsStore};
use crate::{host, prompts};
use anyhow::Context;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, BufReader};

fn print_reply(reply: &Reply) -> anyhow::Result<()> {
    let mut out = std::io::stdout().lock();
    writeln!(out, "{}", reply.text)?;
    out.flush()?;
    Ok(())
}

pub async fn cmd_run(
    dispatcher: &Dispatcher<FileStore>,
    action: &str,
    text: Vec<String>,
) -> anyhow::Result<()> {
    let input = if text.is_empty() {
        let mut buf = String::new();
        tokio::io::stdin()
            .read_to_string(&mut buf)
            .await
            .context("failed to read text from stdin")?;
        buf
    } else {
        text.join(" ")
    };
    if input.trim().is_empty() {
        anyhow::bail!("No text provided. Try: intelligence run Proofread \"Their is a typo\"");
    }

    let reply = dispatcher.dispatch(action, &input).await?;
    if reply.text.trim() == prompts::INCOMPATIBLE_SENTINEL {
        tracing::info!(action, "model reported the text as unsuitable for this action");
    }
    print_reply(&reply)
}

pub async fn cmd_file(
    dispatcher: &Dispatcher<FileStore>,
    location: &str,
    file_type: FileType,
    prompt: &str,
) -> anyhow::Result<()> {
    if prompt.trim().is_empty() {
        anyhow::bail!("No prompt provided for the {}", file_type.label());
    }
    let reply = dispatcher
        .dispatch_multimodal(location, file_type, prompt)
        .await?;
    print_reply(&reply)
}

pub fn cmd_actions() -> anyhow::Result<()> {
    let mut out = std::io::stdout().lock();
    for t in prompts::all() {
        writeln!(out, "{}\t{}", t.action_name, t.pre_prompt.trim_end())?;
    }
    Ok(())
}

pub fn cmd_settings(path: &Path, cmd: SettingsCommand) -> anyhow::Result<()> {
    match cmd {
        SettingsCommand::Show => {
            let settings = Settings::load_or_default(path)?;
            let text = toml::to_string_pretty(&settings.masked())
                .context("failed to render settings")?;
            print!("{text}");
            Ok(())
        }
        SettingsCommand::Set { key, value } => {
            let mut settings = Settings::load_or_default(path)?;
            settings.set(&key, &value)?;
            settings.save_atomic(path)?;
            tracing::info!(key = %key, path = %path.display(), "settings saved");
            Ok(())
        }
        SettingsCommand::Path => {
            println!("{}", path.display());
            Ok(())
        }
    }
}

pub async fn cmd_check(
    http: &reqwest::Client,
    endpoints: &Endpoints,
    store: &FileStore,
    target: CheckTarget,
) -> anyhow::Result<()> {
    let settings = store.snapshot().await?;
    let (label, result) = match target {
        CheckTarget::Gemini => {
            let p = GeminiProvider::new(http.clone(), endpoints.gemini.clone());
            ("Gemini", p.check(&settings.gemini_api_key).await)
        }
        CheckTarget::Openrouter => {
            let p = OpenRouterProvider::new(http.clone(), endpoints.openrouter.clone());
            ("OpenRouter", p.check(&settings.openrouter_api_key).await)
        }
        CheckTarget::Cloudflare => {
            let c = CloudflareClient::new(http.clone(), endpoints.cloudflare.clone());
            (
                "Cloudflare",
                c.check(&settings.cloudflare_id, &settings.cloudflare_api_key)
                    .await,
            )
        }
    };

    match result {
        Ok(()) => {
            println!("{label} API test successful!");
            Ok(())
        }
        Err(e) => anyhow::bail!("{label} API test failed: {e}"),
    }
}

pub async fn cmd_host(dispatcher: Dispatcher<FileStore>) -> anyhow::Result<()> {
    let input = BufReader::new(tokio::io::stdin());
    host::run(Arc::new(dispatcher), input, tokio::io::stdout()).await?;
    Ok(())
}
