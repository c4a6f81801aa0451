mod app;
mod cli;
mod dispatch;
mod error;
mod fetch;
mod host;
mod paths;
mod prompts;
mod provider;
mod settings;

use anyhow::Context;
use clap::Parser;
use dispatch::Dispatcher;
use provider::Endpoints;
use settings::{FileStore, Overrides};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stdout carries replies (and host responses); logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = cli::Args::parse();

    let settings_path = match args.settings.clone() {
        Some(p) => p,
        None => paths::settings_path()?,
    };
    tracing::debug!(?settings_path, "resolved settings path");

    let store = FileStore::new(
        settings_path,
        Overrides {
            platform: args.platform.clone(),
            model: args.model.clone(),
        },
    );

    let http = reqwest::Client::builder()
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("failed to build HTTP client")?;
    let endpoints = Endpoints::production()?;

    match args.cmd {
        cli::Command::Actions => app::cmd_actions(),
        cli::Command::Check { provider } => {
            app::cmd_check(&http, &endpoints, &store, provider).await
        }
        cli::Command::Run { action, text } => {
            let dispatcher = Dispatcher::new(http, &endpoints, store);
            app::cmd_run(&dispatcher, &action, text).await
        }
        cli::Command::File {
            location,
            file_type,
            prompt,
        } => {
            let dispatcher = Dispatcher::new(http, &endpoints, store);
            app::cmd_file(&dispatcher, &location, file_type, &prompt).await
        }
        cli::Command::Host => {
            let dispatcher = Dispatcher::new(http, &endpoints, store);
            app::cmd_host(dispatcher).await
        }
        cli::Command::Settings { cmd } => app::cmd_settings(store.path(), cmd),
    }
}
