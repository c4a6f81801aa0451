use crate::fetch::FileType;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Writing actions and file prompts over Gemini or OpenRouter
#[derive(Debug, Parser)]
#[command(name = "intelligence")]
#[command(version)]
#[command(about = "Proofread, rewrite, summarize text or ask about images and PDFs with an LLM", long_about = None)]
pub struct Args {
    /// Platform override (e.g. "Gemini", "OpenRouter")
    #[arg(long = "platform", global = true)]
    pub platform: Option<String>,

    /// Model override (used as the custom model)
    #[arg(short = 'm', long = "model", global = true)]
    pub model: Option<String>,

    /// Settings file (default: <config dir>/settings.toml)
    #[arg(long = "settings", value_name = "PATH", global = true)]
    pub settings: Option<PathBuf>,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run a text action, e.g. `run Proofread "teh text"`; reads stdin when no text is given
    Run {
        /// Action name (see `actions`)
        action: String,
        /// Text to process
        text: Vec<String>,
    },

    /// Ask about an image or PDF (Gemini only)
    File {
        /// http(s) URL, data: URL, file:// URL or local path
        location: String,
        /// Kind of file
        #[arg(short = 't', long = "type", value_enum, default_value = "image")]
        file_type: FileType,
        /// What to ask about the file
        #[arg(short = 'p', long = "prompt")]
        prompt: String,
    },

    /// List the built-in actions
    Actions,

    /// Show or change settings
    Settings {
        #[command(subcommand)]
        cmd: SettingsCommand,
    },

    /// Send a test request to a provider with the stored credentials
    Check {
        #[arg(value_enum)]
        provider: CheckTarget,
    },

    /// Answer JSON requests read line by line from stdin
    Host,
}

#[derive(Debug, Subcommand)]
pub enum SettingsCommand {
    /// Print the current settings (API keys masked)
    Show,
    /// Set one key
    Set { key: String, value: String },
    /// Print the settings file location
    Path,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CheckTarget {
    Gemini,
    Openrouter,
    Cloudflare,
}
