use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Every key the settings file understands, in display order.
pub const KEYS: [&str; 8] = [
    "platform",
    "model",
    "use_specific_model",
    "custom_model",
    "gemini_api_key",
    "openrouter_api_key",
    "cloudflare_id",
    "cloudflare_api_key",
];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Display name of the provider, e.g. "Gemini", "OpenRouter", "Cloudflare Worker AI".
    pub platform: String,

    /// Preset Gemini model.
    pub model: String,

    /// Use `custom_model` instead of `model` for Gemini.
    pub use_specific_model: bool,

    /// Free-form model id; the only model source for OpenRouter and Cloudflare.
    pub custom_model: String,

    pub gemini_api_key: String,
    pub openrouter_api_key: String,
    pub cloudflare_id: String,
    pub cloudflare_api_key: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            platform: "Gemini".to_string(),
            model: "gemini-1.5-flash".to_string(),
            use_specific_model: false,
            custom_model: String::new(),
            gemini_api_key: String::new(),
            openrouter_api_key: String::new(),
            cloudflare_id: String::new(),
            cloudflare_api_key: String::new(),
        }
    }
}

impl Settings {
    /// Load settings if the file exists, otherwise return Ok(None).
    pub fn load_optional(path: impl AsRef<Path>) -> anyhow::Result<Option<Self>> {
        let path = path.as_ref();
        Self::from_read(std::fs::read(path), path)
    }

    /// Parse the outcome of reading `path`; a missing file is Ok(None).
    fn from_read(read: std::io::Result<Vec<u8>>, path: &Path) -> anyhow::Result<Option<Self>> {
        let bytes = match read {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(anyhow::Error::new(e))
                    .with_context(|| format!("failed to read settings: {}", path.display()))
            }
        };

        let s = String::from_utf8(bytes).context("settings file is not valid UTF-8")?;
        let settings: Settings = toml::from_str(&s)
            .with_context(|| format!("failed to parse TOML: {}", path.display()))?;
        Ok(Some(settings))
    }

    pub fn load_or_default(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        Ok(Self::load_optional(path)?.unwrap_or_default())
    }

    /// Write via a temp file and rename so readers never see a partial file.
    pub fn save_atomic(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let path = path.as_ref();
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create settings directory: {}", dir.display()))?;

        let tmp = tmp_path(path);
        let text = toml::to_string_pretty(self).context("failed to serialize settings")?;
        std::fs::write(&tmp, text)
            .with_context(|| format!("failed to write temp settings: {}", tmp.display()))?;
        std::fs::rename(&tmp, path)
            .with_context(|| format!("failed to move settings into place: {}", path.display()))?;
        Ok(())
    }

    pub fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        let slot = match key {
            "platform" => &mut self.platform,
            "model" => &mut self.model,
            "custom_model" => &mut self.custom_model,
            "gemini_api_key" => &mut self.gemini_api_key,
            "openrouter_api_key" => &mut self.openrouter_api_key,
            "cloudflare_id" => &mut self.cloudflare_id,
            "cloudflare_api_key" => &mut self.cloudflare_api_key,
            "use_specific_model" => {
                self.use_specific_model = parse_bool(value)
                    .with_context(|| format!("use_specific_model expects true/false, got {value:?}"))?;
                return Ok(());
            }
            other => anyhow::bail!("unknown settings key: {other} (expected one of: {})", KEYS.join(", ")),
        };
        *slot = value.to_string();
        Ok(())
    }

    /// Fill empty credentials from the environment.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|var| std::env::var(var).ok())
    }

    fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let pairs: [(&mut String, &str); 4] = [
            (&mut self.gemini_api_key, "GEMINI_API_KEY"),
            (&mut self.openrouter_api_key, "OPENROUTER_API_KEY"),
            (&mut self.cloudflare_api_key, "CLOUDFLARE_API_KEY"),
            (&mut self.cloudflare_id, "CLOUDFLARE_ACCOUNT_ID"),
        ];
        for (slot, var) in pairs {
            if slot.is_empty() {
                if let Some(v) = lookup(var) {
                    *slot = v;
                }
            }
        }
        self
    }

    /// Copy suitable for printing: secrets reduced to their last four characters.
    pub fn masked(&self) -> Self {
        Self {
            gemini_api_key: mask(&self.gemini_api_key),
            openrouter_api_key: mask(&self.openrouter_api_key),
            cloudflare_api_key: mask(&self.cloudflare_api_key),
            ..self.clone()
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

fn mask(secret: &str) -> String {
    let n = secret.chars().count();
    if n == 0 {
        return String::new();
    }
    if n <= 4 {
        return "*".repeat(n);
    }
    let tail: String = secret.chars().skip(n - 4).collect();
    format!("{}{tail}", "*".repeat(n - 4))
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut p = path.to_path_buf();
    let file = path
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "settings.toml".to_string());
    p.set_file_name(format!("{file}.tmp"));
    p
}

/// Read-only view of the settings, taken once per request.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn snapshot(&self) -> anyhow::Result<Settings>;
}

/// A fixed in-memory snapshot.
#[async_trait]
impl SettingsStore for Settings {
    async fn snapshot(&self) -> anyhow::Result<Settings> {
        Ok(self.clone())
    }
}

/// Command-line overrides applied on top of the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub platform: Option<String>,
    pub model: Option<String>,
}

/// Settings file on disk, re-read for every snapshot.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
    overrides: Overrides,
}

impl FileStore {
    pub fn new(path: PathBuf, overrides: Overrides) -> Self {
        Self { path, overrides }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl SettingsStore for FileStore {
    async fn snapshot(&self) -> anyhow::Result<Settings> {
        let read = tokio::fs::read(&self.path).await;
        let mut settings = Settings::from_read(read, &self.path)?.unwrap_or_default();

        if let Some(platform) = &self.overrides.platform {
            settings.platform = platform.clone();
        }
        if let Some(model) = &self.overrides.model {
            settings.use_specific_model = true;
            settings.custom_model = model.clone();
        }

        Ok(settings.with_env_overrides())
    }
}
