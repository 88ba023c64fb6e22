use crate::archive::{ArchiveOptions, DEFAULT_TIMESTAMP_PATTERN};
use config::{Config as ConfigLoader, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tagline_llm::LlmSettings;
use tagline_types::PipelineConfig;

/// Base name looked up in the working directory (settings.json, settings.toml, ...)
pub const DEFAULT_SETTINGS_NAME: &str = "settings";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub llm: LlmSettings,
    #[serde(default)]
    pub pipeline: PipelineSettings,
    #[serde(default)]
    pub paths: PathSettings,
    #[serde(default)]
    pub archive: ArchiveSettings,
    #[serde(default)]
    pub logging: LoggingSettings,

    /// File the settings were read from, if any
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    pub enable_analysis: bool,
    pub max_concurrent_requests: usize,
    pub max_retry_attempts: u32,
    pub retry_delay_seconds: u64,
    pub request_timeout_seconds: u64,
    pub temperature: f32,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        let defaults = PipelineConfig::default();
        Self {
            enable_analysis: true,
            max_concurrent_requests: defaults.max_concurrent_requests,
            max_retry_attempts: defaults.max_retry_attempts,
            retry_delay_seconds: defaults.retry_delay.as_secs(),
            request_timeout_seconds: defaults.request_timeout.as_secs(),
            temperature: defaults.temperature,
        }
    }
}

impl From<&PipelineSettings> for PipelineConfig {
    fn from(settings: &PipelineSettings) -> Self {
        PipelineConfig::new()
            .with_max_concurrent_requests(settings.max_concurrent_requests)
            .with_max_retry_attempts(settings.max_retry_attempts)
            .with_retry_delay(Duration::from_secs(settings.retry_delay_seconds))
            .with_request_timeout(Duration::from_secs(settings.request_timeout_seconds))
            .with_temperature(settings.temperature)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PathSettings {
    pub input_html: PathBuf,
    pub keys_file: PathBuf,
    pub structured_json: PathBuf,
    pub checkpoint: PathBuf,
    pub output_json: PathBuf,
    pub output_txt: PathBuf,
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            input_html: "activity.html".into(),
            keys_file: "valid_keys.txt".into(),
            structured_json: "structured_history.json".into(),
            checkpoint: "indexed_and_tagged_history.jsonl".into(),
            output_json: "processed_history.json".into(),
            output_txt: "processed_history.txt".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ArchiveSettings {
    /// Word that starts every exported conversation
    pub separator: String,
    pub timestamp_pattern: String,
}

impl Default for ArchiveSettings {
    fn default() -> Self {
        Self {
            separator: "Prompted".to_string(),
            timestamp_pattern: DEFAULT_TIMESTAMP_PATTERN.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            format: LogFormat::default(),
        }
    }
}

pub const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl Settings {
    /// Load settings from a file and environment variables
    ///
    /// Hierarchy (weakest to strongest):
    /// 1. built-in defaults
    /// 2. the given file, or `settings.{json,toml,yaml}` in the working directory
    /// 3. `TAGLINE_*` environment variables (`TAGLINE_LLM__PROVIDER=openai`)
    ///
    /// An explicitly given file must exist; the default one is optional.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name(DEFAULT_SETTINGS_NAME).required(false),
        };

        let config = ConfigLoader::builder()
            .add_source(file)
            .add_source(
                Environment::with_prefix("TAGLINE")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut settings: Settings = config.try_deserialize()?;
        settings.source = match path {
            Some(path) => Some(path.to_path_buf()),
            None => find_default_file(),
        };
        Ok(settings)
    }

    /// Load settings from a specific path only (useful for testing)
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config = ConfigLoader::builder()
            .add_source(File::from(path.as_ref()))
            .build()?;
        let mut settings: Settings = config.try_deserialize()?;
        settings.source = Some(path.as_ref().to_path_buf());
        Ok(settings)
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig::from(&self.pipeline)
    }

    pub fn archive_options(&self) -> Result<ArchiveOptions, regex::Error> {
        ArchiveOptions::new(&self.archive.separator, &self.archive.timestamp_pattern)
    }
}

fn find_default_file() -> Option<PathBuf> {
    ["json", "toml", "yaml", "yml"]
        .iter()
        .map(|ext| PathBuf::from(format!("{}.{}", DEFAULT_SETTINGS_NAME, ext)))
        .find(|p| p.exists())
}
