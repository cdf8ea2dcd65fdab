use anyhow::{Context, Result};
use ctc_assistant::{GeminiConfig, DEFAULT_BASE_URL};
use ctc_history::{BucketPolicy, HistoryConfig, DEFAULT_CAP};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "config.toml";
const APP_DIR_NAME: &str = "ctc-coach";

/// Values given on the command line. They win over everything else.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub data_dir: Option<PathBuf>,
    pub cap: Option<usize>,
}

/// `config.toml` in the data directory. Every field is optional.
#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub history_cap: Option<usize>,
    pub bucket_policy: Option<String>,
    pub gemini_base_url: Option<String>,
    pub api_key: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub data_dir: PathBuf,
    pub history: HistoryConfig,
    pub gemini: GeminiConfig,
}

impl Settings {
    pub fn load(overrides: &Overrides) -> Result<Self> {
        Self::resolve(overrides, |name| std::env::var(name).ok())
    }

    pub fn resolve(overrides: &Overrides, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let env = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let data_dir = overrides
            .data_dir
            .clone()
            .or_else(|| env("CTC_DATA_DIR").map(PathBuf::from))
            .or_else(default_data_dir)
            .context("Cannot determine a data directory; pass --data-dir or set CTC_DATA_DIR")?;

        let file = read_file_config(&data_dir)?;

        let cap = match overrides.cap {
            Some(cap) => cap,
            None => match env("CTC_HISTORY_CAP") {
                Some(raw) => raw
                    .trim()
                    .parse()
                    .with_context(|| format!("CTC_HISTORY_CAP must be a number, got {raw:?}"))?,
                None => file.history_cap.unwrap_or(DEFAULT_CAP),
            },
        };

        let bucket_policy = match env("CTC_BUCKET_POLICY").or(file.bucket_policy) {
            Some(raw) => raw
                .parse::<BucketPolicy>()
                .context("Invalid bucket policy")?,
            None => BucketPolicy::default(),
        };

        let api_key = env("GEMINI_API_KEY")
            .or_else(|| env("API_KEY"))
            .or(file.api_key)
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty());
        let base_url = env("CTC_GEMINI_BASE_URL")
            .or(file.gemini_base_url)
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        Ok(Self {
            data_dir,
            history: HistoryConfig { cap, bucket_policy },
            gemini: GeminiConfig {
                api_key,
                base_url,
                ..GeminiConfig::default()
            },
        })
    }
}

fn default_data_dir() -> Option<PathBuf> {
    dirs::data_dir().map(|dir| dir.join(APP_DIR_NAME))
}

fn read_file_config(data_dir: &Path) -> Result<FileConfig> {
    let path = data_dir.join(CONFIG_FILE_NAME);
    if !path.exists() {
        return Ok(FileConfig::default());
    }
    let raw = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let parsed = toml::from_str(&raw)
        .with_context(|| format!("Failed to parse config {}", path.display()))?;
    log::debug!("Loaded config from {}", path.display());
    Ok(parsed)
}
