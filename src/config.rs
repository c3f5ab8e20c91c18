use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{BatchscribeError, Result};
use crate::transcribe::WhisperModel;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub openai_api_key: Option<String>,
    pub input_dir: PathBuf,
    pub results_dir: PathBuf,
    pub model: WhisperModel,
    pub max_chunk_mb: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            input_dir: PathBuf::from("input"),
            results_dir: PathBuf::from("results"),
            model: WhisperModel::default(),
            max_chunk_mb: 20,
        }
    }
}

impl Config {
    /// Load configuration: defaults, overlaid by the optional config file,
    /// overlaid by environment variables.
    pub fn load() -> Result<Self> {
        let mut config = Self::default();

        if let Some(config_path) = Self::config_file_path() {
            if config_path.exists() {
                let contents = std::fs::read_to_string(&config_path)?;
                if let Ok(file_config) = toml::from_str::<Config>(&contents) {
                    config = file_config;
                }
            }
        }

        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            config.openai_api_key = Some(key);
        }
        if let Ok(dir) = std::env::var("BATCHSCRIBE_INPUT_DIR") {
            config.input_dir = PathBuf::from(dir);
        }
        if let Ok(dir) = std::env::var("BATCHSCRIBE_RESULTS_DIR") {
            config.results_dir = PathBuf::from(dir);
        }
        if let Ok(model) = std::env::var("BATCHSCRIBE_MODEL") {
            if let Ok(m) = model.parse() {
                config.model = m;
            }
        }
        if let Ok(max) = std::env::var("BATCHSCRIBE_MAX_CHUNK_MB") {
            if let Ok(m) = max.parse() {
                config.max_chunk_mb = m;
            }
        }

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.openai_api_key.is_none() {
            return Err(BatchscribeError::Config(
                "OPENAI_API_KEY not set. Export it or add it to a .env file".to_string(),
            ));
        }

        if self.max_chunk_mb == 0 {
            return Err(BatchscribeError::Config(
                "Maximum chunk size must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    pub fn max_chunk_bytes(&self) -> u64 {
        self.max_chunk_mb * 1024 * 1024
    }

    fn config_file_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("batchscribe").join("config.toml"))
    }
}
