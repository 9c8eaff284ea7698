use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use super::error::ConfigError;

/// Face detector settings passed with every inference call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorOptions {
    /// Square input resolution fed to the detector (default: 416). Must be a multiple of 32.
    pub input_size: u32,

    /// Minimum face confidence (default: 0.5).
    pub score_threshold: f32,
}

impl Default for DetectorOptions {
    fn default() -> Self {
        Self {
            input_size: 416,
            score_threshold: 0.5,
        }
    }
}

/// Options used to construct the playback SDK player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerSettings {
    pub name: String,

    /// Initial volume, 0.0–1.0 (default: 0.5).
    pub volume: f32,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            name: "Emotion-based Music Player".into(),
            volume: 0.5,
        }
    }
}

/// Configuration for the session orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Base URL of the recommendation backend; also hosts the login redirect.
    pub backend_url: Url,

    /// Path (relative to `backend_url`) of the authorization endpoint.
    pub login_path: String,

    /// Inference sampling period in milliseconds (default: 1000).
    pub tick_interval_ms: u64,

    /// Timeout for the recommendation request in milliseconds (default: 10000).
    pub request_timeout_ms: u64,

    /// Directory holding the expression model assets.
    pub model_location: PathBuf,

    pub detector: DetectorOptions,

    pub player: PlayerSettings,

    /// Bound of the controller's command queue (default: 16).
    pub command_capacity: usize,
}

impl SessionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !matches!(self.backend_url.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid(format!(
                "backend url must be http or https: {}",
                self.backend_url
            )));
        }
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::Invalid("tick interval must be positive".into()));
        }
        if self.request_timeout_ms == 0 {
            return Err(ConfigError::Invalid("request timeout must be positive".into()));
        }
        if self.detector.input_size == 0 || self.detector.input_size % 32 != 0 {
            return Err(ConfigError::Invalid(format!(
                "detector input size must be a positive multiple of 32: {}",
                self.detector.input_size
            )));
        }
        if !(0.0..=1.0).contains(&self.detector.score_threshold) {
            return Err(ConfigError::Invalid(format!(
                "score threshold out of range: {}",
                self.detector.score_threshold
            )));
        }
        if !(0.0..=1.0).contains(&self.player.volume) {
            return Err(ConfigError::Invalid(format!(
                "player volume out of range: {}",
                self.player.volume
            )));
        }
        if self.player.name.trim().is_empty() {
            return Err(ConfigError::Invalid("player name must not be empty".into()));
        }
        if self.command_capacity == 0 {
            return Err(ConfigError::Invalid("command capacity must be positive".into()));
        }
        Ok(())
    }

    /// Loads a JSON config file. Missing fields fall back to defaults.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults overridden by `MOODTUNE_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(raw) = lookup("MOODTUNE_BACKEND_URL") {
            self.backend_url = Url::parse(raw.trim())
                .map_err(|e| ConfigError::Invalid(format!("MOODTUNE_BACKEND_URL: {}", e)))?;
        }
        if let Some(raw) = lookup("MOODTUNE_TICK_INTERVAL_MS") {
            self.tick_interval_ms = parse_ms("MOODTUNE_TICK_INTERVAL_MS", &raw)?;
        }
        if let Some(raw) = lookup("MOODTUNE_REQUEST_TIMEOUT_MS") {
            self.request_timeout_ms = parse_ms("MOODTUNE_REQUEST_TIMEOUT_MS", &raw)?;
        }
        if let Some(raw) = lookup("MOODTUNE_MODEL_DIR") {
            self.model_location = PathBuf::from(raw);
        }
        self.validate()?;
        Ok(self)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Authorization endpoint the user is redirected to.
    pub fn login_url(&self) -> Result<Url, ConfigError> {
        let mut url = self.backend_url.clone();
        url.path_segments_mut()
            .map_err(|_| ConfigError::Invalid(format!("backend url cannot be a base: {}", self.backend_url)))?
            .pop_if_empty()
            .extend(self.login_path.split('/').filter(|s| !s.is_empty()));
        Ok(url)
    }
}

fn parse_ms(key: &str, raw: &str) -> Result<u64, ConfigError> {
    raw.trim()
        .parse()
        .map_err(|e| ConfigError::Invalid(format!("{}: {}", key, e)))
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            backend_url: Url::parse("http://localhost:5000").expect("static default url"),
            login_path: "login".into(),
            tick_interval_ms: 1000,
            request_timeout_ms: 10_000,
            model_location: PathBuf::from("models"),
            detector: DetectorOptions::default(),
            player: PlayerSettings::default(),
            command_capacity: 16,
        }
    }
}
