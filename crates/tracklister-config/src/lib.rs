// SPDX-License-Identifier: GPL-3.0-or-later
use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    pub host: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    pub log_level: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Metadata extraction policy used by the resolution orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolutionConfig {
    /// Bounded wait applied to each extraction attempt.
    pub attempt_timeout_secs: u64,
    /// Socket timeout handed to the extractor process.
    pub socket_timeout_secs: u64,
    pub ytdlp_path: String,
    pub format: String,
}

impl Default for ResolutionConfig {
    fn default() -> Self {
        Self {
            attempt_timeout_secs: 10,
            socket_timeout_secs: 10,
            ytdlp_path: "yt-dlp".to_string(),
            format: "bestaudio/best".to_string(),
        }
    }
}

impl ResolutionConfig {
    pub fn attempt_timeout(&self) -> Duration {
        Duration::from_secs(self.attempt_timeout_secs)
    }
}

/// Download-and-fingerprint fallback policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcousticConfig {
    pub enabled: bool,
    /// Media at or above this duration is never downloaded.
    pub max_duration_secs: u64,
    /// Upper bound on the whole download + recognition attempt.
    pub pipeline_timeout_secs: u64,
    pub socket_timeout_secs: u64,
    /// HTTP timeout for a single AcoustID lookup.
    pub lookup_timeout_secs: u64,
    pub audio_format: String,
    pub audio_quality: String,
    /// AcoustID application key. The fallback is disabled without one.
    pub api_key: Option<String>,
    pub acoustid_base_url: Option<String>,
    pub min_score: f32,
}

impl Default for AcousticConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_duration_secs: 3600,
            pipeline_timeout_secs: 120,
            socket_timeout_secs: 30,
            lookup_timeout_secs: 15,
            audio_format: "wav".to_string(),
            audio_quality: "192K".to_string(),
            api_key: None,
            acoustid_base_url: None,
            min_score: 0.5,
        }
    }
}

impl AcousticConfig {
    pub fn pipeline_timeout(&self) -> Duration {
        Duration::from_secs(self.pipeline_timeout_secs)
    }

    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_secs(self.lookup_timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    pub http: HttpConfig,
    pub telemetry: TelemetryConfig,
    pub resolution: ResolutionConfig,
    pub acoustic: AcousticConfig,
}

/// Load configuration from defaults, optional TOML file, and environment overrides (prefix: TRACKLISTER_).
pub fn load(config_path: Option<&Path>) -> Result<AppConfig> {
    let mut figment = Figment::from(Serialized::defaults(AppConfig::default()));

    if let Some(path) = config_path {
        figment = figment.merge(Toml::file(path));
    }

    figment = figment.merge(Env::prefixed("TRACKLISTER_").split("__"));

    let config: AppConfig = figment.extract()?;
    info!(target: "config", "configuration loaded");
    Ok(config)
}
