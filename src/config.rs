//! Application-level configuration loading: round sizing, countdown timing and
//! collaborator settings.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

use crate::state::game::Language;

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "SHARQ_GHARB_CONFIG_PATH";

const DEFAULT_QUESTIONS_PER_ROUND: usize = 10;
const DEFAULT_COUNTDOWN_SECS: u32 = 60;
const DEFAULT_TICK_INTERVAL_MS: u64 = 1_000;
const DEFAULT_FIRST_IMAGE_TIMEOUT_MS: u64 = 3_000;
const DEFAULT_PROVIDER_TIMEOUT_MS: u64 = 30_000;
const DEFAULT_FLAG_IMAGE_BASE: &str = "https://flagcdn.com/w640";
const DEFAULT_IDENTITY_PATH: &str = "data/identity.json";

#[derive(Debug, Clone, PartialEq, Eq)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// Questions requested for a fresh round.
    pub questions_per_round: usize,
    /// Countdown units granted to each question.
    pub countdown_secs: u32,
    /// Wall-clock length of one countdown unit.
    pub tick_interval: Duration,
    /// Upper bound on warming the first image before a round becomes visible.
    pub first_image_timeout: Duration,
    /// Upper bound on a single provider call before the fallback set is used.
    pub provider_timeout: Duration,
    /// Base URL flag images are derived from (`{base}/{cc}.png`).
    pub flag_image_base: String,
    /// JSON file backing the identity store.
    pub identity_path: PathBuf,
    /// Language a fresh session starts in.
    pub default_language: Language,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match Self::from_json(&contents) {
                Ok(app_config) => {
                    info!(
                        path = %path.display(),
                        questions_per_round = app_config.questions_per_round,
                        countdown_secs = app_config.countdown_secs,
                        "loaded configuration"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Parse a configuration document; absent fields keep their defaults.
    pub fn from_json(contents: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<RawConfig>(contents).map(Into::into)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        RawConfig::default().into()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    questions_per_round: Option<usize>,
    countdown_secs: Option<u32>,
    tick_interval_ms: Option<u64>,
    first_image_timeout_ms: Option<u64>,
    provider_timeout_ms: Option<u64>,
    flag_image_base: Option<String>,
    identity_path: Option<PathBuf>,
    default_language: Option<String>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let default_language = match value.default_language.as_deref() {
            None => Language::default(),
            Some(tag) => Language::from_tag(tag).unwrap_or_else(|| {
                warn!(tag, "unknown default language; using the primary language");
                Language::default()
            }),
        };

        Self {
            questions_per_round: value
                .questions_per_round
                .filter(|count| *count > 0)
                .unwrap_or(DEFAULT_QUESTIONS_PER_ROUND),
            countdown_secs: value
                .countdown_secs
                .filter(|secs| *secs > 0)
                .unwrap_or(DEFAULT_COUNTDOWN_SECS),
            tick_interval: Duration::from_millis(
                value
                    .tick_interval_ms
                    .filter(|ms| *ms > 0)
                    .unwrap_or(DEFAULT_TICK_INTERVAL_MS),
            ),
            first_image_timeout: Duration::from_millis(
                value
                    .first_image_timeout_ms
                    .unwrap_or(DEFAULT_FIRST_IMAGE_TIMEOUT_MS),
            ),
            provider_timeout: Duration::from_millis(
                value
                    .provider_timeout_ms
                    .unwrap_or(DEFAULT_PROVIDER_TIMEOUT_MS),
            ),
            flag_image_base: value
                .flag_image_base
                .map(|base| base.trim_end_matches('/').to_owned())
                .filter(|base| !base.is_empty())
                .unwrap_or_else(|| DEFAULT_FLAG_IMAGE_BASE.to_owned()),
            identity_path: value
                .identity_path
                .unwrap_or_else(|| PathBuf::from(DEFAULT_IDENTITY_PATH)),
            default_language,
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
