//! Engine settings loaded from the environment.
//!
//! Every value has a default so the village runs with no configuration at
//! all. A value that is present but unparsable is logged and replaced by its
//! default rather than aborting startup.

use std::path::PathBuf;
use std::str::FromStr;

use crate::entities::proximity::DEFAULT_INTERACTION_RANGE;
use crate::infrastructure::ollama::{DEFAULT_OLLAMA_BASE_URL, DEFAULT_OLLAMA_MODEL, DEFAULT_TIMEOUT_SECS};
use crate::infrastructure::resilient_llm::RetryConfig;

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct EngineSettings {
    pub ollama_base_url: String,
    pub ollama_model: String,
    pub llm_timeout_secs: u64,
    pub retry: RetryConfig,
    /// Maximum player-to-NPC distance for opening a chat
    pub interaction_range: f32,
    /// Optional JSON roster replacing the built-in village
    pub roster_path: Option<PathBuf>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            ollama_base_url: DEFAULT_OLLAMA_BASE_URL.to_string(),
            ollama_model: DEFAULT_OLLAMA_MODEL.to_string(),
            llm_timeout_secs: DEFAULT_TIMEOUT_SECS,
            retry: RetryConfig::default(),
            interaction_range: DEFAULT_INTERACTION_RANGE,
            roster_path: None,
        }
    }
}

impl EngineSettings {
    /// Read settings from process environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let ollama_base_url = lookup("OLLAMA_BASE_URL")
            .or_else(|| lookup("OLLAMA_URL"))
            .unwrap_or(defaults.ollama_base_url);
        let ollama_model = lookup("OLLAMA_MODEL").unwrap_or(defaults.ollama_model);

        let llm_timeout_secs = parse_or_default(
            "LLM_TIMEOUT_SECS",
            lookup("LLM_TIMEOUT_SECS"),
            defaults.llm_timeout_secs,
        );
        let retry = RetryConfig {
            max_retries: parse_or_default(
                "LLM_MAX_RETRIES",
                lookup("LLM_MAX_RETRIES"),
                defaults.retry.max_retries,
            ),
            ..defaults.retry
        };

        let interaction_range = match lookup("INTERACTION_RANGE") {
            Some(raw) => match parse_range(&raw) {
                Ok(range) => range,
                Err(e) => {
                    tracing::warn!(error = %e, "Using default interaction range");
                    defaults.interaction_range
                }
            },
            None => defaults.interaction_range,
        };

        let roster_path = lookup("VILLAGE_ROSTER_PATH")
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from);

        Self {
            ollama_base_url,
            ollama_model,
            llm_timeout_secs,
            retry,
            interaction_range,
            roster_path,
        }
    }
}

fn parse_or_default<T: FromStr + Copy>(key: &'static str, raw: Option<String>, default: T) -> T {
    match raw {
        Some(value) => match value.trim().parse::<T>() {
            Ok(parsed) => parsed,
            Err(_) => {
                let error = SettingsError::InvalidValue { key, value };
                tracing::warn!(error = %error, "Falling back to default");
                default
            }
        },
        None => default,
    }
}

fn parse_range(raw: &str) -> Result<f32, SettingsError> {
    raw.trim()
        .parse::<f32>()
        .ok()
        .filter(|r| r.is_finite() && *r > 0.0)
        .ok_or_else(|| SettingsError::InvalidValue {
            key: "INTERACTION_RANGE",
            value: raw.to_string(),
        })
}
