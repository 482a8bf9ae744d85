use super::error::{ProviderError, ProviderResult};

const API_KEY_VAR: &str = "API_KEY";
const DEFAULT_MODEL: &str = "gemini-2.5-flash";
const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Runtime configuration describing how to reach the generative provider.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Root URL of the provider API.
    pub base_url: String,
    /// Model asked to generate questions.
    pub model: String,
    /// API key; requests fail fast without one.
    pub api_key: Option<String>,
}

impl ProviderConfig {
    /// Construct a configuration from an explicit base URL and model name.
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            model: model.into(),
            api_key: None,
        }
    }

    /// Attach the API key to the configuration.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Build a configuration by reading the expected environment variables.
    ///
    /// A missing key is not an error here; every call then fails with
    /// [`ProviderError::MissingCredentials`] and the fallback set is served.
    pub fn from_env() -> Self {
        let base_url =
            std::env::var("GEMINI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_owned());
        let model = std::env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_owned());

        let mut config = Self::new(base_url, model);
        if let Some(key) = std::env::var(API_KEY_VAR)
            .ok()
            .filter(|key| !key.trim().is_empty())
        {
            config = config.with_api_key(key);
        }
        config
    }

    /// The API key, or the error every call reports when it is absent.
    pub fn require_api_key(&self) -> ProviderResult<&str> {
        self.api_key
            .as_deref()
            .ok_or(ProviderError::MissingCredentials { var: API_KEY_VAR })
    }
}
