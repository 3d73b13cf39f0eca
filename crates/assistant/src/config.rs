//! Process configuration, read once at startup.

use std::env;

use giaic_core::orchestrator::DEFAULT_MAX_TOOL_ROUNDS;
use giaic_openai_model::{
    DEFAULT_BASE_URL, DEFAULT_MODEL, OpenAIConfig, OpenAIConfigBuilder,
};

/// Environment variable holding the API key.
pub const API_KEY_VAR: &str = "GEMINI_API_KEY";
/// Environment variable overriding the model identifier.
pub const MODEL_VAR: &str = "GEMINI_MODEL";
/// Environment variable overriding the endpoint base URL.
pub const BASE_URL_VAR: &str = "GEMINI_BASE_URL";
/// Environment variable overriding the tool-call round bound.
pub const MAX_TOOL_ROUNDS_VAR: &str = "ASSISTANT_MAX_TOOL_ROUNDS";

/// Errors raised while reading the configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A required variable is not set, or is empty.
    #[error("{0} environment variable is not set")]
    Missing(&'static str),

    /// A variable is set to something that cannot be used.
    #[error("{name} has an invalid value: {value:?}")]
    Invalid {
        /// The variable.
        name: &'static str,
        /// The rejected value.
        value: String,
    },
}

/// Everything needed to run the assistant. Immutable once built.
#[derive(Clone, Debug)]
pub struct AssistantConfig {
    model: OpenAIConfig,
    max_tool_rounds: usize,
}

impl AssistantConfig {
    /// Reads the configuration from the process environment.
    ///
    /// Only the API key is required; everything else has a default.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let lookup =
            |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let api_key =
            lookup(API_KEY_VAR).ok_or(ConfigError::Missing(API_KEY_VAR))?;
        let mut builder = AssistantConfigBuilder::with_api_key(api_key);
        if let Some(model) = lookup(MODEL_VAR) {
            builder = builder.with_model(model);
        }
        if let Some(base_url) = lookup(BASE_URL_VAR) {
            builder = builder.with_base_url(base_url);
        }
        if let Some(value) = lookup(MAX_TOOL_ROUNDS_VAR) {
            let Ok(max_tool_rounds) = value.trim().parse() else {
                return Err(ConfigError::Invalid {
                    name: MAX_TOOL_ROUNDS_VAR,
                    value,
                });
            };
            builder = builder.with_max_tool_rounds(max_tool_rounds);
        }
        Ok(builder.build())
    }

    /// Returns the model backend configuration.
    #[inline]
    pub fn model(&self) -> &OpenAIConfig {
        &self.model
    }

    /// Returns how many tool-call rounds one turn may take.
    #[inline]
    pub fn max_tool_rounds(&self) -> usize {
        self.max_tool_rounds
    }
}

/// [`AssistantConfig`] builder.
pub struct AssistantConfigBuilder {
    api_key: String,
    model: String,
    base_url: String,
    max_tool_rounds: usize,
}

impl AssistantConfigBuilder {
    /// Creates a builder with the default model and endpoint.
    #[inline]
    pub fn with_api_key<S: Into<String>>(api_key: S) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_owned(),
            base_url: DEFAULT_BASE_URL.to_owned(),
            max_tool_rounds: DEFAULT_MAX_TOOL_ROUNDS,
        }
    }

    /// Sets the model identifier.
    #[inline]
    pub fn with_model<S: Into<String>>(mut self, model: S) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the endpoint base URL.
    #[inline]
    pub fn with_base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Sets how many tool-call rounds one turn may take.
    #[inline]
    pub fn with_max_tool_rounds(mut self, max_tool_rounds: usize) -> Self {
        self.max_tool_rounds = max_tool_rounds;
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> AssistantConfig {
        let model = OpenAIConfigBuilder::with_api_key(self.api_key)
            .with_model(self.model)
            .with_base_url(self.base_url)
            .build();
        AssistantConfig {
            model,
            max_tool_rounds: self.max_tool_rounds,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn from_vars(
        vars: &[(&str, &str)],
    ) -> Result<AssistantConfig, ConfigError> {
        let vars = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<HashMap<_, _>>();
        AssistantConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = from_vars(&[(API_KEY_VAR, "secret-key")]).unwrap();
        assert_eq!(config.model().model(), DEFAULT_MODEL);
        assert_eq!(config.model().base_url(), DEFAULT_BASE_URL);
        assert_eq!(config.max_tool_rounds(), DEFAULT_MAX_TOOL_ROUNDS);
        assert!(!format!("{config:?}").contains("secret-key"));
    }

    #[test]
    fn test_overrides() {
        let config = from_vars(&[
            (API_KEY_VAR, "k"),
            (MODEL_VAR, "gemini-2.5-pro"),
            (BASE_URL_VAR, "http://localhost:8080/v1/"),
            (MAX_TOOL_ROUNDS_VAR, " 3 "),
        ])
        .unwrap();
        assert_eq!(config.model().model(), "gemini-2.5-pro");
        assert_eq!(config.model().base_url(), "http://localhost:8080/v1");
        assert_eq!(config.max_tool_rounds(), 3);
    }

    #[test]
    fn test_errors() {
        assert_eq!(
            from_vars(&[]).unwrap_err(),
            ConfigError::Missing(API_KEY_VAR)
        );
        assert_eq!(
            from_vars(&[(API_KEY_VAR, "  ")]).unwrap_err(),
            ConfigError::Missing(API_KEY_VAR)
        );
        assert_eq!(
            from_vars(&[(API_KEY_VAR, "k"), (MAX_TOOL_ROUNDS_VAR, "many")])
                .unwrap_err(),
            ConfigError::Invalid {
                name: MAX_TOOL_ROUNDS_VAR,
                value: "many".to_owned(),
            }
        );
    }
}
