/// Configuration for the text-generation backend
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Upper bound on a single completion request.
/// Anything beyond this is a configuration mistake, not a real use case.
const MAX_COMPLETION_TOKENS: u32 = 4096;

/// Request/response dialect spoken by the generation backend.
///
/// The family is fixed at startup via configuration. Runtime code never
/// inspects the model identifier to decide how to talk to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelFamily {
    /// Anthropic-style prompt/completion shape
    Claude,
    /// Amazon Titan text shape
    Titan,
    /// Amazon Nova messages shape
    Nova,
    /// Plain `{prompt, temperature, maxTokens}` fallback
    Generic,
}

impl std::str::FromStr for ModelFamily {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "claude" => Ok(ModelFamily::Claude),
            "titan" => Ok(ModelFamily::Titan),
            "nova" => Ok(ModelFamily::Nova),
            "generic" => Ok(ModelFamily::Generic),
            other => Err(format!("unknown model family '{other}'")),
        }
    }
}

/// Configuration for the generation backend client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Model identifier sent to the backend
    pub model_id: String,

    /// Wire dialect used for request shaping and response extraction
    pub family: ModelFamily,

    /// Invoke endpoint URL
    pub endpoint: String,

    /// Sampling temperature
    pub temperature: f64,

    /// Completion length cap
    pub max_tokens: u32,

    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model_id: "amazon.nova-micro-v1:0".to_string(),
            family: ModelFamily::Nova,
            endpoint: "http://127.0.0.1:8808/invoke".to_string(),
            temperature: 0.7,
            max_tokens: 512,
            request_timeout_secs: 30,
        }
    }
}

impl GenerationConfig {
    /// Per-request timeout as a `Duration`
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.model_id.is_empty() {
            return Err("model_id cannot be empty".to_string());
        }

        if self.endpoint.is_empty() {
            return Err("endpoint cannot be empty".to_string());
        }

        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(format!(
                "temperature must be within 0.0..=2.0, got {}",
                self.temperature
            ));
        }

        if self.max_tokens == 0 {
            return Err("max_tokens must be greater than 0".to_string());
        }

        if self.max_tokens > MAX_COMPLETION_TOKENS {
            return Err(format!(
                "max_tokens cannot exceed {MAX_COMPLETION_TOKENS}"
            ));
        }

        if self.request_timeout_secs == 0 {
            return Err("request_timeout_secs must be greater than 0".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GenerationConfig::default();
        assert_eq!(config.model_id, "amazon.nova-micro-v1:0");
        assert_eq!(config.family, ModelFamily::Nova);
        assert_eq!(config.max_tokens, 512);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = GenerationConfig::default();

        // Valid config
        assert!(config.validate().is_ok());

        // Invalid: empty model id
        config.model_id = String::new();
        assert!(config.validate().is_err());

        // Invalid: temperature out of range
        config.model_id = "test".to_string();
        config.temperature = 3.0;
        assert!(config.validate().is_err());

        // Invalid: zero tokens
        config.temperature = 0.7;
        config.max_tokens = 0;
        assert!(config.validate().is_err());

        // Invalid: excessive tokens
        config.max_tokens = 100_000;
        assert!(config.validate().is_err());

        // Invalid: zero timeout
        config.max_tokens = 512;
        config.request_timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_family_serialization() {
        let json = serde_json::to_string(&ModelFamily::Nova).unwrap();
        assert_eq!(json, "\"nova\"");

        let family: ModelFamily = serde_json::from_str("\"claude\"").unwrap();
        assert_eq!(family, ModelFamily::Claude);
    }

    #[test]
    fn test_family_from_str() {
        assert_eq!("Titan".parse::<ModelFamily>().unwrap(), ModelFamily::Titan);
        assert!("gpt".parse::<ModelFamily>().is_err());
    }
}
