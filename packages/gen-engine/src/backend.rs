//! Generation backend adapter
//!
//! One `TextGenerator` capability hides the wire differences between model
//! families. Request shaping and response extraction are pure functions over
//! JSON values so each family's dialect is testable without a live backend.

use crate::config::{GenerationConfig, ModelFamily};
use crate::error::{GenerationError, Result};
use async_trait::async_trait;
use serde_json::{json, Value};

/// Sampling parameters for a single generation call
#[derive(Debug, Clone)]
pub struct GenerationParams {
    pub temperature: f64,
    pub max_tokens: u32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 512,
        }
    }
}

impl From<&GenerationConfig> for GenerationParams {
    fn from(config: &GenerationConfig) -> Self {
        Self {
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }
}

/// Capability consumed by the content pipeline: free-form prompt in,
/// normalized plain text out.
///
/// Implementations must be `Send + Sync`; the coordinator shares one
/// generator across concurrently handled notifications.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate text for the prompt.
    ///
    /// The returned text is already normalized: family-specific wrapping and
    /// markdown code fences are stripped.
    async fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<String>;
}

/// Build the request body for the configured model family.
///
/// Shapes mirror what each backend family accepts; nothing here inspects the
/// model identifier at runtime.
pub fn build_request_body(family: ModelFamily, prompt: &str, params: &GenerationParams) -> Value {
    match family {
        ModelFamily::Claude => json!({
            "prompt": format!("\n\nHuman: {prompt}\n\nAssistant:"),
            "temperature": params.temperature,
            "max_tokens_to_sample": params.max_tokens,
        }),
        ModelFamily::Titan => json!({
            "inputText": prompt,
            "textGenerationConfig": {
                "temperature": params.temperature,
                "maxTokenCount": params.max_tokens,
            },
        }),
        ModelFamily::Nova => json!({
            "inferenceConfig": {
                "max_new_tokens": params.max_tokens,
            },
            "messages": [
                {
                    "role": "user",
                    "content": [{"text": prompt}],
                }
            ],
        }),
        ModelFamily::Generic => json!({
            "prompt": prompt,
            "temperature": params.temperature,
            "maxTokens": params.max_tokens,
        }),
    }
}

/// Extract the completion text from a backend response body.
pub fn extract_text(family: ModelFamily, body: &Value) -> Result<String> {
    let text = match family {
        ModelFamily::Claude => body
            .get("completion")
            .and_then(Value::as_str)
            .map(str::to_string),
        ModelFamily::Titan => body
            .pointer("/results/0/outputText")
            .and_then(Value::as_str)
            .map(str::to_string),
        ModelFamily::Nova => body
            .pointer("/output/message/content/0/text")
            .and_then(Value::as_str)
            .map(str::to_string),
        ModelFamily::Generic => body
            .get("generated_text")
            .and_then(Value::as_str)
            .map(str::to_string),
    };

    let text = text.ok_or_else(|| {
        GenerationError::MalformedResponse(format!(
            "no completion text at the expected location for {family:?}"
        ))
    })?;

    if text.trim().is_empty() {
        return Err(GenerationError::EmptyCompletion);
    }

    Ok(text)
}

/// Strip markdown code fences a model may wrap its output in.
///
/// Handles a leading ```` ```html ```` or bare ```` ``` ```` fence and a
/// trailing ```` ``` ````. Text without fences passes through untouched.
pub fn strip_code_fences(text: &str) -> String {
    let mut out = text.trim();

    if let Some(rest) = out.strip_prefix("```html") {
        out = rest.trim_start();
    } else if let Some(rest) = out.strip_prefix("```") {
        out = rest.trim_start();
    }

    if let Some(rest) = out.strip_suffix("```") {
        out = rest.trim_end();
    }

    out.to_string()
}

/// HTTP client for a remote generation backend.
///
/// Posts the family-shaped body to the configured invoke endpoint and
/// normalizes the completion. The reqwest client carries the configured
/// per-request timeout so a stalled backend surfaces as a retryable error
/// instead of hanging the caller.
pub struct HttpTextGenerator {
    client: reqwest::Client,
    config: GenerationConfig,
}

impl HttpTextGenerator {
    pub fn new(config: GenerationConfig) -> Result<Self> {
        config.validate().map_err(GenerationError::ConfigError)?;

        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }
}

#[async_trait]
impl TextGenerator for HttpTextGenerator {
    async fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<String> {
        let body = build_request_body(self.config.family, prompt, params);

        tracing::debug!(
            model_id = %self.config.model_id,
            family = ?self.config.family,
            prompt_len = prompt.len(),
            "invoking generation backend"
        );

        let response = self
            .client
            .post(&self.config.endpoint)
            .query(&[("modelId", self.config.model_id.as_str())])
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GenerationError::BackendRejected {
                status: status.as_u16(),
                message,
            });
        }

        let response_body: Value = response.json().await?;
        let text = extract_text(self.config.family, &response_body)?;

        Ok(strip_code_fences(&text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> GenerationParams {
        GenerationParams {
            temperature: 0.5,
            max_tokens: 256,
        }
    }

    #[test]
    fn test_params_derived_from_config() {
        let config = GenerationConfig {
            temperature: 0.2,
            max_tokens: 1024,
            ..GenerationConfig::default()
        };

        let derived = GenerationParams::from(&config);
        assert_eq!(derived.temperature, 0.2);
        assert_eq!(derived.max_tokens, 1024);
    }

    #[test]
    fn test_claude_request_shape() {
        let body = build_request_body(ModelFamily::Claude, "hello", &params());
        assert_eq!(
            body["prompt"].as_str().unwrap(),
            "\n\nHuman: hello\n\nAssistant:"
        );
        assert_eq!(body["max_tokens_to_sample"], 256);
        assert_eq!(body["temperature"], 0.5);
    }

    #[test]
    fn test_titan_request_shape() {
        let body = build_request_body(ModelFamily::Titan, "hello", &params());
        assert_eq!(body["inputText"], "hello");
        assert_eq!(body["textGenerationConfig"]["maxTokenCount"], 256);
    }

    #[test]
    fn test_nova_request_shape() {
        let body = build_request_body(ModelFamily::Nova, "hello", &params());
        assert_eq!(body["inferenceConfig"]["max_new_tokens"], 256);
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"][0]["text"], "hello");
    }

    #[test]
    fn test_extract_claude_completion() {
        let body = json!({"completion": "a mind map"});
        assert_eq!(
            extract_text(ModelFamily::Claude, &body).unwrap(),
            "a mind map"
        );
    }

    #[test]
    fn test_extract_titan_completion() {
        let body = json!({"results": [{"outputText": "titan says"}]});
        assert_eq!(
            extract_text(ModelFamily::Titan, &body).unwrap(),
            "titan says"
        );
    }

    #[test]
    fn test_extract_nova_completion() {
        let body = json!({
            "output": {"message": {"content": [{"text": "nova says"}]}}
        });
        assert_eq!(extract_text(ModelFamily::Nova, &body).unwrap(), "nova says");
    }

    #[test]
    fn test_extract_rejects_missing_text() {
        let body = json!({"unexpected": true});
        assert!(matches!(
            extract_text(ModelFamily::Nova, &body),
            Err(GenerationError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_extract_rejects_empty_completion() {
        let body = json!({"completion": "   "});
        assert!(matches!(
            extract_text(ModelFamily::Claude, &body),
            Err(GenerationError::EmptyCompletion)
        ));
    }

    #[test]
    fn test_strip_html_fence() {
        let fenced = "```html\n<p>content</p>\n```";
        assert_eq!(strip_code_fences(fenced), "<p>content</p>");
    }

    #[test]
    fn test_strip_bare_fence() {
        let fenced = "```\n<p>content</p>\n```";
        assert_eq!(strip_code_fences(fenced), "<p>content</p>");
    }

    #[test]
    fn test_strip_passes_unfenced_text() {
        assert_eq!(strip_code_fences("<p>plain</p>"), "<p>plain</p>");
    }

    #[test]
    fn test_strip_handles_unterminated_fence() {
        assert_eq!(strip_code_fences("```html\n<p>x</p>"), "<p>x</p>");
    }
}
