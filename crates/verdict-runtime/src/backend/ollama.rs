//! Ollama-style generation backend.
//!
//! Talks to a local or fronted `/api/generate` endpoint. Both pipeline
//! stages use this backend; only the model name and sampling parameters
//! differ between them.
//!
//! ## Security
//!
//! Deployments that front the server with a gateway can set a bearer
//! token. The token is stored via [`secrecy`] so it cannot leak through
//! `Debug` output or log lines.

use super::{
    factory::BackendFactory, BackendError, GenerateRequest, GenerateResponse, InferenceBackend,
};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::sync::Arc;
use std::time::Duration;

/// Default endpoint for a local Ollama server.
pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Ollama generation backend.
pub struct OllamaBackend {
    base_url: String,
    bearer_token: Option<SecretString>,
}

impl std::fmt::Debug for OllamaBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OllamaBackend")
            .field("base_url", &self.base_url)
            .field(
                "bearer_token",
                &self.bearer_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

impl OllamaBackend {
    /// Create a backend against the default local endpoint.
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            bearer_token: None,
        }
    }

    /// Create from JSON configuration.
    ///
    /// Recognized keys: `base_url` (optional), `bearer_token` (optional,
    /// for gateway-fronted deployments).
    pub fn from_config(config: &JsonValue) -> Result<Self, BackendError> {
        let base_url = config["base_url"]
            .as_str()
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/')
            .to_string();

        let bearer_token = config["bearer_token"]
            .as_str()
            .map(|t| SecretString::from(t.to_string()));

        Ok(Self {
            base_url,
            bearer_token,
        })
    }

    /// Set a custom base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    fn get_client(&self) -> &reqwest::Client {
        static CLIENT: std::sync::OnceLock<reqwest::Client> = std::sync::OnceLock::new();
        CLIENT.get_or_init(|| {
            reqwest::Client::builder()
                .build()
                .expect("Failed to build HTTP client")
        })
    }
}

impl Default for OllamaBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Ollama API request format.
#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    prompt: String,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: u32,
    top_p: f32,
}

/// Ollama API response format.
#[derive(Debug, Deserialize)]
struct OllamaResponse {
    response: String,
    #[serde(default)]
    model: String,
}

#[async_trait]
impl InferenceBackend for OllamaBackend {
    async fn generate(
        &self,
        request: &GenerateRequest,
    ) -> Result<GenerateResponse, BackendError> {
        let payload = OllamaRequest {
            model: request.model.clone(),
            prompt: request.prompt.clone(),
            stream: false,
            options: OllamaOptions {
                temperature: request.temperature,
                num_predict: request.max_tokens,
                top_p: request.top_p,
            },
        };

        let mut builder = self
            .get_client()
            .post(format!("{}/api/generate", self.base_url))
            .timeout(request.timeout)
            .json(&payload);

        // Expose the token only here, at the point of use
        if let Some(token) = &self.bearer_token {
            builder = builder.bearer_auth(token.expose_secret());
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                BackendError::Timeout(request.timeout)
            } else {
                BackendError::HttpError(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(BackendError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        let body: OllamaResponse = response
            .json()
            .await
            .map_err(|e| BackendError::ParseError(e.to_string()))?;

        let model = if body.model.is_empty() {
            request.model.clone()
        } else {
            body.model
        };

        Ok(GenerateResponse {
            text: body.response.trim().to_string(),
            model,
        })
    }

    async fn health_check(&self) -> bool {
        self.get_client()
            .get(format!("{}/api/tags", self.base_url))
            .timeout(Duration::from_secs(2))
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }

    fn name(&self) -> &str {
        "ollama"
    }
}

/// Factory for creating Ollama backends from configuration.
///
/// ## Configuration Format
/// ```json
/// {
///   "base_url": "http://localhost:11434",   // Optional
///   "bearer_token": "..."                    // Optional, gateway auth
/// }
/// ```
pub struct OllamaBackendFactory;

impl BackendFactory for OllamaBackendFactory {
    fn backend_type(&self) -> &'static str {
        "ollama"
    }

    fn create(&self, config: &JsonValue) -> Result<Arc<dyn InferenceBackend>, BackendError> {
        let backend = OllamaBackend::from_config(config)?;
        Ok(Arc::new(backend))
    }

    fn validate_config(&self, config: &JsonValue) -> Result<(), BackendError> {
        if let Some(url) = config["base_url"].as_str() {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(BackendError::NotConfigured(
                    "base_url must start with http:// or https://".to_string(),
                ));
            }
        }
        Ok(())
    }

    fn default_config(&self) -> JsonValue {
        serde_json::json!({
            "base_url": DEFAULT_BASE_URL
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_creation() {
        let backend = OllamaBackend::new();
        assert_eq!(backend.name(), "ollama");
    }

    #[test]
    fn test_from_config_strips_trailing_slash() {
        let config = serde_json::json!({"base_url": "http://inference.local:11434/"});
        let backend = OllamaBackend::from_config(&config).unwrap();
        assert_eq!(backend.base_url, "http://inference.local:11434");
    }

    #[test]
    fn test_factory_rejects_bad_url() {
        let factory = OllamaBackendFactory;
        let config = serde_json::json!({"base_url": "inference.local"});
        assert!(factory.validate_config(&config).is_err());
    }

    #[test]
    fn test_factory_default_config() {
        let factory = OllamaBackendFactory;
        assert_eq!(factory.default_config()["base_url"], DEFAULT_BASE_URL);
    }

    #[test]
    fn test_bearer_token_not_in_debug_output() {
        let secret = "gateway-token-12345";
        let config = serde_json::json!({"bearer_token": secret});
        let backend = OllamaBackend::from_config(&config).unwrap();

        let debug_output = format!("{:?}", backend);
        assert!(
            !debug_output.contains(secret),
            "bearer token was exposed in Debug output!"
        );
        assert!(debug_output.contains("[REDACTED]"));
    }
}
