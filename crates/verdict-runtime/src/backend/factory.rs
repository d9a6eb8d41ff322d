//! Backend factory pattern for dynamic inference-backend registration.
//!
//! Backend identity (which server and model answer for a stage) lives in
//! configuration, never in code. Factories create instances from JSON
//! config so new backend types can be added without touching an enum.
//!
//! ## Usage
//!
//! ```ignore
//! let mut registry = BackendRegistry::new();
//! registry.register(Arc::new(OllamaBackendFactory));
//!
//! let backend = registry.create("ollama", &config)?;
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value as JsonValue;

use super::{BackendError, InferenceBackend};

/// Factory for creating inference backends from configuration.
pub trait BackendFactory: Send + Sync {
    /// Unique identifier for this backend type.
    ///
    /// Examples: "ollama", "openai-compatible"
    fn backend_type(&self) -> &'static str;

    /// Create a backend instance from JSON configuration.
    fn create(&self, config: &JsonValue) -> Result<Arc<dyn InferenceBackend>, BackendError>;

    /// Validate configuration without creating a backend.
    fn validate_config(&self, config: &JsonValue) -> Result<(), BackendError>;

    /// Default configuration for this backend type.
    fn default_config(&self) -> JsonValue {
        serde_json::json!({})
    }
}

/// Registry of available backend factories.
#[derive(Default)]
pub struct BackendRegistry {
    factories: BTreeMap<String, Arc<dyn BackendFactory>>,
}

impl BackendRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a backend factory.
    ///
    /// A factory with the same type name replaces the previous one.
    pub fn register(&mut self, factory: Arc<dyn BackendFactory>) {
        self.factories
            .insert(factory.backend_type().to_string(), factory);
    }

    /// Create a backend from type name and configuration.
    pub fn create(
        &self,
        backend_type: &str,
        config: &JsonValue,
    ) -> Result<Arc<dyn InferenceBackend>, BackendError> {
        self.factories
            .get(backend_type)
            .ok_or_else(|| {
                BackendError::NotConfigured(format!(
                    "Unknown backend type: '{}'. Available: {:?}",
                    backend_type,
                    self.available_types()
                ))
            })?
            .create(config)
    }

    /// Validate configuration for a backend type.
    pub fn validate(&self, backend_type: &str, config: &JsonValue) -> Result<(), BackendError> {
        self.factories
            .get(backend_type)
            .ok_or_else(|| {
                BackendError::NotConfigured(format!("Unknown backend type: '{}'", backend_type))
            })?
            .validate_config(config)
    }

    /// Registered backend type names, sorted.
    pub fn available_types(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{GenerateRequest, GenerateResponse};
    use async_trait::async_trait;

    struct NullBackend;

    #[async_trait]
    impl InferenceBackend for NullBackend {
        async fn generate(
            &self,
            _request: &GenerateRequest,
        ) -> Result<GenerateResponse, BackendError> {
            Ok(GenerateResponse {
                text: String::new(),
                model: "null".to_string(),
            })
        }

        async fn health_check(&self) -> bool {
            true
        }

        fn name(&self) -> &str {
            "null"
        }
    }

    struct NullFactory;

    impl BackendFactory for NullFactory {
        fn backend_type(&self) -> &'static str {
            "null"
        }

        fn create(&self, _config: &JsonValue) -> Result<Arc<dyn InferenceBackend>, BackendError> {
            Ok(Arc::new(NullBackend))
        }

        fn validate_config(&self, _config: &JsonValue) -> Result<(), BackendError> {
            Ok(())
        }
    }

    #[test]
    fn test_register_and_create() {
        let mut registry = BackendRegistry::new();
        registry.register(Arc::new(NullFactory));

        let backend = registry.create("null", &serde_json::json!({})).unwrap();
        assert_eq!(backend.name(), "null");
    }

    #[test]
    fn test_unknown_type_lists_available() {
        let mut registry = BackendRegistry::new();
        registry.register(Arc::new(NullFactory));

        let Err(err) = registry.create("missing", &serde_json::json!({})) else {
            panic!("expected error for unknown backend type");
        };
        let msg = err.to_string();
        assert!(msg.contains("missing"));
        assert!(msg.contains("null"));
    }
}
