//! Inference backend abstractions for verdict-runtime.
//!
//! This module defines the trait both pipeline stages call through,
//! plus the Ollama-style HTTP implementation.
//!
//! # Blueprint Constraint
//! This is the ONLY place where model calls leave the process. The
//! decoding grammar and leakage detector in verdict-core never touch a
//! backend - stages call here, then classify locally.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

mod factory;

#[cfg(feature = "ollama")]
mod ollama;

#[cfg(test)]
pub(crate) mod testing;

pub use factory::{BackendFactory, BackendRegistry};

#[cfg(feature = "ollama")]
pub use ollama::{OllamaBackend, OllamaBackendFactory};

/// Placeholder text recorded when a backend call produced no usable
/// response.
pub const ERROR_SENTINEL: &str = "ERROR";

/// Errors from inference backends.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("HTTP request failed: {0}")]
    HttpError(String),

    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    ParseError(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("Backend not configured: {0}")]
    NotConfigured(String),
}

impl BackendError {
    /// Whether a retry could plausibly succeed. Parse and configuration
    /// errors are deterministic and never retried.
    pub fn is_transient(&self) -> bool {
        match self {
            BackendError::HttpError(_) | BackendError::Timeout(_) => true,
            BackendError::ApiError { status, .. } => *status >= 500,
            BackendError::ParseError(_) | BackendError::NotConfigured(_) => false,
        }
    }
}

/// Parameters for a single generation call.
///
/// Streaming is never requested: each stage wants one bounded completion
/// it can decode as a whole.
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    /// Model identifier on the serving backend
    pub model: String,

    /// Fully rendered prompt text
    pub prompt: String,

    /// Sampling temperature (0.0 for deterministic)
    pub temperature: f32,

    /// Maximum completion tokens
    pub max_tokens: u32,

    /// Nucleus sampling cap
    pub top_p: f32,

    /// Request timeout
    pub timeout: Duration,
}

/// Response from a generation call.
#[derive(Debug, Clone)]
pub struct GenerateResponse {
    /// Free-text completion
    pub text: String,

    /// Model that actually served the call
    pub model: String,
}

/// Backend abstraction allows swapping inference servers.
///
/// Which model serves which stage is configuration, not protocol: the
/// same trait carries both the judge's deterministic extraction calls
/// and the narrator's sampled explanation calls.
#[async_trait]
pub trait InferenceBackend: Send + Sync {
    /// Execute a generation call.
    async fn generate(&self, request: &GenerateRequest)
        -> Result<GenerateResponse, BackendError>;

    /// Check if the backend is reachable.
    async fn health_check(&self) -> bool;

    /// Backend name for logs.
    fn name(&self) -> &str;
}
