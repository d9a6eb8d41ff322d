//! Pipeline configuration.
//!
//! Which backend serves which stage, and with what sampling budget, is
//! always an explicit configuration object handed to constructors -
//! never ambient global state. Tests substitute deterministic mock
//! backends by building a config and passing a different backend.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::backend::GenerateRequest;
use crate::retry::RetryPolicy;

/// Serialize durations as humantime strings ("120s", "2m").
pub(crate) mod duration_str {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&humantime::format_duration(*duration).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        humantime::parse_duration(&text).map_err(serde::de::Error::custom)
    }
}

/// Generation parameters for one pipeline stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageConfig {
    /// Model identifier on the serving backend
    pub model: String,

    /// Sampling temperature (0.0 for deterministic)
    pub temperature: f32,

    /// Maximum completion tokens
    pub max_tokens: u32,

    /// Nucleus sampling cap
    #[serde(default = "default_top_p")]
    pub top_p: f32,

    /// Stage timeout, covering the full (possibly retried) backend call
    #[serde(with = "duration_str")]
    pub timeout: Duration,

    /// Retry policy around the backend-call boundary
    #[serde(default)]
    pub retry: RetryPolicy,
}

fn default_top_p() -> f32 {
    1.0
}

impl StageConfig {
    /// Judge defaults: deterministic sampling, a handful of tokens, and
    /// a tighter timeout than the narrator since the prompt is short.
    pub fn judge_default() -> Self {
        Self {
            model: "phi3:mini".to_string(),
            temperature: 0.0,
            max_tokens: 10,
            top_p: 1.0,
            timeout: Duration::from_secs(120),
            retry: RetryPolicy::default(),
        }
    }

    /// Narrator defaults: a little lexical variety and a longer bounded
    /// output.
    pub fn narrator_default() -> Self {
        Self {
            model: "mistral:instruct".to_string(),
            temperature: 0.3,
            max_tokens: 200,
            top_p: 1.0,
            timeout: Duration::from_secs(180),
            retry: RetryPolicy::default(),
        }
    }

    /// Build the backend request for a rendered prompt.
    pub fn generate_request(&self, prompt: String) -> GenerateRequest {
        GenerateRequest {
            model: self.model.clone(),
            prompt,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            top_p: self.top_p,
            timeout: self.timeout,
        }
    }
}

/// Full pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Inference endpoint URL shared by both stages
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Judge stage parameters
    #[serde(default = "StageConfig::judge_default")]
    pub judge: StageConfig,

    /// Narrator stage parameters
    #[serde(default = "StageConfig::narrator_default")]
    pub narrator: StageConfig,

    /// Iterations for the repeatability check
    #[serde(default = "default_repeat_runs")]
    pub repeat_runs: usize,
}

fn default_endpoint() -> String {
    "http://localhost:11434".to_string()
}

fn default_repeat_runs() -> usize {
    3
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            judge: StageConfig::judge_default(),
            narrator: StageConfig::narrator_default(),
            repeat_runs: default_repeat_runs(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_defaults_differ() {
        let judge = StageConfig::judge_default();
        let narrator = StageConfig::narrator_default();

        assert_eq!(judge.temperature, 0.0);
        assert!(narrator.temperature > 0.0);
        assert!(judge.max_tokens < narrator.max_tokens);
        assert!(judge.timeout < narrator.timeout);
    }

    #[test]
    fn test_config_roundtrip_with_duration_strings() {
        let config = PipelineConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"2m\""));

        let back: PipelineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.judge.timeout, Duration::from_secs(120));
        assert_eq!(back.narrator.timeout, Duration::from_secs(180));
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let json = r#"{"endpoint": "http://inference.local:11434"}"#;
        let config: PipelineConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.endpoint, "http://inference.local:11434");
        assert_eq!(config.repeat_runs, 3);
        assert_eq!(config.judge.model, "phi3:mini");
    }

    #[test]
    fn test_generate_request_carries_stage_params() {
        let judge = StageConfig::judge_default();
        let request = judge.generate_request("Answer:".to_string());
        assert_eq!(request.model, judge.model);
        assert_eq!(request.temperature, 0.0);
        assert_eq!(request.max_tokens, 10);
    }
}
