//! Request options and analysis results.

use serde::{Deserialize, Serialize};
use vermeer_core::GenerationParams;

/// Caller-supplied options for an analysis call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisOptions {
    /// Direct generation parameters; highest precedence in resolution.
    #[serde(default)]
    pub params: GenerationParams,
    /// Task name selecting a per-task config override ("object_detection").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task: Option<String>,
    /// Model override for this call.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

/// Token accounting reported by a backend, when available.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Tokens consumed by the prompt and media
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_tokens: Option<u32>,
    /// Tokens in the generated reply
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_tokens: Option<u32>,
    /// Total billed tokens
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_tokens: Option<u32>,
}

/// Outcome of an analysis call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Generated text
    pub text: String,
    /// Model that produced the text
    pub model: String,
    /// Backend that served the request ("gemini", "vertex")
    pub provider: String,
    /// Token usage, when the backend reported it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<TokenUsage>,
}

/// Static description of a provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderInfo {
    /// Backend name
    pub name: String,
    /// Default model
    pub model: String,
    /// Deployment location, for regional backends
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

/// What a provider can do, used by the tool layer for routing decisions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Capabilities {
    /// Whether video analysis is supported
    pub supports_video: bool,
    /// Whether the backend has its own file upload endpoint
    pub supports_file_upload: bool,
    /// Largest payload the backend accepts inline
    pub max_inline_bytes: u64,
}
