//! Generation parameter resolution.
//!
//! Parameters resolve field-by-field with the precedence:
//! direct value > function-specific override > task-specific override >
//! universal config > provider default. The logic lives in free functions
//! shared by every provider, so no provider carries its own copy.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Generation parameters for a vision request.
///
/// All fields are optional; `None` defers to the next layer in the
/// precedence chain.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GenerationParams {
    /// Sampling temperature
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Nucleus sampling probability mass
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    /// Top-k sampling cutoff
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    /// Maximum output tokens
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
}

impl GenerationParams {
    /// Whether every field is unset.
    pub fn is_empty(&self) -> bool {
        self.temperature.is_none()
            && self.top_p.is_none()
            && self.top_k.is_none()
            && self.max_output_tokens.is_none()
    }
}

/// Per-task and per-function generation overrides from configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Universal defaults applied when nothing more specific is set
    #[serde(default)]
    pub universal: GenerationParams,
    /// Overrides keyed by task name (e.g. `"object_detection"`)
    #[serde(default)]
    pub tasks: HashMap<String, GenerationParams>,
    /// Overrides keyed by function name (e.g. `"analyze_video"`)
    #[serde(default)]
    pub functions: HashMap<String, GenerationParams>,
}

impl GenerationConfig {
    /// Resolve effective parameters for a call.
    ///
    /// `direct` carries caller-supplied values; `function` and `task` select
    /// the config override maps.
    pub fn resolve(
        &self,
        direct: &GenerationParams,
        function: &str,
        task: Option<&str>,
    ) -> GenerationParams {
        resolve_generation_params(
            direct,
            self.functions.get(function),
            task.and_then(|t| self.tasks.get(t)),
            &self.universal,
        )
    }
}

/// Merge parameter layers field-by-field.
///
/// Precedence per field: `direct` > `function` > `task` > `universal`.
/// Fields left `None` after merging fall through to provider defaults at
/// request-build time.
///
/// # Examples
///
/// ```
/// use vermeer_core::{resolve_generation_params, GenerationParams};
///
/// let direct = GenerationParams { temperature: Some(0.1), ..Default::default() };
/// let universal = GenerationParams { temperature: Some(0.9), top_k: Some(40), ..Default::default() };
/// let resolved = resolve_generation_params(&direct, None, None, &universal);
/// assert_eq!(resolved.temperature, Some(0.1));
/// assert_eq!(resolved.top_k, Some(40));
/// ```
pub fn resolve_generation_params(
    direct: &GenerationParams,
    function: Option<&GenerationParams>,
    task: Option<&GenerationParams>,
    universal: &GenerationParams,
) -> GenerationParams {
    let pick_f32 = |get: fn(&GenerationParams) -> Option<f32>| {
        get(direct)
            .or_else(|| function.and_then(get))
            .or_else(|| task.and_then(get))
            .or_else(|| get(universal))
    };
    let pick_u32 = |get: fn(&GenerationParams) -> Option<u32>| {
        get(direct)
            .or_else(|| function.and_then(get))
            .or_else(|| task.and_then(get))
            .or_else(|| get(universal))
    };

    GenerationParams {
        temperature: pick_f32(|p| p.temperature),
        top_p: pick_f32(|p| p.top_p),
        top_k: pick_u32(|p| p.top_k),
        max_output_tokens: pick_u32(|p| p.max_output_tokens),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(temperature: Option<f32>, top_k: Option<u32>) -> GenerationParams {
        GenerationParams {
            temperature,
            top_k,
            ..Default::default()
        }
    }

    #[test]
    fn direct_beats_every_layer() {
        let resolved = resolve_generation_params(
            &params(Some(0.0), None),
            Some(&params(Some(0.3), Some(10))),
            Some(&params(Some(0.5), Some(20))),
            &params(Some(0.9), Some(40)),
        );
        assert_eq!(resolved.temperature, Some(0.0));
        assert_eq!(resolved.top_k, Some(10));
    }

    #[test]
    fn function_beats_task_beats_universal() {
        let resolved = resolve_generation_params(
            &GenerationParams::default(),
            Some(&params(None, Some(10))),
            Some(&params(Some(0.5), Some(20))),
            &params(Some(0.9), Some(40)),
        );
        assert_eq!(resolved.temperature, Some(0.5));
        assert_eq!(resolved.top_k, Some(10));
    }

    #[test]
    fn unset_everywhere_stays_unset() {
        let resolved = resolve_generation_params(
            &GenerationParams::default(),
            None,
            None,
            &GenerationParams::default(),
        );
        assert!(resolved.is_empty());
    }
}
