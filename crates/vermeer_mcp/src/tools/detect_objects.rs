//! Object detection tool built on top of plain image analysis.

use super::{options_from, provider_for, required_str, schema, McpTool};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use vermeer_core::MediaKind;
use vermeer_error::{ProviderError, ProviderErrorKind, VermeerResult};
use vermeer_vision::ProviderFactory;

const DETECTION_PROMPT: &str = "Detect all prominent objects in this image. For each object, report \
its label, a bounding box, and your confidence. Respond with ONLY a JSON array, no prose and no \
markdown, where each element is an object of the form \
{\"label\": string, \"box_2d\": [ymin, xmin, ymax, xmax], \"confidence\": number}. \
Box coordinates are normalized to the 0-1000 range. If nothing is detected, respond with [].";

/// One detected object in model-reported coordinates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Detection {
    /// Object label
    pub label: String,
    /// Bounding box as [ymin, xmin, ymax, xmax], normalized to 0-1000
    pub box_2d: Vec<f32>,
    /// Model confidence, when reported
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
}

/// `detect_objects_in_image`: prompt for bounding boxes and parse the reply.
pub struct DetectObjectsTool {
    factory: Arc<ProviderFactory>,
}

impl DetectObjectsTool {
    /// Create the tool over a shared provider factory.
    pub fn new(factory: Arc<ProviderFactory>) -> Self {
        Self { factory }
    }
}

#[async_trait]
impl McpTool for DetectObjectsTool {
    fn name(&self) -> &str {
        "detect_objects_in_image"
    }

    fn description(&self) -> &str {
        "Detect objects in an image, returning labels with normalized \
         bounding boxes. Accepts the same sources as analyze_image."
    }

    fn input_schema(&self) -> Value {
        schema(
            serde_json::json!({
                "source": {
                    "type": "string",
                    "description": "Image source: data URI, URL, gs:// URI, file handle, or local path"
                }
            }),
            &["source"],
        )
    }

    async fn execute(&self, input: Value) -> VermeerResult<Value> {
        let source = required_str(&input, "source")?;
        let options = options_from(&input, Some("object_detection"));

        let provider = provider_for(&self.factory, &input, MediaKind::Image)?;
        let result = provider
            .analyze_image(&source, DETECTION_PROMPT, &options)
            .await?;

        let backend: &'static str = if result.provider == "vertex" {
            "vertex"
        } else {
            "gemini"
        };
        let detections = parse_detections(&result.text).map_err(|snippet| {
            ProviderError::new(
                backend,
                ProviderErrorKind::InvalidResponse(format!(
                    "detection reply was not a JSON array: {snippet}"
                )),
            )
        })?;

        Ok(serde_json::json!({
            "detections": detections,
            "model": result.model,
            "provider": result.provider,
            "usage": result.usage,
        }))
    }
}

/// Parse a detection reply, tolerating markdown code fences and surrounding
/// prose. On failure, returns a short snippet of the offending text.
fn parse_detections(text: &str) -> Result<Vec<Detection>, String> {
    let trimmed = text.trim();

    // Strip a ```json ... ``` fence if the model added one anyway.
    let body = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .map(str::trim)
        .unwrap_or(trimmed);

    if let Ok(detections) = serde_json::from_str::<Vec<Detection>>(body) {
        return Ok(detections);
    }

    // Last resort: extract the outermost array from mixed prose.
    if let (Some(start), Some(end)) = (body.find('['), body.rfind(']')) {
        if start < end {
            if let Ok(detections) = serde_json::from_str::<Vec<Detection>>(&body[start..=end]) {
                return Ok(detections);
            }
        }
    }

    let snippet: String = trimmed.chars().take(120).collect();
    Err(snippet)
}

#[cfg(test)]
mod tests {
    use super::parse_detections;

    #[test]
    fn bare_array_parses() {
        let text = r#"[{"label": "dog", "box_2d": [100, 200, 500, 600], "confidence": 0.97}]"#;
        let detections = parse_detections(text).unwrap();
        assert_eq!(detections.len(), 1);
        assert_eq!(detections[0].label, "dog");
        assert_eq!(detections[0].box_2d, vec![100.0, 200.0, 500.0, 600.0]);
        assert_eq!(detections[0].confidence, Some(0.97));
    }

    #[test]
    fn fenced_array_parses() {
        let text = "```json\n[{\"label\": \"cat\", \"box_2d\": [0, 0, 1000, 1000]}]\n```";
        let detections = parse_detections(text).unwrap();
        assert_eq!(detections[0].label, "cat");
        assert_eq!(detections[0].confidence, None);
    }

    #[test]
    fn array_embedded_in_prose_parses() {
        let text = "Here are the objects I found:\n[{\"label\": \"tree\", \"box_2d\": [10, 20, 30, 40]}]\nLet me know if you need more.";
        let detections = parse_detections(text).unwrap();
        assert_eq!(detections[0].label, "tree");
    }

    #[test]
    fn empty_scene_is_an_empty_list() {
        assert!(parse_detections("[]").unwrap().is_empty());
    }

    #[test]
    fn prose_without_an_array_is_rejected() {
        let err = parse_detections("I cannot identify any objects.").unwrap_err();
        assert!(err.starts_with("I cannot"));
    }
}
