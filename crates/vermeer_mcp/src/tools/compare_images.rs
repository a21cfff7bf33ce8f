//! Multi-image comparison tool.

use super::{options_from, provider_for, schema, McpTool};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use vermeer_core::MediaKind;
use vermeer_error::{FormatError, VermeerResult};
use vermeer_vision::ProviderFactory;

const DEFAULT_PROMPT: &str = "Compare these images and describe the differences.";

/// `compare_images`: send several images in one request.
pub struct CompareImagesTool {
    factory: Arc<ProviderFactory>,
}

impl CompareImagesTool {
    /// Create the tool over a shared provider factory.
    pub fn new(factory: Arc<ProviderFactory>) -> Self {
        Self { factory }
    }
}

#[async_trait]
impl McpTool for CompareImagesTool {
    fn name(&self) -> &str {
        "compare_images"
    }

    fn description(&self) -> &str {
        "Compare two or more images in a single request. Each source accepts \
         the same forms as analyze_image."
    }

    fn input_schema(&self) -> Value {
        schema(
            serde_json::json!({
                "sources": {
                    "type": "array",
                    "items": { "type": "string" },
                    "minItems": 2,
                    "description": "Image sources to compare"
                },
                "prompt": {
                    "type": "string",
                    "description": "What to compare"
                }
            }),
            &["sources"],
        )
    }

    async fn execute(&self, input: Value) -> VermeerResult<Value> {
        let sources: Vec<String> = input
            .get("sources")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();
        if sources.len() < 2 {
            return Err(
                FormatError::new("'sources' must list at least two image sources").into(),
            );
        }

        let prompt = super::optional_str(&input, "prompt")
            .unwrap_or_else(|| DEFAULT_PROMPT.to_string());
        let options = options_from(&input, None);

        let provider = provider_for(&self.factory, &input, MediaKind::Image)?;
        let result = provider.compare_images(&sources, &prompt, &options).await?;
        Ok(serde_json::to_value(result).unwrap_or(Value::Null))
    }
}
