//! Single-image analysis tool.

use super::{options_from, provider_for, required_str, schema, McpTool};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use vermeer_core::MediaKind;
use vermeer_error::VermeerResult;
use vermeer_vision::ProviderFactory;

const DEFAULT_PROMPT: &str = "Describe this image in detail.";

/// `analyze_image`: forward one image and a prompt to a vision backend.
pub struct AnalyzeImageTool {
    factory: Arc<ProviderFactory>,
}

impl AnalyzeImageTool {
    /// Create the tool over a shared provider factory.
    pub fn new(factory: Arc<ProviderFactory>) -> Self {
        Self { factory }
    }
}

#[async_trait]
impl McpTool for AnalyzeImageTool {
    fn name(&self) -> &str {
        "analyze_image"
    }

    fn description(&self) -> &str {
        "Analyze an image with a multimodal AI model. Accepts data URIs, \
         http(s) URLs, gs:// URIs, backend file handles, and local paths."
    }

    fn input_schema(&self) -> Value {
        schema(
            serde_json::json!({
                "source": {
                    "type": "string",
                    "description": "Image source: data URI, URL, gs:// URI, file handle, or local path"
                },
                "prompt": {
                    "type": "string",
                    "description": "What to ask about the image"
                }
            }),
            &["source"],
        )
    }

    async fn execute(&self, input: Value) -> VermeerResult<Value> {
        let source = required_str(&input, "source")?;
        let prompt = super::optional_str(&input, "prompt")
            .unwrap_or_else(|| DEFAULT_PROMPT.to_string());
        let options = options_from(&input, None);

        let provider = provider_for(&self.factory, &input, MediaKind::Image)?;
        let result = provider.analyze_image(&source, &prompt, &options).await?;
        Ok(serde_json::to_value(result).unwrap_or(Value::Null))
    }
}
