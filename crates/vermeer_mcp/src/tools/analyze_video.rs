//! Video analysis tool.

use super::{options_from, provider_for, required_str, schema, McpTool};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use vermeer_core::MediaKind;
use vermeer_error::VermeerResult;
use vermeer_vision::ProviderFactory;

const DEFAULT_PROMPT: &str = "Describe what happens in this video.";

/// `analyze_video`: forward one video and a prompt to a vision backend.
///
/// Public video URLs pass through to the backend unfetched; everything else
/// is staged through the provider's upload path (videos are never inlined).
pub struct AnalyzeVideoTool {
    factory: Arc<ProviderFactory>,
}

impl AnalyzeVideoTool {
    /// Create the tool over a shared provider factory.
    pub fn new(factory: Arc<ProviderFactory>) -> Self {
        Self { factory }
    }
}

#[async_trait]
impl McpTool for AnalyzeVideoTool {
    fn name(&self) -> &str {
        "analyze_video"
    }

    fn description(&self) -> &str {
        "Analyze a video with a multimodal AI model. Accepts http(s) URLs, \
         gs:// URIs, backend file handles, and local paths."
    }

    fn input_schema(&self) -> Value {
        schema(
            serde_json::json!({
                "source": {
                    "type": "string",
                    "description": "Video source: URL, gs:// URI, file handle, or local path"
                },
                "prompt": {
                    "type": "string",
                    "description": "What to ask about the video"
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

        let provider = provider_for(&self.factory, &input, MediaKind::Video)?;
        let result = provider.analyze_video(&source, &prompt, &options).await?;
        Ok(serde_json::to_value(result).unwrap_or(Value::Null))
    }
}
