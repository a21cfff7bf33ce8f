//! Tool trait, registry, and the served tools.

mod analyze_image;
mod analyze_video;
mod compare_images;
mod detect_objects;

pub use analyze_image::AnalyzeImageTool;
pub use analyze_video::AnalyzeVideoTool;
pub use compare_images::CompareImagesTool;
pub use detect_objects::{Detection, DetectObjectsTool};

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use vermeer_core::{GenerationParams, MediaKind};
use vermeer_error::{FormatError, VermeerResult};
use vermeer_vision::{AnalysisOptions, ProviderFactory, VisionProvider};

/// Trait for MCP tools.
#[async_trait]
pub trait McpTool: Send + Sync {
    /// Returns the tool name.
    fn name(&self) -> &str;

    /// Returns the tool description for the LLM.
    fn description(&self) -> &str;

    /// Returns the input schema as JSON Schema.
    fn input_schema(&self) -> Value;

    /// Executes the tool with the given input.
    async fn execute(&self, input: Value) -> VermeerResult<Value>;
}

/// Registry for managing MCP tools.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn McpTool>>,
}

impl ToolRegistry {
    /// Creates a new tool registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the four vision tools over a shared factory.
    pub fn with_vision_tools(factory: Arc<ProviderFactory>) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(AnalyzeImageTool::new(factory.clone())));
        registry.register(Arc::new(AnalyzeVideoTool::new(factory.clone())));
        registry.register(Arc::new(CompareImagesTool::new(factory.clone())));
        registry.register(Arc::new(DetectObjectsTool::new(factory)));
        registry
    }

    /// Registers a tool.
    pub fn register(&mut self, tool: Arc<dyn McpTool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    /// Gets a tool by name.
    pub fn get(&self, name: &str) -> Option<&Arc<dyn McpTool>> {
        self.tools.get(name)
    }

    /// All registered tools, sorted by name for stable listings.
    pub fn tools(&self) -> Vec<&Arc<dyn McpTool>> {
        let mut tools: Vec<_> = self.tools.values().collect();
        tools.sort_by_key(|t| t.name().to_string());
        tools
    }
}

/// Extract a required string argument.
pub(crate) fn required_str(input: &Value, key: &str) -> VermeerResult<String> {
    input
        .get(key)
        .and_then(Value::as_str)
        .map(String::from)
        .ok_or_else(|| FormatError::new(format!("missing required argument '{key}'")).into())
}

pub(crate) fn optional_str(input: &Value, key: &str) -> Option<String> {
    input.get(key).and_then(Value::as_str).map(String::from)
}

/// Assemble analysis options from direct tool arguments.
pub(crate) fn options_from(input: &Value, task: Option<&str>) -> AnalysisOptions {
    let params = GenerationParams {
        temperature: input.get("temperature").and_then(Value::as_f64).map(|v| v as f32),
        top_p: input.get("top_p").and_then(Value::as_f64).map(|v| v as f32),
        top_k: input.get("top_k").and_then(Value::as_u64).map(|v| v as u32),
        max_output_tokens: input
            .get("max_output_tokens")
            .and_then(Value::as_u64)
            .map(|v| v as u32),
    };
    AnalysisOptions {
        params,
        task: task.map(String::from),
        model: optional_str(input, "model"),
    }
}

/// Resolve the provider for a call: explicit `provider` argument, else the
/// configured selection for the media kind.
pub(crate) fn provider_for(
    factory: &ProviderFactory,
    input: &Value,
    kind: MediaKind,
) -> VermeerResult<Arc<dyn VisionProvider>> {
    match optional_str(input, "provider") {
        Some(name) => factory.provider(&name),
        None => factory.for_kind(kind),
    }
}

/// Schema fragment shared by every tool: generation parameter overrides.
pub(crate) fn generation_properties() -> Value {
    serde_json::json!({
        "provider": {
            "type": "string",
            "enum": ["gemini", "vertex"],
            "description": "Backend override; defaults to the configured provider"
        },
        "model": { "type": "string", "description": "Model override" },
        "temperature": { "type": "number", "minimum": 0.0, "maximum": 2.0 },
        "top_p": { "type": "number", "minimum": 0.0, "maximum": 1.0 },
        "top_k": { "type": "integer", "minimum": 1 },
        "max_output_tokens": { "type": "integer", "minimum": 1 }
    })
}

/// Merge tool-specific properties over the shared generation ones.
pub(crate) fn schema(properties: Value, required: &[&str]) -> Value {
    let mut all = generation_properties();
    if let (Some(base), Some(extra)) = (all.as_object_mut(), properties.as_object()) {
        for (key, value) in extra {
            base.insert(key.clone(), value.clone());
        }
    }
    serde_json::json!({
        "type": "object",
        "properties": all,
        "required": required,
    })
}
