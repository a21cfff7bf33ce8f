//! MCP server implementation over line-delimited JSON-RPC on stdio.

use crate::rpc::{
    RpcRequest, RpcResponse, INVALID_PARAMS, METHOD_NOT_FOUND, PARSE_ERROR, PROTOCOL_VERSION,
};
use crate::tools::ToolRegistry;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, info, instrument, warn};
use vermeer_error::{VermeerError, VermeerResult};

/// MCP server for Vermeer.
pub struct McpServer {
    name: String,
    version: String,
    tools: ToolRegistry,
}

impl McpServer {
    /// Creates a new server builder.
    pub fn builder() -> McpServerBuilder {
        McpServerBuilder::default()
    }

    /// Runs the server using stdio transport until stdin closes.
    #[instrument(skip(self))]
    pub async fn run_stdio(self) -> VermeerResult<()> {
        info!(
            name = %self.name,
            version = %self.version,
            tools = self.tools.tools().len(),
            "MCP server ready on stdio"
        );

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut stdout = tokio::io::stdout();

        while let Ok(Some(line)) = lines.next_line().await {
            if line.trim().is_empty() {
                continue;
            }
            if let Some(response) = self.handle_message(&line).await {
                stdout.write_all(response.as_bytes()).await.ok();
                stdout.write_all(b"\n").await.ok();
                stdout.flush().await.ok();
            }
        }

        info!("stdin closed, shutting down");
        Ok(())
    }

    /// Handle one protocol line. Returns `None` for notifications, which get
    /// no response.
    pub async fn handle_message(&self, line: &str) -> Option<String> {
        let request: RpcRequest = match serde_json::from_str(line) {
            Ok(request) => request,
            Err(e) => {
                warn!(error = %e, "unparseable message");
                return Some(
                    RpcResponse::error(Value::Null, PARSE_ERROR, format!("parse error: {e}"))
                        .to_line(),
                );
            }
        };

        debug!(method = %request.method, "handling request");
        let id = request.id.clone();
        match request.method.as_str() {
            "initialize" => {
                let id = id?;
                Some(RpcResponse::result(id, self.initialize_result()).to_line())
            }
            "notifications/initialized" | "notifications/cancelled" => None,
            "ping" => {
                let id = id?;
                Some(RpcResponse::result(id, serde_json::json!({})).to_line())
            }
            "tools/list" => {
                let id = id?;
                Some(RpcResponse::result(id, self.list_tools_result()).to_line())
            }
            "tools/call" => {
                let id = id?;
                Some(self.call_tool(id, &request.params).await.to_line())
            }
            other => {
                let id = id?;
                Some(
                    RpcResponse::error(id, METHOD_NOT_FOUND, format!("unknown method '{other}'"))
                        .to_line(),
                )
            }
        }
    }

    fn initialize_result(&self) -> Value {
        serde_json::json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": { "tools": {} },
            "serverInfo": {
                "name": self.name,
                "version": self.version,
            }
        })
    }

    fn list_tools_result(&self) -> Value {
        let tools: Vec<Value> = self
            .tools
            .tools()
            .into_iter()
            .map(|tool| {
                serde_json::json!({
                    "name": tool.name(),
                    "description": tool.description(),
                    "inputSchema": tool.input_schema(),
                })
            })
            .collect();
        serde_json::json!({ "tools": tools })
    }

    #[instrument(skip(self, params), fields(tool))]
    async fn call_tool(&self, id: Value, params: &Value) -> RpcResponse {
        let Some(name) = params.get("name").and_then(Value::as_str) else {
            return RpcResponse::error(
                id,
                INVALID_PARAMS,
                "tools/call requires a string 'name' parameter",
            );
        };
        tracing::Span::current().record("tool", name);
        let Some(tool) = self.tools.get(name) else {
            return RpcResponse::error(id, METHOD_NOT_FOUND, format!("unknown tool '{name}'"));
        };
        let arguments = params
            .get("arguments")
            .cloned()
            .unwrap_or_else(|| serde_json::json!({}));

        match tool.execute(arguments).await {
            Ok(result) => {
                let text = serde_json::to_string(&result).unwrap_or_else(|_| "null".to_string());
                RpcResponse::result(
                    id,
                    serde_json::json!({
                        "content": [{ "type": "text", "text": text }],
                        "isError": false,
                    }),
                )
            }
            Err(e) => {
                warn!(tool = name, error = %e, "tool execution failed");
                RpcResponse::result(id, tool_error_result(&e))
            }
        }
    }
}

/// Tool failures travel inside a successful RPC envelope with `isError` set,
/// carrying a structured payload the calling LLM can act on.
fn tool_error_result(e: &VermeerError) -> Value {
    let payload = serde_json::json!({
        "code": e.code(),
        "message": e.to_string(),
        "provider": e.provider(),
    });
    serde_json::json!({
        "content": [{
            "type": "text",
            "text": payload.to_string(),
        }],
        "isError": true,
    })
}

/// Builder for MCP server.
#[derive(Default)]
pub struct McpServerBuilder {
    name: Option<String>,
    version: Option<String>,
    tools: Option<ToolRegistry>,
}

impl McpServerBuilder {
    /// Sets the server name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the server version.
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Sets the tool registry.
    pub fn tools(mut self, tools: ToolRegistry) -> Self {
        self.tools = Some(tools);
        self
    }

    /// Builds the server.
    pub fn build(self) -> McpServer {
        McpServer {
            name: self.name.unwrap_or_else(|| "vermeer".to_string()),
            version: self
                .version
                .unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string()),
            tools: self.tools.unwrap_or_default(),
        }
    }
}
