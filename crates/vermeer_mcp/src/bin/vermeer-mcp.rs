//! Vermeer MCP server binary.

use anyhow::Result;
use std::sync::Arc;
use tracing_subscriber::{self, EnvFilter};
use vermeer_core::VermeerConfig;
use vermeer_mcp::{McpServer, ToolRegistry};
use vermeer_vision::{ProviderFactory, ProviderRegistry};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    let _ = dotenvy::dotenv();

    // stdout carries the protocol, so all diagnostics go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("Starting Vermeer MCP server");

    let config = Arc::new(VermeerConfig::load()?);
    let factory = Arc::new(ProviderFactory::new(
        ProviderRegistry::with_defaults(),
        config,
    ));

    let server = McpServer::builder()
        .name("vermeer")
        .version(env!("CARGO_PKG_VERSION"))
        .tools(ToolRegistry::with_vision_tools(factory))
        .build();

    server.run_stdio().await?;
    Ok(())
}
