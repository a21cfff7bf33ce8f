//! Model Context Protocol (MCP) server for Vermeer.
//!
//! This crate exposes Vermeer's vision analysis capabilities as standardized
//! tools LLMs can call over a line-delimited JSON-RPC stdio transport.
//!
//! # Tools
//!
//! - `analyze_image`: describe or interrogate one image
//! - `analyze_video`: describe or interrogate one video
//! - `compare_images`: compare two or more images in a single request
//! - `detect_objects_in_image`: labels plus normalized bounding boxes
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use vermeer_core::VermeerConfig;
//! use vermeer_mcp::{McpServer, ToolRegistry};
//! use vermeer_vision::{ProviderFactory, ProviderRegistry};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Arc::new(VermeerConfig::load()?);
//!     let factory = Arc::new(ProviderFactory::new(ProviderRegistry::with_defaults(), config));
//!     let server = McpServer::builder()
//!         .name("vermeer")
//!         .version(env!("CARGO_PKG_VERSION"))
//!         .tools(ToolRegistry::with_vision_tools(factory))
//!         .build();
//!     server.run_stdio().await?;
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod rpc;
mod server;
pub mod tools;

pub use server::{McpServer, McpServerBuilder};
pub use tools::{
    AnalyzeImageTool, AnalyzeVideoTool, CompareImagesTool, DetectObjectsTool, Detection, McpTool,
    ToolRegistry,
};
