//! Error types for the Vermeer library.
//!
//! This crate provides the foundation error types used throughout the Vermeer
//! workspace.
//!
//! # Error Hierarchy
//!
//! All errors follow the `ErrorKind` + wrapper struct pattern for clean error
//! handling:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - All errors use `#[track_caller]` for automatic location capture
//!
//! Every error maps to a stable machine-readable code (see
//! [`VermeerError::code`]) so the tool layer can present a uniform
//! `{code, message, provider}` shape to MCP clients.
//!
//! # Examples
//!
//! ```
//! use vermeer_error::{VermeerResult, FormatError};
//!
//! fn classify(source: &str) -> VermeerResult<()> {
//!     Err(FormatError::new(format!("unrecognized media source: {source}")))?
//! }
//!
//! match classify("???") {
//!     Ok(_) => println!("classified"),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod format;
mod provider;
mod storage;
mod upload;

pub use config::ConfigError;
pub use error::{VermeerError, VermeerErrorKind, VermeerResult};
pub use format::FormatError;
pub use provider::{ProviderError, ProviderErrorKind};
pub use storage::{StorageError, StorageErrorKind};
pub use upload::{UploadError, UploadErrorKind};
