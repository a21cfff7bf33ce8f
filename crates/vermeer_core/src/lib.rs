//! Core media types, source classification, and configuration for Vermeer.
//!
//! This crate holds everything the file-handling and provider-selection
//! pipeline agrees on:
//!
//! - **Source classification**: one ordered set of pattern matchers turning an
//!   ambiguous media-source string into a [`SourceKind`]. The file handling
//!   service and every vision provider use the same primitive, so the two
//!   classification sites can never diverge.
//! - **Data model**: [`FileReference`], [`UploadedFile`], [`StorageFile`].
//! - **Mime handling**: extension lookup and byte-signature sniffing.
//! - **Configuration**: the process-wide immutable [`VermeerConfig`] snapshot
//!   and generation-parameter resolution.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod media;
mod params;
mod reference;
mod source;
mod uploaded;

pub use config::{
    GeminiConfig, MediaPolicy, ProviderSelection, StorageBackendKind, StorageConfig, VermeerConfig,
    VertexConfig,
};
pub use media::{extension_for_mime, mime_from_extension, sniff_mime, MediaKind};
pub use params::{resolve_generation_params, GenerationConfig, GenerationParams};
pub use reference::FileReference;
pub use source::{classify, data_uri, SourceKind, GEMINI_FILE_HOST, GEMINI_HANDLE_PREFIX};
pub use uploaded::{FileState, StorageFile, UploadedFile};
