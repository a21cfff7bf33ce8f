//! File handling pipeline, upload strategies, and vision providers.
//!
//! The pipeline turns an ambiguous media source string into a request a
//! multimodal backend accepts:
//!
//! 1. [`FileHandlingService`] classifies the source, fetches/reads/decodes
//!    bytes where needed, and decides inline vs. upload from the backend's
//!    size threshold;
//! 2. an [`UploadStrategy`] stages large media — the Gemini Files API
//!    directly, or external object storage rewritten to `gs://bucket/path`;
//! 3. a [`VisionProvider`] re-classifies the resolved reference to build its
//!    `generateContent` payload and maps the reply into an
//!    [`AnalysisResult`].
//!
//! Providers are constructed through a [`ProviderRegistry`] /
//! [`ProviderFactory`] pair; all configuration validation happens at
//! construction time.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod factory;
mod file_service;
mod gemini;
mod gemini_files;
mod options;
mod provider;
mod registry;
mod storage_strategy;
mod strategy;
mod vertex;
mod wire;

pub use factory::{build_storage_provider, build_upload_strategy};
pub use file_service::FileHandlingService;
pub use gemini::GeminiProvider;
pub use gemini_files::{GeminiFileStrategy, PollSchedule};
pub use options::{AnalysisOptions, AnalysisResult, Capabilities, ProviderInfo, TokenUsage};
pub use provider::VisionProvider;
pub use registry::{ProviderConstructor, ProviderFactory, ProviderRegistry};
pub use storage_strategy::StorageUploadStrategy;
pub use strategy::UploadStrategy;
pub use vertex::VertexProvider;
