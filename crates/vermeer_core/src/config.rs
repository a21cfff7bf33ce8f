//! Process-wide configuration.
//!
//! Loaded once at startup and immutable thereafter. The snapshot is passed
//! explicitly into factories and services — there is no global config
//! singleton. Sources, later overriding earlier:
//!
//! 1. Bundled defaults (`include_str!` from vermeer.toml)
//! 2. `~/.config/vermeer/vermeer.toml`
//! 3. `./vermeer.toml`
//!
//! Credentials never live in the TOML files; they are read from the
//! environment at use time (`GEMINI_API_KEY`, `VERTEX_PROJECT_ID`,
//! `STORAGE_ACCESS_KEY`, ...).

use crate::{GenerationConfig, MediaKind};
use config::{Config, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::env;
use tracing::{debug, instrument};
use vermeer_error::{ConfigError, VermeerResult};

const MIB: u64 = 1024 * 1024;

/// Which vision backend serves each media kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderSelection {
    /// Backend for image requests ("gemini" or "vertex")
    #[serde(default = "default_provider")]
    pub image: String,
    /// Backend for video requests
    #[serde(default = "default_provider")]
    pub video: String,
}

fn default_provider() -> String {
    "gemini".to_string()
}

impl Default for ProviderSelection {
    fn default() -> Self {
        Self {
            image: default_provider(),
            video: default_provider(),
        }
    }
}

impl ProviderSelection {
    /// Backend name configured for a media kind.
    pub fn for_kind(&self, kind: MediaKind) -> &str {
        match kind {
            MediaKind::Image => &self.image,
            MediaKind::Video => &self.video,
        }
    }
}

/// Direct Gemini API settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeminiConfig {
    /// Model used for generation calls
    #[serde(default = "default_gemini_model")]
    pub model: String,
    /// Base URL of the Gemini REST API (overridable for tests)
    #[serde(default = "default_gemini_base_url")]
    pub base_url: String,
    /// Payloads at or under this size are inlined as data-URIs
    #[serde(default = "default_gemini_inline_limit")]
    pub inline_limit_bytes: u64,
}

fn default_gemini_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_gemini_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_gemini_inline_limit() -> u64 {
    10 * MIB
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            model: default_gemini_model(),
            base_url: default_gemini_base_url(),
            inline_limit_bytes: default_gemini_inline_limit(),
        }
    }
}

impl GeminiConfig {
    /// Read the API key from `GEMINI_API_KEY`.
    pub fn api_key(&self) -> VermeerResult<String> {
        env::var("GEMINI_API_KEY")
            .map_err(|_| ConfigError::new("GEMINI_API_KEY environment variable not set").into())
    }
}

/// Vertex AI (enterprise cloud) settings.
///
/// Vertex has no native small-object file endpoint, so external storage is
/// mandatory when it is the selected backend; the upload strategy factory
/// validates this at construction time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VertexConfig {
    /// GCP project id; falls back to `VERTEX_PROJECT_ID`
    #[serde(default)]
    pub project_id: Option<String>,
    /// GCP region for the Vertex endpoint
    #[serde(default = "default_vertex_location")]
    pub location: String,
    /// Model used for generation calls
    #[serde(default = "default_vertex_model")]
    pub model: String,
    /// Payloads over this size are uploaded; default 0 (always upload)
    #[serde(default)]
    pub inline_limit_bytes: u64,
    /// Deadline for image generation calls, seconds
    #[serde(default = "default_image_timeout")]
    pub image_timeout_secs: u64,
    /// Deadline for video generation calls, seconds
    #[serde(default = "default_video_timeout")]
    pub video_timeout_secs: u64,
}

fn default_vertex_location() -> String {
    "us-central1".to_string()
}

fn default_vertex_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_image_timeout() -> u64 {
    60
}

fn default_video_timeout() -> u64 {
    120
}

impl Default for VertexConfig {
    fn default() -> Self {
        Self {
            project_id: None,
            location: default_vertex_location(),
            model: default_vertex_model(),
            inline_limit_bytes: 0,
            image_timeout_secs: default_image_timeout(),
            video_timeout_secs: default_video_timeout(),
        }
    }
}

impl VertexConfig {
    /// Effective project id: config value or `VERTEX_PROJECT_ID`.
    pub fn resolved_project_id(&self) -> Option<String> {
        self.project_id
            .clone()
            .or_else(|| env::var("VERTEX_PROJECT_ID").ok())
    }

    /// Generation deadline for a media kind.
    pub fn timeout_secs(&self, kind: MediaKind) -> u64 {
        match kind {
            MediaKind::Image => self.image_timeout_secs,
            MediaKind::Video => self.video_timeout_secs,
        }
    }
}

/// Storage backend family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackendKind {
    /// S3-compatible object store (AWS S3, MinIO, R2, ...)
    S3,
    /// Google Cloud Storage via the JSON API
    Gcs,
}

impl std::fmt::Display for StorageBackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackendKind::S3 => write!(f, "s3"),
            StorageBackendKind::Gcs => write!(f, "gcs"),
        }
    }
}

/// External object storage settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Which storage family to use
    #[serde(default = "default_storage_backend")]
    pub backend: StorageBackendKind,
    /// Bucket name; falls back to `STORAGE_BUCKET`
    #[serde(default)]
    pub bucket: Option<String>,
    /// Region (S3 signing); falls back to the Vertex location for GCS interop
    #[serde(default)]
    pub region: Option<String>,
    /// Endpoint override for S3-compatible stores (e.g. MinIO)
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Use path-style object URLs instead of virtual-host-style
    #[serde(default)]
    pub path_style: bool,
    /// CDN base URL; when set, takes precedence over both URL styles
    #[serde(default)]
    pub cdn_base_url: Option<String>,
}

fn default_storage_backend() -> StorageBackendKind {
    StorageBackendKind::Gcs
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_storage_backend(),
            bucket: None,
            region: None,
            endpoint: None,
            path_style: false,
            cdn_base_url: None,
        }
    }
}

impl StorageConfig {
    /// Effective bucket: config value or `STORAGE_BUCKET`.
    pub fn resolved_bucket(&self) -> Option<String> {
        self.bucket
            .clone()
            .or_else(|| env::var("STORAGE_BUCKET").ok())
    }

    /// Access key from `STORAGE_ACCESS_KEY` (S3 signing / GCS interop HMAC).
    pub fn access_key(&self) -> Option<String> {
        env::var("STORAGE_ACCESS_KEY").ok()
    }

    /// Secret key from `STORAGE_SECRET_KEY`.
    pub fn secret_key(&self) -> Option<String> {
        env::var("STORAGE_SECRET_KEY").ok()
    }
}

/// Size and format policy enforced before any upload is attempted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaPolicy {
    /// Maximum image payload in bytes
    #[serde(default = "default_max_image_bytes")]
    pub max_image_bytes: u64,
    /// Maximum video payload in bytes
    #[serde(default = "default_max_video_bytes")]
    pub max_video_bytes: u64,
    /// Allowed image mime types
    #[serde(default = "default_image_formats")]
    pub allowed_image_formats: Vec<String>,
    /// Allowed video mime types
    #[serde(default = "default_video_formats")]
    pub allowed_video_formats: Vec<String>,
}

fn default_max_image_bytes() -> u64 {
    20 * MIB
}

fn default_max_video_bytes() -> u64 {
    2048 * MIB
}

fn default_image_formats() -> Vec<String> {
    ["image/jpeg", "image/png", "image/gif", "image/webp"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_video_formats() -> Vec<String> {
    ["video/mp4", "video/webm", "video/quicktime", "video/x-msvideo"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for MediaPolicy {
    fn default() -> Self {
        Self {
            max_image_bytes: default_max_image_bytes(),
            max_video_bytes: default_max_video_bytes(),
            allowed_image_formats: default_image_formats(),
            allowed_video_formats: default_video_formats(),
        }
    }
}

impl MediaPolicy {
    /// Maximum payload size for a media kind.
    pub fn max_bytes(&self, kind: MediaKind) -> u64 {
        match kind {
            MediaKind::Image => self.max_image_bytes,
            MediaKind::Video => self.max_video_bytes,
        }
    }

    /// Allowed formats for a media kind.
    pub fn allowed_formats(&self, kind: MediaKind) -> &[String] {
        match kind {
            MediaKind::Image => &self.allowed_image_formats,
            MediaKind::Video => &self.allowed_video_formats,
        }
    }
}

/// Top-level Vermeer configuration snapshot.
///
/// # Example
///
/// ```no_run
/// use vermeer_core::VermeerConfig;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = VermeerConfig::load()?;
/// println!("image provider: {}", config.providers.image);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct VermeerConfig {
    /// Backend selection per media kind
    #[serde(default)]
    pub providers: ProviderSelection,
    /// Direct Gemini API settings
    #[serde(default)]
    pub gemini: GeminiConfig,
    /// Vertex AI settings
    #[serde(default)]
    pub vertex: VertexConfig,
    /// External object storage settings
    #[serde(default)]
    pub storage: StorageConfig,
    /// Size/format policy
    #[serde(default)]
    pub policy: MediaPolicy,
    /// Generation parameter overrides
    #[serde(default)]
    pub generation: GenerationConfig,
}

impl VermeerConfig {
    /// Load configuration from a specific file path.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<std::path::Path>) -> VermeerResult<Self> {
        debug!("Loading configuration from file");

        Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()
            .map_err(|e| {
                ConfigError::new(format!(
                    "Failed to read configuration from {}: {}",
                    path.as_ref().display(),
                    e
                ))
            })?
            .try_deserialize()
            .map_err(|e| ConfigError::new(format!("Failed to parse configuration: {}", e)).into())
    }

    /// Load configuration with precedence: current dir > home dir > bundled defaults.
    #[instrument]
    pub fn load() -> VermeerResult<Self> {
        debug!("Loading configuration with precedence: current dir > home dir > bundled defaults");

        const DEFAULT_CONFIG: &str = include_str!("../vermeer.toml");

        let mut builder =
            Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));

        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".config/vermeer/vermeer.toml");
            builder = builder.add_source(File::from(home_config).required(false));
        }

        builder = builder.add_source(File::with_name("vermeer").required(false));

        builder
            .build()
            .map_err(|e| ConfigError::new(format!("Failed to build configuration: {}", e)))?
            .try_deserialize()
            .map_err(|e| ConfigError::new(format!("Failed to parse configuration: {}", e)).into())
    }

    /// Inline threshold for a provider name.
    pub fn inline_limit_bytes(&self, provider: &str) -> u64 {
        match provider {
            "vertex" => self.vertex.inline_limit_bytes,
            _ => self.gemini.inline_limit_bytes,
        }
    }
}
