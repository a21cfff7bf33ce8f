//! Object storage providers for Vermeer media staging.
//!
//! This crate provides the pluggable storage layer used when media is too
//! large to inline: an async [`StorageProvider`] trait with an S3-compatible
//! implementation (hand-rolled SigV4 over reqwest) and a GCS JSON-API
//! implementation. Object keys are always synthesized by the provider —
//! callers never choose keys — giving collision-free, date-bucketed layout
//! without a database:
//!
//! ```text
//! images/2026-08-30/1f0c9a2e7b5d4c63.jpg
//! videos/2026-08-30/86a1b2c3d4e5f607.mp4
//! files/2026-08-30/00112233445566aa.pdf
//! ```
//!
//! # Example
//!
//! ```no_run
//! use vermeer_storage::{S3CompatibleStorage, S3Config, StorageProvider};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let storage = S3CompatibleStorage::new(S3Config {
//!     bucket: "media".into(),
//!     region: "us-east-1".into(),
//!     access_key: "AKIA...".into(),
//!     secret_key: "...".into(),
//!     endpoint: None,
//!     path_style: false,
//!     cdn_base_url: None,
//! })?;
//!
//! let stored = storage.upload_file(b"\x89PNG...", "photo.png", "image/png").await?;
//! let bytes = storage.download_file(&stored.key).await?;
//! storage.delete_file(&stored.key).await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod auth;
mod gcs;
mod keys;
mod s3;
mod sign;

pub use gcs::{GcsConfig, GcsStorage};
pub use keys::{canonical_cloud_uri, synthesize_key, type_bucket};
pub use s3::{S3CompatibleStorage, S3Config};

use std::time::Duration;
use vermeer_core::StorageFile;
use vermeer_error::VermeerResult;

/// Trait for pluggable object storage backends.
///
/// Implementations wrap every SDK/transport failure in a typed storage error
/// carrying the originating backend tag. Deleting a nonexistent key is not
/// an error.
#[async_trait::async_trait]
pub trait StorageProvider: Send + Sync {
    /// Short backend tag carried in errors and log lines ("s3", "gcs").
    fn backend(&self) -> &'static str;

    /// Upload bytes under a synthesized key and return the stored object.
    ///
    /// The key is derived from the filename's extension (type bucket), the
    /// current UTC date, and a random id — never from caller input.
    async fn upload_file(
        &self,
        data: &[u8],
        filename: &str,
        mime_type: &str,
    ) -> VermeerResult<StorageFile>;

    /// Download an object's bytes by key.
    async fn download_file(&self, key: &str) -> VermeerResult<Vec<u8>>;

    /// Delete an object by key. Idempotent: a missing key is success.
    async fn delete_file(&self, key: &str) -> VermeerResult<()>;

    /// Stable public URL for an object.
    ///
    /// S3-compatible backends honor the path-style/virtual-host switch and
    /// the CDN override; the GCS backend returns the `gs://` form directly.
    fn public_url(&self, key: &str) -> String;

    /// Time-limited signed URL for an object.
    async fn signed_url(&self, key: &str, expires_in: Duration) -> VermeerResult<String>;

    /// List objects, optionally under a key prefix.
    async fn list_files(&self, prefix: Option<&str>) -> VermeerResult<Vec<StorageFile>>;
}
