//! Upload strategy and storage construction.
//!
//! All configuration validation happens here, at startup: a provider whose
//! staging path cannot work never gets built, and the error names every
//! missing field at once.

use crate::gemini_files::GeminiFileStrategy;
use crate::storage_strategy::StorageUploadStrategy;
use crate::strategy::UploadStrategy;
use std::sync::Arc;
use vermeer_core::{StorageBackendKind, VermeerConfig};
use vermeer_error::{ConfigError, VermeerResult};
use vermeer_storage::{GcsConfig, GcsStorage, S3CompatibleStorage, S3Config, StorageProvider};

/// Build the configured storage provider.
///
/// S3 needs bucket plus `STORAGE_ACCESS_KEY`/`STORAGE_SECRET_KEY`; GCS needs
/// only the bucket (HMAC keys are picked up for signed URLs when present).
pub fn build_storage_provider(config: &VermeerConfig) -> VermeerResult<Arc<dyn StorageProvider>> {
    let storage = &config.storage;
    let bucket = storage
        .resolved_bucket()
        .ok_or_else(|| ConfigError::missing_fields("storage", &["storage.bucket"]))?;

    match storage.backend {
        StorageBackendKind::S3 => {
            let mut missing = Vec::new();
            let access_key = storage.access_key();
            let secret_key = storage.secret_key();
            if access_key.is_none() {
                missing.push("STORAGE_ACCESS_KEY");
            }
            if secret_key.is_none() {
                missing.push("STORAGE_SECRET_KEY");
            }
            if !missing.is_empty() {
                return Err(ConfigError::missing_fields("storage", &missing).into());
            }
            // The pushes above guarantee both are present here.
            let provider = S3CompatibleStorage::new(S3Config {
                bucket,
                region: storage
                    .region
                    .clone()
                    .unwrap_or_else(|| "us-east-1".to_string()),
                access_key: access_key.unwrap_or_default(),
                secret_key: secret_key.unwrap_or_default(),
                endpoint: storage.endpoint.clone(),
                path_style: storage.path_style,
                cdn_base_url: storage.cdn_base_url.clone(),
            })?;
            Ok(Arc::new(provider))
        }
        StorageBackendKind::Gcs => {
            let provider = GcsStorage::new(GcsConfig {
                bucket,
                hmac_access_key: storage.access_key(),
                hmac_secret_key: storage.secret_key(),
            })?;
            Ok(Arc::new(provider))
        }
    }
}

/// Everything the Vertex staging path needs, validated in one pass.
pub(crate) struct VertexStagingParts {
    pub storage: Arc<dyn StorageProvider>,
    pub bucket: String,
    pub project_id: String,
}

pub(crate) fn vertex_staging_parts(config: &VermeerConfig) -> VermeerResult<VertexStagingParts> {
    let mut missing = Vec::new();

    let bucket = config.storage.resolved_bucket();
    if bucket.is_none() {
        missing.push("storage.bucket");
    }
    let project_id = config.vertex.resolved_project_id();
    if project_id.is_none() {
        missing.push("vertex.project_id");
    }
    if config.storage.backend == StorageBackendKind::S3 {
        if config.storage.access_key().is_none() {
            missing.push("STORAGE_ACCESS_KEY");
        }
        if config.storage.secret_key().is_none() {
            missing.push("STORAGE_SECRET_KEY");
        }
    }
    if !missing.is_empty() {
        return Err(ConfigError::missing_fields("vertex", &missing).into());
    }

    let storage = build_storage_provider(config)?;
    Ok(VertexStagingParts {
        storage,
        bucket: bucket.unwrap_or_default(),
        project_id: project_id.unwrap_or_default(),
    })
}

/// Build the upload strategy for a provider name.
///
/// `gemini` uses the Files API and needs only the API key; `vertex` has no
/// native file endpoint, so external storage is mandatory. Unknown names are
/// configuration errors.
pub fn build_upload_strategy(
    provider: &str,
    config: &VermeerConfig,
) -> VermeerResult<Arc<dyn UploadStrategy>> {
    match provider {
        "gemini" => {
            let api_key = config.gemini.api_key()?;
            Ok(Arc::new(GeminiFileStrategy::new(
                &config.gemini.base_url,
                api_key,
            )?))
        }
        "vertex" => {
            let parts = vertex_staging_parts(config)?;
            Ok(Arc::new(StorageUploadStrategy::new(
                "vertex",
                parts.bucket,
                parts.storage,
            )))
        }
        other => Err(ConfigError::new(format!(
            "Unknown provider '{other}': expected \"gemini\" or \"vertex\""
        ))
        .into()),
    }
}
