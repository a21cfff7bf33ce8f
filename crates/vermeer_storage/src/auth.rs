//! GCP OAuth bearer tokens.
//!
//! Tokens come from the `GOOGLE_OAUTH_ACCESS_TOKEN` environment variable
//! when set (local development, CI) and otherwise from the GCE metadata
//! server (any GCP runtime with an attached service account). Metadata
//! tokens are cached until shortly before expiry.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use vermeer_error::{StorageError, StorageErrorKind, VermeerResult};

const METADATA_TOKEN_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";

/// Environment variable holding an explicit OAuth access token.
pub const TOKEN_ENV: &str = "GOOGLE_OAUTH_ACCESS_TOKEN";

struct CachedToken {
    token: String,
    expires_at: DateTime<Utc>,
}

/// Cached source of GCP OAuth bearer tokens.
pub struct OauthTokenSource {
    backend: &'static str,
    cached: tokio::sync::Mutex<Option<CachedToken>>,
}

impl OauthTokenSource {
    /// Create a token source; `backend` tags any credential errors.
    pub fn new(backend: &'static str) -> Self {
        Self {
            backend,
            cached: tokio::sync::Mutex::new(None),
        }
    }

    /// Current bearer token: explicit env token, cached metadata token, or a
    /// fresh one from the metadata server.
    pub async fn bearer_token(&self, client: &reqwest::Client) -> VermeerResult<String> {
        if let Ok(token) = std::env::var(TOKEN_ENV) {
            if !token.is_empty() {
                return Ok(token);
            }
        }

        let mut cached = self.cached.lock().await;
        if let Some(entry) = cached.as_ref() {
            if entry.expires_at > Utc::now() + chrono::Duration::seconds(30) {
                return Ok(entry.token.clone());
            }
        }

        #[derive(Deserialize)]
        struct TokenResponse {
            access_token: String,
            expires_in: i64,
        }

        let response = client
            .get(METADATA_TOKEN_URL)
            .header("Metadata-Flavor", "Google")
            .send()
            .await
            .map_err(|e| {
                StorageError::new(
                    self.backend,
                    StorageErrorKind::Credentials(format!(
                        "metadata server unreachable (set {TOKEN_ENV} outside GCP): {e}"
                    )),
                )
            })?;
        if !response.status().is_success() {
            return Err(StorageError::new(
                self.backend,
                StorageErrorKind::Credentials(format!(
                    "metadata server returned {}",
                    response.status()
                )),
            )
            .into());
        }
        let token: TokenResponse = response.json().await.map_err(|e| {
            StorageError::new(self.backend, StorageErrorKind::Credentials(e.to_string()))
        })?;

        let entry = CachedToken {
            token: token.access_token.clone(),
            expires_at: Utc::now() + chrono::Duration::seconds(token.expires_in),
        };
        *cached = Some(entry);
        Ok(token.access_token)
    }
}
