//! Credentials for Azure DevOps requests.
//!
//! A Personal Access Token is used as-is when configured. Otherwise an Azure AD
//! token is obtained from the Azure CLI and cached in memory and on disk until
//! shortly before it expires.

use async_trait::async_trait;
use chrono::{Local, NaiveDateTime, TimeZone, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use crate::error::AuthError;

/// Azure DevOps application id used as the token resource.
pub const ADO_RESOURCE: &str = "499b84ac-1321-427f-aa17-267ca6975798";

/// Tokens closer than this to expiry are treated as expired.
const EXPIRY_BUFFER_SECS: i64 = 300;

/// A credential attached to a single request.
#[derive(Clone)]
pub enum Credential {
    /// Personal Access Token, sent as HTTP Basic with an empty user name.
    Pat(SecretString),
    /// Azure AD access token, sent as a bearer token.
    Bearer(SecretString),
}

impl Credential {
    /// Value of the `Authorization` header.
    pub fn header_value(&self) -> String {
        use base64::Engine;
        match self {
            Credential::Pat(pat) => {
                let encoded = base64::engine::general_purpose::STANDARD
                    .encode(format!(":{}", pat.expose_secret()));
                format!("Basic {encoded}")
            }
            Credential::Bearer(token) => format!("Bearer {}", token.expose_secret()),
        }
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self {
            Credential::Pat(_) => "Pat",
            Credential::Bearer(_) => "Bearer",
        };
        f.debug_tuple(kind).field(&"[REDACTED]").finish()
    }
}

/// Source of request credentials.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn credential(&self) -> Result<Credential, AuthError>;
}

/// Provider that always hands out the same credential.
#[derive(Debug, Clone)]
pub struct StaticCredential {
    credential: Credential,
}

impl StaticCredential {
    pub fn pat(pat: SecretString) -> Self {
        Self {
            credential: Credential::Pat(pat),
        }
    }

    pub fn bearer(token: SecretString) -> Self {
        Self {
            credential: Credential::Bearer(token),
        }
    }
}

#[async_trait]
impl TokenProvider for StaticCredential {
    async fn credential(&self) -> Result<Credential, AuthError> {
        Ok(self.credential.clone())
    }
}

/// Token as stored in the cache file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct CachedToken {
    token: String,
    /// Expiry as Unix epoch seconds.
    expires_on: i64,
}

impl CachedToken {
    fn is_fresh(&self, now: i64) -> bool {
        self.expires_on - now > EXPIRY_BUFFER_SECS
    }
}

/// `az account get-access-token --output json` response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AzCliToken {
    access_token: String,
    #[serde(rename = "expires_on", default)]
    expires_on_epoch: Option<i64>,
    #[serde(default)]
    expires_on: Option<String>,
}

impl AzCliToken {
    fn into_cached(self) -> Result<CachedToken, AuthError> {
        let expires_on = match (self.expires_on_epoch, self.expires_on.as_deref()) {
            (Some(epoch), _) => epoch,
            (None, Some(local)) => parse_local_expiry(local)?,
            (None, None) => {
                return Err(AuthError::InvalidTokenResponse {
                    message: "token response has no expiry".to_string(),
                });
            }
        };
        Ok(CachedToken {
            token: self.access_token,
            expires_on,
        })
    }
}

/// Parse the Azure CLI `expiresOn` value, a local time without offset.
fn parse_local_expiry(value: &str) -> Result<i64, AuthError> {
    let naive = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f").map_err(|e| {
        AuthError::InvalidTokenResponse {
            message: format!("unrecognised expiresOn '{value}': {e}"),
        }
    })?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.timestamp())
        .ok_or_else(|| AuthError::InvalidTokenResponse {
            message: format!("expiresOn '{value}' does not exist in the local time zone"),
        })
}

/// Default cache file: `$ADO_CLI_CACHE_DIR/token_cache.json`, else the
/// platform cache directory.
pub fn default_cache_path() -> Option<PathBuf> {
    match std::env::var("ADO_CLI_CACHE_DIR") {
        Ok(dir) if !dir.is_empty() => Some(PathBuf::from(dir).join("token_cache.json")),
        _ => dirs::cache_dir().map(|d| d.join("ado-cli").join("token_cache.json")),
    }
}

fn read_cache(path: &Path) -> Option<CachedToken> {
    let content = std::fs::read_to_string(path).ok()?;
    match serde_json::from_str(&content) {
        Ok(token) => Some(token),
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "ignoring unreadable token cache");
            None
        }
    }
}

fn write_cache(path: &Path, token: &CachedToken) -> Result<(), AuthError> {
    let cache_err = |e: std::io::Error| AuthError::CacheIo {
        path: path.to_path_buf(),
        message: e.to_string(),
    };

    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(cache_err)?;
    }
    let body = serde_json::to_string(token).map_err(|e| AuthError::CacheIo {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    std::fs::write(path, body).map_err(cache_err)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
            .map_err(cache_err)?;
    }

    Ok(())
}

/// Obtains bearer tokens from `az account get-access-token`.
pub struct AzureCliTokenProvider {
    program: String,
    cache_path: Option<PathBuf>,
    memory: Mutex<Option<CachedToken>>,
}

impl AzureCliTokenProvider {
    pub fn new(cache_path: Option<PathBuf>) -> Self {
        let program = if cfg!(windows) { "az.cmd" } else { "az" };
        Self {
            program: program.to_string(),
            cache_path,
            memory: Mutex::new(None),
        }
    }

    /// Use a different executable instead of `az`.
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    async fn fetch_from_cli(&self) -> Result<CachedToken, AuthError> {
        let output = tokio::process::Command::new(&self.program)
            .args([
                "account",
                "get-access-token",
                "--resource",
                ADO_RESOURCE,
                "--output",
                "json",
            ])
            .output()
            .await
            .map_err(|e| AuthError::CommandFailed {
                message: format!("could not run {}: {e}", self.program),
            })?;

        if !output.status.success() {
            return Err(AuthError::CommandFailed {
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let parsed: AzCliToken =
            serde_json::from_slice(&output.stdout).map_err(|e| AuthError::InvalidTokenResponse {
                message: e.to_string(),
            })?;
        parsed.into_cached()
    }

    async fn token(&self) -> Result<CachedToken, AuthError> {
        let now = Utc::now().timestamp();
        let mut memory = self.memory.lock().await;

        if let Some(token) = memory.as_ref().filter(|t| t.is_fresh(now)) {
            return Ok(token.clone());
        }

        if let Some(path) = &self.cache_path
            && let Some(token) = read_cache(path).filter(|t| t.is_fresh(now))
        {
            tracing::debug!(path = %path.display(), "using cached Azure AD token");
            *memory = Some(token.clone());
            return Ok(token);
        }

        let token = match self.fetch_from_cli().await {
            Ok(token) => token,
            Err(e) => {
                tracing::debug!(error = %e, "Azure CLI token acquisition failed");
                return Err(AuthError::Unavailable);
            }
        };

        if let Some(path) = &self.cache_path
            && let Err(e) = write_cache(path, &token)
        {
            tracing::debug!(error = %e, "failed to persist token cache");
        }
        *memory = Some(token.clone());
        Ok(token)
    }
}

#[async_trait]
impl TokenProvider for AzureCliTokenProvider {
    async fn credential(&self) -> Result<Credential, AuthError> {
        let token = self.token().await?;
        Ok(Credential::Bearer(SecretString::from(token.token)))
    }
}
