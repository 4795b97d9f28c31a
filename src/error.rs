//! Unified error handling for ado-cli.
//!
//! This module provides the error hierarchy using `thiserror` so callers can
//! match on failure kinds while the binary still prints a readable message.
//!
//! ## Error Categories
//!
//! - [`ApiError`]: a REST call failed or returned an error status
//! - [`AuthError`]: no bearer token could be obtained or cached
//! - [`ConfigError`]: bad or missing settings
//!
//! ## Example
//!
//! ```rust,no_run
//! use ado_cli::error::{AdoError, ApiError};
//!
//! fn example() -> Result<(), AdoError> {
//!     Err(ApiError::Unauthorized)?;
//!     Ok(())
//! }
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for the ado-cli library.
#[derive(Error, Debug)]
pub enum AdoError {
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A local I/O failure, typically while writing output.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

/// Failure of a single Azure DevOps request.
#[derive(Error, Debug)]
pub enum ApiError {
    /// 401, or a 203 sign-in page.
    #[error("Unauthorized: invalid or expired credentials")]
    Unauthorized,

    /// 404.
    #[error("Resource not found: {resource}")]
    NotFound {
        resource: String,
    },

    /// 429 after the last retry.
    #[error("Rate limit exceeded, retry after {retry_after_seconds} seconds")]
    RateLimited {
        retry_after_seconds: u64,
    },

    /// Any other non-success status; `message` is the service's error text.
    #[error("API request failed with status {status}: {message}")]
    RequestFailed {
        status: u16,
        message: String,
    },

    /// The body was not the JSON the call expects.
    #[error("Failed to parse API response: {message}")]
    ParseError {
        message: String,
    },

    /// The request did not complete within the configured timeout.
    #[error("Request timed out: {url}")]
    Timeout {
        url: String,
    },

    /// The connection to the service could not be established.
    #[error("Connection failed: {message}")]
    Connection {
        message: String,
    },

    /// Any other transport failure.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The pull request has no merge commits to diff against.
    #[error("Pull request {pr_id} has no source/target merge commits")]
    NoMergeCommit {
        pr_id: u32,
    },

    /// No credential could be attached to the request.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// A caller-supplied argument cannot be turned into a request.
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        message: String,
    },
}

impl ApiError {
    /// Returns `true` for transport failures worth another attempt.
    pub fn is_transient(&self) -> bool {
        matches!(self, ApiError::Timeout { .. } | ApiError::Connection { .. })
    }
}

/// Errors that can occur while acquiring an Azure AD token.
#[derive(Error, Debug)]
pub enum AuthError {
    /// The Azure CLI could not be run or returned a failure.
    #[error("Azure CLI token request failed: {message}")]
    CommandFailed {
        message: String,
    },

    /// The Azure CLI printed something that is not a token response.
    #[error("Invalid token response: {message}")]
    InvalidTokenResponse {
        message: String,
    },

    /// The on-disk token cache could not be read or written.
    #[error("Token cache error at {path}: {message}")]
    CacheIo {
        path: PathBuf,
        message: String,
    },

    /// No credential source produced a token.
    #[error("Unable to authenticate with Azure DevOps. Run `az login` to sign in.")]
    Unavailable,
}

/// Settings that cannot be loaded or resolved.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{field} is required (use --{field}, {env_var} env var, or config file)")]
    MissingRequired {
        field: String,
        env_var: String,
    },

    #[error("Failed to read config file at {path}: {message}")]
    FileReadError {
        path: PathBuf,
        message: String,
    },

    #[error("Failed to parse config file at {path}: {message}")]
    ParseError {
        path: PathBuf,
        message: String,
    },

    #[error("Invalid value for {field}: {message}")]
    InvalidValue {
        field: String,
        message: String,
    },

    #[error("Failed to create config directory at {path}: {message}")]
    DirectoryCreationError {
        path: PathBuf,
        message: String,
    },
}

/// Type alias for Results using AdoError.
///
/// Not re-exported from the crate root to avoid shadowing `anyhow::Result`.
pub type AdoResult<T> = std::result::Result<T, AdoError>;

#[cfg(test)]
mod tests {
    use super::*;

    /// # API Error Display
    ///
    /// Tests the messages users see for API failures.
    ///
    /// ## Test Scenario
    /// - Formats not-found, rate-limit, request and merge-commit errors
    ///
    /// ## Expected Outcome
    /// - Each message carries the resource, wait, status or PR id
    #[test]
    fn test_api_error_display() {
        let not_found = ApiError::NotFound {
            resource: "_apis/git/repositories/app".to_string(),
        };
        assert!(not_found.to_string().contains("repositories/app"));

        let rate_limited = ApiError::RateLimited {
            retry_after_seconds: 30,
        };
        assert!(rate_limited.to_string().contains("30 seconds"));

        let failed = ApiError::RequestFailed {
            status: 400,
            message: "TF400813: bad request".to_string(),
        };
        assert!(failed.to_string().contains("400"));
        assert!(failed.to_string().contains("TF400813"));

        let no_merge = ApiError::NoMergeCommit { pr_id: 42 };
        assert!(no_merge.to_string().contains("42"));
    }

    /// # Transient Classification
    ///
    /// Tests which API errors are considered transient.
    ///
    /// ## Test Scenario
    /// - Classifies timeout, connection and HTTP failures
    ///
    /// ## Expected Outcome
    /// - Only timeout and connection failures are transient
    #[test]
    fn test_is_transient() {
        assert!(
            ApiError::Timeout {
                url: "https://dev.azure.com/org".to_string()
            }
            .is_transient()
        );
        assert!(
            ApiError::Connection {
                message: "reset".to_string()
            }
            .is_transient()
        );
        assert!(!ApiError::Unauthorized.is_transient());
        assert!(
            !ApiError::RequestFailed {
                status: 503,
                message: String::new()
            }
            .is_transient()
        );
    }

    /// # Config Error Display
    ///
    /// Tests that missing-field errors point at every way to supply the value.
    ///
    /// ## Test Scenario
    /// - Formats a MissingRequired error
    ///
    /// ## Expected Outcome
    /// - Message names the flag and the environment variable
    #[test]
    fn test_config_error_display() {
        let missing = ConfigError::MissingRequired {
            field: "org".to_string(),
            env_var: "ADO_ORG".to_string(),
        };
        let msg = missing.to_string();
        assert!(msg.contains("--org"));
        assert!(msg.contains("ADO_ORG"));
    }

    /// # Error Conversion
    ///
    /// Tests `?` conversions into the umbrella error.
    ///
    /// ## Test Scenario
    /// - Converts API, auth and config errors
    ///
    /// ## Expected Outcome
    /// - Each converts into the matching variant
    #[test]
    fn test_error_conversion() {
        let err: AdoError = ApiError::Unauthorized.into();
        assert!(matches!(err, AdoError::Api(_)));

        let err: AdoError = AuthError::Unavailable.into();
        assert!(matches!(err, AdoError::Auth(_)));
        assert!(err.to_string().contains("az login"));

        let err: AdoError = ConfigError::InvalidValue {
            field: "max_pages".to_string(),
            message: "must be positive".to_string(),
        }
        .into();
        assert!(matches!(err, AdoError::Config(_)));
    }
}
