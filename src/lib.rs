//! # Azure DevOps Query Library
//!
//! A read-only client for the Azure DevOps REST API and the `ado` command
//! line tool built on it. This library provides:
//!
//! - One client covering core, repos, work items, pipelines, wiki, search,
//!   test plans, iterations and Advanced Security alerts
//! - PAT or Azure CLI authentication
//! - Layered configuration (file, git remote, environment, flags)
//! - PR review summaries and bulk file downloads
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ado_cli::{AdoClient, Config};
//! use ado_cli::cli::GlobalArgs;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let args = GlobalArgs {
//!     org: Some("contoso".to_string()),
//!     ..GlobalArgs::default()
//! };
//! let settings = Config::load(&args)?;
//! let client = AdoClient::from_settings(&settings)?;
//!
//! let summary = client.pr_summary("Web", "app", 42).await?;
//! println!("{} files changed", summary.files.edited.len());
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod cli;
pub mod commands;
pub mod config;
pub mod download;
pub mod error;
pub mod git_config;
pub mod logging;
pub mod output;
pub mod parsed_property;
pub mod summary;

// Re-export commonly used types for convenience
pub use api::AdoClient;
pub use cli::Cli;
pub use config::{Config, Settings};
pub use error::{AdoError, ApiError};

/// Core result type used throughout the library
pub type Result<T> = anyhow::Result<T>;

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
