//! Azure DevOps REST API client.
//!
//! [`AdoClient`] owns URL building, authentication, retries and pagination.
//! Every service area adds its read operations as an `impl AdoClient` block
//! in its own module, returning the service JSON as `serde_json::Value`.
//!
//! ## Example
//!
//! ```rust,no_run
//! use ado_cli::api::{AdoClient, ClientOptions, HttpTransport, StaticCredential};
//! use ado_cli::api::repos::PullRequestQuery;
//! use secrecy::SecretString;
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let client = AdoClient::new(
//!     "contoso",
//!     Arc::new(HttpTransport::new()?),
//!     Arc::new(StaticCredential::pat(SecretString::from("my-pat".to_string()))),
//!     ClientOptions::default(),
//! )?;
//!
//! let query = PullRequestQuery {
//!     status: Some("active".to_string()),
//!     ..Default::default()
//! };
//! let prs = client.list_pull_requests("Web", Some("app"), &query).await?;
//! println!("Found {} pull requests", prs.len());
//! # Ok(())
//! # }
//! ```

mod auth;
mod client;
mod params;
mod transport;

pub mod core;
pub mod pipelines;
pub mod repos;
pub mod search;
pub mod security;
pub mod test_plans;
pub mod wiki;
pub mod work;
pub mod work_items;

pub use auth::{
    ADO_RESOURCE, AzureCliTokenProvider, Credential, StaticCredential, TokenProvider,
    default_cache_path,
};
pub use client::{
    AdoClient, Area, ClientOptions, Endpoint, normalize_org_url, seg, short_branch, unwrap_list,
};
pub use params::QueryParams;
pub use transport::{ApiRequest, ApiResponse, HttpTransport, Method, Transport};

#[cfg(test)]
pub(crate) use client::test_support;
