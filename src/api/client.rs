//! Azure DevOps REST client.
//!
//! Builds URLs for the different service hosts, attaches credentials, retries
//! transient failures and decodes responses into `serde_json::Value`. The
//! per-area operations live in sibling modules as further `impl AdoClient`
//! blocks.

use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use super::auth::{AzureCliTokenProvider, StaticCredential, TokenProvider, default_cache_path};
use super::params::QueryParams;
use super::transport::{ApiRequest, ApiResponse, HttpTransport, JSON, Method, TEXT, Transport};
use crate::config::Settings;
use crate::error::ApiError;

/// Status codes that are retried with backoff.
const RETRYABLE_STATUS: [u16; 5] = [429, 500, 502, 503, 504];

/// Request tuning shared by every call.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientOptions {
    pub api_version: String,
    pub timeout: Duration,
    pub search_timeout: Duration,
    pub max_retries: u32,
    pub retry_backoff: Duration,
    pub max_pages: usize,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            api_version: "7.2-preview".to_string(),
            timeout: Duration::from_secs(60),
            search_timeout: Duration::from_secs(120),
            max_retries: 2,
            retry_backoff: Duration::from_secs(2),
            max_pages: 20,
        }
    }
}

/// Service host an endpoint lives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Area {
    #[default]
    Core,
    Search,
    Identity,
    ReleaseManagement,
}

impl Area {
    pub fn host(&self) -> &'static str {
        match self {
            Area::Core => "dev.azure.com",
            Area::Search => "almsearch.dev.azure.com",
            Area::Identity => "vssps.dev.azure.com",
            Area::ReleaseManagement => "vsrm.dev.azure.com",
        }
    }
}

/// Turn an organization name or URL into the base URL.
///
/// `contoso` becomes `https://dev.azure.com/contoso`; `https://` URLs are kept
/// minus trailing slashes.
pub fn normalize_org_url(org: &str) -> Result<String, ApiError> {
    let org = org.trim();
    if org.is_empty() {
        return Err(ApiError::InvalidArgument {
            message: "organization must not be empty".to_string(),
        });
    }
    if org.starts_with("https://") || org.starts_with("http://") {
        Ok(org.trim_end_matches('/').to_string())
    } else {
        Ok(format!("https://dev.azure.com/{}", urlencoding::encode(org)))
    }
}

/// Percent-encode one path segment (`/` included).
pub fn seg(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

/// Strip a leading `refs/heads/` from a branch name.
pub fn short_branch(branch: &str) -> &str {
    branch.strip_prefix("refs/heads/").unwrap_or(branch)
}

/// A relative API path with its scope, host and query.
#[derive(Debug, Clone, PartialEq)]
pub struct Endpoint {
    pub area: Area,
    pub project: Option<String>,
    pub team: Option<String>,
    pub path: String,
    pub params: QueryParams,
}

impl Endpoint {
    /// Organization-level endpoint.
    pub fn org(path: impl Into<String>) -> Self {
        Self {
            area: Area::Core,
            project: None,
            team: None,
            path: path.into(),
            params: QueryParams::new(),
        }
    }

    /// Project-scoped endpoint.
    pub fn project(project: &str, path: impl Into<String>) -> Self {
        Self {
            project: Some(project.to_string()),
            ..Self::org(path)
        }
    }

    /// Endpoint scoped to an optional project.
    pub fn maybe_project(project: Option<&str>, path: impl Into<String>) -> Self {
        match project {
            Some(p) if !p.is_empty() => Self::project(p, path),
            _ => Self::org(path),
        }
    }

    /// Team-scoped endpoint (`{project}/{team}/...`).
    pub fn team(project: &str, team: Option<&str>, path: impl Into<String>) -> Self {
        Self {
            team: team.filter(|t| !t.is_empty()).map(str::to_string),
            ..Self::project(project, path)
        }
    }

    pub fn area(mut self, area: Area) -> Self {
        self.area = area;
        self
    }

    pub fn params(mut self, params: QueryParams) -> Self {
        self.params = params;
        self
    }
}

/// Client for the Azure DevOps REST API.
///
/// # Example
///
/// ```rust,no_run
/// use ado_cli::api::{AdoClient, ClientOptions, HttpTransport, StaticCredential};
/// use secrecy::SecretString;
/// use std::sync::Arc;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let client = AdoClient::new(
///     "contoso",
///     Arc::new(HttpTransport::new()?),
///     Arc::new(StaticCredential::pat(SecretString::from("pat".to_string()))),
///     ClientOptions::default(),
/// )?;
/// let projects = client.list_projects(&Default::default()).await?;
/// println!("{} projects", projects.len());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct AdoClient {
    org_url: String,
    transport: Arc<dyn Transport>,
    auth: Arc<dyn TokenProvider>,
    options: ClientOptions,
}

impl AdoClient {
    pub fn new(
        organization: &str,
        transport: Arc<dyn Transport>,
        auth: Arc<dyn TokenProvider>,
        options: ClientOptions,
    ) -> Result<Self, ApiError> {
        Ok(Self {
            org_url: normalize_org_url(organization)?,
            transport,
            auth,
            options,
        })
    }

    /// Build a client from resolved settings.
    ///
    /// A configured PAT wins; otherwise tokens come from the Azure CLI.
    pub fn from_settings(settings: &Settings) -> Result<Self, ApiError> {
        let auth: Arc<dyn TokenProvider> = match &settings.pat {
            Some(pat) => Arc::new(StaticCredential::pat(pat.clone())),
            None => Arc::new(AzureCliTokenProvider::new(default_cache_path())),
        };
        Self::new(
            &settings.organization,
            Arc::new(HttpTransport::new()?),
            auth,
            settings.client_options(),
        )
    }

    pub fn org_url(&self) -> &str {
        &self.org_url
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Absolute URL of an endpoint, without query.
    pub fn url_for(&self, endpoint: &Endpoint) -> String {
        let base = match endpoint.area {
            Area::Core => self.org_url.clone(),
            area => self.org_url.replace("dev.azure.com", area.host()),
        };

        let mut url = base;
        if let Some(project) = &endpoint.project {
            url.push('/');
            url.push_str(&seg(project));
            if let Some(team) = &endpoint.team {
                url.push('/');
                url.push_str(&seg(team));
            }
        }
        url.push('/');
        url.push_str(endpoint.path.trim_start_matches('/'));
        url
    }

    fn timeout_for(&self, area: Area) -> Duration {
        match area {
            Area::Search => self.options.search_timeout,
            _ => self.options.timeout,
        }
    }

    /// Send with retries and map the final status to an error.
    async fn execute(
        &self,
        method: Method,
        endpoint: &Endpoint,
        body: Option<Value>,
        accept: &'static str,
    ) -> Result<ApiResponse, ApiError> {
        let request = ApiRequest {
            method,
            url: self.url_for(endpoint),
            query: endpoint.params.with_api_version(&self.options.api_version),
            accept,
            body,
            timeout: self.timeout_for(endpoint.area),
            credential: self.auth.credential().await?,
        };

        let attempts = self.options.max_retries + 1;
        let mut attempt = 0u32;
        loop {
            debug!(method = ?request.method, url = %request.url, attempt, "sending request");
            let result = self.transport.send(&request).await;

            let retry_reason = match &result {
                Ok(response) if RETRYABLE_STATUS.contains(&response.status) => {
                    Some(format!("HTTP {}", response.status))
                }
                Err(e) if e.is_transient() => Some(e.to_string()),
                _ => None,
            };

            if let Some(reason) = retry_reason
                && attempt < self.options.max_retries
            {
                let wait = self.options.retry_backoff * 2u32.saturating_pow(attempt);
                warn!(
                    method = ?request.method,
                    url = %request.url,
                    wait_secs = wait.as_secs_f64(),
                    "retrying after {reason} (attempt {}/{attempts})",
                    attempt + 1
                );
                tokio::time::sleep(wait).await;
                attempt += 1;
                continue;
            }

            return check_status(result?, &request.url);
        }
    }

    /// GET an endpoint; JSON bodies are parsed, anything else comes back as a string.
    pub async fn get(&self, endpoint: Endpoint) -> Result<Value, ApiError> {
        let response = self.execute(Method::Get, &endpoint, None, JSON).await?;
        decode_body(&response)
    }

    /// POST a JSON body (search, WIQL and batch reads).
    pub async fn post(&self, endpoint: Endpoint, body: Value) -> Result<Value, ApiError> {
        let response = self
            .execute(Method::Post, &endpoint, Some(body), JSON)
            .await?;
        decode_body(&response)
    }

    /// GET a plain-text resource such as a file or a build log.
    pub async fn get_text(&self, endpoint: Endpoint) -> Result<String, ApiError> {
        let response = self.execute(Method::Get, &endpoint, None, TEXT).await?;
        Ok(response.body)
    }

    /// GET every page of a continuation-token paged list.
    ///
    /// Stops after `max_pages` pages and returns what was collected.
    pub async fn get_all(&self, mut endpoint: Endpoint) -> Result<Vec<Value>, ApiError> {
        let mut items = Vec::new();

        for _ in 0..self.options.max_pages {
            let response = self.execute(Method::Get, &endpoint, None, JSON).await?;
            let header_token = response.continuation_token.clone();

            let mut map = match decode_body(&response)? {
                Value::Object(map) => map,
                Value::Array(values) => {
                    items.extend(values);
                    return Ok(items);
                }
                _ => return Ok(items),
            };

            if let Some(Value::Array(values)) = map.remove("value") {
                items.extend(values);
            }

            let body_token = ["continuationToken", "x-ms-continuationtoken"]
                .iter()
                .find_map(|key| map.get(*key).and_then(Value::as_str).map(str::to_string));

            match header_token.or(body_token).filter(|t| !t.is_empty()) {
                Some(token) => endpoint.params.set("continuationToken", token),
                None => return Ok(items),
            }
        }

        warn!(
            path = %endpoint.path,
            max_pages = self.options.max_pages,
            collected = items.len(),
            "page limit reached, results are truncated"
        );
        Ok(items)
    }
}

fn check_status(response: ApiResponse, url: &str) -> Result<ApiResponse, ApiError> {
    match response.status {
        // A rejected PAT yields a 203 sign-in page rather than a 401.
        203 if response
            .content_type
            .as_deref()
            .is_some_and(|ct| ct.contains("text/html")) =>
        {
            Err(ApiError::Unauthorized)
        }
        200..=299 => Ok(response),
        401 => Err(ApiError::Unauthorized),
        404 => Err(ApiError::NotFound {
            resource: url.to_string(),
        }),
        429 => Err(ApiError::RateLimited {
            retry_after_seconds: response.retry_after.unwrap_or_default(),
        }),
        status => Err(ApiError::RequestFailed {
            status,
            message: error_message(&response.body),
        }),
    }
}

/// Service error text: the `message` field of a JSON error body, else the raw body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| body.chars().take(500).collect())
}

fn decode_body(response: &ApiResponse) -> Result<Value, ApiError> {
    if response.is_json() {
        if response.body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&response.body).map_err(|e| ApiError::ParseError {
            message: e.to_string(),
        })
    } else {
        Ok(Value::String(response.body.clone()))
    }
}

/// Return the list under `key` of an object body.
///
/// Objects without the key yield an empty list; non-object bodies are
/// returned unchanged.
pub fn unwrap_list(data: Value, key: &str) -> Value {
    match data {
        Value::Object(mut map) => map.remove(key).unwrap_or_else(|| Value::Array(Vec::new())),
        other => other,
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::api::transport::mock::MockTransport;
    use secrecy::SecretString;

    /// Client wired to a mock transport with zero backoff.
    pub fn mock_client(org: &str) -> (AdoClient, Arc<MockTransport>) {
        let transport = Arc::new(MockTransport::new());
        let client = AdoClient::new(
            org,
            transport.clone(),
            Arc::new(StaticCredential::pat(SecretString::from("pat".to_string()))),
            ClientOptions {
                retry_backoff: Duration::ZERO,
                ..ClientOptions::default()
            },
        )
        .unwrap();
        (client, transport)
    }
}
