//! HTTP transport abstraction.
//!
//! [`AdoClient`](super::AdoClient) builds [`ApiRequest`]s and hands them to a
//! [`Transport`]. The production implementation wraps `reqwest`; tests swap in
//! [`mock::MockTransport`] to script responses and inspect what was sent.

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, RETRY_AFTER};
use serde_json::Value;
use std::time::Duration;

use super::auth::Credential;
use crate::error::ApiError;

pub const JSON: &str = "application/json";
pub const TEXT: &str = "text/plain";

const CONTINUATION_HEADER: &str = "x-ms-continuationtoken";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// A fully described outgoing request.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub url: String,
    /// Query pairs in wire order, `api-version` first.
    pub query: Vec<(String, String)>,
    pub accept: &'static str,
    pub body: Option<Value>,
    pub timeout: Duration,
    pub credential: Credential,
}

impl ApiRequest {
    /// Value of a query parameter, for logging and assertions.
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Raw response before status mapping and body decoding.
#[derive(Debug, Clone, Default)]
pub struct ApiResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub continuation_token: Option<String>,
    pub retry_after: Option<u64>,
    pub body: String,
}

impl ApiResponse {
    pub fn json(status: u16, value: &Value) -> Self {
        Self {
            status,
            content_type: Some(format!("{JSON}; charset=utf-8")),
            body: value.to_string(),
            ..Self::default()
        }
    }

    pub fn text(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            content_type: Some(format!("{TEXT}; charset=utf-8")),
            body: body.into(),
            ..Self::default()
        }
    }

    pub fn is_json(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|ct| ct.contains(JSON))
    }
}

/// Sends a request and returns the raw response.
///
/// Implementations must not interpret status codes; retry and error mapping
/// happen in the client.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError>;
}

/// `reqwest`-backed transport.
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("ado-cli/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

fn header_str(headers: &HeaderMap, name: impl reqwest::header::AsHeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError> {
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
        };

        let mut builder = self
            .client
            .request(method, &request.url)
            .query(&request.query)
            .timeout(request.timeout)
            .header(ACCEPT, request.accept)
            .header(AUTHORIZATION, request.credential.header_value());

        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                ApiError::Timeout {
                    url: request.url.clone(),
                }
            } else if e.is_connect() {
                ApiError::Connection {
                    message: e.to_string(),
                }
            } else {
                ApiError::Network(e)
            }
        })?;

        let status = response.status().as_u16();
        let headers = response.headers();
        let content_type = header_str(headers, CONTENT_TYPE);
        let continuation_token = header_str(headers, CONTINUATION_HEADER);
        let retry_after = header_str(headers, RETRY_AFTER).and_then(|v| v.trim().parse().ok());

        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                ApiError::Timeout {
                    url: request.url.clone(),
                }
            } else {
                ApiError::Network(e)
            }
        })?;

        Ok(ApiResponse {
            status,
            content_type,
            continuation_token,
            retry_after,
            body,
        })
    }
}

#[cfg(test)]
pub mod mock {
    //! Scripted transport for tests.

    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays queued responses in order and records every request.
    #[derive(Default)]
    pub struct MockTransport {
        responses: Mutex<VecDeque<Result<ApiResponse, ApiError>>>,
        requests: Mutex<Vec<ApiRequest>>,
    }

    impl MockTransport {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn push(&self, response: Result<ApiResponse, ApiError>) -> &Self {
            self.responses.lock().unwrap().push_back(response);
            self
        }

        pub fn push_json(&self, value: Value) -> &Self {
            self.push(Ok(ApiResponse::json(200, &value)))
        }

        pub fn push_text(&self, body: &str) -> &Self {
            self.push(Ok(ApiResponse::text(200, body)))
        }

        pub fn push_status(&self, status: u16, value: Value) -> &Self {
            self.push(Ok(ApiResponse::json(status, &value)))
        }

        pub fn requests(&self) -> Vec<ApiRequest> {
            self.requests.lock().unwrap().clone()
        }

        pub fn request(&self, index: usize) -> ApiRequest {
            self.requests.lock().unwrap()[index].clone()
        }

        pub fn remaining(&self) -> usize {
            self.responses.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl Transport for MockTransport {
        async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError> {
            self.requests.lock().unwrap().push(request.clone());
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| {
                    Err(ApiError::RequestFailed {
                        status: 599,
                        message: format!("no scripted response for {}", request.url),
                    })
                })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use secrecy::SecretString;
    use serde_json::json;

    fn request(url: String, method: Method, body: Option<Value>) -> ApiRequest {
        ApiRequest {
            method,
            url,
            query: vec![
                ("api-version".to_string(), "7.2-preview".to_string()),
                ("$top".to_string(), "5".to_string()),
            ],
            accept: JSON,
            body,
            timeout: Duration::from_secs(5),
            credential: Credential::Pat(SecretString::from("abc".to_string())),
        }
    }

    /// # HTTP GET Round Trip
    ///
    /// Tests the reqwest transport against a local mock server.
    ///
    /// ## Test Scenario
    /// - Serves a JSON body with a continuation header
    /// - Requires api-version, $top and Basic auth on the request
    ///
    /// ## Expected Outcome
    /// - Status, content type, continuation token and body are captured
    #[tokio::test]
    async fn test_http_get_round_trip() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/contoso/_apis/projects")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("api-version".into(), "7.2-preview".into()),
                Matcher::UrlEncoded("$top".into(), "5".into()),
            ]))
            .match_header("authorization", "Basic OmFiYw==")
            .with_status(200)
            .with_header("content-type", "application/json; charset=utf-8")
            .with_header("x-ms-continuationtoken", "next-page")
            .with_body(r#"{"count":1,"value":[{"name":"Fabrikam"}]}"#)
            .create_async()
            .await;

        let transport = HttpTransport::new().unwrap();
        let response = transport
            .send(&request(
                format!("{}/contoso/_apis/projects", server.url()),
                Method::Get,
                None,
            ))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(response.status, 200);
        assert!(response.is_json());
        assert_eq!(response.continuation_token.as_deref(), Some("next-page"));
        assert!(response.body.contains("Fabrikam"));
    }

    /// # HTTP POST Body And Error Status
    ///
    /// Tests that JSON bodies are sent and error statuses are passed through.
    ///
    /// ## Test Scenario
    /// - Server expects a JSON body and answers 503 with Retry-After
    ///
    /// ## Expected Outcome
    /// - The transport returns the 503 response without failing
    #[tokio::test]
    async fn test_http_post_passes_status_through() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/contoso/_apis/wit/workitemsbatch")
            .match_query(Matcher::Any)
            .match_body(Matcher::Json(json!({"ids": [1, 2]})))
            .with_status(503)
            .with_header("retry-after", "7")
            .with_body("busy")
            .create_async()
            .await;

        let transport = HttpTransport::new().unwrap();
        let response = transport
            .send(&request(
                format!("{}/contoso/_apis/wit/workitemsbatch", server.url()),
                Method::Post,
                Some(json!({"ids": [1, 2]})),
            ))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(response.status, 503);
        assert_eq!(response.retry_after, Some(7));
        assert_eq!(response.body, "busy");
    }

    /// # Connection Failure Mapping
    ///
    /// Tests that refused connections are classified as transient.
    ///
    /// ## Test Scenario
    /// - Sends to a closed local port
    ///
    /// ## Expected Outcome
    /// - The error is transient
    #[tokio::test]
    async fn test_connection_failure_is_transient() {
        let transport = HttpTransport::new().unwrap();
        let err = transport
            .send(&request(
                "http://127.0.0.1:9/contoso/_apis/projects".to_string(),
                Method::Get,
                None,
            ))
            .await
            .unwrap_err();
        assert!(err.is_transient(), "unexpected error: {err:?}");
    }
}
