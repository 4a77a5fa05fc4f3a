//! HTTP backend for ServiceNow REST API calls
//!
//! The client talks to the CMDB through the [`HttpBackend`] trait so tests can
//! swap in a fake transport returning canned responses.

use super::error::{CmdbError, CmdbResult};
use crate::config::Credentials;
use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Client;
use serde_json::Value;
use std::fmt;

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

const JSON_MIME: &str = "application/json";

/// Sanitize response body for logging
fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.len() > MAX_LOG_BODY_LENGTH {
        let mut end = MAX_LOG_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... [truncated, {} bytes total]", &body[..end], body.len())
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| !c.is_ascii_graphic() && c != ' ', "")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Put,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Get => write!(f, "GET"),
            Method::Put => write!(f, "PUT"),
        }
    }
}

/// One outbound request
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub url: String,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            body: None,
        }
    }

    pub fn put(url: impl Into<String>, body: Value) -> Self {
        Self {
            method: Method::Put,
            url: url.into(),
            body: Some(body),
        }
    }
}

/// Raw response as received; status codes are interpreted by the client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub reason: Option<String>,
    pub body: String,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            reason: reqwest::StatusCode::from_u16(status)
                .ok()
                .and_then(|s| s.canonical_reason())
                .map(str::to_string),
            body: body.into(),
        }
    }
}

/// Executes HTTP requests against the CMDB
#[async_trait]
pub trait HttpBackend: Send + Sync {
    /// Send one request and return the raw response.
    ///
    /// Only transport failures are errors here; any status code is a valid
    /// response.
    async fn execute(&self, request: ApiRequest) -> CmdbResult<ApiResponse>;
}

/// Production backend over reqwest with basic authentication
#[derive(Clone)]
pub struct ReqwestBackend {
    client: Client,
    credentials: Credentials,
}

impl ReqwestBackend {
    /// Create a new HTTP backend
    pub fn new(credentials: Credentials) -> CmdbResult<Self> {
        let client = Client::builder()
            .user_agent(concat!("cmdbctl/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            credentials,
        })
    }
}

#[async_trait]
impl HttpBackend for ReqwestBackend {
    async fn execute(&self, request: ApiRequest) -> CmdbResult<ApiResponse> {
        tracing::debug!("{} {}", request.method, request.url);

        let builder = match request.method {
            Method::Get => self.client.get(&request.url),
            Method::Put => self.client.put(&request.url),
        };

        let mut builder = builder
            .basic_auth(
                &self.credentials.username,
                Some(&self.credentials.password),
            )
            .header(ACCEPT, JSON_MIME);

        if let Some(body) = &request.body {
            builder = builder.header(CONTENT_TYPE, JSON_MIME).json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if status.is_success() {
            tracing::debug!("Response {}: {}", status, sanitize_for_log(&body));
        } else {
            tracing::error!("API error: {} - {}", status, sanitize_for_log(&body));
        }

        Ok(ApiResponse {
            status: status.as_u16(),
            reason: status.canonical_reason().map(str::to_string),
            body,
        })
    }
}

/// Hint for common failures, shown after fatal errors
pub fn format_cmdb_error(error: &CmdbError) -> Option<&'static str> {
    let hint = match error.status()? {
        401 => "Authentication failed. Check SERVICENOW_USER and SERVICENOW_PASSWORD.",
        403 => "Permission denied. The account lacks access to this table.",
        404 => "Record or table not found. Check the sys_id and SERVICENOW_TABLE.",
        429 => "Rate limit exceeded. Please try again later.",
        500..=599 => "ServiceNow instance temporarily unavailable. Please try again.",
        _ => return None,
    };
    Some(hint)
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// A fake backend that records requests and replays canned responses in order.
    #[derive(Default)]
    pub struct FakeBackend {
        responses: Mutex<VecDeque<CmdbResult<ApiResponse>>>,
        requests: Mutex<Vec<ApiRequest>>,
    }

    impl FakeBackend {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_response(self, status: u16, body: &str) -> Self {
            self.responses
                .lock()
                .unwrap()
                .push_back(Ok(ApiResponse::new(status, body)));
            self
        }

        pub fn with_transport_error(self, message: &str) -> Self {
            self.responses
                .lock()
                .unwrap()
                .push_back(Err(CmdbError::TransportMessage(message.to_string())));
            self
        }

        pub fn requests(&self) -> Vec<ApiRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl HttpBackend for FakeBackend {
        async fn execute(&self, request: ApiRequest) -> CmdbResult<ApiResponse> {
            self.requests.lock().unwrap().push(request);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(CmdbError::TransportMessage("no canned response".into())))
        }
    }
}
