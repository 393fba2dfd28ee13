//! Transport layer between the client and the Currencycloud API.
//!
//! The client never talks to the network directly: every call is expressed
//! as an [`ApiRequest`] and handed to a [`Transport`]. [`HttpTransport`] sends
//! it over HTTPS, [`RecordedTransport`] answers from recorded interactions or
//! records the exchanges of another transport.

mod http;
mod recorded;

pub use http::HttpTransport;
pub use recorded::{Interaction, RecordedTransport};

use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;
use currencycloud_common::{RemoteFailure, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

/// HTTP method of an API call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Get => write!(f, "GET"),
            Method::Post => write!(f, "POST"),
        }
    }
}

/// A single call against the API.
///
/// Parameters use the API's snake_case names. GET parameters travel in the
/// query string, POST parameters in a form-encoded body.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub params: BTreeMap<String, String>,
    /// Sent as `X-Auth-Token` when present.
    pub auth_token: Option<String>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            params: BTreeMap::new(),
            auth_token: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    /// Add a parameter.
    pub fn param(mut self, name: &str, value: impl ToString) -> Self {
        self.params.insert(name.to_string(), value.to_string());
        self
    }

    /// Add a parameter only when a value is present.
    pub fn optional_param<V: ToString>(self, name: &str, value: Option<V>) -> Self {
        match value {
            Some(value) => self.param(name, value),
            None => self,
        }
    }

    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    /// Request line used in logs and errors, e.g. `GET /v2/rates/find`.
    pub fn request_line(&self) -> String {
        format!("{} {}", self.method, self.path)
    }
}

impl fmt::Debug for ApiRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params: BTreeMap<&str, &str> = self
            .params
            .iter()
            .map(|(k, v)| {
                let v = if k == "api_key" { "<redacted>" } else { v.as_str() };
                (k.as_str(), v)
            })
            .collect();

        f.debug_struct("ApiRequest")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("params", &params)
            .field("authenticated", &self.auth_token.is_some())
            .finish()
    }
}

/// HTTP status and decoded body of an API answer, whatever the status.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status: u16,
    /// `Value::Null` when the body was empty or, on an error status, not JSON.
    pub body: Value,
}

impl Response {
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }
}

/// Sends API requests and returns the decoded JSON body.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Transport name, used in logs.
    fn name(&self) -> &str;

    /// Perform the request and return the answer as received.
    ///
    /// Only failures to obtain an answer are errors here.
    async fn exchange(&self, request: &ApiRequest) -> Result<Response>;

    /// Perform the request. Non-2xx answers become [`RemoteFailure`]s.
    async fn send(&self, request: &ApiRequest) -> Result<Value> {
        let response = self.exchange(request).await?;
        into_result(response.status, request, response.body)
    }
}

/// Map an HTTP status and body to the transport result.
pub(crate) fn into_result(status: u16, request: &ApiRequest, body: Value) -> Result<Value> {
    if (200..300).contains(&status) {
        return Ok(body);
    }

    let failure = RemoteFailure::from_response(status, request.request_line(), &body);
    warn!(
        request = %failure.request,
        status = failure.status,
        error_code = %failure.code,
        "API request failed"
    );
    Err(failure.into())
}
