//! XRPC transport seam
//!
//! Every PDS call in this crate is an XRPC *procedure*: a POST to
//! `<service>/xrpc/<nsid>`. The transport sends the request and hands back the
//! raw status and body; interpreting the status is left to the caller.

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;
use std::time::Duration;

use super::PlatformResult;
use crate::error::PlatformError;

/// Request body of an XRPC procedure
#[derive(Debug, Clone, PartialEq)]
pub enum XrpcBody {
    /// Serialized with `Content-Type: application/json`
    Json(serde_json::Value),
    /// Sent as-is; the caller sets `Content-Type` in the headers
    Bytes(Vec<u8>),
}

/// One XRPC procedure call
#[derive(Debug, Clone)]
pub struct XrpcRequest {
    pub nsid: &'static str,
    pub headers: HeaderMap,
    pub body: XrpcBody,
}

impl XrpcRequest {
    pub fn json(nsid: &'static str, body: serde_json::Value) -> Self {
        Self {
            nsid,
            headers: HeaderMap::new(),
            body: XrpcBody::Json(body),
        }
    }

    pub fn bytes(nsid: &'static str, bytes: Vec<u8>) -> Self {
        Self {
            nsid,
            headers: HeaderMap::new(),
            body: XrpcBody::Bytes(bytes),
        }
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }
}

/// Raw HTTP outcome of an XRPC call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XrpcResponse {
    pub status: u16,
    pub body: String,
}

impl XrpcResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Only 200 counts as success for the procedures used here
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }

    /// Decode the body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> PlatformResult<T> {
        serde_json::from_str(&self.body).map_err(|e| {
            PlatformError::InvalidResponse(format!(
                "{}: {}",
                e,
                super::truncate_detail(&self.body)
            ))
        })
    }
}

/// Sends XRPC procedure calls to a PDS
///
/// Implementations must return `Ok` for every HTTP response, whatever its
/// status, and reserve `Err(PlatformError::Network)` for transport failures.
#[async_trait]
pub trait XrpcTransport: Send + Sync {
    async fn post(&self, request: XrpcRequest) -> PlatformResult<XrpcResponse>;
}

/// reqwest-backed transport (HTTP direct, no SDK)
pub struct ReqwestTransport {
    http_client: reqwest::Client,
    service_url: String,
}

impl ReqwestTransport {
    /// Create a transport for `service_url` with a per-request timeout
    pub fn new(service_url: impl Into<String>, timeout: Duration) -> PlatformResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PlatformError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            service_url: service_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn service_url(&self) -> &str {
        &self.service_url
    }

    fn endpoint(&self, nsid: &str) -> String {
        format!("{}/xrpc/{}", self.service_url, nsid)
    }
}

#[async_trait]
impl XrpcTransport for ReqwestTransport {
    async fn post(&self, request: XrpcRequest) -> PlatformResult<XrpcResponse> {
        let nsid = request.nsid;
        tracing::debug!("POST {}", nsid);

        let builder = self
            .http_client
            .post(self.endpoint(nsid))
            .headers(request.headers);

        let builder = match request.body {
            XrpcBody::Json(value) => builder.json(&value),
            XrpcBody::Bytes(bytes) => builder.body(bytes),
        };

        let response = builder.send().await.map_err(|e| {
            PlatformError::Network(format!("{} request failed: {}", nsid, e))
        })?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| {
            PlatformError::Network(format!("Failed to read {} response: {}", nsid, e))
        })?;

        tracing::debug!("{} returned status {}", nsid, status);
        Ok(XrpcResponse { status, body })
    }
}
