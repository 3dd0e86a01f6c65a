//! Mock XRPC transport for testing
//!
//! Answers the three procedures used by the publisher with plausible PDS
//! responses, records every call for later inspection, and can be told to
//! fail specific calls. Clones share the same call log, so a test can hand
//! one clone to a publisher and inspect the other.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::record::PostRecord;
use super::transport::{XrpcBody, XrpcRequest, XrpcResponse, XrpcTransport};
use super::{PlatformResult, CREATE_RECORD, CREATE_SESSION, POST_COLLECTION, UPLOAD_BLOB};
use crate::error::PlatformError;

/// A scripted reply that replaces the default success response
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Respond with this status and body
    Status(u16, String),
    /// Fail at the transport level
    Network(String),
}

/// A request as the transport saw it
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub nsid: String,
    pub headers: reqwest::header::HeaderMap,
    pub body: XrpcBody,
}

impl RecordedCall {
    pub fn json(&self) -> Option<&serde_json::Value> {
        match &self.body {
            XrpcBody::Json(value) => Some(value),
            XrpcBody::Bytes(_) => None,
        }
    }

    pub fn bytes(&self) -> Option<&[u8]> {
        match &self.body {
            XrpcBody::Bytes(bytes) => Some(bytes),
            XrpcBody::Json(_) => None,
        }
    }

    pub fn header(&self, name: &str) -> Option<String> {
        self.headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    }
}

/// Recording, scriptable transport
#[derive(Debug, Clone)]
pub struct MockTransport {
    did: String,
    handle: String,
    access_jwt: String,
    session_reply: Option<MockReply>,
    upload_reply: Option<MockReply>,
    /// Keyed by the 0-based index of the createRecord call
    record_replies: HashMap<usize, MockReply>,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl Default for MockTransport {
    fn default() -> Self {
        Self {
            did: "did:plc:mockuser".to_string(),
            handle: "mock.bsky.social".to_string(),
            access_jwt: "mock-access-jwt".to_string(),
            session_reply: None,
            upload_reply: None,
            record_replies: HashMap::new(),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl MockTransport {
    /// Transport where every call succeeds
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different access token in createSession responses
    pub fn with_access_jwt(mut self, jwt: &str) -> Self {
        self.access_jwt = jwt.to_string();
        self
    }

    /// Replace the createSession response
    pub fn fail_session(mut self, reply: MockReply) -> Self {
        self.session_reply = Some(reply);
        self
    }

    /// Replace every uploadBlob response
    pub fn fail_upload(mut self, reply: MockReply) -> Self {
        self.upload_reply = Some(reply);
        self
    }

    /// Replace the response of the `index`-th createRecord call (0-based)
    pub fn fail_record_at(mut self, index: usize, reply: MockReply) -> Self {
        self.record_replies.insert(index, reply);
        self
    }

    pub fn did(&self) -> &str {
        &self.did
    }

    /// Every call made so far, in order
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls_for(&self, nsid: &str) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|call| call.nsid == nsid)
            .collect()
    }

    /// Post records sent to createRecord, including ones that were failed
    pub fn created_records(&self) -> Vec<PostRecord> {
        self.calls_for(CREATE_RECORD)
            .iter()
            .filter_map(|call| call.json())
            .filter_map(|body| serde_json::from_value(body["record"].clone()).ok())
            .collect()
    }

    fn scripted(reply: &MockReply) -> PlatformResult<XrpcResponse> {
        match reply {
            MockReply::Status(status, body) => Ok(XrpcResponse::new(*status, body.clone())),
            MockReply::Network(msg) => Err(PlatformError::Network(msg.clone())),
        }
    }

    fn respond(&self, request: &XrpcRequest, record_index: usize) -> PlatformResult<XrpcResponse> {
        match request.nsid {
            CREATE_SESSION => match &self.session_reply {
                Some(reply) => Self::scripted(reply),
                None => Ok(XrpcResponse::new(
                    200,
                    serde_json::json!({
                        "did": self.did,
                        "handle": self.handle,
                        "accessJwt": self.access_jwt,
                        "refreshJwt": "mock-refresh-jwt",
                    })
                    .to_string(),
                )),
            },
            UPLOAD_BLOB => match &self.upload_reply {
                Some(reply) => Self::scripted(reply),
                None => {
                    let mime = request
                        .headers
                        .get(reqwest::header::CONTENT_TYPE)
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("application/octet-stream");
                    let size = match &request.body {
                        XrpcBody::Bytes(bytes) => bytes.len(),
                        XrpcBody::Json(_) => 0,
                    };
                    Ok(XrpcResponse::new(
                        200,
                        serde_json::json!({
                            "blob": {
                                "$type": "blob",
                                "ref": {"$link": format!("bafkreimock{}", uuid::Uuid::new_v4().simple())},
                                "mimeType": mime,
                                "size": size,
                            }
                        })
                        .to_string(),
                    ))
                }
            },
            CREATE_RECORD => match self.record_replies.get(&record_index) {
                Some(reply) => Self::scripted(reply),
                None => Ok(XrpcResponse::new(
                    200,
                    serde_json::json!({
                        "uri": format!("at://{}/{}/mock{}", self.did, POST_COLLECTION, record_index),
                        "cid": format!("bafyreimock{}", record_index),
                    })
                    .to_string(),
                )),
            },
            other => Ok(XrpcResponse::new(
                501,
                format!(r#"{{"error":"MethodNotImplemented","message":"{}"}}"#, other),
            )),
        }
    }
}

#[async_trait]
impl XrpcTransport for MockTransport {
    async fn post(&self, request: XrpcRequest) -> PlatformResult<XrpcResponse> {
        let record_index = {
            let mut calls = self.calls.lock().unwrap();
            let index = calls.iter().filter(|c| c.nsid == CREATE_RECORD).count();
            calls.push(RecordedCall {
                nsid: request.nsid.to_string(),
                headers: request.headers.clone(),
                body: request.body.clone(),
            });
            index
        };

        self.respond(&request, record_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_records_calls_across_clones() {
        let transport = MockTransport::new();
        let clone = transport.clone();

        clone
            .post(XrpcRequest::json(CREATE_RECORD, serde_json::json!({"record": {}})))
            .await
            .unwrap();

        assert_eq!(transport.call_count(), 1);
        assert_eq!(transport.calls_for(CREATE_RECORD).len(), 1);
    }

    #[tokio::test]
    async fn test_mock_record_uris_are_sequential() {
        let transport = MockTransport::new();
        let first = transport
            .post(XrpcRequest::json(CREATE_RECORD, serde_json::json!({})))
            .await
            .unwrap();
        let second = transport
            .post(XrpcRequest::json(CREATE_RECORD, serde_json::json!({})))
            .await
            .unwrap();

        assert!(first.body.contains("mock0"));
        assert!(second.body.contains("mock1"));
    }

    #[tokio::test]
    async fn test_mock_scripted_failures() {
        let transport = MockTransport::new()
            .fail_record_at(1, MockReply::Network("down".to_string()));

        let first = transport
            .post(XrpcRequest::json(CREATE_RECORD, serde_json::json!({})))
            .await;
        let second = transport
            .post(XrpcRequest::json(CREATE_RECORD, serde_json::json!({})))
            .await;

        assert!(first.is_ok());
        assert!(matches!(second, Err(PlatformError::Network(_))));
        // Failed calls are still recorded
        assert_eq!(transport.call_count(), 2);
    }

    #[tokio::test]
    async fn test_mock_unknown_method() {
        let transport = MockTransport::new();
        let response = transport
            .post(XrpcRequest::json("com.atproto.repo.deleteRecord", serde_json::json!({})))
            .await
            .unwrap();
        assert_eq!(response.status, 501);
    }
}
