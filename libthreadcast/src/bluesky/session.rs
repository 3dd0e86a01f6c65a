//! Session creation and authorized headers

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::transport::{XrpcRequest, XrpcTransport};
use super::{map_status_error, Operation, PlatformResult, CREATE_SESSION};
use crate::error::PlatformError;

/// An authenticated PDS session
///
/// Created once by [`authenticate`] and shared read-only (usually behind an
/// `Arc`) by every publisher. There is no refresh: when the access token
/// expires, requests fail with an authentication error.
#[derive(Debug)]
pub struct Session {
    handle: String,
    did: String,
    access_jwt: SecretString,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateSessionOutput {
    did: String,
    access_jwt: String,
}

impl Session {
    /// Build a session from known credentials (tests, resumed sessions)
    pub fn new(handle: impl Into<String>, did: impl Into<String>, access_jwt: SecretString) -> Self {
        Self {
            handle: handle.into(),
            did: did.into(),
            access_jwt,
        }
    }

    /// Account handle, e.g. `alice.bsky.social`
    pub fn handle(&self) -> &str {
        &self.handle
    }

    /// Decentralized identifier of the account; the repo posts are written to
    pub fn did(&self) -> &str {
        &self.did
    }

    /// Headers carrying the bearer token
    ///
    /// Built from the current token on every call; callers must not keep the
    /// returned map around for later requests.
    pub fn authorized_headers(&self) -> PlatformResult<HeaderMap> {
        let mut value = HeaderValue::from_str(&format!(
            "Bearer {}",
            self.access_jwt.expose_secret()
        ))
        .map_err(|_| {
            PlatformError::Authentication("Access token is not a valid header value".to_string())
        })?;
        value.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, value);
        Ok(headers)
    }
}

/// Create a session with the PDS
///
/// Sends `{identifier, password}` to `com.atproto.server.createSession`. Any
/// non-200 response or transport failure is an authentication error; there
/// is no retry. The session keeps `identifier` as its handle, whatever handle
/// the server reports.
pub async fn authenticate(
    transport: &dyn XrpcTransport,
    identifier: &str,
    password: &SecretString,
) -> PlatformResult<Session> {
    tracing::debug!("Creating Bluesky session for {}", identifier);

    let request = XrpcRequest::json(
        CREATE_SESSION,
        serde_json::json!({
            "identifier": identifier,
            "password": password.expose_secret(),
        }),
    );

    let response = transport.post(request).await.map_err(|e| {
        PlatformError::Authentication(format!("Could not reach the PDS: {}", e))
    })?;

    if !response.is_ok() {
        return Err(match map_status_error(Operation::CreateSession, response.status, &response.body) {
            PlatformError::RateLimit(detail) => PlatformError::Authentication(detail),
            other => other,
        });
    }

    let output: CreateSessionOutput = response
        .json()
        .map_err(|e| PlatformError::Authentication(e.to_string()))?;

    tracing::info!("Authenticated as {} ({})", identifier, output.did);

    Ok(Session {
        handle: identifier.to_string(),
        did: output.did,
        access_jwt: SecretString::from(output.access_jwt),
    })
}
