//! Bluesky thread publishing over the AT Protocol XRPC API
//!
//! The module is layered leaves-first:
//!
//! - [`transport`]: one XRPC procedure call (`POST /xrpc/<nsid>`)
//! - [`session`]: `com.atproto.server.createSession` and authorized headers
//! - [`blob`]: `com.atproto.repo.uploadBlob`
//! - [`record`]: `com.atproto.repo.createRecord` for a single post
//! - [`thread`]: chains posts into a reply thread
//!
//! # Examples
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use libthreadcast::bluesky::{authenticate, ReqwestTransport, ThreadPublisher};
//! use secrecy::SecretString;
//!
//! # async fn example() -> libthreadcast::Result<()> {
//! let transport = Arc::new(ReqwestTransport::new("https://bsky.social", Duration::from_secs(30))?);
//! let password = SecretString::from("xxxx-xxxx-xxxx-xxxx".to_string());
//! let session = authenticate(transport.as_ref(), "alice.bsky.social", &password).await?;
//!
//! let publisher = ThreadPublisher::new(transport, Arc::new(session));
//! let texts = vec!["Hook (1/2)".to_string(), "Payoff (2/2)".to_string()];
//! let result = publisher.publish_thread(&texts, None).await?;
//! println!("{} of {} posts published", result.posts.len(), result.requested);
//! # Ok(())
//! # }
//! ```

use crate::error::PlatformError;

pub mod blob;
pub mod record;
pub mod session;
pub mod thread;
pub mod transport;

// Mock transport is available for all builds (not just tests) to support integration tests
pub mod mock;

pub use blob::upload_blob;
pub use record::{create_post, PostRecord};
pub use session::{authenticate, Session};
pub use thread::{ThreadOutcome, ThreadPublisher, ThreadResult};
pub use transport::{ReqwestTransport, XrpcBody, XrpcRequest, XrpcResponse, XrpcTransport};

pub type PlatformResult<T> = std::result::Result<T, PlatformError>;

/// Default PDS entryway
pub const DEFAULT_SERVICE_URL: &str = "https://bsky.social";

pub const CREATE_SESSION: &str = "com.atproto.server.createSession";
pub const UPLOAD_BLOB: &str = "com.atproto.repo.uploadBlob";
pub const CREATE_RECORD: &str = "com.atproto.repo.createRecord";

/// Record type and collection of a feed post
pub const POST_COLLECTION: &str = "app.bsky.feed.post";

/// Longest response-body excerpt carried in an error
const MAX_DETAIL_CHARS: usize = 200;

/// The XRPC procedure an HTTP status belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    CreateSession,
    UploadBlob,
    CreateRecord,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::CreateSession => write!(f, "authentication"),
            Operation::UploadBlob => write!(f, "blob upload"),
            Operation::CreateRecord => write!(f, "posting"),
        }
    }
}

/// First 200 characters of a response body, on a char boundary
pub fn truncate_detail(body: &str) -> String {
    body.chars().take(MAX_DETAIL_CHARS).collect()
}

/// Map a non-200 XRPC response to a PlatformError
///
/// 401/403 are credential problems and 429 is rate limiting regardless of the
/// operation. Everything else is attributed to the operation that failed.
pub fn map_status_error(operation: Operation, status: u16, body: &str) -> PlatformError {
    let detail = format!("status {} during {}: {}", status, operation, truncate_detail(body));

    match status {
        401 | 403 => PlatformError::Authentication(detail),
        429 => PlatformError::RateLimit(detail),
        _ => match operation {
            Operation::CreateSession => PlatformError::Authentication(detail),
            Operation::UploadBlob => PlatformError::Upload(detail),
            Operation::CreateRecord => PlatformError::Posting(detail),
        },
    }
}
