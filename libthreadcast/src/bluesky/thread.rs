//! Thread chain building
//!
//! Posts are created strictly in order: each reply link needs the reference
//! the server assigned to the previous post. The first failure ends the
//! chain; posts already created stay up (the protocol has no undo here).

use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

use super::blob::upload_blob;
use super::record::create_post;
use super::session::Session;
use super::transport::XrpcTransport;
use super::PlatformResult;
use crate::error::PlatformError;
use crate::types::{BlobRef, ImageUpload, RecordRef, ReplyRef};

/// Pause between successive posts of one thread
pub const DEFAULT_INTER_POST_DELAY: Duration = Duration::from_secs(2);

/// How a thread publication ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadOutcome {
    /// Every requested post was created
    Complete,
    /// Some posts were created before a failure stopped the chain
    Partial,
    /// Not even the first post was created
    Failed,
}

/// Aggregate result of publishing one thread
///
/// `posts` is always a prefix of the requested texts: once a post fails no
/// later post is attempted.
#[derive(Debug, Clone)]
pub struct ThreadResult {
    pub requested: usize,
    pub posts: Vec<RecordRef>,
    /// Whether the first post went out with the uploaded image
    pub image_attached: bool,
    /// The error that stopped the chain, if any
    pub error: Option<PlatformError>,
}

impl ThreadResult {
    pub fn outcome(&self) -> ThreadOutcome {
        if self.posts.len() == self.requested {
            ThreadOutcome::Complete
        } else if self.posts.is_empty() {
            ThreadOutcome::Failed
        } else {
            ThreadOutcome::Partial
        }
    }

    pub fn is_complete(&self) -> bool {
        self.outcome() == ThreadOutcome::Complete
    }

    /// First post of the thread, if it was created
    pub fn root(&self) -> Option<&RecordRef> {
        self.posts.first()
    }
}

/// Publishes threads for one authenticated session
///
/// Cheap to share: the transport and session are reference counted and never
/// mutated, so independent threads can be published concurrently.
#[derive(Clone)]
pub struct ThreadPublisher {
    transport: Arc<dyn XrpcTransport>,
    session: Arc<Session>,
    inter_post_delay: Duration,
}

impl ThreadPublisher {
    pub fn new(transport: Arc<dyn XrpcTransport>, session: Arc<Session>) -> Self {
        Self {
            transport,
            session,
            inter_post_delay: DEFAULT_INTER_POST_DELAY,
        }
    }

    /// Override the pause between posts (zero in tests)
    pub fn with_inter_post_delay(mut self, delay: Duration) -> Self {
        self.inter_post_delay = delay;
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Upload an image for later embedding
    pub async fn upload_image(&self, image: ImageUpload) -> PlatformResult<BlobRef> {
        upload_blob(self.transport.as_ref(), &self.session, image).await
    }

    /// Create a single post
    pub async fn create_post(
        &self,
        text: &str,
        reply: Option<ReplyRef>,
        blob: Option<BlobRef>,
    ) -> PlatformResult<RecordRef> {
        create_post(self.transport.as_ref(), &self.session, text, reply, blob).await
    }

    /// Publish `texts` as a reply chain, with `image` on the first post
    ///
    /// Returns `Err(PlatformError::EmptyThread)` before any network call when
    /// `texts` is empty. Every other failure is reported inside the
    /// [`ThreadResult`]: a failed image upload degrades the first post to
    /// text-only, and a failed post stops the chain.
    pub async fn publish_thread<S>(
        &self,
        texts: &[S],
        image: Option<ImageUpload>,
    ) -> PlatformResult<ThreadResult>
    where
        S: AsRef<str> + Sync,
    {
        if texts.is_empty() {
            return Err(PlatformError::EmptyThread);
        }

        let total = texts.len();
        info!("Posting thread ({} posts)", total);

        let mut blob = match image {
            Some(image) => match self.upload_image(image).await {
                Ok(blob) => Some(blob),
                Err(e) => {
                    warn!("Image upload failed, posting without image: {}", e);
                    None
                }
            },
            None => None,
        };
        let has_blob = blob.is_some();

        let mut result = ThreadResult {
            requested: total,
            posts: Vec::with_capacity(total),
            image_attached: false,
            error: None,
        };

        for (idx, text) in texts.iter().enumerate() {
            let reply = match (result.posts.first(), result.posts.last()) {
                (Some(root), Some(parent)) => Some(ReplyRef::new(root, parent)),
                _ => None,
            };
            // Only the first post carries the image
            let embed = if idx == 0 { blob.take() } else { None };

            match self.create_post(text.as_ref(), reply, embed).await {
                Ok(record) => {
                    info!("Posted {}/{}: {}", idx + 1, total, record.uri);
                    result.posts.push(record);
                    if idx == 0 {
                        result.image_attached = has_blob;
                    }
                }
                Err(e) => {
                    warn!("Post {}/{} failed, stopping thread: {}", idx + 1, total, e);
                    result.error = Some(e);
                    break;
                }
            }

            if idx + 1 < total && !self.inter_post_delay.is_zero() {
                sleep(self.inter_post_delay).await;
            }
        }

        match result.outcome() {
            ThreadOutcome::Complete => info!("Thread posted successfully"),
            ThreadOutcome::Partial => warn!("Partial thread: {}/{}", result.posts.len(), total),
            ThreadOutcome::Failed => warn!("Thread failed: no posts created"),
        }

        Ok(result)
    }
}
