//! Post record construction and creation

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use super::session::Session;
use super::transport::{XrpcRequest, XrpcTransport};
use super::{map_status_error, Operation, PlatformResult, CREATE_RECORD, POST_COLLECTION};
use crate::types::{BlobRef, RecordRef, ReplyRef};

const IMAGES_EMBED_TYPE: &str = "app.bsky.embed.images";

/// An `app.bsky.feed.post` record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostRecord {
    #[serde(rename = "$type")]
    pub record_type: String,
    pub text: String,
    #[serde(rename = "createdAt")]
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply: Option<ReplyRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embed: Option<ImagesEmbed>,
}

/// `app.bsky.embed.images` with a single image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImagesEmbed {
    #[serde(rename = "$type")]
    pub embed_type: String,
    pub images: Vec<EmbeddedImage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddedImage {
    pub alt: String,
    pub image: BlobRef,
}

impl ImagesEmbed {
    /// Single-image embed; alt text is left empty
    pub fn single(blob: BlobRef) -> Self {
        Self {
            embed_type: IMAGES_EMBED_TYPE.to_string(),
            images: vec![EmbeddedImage {
                alt: String::new(),
                image: blob,
            }],
        }
    }
}

impl PostRecord {
    /// Build a post stamped with the current UTC time
    ///
    /// The reply link is attached verbatim; the caller is responsible for its
    /// root/parent being correct.
    pub fn new(text: impl Into<String>, reply: Option<ReplyRef>, blob: Option<BlobRef>) -> Self {
        Self {
            record_type: POST_COLLECTION.to_string(),
            text: text.into(),
            created_at: timestamp_now(),
            reply,
            embed: blob.map(ImagesEmbed::single),
        }
    }
}

/// Current UTC time as ISO-8601 with millisecond precision and a `Z` suffix
pub fn timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[derive(Deserialize)]
struct CreateRecordOutput {
    uri: String,
    cid: String,
}

/// Create one post in the session's repository
///
/// Fails with `Posting` (status and the first 200 characters of the body) on
/// any non-200 response, or with `Network` when the request never completed.
/// Nothing is retried.
pub async fn create_post(
    transport: &dyn XrpcTransport,
    session: &Session,
    text: &str,
    reply: Option<ReplyRef>,
    blob: Option<BlobRef>,
) -> PlatformResult<RecordRef> {
    let record = PostRecord::new(text, reply, blob);

    let body = serde_json::json!({
        "repo": session.did(),
        "collection": POST_COLLECTION,
        "record": record,
    });

    let request = XrpcRequest::json(CREATE_RECORD, body).with_headers(session.authorized_headers()?);
    let response = transport.post(request).await?;

    if !response.is_ok() {
        return Err(map_status_error(
            Operation::CreateRecord,
            response.status,
            &response.body,
        ));
    }

    let output: CreateRecordOutput = response.json()?;
    tracing::debug!("Created record {}", output.uri);

    Ok(RecordRef::new(output.uri, output.cid))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bluesky::mock::{MockReply, MockTransport};
    use crate::error::PlatformError;
    use secrecy::SecretString;

    fn session() -> Session {
        Session::new(
            "alice.bsky.social",
            "did:plc:alice",
            SecretString::from("jwt-abc".to_string()),
        )
    }

    #[test]
    fn test_timestamp_is_utc_with_z_suffix() {
        let ts = timestamp_now();
        assert!(ts.ends_with('Z'));
        assert!(!ts.contains("+00:00"));
        assert!(chrono::DateTime::parse_from_rfc3339(&ts).is_ok());
    }

    #[test]
    fn test_plain_post_has_no_reply_or_embed() {
        let value = serde_json::to_value(PostRecord::new("hello", None, None)).unwrap();
        assert_eq!(value["$type"], "app.bsky.feed.post");
        assert_eq!(value["text"], "hello");
        assert!(value.get("reply").is_none());
        assert!(value.get("embed").is_none());
    }

    #[test]
    fn test_post_with_blob_embeds_single_image_with_empty_alt() {
        let blob = BlobRef(serde_json::json!({"ref": {"$link": "bafk1"}}));
        let value = serde_json::to_value(PostRecord::new("pic", None, Some(blob))).unwrap();

        assert_eq!(
            value["embed"],
            serde_json::json!({
                "$type": "app.bsky.embed.images",
                "images": [{"alt": "", "image": {"ref": {"$link": "bafk1"}}}]
            })
        );
    }

    #[tokio::test]
    async fn test_create_post_request_shape() {
        let transport = MockTransport::new();
        let root = RecordRef::new("at://did:plc:alice/app.bsky.feed.post/1", "cid1");
        let reply = ReplyRef::new(&root, &root);

        let created = create_post(&transport, &session(), "second", Some(reply.clone()), None)
            .await
            .unwrap();
        assert!(created.uri.starts_with("at://"));

        let calls = transport.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].nsid, CREATE_RECORD);
        assert_eq!(calls[0].header("authorization").as_deref(), Some("Bearer jwt-abc"));

        let body = calls[0].json().unwrap();
        assert_eq!(body["repo"], "did:plc:alice");
        assert_eq!(body["collection"], "app.bsky.feed.post");
        assert_eq!(body["record"]["text"], "second");
        assert_eq!(body["record"]["reply"], serde_json::to_value(&reply).unwrap());
    }

    #[tokio::test]
    async fn test_create_post_server_error() {
        let transport = MockTransport::new().fail_record_at(
            0,
            MockReply::Status(400, r#"{"error":"InvalidRecord","message":"text too long"}"#.to_string()),
        );

        match create_post(&transport, &session(), "x", None, None).await {
            Err(PlatformError::Posting(msg)) => {
                assert!(msg.contains("400"));
                assert!(msg.contains("InvalidRecord"));
            }
            other => panic!("Expected posting error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_create_post_network_error() {
        let transport =
            MockTransport::new().fail_record_at(0, MockReply::Network("reset by peer".to_string()));

        let result = create_post(&transport, &session(), "x", None, None).await;
        assert!(matches!(result, Err(PlatformError::Network(_))));
    }
}
