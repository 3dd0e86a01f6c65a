//! Blob upload

use reqwest::header::{HeaderValue, CONTENT_TYPE};
use serde::Deserialize;

use super::session::Session;
use super::transport::{XrpcRequest, XrpcTransport};
use super::{map_status_error, Operation, PlatformResult, UPLOAD_BLOB};
use crate::error::PlatformError;
use crate::types::{BlobRef, ImageUpload};

#[derive(Deserialize)]
struct UploadBlobOutput {
    blob: Option<serde_json::Value>,
}

/// Upload raw image bytes and return the server's blob descriptor
///
/// The descriptor is returned verbatim. Every failure (HTTP status, transport,
/// malformed response) is reported as [`PlatformError::Upload`] so callers can
/// treat it as non-fatal.
pub async fn upload_blob(
    transport: &dyn XrpcTransport,
    session: &Session,
    image: ImageUpload,
) -> PlatformResult<BlobRef> {
    let size = image.bytes.len();
    tracing::debug!("Uploading {} byte blob ({})", size, image.mime_type);

    let mut headers = session
        .authorized_headers()
        .map_err(|e| PlatformError::Upload(e.to_string()))?;
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(image.mime_type.as_str()));

    let request = XrpcRequest::bytes(UPLOAD_BLOB, image.bytes).with_headers(headers);

    let response = transport
        .post(request)
        .await
        .map_err(|e| PlatformError::Upload(e.to_string()))?;

    if !response.is_ok() {
        return Err(PlatformError::Upload(
            map_status_error(Operation::UploadBlob, response.status, &response.body).to_string(),
        ));
    }

    let output: UploadBlobOutput = response
        .json()
        .map_err(|e| PlatformError::Upload(e.to_string()))?;

    let blob = output
        .blob
        .ok_or_else(|| PlatformError::Upload("Response has no blob descriptor".to_string()))?;

    tracing::info!("Image uploaded ({} bytes)", size);
    Ok(BlobRef(blob))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bluesky::mock::{MockReply, MockTransport};
    use crate::types::ImageMimeType;
    use secrecy::SecretString;

    fn session() -> Session {
        Session::new(
            "alice.bsky.social",
            "did:plc:alice",
            SecretString::from("jwt-abc".to_string()),
        )
    }

    #[tokio::test]
    async fn test_upload_sends_bytes_with_mime_and_auth() {
        let transport = MockTransport::new();
        let image = ImageUpload::new(vec![0x89, 0x50, 0x4e, 0x47], ImageMimeType::Png);

        let blob = upload_blob(&transport, &session(), image).await.unwrap();

        let calls = transport.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].nsid, UPLOAD_BLOB);
        assert_eq!(calls[0].header("content-type").as_deref(), Some("image/png"));
        assert_eq!(calls[0].header("authorization").as_deref(), Some("Bearer jwt-abc"));
        assert_eq!(calls[0].bytes(), Some(&[0x89, 0x50, 0x4e, 0x47][..]));

        assert_eq!(blob.0["mimeType"], "image/png");
        assert_eq!(blob.0["size"], 4);
    }

    #[tokio::test]
    async fn test_upload_failure_status_is_upload_error() {
        let transport = MockTransport::new()
            .fail_upload(MockReply::Status(413, "BlobTooLarge".to_string()));
        let image = ImageUpload::new(vec![1; 16], ImageMimeType::Jpeg);

        match upload_blob(&transport, &session(), image).await {
            Err(PlatformError::Upload(msg)) => assert!(msg.contains("413")),
            other => panic!("Expected upload error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_upload_unauthorized_is_still_upload_error() {
        let transport =
            MockTransport::new().fail_upload(MockReply::Status(401, "ExpiredToken".to_string()));
        let image = ImageUpload::new(vec![1; 16], ImageMimeType::Jpeg);

        let result = upload_blob(&transport, &session(), image).await;
        assert!(matches!(result, Err(PlatformError::Upload(_))));
    }

    #[tokio::test]
    async fn test_upload_network_failure_is_upload_error() {
        let transport =
            MockTransport::new().fail_upload(MockReply::Network("timed out".to_string()));
        let image = ImageUpload::new(vec![1; 16], ImageMimeType::Gif);

        let result = upload_blob(&transport, &session(), image).await;
        assert!(matches!(result, Err(PlatformError::Upload(_))));
    }

    #[tokio::test]
    async fn test_unusable_token_is_upload_error_without_request() {
        let transport = MockTransport::new();
        let session = Session::new(
            "alice.bsky.social",
            "did:plc:alice",
            SecretString::from("jwt\nwith-newline".to_string()),
        );
        let image = ImageUpload::new(vec![1; 16], ImageMimeType::Png);

        let result = upload_blob(&transport, &session, image).await;
        assert!(matches!(result, Err(PlatformError::Upload(_))));
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn test_upload_missing_blob_field() {
        let transport =
            MockTransport::new().fail_upload(MockReply::Status(200, r#"{"other":1}"#.to_string()));
        let image = ImageUpload::new(vec![1; 16], ImageMimeType::WebP);

        match upload_blob(&transport, &session(), image).await {
            Err(PlatformError::Upload(msg)) => assert!(msg.contains("no blob")),
            other => panic!("Expected upload error, got {:?}", other),
        }
    }
}
