//! HTTP-level tests against local mockito servers
//!
//! Exercise the reqwest transport, the XRPC wire format and the completion
//! providers without reaching the network.

use libthreadcast::bluesky::{authenticate, ReqwestTransport, ThreadPublisher, XrpcTransport};
use libthreadcast::generator::{CompletionProvider, GeminiProvider, GroqProvider};
use libthreadcast::{ImageMimeType, ImageUpload, PlatformError, ThreadOutcome, ThreadcastError};
use mockito::Matcher;
use secrecy::SecretString;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

const TIMEOUT: Duration = Duration::from_secs(5);

fn transport(server: &mockito::ServerGuard) -> Arc<dyn XrpcTransport> {
    Arc::new(ReqwestTransport::new(server.url(), TIMEOUT).unwrap())
}

fn password() -> SecretString {
    SecretString::from("abcd-efgh-ijkl-mnop".to_string())
}

async fn mock_session(server: &mut mockito::ServerGuard) -> mockito::Mock {
    server
        .mock("POST", "/xrpc/com.atproto.server.createSession")
        .match_header("content-type", "application/json")
        .match_body(Matcher::Json(json!({
            "identifier": "alice.bsky.social",
            "password": "abcd-efgh-ijkl-mnop",
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "did": "did:plc:alice",
                "handle": "alice.bsky.social",
                "accessJwt": "access-token",
                "refreshJwt": "refresh-token",
            })
            .to_string(),
        )
        .create_async()
        .await
}

#[tokio::test]
async fn test_create_session_over_http() {
    let mut server = mockito::Server::new_async().await;
    let session_mock = mock_session(&mut server).await;
    let transport = transport(&server);

    let session = authenticate(transport.as_ref(), "alice.bsky.social", &password())
        .await
        .unwrap();

    session_mock.assert_async().await;
    assert_eq!(session.did(), "did:plc:alice");
    assert_eq!(session.handle(), "alice.bsky.social");
}

#[tokio::test]
async fn test_create_session_rejected() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/xrpc/com.atproto.server.createSession")
        .with_status(401)
        .with_body(r#"{"error":"AuthenticationRequired","message":"Invalid identifier or password"}"#)
        .create_async()
        .await;
    let transport = transport(&server);

    let result = authenticate(transport.as_ref(), "alice.bsky.social", &password()).await;

    match result {
        Err(PlatformError::Authentication(msg)) => {
            assert!(msg.contains("401"));
            assert!(msg.contains("AuthenticationRequired"));
        }
        other => panic!("Expected authentication error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_unreachable_server_is_authentication_error() {
    // Nothing listens on port 1
    let transport = ReqwestTransport::new("http://127.0.0.1:1", TIMEOUT).unwrap();

    let result = authenticate(&transport, "alice.bsky.social", &password()).await;
    assert!(matches!(result, Err(PlatformError::Authentication(_))));
}

#[tokio::test]
async fn test_thread_with_image_over_http() {
    let mut server = mockito::Server::new_async().await;
    let _session_mock = mock_session(&mut server).await;

    let upload_mock = server
        .mock("POST", "/xrpc/com.atproto.repo.uploadBlob")
        .match_header("authorization", "Bearer access-token")
        .match_header("content-type", "image/jpeg")
        .with_status(200)
        .with_body(
            json!({"blob": {
                "$type": "blob",
                "ref": {"$link": "bafkreiimage"},
                "mimeType": "image/jpeg",
                "size": 4
            }})
            .to_string(),
        )
        .expect(1)
        .create_async()
        .await;

    let root_mock = server
        .mock("POST", "/xrpc/com.atproto.repo.createRecord")
        .match_header("authorization", "Bearer access-token")
        .match_body(Matcher::PartialJson(json!({
            "repo": "did:plc:alice",
            "collection": "app.bsky.feed.post",
            "record": {
                "$type": "app.bsky.feed.post",
                "text": "first",
                "embed": {
                    "$type": "app.bsky.embed.images",
                    "images": [{"alt": "", "image": {
                        "$type": "blob",
                        "ref": {"$link": "bafkreiimage"},
                        "mimeType": "image/jpeg",
                        "size": 4
                    }}]
                }
            }
        })))
        .with_status(200)
        .with_body(r#"{"uri":"at://did:plc:alice/app.bsky.feed.post/root","cid":"cidroot"}"#)
        .expect(1)
        .create_async()
        .await;

    let reply_mock = server
        .mock("POST", "/xrpc/com.atproto.repo.createRecord")
        .match_body(Matcher::PartialJson(json!({
            "record": {
                "text": "second",
                "reply": {
                    "root": {"uri": "at://did:plc:alice/app.bsky.feed.post/root", "cid": "cidroot"},
                    "parent": {"uri": "at://did:plc:alice/app.bsky.feed.post/root", "cid": "cidroot"}
                }
            }
        })))
        .with_status(200)
        .with_body(r#"{"uri":"at://did:plc:alice/app.bsky.feed.post/second","cid":"cid2"}"#)
        .expect(1)
        .create_async()
        .await;

    let transport = transport(&server);
    let session = authenticate(transport.as_ref(), "alice.bsky.social", &password())
        .await
        .unwrap();
    let publisher = ThreadPublisher::new(transport, Arc::new(session))
        .with_inter_post_delay(Duration::ZERO);

    let image = ImageUpload::new(vec![0xff, 0xd8, 0xff, 0xe0], ImageMimeType::Jpeg);
    let result = publisher
        .publish_thread(&["first", "second"], Some(image))
        .await
        .unwrap();

    upload_mock.assert_async().await;
    root_mock.assert_async().await;
    reply_mock.assert_async().await;

    assert_eq!(result.outcome(), ThreadOutcome::Complete);
    assert!(result.image_attached);
    assert_eq!(
        result.posts[1].web_url("alice.bsky.social"),
        "https://bsky.app/profile/alice.bsky.social/post/second"
    );
}

#[tokio::test]
async fn test_server_error_detail_is_truncated() {
    let mut server = mockito::Server::new_async().await;
    let _session_mock = mock_session(&mut server).await;
    let long_body = "x".repeat(1000);
    let _mock = server
        .mock("POST", "/xrpc/com.atproto.repo.createRecord")
        .with_status(502)
        .with_body(long_body.as_str())
        .create_async()
        .await;

    let transport = transport(&server);
    let session = authenticate(transport.as_ref(), "alice.bsky.social", &password())
        .await
        .unwrap();
    let publisher = ThreadPublisher::new(transport, Arc::new(session));

    let result = publisher.publish_thread(&["only"], None).await.unwrap();

    assert_eq!(result.outcome(), ThreadOutcome::Failed);
    match result.error {
        Some(PlatformError::Posting(msg)) => {
            assert!(msg.contains("502"));
            assert!(msg.contains(&"x".repeat(200)));
            assert!(!msg.contains(&"x".repeat(201)));
        }
        other => panic!("Expected posting error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_groq_completion() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/chat/completions")
        .match_header("authorization", "Bearer groq-key")
        .match_body(Matcher::PartialJson(json!({
            "model": "llama-3.3-70b-versatile",
            "max_tokens": 1000
        })))
        .with_status(200)
        .with_body(
            json!({"choices": [{"message": {"role": "assistant", "content": "a\n---\nb\n---\nc"}}]})
                .to_string(),
        )
        .create_async()
        .await;

    let provider = GroqProvider::new(SecretString::from("groq-key".to_string()), TIMEOUT)
        .unwrap()
        .with_base_url(server.url());

    let content = provider.complete("prompt").await.unwrap();

    mock.assert_async().await;
    assert_eq!(content, "a\n---\nb\n---\nc");
}

#[tokio::test]
async fn test_groq_error_status() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/chat/completions")
        .with_status(503)
        .with_body("over capacity")
        .create_async()
        .await;

    let provider = GroqProvider::new(SecretString::from("groq-key".to_string()), TIMEOUT)
        .unwrap()
        .with_base_url(server.url());

    match provider.complete("prompt").await {
        Err(ThreadcastError::Generation(msg)) => {
            assert!(msg.contains("503"));
            assert!(msg.contains("over capacity"));
        }
        other => panic!("Expected generation error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_gemini_completion_passes_key_as_query() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/models/gemini-1.5-flash:generateContent")
        .match_query(Matcher::UrlEncoded("key".into(), "gemini-key".into()))
        .match_body(Matcher::PartialJson(json!({
            "contents": [{"parts": [{"text": "prompt"}]}],
            "generationConfig": {"maxOutputTokens": 1000}
        })))
        .with_status(200)
        .with_body(
            json!({"candidates": [{"content": {"parts": [{"text": "one---two---three"}]}}]})
                .to_string(),
        )
        .create_async()
        .await;

    let provider = GeminiProvider::new(SecretString::from("gemini-key".to_string()), TIMEOUT)
        .unwrap()
        .with_base_url(server.url());

    let content = provider.complete("prompt").await.unwrap();

    mock.assert_async().await;
    assert_eq!(content, "one---two---three");
}

#[tokio::test]
async fn test_gemini_without_candidates() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/models/gemini-1.5-flash:generateContent")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#)
        .create_async()
        .await;

    let provider = GeminiProvider::new(SecretString::from("gemini-key".to_string()), TIMEOUT)
        .unwrap()
        .with_base_url(server.url());

    let result = provider.complete("prompt").await;
    assert!(matches!(result, Err(ThreadcastError::Generation(_))));
}
