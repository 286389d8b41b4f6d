//! Wire-format tests for the Gemini client.

mod common;

use examgrader::{
    GeminiError, GeminiModel, GenerativeModel, Part,
    gemini::{GenerateContentRequest, GenerateContentResponse},
    parts::encode_bytes,
};
use serde_json::{Value, json};

fn response(value: Value) -> GenerateContentResponse {
    serde_json::from_value(value).expect("decode response")
}

#[test]
fn request_body_matches_generate_content_shape() {
    let body = GenerateContentRequest::new(vec![
        Part::text("grade this"),
        Part::from(encode_bytes(b"exam", "image/jpeg")),
    ]);

    let value = serde_json::to_value(&body).expect("serialize request");
    assert_eq!(
        value,
        json!({
            "contents": [{
                "role": "user",
                "parts": [
                    { "text": "grade this" },
                    { "inlineData": { "mimeType": "image/jpeg", "data": "ZXhhbQ==" } }
                ]
            }]
        })
    );
}

#[test]
fn parts_decode_back_into_the_right_variant() {
    let parts: Vec<Part> = serde_json::from_value(json!([
        { "text": "hi" },
        { "inlineData": { "mimeType": "application/pdf", "data": "" } }
    ]))
    .expect("decode parts");

    assert_eq!(parts[0].as_text(), Some("hi"));
    assert_eq!(parts[1].as_inline_data().map(|p| p.mime_type()), Some("application/pdf"));
}

#[test]
fn text_is_joined_across_parts_and_skips_thoughts() {
    let text = response(json!({
        "candidates": [{
            "content": {
                "role": "model",
                "parts": [
                    { "text": "thinking...", "thought": true },
                    { "text": "```json\n{" },
                    { "text": "}\n```" }
                ]
            },
            "finishReason": "STOP"
        }]
    }))
    .into_text()
    .expect("text");

    assert_eq!(text, "```json\n{}\n```");
}

#[test]
fn only_the_first_candidate_is_used() {
    let text = response(json!({
        "candidates": [
            { "content": { "parts": [{ "text": "first" }] } },
            { "content": { "parts": [{ "text": "second" }] } }
        ]
    }))
    .into_text()
    .expect("text");

    assert_eq!(text, "first");
}

#[test]
fn blocked_prompt_reports_reason() {
    let err = response(json!({ "promptFeedback": { "blockReason": "SAFETY" } }))
        .into_text()
        .expect_err("blocked");

    assert!(matches!(err, GeminiError::EmptyResponse { block_reason: Some(ref r) } if r == "SAFETY"));
    assert_eq!(err.to_string(), "Gemini returned no text (blocked: SAFETY)");
}

#[test]
fn candidate_without_text_reports_finish_reason() {
    let err = response(json!({ "candidates": [{ "finishReason": "RECITATION" }] }))
        .into_text()
        .expect_err("no text");

    assert!(matches!(err, GeminiError::EmptyResponse { block_reason: Some(ref r) } if r == "RECITATION"));
}

#[test]
fn empty_stop_has_no_block_reason() {
    let err = response(json!({ "candidates": [{ "content": { "parts": [] }, "finishReason": "STOP" }] }))
        .into_text()
        .expect_err("no text");

    assert!(matches!(err, GeminiError::EmptyResponse { block_reason: None }));
    assert_eq!(err.to_string(), "Gemini returned no text");
}

#[test]
fn model_url_uses_defaults() {
    let model = GeminiModel::builder().api_key("key").build();
    assert_eq!(model.model(), "gemini-3-pro-preview");
    assert_eq!(
        model.url(),
        "https://generativelanguage.googleapis.com/v1beta/models/gemini-3-pro-preview:generateContent"
    );
}

#[test]
fn model_url_trims_trailing_slash() {
    let model = GeminiModel::builder()
        .api_key("key")
        .model("gemini-2.5-flash")
        .endpoint("http://localhost:8080/v1beta/")
        .build();
    assert_eq!(model.url(), "http://localhost:8080/v1beta/models/gemini-2.5-flash:generateContent");
}

fn stub_model(addr: std::net::SocketAddr) -> GeminiModel {
    GeminiModel::builder()
        .api_key("KEY123")
        .model("m1")
        .endpoint(format!("http://{addr}/v1beta"))
        .build()
}

#[tokio::test]
async fn generate_posts_to_model_endpoint_with_api_key() {
    let (addr, server) = common::serve_once(
        "200 OK",
        r#"{"candidates":[{"content":{"parts":[{"text":"hello"}]},"finishReason":"STOP"}]}"#,
    )
    .await;

    let text = stub_model(addr)
        .generate(vec![Part::text("grade this")])
        .await
        .expect("generate");
    let request = server.await.expect("server");

    assert_eq!(text, "hello");
    assert!(request.starts_with("POST /v1beta/models/m1:generateContent HTTP/1.1"), "{request}");
    assert!(request.to_lowercase().contains("x-goog-api-key: key123"), "{request}");
    assert!(request.contains(r#""text":"grade this""#), "{request}");
}

#[tokio::test]
async fn non_success_status_keeps_body() {
    let (addr, server) =
        common::serve_once("400 Bad Request", r#"{"error":{"message":"API key not valid"}}"#).await;

    let err = stub_model(addr)
        .generate(vec![Part::text("x")])
        .await
        .expect_err("status error");
    server.await.expect("server");

    match err {
        GeminiError::Status { status, body } => {
            assert_eq!(status.as_u16(), 400);
            assert!(body.contains("API key not valid"));
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn undecodable_envelope_is_a_decode_error() {
    let (addr, server) = common::serve_once("200 OK", "<html>oops</html>").await;

    let err = stub_model(addr)
        .generate(vec![Part::text("x")])
        .await
        .expect_err("decode error");
    server.await.expect("server");

    assert!(matches!(err, GeminiError::Decode { ref body, .. } if body == "<html>oops</html>"));
}

#[tokio::test]
async fn envelope_without_candidates_is_empty_response() {
    let (addr, server) = common::serve_once("200 OK", r#"{"candidates":[]}"#).await;

    let err = stub_model(addr)
        .generate(vec![Part::text("x")])
        .await
        .expect_err("empty");
    server.await.expect("server");

    assert!(matches!(err, GeminiError::EmptyResponse { block_reason: None }));
}

#[tokio::test]
async fn unreachable_endpoint_is_a_transport_error() {
    let addr = common::closed_addr().await;

    let err = stub_model(addr)
        .generate(vec![Part::text("x")])
        .await
        .expect_err("transport");

    assert!(matches!(err, GeminiError::Transport(_)));
}
