//! Integration tests for `QwenGateway`.
//!
//! These tests use wiremock to simulate the text-generation endpoint and
//! verify request shape, reply clean-up and failure classification.

use std::time::Duration;

use gateway::{GatewayConfig, QwenGateway, Step, StepType, TranslationFailure, TranslationGateway};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ENDPOINT: &str = "/api/v1/services/aigc/text-generation/generation";

fn gateway_for(server: &MockServer) -> QwenGateway {
    let config = GatewayConfig::default()
        .with_api_key("sk-test")
        .with_model_url(format!("{}{ENDPOINT}", server.uri()));
    QwenGateway::new(config).unwrap()
}

fn reply(text: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "output": { "text": text },
        "request_id": "req-1"
    }))
}

#[tokio::test]
async fn text_to_sql_sends_bearer_token_and_strips_fences() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({
            "model": "qwen-turbo",
            "parameters": { "max_tokens": 500 }
        })))
        .respond_with(reply("```sql\nSELECT * FROM users;\n```"))
        .expect(1)
        .mount(&server)
        .await;

    let sql = gateway_for(&server)
        .text_to_sql("all users", Some("users(id, name)"))
        .await
        .unwrap();

    assert_eq!(sql, "SELECT * FROM users;");
}

#[tokio::test]
async fn sql_to_steps_extracts_the_json_array() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(reply(
            "Steps:\n[{\"step_id\": 1, \"step_type\": \"query\", \"description\": \"scan users\"},\
             {\"step_id\": 2, \"step_type\": \"result\", \"description\": \"return rows\"}]",
        ))
        .mount(&server)
        .await;

    let steps = gateway_for(&server).sql_to_steps("SELECT * FROM users").await.unwrap();

    assert_eq!(
        steps,
        vec![
            Step::new(1, StepType::Query, "scan users"),
            Step::new(2, StepType::Result, "return rows"),
        ]
    );
}

#[tokio::test]
async fn steps_to_sql_embeds_steps_in_prompt() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(reply("SELECT name FROM users"))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = gateway_for(&server);
    let sql = gateway
        .steps_to_sql(&[Step::new(1, StepType::Query, "project user names")])
        .await
        .unwrap();
    assert_eq!(sql, "SELECT name FROM users");

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    let prompt = body["input"]["messages"][1]["content"].as_str().unwrap();
    assert!(prompt.contains("project user names"));
    assert_eq!(body["input"]["messages"][0]["role"], "system");
}

#[tokio::test]
async fn server_error_is_reported_with_upstream_message() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({
            "code": "ServiceUnavailable",
            "message": "model overloaded"
        })))
        .mount(&server)
        .await;

    let err = gateway_for(&server).text_to_sql("all users", None).await.unwrap_err();

    match &err {
        TranslationFailure::Api { status, message } => {
            assert_eq!(*status, 503);
            assert_eq!(message, "model overloaded");
        }
        other => panic!("expected Api failure, got {other:?}"),
    }
    assert!(err.is_retryable());
}

#[tokio::test]
async fn reply_without_output_text_is_malformed() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "unexpected": true })))
        .mount(&server)
        .await;

    let err = gateway_for(&server).text_to_sql("all users", None).await.unwrap_err();
    assert!(matches!(err, TranslationFailure::MalformedResponse(_)));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn missing_api_key_fails_without_sending_a_request() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(reply("SELECT 1"))
        .expect(0)
        .mount(&server)
        .await;

    let config = GatewayConfig::default().with_model_url(format!("{}{ENDPOINT}", server.uri()));
    let err = QwenGateway::new(config)
        .unwrap()
        .sql_to_steps("SELECT 1")
        .await
        .unwrap_err();

    assert!(matches!(err, TranslationFailure::MissingCredential));
}

#[tokio::test]
async fn slow_upstream_times_out_as_retryable() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(reply("SELECT 1").set_delay(Duration::from_millis(500)))
        .mount(&server)
        .await;

    let config = GatewayConfig::default()
        .with_api_key("sk-test")
        .with_model_url(format!("{}{ENDPOINT}", server.uri()))
        .with_timeout(Duration::from_millis(50));
    let err = QwenGateway::new(config)
        .unwrap()
        .text_to_sql("all users", None)
        .await
        .unwrap_err();

    assert!(matches!(err, TranslationFailure::Http(_)));
    assert!(err.is_retryable());
}

#[test]
fn non_http_model_url_is_rejected() {
    let config = GatewayConfig::default().with_model_url("dashscope.aliyuncs.com/generate");
    match QwenGateway::new(config) {
        Err(TranslationFailure::InvalidConfig(msg)) => assert!(msg.contains("http://")),
        other => panic!("expected InvalidConfig, got {other:?}"),
    }
}
