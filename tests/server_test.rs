//! HTTP 入口测试（tower oneshot，不监听端口）

#![cfg(feature = "server")]

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use axum::Router;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use switchboard::dispatch::{DispatchClient, SpecialistSet};
    use switchboard::graph::GraphEngine;
    use switchboard::llm::MockLlmClient;
    use switchboard::router::LlmRouter;
    use switchboard::server::{build_router, AppState};

    fn app() -> Router {
        let client = DispatchClient::new(HashMap::new(), 1).unwrap();
        let engine = GraphEngine::new(
            Arc::new(LlmRouter::new(Arc::new(MockLlmClient))),
            SpecialistSet::remote(Arc::new(client)),
            25,
        )
        .unwrap();
        build_router(AppState::new(engine))
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(resp: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_and_index() {
        let resp = app()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"OK");

        let resp = app()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = body_json(resp).await;
        assert!(body["message"].as_str().unwrap().contains("POST /invoke"));
    }

    #[tokio::test]
    async fn test_invoke_returns_json_and_session_header() {
        let resp = app()
            .oneshot(post_json(
                "/invoke",
                r#"{"user_request": "Plan a weekend", "session_id": "abc-123"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[header::CONTENT_TYPE], "application/json");
        assert_eq!(resp.headers()["x-session-id"], "abc-123");
        assert_eq!(
            body_json(resp).await,
            json!({"message": "Processing completed with no specific output or error provided."})
        );
    }

    #[tokio::test]
    async fn test_invoke_generates_session_id() {
        let resp = app()
            .oneshot(post_json("/invoke", r#"{"user_request": "hi"}"#))
            .await
            .unwrap();
        let session = resp.headers()["x-session-id"].to_str().unwrap();
        assert!(!session.is_empty());
    }

    #[tokio::test]
    async fn test_empty_request_is_error_payload_not_http_failure() {
        let resp = app()
            .oneshot(post_json("/invoke", r#"{"user_request": ""}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            body_json(resp).await,
            json!({
                "error": "User request missing in initial state.",
                "details": "Processing was halted due to an error."
            })
        );
    }

    #[tokio::test]
    async fn test_bad_request_shapes() {
        let resp = app().oneshot(post_json("/invoke", "{")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(body_json(resp).await["error"].is_string());

        let resp = app()
            .oneshot(post_json("/invoke", r#"{"query": "wrong field"}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body_json(resp).await["error"].is_string());
    }

    #[tokio::test]
    async fn test_orchestrator_over_specialist_contract() {
        let resp = app()
            .oneshot(post_json("/agents/orchestrator/invoke", r#"{"query": "hello"}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        assert!(body["error"].is_null());
        assert!(body["output"]["message"].is_string());

        let resp = app()
            .oneshot(post_json("/agents/orchestrator/invoke", r#"{"query": " "}"#))
            .await
            .unwrap();
        let body = body_json(resp).await;
        assert_eq!(body["error"], "User request missing in initial state.");
        assert_eq!(body["output"]["details"], "Processing was halted due to an error.");
    }
}
