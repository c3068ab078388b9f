//! HTTP 入口
//!
//! - `GET /`：运行提示
//! - `GET /health`：健康检查
//! - `POST /invoke`：`{"user_request", "session_id"?}` → final_output（JSON 或纯文本）
//! - `POST /agents/orchestrator/invoke`：以专家线协议暴露编排器本身

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::core::ShutdownManager;
use crate::dispatch::{InvokeRequest, SpecialistResponse};
use crate::graph::{GraphEngine, Node};

pub const SESSION_HEADER: &str = "x-session-id";

/// 各 handler 共享的状态
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<GraphEngine>,
}

impl AppState {
    pub fn new(engine: GraphEngine) -> Self {
        Self {
            engine: Arc::new(engine),
        }
    }
}

/// `POST /invoke` 请求体
#[derive(Debug, Deserialize)]
pub struct InvokeBody {
    pub user_request: String,
    #[serde(default)]
    pub session_id: Option<String>,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(|| async { "OK" }))
        .route("/invoke", post(invoke))
        .route("/agents/orchestrator/invoke", post(orchestrator_invoke))
        .with_state(state)
}

/// 监听直到 shutdown 被触发，处理中的请求会被允许完成
pub async fn serve(
    listener: tokio::net::TcpListener,
    state: AppState,
    shutdown: ShutdownManager,
) -> std::io::Result<()> {
    let token = shutdown.token();
    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(async move { token.cancelled().await })
        .await
}

async fn index() -> Json<Value> {
    Json(json!({
        "message": "Switchboard orchestrator is running. POST /invoke to interact."
    }))
}

async fn invoke(
    State(state): State<AppState>,
    payload: Result<Json<InvokeBody>, JsonRejection>,
) -> Response {
    let body = match payload {
        Ok(Json(body)) => body,
        Err(rejection) => return rejection_response(rejection),
    };

    let final_state = state.engine.run(&body.user_request, body.session_id).await;
    let text = final_state.final_output().unwrap_or_default().to_string();
    let content_type = if is_structured(&text) {
        "application/json"
    } else {
        "text/plain; charset=utf-8"
    };

    let mut response = (StatusCode::OK, [(header::CONTENT_TYPE, content_type)], text).into_response();
    match HeaderValue::from_str(final_state.session_id()) {
        Ok(value) => {
            response
                .headers_mut()
                .insert(HeaderName::from_static(SESSION_HEADER), value);
        }
        Err(_) => tracing::warn!("Session id is not a valid header value, header omitted"),
    }
    response
}

async fn orchestrator_invoke(
    State(state): State<AppState>,
    payload: Result<Json<InvokeRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return rejection_response(rejection),
    };

    let exec = state
        .engine
        .run_traced(&request.query, request.session_id)
        .await;
    let text = exec.state.final_output().unwrap_or_default();
    let output = serde_json::from_str::<Value>(text).unwrap_or_else(|_| Value::String(text.to_string()));

    let error = if exec.path.contains(&Node::ErrorHandler) {
        output
            .get("error")
            .and_then(Value::as_str)
            .map(String::from)
            .or_else(|| exec.state.error_message().map(String::from))
    } else {
        None
    };

    Json(SpecialistResponse {
        output: Some(output),
        error,
    })
    .into_response()
}

fn rejection_response(rejection: JsonRejection) -> Response {
    tracing::warn!("Rejected request body: {}", rejection.body_text());
    (
        rejection.status(),
        Json(json!({ "error": rejection.body_text() })),
    )
        .into_response()
}

fn is_structured(text: &str) -> bool {
    serde_json::from_str::<Value>(text)
        .map(|v| v.is_object() || v.is_array())
        .unwrap_or(false)
}
