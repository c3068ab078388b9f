//! 路由器：每轮一次 LLM 调用，把自由文本回复收敛为封闭的 Route
//!
//! RouteDecider 是引擎看到的唯一接口；LlmRouter 为默认实现（prompt → LLM → parse）。

pub mod parse;
pub mod prompt;

use std::sync::Arc;

use async_trait::async_trait;

use crate::core::{OrchestrationState, OrchestratorError, Route};
use crate::llm::LlmClient;

pub use parse::{parse_decision, strip_code_fence, ParsedDecision};
pub use prompt::{build_messages, render_state, ROUTER_SYSTEM_PROMPT};

/// 一轮路由的结果；error 非空时 route 恒为 ErrorHandler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouterDecision {
    pub route: Route,
    pub task_description: String,
    pub error: Option<OrchestratorError>,
}

impl RouterDecision {
    pub fn ok(route: Route, task_description: impl Into<String>) -> Self {
        Self {
            route,
            task_description: task_description.into(),
            error: None,
        }
    }

    pub fn failed(error: OrchestratorError, task_description: impl Into<String>) -> Self {
        Self {
            route: Route::ErrorHandler,
            task_description: task_description.into(),
            error: Some(error),
        }
    }

    /// 写回状态：成功清除旧错误，失败强制走 error_handler。
    /// 路由器主动选择 error_handler 时保留上一步错误，没有则以其说明作为错误信息。
    pub fn apply(self, state: OrchestrationState) -> OrchestrationState {
        match self.error {
            None if self.route == Route::ErrorHandler => {
                let reason = state
                    .error_message()
                    .map(String::from)
                    .unwrap_or_else(|| self.task_description.clone());
                state
                    .routed(self.route, self.task_description)
                    .with_error("router", reason)
            }
            None => state.routed(self.route, self.task_description),
            Some(err) => state.routing_failed(err),
        }
    }
}

/// 路由能力
#[async_trait]
pub trait RouteDecider: Send + Sync {
    async fn decide(&self, state: &OrchestrationState) -> RouterDecision;
}

/// 基于 LLM 的路由器
pub struct LlmRouter {
    llm: Arc<dyn LlmClient>,
}

impl LlmRouter {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    /// 获取 LLM 累计 token 使用统计
    pub fn token_usage(&self) -> (u64, u64, u64) {
        self.llm.token_usage()
    }
}

#[async_trait]
impl RouteDecider for LlmRouter {
    async fn decide(&self, state: &OrchestrationState) -> RouterDecision {
        let messages = build_messages(state);
        let raw = match self.llm.complete(&messages).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::error!("Router LLM call failed: {}", e);
                return RouterDecision::failed(
                    OrchestratorError::Routing(format!("Router LLM call failed: {e}")),
                    state.user_request(),
                );
            }
        };
        tracing::debug!(raw = %raw, "router reply");

        match parse_decision(&raw, state.user_request()) {
            Ok(parsed) => {
                tracing::info!(
                    "Router decided route '{}' with task: '{}'",
                    parsed.route,
                    parsed.task_description.chars().take(200).collect::<String>()
                );
                RouterDecision::ok(parsed.route, parsed.task_description)
            }
            Err(e) => {
                tracing::warn!("{}", e);
                RouterDecision::failed(e, state.user_request())
            }
        }
    }
}
