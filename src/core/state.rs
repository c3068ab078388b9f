//! 编排状态：单条记录，逐步「替换」而非原地修改
//!
//! 每个节点消费旧状态、返回新状态（见下方 `with_*` / `routed` 等方法）。
//! `user_request` 与 `session_id` 在构造后不可变，`final_output` 只能由 Output Formatter 写入。

use serde::Serialize;
use serde_json::Value;

use crate::core::Route;

/// 贯穿整个图的共享状态
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrchestrationState {
    user_request: String,
    session_id: String,
    current_task_description: Option<String>,
    intermediate_output: Option<Value>,
    error_message: Option<String>,
    current_agent_name: Option<String>,
    route: Option<Route>,
    final_output: Option<String>,
}

impl OrchestrationState {
    /// 新建状态；session_id 为空或缺省时生成 UUID
    pub fn new(user_request: impl Into<String>, session_id: Option<String>) -> Self {
        let session_id = session_id
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        Self {
            user_request: user_request.into(),
            session_id,
            current_task_description: None,
            intermediate_output: None,
            error_message: None,
            current_agent_name: None,
            route: None,
            final_output: None,
        }
    }

    pub fn user_request(&self) -> &str {
        &self.user_request
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// 请求是否为空（仅空白也视为缺失）
    pub fn has_user_request(&self) -> bool {
        !self.user_request.trim().is_empty()
    }

    pub fn current_task_description(&self) -> Option<&str> {
        self.current_task_description.as_deref()
    }

    pub fn intermediate_output(&self) -> Option<&Value> {
        self.intermediate_output.as_ref()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn current_agent_name(&self) -> Option<&str> {
        self.current_agent_name.as_deref()
    }

    pub fn route(&self) -> Option<Route> {
        self.route
    }

    pub fn final_output(&self) -> Option<&str> {
        self.final_output.as_deref()
    }

    /// 入口节点：以原始请求作为初始任务描述
    pub fn entered(self) -> Self {
        Self {
            current_task_description: Some(self.user_request.clone()),
            current_agent_name: Some("entry".to_string()),
            ..self
        }
    }

    /// 任意节点报错：写入 error_message，其余字段保持
    pub fn with_error(self, agent: &str, error: impl ToString) -> Self {
        Self {
            error_message: Some(error.to_string()),
            current_agent_name: Some(agent.to_string()),
            ..self
        }
    }

    /// 路由成功：清除旧错误，替换任务描述
    pub fn routed(self, route: Route, task_description: String) -> Self {
        Self {
            route: Some(route),
            current_task_description: Some(task_description),
            error_message: None,
            current_agent_name: Some("router".to_string()),
            ..self
        }
    }

    /// 路由失败：强制走 error_handler
    pub fn routing_failed(self, error: impl ToString) -> Self {
        Self {
            route: Some(Route::ErrorHandler),
            error_message: Some(error.to_string()),
            current_agent_name: Some("router".to_string()),
            ..self
        }
    }

    /// 专家成功返回：覆盖上一轮输出（不累积历史）
    pub fn with_specialist_output(self, agent: &str, output: Option<Value>) -> Self {
        Self {
            intermediate_output: output,
            error_message: None,
            current_agent_name: Some(agent.to_string()),
            ..self
        }
    }

    /// error_handler 产出的终止载荷
    pub fn with_error_payload(self, payload: Value) -> Self {
        Self {
            intermediate_output: Some(payload),
            current_agent_name: Some("error_handler".to_string()),
            route: Some(Route::FinalResponder),
            ..self
        }
    }

    /// 以给定载荷替换 intermediate_output（测试与重放用）
    pub fn with_intermediate_output(self, output: Option<Value>) -> Self {
        Self {
            intermediate_output: output,
            ..self
        }
    }

    /// 写入最终输出，仅供 Output Formatter 调用
    pub(crate) fn finalized(self, final_output: String) -> Self {
        Self {
            final_output: Some(final_output),
            current_agent_name: Some("output".to_string()),
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_generates_session_id_when_absent() {
        let a = OrchestrationState::new("hi", None);
        let b = OrchestrationState::new("hi", Some("   ".to_string()));
        assert!(!a.session_id().is_empty());
        assert!(!b.session_id().is_empty());
        assert_ne!(a.session_id(), b.session_id());
    }

    #[test]
    fn test_new_keeps_given_session_id() {
        let s = OrchestrationState::new("hi", Some("sess-1".to_string()));
        assert_eq!(s.session_id(), "sess-1");
        assert!(s.route().is_none());
        assert!(s.final_output().is_none());
    }

    #[test]
    fn test_whitespace_request_counts_as_missing() {
        assert!(!OrchestrationState::new("  \n", None).has_user_request());
        assert!(OrchestrationState::new("plan", None).has_user_request());
    }

    #[test]
    fn test_routed_clears_previous_error() {
        let s = OrchestrationState::new("plan", None)
            .entered()
            .with_error("planner", "boom")
            .routed(Route::FinalResponder, "done".to_string());
        assert_eq!(s.error_message(), None);
        assert_eq!(s.route(), Some(Route::FinalResponder));
        assert_eq!(s.current_task_description(), Some("done"));
    }

    #[test]
    fn test_user_request_survives_every_transition() {
        let s = OrchestrationState::new("plan boston", None)
            .entered()
            .routed(Route::Planner, "plan a weekend".to_string())
            .with_specialist_output("planner", Some(json!({"plan": 1})))
            .routing_failed("bad")
            .with_error_payload(json!({"error": "bad"}))
            .finalized("x".to_string());
        assert_eq!(s.user_request(), "plan boston");
        assert_eq!(s.final_output(), Some("x"));
    }

    #[test]
    fn test_specialist_output_overwrites() {
        let s = OrchestrationState::new("q", None)
            .with_specialist_output("planner", Some(json!(1)))
            .with_specialist_output("social", Some(json!(2)));
        assert_eq!(s.intermediate_output(), Some(&json!(2)));
        assert_eq!(s.current_agent_name(), Some("social"));
    }
}
