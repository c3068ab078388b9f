//! 编排错误类型
//!
//! OrchestratorError 覆盖单次请求内的五类故障（输入 / 路由 / 分发 / 资源耗尽 / 意外），
//! 其 Display 文本即写入 `error_message` 的内容；SetupError 仅用于启动期，出现即服务不可用。

use thiserror::Error;

/// 单次编排运行中的错误：全部被归一为 `error_message` 并路由到 error_handler，不会中断进程
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OrchestratorError {
    /// 初始请求为空
    #[error("User request missing in initial state.")]
    InputMissing,

    /// 路由 LLM 输出无法解析、缺字段或路由值未知
    #[error("{0}")]
    Routing(String),

    /// 专家调用失败（未配置、网络、非 2xx、非 JSON）
    #[error("{0}")]
    Dispatch(String),

    /// 路由/专家往返次数超过上限
    #[error("Recursion limit of {limit} exceeded: the router never chose a terminal route.")]
    RecursionLimitExceeded { limit: usize },

    /// 节点边界捕获的意外故障（panic 等）
    #[error("An unexpected error occurred in the {node} node: {message}")]
    Unexpected { node: String, message: String },
}

impl OrchestratorError {
    /// 错误类别标签（日志用）
    pub fn kind(&self) -> &'static str {
        match self {
            OrchestratorError::InputMissing => "input",
            OrchestratorError::Routing(_) => "routing",
            OrchestratorError::Dispatch(_) => "dispatch",
            OrchestratorError::RecursionLimitExceeded { .. } => "resource_exhaustion",
            OrchestratorError::Unexpected { .. } => "unexpected",
        }
    }
}

/// 启动期致命错误：配置缺失、凭据缺失、状态表非法
#[derive(Error, Debug)]
pub enum SetupError {
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Missing LLM credentials: {0}")]
    MissingCredentials(String),

    #[error("Invalid transition table: {0}")]
    TransitionTable(String),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_missing_message_is_stable() {
        assert_eq!(
            OrchestratorError::InputMissing.to_string(),
            "User request missing in initial state."
        );
    }

    #[test]
    fn test_recursion_limit_is_distinguishable() {
        let err = OrchestratorError::RecursionLimitExceeded { limit: 25 };
        assert!(err.to_string().contains("Recursion limit of 25 exceeded"));
        assert_eq!(err.kind(), "resource_exhaustion");
    }

    #[test]
    fn test_unexpected_names_node() {
        let err = OrchestratorError::Unexpected {
            node: "planner".to_string(),
            message: "boom".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "An unexpected error occurred in the planner node: boom"
        );
    }
}
