//! Switchboard - LLM 路由的多专家编排器
//!
//! 一个入口接收自然语言请求，由 LLM 在每一轮决定下一个专家（planner / social / platform），
//! 结果写回共享状态，直到路由器选择结束或出现不可恢复的错误。
//!
//! 模块划分：
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: 错误类型、路由取值、编排状态、优雅关闭
//! - **dispatch**: 专家线协议、HTTP 分发客户端、专家集合
//! - **graph**: 节点、转移表、执行引擎、错误处理与输出节点
//! - **llm**: LLM 客户端抽象与实现（OpenAI 兼容 / DeepSeek / Mock）
//! - **observability**: tracing 初始化
//! - **router**: 路由 prompt、回复解析、基于 LLM 的路由器
//! - **server**: HTTP 入口（feature `server`）

pub mod config;
pub mod core;
pub mod dispatch;
pub mod graph;
pub mod llm;
pub mod observability;
pub mod router;
#[cfg(feature = "server")]
pub mod server;

pub use crate::core::{OrchestrationState, OrchestratorError, Route};
pub use graph::{Execution, GraphEngine};
