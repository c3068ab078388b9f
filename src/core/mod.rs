//! 核心层：错误类型、路由取值、编排状态、优雅关闭

pub mod error;
pub mod route;
pub mod shutdown;
pub mod state;

pub use error::{OrchestratorError, SetupError};
pub use route::{Route, UnknownRoute};
pub use shutdown::{ShutdownManager, ShutdownReason};
pub use state::OrchestrationState;
