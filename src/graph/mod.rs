//! 编排图：节点、转移表、执行引擎、错误处理与输出节点

pub mod engine;
pub mod error_handler;
pub mod node;
pub mod output;
pub mod transition;

pub use engine::{Execution, GraphEngine};
pub use node::Node;
pub use transition::{select_next, TransitionTable};
