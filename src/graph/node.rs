//! 图节点

use std::fmt;

use crate::core::Route;
use crate::dispatch::SpecialistKind;

/// 执行图中的节点；Entry 为起点，Output 为唯一终点
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Node {
    Entry,
    Router,
    Planner,
    Social,
    Platform,
    ErrorHandler,
    Output,
}

impl Node {
    pub const ALL: [Node; 7] = [
        Node::Entry,
        Node::Router,
        Node::Planner,
        Node::Social,
        Node::Platform,
        Node::ErrorHandler,
        Node::Output,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Node::Entry => "entry",
            Node::Router => "router",
            Node::Planner => "planner",
            Node::Social => "social",
            Node::Platform => "platform",
            Node::ErrorHandler => "error_handler",
            Node::Output => "output",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Node::Output)
    }

    pub fn specialist(&self) -> Option<SpecialistKind> {
        match self {
            Node::Planner => Some(SpecialistKind::Planner),
            Node::Social => Some(SpecialistKind::Social),
            Node::Platform => Some(SpecialistKind::Platform),
            _ => None,
        }
    }

    /// 路由值对应的目标节点
    pub fn for_route(route: Route) -> Node {
        match route {
            Route::Planner => Node::Planner,
            Route::Social => Node::Social,
            Route::Platform => Node::Platform,
            Route::FinalResponder => Node::Output,
            Route::ErrorHandler => Node::ErrorHandler,
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
