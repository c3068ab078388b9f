//! 状态转移表与转移函数
//!
//! 邻接表记录每个节点允许的后继；`select_next` 根据当前状态在允许的后继中选一个。
//! 表在启动时对照路由集合校验一次，之后只读。

use std::collections::{BTreeSet, HashMap, VecDeque};

use crate::core::{OrchestrationState, Route, SetupError};
use crate::graph::Node;

/// 节点 → 允许的后继节点
#[derive(Debug, Clone)]
pub struct TransitionTable {
    adjacency: HashMap<Node, Vec<Node>>,
}

impl TransitionTable {
    pub fn new<I>(edges: I) -> Self
    where
        I: IntoIterator<Item = (Node, Node)>,
    {
        let mut adjacency: HashMap<Node, Vec<Node>> = HashMap::new();
        for node in Node::ALL {
            adjacency.insert(node, Vec::new());
        }
        for (from, to) in edges {
            let successors = adjacency.entry(from).or_default();
            if !successors.contains(&to) {
                successors.push(to);
            }
        }
        Self { adjacency }
    }

    /// entry → router ⇄ 专家 → ... → output
    pub fn standard() -> Self {
        Self::new([
            (Node::Entry, Node::Router),
            (Node::Entry, Node::ErrorHandler),
            (Node::Router, Node::Planner),
            (Node::Router, Node::Social),
            (Node::Router, Node::Platform),
            (Node::Router, Node::Output),
            (Node::Router, Node::ErrorHandler),
            (Node::Planner, Node::Router),
            (Node::Social, Node::Router),
            (Node::Platform, Node::Router),
            (Node::ErrorHandler, Node::Output),
        ])
    }

    pub fn successors(&self, from: Node) -> &[Node] {
        self.adjacency.get(&from).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn allows(&self, from: Node, to: Node) -> bool {
        self.successors(from).contains(&to)
    }

    /// 从 start 出发可达的节点（不含 start 自身，除非存在回路）
    pub fn reachable_from(&self, start: Node) -> BTreeSet<Node> {
        let mut seen = BTreeSet::new();
        let mut queue: VecDeque<Node> = self.successors(start).iter().copied().collect();
        while let Some(node) = queue.pop_front() {
            if seen.insert(node) {
                queue.extend(self.successors(node).iter().copied());
            }
        }
        seen
    }

    /// 启动期校验
    pub fn validate(&self) -> Result<(), SetupError> {
        for route in Route::ALL {
            let target = Node::for_route(route);
            if !self.allows(Node::Router, target) {
                return Err(SetupError::TransitionTable(format!(
                    "route '{route}' has no router edge to '{target}'"
                )));
            }
        }
        for node in Node::ALL {
            let has_successor = !self.successors(node).is_empty();
            if node.is_terminal() && has_successor {
                return Err(SetupError::TransitionTable(format!(
                    "terminal node '{node}' must not have successors"
                )));
            }
            if !node.is_terminal() {
                if !has_successor {
                    return Err(SetupError::TransitionTable(format!(
                        "node '{node}' has no outgoing edge"
                    )));
                }
                if !self.reachable_from(node).contains(&Node::Output) {
                    return Err(SetupError::TransitionTable(format!(
                        "output is not reachable from '{node}'"
                    )));
                }
            }
        }
        Ok(())
    }
}

/// 转移函数：只看状态，不做 I/O
pub fn select_next(from: Node, state: &OrchestrationState) -> Node {
    match from {
        Node::Entry => {
            if state.error_message().is_some() {
                Node::ErrorHandler
            } else {
                Node::Router
            }
        }
        Node::Router => {
            if state.error_message().is_some() && state.route() != Some(Route::FinalResponder) {
                return Node::ErrorHandler;
            }
            state.route().map(Node::for_route).unwrap_or(Node::ErrorHandler)
        }
        Node::Planner | Node::Social | Node::Platform => Node::Router,
        Node::ErrorHandler | Node::Output => Node::Output,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_table_is_valid() {
        assert!(TransitionTable::standard().validate().is_ok());
    }

    #[test]
    fn test_reachability() {
        let table = TransitionTable::standard();
        assert!(table.reachable_from(Node::Output).is_empty());
        assert_eq!(
            table.reachable_from(Node::ErrorHandler),
            BTreeSet::from([Node::Output])
        );
        let from_entry = table.reachable_from(Node::Entry);
        for node in Node::ALL.into_iter().filter(|n| *n != Node::Entry) {
            assert!(from_entry.contains(&node), "{node} unreachable");
        }
    }

    #[test]
    fn test_missing_route_edge_rejected() {
        let table = TransitionTable::new([
            (Node::Entry, Node::Router),
            (Node::Router, Node::Planner),
            (Node::Router, Node::Output),
            (Node::Router, Node::ErrorHandler),
            (Node::Planner, Node::Router),
            (Node::ErrorHandler, Node::Output),
        ]);
        let err = table.validate().unwrap_err().to_string();
        assert!(err.contains("route 'social'"));
    }

    #[test]
    fn test_dead_end_rejected() {
        let mut edges: Vec<(Node, Node)> = TransitionTable::standard()
            .adjacency
            .iter()
            .flat_map(|(from, tos)| tos.iter().map(move |to| (*from, *to)))
            .filter(|(from, _)| *from != Node::Platform)
            .collect();
        edges.push((Node::Output, Node::Router));
        let err = TransitionTable::new(edges).validate().unwrap_err().to_string();
        assert!(err.contains("output") || err.contains("platform"));
    }

    #[test]
    fn test_select_next_from_router() {
        let state = OrchestrationState::new("x", None).routed(Route::Social, "t".into());
        assert_eq!(select_next(Node::Router, &state), Node::Social);

        let state = state.routed(Route::FinalResponder, "done".into());
        assert_eq!(select_next(Node::Router, &state), Node::Output);

        let state = OrchestrationState::new("x", None).routing_failed("bad");
        assert_eq!(select_next(Node::Router, &state), Node::ErrorHandler);

        let state = OrchestrationState::new("x", None);
        assert_eq!(select_next(Node::Router, &state), Node::ErrorHandler);
    }

    #[test]
    fn test_error_without_terminal_route_goes_to_error_handler() {
        let state = OrchestrationState::new("x", None)
            .routed(Route::Planner, "t".into())
            .with_error("router", "boom");
        assert_eq!(select_next(Node::Router, &state), Node::ErrorHandler);
    }

    #[test]
    fn test_entry_and_specialists() {
        let ok = OrchestrationState::new("x", None).entered();
        assert_eq!(select_next(Node::Entry, &ok), Node::Router);
        let missing = OrchestrationState::new("", None).with_error("entry", "missing");
        assert_eq!(select_next(Node::Entry, &missing), Node::ErrorHandler);
        assert_eq!(select_next(Node::Platform, &missing), Node::Router);
        assert_eq!(select_next(Node::ErrorHandler, &missing), Node::Output);
    }
}
