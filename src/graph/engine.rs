//! 图执行引擎
//!
//! 单个请求在一个任务内顺序推进：entry → router ⇄ 专家 → ... → output。
//! 每个节点在边界处捕获 panic；路由器选择专家前检查往返上限，超限转 error_handler。
//! 多个请求可并发调用 run，彼此只共享只读的路由器与专家集合。

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::FutureExt;
use tracing::Instrument;

use crate::core::{OrchestrationState, OrchestratorError, SetupError};
use crate::dispatch::{SpecialistKind, SpecialistSet};
use crate::graph::transition::select_next;
use crate::graph::{error_handler, output, Node, TransitionTable};
use crate::router::RouteDecider;

/// 一次运行的完整记录
#[derive(Debug, Clone)]
pub struct Execution {
    pub state: OrchestrationState,
    /// 依次经过的节点（含 entry 与 output）
    pub path: Vec<Node>,
    /// 实际完成的专家调用次数
    pub round_trips: usize,
    pub elapsed: Duration,
}

/// 编排引擎：启动时构建一次，跨请求共享
pub struct GraphEngine {
    router: Arc<dyn RouteDecider>,
    specialists: SpecialistSet,
    table: TransitionTable,
    recursion_limit: usize,
}

impl GraphEngine {
    pub fn new(
        router: Arc<dyn RouteDecider>,
        specialists: SpecialistSet,
        recursion_limit: usize,
    ) -> Result<Self, SetupError> {
        if recursion_limit == 0 {
            return Err(SetupError::InvalidConfig(
                "recursion limit must be at least 1".to_string(),
            ));
        }
        let table = TransitionTable::standard();
        table.validate()?;
        Ok(Self {
            router,
            specialists,
            table,
            recursion_limit,
        })
    }

    pub fn recursion_limit(&self) -> usize {
        self.recursion_limit
    }

    /// 运行到 output 节点，返回终态（final_output 必然已设置）
    pub async fn run(&self, user_request: &str, session_id: Option<String>) -> OrchestrationState {
        self.run_traced(user_request, session_id).await.state
    }

    /// 同 run，并返回路径、往返次数与耗时
    pub async fn run_traced(&self, user_request: &str, session_id: Option<String>) -> Execution {
        let state = OrchestrationState::new(user_request, session_id);
        let span = tracing::info_span!("orchestrate", session_id = %state.session_id());
        self.drive(state).instrument(span).await
    }

    async fn drive(&self, mut state: OrchestrationState) -> Execution {
        let start = Instant::now();
        let mut node = Node::Entry;
        let mut path = Vec::new();
        let mut round_trips = 0usize;

        loop {
            path.push(node);
            tracing::debug!(node = node.as_str(), "entering node");
            state = self.step_guarded(node, state).await;
            if node.is_terminal() {
                break;
            }

            let mut next = select_next(node, &state);
            if next.specialist().is_some() {
                if round_trips >= self.recursion_limit {
                    let err = OrchestratorError::RecursionLimitExceeded {
                        limit: self.recursion_limit,
                    };
                    tracing::error!(kind = err.kind(), "{}", err);
                    state = state.routing_failed(err);
                    next = Node::ErrorHandler;
                } else {
                    round_trips += 1;
                }
            }

            if !self.table.allows(node, next) {
                let err = OrchestratorError::Unexpected {
                    node: node.to_string(),
                    message: format!("transition to '{next}' is not allowed"),
                };
                tracing::error!("{}", err);
                state = state.with_error(node.as_str(), err);
                next = if node == Node::ErrorHandler {
                    Node::Output
                } else {
                    Node::ErrorHandler
                };
            }
            node = next;
        }

        let elapsed = start.elapsed();
        tracing::info!(
            path = %path.iter().map(Node::as_str).collect::<Vec<_>>().join(" -> "),
            round_trips,
            elapsed_ms = elapsed.as_millis() as u64,
            "orchestration finished"
        );
        Execution {
            state,
            path,
            round_trips,
            elapsed,
        }
    }

    /// 执行单个节点；panic 被转为 Unexpected 错误
    async fn step_guarded(&self, node: Node, state: OrchestrationState) -> OrchestrationState {
        let snapshot = state.clone();
        match AssertUnwindSafe(self.step(node, state)).catch_unwind().await {
            Ok(next) => next,
            Err(payload) => {
                let err = OrchestratorError::Unexpected {
                    node: node.to_string(),
                    message: panic_message(payload.as_ref()),
                };
                tracing::error!(kind = err.kind(), "{}", err);
                match node {
                    Node::Router => snapshot.routing_failed(err),
                    Node::Output => {
                        let fallback = snapshot.with_error(node.as_str(), err);
                        let text = serde_json::json!({
                            "error": fallback.error_message().unwrap_or_default(),
                            "details": error_handler::HALTED_DETAILS,
                        })
                        .to_string();
                        fallback.finalized(text)
                    }
                    _ => snapshot.with_error(node.as_str(), err),
                }
            }
        }
    }

    async fn step(&self, node: Node, state: OrchestrationState) -> OrchestrationState {
        match node {
            Node::Entry => enter(state),
            Node::Router => self.router.decide(&state).await.apply(state),
            Node::Planner | Node::Social | Node::Platform => match node.specialist() {
                Some(kind) => self.dispatch(kind, state).await,
                None => state,
            },
            Node::ErrorHandler => error_handler::handle(state),
            Node::Output => output::finalize(state),
        }
    }

    async fn dispatch(&self, kind: SpecialistKind, state: OrchestrationState) -> OrchestrationState {
        let task = state
            .current_task_description()
            .map(str::trim)
            .unwrap_or_default()
            .to_string();
        if task.is_empty() {
            let err = OrchestratorError::Dispatch(format!(
                "No task description provided for {} Agent.",
                kind.display_name()
            ));
            tracing::warn!("{}", err);
            return state.with_error(kind.name(), err);
        }

        let response = self
            .specialists
            .get(kind)
            .invoke(&task, Some(state.session_id()))
            .await;

        match response.error {
            Some(err) => {
                tracing::warn!("Specialist '{}' failed: {}", kind, err);
                state.with_error(kind.name(), OrchestratorError::Dispatch(err))
            }
            None => state.with_specialist_output(kind.name(), response.output),
        }
    }
}

/// 入口节点：校验请求
fn enter(state: OrchestrationState) -> OrchestrationState {
    if !state.has_user_request() {
        let err = OrchestratorError::InputMissing;
        tracing::warn!(kind = err.kind(), "{}", err);
        return state.with_error(Node::Entry.as_str(), err);
    }
    tracing::info!(
        "Received request: '{}'",
        state.user_request().chars().take(200).collect::<String>()
    );
    state.entered()
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic with non-string payload".to_string()
    }
}
