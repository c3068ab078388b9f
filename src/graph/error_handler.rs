//! 错误处理节点：把 error_message 转为终止载荷 {error, details}

use serde_json::json;

use crate::core::OrchestrationState;

pub const HALTED_DETAILS: &str = "Processing was halted due to an error.";

const UNSPECIFIED_ERROR: &str = "An unspecified error occurred and was routed to error_handler.";

pub fn handle(state: OrchestrationState) -> OrchestrationState {
    let message = state
        .error_message()
        .unwrap_or(UNSPECIFIED_ERROR)
        .to_string();
    tracing::error!(error = %message, "Error handler halting orchestration");
    state.with_error_payload(json!({
        "error": message,
        "details": HALTED_DETAILS,
    }))
}
