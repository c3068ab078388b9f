//! 输出节点：按优先级选出载荷并序列化为 final_output
//!
//! 优先级：intermediate_output 本身是错误载荷 > error_message > intermediate_output > 空结果提示。
//! 对象与数组序列化为紧凑 JSON（键按字典序），字符串原样输出；本函数不会失败。

use serde_json::{json, Map, Value};

use crate::core::OrchestrationState;

const IN_FLIGHT_DETAILS: &str = "An error occurred during processing.";
const NO_OUTPUT_MESSAGE: &str = "Processing completed with no specific output or error provided.";

/// 选出最终载荷
pub fn select_payload(state: &OrchestrationState) -> Value {
    let intermediate = state.intermediate_output();

    if let Some(payload) = intermediate.filter(|v| is_error_payload(v)) {
        return payload.clone();
    }

    if let Some(err) = state.error_message() {
        let mut payload = Map::new();
        payload.insert("error".to_string(), Value::String(err.to_string()));
        payload.insert(
            "details".to_string(),
            Value::String(IN_FLIGHT_DETAILS.to_string()),
        );
        if let Some(last) = intermediate.filter(|v| !v.is_null()) {
            payload.insert("last_known_output".to_string(), last.clone());
        }
        return Value::Object(payload);
    }

    match intermediate {
        Some(v) if !v.is_null() => v.clone(),
        _ => json!({ "message": NO_OUTPUT_MESSAGE }),
    }
}

/// 载荷转文本
pub fn render(payload: &Value) -> String {
    match payload {
        Value::String(s) => s.clone(),
        other => serde_json::to_string(other).unwrap_or_else(|e| {
            tracing::error!("Failed to serialize final payload: {}", e);
            json!({
                "error": "Output serialization error",
                "details": e.to_string(),
            })
            .to_string()
        }),
    }
}

pub fn format(state: &OrchestrationState) -> String {
    render(&select_payload(state))
}

/// 写入 final_output
pub fn finalize(state: OrchestrationState) -> OrchestrationState {
    let final_output = format(&state);
    tracing::info!(
        "Final output: {}",
        final_output.chars().take(200).collect::<String>()
    );
    state.finalized(final_output)
}

fn is_error_payload(value: &Value) -> bool {
    value
        .as_object()
        .map(|o| o.contains_key("error"))
        .unwrap_or(false)
}
