//! 路由回复解析：去掉代码围栏，解析 JSON，校验 next_node 是否属于封闭集合
//!
//! 任何失败都不重试，直接返回带原始回复的 Routing 错误。

use serde_json::Value;

use crate::core::{OrchestratorError, Route};

/// 解析成功的路由决定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedDecision {
    pub route: Route,
    pub task_description: String,
}

/// 去掉 ```json ... ``` 或 ``` ... ``` 包裹
pub fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let inner = if let Some(rest) = trimmed.strip_prefix("```json") {
        rest
    } else if let Some(rest) = trimmed.strip_prefix("```") {
        rest
    } else {
        return trimmed;
    };
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

/// 解析路由 LLM 的回复；任务描述缺失时回退为原始请求
pub fn parse_decision(raw: &str, user_request: &str) -> Result<ParsedDecision, OrchestratorError> {
    let body = strip_code_fence(raw);

    let value: Value = serde_json::from_str(body).map_err(|e| {
        OrchestratorError::Routing(format!(
            "Router LLM did not return valid JSON. Error: {e}. Raw output: {}",
            raw.trim()
        ))
    })?;

    let Some(obj) = value.as_object() else {
        return Err(OrchestratorError::Routing(format!(
            "Router LLM response is not a JSON object. Raw output: {}",
            raw.trim()
        )));
    };

    let task_description = obj
        .get("current_task_description_for_next_node")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(user_request)
        .to_string();

    let route = match obj.get("next_node") {
        Some(Value::String(name)) => name.parse::<Route>().ok(),
        _ => None,
    };
    let Some(route) = route else {
        let shown = match obj.get("next_node") {
            None => "null".to_string(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        };
        return Err(OrchestratorError::Routing(format!(
            "Router LLM decided an invalid or missing route: '{shown}'. Valid routes are: {}. Raw output: {}",
            Route::valid_values(),
            raw.trim()
        )));
    };

    Ok(ParsedDecision {
        route,
        task_description,
    })
}
