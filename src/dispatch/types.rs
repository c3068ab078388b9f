//! 专家种类与线协议类型
//!
//! 线协议：`POST {base}/agents/{name}/invoke`，请求 `{"query", "session_id"?}`，
//! 响应 `{"output": any|null, "error": string|null}`。

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 专家种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecialistKind {
    Planner,
    Social,
    Platform,
}

impl SpecialistKind {
    pub const ALL: [SpecialistKind; 3] = [
        SpecialistKind::Planner,
        SpecialistKind::Social,
        SpecialistKind::Platform,
    ];

    /// 线协议与日志里的名字
    pub fn name(&self) -> &'static str {
        match self {
            SpecialistKind::Planner => "planner",
            SpecialistKind::Social => "social",
            SpecialistKind::Platform => "platform",
        }
    }

    /// 面向用户的名字（错误信息用）
    pub fn display_name(&self) -> &'static str {
        match self {
            SpecialistKind::Planner => "Planner",
            SpecialistKind::Social => "Social",
            SpecialistKind::Platform => "Platform",
        }
    }

    /// 旧部署沿用的地址环境变量
    pub fn legacy_env_var(&self) -> &'static str {
        match self {
            SpecialistKind::Planner => "PLANNER_AGENT_SERVICE_URL",
            SpecialistKind::Social => "SOCIAL_AGENT_SERVICE_URL",
            SpecialistKind::Platform => "PLATFORM_AGENT_SERVICE_URL",
        }
    }
}

impl fmt::Display for SpecialistKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 调用专家的请求体
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvokeRequest {
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

/// 专家返回的 {output, error} 对；error 非空即视为失败
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpecialistResponse {
    #[serde(default)]
    pub output: Option<Value>,
    #[serde(default)]
    pub error: Option<String>,
}

impl SpecialistResponse {
    pub fn success(output: Value) -> Self {
        Self {
            output: Some(output),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            output: None,
            error: Some(error.into()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_omits_missing_session() {
        let req = InvokeRequest {
            query: "plan".to_string(),
            session_id: None,
        };
        assert_eq!(serde_json::to_value(&req).unwrap(), json!({"query": "plan"}));
    }

    #[test]
    fn test_response_fields_default_to_none() {
        let resp: SpecialistResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(resp, SpecialistResponse::default());
        assert!(!resp.is_error());
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(SpecialistKind::Platform.to_string(), "platform");
        assert_eq!(SpecialistKind::Social.display_name(), "Social");
    }
}
