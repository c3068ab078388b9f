//! 分发客户端：通过 HTTP 调用专家服务
//!
//! invoke 永不返回 Err：未配置地址、网络错误、超时、非 2xx、非 JSON 全部折叠为
//! `SpecialistResponse.error`，并带上专家名作为来源标签。不做重试。
//! 每次调用输出一行结构化审计日志（JSON），与工具执行器的审计格式一致。

use std::collections::HashMap;
use std::time::{Duration, Instant};

use reqwest::Client;
use serde_json::Value;

use crate::config::SpecialistsSection;
use crate::core::SetupError;
use crate::dispatch::{InvokeRequest, SpecialistKind, SpecialistResponse};

/// 错误详情最大字符数
const MAX_ERROR_DETAIL_CHARS: usize = 500;

/// 专家 HTTP 客户端：启动时构建一次，多请求共享（只读）
#[derive(Debug, Clone)]
pub struct DispatchClient {
    http: Client,
    endpoints: HashMap<SpecialistKind, String>,
    timeout: Duration,
}

impl DispatchClient {
    /// endpoints 为各专家基地址（不含 /agents/... 路径）
    pub fn new(
        endpoints: HashMap<SpecialistKind, String>,
        timeout_secs: u64,
    ) -> Result<Self, SetupError> {
        let timeout = Duration::from_secs(timeout_secs);
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            endpoints,
            timeout,
        })
    }

    pub fn from_config(cfg: &SpecialistsSection) -> Result<Self, SetupError> {
        let endpoints = SpecialistKind::ALL
            .into_iter()
            .filter_map(|kind| cfg.url_for(kind).map(|url| (kind, url.to_string())))
            .collect();
        Self::new(endpoints, cfg.timeout_secs)
    }

    /// 完整调用地址：{base}/agents/{name}/invoke
    pub fn endpoint_url(&self, kind: SpecialistKind) -> Option<String> {
        self.endpoints
            .get(&kind)
            .map(|base| format!("{}/agents/{}/invoke", base.trim_end_matches('/'), kind))
    }

    /// 调用专家并归一化结果
    pub async fn invoke(
        &self,
        kind: SpecialistKind,
        query: &str,
        session_id: Option<&str>,
    ) -> SpecialistResponse {
        let Some(url) = self.endpoint_url(kind) else {
            tracing::error!("Service URL for specialist '{}' is not configured", kind);
            return SpecialistResponse::failure(format!(
                "Dispatch to '{kind}' failed: service URL is not configured ({})",
                kind.legacy_env_var()
            ));
        };

        let start = Instant::now();
        tracing::info!(
            "Invoking specialist '{}' at {} with query: '{}'",
            kind,
            url,
            preview(query, 100)
        );
        let response = self.send(kind, &url, query, session_id).await;

        let duration_ms = start.elapsed().as_millis() as u64;
        let audit = serde_json::json!({
            "event": "dispatch_audit",
            "specialist": kind.name(),
            "url": url,
            "ok": !response.is_error(),
            "duration_ms": duration_ms,
        });
        tracing::info!(audit = %audit.to_string(), "dispatch");
        response
    }

    async fn send(
        &self,
        kind: SpecialistKind,
        url: &str,
        query: &str,
        session_id: Option<&str>,
    ) -> SpecialistResponse {
        let body = InvokeRequest {
            query: query.to_string(),
            session_id: session_id.map(String::from),
        };

        let resp = match self.http.post(url).json(&body).send().await {
            Ok(resp) => resp,
            Err(e) => return SpecialistResponse::failure(self.describe_transport_error(kind, url, &e)),
        };

        let status = resp.status();
        let text = match resp.text().await {
            Ok(text) => text,
            Err(e) => return SpecialistResponse::failure(self.describe_transport_error(kind, url, &e)),
        };

        if !status.is_success() {
            let detail = extract_error_detail(&text);
            tracing::error!(
                "Call to specialist '{}' failed with status {}: {}",
                kind,
                status.as_u16(),
                detail
            );
            return SpecialistResponse::failure(format!(
                "Dispatch to '{kind}' failed (status {}). Details: {detail}",
                status.as_u16()
            ));
        }

        match serde_json::from_str::<Value>(&text) {
            Ok(value) => normalize_success(kind, value),
            Err(e) => {
                tracing::error!(
                    "Failed to decode JSON from specialist '{}': {} (body: {})",
                    kind,
                    e,
                    preview(&text, MAX_ERROR_DETAIL_CHARS)
                );
                SpecialistResponse::failure(format!(
                    "Dispatch to '{kind}' returned a non-JSON response (status {}): {e}",
                    status.as_u16()
                ))
            }
        }
    }

    fn describe_transport_error(&self, kind: SpecialistKind, url: &str, e: &reqwest::Error) -> String {
        if e.is_timeout() {
            tracing::error!("Call to specialist '{}' timed out", kind);
            format!(
                "Dispatch to '{kind}' timed out after {}s",
                self.timeout.as_secs()
            )
        } else {
            tracing::error!("Network error calling specialist '{}' at {}: {}", kind, url, e);
            format!("Dispatch to '{kind}' failed: network error: {e}")
        }
    }
}

/// 2xx 响应：若为 {output, error} 信封则拆开，否则整个响应体即 output
fn normalize_success(kind: SpecialistKind, value: Value) -> SpecialistResponse {
    let is_envelope = value
        .as_object()
        .map(|o| o.contains_key("output") || o.contains_key("error"))
        .unwrap_or(false);
    if !is_envelope {
        return SpecialistResponse::success(value);
    }

    let output = value.get("output").filter(|v| !v.is_null()).cloned();
    let error = match value.get("error") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if s.trim().is_empty() => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(other) => Some(other.to_string()),
    };

    match error {
        Some(err) => SpecialistResponse {
            output,
            error: Some(format!("Specialist '{kind}' reported an error: {err}")),
        },
        None => SpecialistResponse {
            output,
            error: None,
        },
    }
}

/// 非 2xx 响应的错误详情：依次尝试 {"error": {"message"}}、{"error": "..."}、{"detail": ...}，否则截断原文
fn extract_error_detail(body: &str) -> String {
    if let Ok(v) = serde_json::from_str::<Value>(body) {
        match v.get("error") {
            Some(Value::Object(obj)) => {
                if let Some(Value::String(msg)) = obj.get("message") {
                    return msg.clone();
                }
            }
            Some(Value::String(msg)) => return msg.clone(),
            _ => {}
        }
        if let Some(detail) = v.get("detail") {
            return match detail {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
        }
    }
    if body.trim().is_empty() {
        return "empty response body".to_string();
    }
    preview(body, MAX_ERROR_DETAIL_CHARS)
}

fn preview(s: &str, max_chars: usize) -> String {
    if s.chars().count() > max_chars {
        format!("{}...", s.chars().take(max_chars).collect::<String>())
    } else {
        s.to_string()
    }
}
