//! 根据配置创建路由用的 LLM 客户端
//!
//! 与 TUI 版不同：非 mock 后端缺少 API Key 时直接返回 SetupError，服务拒绝启动，
//! 而不是静默退回 Mock。

use std::sync::Arc;

use crate::config::AppConfig;
use crate::core::SetupError;
use crate::llm::{create_deepseek_client, LlmClient, MockLlmClient, OpenAiClient};

const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";

/// 按 provider 选择后端；lookup 用于读取 API Key（生产传 std::env::var）
pub fn create_llm_with<F>(cfg: &AppConfig, lookup: F) -> Result<Arc<dyn LlmClient>, SetupError>
where
    F: Fn(&str) -> Option<String>,
{
    let provider = cfg.llm.provider.trim().to_lowercase();
    let key = |name: &str| lookup(name).filter(|k| !k.trim().is_empty());

    match provider.as_str() {
        "mock" => {
            tracing::warn!("Using Mock LLM router: every request ends at final_responder");
            Ok(Arc::new(MockLlmClient))
        }
        "deepseek" => {
            let api_key = key("DEEPSEEK_API_KEY")
                .or_else(|| key("OPENAI_API_KEY"))
                .ok_or_else(|| {
                    SetupError::MissingCredentials(
                        "provider 'deepseek' needs DEEPSEEK_API_KEY or OPENAI_API_KEY".to_string(),
                    )
                })?;
            let client = deepseek_from_config(cfg, &api_key);
            tracing::info!("Using DeepSeek LLM ({} at {})", client.model(), client.base_url());
            Ok(Arc::new(client))
        }
        "openai" => {
            let api_key = key("OPENAI_API_KEY").ok_or_else(|| {
                SetupError::MissingCredentials(
                    "provider 'openai' needs OPENAI_API_KEY".to_string(),
                )
            })?;
            let model = cfg.llm.model.as_deref().unwrap_or(DEFAULT_OPENAI_MODEL);
            let client = OpenAiClient::new(cfg.llm.base_url.as_deref(), model, &api_key)
                .with_temperature(cfg.llm.temperature)
                .with_timeout(cfg.llm.timeouts.request);
            tracing::info!("Using OpenAI-compatible LLM ({})", model);
            Ok(Arc::new(client))
        }
        other => Err(SetupError::InvalidConfig(format!(
            "unknown llm.provider '{other}' (expected openai, deepseek or mock)"
        ))),
    }
}

/// llm.base_url 同样作用于 DeepSeek（代理或私有部署）
fn deepseek_from_config(cfg: &AppConfig, api_key: &str) -> OpenAiClient {
    create_deepseek_client(cfg.llm.base_url.as_deref(), cfg.llm.model.as_deref(), api_key)
        .with_temperature(cfg.llm.temperature)
        .with_timeout(cfg.llm.timeouts.request)
}

/// 从进程环境读取 API Key
pub fn create_llm_from_config(cfg: &AppConfig) -> Result<Arc<dyn LlmClient>, SetupError> {
    create_llm_with(cfg, |name| std::env::var(name).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(provider: &str) -> AppConfig {
        let mut cfg = AppConfig::default();
        cfg.llm.provider = provider.to_string();
        cfg
    }

    #[test]
    fn test_mock_needs_no_key() {
        assert!(create_llm_with(&cfg("mock"), |_| None).is_ok());
    }

    #[test]
    fn test_missing_key_is_fatal() {
        let err = create_llm_with(&cfg("openai"), |_| None).err().unwrap();
        assert!(matches!(err, SetupError::MissingCredentials(_)));

        let err = create_llm_with(&cfg("deepseek"), |_| Some("  ".to_string()))
            .err()
            .unwrap();
        assert!(matches!(err, SetupError::MissingCredentials(_)));
    }

    #[test]
    fn test_deepseek_accepts_openai_key() {
        let client = create_llm_with(&cfg("DeepSeek"), |name| {
            (name == "OPENAI_API_KEY").then(|| "sk-test".to_string())
        });
        assert!(client.is_ok());
    }

    #[test]
    fn test_deepseek_honours_base_url() {
        let mut cfg = cfg("deepseek");
        cfg.llm.base_url = Some("http://127.0.0.1:9/v1".to_string());
        let client = deepseek_from_config(&cfg, "sk-test");
        assert_eq!(client.base_url(), "http://127.0.0.1:9/v1");

        cfg.llm.base_url = None;
        let client = deepseek_from_config(&cfg, "sk-test");
        assert_eq!(client.base_url(), crate::llm::deepseek::DEEPSEEK_BASE_URL);
    }

    #[test]
    fn test_unknown_provider() {
        let err = create_llm_with(&cfg("llama"), |_| None).err().unwrap();
        assert!(err.to_string().contains("llama"));
    }
}
