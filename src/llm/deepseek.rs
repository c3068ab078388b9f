//! DeepSeek API 客户端（OpenAI 兼容格式）
//!
//! - Base URL: https://api.deepseek.com
//! - 模型: deepseek-chat（路由决策只需常规对话模型）

use crate::llm::OpenAiClient;

pub const DEEPSEEK_BASE_URL: &str = "https://api.deepseek.com";
pub const DEEPSEEK_CHAT: &str = "deepseek-chat";

/// 创建 DeepSeek 客户端；model 为空时用 deepseek-chat，base_url 为空时用官方地址
pub fn create_deepseek_client(
    base_url: Option<&str>,
    model: Option<&str>,
    api_key: &str,
) -> OpenAiClient {
    let model = model.unwrap_or(DEEPSEEK_CHAT);
    let base_url = base_url
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .unwrap_or(DEEPSEEK_BASE_URL);
    OpenAiClient::new(Some(base_url), model, api_key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_endpoint() {
        let client = create_deepseek_client(None, None, "sk-test");
        assert_eq!(client.base_url(), DEEPSEEK_BASE_URL);
        assert_eq!(client.model(), DEEPSEEK_CHAT);

        let client = create_deepseek_client(Some("  "), None, "sk-test");
        assert_eq!(client.base_url(), DEEPSEEK_BASE_URL);
    }

    #[test]
    fn test_base_url_override() {
        let client = create_deepseek_client(Some("http://proxy.internal/v1"), Some("deepseek-reasoner"), "sk-test");
        assert_eq!(client.base_url(), "http://proxy.internal/v1");
        assert_eq!(client.model(), "deepseek-reasoner");
    }
}
