//! Mock LLM 客户端（无需 API）
//!
//! - MockLlmClient：总是选择 final_responder，便于本地跑通 HTTP 入口
//! - ScriptedLlmClient：按顺序回放预置回复并记录收到的 prompt，供测试驱动路由器

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::llm::{LlmClient, LlmError, Message, Role};

/// Mock 客户端：直接结束编排，把最后一条 User 消息的前 80 字符写进说明
#[derive(Debug, Default)]
pub struct MockLlmClient;

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, messages: &[Message]) -> Result<String, LlmError> {
        let last_user = messages
            .iter()
            .rev()
            .find(|m| matches!(m.role, Role::User))
            .map(|m| m.content.chars().take(80).collect::<String>())
            .unwrap_or_else(|| "(no input)".to_string());

        Ok(serde_json::json!({
            "next_node": "final_responder",
            "current_task_description_for_next_node": format!("Mock router finished: {last_user}"),
        })
        .to_string())
    }
}

/// 回放式客户端：回复队列耗尽后重复最后一条
#[derive(Debug, Default)]
pub struct ScriptedLlmClient {
    replies: Mutex<VecDeque<Result<String, LlmError>>>,
    last: Mutex<Option<Result<String, LlmError>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedLlmClient {
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: Mutex::new(replies.into_iter().map(|r| Ok(r.into())).collect()),
            ..Self::default()
        }
    }

    /// 追加一次调用失败
    pub fn then_fail(self, err: LlmError) -> Self {
        if let Ok(mut q) = self.replies.lock() {
            q.push_back(Err(err));
        }
        self
    }

    /// 已收到的 prompt（按调用顺序，取最后一条 User 消息）
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().map(|p| p.len()).unwrap_or(0)
    }
}

#[async_trait]
impl LlmClient for ScriptedLlmClient {
    async fn complete(&self, messages: &[Message]) -> Result<String, LlmError> {
        if let Some(m) = messages.iter().rev().find(|m| matches!(m.role, Role::User)) {
            if let Ok(mut p) = self.prompts.lock() {
                p.push(m.content.clone());
            }
        }

        let next = self.replies.lock().ok().and_then(|mut q| q.pop_front());
        let mut last = self
            .last
            .lock()
            .map_err(|e| LlmError::Api(format!("scripted client poisoned: {e}")))?;
        match next {
            Some(reply) => {
                *last = Some(reply.clone());
                reply
            }
            None => last.clone().unwrap_or(Err(LlmError::EmptyResponse)),
        }
    }
}
