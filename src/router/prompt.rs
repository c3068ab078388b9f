//! 路由 prompt 组装
//!
//! system 部分固定（角色、可选节点、输出格式与示例），user 部分逐轮填入
//! 原始请求、上一步输出（JSON）以及上一步错误（若有）。

use serde_json::Value;

use crate::core::OrchestrationState;
use crate::llm::Message;

pub const ROUTER_SYSTEM_PROMPT: &str = r#"You are the orchestrator of a team of specialist agents. Each turn you read the user's request and the output of the step that ran last, then choose exactly one next node.

Available nodes:
- "planner": produces event and outing plan suggestions. Give it a self-contained task with dates, location, interests and how many suggestions to return when the request provides them.
- "social": analyses people, profiles and posts on the social platform (who is friends with whom, what someone is interested in, summaries of recent activity).
- "platform": performs actions on the social platform, such as creating a post or an event on behalf of a user.
- "final_responder": the request is fully handled and the last output is what the user should see, or the request cannot be handled and you want to tell the user why (for example, it is too vague).
- "error_handler": the previous steps left the work in a broken or incoherent state that cannot be recovered.

A request may need several steps (for example: look up a profile with "social", then write a post about it with "platform"). Choose one step at a time; you will be called again after it runs.

When you pick a specialist, the task you give it must be understandable on its own, because the specialist does not see the user's request. For "final_responder" and "error_handler" the task is a short justification or a message for the user.

Reply with a single JSON object and nothing else:
{"next_node": "<node>", "current_task_description_for_next_node": "<task>"}

Example, fresh request:
User Request: I want a plan for Paris this weekend for an anniversary.
Intermediate Output: None
{"next_node": "planner", "current_task_description_for_next_node": "Plan a romantic anniversary weekend in Paris for the upcoming weekend. Include 2-3 suggestions."}

Example, planner already answered:
User Request: I want a plan for Paris this weekend for an anniversary.
Intermediate Output: {"fun_plans": [...]}
{"next_node": "final_responder", "current_task_description_for_next_node": "The planner has generated event suggestions. Ready to show user."}

Example, request too vague:
User Request: I want a plan.
Intermediate Output: None
{"next_node": "final_responder", "current_task_description_for_next_node": "The request 'I want a plan' is too vague. Please provide a location, dates and interests."}"#;

/// intermediate_output 的文本形式；None 时为 "None"
pub fn render_intermediate_output(output: Option<&Value>) -> String {
    match output {
        None => "None".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(v) => serde_json::to_string(v).unwrap_or_else(|e| {
            tracing::warn!("Intermediate output is not serializable ({}), using debug form", e);
            format!("{v:?}")
        }),
    }
}

/// 本轮的 user 消息
pub fn render_state(state: &OrchestrationState) -> String {
    let mut prompt = format!(
        "User Request: {}\nIntermediate Output: {}\n",
        state.user_request(),
        render_intermediate_output(state.intermediate_output())
    );
    if let Some(err) = state.error_message() {
        prompt.push_str(&format!("Previous Step Error: {err}\n"));
    }
    prompt.push_str("Your JSON Response:");
    prompt
}

/// 完整消息列表：system + user
pub fn build_messages(state: &OrchestrationState) -> Vec<Message> {
    vec![
        Message::system(ROUTER_SYSTEM_PROMPT),
        Message::user(render_state(state)),
    ]
}
