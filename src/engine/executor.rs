//! Executor：执行单个步骤
//!
//! 推理步骤交给 LLM（JSON 模式），工具步骤先让 LLM 生成参数再调用工具；
//! 所有失败都在这里转为 `is_success = false` 的 StepResult，不会越过 Executor 边界。

use std::sync::Arc;
use std::time::Instant;

use serde_json::{json, Map, Value};

use crate::core::AgentError;
use crate::engine::events::preview;
use crate::engine::history::render_history;
use crate::engine::parse::parse_json_reply;
use crate::engine::prompts::{render, PromptSet};
use crate::llm::{CompletionRequest, LlmClient, Message};
use crate::plan::{Action, Step, StepRecord, StepResult, StepStatus};
use crate::tools::{Tool, ToolRegistry};

pub struct Executor {
    llm: Arc<dyn LlmClient>,
    tools: Arc<ToolRegistry>,
    prompts: Arc<PromptSet>,
}

impl Executor {
    pub fn new(llm: Arc<dyn LlmClient>, tools: Arc<ToolRegistry>, prompts: Arc<PromptSet>) -> Self {
        Self { llm, tools, prompts }
    }

    /// 后端累计 token 使用：(prompt, completion, total)
    pub fn token_usage(&self) -> (u64, u64, u64) {
        self.llm.token_usage()
    }

    /// 执行一次；history 只读。前置条件：step 为 PENDING，否则立即失败且不改动状态。
    ///
    /// 进入后先置为 RUNNING，结束时置为 COMPLETED 或 FAILED。
    pub async fn execute(&self, step: &mut Step, history: &[StepRecord]) -> StepResult {
        if step.status != StepStatus::Pending {
            let err = AgentError::StepNotPending {
                id: step.id,
                status: step.status,
            };
            tracing::warn!(step_id = step.id, "{}", err);
            return StepResult::failure(err.to_string());
        }
        step.status = StepStatus::Running;

        let tool_name = step.tool_name().map(str::to_string);
        tracing::info!(
            step_id = step.id,
            tool = tool_name.as_deref().unwrap_or("-"),
            "Executing step: {}",
            step.description
        );

        let outcome = match &step.action {
            Action::Reasoning => self.execute_reasoning(step, history).await,
            Action::Tool { name, args } => self.execute_tool(step, name, args.as_ref(), history).await,
        };

        match outcome {
            Ok(result) => {
                step.status = StepStatus::Completed;
                result
            }
            Err(e) => {
                tracing::error!(step_id = step.id, "Execution failed: {}", e);
                step.status = StepStatus::Failed;
                let failure = StepResult::failure(e.to_string());
                match tool_name {
                    Some(name) => failure.with_tool(name),
                    None => failure,
                }
            }
        }
    }

    async fn execute_reasoning(
        &self,
        step: &Step,
        history: &[StepRecord],
    ) -> Result<StepResult, AgentError> {
        let history_text = render_history(history);
        let prompt = render(
            &self.prompts.step,
            &[
                ("current_step", step.description.as_str()),
                ("history", history_text.as_str()),
            ],
        );
        let messages = vec![
            Message::system(prompt),
            Message::user("Execute the current step."),
        ];

        let reply = self.llm.complete(&CompletionRequest::json(messages)).await?;
        tracing::debug!(step_id = step.id, reply = %preview(&reply), "LLM step reply");

        let parsed = parse_json_reply(&reply)
            .map_err(|e| AgentError::ReasoningCall(format!("invalid JSON reply: {e}")))?;

        // 有 content 字段取其文本，否则原样使用整段回复
        let raw_output = match parsed.get("content") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => reply.clone(),
            Some(other) => other.to_string(),
        };
        Ok(StepResult::success(raw_output, Some(wrap_structured(parsed))))
    }

    async fn execute_tool(
        &self,
        step: &Step,
        tool_name: &str,
        suggested_args: Option<&Map<String, Value>>,
        history: &[StepRecord],
    ) -> Result<StepResult, AgentError> {
        if tool_name.trim().is_empty() {
            return Err(AgentError::ToolNameMissing(step.id));
        }
        let tool = self
            .tools
            .get(tool_name)
            .ok_or_else(|| AgentError::ToolNotFound(tool_name.to_string()))?;

        // 参数生成失败不致命：回退到 Planner 建议的参数
        let args = match self.synthesize_args(tool.as_ref(), step, history).await {
            Ok(args) => {
                let shown = Value::Object(args.clone());
                tracing::info!(tool = tool_name, "LLM generated args: {}", shown);
                args
            }
            Err(e) => {
                tracing::warn!("{}, falling back to planner args", e);
                suggested_args.cloned().unwrap_or_default()
            }
        };

        let start = Instant::now();
        let args_preview = preview(&Value::Object(args.clone()).to_string());
        let result = tool.execute(args).await;
        let audit = json!({
            "event": "tool_audit",
            "tool": tool_name,
            "step_id": step.id,
            "ok": result.is_ok(),
            "duration_ms": start.elapsed().as_millis() as u64,
            "args_preview": args_preview,
        });
        tracing::info!(audit = %audit, "tool");

        let value = result.map_err(AgentError::ToolInvocation)?;
        let raw_output = match &value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        let structured = match value {
            Value::Object(_) | Value::Array(_) => value,
            scalar => json!({ "result": scalar }),
        };
        Ok(StepResult::success(raw_output, Some(structured)).with_tool(tool_name))
    }

    /// 让 LLM 依据工具文档、步骤描述与历史生成关键字参数
    async fn synthesize_args(
        &self,
        tool: &dyn Tool,
        step: &Step,
        history: &[StepRecord],
    ) -> Result<Map<String, Value>, AgentError> {
        let synthesis_err = |reason: String| AgentError::ArgumentSynthesis {
            tool: tool.name().to_string(),
            reason,
        };

        let history_text = render_history(history);
        let prompt = render(
            &self.prompts.tool_args,
            &[
                ("tool_name", tool.name()),
                ("tool_doc", tool.description()),
                ("step_description", step.description.as_str()),
                ("history", history_text.as_str()),
            ],
        );
        let messages = vec![
            Message::system(prompt),
            Message::user("Generate the arguments."),
        ];

        let reply = self
            .llm
            .complete(&CompletionRequest::json(messages))
            .await
            .map_err(|e| synthesis_err(e.to_string()))?;
        match parse_json_reply(&reply) {
            Ok(Value::Object(args)) => Ok(args),
            Ok(other) => Err(synthesis_err(format!("expected a JSON object, got {other}"))),
            Err(e) => Err(synthesis_err(e.to_string())),
        }
    }

    /// 步数预算耗尽时的兜底总结：自由文本，不再执行任何步骤或工具
    pub async fn summary_final(&self, query: &str, history: &[StepRecord]) -> StepResult {
        tracing::info!("Max steps reached, generating final summary");
        let history_text = render_history(history);
        let prompt = render(
            &self.prompts.summary,
            &[("query", query), ("history", history_text.as_str())],
        );
        let messages = vec![
            Message::system(prompt),
            Message::user("Give the final answer."),
        ];

        match self.llm.complete(&CompletionRequest::text(messages)).await {
            Ok(content) => {
                let structured = json!({ "final_answer": content });
                StepResult::success(content, Some(structured))
            }
            Err(e) => {
                tracing::error!("Final summary failed: {}", e);
                StepResult::failure(format!("Final summary failed: {e}"))
            }
        }
    }
}

/// 非对象的 JSON 值包装为 {"result": value}
fn wrap_structured(value: Value) -> Value {
    match value {
        Value::Object(_) => value,
        other => json!({ "result": other }),
    }
}
