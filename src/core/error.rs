//! 编排错误分类
//!
//! 除启动阶段的配置错误外，所有错误都在产生它的组件边界被捕获，
//! 转为失败的 StepResult 或结构合法的兜底值（兜底计划、原样返回的计划、建议参数），不会中止主循环。

use thiserror::Error;

use crate::llm::LlmError;
use crate::plan::{PlanError, StepStatus};

#[derive(Error, Debug)]
pub enum AgentError {
    /// 派发时步骤不是 PENDING（防止重复派发）
    #[error("Step {id} is not PENDING, current status is {status}")]
    StepNotPending { id: u32, status: StepStatus },

    #[error("Tool name is missing for TOOL step {0}")]
    ToolNameMissing(u32),

    #[error("Tool '{0}' not found")]
    ToolNotFound(String),

    /// 非致命：回退到 Planner 建议的参数
    #[error("Argument synthesis failed for tool '{tool}': {reason}")]
    ArgumentSynthesis { tool: String, reason: String },

    #[error("Tool execution failed: {0}")]
    ToolInvocation(String),

    /// 后端调用失败或回复 JSON 无法解析
    #[error("LLM execution failed: {0}")]
    ReasoningCall(String),

    #[error("Plan decode failed: {0}")]
    PlanDecode(String),

    #[error("Config error: {0}")]
    Config(String),
}

impl From<LlmError> for AgentError {
    fn from(e: LlmError) -> Self {
        AgentError::ReasoningCall(e.to_string())
    }
}

impl From<PlanError> for AgentError {
    fn from(e: PlanError) -> Self {
        AgentError::PlanDecode(e.to_string())
    }
}
