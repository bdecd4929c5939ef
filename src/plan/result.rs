//! 单步执行结果与历史记录
//!
//! StepResult 创建后不再修改；StepRecord 是 (执行时的 Step, 结果) 的不可变快照，只追加到历史。

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::plan::Step;

/// 一次执行尝试的结果
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StepResult {
    pub is_success: bool,
    /// LLM / 工具的原始文本输出，失败时为空
    #[serde(default)]
    pub raw_output: String,
    /// 结构化输出：解析出的 JSON，或包装后的标量（{"result": ...}）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structured_output: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
}

impl StepResult {
    pub fn success(raw_output: impl Into<String>, structured_output: Option<Value>) -> Self {
        Self {
            is_success: true,
            raw_output: raw_output.into(),
            structured_output,
            error_message: None,
            tool_name: None,
        }
    }

    pub fn failure(error_message: impl Into<String>) -> Self {
        Self {
            is_success: false,
            raw_output: String::new(),
            structured_output: None,
            error_message: Some(error_message.into()),
            tool_name: None,
        }
    }

    /// 回显工具名（TOOL 步骤）
    pub fn with_tool(mut self, tool_name: impl Into<String>) -> Self {
        self.tool_name = Some(tool_name.into());
        self
    }

    /// 展示用文本：成功取 raw_output，失败取错误信息
    pub fn display_text(&self) -> &str {
        if self.is_success {
            &self.raw_output
        } else {
            self.error_message.as_deref().unwrap_or("")
        }
    }
}

/// 历史记录：执行时的 Step 快照与其结果
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    step: Step,
    result: StepResult,
}

impl StepRecord {
    pub fn new(step: Step, result: StepResult) -> Self {
        Self { step, result }
    }

    pub fn step(&self) -> &Step {
        &self.step
    }

    pub fn result(&self) -> &StepResult {
        &self.result
    }
}
