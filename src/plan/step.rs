//! Step：计划中的最小执行单元
//!
//! Planner 负责生成 Step，Executor 推进其状态；重规划只会替换非终态 Step 的内容。

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Step 执行状态
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StepStatus {
    #[default]
    Pending,
    Running,
    Completed,
    Failed,
    Skipped,
}

impl StepStatus {
    /// 终态：重规划时整体保留，不允许被后端改写
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Skipped)
    }
}

impl std::fmt::Display for StepStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "PENDING",
            Self::Running => "RUNNING",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
            Self::Skipped => "SKIPPED",
        };
        f.write_str(s)
    }
}

/// 动作类型：推理（交给 LLM）或调用工具
///
/// 序列化为 `{"action_type": "LLM"}` 或
/// `{"action_type": "TOOL", "tool_name": "...", "tool_args": {...}}`，与后端的计划格式一致。
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action_type")]
pub enum Action {
    #[serde(rename = "LLM", alias = "REASONING")]
    Reasoning,
    #[serde(rename = "TOOL")]
    Tool {
        #[serde(rename = "tool_name")]
        name: String,
        /// Planner 建议的参数，仅供参考，执行时可被重新生成的参数覆盖
        #[serde(rename = "tool_args", default, skip_serializing_if = "Option::is_none")]
        args: Option<Map<String, Value>>,
    },
}

impl Action {
    pub fn tool(name: impl Into<String>, args: Option<Map<String, Value>>) -> Self {
        Self::Tool {
            name: name.into(),
            args,
        }
    }

    pub fn tool_name(&self) -> Option<&str> {
        match self {
            Self::Reasoning => None,
            Self::Tool { name, .. } => Some(name),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub id: u32,
    pub description: String,
    #[serde(default)]
    pub status: StepStatus,
    #[serde(flatten)]
    pub action: Action,
}

impl Step {
    pub fn reasoning(id: u32, description: impl Into<String>) -> Self {
        Self {
            id,
            description: description.into(),
            status: StepStatus::Pending,
            action: Action::Reasoning,
        }
    }

    pub fn tool(
        id: u32,
        description: impl Into<String>,
        tool_name: impl Into<String>,
        tool_args: Option<Map<String, Value>>,
    ) -> Self {
        Self {
            id,
            description: description.into(),
            status: StepStatus::Pending,
            action: Action::tool(tool_name, tool_args),
        }
    }

    pub fn with_status(mut self, status: StepStatus) -> Self {
        self.status = status;
        self
    }

    pub fn tool_name(&self) -> Option<&str> {
        self.action.tool_name()
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}
