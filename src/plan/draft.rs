//! 后端回复草稿：规划 / 重规划时 LLM 返回的 JSON 结构
//!
//! 用 schemars 生成计划的 JSON Schema 拼入 Planner prompt，减少后端输出格式错误。

use schemars::{schema_for, JsonSchema};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::plan::{Action, PlanError, Step, StepStatus};

/// 步骤动作类型（草稿中的 action_type 字段）
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum ActionKind {
    /// 由语言模型完成的分析 / 推理 / 判断
    #[serde(rename = "LLM", alias = "REASONING")]
    Reasoning,
    /// 调用外部工具
    #[serde(rename = "TOOL")]
    Tool,
}

/// 单个步骤草稿
#[derive(Clone, Debug, Deserialize, JsonSchema)]
pub struct StepDraft {
    /// 从 1 开始严格递增的整数
    pub id: u32,
    /// 该步骤要做的事情，是执行阶段唯一的指令来源
    pub description: String,
    pub action_type: ActionKind,
    /// 仅 TOOL 步骤提供，LLM 步骤为 null
    #[serde(default)]
    pub tool_name: Option<String>,
    /// 仅 TOOL 步骤提供的建议参数（JSON 对象，可为 {}），LLM 步骤为 null
    #[serde(default)]
    pub tool_args: Option<Map<String, Value>>,
}

impl StepDraft {
    /// 转为 PENDING 状态的 Step；TOOL 步骤缺少工具名视为解码失败
    pub fn into_step(self) -> Result<Step, PlanError> {
        let action = match self.action_type {
            ActionKind::Reasoning => Action::Reasoning,
            ActionKind::Tool => match self.tool_name {
                Some(name) if !name.trim().is_empty() => Action::Tool {
                    name: name.trim().to_string(),
                    args: self.tool_args,
                },
                _ => {
                    return Err(PlanError::InvalidStep {
                        id: self.id,
                        reason: "TOOL step without tool_name".to_string(),
                    })
                }
            },
        };
        Ok(Step {
            id: self.id,
            description: self.description,
            status: StepStatus::Pending,
            action,
        })
    }
}

/// 初始计划草稿
#[derive(Clone, Debug, Deserialize, JsonSchema)]
pub struct PlanDraft {
    /// 原始目标（仅回显，不会覆盖真实目标）
    #[serde(default)]
    pub original_goal: Option<String>,
    pub steps: Vec<StepDraft>,
}

/// 重规划草稿：要么给出 final_answer，要么给出修订后的 steps
#[derive(Clone, Debug, Deserialize, JsonSchema)]
pub struct RefineDraft {
    /// 目标已达成时的最终答案，否则为 null
    #[serde(default)]
    pub final_answer: Option<String>,
    /// 修订后的完整步骤序列
    #[serde(default)]
    pub steps: Option<Vec<StepDraft>>,
}

/// 草稿列表整体转为 Step 列表
pub fn steps_from_drafts(drafts: Vec<StepDraft>) -> Result<Vec<Step>, PlanError> {
    drafts.into_iter().map(StepDraft::into_step).collect()
}

/// 初始计划的 JSON Schema（拼入 Planner system prompt）
pub fn plan_schema_json() -> String {
    let schema = schema_for!(PlanDraft);
    serde_json::to_string_pretty(&schema).unwrap_or_default()
}

/// 重规划回复的 JSON Schema
pub fn refine_schema_json() -> String {
    let schema = schema_for!(RefineDraft);
    serde_json::to_string_pretty(&schema).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tool_draft_without_name_is_rejected() {
        let draft: StepDraft = serde_json::from_value(json!({
            "id": 1, "description": "x", "action_type": "TOOL", "tool_name": null
        }))
        .unwrap();
        assert!(matches!(
            draft.into_step(),
            Err(PlanError::InvalidStep { id: 1, .. })
        ));
    }

    #[test]
    fn test_reasoning_alias_accepted() {
        let draft: StepDraft = serde_json::from_value(json!({
            "id": 1, "description": "x", "action_type": "REASONING"
        }))
        .unwrap();
        assert_eq!(draft.into_step().unwrap().action, Action::Reasoning);
    }

    #[test]
    fn test_reasoning_draft_drops_tool_fields() {
        let draft: StepDraft = serde_json::from_value(json!({
            "id": 1, "description": "x", "action_type": "LLM",
            "tool_name": "ignored", "tool_args": {"a": 1}
        }))
        .unwrap();
        let step = draft.into_step().unwrap();
        assert_eq!(step.action, Action::Reasoning);
        assert_eq!(step.status, StepStatus::Pending);
    }

    #[test]
    fn test_schema_mentions_step_fields() {
        let schema = plan_schema_json();
        assert!(schema.contains("action_type"));
        assert!(schema.contains("tool_args"));
        assert!(refine_schema_json().contains("final_answer"));
    }
}
