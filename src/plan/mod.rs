//! 数据模型：Plan、Step、StepResult、StepRecord 与后端回复草稿
//!
//! Plan 只能通过 `Plan::new` 构造（或反序列化时走同一校验），保证 step id 按位置严格递增。

pub mod draft;
pub mod result;
pub mod step;

pub use draft::{
    plan_schema_json, refine_schema_json, steps_from_drafts, ActionKind, PlanDraft, RefineDraft,
    StepDraft,
};
pub use result::{StepRecord, StepResult};
pub use step::{Action, Step, StepStatus};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Plan 构造失败：id 不满足严格递增
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlanError {
    #[error("step id {id} at position {position} is not greater than previous id {previous}")]
    NonIncreasingIds { position: usize, previous: u32, id: u32 },

    #[error("invalid step {id}: {reason}")]
    InvalidStep { id: u32, reason: String },
}

/// 当前计划视图：有序 Steps + 原始目标 + 可选最终答案（非空即终态）
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPlan")]
pub struct Plan {
    steps: Vec<Step>,
    original_goal: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    final_answer: Option<String>,
}

#[derive(Deserialize)]
struct RawPlan {
    steps: Vec<Step>,
    original_goal: String,
    #[serde(default)]
    final_answer: Option<String>,
}

impl TryFrom<RawPlan> for Plan {
    type Error = PlanError;

    fn try_from(raw: RawPlan) -> Result<Self, Self::Error> {
        let mut plan = Plan::new(raw.original_goal, raw.steps)?;
        plan.final_answer = raw.final_answer;
        Ok(plan)
    }
}

impl Plan {
    pub fn new(original_goal: impl Into<String>, steps: Vec<Step>) -> Result<Self, PlanError> {
        validate_ids(&steps)?;
        Ok(Self {
            steps,
            original_goal: original_goal.into(),
            final_answer: None,
        })
    }

    /// 兜底计划：单个推理步骤，直接尝试解决原始问题
    pub fn fallback(goal: impl Into<String>) -> Self {
        let goal = goal.into();
        Self {
            steps: vec![Step::reasoning(1, format!("Directly solve the problem: {goal}"))],
            original_goal: goal,
            final_answer: None,
        }
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn original_goal(&self) -> &str {
        &self.original_goal
    }

    pub fn final_answer(&self) -> Option<&str> {
        self.final_answer.as_deref()
    }

    /// 已有最终答案，不允许再执行
    pub fn is_terminal(&self) -> bool {
        self.final_answer.is_some()
    }

    pub fn step(&self, id: u32) -> Option<&Step> {
        self.steps.iter().find(|s| s.id == id)
    }

    /// 复用当前 steps，设置最终答案
    pub fn with_final_answer(mut self, answer: impl Into<String>) -> Self {
        self.final_answer = Some(answer.into());
        self
    }

    pub(crate) fn set_final_answer(&mut self, answer: impl Into<String>) {
        self.final_answer = Some(answer.into());
    }

    /// 按顺序返回第一个 PENDING / RUNNING 的步骤。
    ///
    /// FAILED 视为终态：失败的步骤不会被自动重试，只能由重规划插入新 id 的步骤替代。
    pub fn next_actionable_step(&self) -> Option<&Step> {
        self.steps.iter().find(|s| !s.is_terminal())
    }

    pub fn next_actionable_step_mut(&mut self) -> Option<&mut Step> {
        self.steps.iter_mut().find(|s| !s.is_terminal())
    }
}

/// 校验 id 按位置严格递增
pub(crate) fn validate_ids(steps: &[Step]) -> Result<(), PlanError> {
    for (position, pair) in steps.windows(2).enumerate() {
        if pair[1].id <= pair[0].id {
            return Err(PlanError::NonIncreasingIds {
                position: position + 1,
                previous: pair[0].id,
                id: pair[1].id,
            });
        }
    }
    Ok(())
}
