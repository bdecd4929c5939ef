//! AgentState：一次编排的完整状态视图，可序列化保存
//!
//! 主循环独占并且是 history 的唯一写入者；current_plan 在每次重规划后整体替换。

use serde::{Deserialize, Serialize};

use crate::plan::{Plan, StepRecord};

/// 循环结束方式，用于区分真正的答案与兜底答案
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// 重规划判定目标达成
    FinalAnswer,
    /// 预算耗尽，兜底总结成功
    BudgetSummary,
    /// 预算耗尽且兜底总结也失败，最终答案是错误描述
    SummaryFailed,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AgentState {
    pub(crate) problem: String,
    pub(crate) current_plan: Plan,
    #[serde(default)]
    pub(crate) history: Vec<StepRecord>,
    #[serde(default)]
    pub(crate) last_error: Option<String>,
    #[serde(default)]
    pub(crate) termination: Option<Termination>,
    /// 已消耗的步数预算
    #[serde(default)]
    pub(crate) steps_used: usize,
}

impl AgentState {
    pub fn new(problem: impl Into<String>, current_plan: Plan) -> Self {
        Self {
            problem: problem.into(),
            current_plan,
            history: Vec::new(),
            last_error: None,
            termination: None,
            steps_used: 0,
        }
    }

    pub fn problem(&self) -> &str {
        &self.problem
    }

    pub fn current_plan(&self) -> &Plan {
        &self.current_plan
    }

    pub fn history(&self) -> &[StepRecord] {
        &self.history
    }

    /// 最近一次失败信息（仅供参考）
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn termination(&self) -> Option<Termination> {
        self.termination
    }

    pub fn steps_used(&self) -> usize {
        self.steps_used
    }

    pub fn final_answer(&self) -> Option<&str> {
        self.current_plan.final_answer()
    }

    pub fn is_task_completed(&self) -> bool {
        self.current_plan.final_answer().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::{Step, StepResult, StepStatus};

    #[test]
    fn test_completion_follows_final_answer() {
        let mut state = AgentState::new("q", Plan::fallback("q"));
        assert!(!state.is_task_completed());
        state.current_plan = state.current_plan.clone().with_final_answer("a");
        assert!(state.is_task_completed());
        assert_eq!(state.final_answer(), Some("a"));
    }

    #[test]
    fn test_state_round_trips_through_json() {
        let mut state = AgentState::new("q", Plan::fallback("q"));
        state.history.push(StepRecord::new(
            Step::reasoning(1, "x").with_status(StepStatus::Completed),
            StepResult::success("y", None),
        ));
        state.termination = Some(Termination::BudgetSummary);
        let text = serde_json::to_string(&state).unwrap();
        let back: AgentState = serde_json::from_str(&text).unwrap();
        assert_eq!(back, state);
    }
}
