//! Planner：初始规划与自适应重规划
//!
//! - create_initial_plan：依据工具目录把目标拆成步骤；任何失败都退化为单步兜底计划
//! - refine_plan：依据当前计划与执行历史，要么给出最终答案，要么给出修订后的步骤序列；
//!   失败时原样返回当前计划。已处于终态的步骤在合并时整体保留。

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::core::AgentError;
use crate::engine::parse::parse_json_as;
use crate::engine::prompts::{render, PromptSet};
use crate::llm::{CompletionRequest, LlmClient, Message};
use crate::plan::{
    plan_schema_json, refine_schema_json, steps_from_drafts, validate_ids, Plan, PlanDraft,
    PlanError, RefineDraft, Step, StepRecord,
};
use crate::tools::ToolRegistry;

pub struct Planner {
    llm: Arc<dyn LlmClient>,
    tools: Arc<ToolRegistry>,
    prompts: Arc<PromptSet>,
}

impl Planner {
    pub fn new(llm: Arc<dyn LlmClient>, tools: Arc<ToolRegistry>, prompts: Arc<PromptSet>) -> Self {
        Self { llm, tools, prompts }
    }

    /// 根据用户目标创建初始计划；后端或解码失败时返回单步推理的兜底计划
    pub async fn create_initial_plan(&self, goal: &str) -> Plan {
        self.initial_plan(goal).await.0
    }

    /// 同 create_initial_plan，另外返回是否使用了兜底计划
    pub async fn initial_plan(&self, goal: &str) -> (Plan, bool) {
        tracing::info!("Creating initial plan for goal: {}", goal);
        match self.try_create(goal).await {
            Ok(plan) => {
                tracing::info!(steps = plan.steps().len(), "Initial plan created");
                (plan, false)
            }
            Err(e) => {
                tracing::error!("Initial planning failed, using fallback plan: {}", e);
                (Plan::fallback(goal), true)
            }
        }
    }

    async fn try_create(&self, goal: &str) -> Result<Plan, AgentError> {
        let catalog = self.tools.catalog();
        let schema = plan_schema_json();
        let system = render(
            &self.prompts.planner,
            &[("tool_list", catalog.as_str()), ("plan_schema", schema.as_str())],
        );
        let messages = vec![Message::system(system), Message::user(goal)];

        let reply = self.llm.complete(&CompletionRequest::json(messages)).await?;
        tracing::debug!(reply = %reply, "planner reply");

        let draft: PlanDraft =
            parse_json_as(&reply).map_err(|e| AgentError::PlanDecode(e.to_string()))?;
        if draft.steps.is_empty() {
            return Err(AgentError::PlanDecode("plan has no steps".to_string()));
        }
        let steps = steps_from_drafts(draft.steps)?;
        Ok(Plan::new(goal, steps)?)
    }

    /// 重规划。返回新的 Plan 值，调用方负责替换 current_plan。
    ///
    /// 已有最终答案的计划原样返回，不再调用后端。
    pub async fn refine_plan(&self, current_plan: &Plan, history: &[StepRecord]) -> Plan {
        if current_plan.is_terminal() {
            return current_plan.clone();
        }
        match self.try_refine(current_plan, history).await {
            Ok(plan) => {
                if plan.is_terminal() {
                    tracing::info!("Replanner declared the goal achieved");
                } else {
                    tracing::info!(steps = plan.steps().len(), "Plan refined");
                }
                plan
            }
            Err(e) => {
                tracing::warn!("Replanning failed, keeping current plan: {}", e);
                current_plan.clone()
            }
        }
    }

    async fn try_refine(&self, current: &Plan, history: &[StepRecord]) -> Result<Plan, AgentError> {
        let plan_json = serde_json::to_string_pretty(current)
            .map_err(|e| AgentError::PlanDecode(e.to_string()))?;
        let history_json = serde_json::to_string_pretty(history)
            .map_err(|e| AgentError::PlanDecode(e.to_string()))?;
        let catalog = self.tools.catalog();
        let schema = refine_schema_json();
        let system = render(
            &self.prompts.replanner,
            &[
                ("goal", current.original_goal()),
                ("plan", plan_json.as_str()),
                ("history", history_json.as_str()),
                ("tool_list", catalog.as_str()),
                ("refine_schema", schema.as_str()),
            ],
        );
        let messages = vec![
            Message::system(system),
            Message::user("Decide whether the goal is achieved, otherwise revise the plan."),
        ];

        let reply = self.llm.complete(&CompletionRequest::json(messages)).await?;
        tracing::debug!(reply = %reply, "replanner reply");

        let draft: RefineDraft =
            parse_json_as(&reply).map_err(|e| AgentError::PlanDecode(e.to_string()))?;

        if let Some(answer) = draft.final_answer.filter(|a| !a.trim().is_empty()) {
            return Ok(current.clone().with_final_answer(answer));
        }

        let drafts = draft.steps.ok_or_else(|| {
            AgentError::PlanDecode("reply has neither final_answer nor steps".to_string())
        })?;
        let revised = steps_from_drafts(drafts)?;
        Ok(merge_revision(current, revised)?)
    }
}

/// 将后端修订的步骤序列与当前计划按 id 合并
///
/// - 旧步骤为终态（COMPLETED / FAILED / SKIPPED）：整体保留旧步骤
/// - 旧步骤非终态：内容取新序列，状态沿用旧值
/// - 新 id：PENDING
/// - 后端遗漏的终态步骤重新插入，最终按 id 排序
pub fn merge_revision(current: &Plan, revised: Vec<Step>) -> Result<Plan, PlanError> {
    validate_ids(&revised)?;

    let previous: HashMap<u32, &Step> = current.steps().iter().map(|s| (s.id, s)).collect();
    let mut merged: Vec<Step> = revised
        .into_iter()
        .map(|new| match previous.get(&new.id) {
            Some(old) if old.is_terminal() => (*old).clone(),
            Some(old) => Step {
                status: old.status,
                ..new
            },
            None => new,
        })
        .collect();

    let present: HashSet<u32> = merged.iter().map(|s| s.id).collect();
    for old in current.steps() {
        if old.is_terminal() && !present.contains(&old.id) {
            tracing::warn!(step_id = old.id, "Replan dropped a finished step, keeping it");
            merged.push(old.clone());
        }
    }
    merged.sort_by_key(|s| s.id);

    Plan::new(current.original_goal(), merged)
}
