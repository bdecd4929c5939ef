//! 编排器：主控循环
//!
//! create_initial_plan -> 循环 { 取下一个可执行步骤 -> Executor 执行 -> 记录历史 -> refine_plan 替换计划 }，
//! 直到计划给出最终答案或步数预算耗尽；预算耗尽时强制兜底总结，保证返回的计划一定带最终答案。
//! 同一时刻只有一个后端 / 工具调用在进行，步骤之间、执行与重规划之间都不重叠。

use tokio::sync::mpsc::UnboundedSender;
use tracing::Instrument;

use crate::core::{AgentState, Termination};
use crate::engine::events::{preview, send_event};
use crate::engine::{Executor, LoopEvent, Planner};
use crate::plan::{StepRecord, StepStatus};

/// 默认最大循环次数
pub const DEFAULT_MAX_STEPS: usize = 10;

pub struct Orchestrator {
    planner: Planner,
    executor: Executor,
    max_steps: usize,
    event_tx: Option<UnboundedSender<LoopEvent>>,
}

impl Orchestrator {
    pub fn new(planner: Planner, executor: Executor, max_steps: usize) -> Self {
        Self {
            planner,
            executor,
            max_steps,
            event_tx: None,
        }
    }

    /// 设置事件推送通道
    pub fn with_event_tx(mut self, tx: UnboundedSender<LoopEvent>) -> Self {
        self.event_tx = Some(tx);
        self
    }

    pub fn max_steps(&self) -> usize {
        self.max_steps
    }

    /// 后端累计 token 使用：(prompt, completion, total)
    pub fn token_usage(&self) -> (u64, u64, u64) {
        self.executor.token_usage()
    }

    /// 运行一次完整编排；总是返回带最终答案的 AgentState
    pub async fn run(&self, problem: &str) -> AgentState {
        let run_id = uuid::Uuid::new_v4();
        self.run_inner(problem)
            .instrument(tracing::info_span!("run", %run_id))
            .await
    }

    async fn run_inner(&self, problem: &str) -> AgentState {
        let (plan, fallback) = self.planner.initial_plan(problem).await;
        send_event(
            &self.event_tx,
            LoopEvent::PlanCreated {
                steps: plan.steps().len(),
                fallback,
            },
        );
        let mut state = AgentState::new(problem, plan);

        while !state.is_task_completed() && state.steps_used < self.max_steps {
            let budget_used = state.steps_used;
            let AgentState {
                current_plan,
                history,
                last_error,
                ..
            } = &mut state;

            let Some(step) = current_plan.next_actionable_step_mut() else {
                // 所有步骤已是终态但还没有最终答案：只重规划，不执行
                tracing::info!("No actionable step left, replanning");
                *current_plan = self.planner.refine_plan(current_plan, history).await;
                state.steps_used += 1;
                self.emit_replanned(&state);
                continue;
            };

            send_event(
                &self.event_tx,
                LoopEvent::StepStarted {
                    id: step.id,
                    description: step.description.clone(),
                    budget_used,
                    max_steps: self.max_steps,
                },
            );

            let result = self.executor.execute(step, history).await;
            tracing::info!(
                step_id = step.id,
                success = result.is_success,
                "Step finished: {}",
                preview(result.display_text())
            );
            send_event(
                &self.event_tx,
                LoopEvent::StepFinished {
                    id: step.id,
                    success: result.is_success,
                    preview: preview(result.display_text()),
                },
            );

            if result.is_success {
                step.status = StepStatus::Completed;
            } else {
                step.status = StepStatus::Failed;
                *last_error = result.error_message.clone();
            }
            history.push(StepRecord::new(step.clone(), result));

            if current_plan.is_terminal() {
                break;
            }

            *current_plan = self.planner.refine_plan(current_plan, history).await;
            state.steps_used += 1;
            self.emit_replanned(&state);
        }

        if state.is_task_completed() {
            state.termination = Some(Termination::FinalAnswer);
        } else {
            tracing::warn!(
                steps_used = state.steps_used,
                max_steps = self.max_steps,
                "Step budget exhausted without a final answer"
            );
            let summary = self
                .executor
                .summary_final(&state.problem, &state.history)
                .await;
            let (answer, termination) = if summary.is_success {
                (summary.raw_output, Termination::BudgetSummary)
            } else {
                (
                    summary
                        .error_message
                        .unwrap_or_else(|| "Final summary failed".to_string()),
                    Termination::SummaryFailed,
                )
            };
            state.current_plan.set_final_answer(answer);
            state.termination = Some(termination);
        }

        let answer = state.final_answer().unwrap_or_default().to_string();
        tracing::info!(
            history = state.history.len(),
            steps_used = state.steps_used,
            "Run finished"
        );
        if let Some(termination) = state.termination {
            send_event(&self.event_tx, LoopEvent::Finished { answer, termination });
        }
        state
    }

    fn emit_replanned(&self, state: &AgentState) {
        send_event(
            &self.event_tx,
            LoopEvent::Replanned {
                steps: state.current_plan.steps().len(),
                final_answer: state.is_task_completed(),
            },
        );
    }
}
