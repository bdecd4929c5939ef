//! 编排集成测试：用脚本化后端驱动完整的 规划 -> 执行 -> 重规划 循环

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use planexec::config::AppConfig;
    use planexec::core::{Orchestrator, OrchestratorBuilder, Termination};
    use planexec::engine::LoopEvent;
    use planexec::llm::ScriptedLlmClient;
    use planexec::plan::StepStatus;
    use planexec::tools::{EchoTool, ToolRegistry};

    fn orchestrator(llm: Arc<ScriptedLlmClient>, max_steps: usize) -> Orchestrator {
        let mut cfg = AppConfig::default();
        cfg.app.max_steps = max_steps;
        OrchestratorBuilder::new(cfg, Arc::new(ToolRegistry::new().with(EchoTool)))
            .with_llm(llm)
            .build()
            .unwrap()
    }

    const ONE_STEP_PLAN: &str =
        r#"{"original_goal": "What is 2+2?", "steps": [{"id": 1, "description": "Compute 2+2", "action_type": "LLM"}]}"#;

    #[tokio::test]
    async fn test_simple_arithmetic_finishes_with_answer() {
        let llm = Arc::new(ScriptedLlmClient::with_replies([
            ONE_STEP_PLAN,
            r#"{"content": "4"}"#,
            r#"{"final_answer": "4"}"#,
        ]));
        let state = orchestrator(llm.clone(), 10).run("What is 2+2?").await;

        assert_eq!(state.final_answer(), Some("4"));
        assert_eq!(state.termination(), Some(Termination::FinalAnswer));
        assert_eq!(state.history().len(), 1);
        assert_eq!(state.history()[0].result().raw_output, "4");
        assert_eq!(state.history()[0].step().status, StepStatus::Completed);
        assert_eq!(state.current_plan().steps()[0].status, StepStatus::Completed);
        assert_eq!(state.steps_used(), 1);
        assert_eq!(llm.remaining(), 0);
        assert_eq!(llm.requests().len(), 3);
    }

    #[tokio::test]
    async fn test_missing_tool_fails_step_and_replans() {
        let plan = r#"{"steps": [
            {"id": 1, "description": "Look it up", "action_type": "TOOL", "tool_name": "lookup", "tool_args": {"q": "x"}},
            {"id": 2, "description": "Answer", "action_type": "LLM"}
        ]}"#;
        // 重规划试图把失败的步骤改写成 echo，并追加新步骤
        let revision = r#"{"final_answer": null, "steps": [
            {"id": 1, "description": "Echo instead", "action_type": "TOOL", "tool_name": "echo"},
            {"id": 2, "description": "Answer from knowledge", "action_type": "LLM"}
        ]}"#;
        let llm = Arc::new(ScriptedLlmClient::with_replies([
            plan,
            revision,
            r#"{"content": "x is 42"}"#,
            r#"{"final_answer": "42"}"#,
        ]));
        let state = orchestrator(llm, 10).run("what is x").await;

        assert_eq!(state.final_answer(), Some("42"));
        assert_eq!(state.history().len(), 2);

        let failed = state.history()[0].result();
        assert!(!failed.is_success);
        assert_eq!(failed.tool_name.as_deref(), Some("lookup"));
        assert!(failed.error_message.as_deref().unwrap_or_default().contains("lookup"));
        assert_eq!(state.last_error(), failed.error_message.as_deref());

        // 失败的步骤在重规划后保持原样
        let step1 = state.current_plan().step(1).unwrap();
        assert_eq!(step1.status, StepStatus::Failed);
        assert_eq!(step1.description, "Look it up");
        assert_eq!(step1.tool_name(), Some("lookup"));

        let step2 = state.current_plan().step(2).unwrap();
        assert_eq!(step2.description, "Answer from knowledge");
        assert_eq!(step2.status, StepStatus::Completed);
    }

    #[tokio::test]
    async fn test_budget_exhausted_with_failing_backend_still_answers() {
        // 脚本为空：每次后端调用都失败
        let llm = Arc::new(ScriptedLlmClient::new());
        let state = orchestrator(llm.clone(), 1).run("anything").await;

        let answer = state.final_answer().unwrap();
        assert!(!answer.is_empty());
        assert!(answer.starts_with("Final summary failed"));
        assert_eq!(state.termination(), Some(Termination::SummaryFailed));
        assert_eq!(state.history().len(), 1);
        assert!(!state.history()[0].result().is_success);
        assert_eq!(state.steps_used(), 1);
        // 初始规划、执行、重规划、兜底总结
        assert_eq!(llm.requests().len(), 4);
    }

    #[tokio::test]
    async fn test_budget_summary_when_replanner_never_concludes() {
        let plan = r#"{"steps": [
            {"id": 1, "description": "a", "action_type": "LLM"},
            {"id": 2, "description": "b", "action_type": "LLM"},
            {"id": 3, "description": "c", "action_type": "LLM"}
        ]}"#;
        let llm = Arc::new(ScriptedLlmClient::with_replies([
            plan,
            r#"{"content": "A"}"#,
            "not json",
            r#"{"content": "B"}"#,
            "not json",
            "Summary from partial results.",
        ]));
        let state = orchestrator(llm, 2).run("abc").await;

        assert_eq!(state.final_answer(), Some("Summary from partial results."));
        assert_eq!(state.termination(), Some(Termination::BudgetSummary));
        assert_eq!(state.history().len(), 2);
        assert_eq!(state.steps_used(), 2);
        assert_eq!(state.current_plan().step(3).unwrap().status, StepStatus::Pending);
    }

    #[tokio::test]
    async fn test_replans_when_no_step_is_actionable() {
        let llm = Arc::new(ScriptedLlmClient::with_replies([
            ONE_STEP_PLAN,
            r#"{"content": "4"}"#,
            // 只回传已完成的步骤，没有最终答案
            r#"{"steps": [{"id": 1, "description": "Compute 2+2", "action_type": "LLM"}]}"#,
            r#"{"final_answer": "The answer is 4"}"#,
        ]));
        let state = orchestrator(llm.clone(), 10).run("What is 2+2?").await;

        assert_eq!(state.final_answer(), Some("The answer is 4"));
        assert_eq!(state.termination(), Some(Termination::FinalAnswer));
        assert_eq!(state.history().len(), 1);
        assert_eq!(state.steps_used(), 2);
        assert_eq!(llm.remaining(), 0);
    }

    #[tokio::test]
    async fn test_failed_initial_plan_uses_fallback_step() {
        let llm = Arc::new(ScriptedLlmClient::with_replies([
            r#"{"steps": []}"#,
            r#"{"content": "4"}"#,
            r#"{"final_answer": "4"}"#,
        ]));
        let state = orchestrator(llm, 10).run("What is 2+2?").await;

        assert_eq!(state.final_answer(), Some("4"));
        let first = &state.history()[0];
        assert_eq!(first.step().description, "Directly solve the problem: What is 2+2?");
    }

    #[tokio::test]
    async fn test_events_follow_loop_progress() {
        let llm = Arc::new(ScriptedLlmClient::with_replies([
            ONE_STEP_PLAN,
            r#"{"content": "4"}"#,
            r#"{"final_answer": "4"}"#,
        ]));
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let orch = orchestrator(llm, 10).with_event_tx(tx);
        orch.run("What is 2+2?").await;
        drop(orch);

        let mut events = Vec::new();
        while let Some(ev) = rx.recv().await {
            events.push(ev);
        }
        assert_eq!(events.len(), 5);
        assert!(matches!(events[0], LoopEvent::PlanCreated { steps: 1, fallback: false }));
        assert!(matches!(
            events[1],
            LoopEvent::StepStarted { id: 1, budget_used: 0, max_steps: 10, .. }
        ));
        assert!(matches!(events[2], LoopEvent::StepFinished { id: 1, success: true, .. }));
        assert!(matches!(events[3], LoopEvent::Replanned { final_answer: true, .. }));
        match &events[4] {
            LoopEvent::Finished { answer, termination } => {
                assert_eq!(answer, "4");
                assert_eq!(*termination, Termination::FinalAnswer);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_plan_created_event_reports_real_fallback() {
        let plan = r#"{"steps": [{"id": 1, "description": "Directly solve the problem: q", "action_type": "LLM"}]}"#;
        let llm = Arc::new(ScriptedLlmClient::with_replies([
            plan,
            r#"{"content": "a"}"#,
            r#"{"final_answer": "a"}"#,
        ]));
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let orch = orchestrator(llm, 10).with_event_tx(tx);
        orch.run("q").await;
        drop(orch);

        let first = rx.recv().await.unwrap();
        assert!(matches!(first, LoopEvent::PlanCreated { steps: 1, fallback: false }));

        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let orch = orchestrator(Arc::new(ScriptedLlmClient::new()), 1).with_event_tx(tx);
        orch.run("q").await;
        drop(orch);

        let first = rx.recv().await.unwrap();
        assert!(matches!(first, LoopEvent::PlanCreated { steps: 1, fallback: true }));
    }
}
