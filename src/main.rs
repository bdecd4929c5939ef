//! Planexec 命令行入口
//!
//! 初始化日志、加载配置、注册工具并构建编排器，对给定问题运行一次完整编排，打印过程事件与最终答案。

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use planexec::{
    config::load_config,
    core::OrchestratorBuilder,
    engine::LoopEvent,
    observability,
    tools::{EchoTool, ToolRegistry},
};

#[derive(Debug, Parser)]
#[command(name = "planexec", about = "Plan-and-Execute task orchestration")]
struct Cli {
    /// 配置文件（覆盖 config/default.toml 中的键）
    #[arg(long)]
    config: Option<PathBuf>,
    /// 要解决的问题
    #[arg(value_name = "PROBLEM", required = true)]
    problem: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    observability::init();
    let cli = Cli::parse();
    let problem = cli.problem.join(" ");

    let cfg = load_config(cli.config).context("Failed to load config")?;
    let tools = Arc::new(ToolRegistry::new().with(EchoTool));

    let (event_tx, mut event_rx) = tokio::sync::mpsc::unbounded_channel::<LoopEvent>();
    let orchestrator = OrchestratorBuilder::new(cfg, tools)
        .build()
        .context("Failed to build orchestrator")?
        .with_event_tx(event_tx);

    let printer = tokio::spawn(async move {
        while let Some(ev) = event_rx.recv().await {
            match ev {
                LoopEvent::PlanCreated { steps, fallback } => {
                    println!("📋 Plan created: {} step(s){}", steps, if fallback { " (fallback)" } else { "" });
                }
                LoopEvent::StepStarted {
                    id,
                    description,
                    budget_used,
                    max_steps,
                } => {
                    println!("▶ [{}/{}] Step {}: {}", budget_used + 1, max_steps, id, description);
                }
                LoopEvent::StepFinished { id, success, preview } => {
                    let mark = if success { "✓" } else { "✗" };
                    println!("  {} Step {}: {}", mark, id, preview);
                }
                LoopEvent::Replanned { steps, final_answer } => {
                    if !final_answer {
                        println!("🔄 Replanned: {} step(s)", steps);
                    }
                }
                LoopEvent::Finished { .. } => {}
            }
        }
    });

    let state = orchestrator.run(&problem).await;
    let (prompt_tokens, completion_tokens, total_tokens) = orchestrator.token_usage();
    // 关闭事件通道，等打印任务把剩余事件输出完
    drop(orchestrator);
    let _ = printer.await;

    println!();
    println!("{}", state.final_answer().unwrap_or_default());
    if let Some(termination) = state.termination() {
        tracing::info!(
            ?termination,
            steps_used = state.steps_used(),
            prompt_tokens,
            completion_tokens,
            total_tokens,
            "Done"
        );
    }
    Ok(())
}
