//! 编排过程事件：用于 CLI / 前端展示计划、步骤执行、重规划与最终答案

use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;

use crate::core::Termination;

/// 单步过程事件（可序列化为 JSON 供前端展示）
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LoopEvent {
    /// 初始计划生成完毕
    PlanCreated { steps: usize, fallback: bool },
    /// 开始执行某一步（budget_used 为已消耗的预算）
    StepStarted {
        id: u32,
        description: String,
        budget_used: usize,
        max_steps: usize,
    },
    /// 单步结束（预览，避免过长）
    StepFinished {
        id: u32,
        success: bool,
        preview: String,
    },
    /// 重规划完成
    Replanned { steps: usize, final_answer: bool },
    /// 循环结束
    Finished {
        answer: String,
        termination: Termination,
    },
}

/// 发送事件；没有接收端或接收端已关闭时静默忽略
pub(crate) fn send_event(tx: &Option<UnboundedSender<LoopEvent>>, ev: LoopEvent) {
    if let Some(t) = tx {
        let _ = t.send(ev);
    }
}

/// 预览最大字符数
pub(crate) const PREVIEW_CHARS: usize = 200;

pub(crate) fn preview(text: &str) -> String {
    if text.chars().count() > PREVIEW_CHARS {
        format!("{}...", text.chars().take(PREVIEW_CHARS).collect::<String>())
    } else {
        text.to_string()
    }
}
