//! 执行历史的文本渲染（拼入推理 / 参数生成 / 总结 prompt）

use crate::plan::StepRecord;

/// 空历史的显式占位，避免后端把「没有历史」误解为「历史被省略」
pub const EMPTY_HISTORY: &str = "none";

/// 每条记录渲染为 "Step <id>: <description>\nResult: <raw_output>"，以换行连接
pub fn render_history(history: &[StepRecord]) -> String {
    if history.is_empty() {
        return EMPTY_HISTORY.to_string();
    }
    history
        .iter()
        .map(|record| {
            format!(
                "Step {}: {}\nResult: {}",
                record.step().id,
                record.step().description,
                record.result().raw_output
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::{Step, StepResult, StepStatus};

    #[test]
    fn test_empty_history_sentinel() {
        assert_eq!(render_history(&[]), "none");
    }

    #[test]
    fn test_render_records() {
        let history = vec![
            StepRecord::new(
                Step::reasoning(1, "compute 2+2").with_status(StepStatus::Completed),
                StepResult::success("4", None),
            ),
            StepRecord::new(
                Step::tool(2, "look up", "lookup", None).with_status(StepStatus::Failed),
                StepResult::failure("Tool 'lookup' not found"),
            ),
        ];
        assert_eq!(
            render_history(&history),
            "Step 1: compute 2+2\nResult: 4\nStep 2: look up\nResult: "
        );
    }
}
