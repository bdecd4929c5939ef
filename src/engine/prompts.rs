//! Prompt 模板
//!
//! 内置默认模板，可被 prompts 目录下的同名文件覆盖（planner.md / replanner.md / step.md /
//! tool_args.md / summary.md）。占位符写作 `{name}`，单遍替换，替换进来的文本不会再被展开。

use std::path::Path;

const PLANNER: &str = r#"You are the Planner of a Plan-and-Execute agent.
Your only job is to break the user's goal into a short sequence of atomic, ordered steps that an Executor will run later.

Do NOT execute anything, simulate tool calls, assume tool results, or write the final answer.

Each step is either:
- "LLM": analysis, reasoning or judgement done by a language model (tool_name and tool_args must be null)
- "TOOL": a call to one of the available tools (tool_name is required, tool_args is a JSON object, may be {})

Step ids start at 1 and strictly increase. Later steps may depend on earlier outputs.
tool_args are only suggestions; the Executor may regenerate them.

Available tools:
{tool_list}

Reply with exactly one JSON object, no Markdown, no extra text, matching this JSON Schema:
{plan_schema}"#;

const REPLANNER: &str = r#"You are the Replanner of a Plan-and-Execute agent.
Original goal:
{goal}

Current plan (JSON):
{plan}

Execution history:
{history}

Available tools:
{tool_list}

Decide one of:
1. The goal is achieved: set "final_answer" to the complete answer for the user.
2. The goal is not achieved: set "final_answer" to null and return the full revised "steps" list.
   Keep the ids of steps you keep; give new steps new, larger ids; ids must strictly increase.
   Steps that are COMPLETED or FAILED cannot be changed. To retry a failed step add a new step.

Reply with exactly one JSON object matching this JSON Schema:
{refine_schema}"#;

const STEP: &str = r#"You are the Executor of a Plan-and-Execute agent. Carry out the current step using the history of earlier steps.

Current step:
{current_step}

History:
{history}

Reply with exactly one JSON object of the form {"content": "<result of this step>"}."#;

const TOOL_ARGS: &str = r#"You generate keyword arguments for a tool call.

Tool: {tool_name}
Tool documentation:
{tool_doc}

Step to accomplish:
{step_description}

History:
{history}

Reply with exactly one JSON object whose keys are the tool's argument names."#;

const SUMMARY: &str = r#"The step budget for this task is exhausted. Do not plan or call tools any more.

User question:
{query}

Everything done so far:
{history}

Using only this information, give the best possible final answer to the user's question in plain text. If the information is insufficient, say what is known and what is missing."#;

/// 一组 prompt 模板
#[derive(Debug, Clone)]
pub struct PromptSet {
    pub planner: String,
    pub replanner: String,
    pub step: String,
    pub tool_args: String,
    pub summary: String,
}

impl Default for PromptSet {
    fn default() -> Self {
        Self {
            planner: PLANNER.to_string(),
            replanner: REPLANNER.to_string(),
            step: STEP.to_string(),
            tool_args: TOOL_ARGS.to_string(),
            summary: SUMMARY.to_string(),
        }
    }
}

impl PromptSet {
    /// 从目录加载覆盖模板；目录不存在或文件缺失时使用内置默认
    pub fn load(dir: Option<&Path>) -> Self {
        let mut set = Self::default();
        let Some(dir) = dir else {
            return set;
        };
        let slots: [(&str, &mut String); 5] = [
            ("planner.md", &mut set.planner),
            ("replanner.md", &mut set.replanner),
            ("step.md", &mut set.step),
            ("tool_args.md", &mut set.tool_args),
            ("summary.md", &mut set.summary),
        ];
        for (file, slot) in slots {
            let path = dir.join(file);
            if let Ok(content) = std::fs::read_to_string(&path) {
                tracing::info!(path = %path.display(), "prompt template overridden");
                *slot = content;
            }
        }
        set
    }
}

/// 单遍替换 `{key}` 占位符；未知占位符原样保留
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let replaced = after.find('}').and_then(|close| {
            let key = &after[..close];
            vars.iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| (*v, close))
        });
        match replaced {
            Some((value, close)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_replaces_known_keys_once() {
        let out = render(
            "goal={goal} history={history}",
            &[("goal", "say {history}"), ("history", "none")],
        );
        assert_eq!(out, "goal=say {history} history=none");
    }

    #[test]
    fn test_render_keeps_json_braces() {
        let out = render(r#"reply {"content": "<x>"} for {step}"#, &[("step", "s1")]);
        assert_eq!(out, r#"reply {"content": "<x>"} for s1"#);
    }

    #[test]
    fn test_load_overrides_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("summary.md"), "custom {query}").unwrap();
        let set = PromptSet::load(Some(dir.path()));
        assert_eq!(set.summary, "custom {query}");
        assert_eq!(set.planner, PLANNER);
    }

    #[test]
    fn test_load_without_dir_uses_defaults() {
        let set = PromptSet::load(None);
        assert!(set.step.contains("{current_step}"));
        assert!(set.tool_args.contains("{tool_doc}"));
    }
}
