//! 编排引擎：Planner、Executor、Prompt 模板、回复解析、历史渲染与过程事件

pub mod events;
pub mod executor;
pub mod history;
pub mod parse;
pub mod planner;
pub mod prompts;

pub use events::LoopEvent;
pub use executor::Executor;
pub use history::{render_history, EMPTY_HISTORY};
pub use parse::{parse_json_as, parse_json_reply, strip_code_fence};
pub use planner::{merge_revision, Planner};
pub use prompts::PromptSet;
