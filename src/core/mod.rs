//! 核心编排层：错误分类、状态、构建器、主控循环

pub mod builder;
pub mod error;
pub mod orchestrator;
pub mod state;

pub use builder::OrchestratorBuilder;
pub use error::AgentError;
pub use orchestrator::{Orchestrator, DEFAULT_MAX_STEPS};
pub use state::{AgentState, Termination};
