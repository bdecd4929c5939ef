//! 工具箱：Tool trait、注册表与内置工具

pub mod echo;
pub mod registry;

pub use echo::EchoTool;
pub use registry::{FnTool, Tool, ToolRegistry};
