//! 工具注册表
//!
//! 所有工具实现 Tool trait（name / description / execute），由 ToolRegistry 按名注册与查找。
//! 注册表在构造完成后只读，可通过 Arc 在多个并发运行的编排循环之间共享。

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};

/// 工具 trait：名称、说明文档（原样拼入参数生成 prompt）、异步执行（关键字参数为 JSON 对象）
#[async_trait]
pub trait Tool: Send + Sync {
    /// 工具名称（对应计划中的 tool_name 字段）
    fn name(&self) -> &str;

    /// 工具说明（供 LLM 理解功能与参数）
    fn description(&self) -> &str;

    /// 执行工具；返回值可以是文本、对象或数组
    async fn execute(&self, args: Map<String, Value>) -> Result<Value, String>;
}

type BoxedToolFuture = Pin<Box<dyn Future<Output = Result<Value, String>> + Send>>;

/// 闭包工具：把一个异步函数与说明文档包装成 Tool
pub struct FnTool {
    name: String,
    description: String,
    func: Box<dyn Fn(Map<String, Value>) -> BoxedToolFuture + Send + Sync>,
}

impl FnTool {
    pub fn new<F, Fut>(name: impl Into<String>, description: impl Into<String>, func: F) -> Self
    where
        F: Fn(Map<String, Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, String>> + Send + 'static,
    {
        Self {
            name: name.into(),
            description: description.into(),
            func: Box::new(move |args| Box::pin(func(args))),
        }
    }
}

#[async_trait]
impl Tool for FnTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    async fn execute(&self, args: Map<String, Value>) -> Result<Value, String> {
        (self.func)(args).await
    }
}

/// 工具注册表：按名称有序存储 Arc<dyn Tool>，保证生成的工具目录顺序稳定
#[derive(Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册工具；同名工具后注册者覆盖先注册者
    pub fn register(&mut self, tool: impl Tool + 'static) {
        let name = tool.name().to_string();
        if self.tools.insert(name.clone(), Arc::new(tool)).is_some() {
            tracing::warn!(tool = %name, "tool registered twice, replacing previous");
        }
    }

    pub fn with(mut self, tool: impl Tool + 'static) -> Self {
        self.register(tool);
        self
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn tool_names(&self) -> Vec<String> {
        self.tools.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// 工具目录：每个工具一行 "- name: description"，用于规划 prompt；无工具时返回 "none"
    pub fn catalog(&self) -> String {
        if self.tools.is_empty() {
            return "none".to_string();
        }
        self.tools
            .iter()
            .map(|(name, tool)| format!("- {}: {}", name, tool.description().trim()))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::EchoTool;
    use serde_json::json;

    fn upper() -> FnTool {
        FnTool::new("upper", "Uppercase text. Args: {\"text\": string}", |args| async move {
            let text = args
                .get("text")
                .and_then(|v| v.as_str())
                .ok_or_else(|| "missing text".to_string())?;
            Ok(json!(text.to_uppercase()))
        })
    }

    #[tokio::test]
    async fn test_fn_tool_executes() {
        let tool = upper();
        let mut args = Map::new();
        args.insert("text".into(), json!("abc"));
        assert_eq!(tool.execute(args).await.unwrap(), json!("ABC"));
        assert!(tool.execute(Map::new()).await.is_err());
    }

    #[test]
    fn test_catalog_is_sorted_by_name() {
        let registry = ToolRegistry::new().with(upper()).with(EchoTool);
        let catalog = registry.catalog();
        let lines: Vec<&str> = catalog.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("- echo: "));
        assert!(lines[1].starts_with("- upper: Uppercase text."));
    }

    #[test]
    fn test_empty_catalog_sentinel() {
        assert_eq!(ToolRegistry::new().catalog(), "none");
    }

    #[test]
    fn test_lookup() {
        let registry = ToolRegistry::new().with(EchoTool);
        assert!(registry.contains("echo"));
        assert!(registry.get("lookup").is_none());
        assert_eq!(registry.tool_names(), vec!["echo".to_string()]);
    }
}
