//! 编排器构建器：统一的初始化逻辑
//!
//! Planner 与 Executor 共享同一个 LLM 客户端、同一份工具注册表与 prompt 模板。
//! 配置错误只在这里暴露，主循环开始后不再有致命错误。

use std::sync::Arc;
use std::time::Duration;

use crate::config::AppConfig;
use crate::core::{AgentError, Orchestrator};
use crate::engine::{Executor, Planner, PromptSet};
use crate::llm::{create_dashscope_client, LlmClient, OpenAiClient, RetryingLlmClient};
use crate::tools::ToolRegistry;

/// DeepSeek 的 OpenAI 兼容端点
const DEEPSEEK_BASE_URL: &str = "https://api.deepseek.com/v1";

pub struct OrchestratorBuilder {
    config: AppConfig,
    tools: Arc<ToolRegistry>,
    llm: Option<Arc<dyn LlmClient>>,
}

impl OrchestratorBuilder {
    pub fn new(config: AppConfig, tools: Arc<ToolRegistry>) -> Self {
        Self {
            config,
            tools,
            llm: None,
        }
    }

    /// 显式指定 LLM 客户端（测试或自定义后端）；此时忽略 [llm] 段的 provider 与 Key
    pub fn with_llm(mut self, llm: Arc<dyn LlmClient>) -> Self {
        self.llm = Some(llm);
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// 按 [llm] 段构建客户端，并包上重试
    pub fn build_llm(&self) -> Result<Arc<dyn LlmClient>, AgentError> {
        let llm = &self.config.llm;
        let api_key = llm.resolve_api_key().ok_or_else(|| {
            AgentError::Config(format!(
                "no API key: set llm.api_key or the {} environment variable",
                llm.api_key_env
            ))
        })?;
        let timeout = Duration::from_secs(llm.timeouts.request);
        let model = llm.model.as_str();

        let client = match llm.provider.to_lowercase().as_str() {
            "dashscope" | "qwen" => match llm.base_url.as_deref() {
                Some(base) => OpenAiClient::new(Some(base), model, &api_key, timeout),
                None => create_dashscope_client(Some(model), &api_key, timeout),
            },
            "openai" => OpenAiClient::new(llm.base_url.as_deref(), model, &api_key, timeout),
            "deepseek" => OpenAiClient::new(
                Some(llm.base_url.as_deref().unwrap_or(DEEPSEEK_BASE_URL)),
                model,
                &api_key,
                timeout,
            ),
            other => {
                return Err(AgentError::Config(format!("unknown llm provider '{}'", other)));
            }
        };
        tracing::info!(provider = %llm.provider, model = %model, "LLM client ready");

        Ok(Arc::new(RetryingLlmClient::new(
            Arc::new(client),
            llm.retry.clone(),
        )))
    }

    pub fn build(self) -> Result<Orchestrator, AgentError> {
        let max_steps = self.config.app.max_steps;
        if max_steps == 0 {
            return Err(AgentError::Config("app.max_steps must be at least 1".into()));
        }

        let llm = match self.llm.clone() {
            Some(llm) => llm,
            None => self.build_llm()?,
        };
        let prompts = Arc::new(PromptSet::load(self.config.app.prompts_dir.as_deref()));

        tracing::info!(
            tools = self.tools.len(),
            max_steps,
            "Orchestrator built"
        );
        Ok(Orchestrator::new(
            Planner::new(llm.clone(), self.tools.clone(), prompts.clone()),
            Executor::new(llm, self.tools, prompts),
            max_steps,
        ))
    }
}
