//! LLM 客户端抽象
//!
//! 所有后端（OpenAI 兼容 / DashScope / Scripted）实现 LlmClient：complete 接收角色消息与回复格式，
//! 返回单段文本。JSON 模式下调用方仍需容忍 Markdown 代码块包裹。

use async_trait::async_trait;
use thiserror::Error;

use crate::llm::Message;

/// 期望的回复格式
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReplyFormat {
    /// 不受约束的文本（步骤推理之外的自由回答、最终总结）
    #[default]
    Text,
    /// 严格的单个 JSON 对象（规划、重规划、参数生成、推理步骤）
    JsonObject,
}

/// 一次补全请求：有序的角色消息 + 回复格式；模型标识由客户端持有
#[derive(Clone, Debug, PartialEq)]
pub struct CompletionRequest {
    pub messages: Vec<Message>,
    pub format: ReplyFormat,
}

impl CompletionRequest {
    pub fn text(messages: Vec<Message>) -> Self {
        Self {
            messages,
            format: ReplyFormat::Text,
        }
    }

    pub fn json(messages: Vec<Message>) -> Self {
        Self {
            messages,
            format: ReplyFormat::JsonObject,
        }
    }
}

/// 推理后端错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LlmError {
    #[error("rate limited (retry after {retry_after_ms} ms)")]
    RateLimited { retry_after_ms: u64 },

    #[error("request timed out")]
    Timeout,

    #[error("network error: {0}")]
    Network(String),

    #[error("api error ({}): {message}", .code.as_deref().unwrap_or("unknown"))]
    Api {
        code: Option<String>,
        message: String,
    },

    #[error("empty response")]
    EmptyResponse,

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl LlmError {
    /// 可重试：限流、超时、网络抖动、服务端 5xx 类错误
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RateLimited { .. } | Self::Timeout | Self::Network(_) => true,
            Self::Api { code, .. } => matches!(
                code.as_deref(),
                Some("server_error") | Some("service_unavailable") | Some("internal_error")
            ),
            Self::EmptyResponse | Self::InvalidRequest(_) => false,
        }
    }
}

/// LLM 客户端 trait
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// 非流式完成，返回首条回复文本
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError>;

    /// 获取累计 token 使用统计：(prompt_tokens, completion_tokens, total_tokens)
    /// 默认返回 (0, 0, 0)，具体实现可覆盖
    fn token_usage(&self) -> (u64, u64, u64) {
        (0, 0, 0)
    }
}
