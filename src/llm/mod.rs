//! LLM 层：推理后端抽象与实现（OpenAI 兼容 / DashScope / Scripted）与重试包装

pub mod dashscope;
pub mod message;
pub mod mock;
pub mod openai;
pub mod retry;
pub mod traits;

pub use dashscope::{create_dashscope_client, DASHSCOPE_BASE_URL, QWEN_PLUS};
pub use message::{Message, Role};
pub use mock::ScriptedLlmClient;
pub use openai::{OpenAiClient, TokenUsage};
pub use retry::{RetryConfig, RetryingLlmClient};
pub use traits::{CompletionRequest, LlmClient, LlmError, ReplyFormat};
