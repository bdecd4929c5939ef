//! DashScope（通义千问）客户端（OpenAI 兼容模式）
//!
//! - Base URL: https://dashscope.aliyuncs.com/compatible-mode/v1
//! - 默认模型: qwen-plus

use std::time::Duration;

use crate::llm::OpenAiClient;

/// DashScope API 常量
pub const DASHSCOPE_BASE_URL: &str = "https://dashscope.aliyuncs.com/compatible-mode/v1";
pub const QWEN_PLUS: &str = "qwen-plus";

/// 创建 DashScope 客户端；model 为空时使用 qwen-plus
pub fn create_dashscope_client(
    model: Option<&str>,
    api_key: &str,
    request_timeout: Duration,
) -> OpenAiClient {
    OpenAiClient::new(
        Some(DASHSCOPE_BASE_URL),
        model.unwrap_or(QWEN_PLUS),
        api_key,
        request_timeout,
    )
}
