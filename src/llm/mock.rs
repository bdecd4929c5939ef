//! Scripted LLM 客户端（用于测试，无需 API）
//!
//! 按顺序回放预置的回复或错误，并记录收到的每个请求；脚本耗尽后返回不可重试的错误。

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::llm::{CompletionRequest, LlmClient, LlmError};

#[derive(Debug, Default)]
pub struct ScriptedLlmClient {
    replies: Mutex<VecDeque<Result<String, LlmError>>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedLlmClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// 以一组成功回复初始化
    pub fn with_replies<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let client = Self::new();
        for r in replies {
            client.push_ok(r);
        }
        client
    }

    pub fn push_ok(&self, reply: impl Into<String>) {
        self.lock_replies().push_back(Ok(reply.into()));
    }

    pub fn push_err(&self, err: LlmError) {
        self.lock_replies().push_back(Err(err));
    }

    /// 已收到的请求（按调用顺序）
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn remaining(&self) -> usize {
        self.lock_replies().len()
    }

    fn lock_replies(&self) -> std::sync::MutexGuard<'_, VecDeque<Result<String, LlmError>>> {
        self.replies.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl LlmClient for ScriptedLlmClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request.clone());
        self.lock_replies().pop_front().unwrap_or_else(|| {
            Err(LlmError::Api {
                code: Some("script_exhausted".to_string()),
                message: "no scripted reply left".to_string(),
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::Message;

    #[tokio::test]
    async fn test_replays_in_order_and_records() {
        let client = ScriptedLlmClient::with_replies(["a", "b"]);
        let req = CompletionRequest::json(vec![Message::user("x")]);
        assert_eq!(client.complete(&req).await.unwrap(), "a");
        assert_eq!(client.complete(&req).await.unwrap(), "b");
        assert!(client.complete(&req).await.is_err());
        assert_eq!(client.requests().len(), 3);
        assert_eq!(client.remaining(), 0);
    }
}
