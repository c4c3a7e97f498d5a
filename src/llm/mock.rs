//! Mock LLM 客户端（离线运行与测试，无需 API）
//!
//! 默认回显提示词为一份合法的解题 JSON；也可固定回复、固定失败或人为延迟。

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::llm::{LlmClient, LlmError, SolveRequest};

#[derive(Debug, Clone)]
enum Behavior {
    Echo,
    Reply(String),
    Fail(LlmError),
}

#[derive(Debug)]
pub struct MockLlmClient {
    behavior: Behavior,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl Default for MockLlmClient {
    fn default() -> Self {
        Self {
            behavior: Behavior::Echo,
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }
}

impl MockLlmClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// 每次返回同一段原始文本
    pub fn with_reply(reply: impl Into<String>) -> Self {
        Self {
            behavior: Behavior::Reply(reply.into()),
            ..Self::default()
        }
    }

    /// 每次都失败
    pub fn failing(error: LlmError) -> Self {
        Self {
            behavior: Behavior::Fail(error),
            ..Self::default()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// 已收到的请求数
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn generate(&self, request: &SolveRequest) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match &self.behavior {
            Behavior::Echo => {
                let mut steps = vec![format!("Received: {}", request.prompt)];
                if let Some(image) = &request.image {
                    steps.push(format!("Attached image: {}", image.mime_type));
                }
                Ok(serde_json::json!({
                    "answer": "(offline)",
                    "explanation": "No API key configured; this is a mock reply.",
                    "steps": steps,
                })
                .to_string())
            }
            Behavior::Reply(text) => Ok(text.clone()),
            Behavior::Fail(e) => Err(e.clone()),
        }
    }

    fn model(&self) -> &str {
        "mock"
    }
}
