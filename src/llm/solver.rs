//! AI 解题客户端
//!
//! 把提示词（和可选图片）连同固定的系统指令、输出 JSON Schema 发给模型，解析为 AiResponse。
//! 不重试；超时由配置决定。任何失败都由 solve_or_fallback 替换为固定的占位回答。

use std::sync::Arc;
use std::time::Duration;

use schemars::{schema_for, JsonSchema};
use serde::{Deserialize, Serialize};

use crate::llm::{ImageAttachment, LlmClient, LlmError, SolveRequest};

/// 只有图片、没有文字时使用的提示词
pub const DEFAULT_IMAGE_PROMPT: &str = "Solve the problem in this image.";

pub const SYSTEM_INSTRUCTION: &str = "You are an expert math and science tutor. \
When a user provides a problem, break it down into logical steps. \
If the input is an image, describe the problem first. \
Provide the final answer clearly. \
Format your response as a JSON object with properties: 'answer', 'explanation', and 'steps' (array).";

pub const FALLBACK_ANSWER: &str = "Error";
pub const FALLBACK_EXPLANATION: &str = "Could not connect to AI Lab. Please check your connection.";

/// 模型返回的结构化解答；内容视为不可信文本，仅用于展示
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct AiResponse {
    /// 最终答案
    pub answer: String,
    /// 解题思路
    pub explanation: String,
    /// 分步过程
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub steps: Option<Vec<String>>,
}

impl AiResponse {
    /// 查询失败时展示给用户的占位回答
    pub fn fallback() -> Self {
        Self {
            answer: FALLBACK_ANSWER.to_string(),
            explanation: FALLBACK_EXPLANATION.to_string(),
            steps: None,
        }
    }
}

/// AiResponse 的 JSON Schema（answer、explanation 必填，steps 可选）
pub fn response_schema() -> serde_json::Value {
    let mut schema = serde_json::to_value(schema_for!(AiResponse)).unwrap_or_default();
    if let Some(map) = schema.as_object_mut() {
        map.remove("$schema");
        map.remove("title");
    }
    schema
}

/// 解析模型输出；容忍 Markdown 代码块包裹
pub fn parse_response(raw: &str) -> Result<AiResponse, LlmError> {
    let text = strip_code_fence(raw);
    if text.is_empty() {
        return Err(LlmError::EmptyResponse);
    }
    serde_json::from_str(text).map_err(|e| LlmError::MalformedResponse(e.to_string()))
}

fn strip_code_fence(raw: &str) -> &str {
    let text = raw.trim();
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

pub struct AiSolver {
    client: Arc<dyn LlmClient>,
    timeout: Option<Duration>,
}

impl AiSolver {
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self {
            client,
            timeout: None,
        }
    }

    /// 单次请求超时；Duration::ZERO 表示不限
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = (!timeout.is_zero()).then_some(timeout);
        self
    }

    pub fn model(&self) -> &str {
        self.client.model()
    }

    /// 组装请求：空提示词 + 图片时使用默认提示词；两者皆空则拒绝
    pub fn build_request(
        prompt: &str,
        image: Option<ImageAttachment>,
    ) -> Result<SolveRequest, LlmError> {
        let prompt = prompt.trim();
        let prompt = match (prompt.is_empty(), image.is_some()) {
            (false, _) => prompt.to_string(),
            (true, true) => DEFAULT_IMAGE_PROMPT.to_string(),
            (true, false) => return Err(LlmError::EmptyQuery),
        };
        Ok(SolveRequest {
            prompt,
            image,
            system_instruction: SYSTEM_INSTRUCTION.to_string(),
            response_schema: response_schema(),
        })
    }

    pub async fn solve(
        &self,
        prompt: &str,
        image: Option<ImageAttachment>,
    ) -> Result<AiResponse, LlmError> {
        let request = Self::build_request(prompt, image)?;
        tracing::info!(
            model = self.client.model(),
            has_image = request.image.is_some(),
            "Dispatching AI query"
        );

        let raw = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.client.generate(&request))
                .await
                .map_err(|_| LlmError::Timeout(limit))??,
            None => self.client.generate(&request).await?,
        };

        parse_response(&raw)
    }

    /// 失败时返回占位回答，错误只记日志
    pub async fn solve_or_fallback(
        &self,
        prompt: &str,
        image: Option<ImageAttachment>,
    ) -> AiResponse {
        match self.solve(prompt, image).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("AI query failed: {}", e);
                AiResponse::fallback()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockLlmClient;

    fn solver(client: MockLlmClient) -> (AiSolver, Arc<MockLlmClient>) {
        let client = Arc::new(client);
        (AiSolver::new(client.clone()), client)
    }

    #[tokio::test]
    async fn test_parses_structured_reply() {
        let (solver, _) = solver(MockLlmClient::with_reply(
            r#"{"answer":"x = 5","explanation":"Subtract 5, divide by 3.","steps":["3x = 15","x = 5"]}"#,
        ));
        let response = solver.solve("3x + 5 = 20", None).await.unwrap();
        assert_eq!(response.answer, "x = 5");
        assert_eq!(response.steps.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_steps_are_optional() {
        let (solver, _) = solver(MockLlmClient::with_reply(
            r#"{"answer":"4","explanation":"2 + 2"}"#,
        ));
        let response = solver.solve("2 + 2", None).await.unwrap();
        assert_eq!(response.steps, None);
    }

    #[tokio::test]
    async fn test_network_failure_yields_fallback() {
        let (solver, _) = solver(MockLlmClient::failing(LlmError::Connectivity(
            "connection refused".to_string(),
        )));
        assert!(matches!(
            solver.solve("2 + 2", None).await,
            Err(LlmError::Connectivity(_))
        ));
        let response = solver.solve_or_fallback("2 + 2", None).await;
        assert_eq!(response.answer, "Error");
        assert_eq!(
            response.explanation,
            "Could not connect to AI Lab. Please check your connection."
        );
    }

    #[tokio::test]
    async fn test_malformed_reply() {
        let (solver, _) = solver(MockLlmClient::with_reply("The answer is 4."));
        assert!(matches!(
            solver.solve("2 + 2", None).await,
            Err(LlmError::MalformedResponse(_))
        ));
        assert_eq!(
            solver.solve_or_fallback("2 + 2", None).await,
            AiResponse::fallback()
        );
    }

    #[tokio::test]
    async fn test_missing_required_field_is_malformed() {
        let (solver, _) = solver(MockLlmClient::with_reply(r#"{"answer":"4"}"#));
        assert!(matches!(
            solver.solve("2 + 2", None).await,
            Err(LlmError::MalformedResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_empty_reply() {
        let (solver, _) = solver(MockLlmClient::with_reply("  "));
        assert_eq!(
            solver.solve("2 + 2", None).await,
            Err(LlmError::EmptyResponse)
        );
    }

    #[tokio::test]
    async fn test_timeout() {
        let (solver, _) = solver(MockLlmClient::new().with_delay(Duration::from_secs(5)));
        let solver = solver.with_timeout(Duration::from_millis(20));
        assert!(matches!(
            solver.solve("2 + 2", None).await,
            Err(LlmError::Timeout(_))
        ));
    }

    #[tokio::test]
    async fn test_empty_query_is_rejected_without_call() {
        let (solver, client) = solver(MockLlmClient::new());
        assert_eq!(solver.solve("   ", None).await, Err(LlmError::EmptyQuery));
        assert_eq!(client.calls(), 0);
    }

    #[test]
    fn test_image_only_uses_default_prompt() {
        let image = ImageAttachment::from_bytes(b"png", "image/png");
        let request = AiSolver::build_request("", Some(image)).unwrap();
        assert_eq!(request.prompt, DEFAULT_IMAGE_PROMPT);
        assert_eq!(request.system_instruction, SYSTEM_INSTRUCTION);
    }

    #[test]
    fn test_fenced_json() {
        let response = parse_response(
            "```json\n{\"answer\":\"1\",\"explanation\":\"one\",\"steps\":[]}\n```",
        )
        .unwrap();
        assert_eq!(response.answer, "1");
        assert_eq!(response.steps, Some(vec![]));
    }

    #[test]
    fn test_schema_requires_answer_and_explanation() {
        let schema = response_schema();
        let required: Vec<&str> = schema["required"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|v| v.as_str())
            .collect();
        assert!(required.contains(&"answer"));
        assert!(required.contains(&"explanation"));
        assert!(!required.contains(&"steps"));
        assert!(schema["properties"]["steps"].is_object());
        assert!(schema.get("$schema").is_none());
    }
}
