//! OpenAI 兼容 API 客户端
//!
//! 通过 async_openai 调用任意 OpenAI 兼容端点（可配置 base_url）；Gemini、OpenAI、自建代理均可。
//! 请求形态固定：system 指令 + user（文本与可选 image_url），response_format 为 json_schema。

use async_openai::config::OpenAIConfig;
use async_openai::error::OpenAIError;
use async_openai::types::chat::{
    ChatCompletionRequestMessage, ChatCompletionRequestMessageContentPartImageArgs,
    ChatCompletionRequestMessageContentPartTextArgs, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, ChatCompletionRequestUserMessageContentPart,
    CreateChatCompletionRequest, CreateChatCompletionRequestArgs, ImageUrlArgs, ResponseFormat,
    ResponseFormatJsonSchema,
};
use async_openai::Client;
use async_trait::async_trait;

use crate::llm::{LlmClient, LlmError, SolveRequest};

/// 输出 schema 在请求中的名字
const RESPONSE_SCHEMA_NAME: &str = "math_solution";

/// OpenAI 兼容客户端：持有 Client 与 model 名，generate 时取首条 choice 的 content
pub struct OpenAiClient {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiClient {
    pub fn new(base_url: Option<&str>, model: &str, api_key: Option<&str>) -> Self {
        let api_key = api_key
            .map(String::from)
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .unwrap_or_else(|| "sk-placeholder".to_string());

        let config = if let Some(url) = base_url {
            OpenAIConfig::new()
                .with_api_base(url)
                .with_api_key(api_key)
        } else {
            OpenAIConfig::new().with_api_key(api_key)
        };

        Self {
            client: Client::with_config(config),
            model: model.to_string(),
        }
    }

    /// 组装 chat completion 请求：system 指令 + user（文本与可选 image_url）+ json_schema 输出格式
    pub(crate) fn build_request(
        &self,
        request: &SolveRequest,
    ) -> Result<CreateChatCompletionRequest, LlmError> {
        let mut parts: Vec<ChatCompletionRequestUserMessageContentPart> = vec![
            ChatCompletionRequestMessageContentPartTextArgs::default()
                .text(request.prompt.as_str())
                .build()
                .map_err(invalid_request)?
                .into(),
        ];
        if let Some(image) = &request.image {
            let image_url = ImageUrlArgs::default()
                .url(image.data_url())
                .build()
                .map_err(invalid_request)?;
            parts.push(
                ChatCompletionRequestMessageContentPartImageArgs::default()
                    .image_url(image_url)
                    .build()
                    .map_err(invalid_request)?
                    .into(),
            );
        }

        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(request.system_instruction.as_str())
                .build()
                .map_err(invalid_request)?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(parts)
                .build()
                .map_err(invalid_request)?
                .into(),
        ];

        CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .response_format(ResponseFormat::JsonSchema {
                json_schema: ResponseFormatJsonSchema {
                    description: None,
                    name: RESPONSE_SCHEMA_NAME.to_string(),
                    schema: Some(request.response_schema.clone()),
                    strict: Some(false),
                },
            })
            .build()
            .map_err(invalid_request)
    }
}

fn invalid_request(e: OpenAIError) -> LlmError {
    LlmError::InvalidRequest(e.to_string())
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn generate(&self, request: &SolveRequest) -> Result<String, LlmError> {
        let request = self.build_request(request)?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| LlmError::Connectivity(e.to_string()))?;

        if let Some(usage) = &response.usage {
            tracing::debug!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "AI query usage"
            );
        }

        response
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .ok_or(LlmError::EmptyResponse)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{AiSolver, ImageAttachment};

    #[test]
    fn test_build_request_with_image() {
        let client = OpenAiClient::new(Some("http://localhost:1/v1"), "test-model", Some("sk-test"));
        let image = ImageAttachment::from_bytes(b"png", "image/png");
        let solve = AiSolver::build_request("what is shown?", Some(image)).unwrap();

        let request = client.build_request(&solve).unwrap();
        assert_eq!(request.model, "test-model");
        assert_eq!(request.messages.len(), 2);

        let wire = serde_json::to_value(&request).unwrap();
        assert_eq!(wire["response_format"]["type"], "json_schema");
        assert_eq!(
            wire["response_format"]["json_schema"]["name"],
            RESPONSE_SCHEMA_NAME
        );
        assert_eq!(
            wire["messages"][1]["content"][1]["image_url"]["url"],
            "data:image/png;base64,cG5n"
        );
    }
}
