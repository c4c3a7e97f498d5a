//! LLM 层：客户端抽象与实现（OpenAI 兼容 / Gemini / Mock）与 AI 解题客户端

pub mod gemini;
pub mod mock;
pub mod openai;
pub mod solver;
pub mod traits;

pub use gemini::{create_gemini_client, GEMINI_BASE_URL, GEMINI_FLASH};
pub use mock::MockLlmClient;
pub use openai::OpenAiClient;
pub use solver::{
    parse_response, response_schema, AiResponse, AiSolver, DEFAULT_IMAGE_PROMPT,
    FALLBACK_EXPLANATION, SYSTEM_INSTRUCTION,
};
pub use traits::{mime_for_path, ImageAttachment, LlmClient, LlmError, SolveRequest};
