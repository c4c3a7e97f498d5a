//! LLM 客户端抽象
//!
//! 后端（OpenAI 兼容 / Gemini / Mock）实现 LlmClient::generate：一次请求，返回模型原始文本。
//! 这是唯一的网络 I/O 边界，测试中用 Mock 替换。

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use thiserror::Error;

/// AI 查询失败的原因；调用方统一替换为固定的占位回答，不向 UI 传播
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LlmError {
    #[error("Empty query: provide a prompt or an image")]
    EmptyQuery,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Connectivity error: {0}")]
    Connectivity(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Model returned an empty response")]
    EmptyResponse,

    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

/// 内联图片：MIME 类型 + base64 数据
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageAttachment {
    pub mime_type: String,
    pub data: String,
}

impl ImageAttachment {
    pub fn from_bytes(bytes: &[u8], mime_type: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: base64::engine::general_purpose::STANDARD.encode(bytes),
        }
    }

    /// 读取图片文件；MIME 由扩展名推断
    pub fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let bytes = std::fs::read(path.as_ref())?;
        Ok(Self::from_bytes(&bytes, mime_for_path(path.as_ref())))
    }

    /// `data:<mime>;base64,<data>`
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }

    /// 解码后的大致字节数
    pub fn approx_size(&self) -> usize {
        self.data.len() / 4 * 3
    }
}

/// 按扩展名推断图片 MIME；未知扩展名按 JPEG 处理
pub fn mime_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "image/jpeg",
    }
}

/// 一次解题请求：提示词、可选图片、固定的系统指令与输出 JSON Schema
#[derive(Clone, Debug, PartialEq)]
pub struct SolveRequest {
    pub prompt: String,
    pub image: Option<ImageAttachment>,
    pub system_instruction: String,
    pub response_schema: serde_json::Value,
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    /// 发送请求，返回模型输出的原始文本（期望为 JSON）
    async fn generate(&self, request: &SolveRequest) -> Result<String, LlmError>;

    fn model(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_url() {
        let image = ImageAttachment::from_bytes(b"hello", "image/png");
        assert_eq!(image.data, "aGVsbG8=");
        assert_eq!(image.data_url(), "data:image/png;base64,aGVsbG8=");
    }

    #[test]
    fn test_mime_for_path() {
        assert_eq!(mime_for_path(Path::new("a/b.PNG")), "image/png");
        assert_eq!(mime_for_path(Path::new("photo.webp")), "image/webp");
        assert_eq!(mime_for_path(Path::new("scan.jpg")), "image/jpeg");
        assert_eq!(mime_for_path(Path::new("noext")), "image/jpeg");
    }

    #[test]
    fn test_from_path() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("hw.gif");
        std::fs::write(&path, [0u8; 6]).unwrap();
        let image = ImageAttachment::from_path(&path).unwrap();
        assert_eq!(image.mime_type, "image/gif");
        assert_eq!(image.approx_size(), 6);
        assert!(ImageAttachment::from_path(dir.path().join("missing.png")).is_err());
    }
}
