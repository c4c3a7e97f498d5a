//! CalcLab - 终端计算器（标准 / 科学 / AI 解题）
//!
//! 模块划分：
//! - **calc**: 表达式状态机、科学函数、算术求值与结果格式化
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: 错误类型、会话状态容器、状态投影、主控循环
//! - **llm**: LLM 客户端抽象与实现（OpenAI 兼容 / Gemini / Mock）与 AI 解题客户端
//! - **memory**: 计算历史与偏好持久化（SQLite）
//! - **observability**: 日志初始化
//! - **ui**: Ratatui TUI 界面

pub mod calc;
pub mod config;
pub mod core;
pub mod llm;
pub mod memory;
pub mod observability;
pub mod ui;
