//! 核心编排层：错误类型、状态投影、会话状态容器、主控循环

pub mod error;
pub mod orchestrator;
pub mod session;
pub mod state;

pub use error::{CalcError, EvalError};
pub use orchestrator::{create_app, spawn_session};
pub use session::{AiDispatch, Command, Session};
pub use state::{AiQueryState, Mode, Theme, UiState};
