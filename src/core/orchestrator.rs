//! 编排器：主控循环
//!
//! 负责：打开偏好存储、创建 LLM 与 AiSolver、建立 cmd/state 两条通道，
//! 并在后台任务中独占 Session 依次消费命令；AI 查询在单独任务中执行，结果回到同一循环。

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};

use crate::config::AppConfig;
use crate::core::{Command, Session, UiState};
use crate::llm::{create_gemini_client, AiResponse, AiSolver, LlmClient, MockLlmClient, OpenAiClient};
use crate::memory::{MemoryStore, Preferences, SqliteStore};

/// 数据目录下的偏好数据库文件名
pub const PREFERENCES_DB: &str = "calclab.db";

/// 根据配置与环境变量选择 LLM 后端（Gemini / OpenAI 兼容 / Mock）
pub(crate) fn create_llm_from_config(cfg: &AppConfig) -> Arc<dyn LlmClient> {
    let provider = cfg.llm.provider.to_lowercase();
    let has_gemini_key = std::env::var("GEMINI_API_KEY").is_ok();
    let has_openai_key = std::env::var("OPENAI_API_KEY").is_ok();

    match provider.as_str() {
        "gemini" if has_gemini_key => {
            let model = cfg.llm.gemini.model.clone().or_else(|| cfg.llm.model.clone());
            let client = create_gemini_client(model.as_deref());
            tracing::info!("Using Gemini LLM ({})", client.model());
            Arc::new(client)
        }
        "openai" if has_openai_key => {
            let model = cfg
                .llm
                .openai
                .model
                .clone()
                .or_else(|| cfg.llm.model.clone())
                .unwrap_or_else(|| "gpt-4o-mini".to_string());
            tracing::info!("Using OpenAI LLM ({})", model);
            Arc::new(OpenAiClient::new(
                cfg.llm.base_url.as_deref(),
                &model,
                std::env::var("OPENAI_API_KEY").ok().as_deref(),
            ))
        }
        "mock" => Arc::new(MockLlmClient::new()),
        other => {
            tracing::warn!("No API key set for provider {:?}, using Mock LLM", other);
            Arc::new(MockLlmClient::new())
        }
    }
}

/// 打开数据目录下的偏好库；失败时退回内存存储（本次运行不落盘）
fn open_preferences(cfg: &AppConfig) -> Preferences {
    let path = cfg.app.resolve_data_dir().join(PREFERENCES_DB);
    match SqliteStore::open(&path) {
        Ok(store) => Preferences::new(store),
        Err(e) => {
            tracing::warn!(
                "Cannot open preferences at {} ({}), using in-memory store",
                path.display(),
                e
            );
            Preferences::new(MemoryStore::new())
        }
    }
}

/// 创建应用运行时：返回命令发送端与状态接收端。须在 tokio 运行时内调用。
pub fn create_app(
    cfg: &AppConfig,
) -> (mpsc::UnboundedSender<Command>, watch::Receiver<UiState>) {
    let session = Session::load(open_preferences(cfg), cfg.app.history_limit);
    let solver = AiSolver::new(create_llm_from_config(cfg))
        .with_timeout(Duration::from_secs(cfg.llm.timeouts.request));
    spawn_session(session, solver)
}

/// 在后台任务中运行 Session：UI -> 会话的命令通道，会话 -> UI 的状态快照通道
pub fn spawn_session(
    session: Session,
    solver: AiSolver,
) -> (mpsc::UnboundedSender<Command>, watch::Receiver<UiState>) {
    let session = session.with_model(solver.model());
    let (cmd_tx, mut cmd_rx) = mpsc::unbounded_channel::<Command>();
    let (state_tx, state_rx) = watch::channel(session.snapshot());
    let (done_tx, mut done_rx) = mpsc::unbounded_channel::<(u64, AiResponse)>();
    let solver = Arc::new(solver);

    tokio::spawn(async move {
        let mut session = session;
        loop {
            tokio::select! {
                cmd = cmd_rx.recv() => {
                    let cmd = match cmd {
                        Some(Command::Quit) | None => break,
                        Some(cmd) => cmd,
                    };
                    if let Some(dispatch) = session.handle(cmd) {
                        let solver = Arc::clone(&solver);
                        let done_tx = done_tx.clone();
                        tokio::spawn(async move {
                            let response = solver
                                .solve_or_fallback(&dispatch.prompt, dispatch.image)
                                .await;
                            let _ = done_tx.send((dispatch.generation, response));
                        });
                    }
                    let _ = state_tx.send(session.snapshot());
                }
                Some((generation, response)) = done_rx.recv() => {
                    if session.finish_ai(generation, response) {
                        let _ = state_tx.send(session.snapshot());
                    }
                }
            }
        }
        tracing::info!("Session loop stopped");
    });

    (cmd_tx, state_rx)
}
