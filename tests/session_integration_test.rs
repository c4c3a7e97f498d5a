//! 会话集成测试：通过编排器通道驱动 Session，AI 后端使用 MockLlmClient

use std::sync::Arc;
use std::time::Duration;

use calclab::calc::{Operator, Phase};
use calclab::core::{spawn_session, Command, Session, Theme, UiState};
use calclab::llm::{AiSolver, ImageAttachment, LlmError, MockLlmClient};
use calclab::memory::{MemoryStore, Preferences, SqliteStore};
use tokio::sync::watch;

fn memory_session() -> Session {
    Session::load(Preferences::new(MemoryStore::new()), 20)
}

/// 等待直到状态满足条件
async fn wait_for(
    rx: &mut watch::Receiver<UiState>,
    pred: impl Fn(&UiState) -> bool,
) -> UiState {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            {
                let state = rx.borrow_and_update();
                if pred(&state) {
                    return state.clone();
                }
            }
            rx.changed().await.expect("session loop stopped");
        }
    })
    .await
    .expect("timed out waiting for state")
}

#[tokio::test]
async fn test_calculation_flows_to_history() {
    let solver = AiSolver::new(Arc::new(MockLlmClient::new()));
    let (tx, mut rx) = spawn_session(memory_session(), solver);

    for cmd in [
        Command::Digit('1'),
        Command::Digit('2'),
        Command::Operator(Operator::Multiply),
        Command::Digit('3'),
        Command::Evaluate,
    ] {
        tx.send(cmd).unwrap();
    }

    let state = wait_for(&mut rx, |s| !s.history.is_empty()).await;
    assert_eq!(state.display, "36");
    assert_eq!(state.expression, "");
    assert_eq!(state.history[0].expression, "12 * 3");
    assert_eq!(state.history[0].result, "36");
}

#[tokio::test]
async fn test_division_by_zero_shows_error() {
    let solver = AiSolver::new(Arc::new(MockLlmClient::new()));
    let (tx, mut rx) = spawn_session(memory_session(), solver);

    for cmd in [
        Command::Digit('6'),
        Command::Operator(Operator::Divide),
        Command::Digit('0'),
        Command::Evaluate,
    ] {
        tx.send(cmd).unwrap();
    }

    let state = wait_for(&mut rx, |s| s.phase == Phase::Error).await;
    assert_eq!(state.display, "Error");
    assert!(state.history.is_empty());
}

#[tokio::test]
async fn test_ai_query_round_trip() {
    let client = Arc::new(MockLlmClient::with_reply(
        r#"{"answer":"x = 5","explanation":"Isolate x.","steps":["3x = 15","x = 5"]}"#,
    ));
    let (tx, mut rx) = spawn_session(memory_session(), AiSolver::new(client.clone()));

    tx.send(Command::SetAiInput("3x + 5 = 20".to_string())).unwrap();
    tx.send(Command::SubmitAi).unwrap();

    let state = wait_for(&mut rx, |s| s.ai.result.is_some()).await;
    assert!(!state.ai.loading);
    let result = state.ai.result.unwrap();
    assert_eq!(result.answer, "x = 5");
    assert_eq!(result.steps.unwrap(), vec!["3x = 15", "x = 5"]);
    assert_eq!(client.calls(), 1);
}

#[tokio::test]
async fn test_ai_failure_shows_placeholder() {
    let client = Arc::new(MockLlmClient::failing(LlmError::Connectivity(
        "offline".to_string(),
    )));
    let (tx, mut rx) = spawn_session(memory_session(), AiSolver::new(client));

    tx.send(Command::AttachImage(ImageAttachment::from_bytes(
        b"\x89PNG",
        "image/png",
    )))
    .unwrap();
    tx.send(Command::SubmitAi).unwrap();

    let state = wait_for(&mut rx, |s| s.ai.result.is_some()).await;
    let result = state.ai.result.unwrap();
    assert_eq!(result.answer, "Error");
    assert_eq!(
        result.explanation,
        "Could not connect to AI Lab. Please check your connection."
    );
}

#[tokio::test]
async fn test_second_submit_while_loading_is_ignored() {
    let client = Arc::new(MockLlmClient::new().with_delay(Duration::from_millis(200)));
    let (tx, mut rx) = spawn_session(memory_session(), AiSolver::new(client.clone()));

    tx.send(Command::SetAiInput("2 + 2".to_string())).unwrap();
    tx.send(Command::SubmitAi).unwrap();
    tx.send(Command::SubmitAi).unwrap();

    wait_for(&mut rx, |s| s.ai.result.is_some()).await;
    assert_eq!(client.calls(), 1);
}

#[tokio::test]
async fn test_dismissed_query_result_is_dropped() {
    let client = Arc::new(MockLlmClient::new().with_delay(Duration::from_millis(100)));
    let (tx, mut rx) = spawn_session(memory_session(), AiSolver::new(client));

    tx.send(Command::SetAiInput("first".to_string())).unwrap();
    tx.send(Command::SubmitAi).unwrap();
    wait_for(&mut rx, |s| s.ai.loading).await;
    tx.send(Command::DismissAi).unwrap();
    wait_for(&mut rx, |s| !s.ai.loading).await;

    tokio::time::sleep(Duration::from_millis(300)).await;
    let state = rx.borrow().clone();
    assert_eq!(state.ai.result, None);
    assert!(!state.ai.loading);
}

#[tokio::test]
async fn test_preferences_survive_restart() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("calclab.db");

    {
        let session = Session::load(Preferences::new(SqliteStore::open(&path).unwrap()), 20);
        let solver = AiSolver::new(Arc::new(MockLlmClient::new()));
        let (tx, mut rx) = spawn_session(session, solver);
        for cmd in [
            Command::Digit('2'),
            Command::Operator(Operator::Power),
            Command::Digit('1'),
            Command::Digit('0'),
            Command::Evaluate,
            Command::ToggleTheme,
        ] {
            tx.send(cmd).unwrap();
        }
        wait_for(&mut rx, |s| s.theme == Theme::Light && !s.history.is_empty()).await;
        tx.send(Command::Quit).unwrap();
    }

    let session = Session::load(Preferences::new(SqliteStore::open(&path).unwrap()), 20);
    assert_eq!(session.theme(), Theme::Light);
    assert_eq!(session.history().items()[0].expression, "2 ^ 10");
    assert_eq!(session.history().items()[0].result, "1024");
}
