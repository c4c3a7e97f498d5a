//! TUI 应用主循环
//!
//! 进入全屏/原始模式，轮询 state_rx 与键盘事件：计算器按键直接转为 Command，
//! AI 模式下维护输入缓冲并解析 `/image`、`/noimage` 指令；每帧用 draw 渲染 UiState。

use std::io::{self, Stdout};

use crossterm::event::{KeyCode, KeyEvent};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::{mpsc, watch};

use crate::core::{Command, UiState};
use crate::llm::ImageAttachment;
use crate::ui::event::{AppEvent, EventHandler, KeyContext};
use crate::ui::render::{draw, ViewState};

/// AI 输入框中的指令
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AiInput {
    AttachImage(String),
    RemoveImage,
    Prompt(String),
}

/// 解析 AI 输入：`/image <path>` 附加图片，`/noimage` 移除，其余为提示词
pub fn parse_ai_input(buffer: &str) -> AiInput {
    let trimmed = buffer.trim();
    if trimmed == "/noimage" {
        return AiInput::RemoveImage;
    }
    if let Some(path) = trimmed.strip_prefix("/image ") {
        return AiInput::AttachImage(path.trim().to_string());
    }
    AiInput::Prompt(buffer.to_string())
}

/// 运行 TUI：启用原始模式与全屏，循环 poll 事件 + 渲染，退出时恢复终端
pub async fn run_app(
    state_rx: watch::Receiver<UiState>,
    cmd_tx: mpsc::UnboundedSender<Command>,
) -> anyhow::Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let event_handler = EventHandler::new(cmd_tx);
    let mut view = ViewState::default();

    loop {
        let state = state_rx.borrow().clone();

        terminal.draw(|f| draw(f, &state, &view))?;

        let ctx = KeyContext {
            mode: state.mode,
            history_open: view.history_open,
        };
        let ev = match event_handler.poll(ctx) {
            Ok(Some(ev)) => ev,
            Ok(None) => {
                tokio::task::yield_now().await;
                continue;
            }
            Err(e) => {
                tracing::warn!("Event poll failed: {}", e);
                continue;
            }
        };
        view.notice = None;

        match ev {
            AppEvent::Quit => {
                event_handler.send(Command::Quit);
                break;
            }
            AppEvent::Command(cmd) => event_handler.send(cmd),
            AppEvent::ToggleHistory => {
                view.history_open = !view.history_open;
                view.history_scroll = 0;
            }
            AppEvent::ScrollHistory(delta) => {
                view.history_scroll = view.history_scroll.saturating_add_signed(delta);
            }
            AppEvent::Key(key) => handle_ai_key(key, &state, &mut view, &event_handler),
        }

        tokio::task::yield_now().await;
    }

    restore_terminal(&mut terminal)?;
    Ok(())
}

fn handle_ai_key(key: KeyEvent, state: &UiState, view: &mut ViewState, events: &EventHandler) {
    match key.code {
        KeyCode::Enter => match parse_ai_input(&view.ai_buffer) {
            AiInput::RemoveImage => {
                events.send(Command::RemoveImage);
                view.ai_buffer.clear();
            }
            AiInput::AttachImage(path) => {
                match ImageAttachment::from_path(&path) {
                    Ok(image) => events.send(Command::AttachImage(image)),
                    Err(e) => {
                        tracing::warn!("Cannot read image {}: {}", path, e);
                        view.notice = Some(format!(" Cannot read image {}: {} ", path, e));
                    }
                }
                view.ai_buffer.clear();
            }
            AiInput::Prompt(prompt) => {
                if state.ai.loading {
                    return;
                }
                events.send(Command::SetAiInput(prompt));
                events.send(Command::SubmitAi);
            }
        },
        KeyCode::Esc => {
            events.send(Command::DismissAi);
            view.ai_buffer.clear();
        }
        KeyCode::Backspace => {
            view.ai_buffer.pop();
        }
        KeyCode::Char(c) => view.ai_buffer.push(c),
        _ => {}
    }
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> anyhow::Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ai_input() {
        assert_eq!(parse_ai_input("/noimage"), AiInput::RemoveImage);
        assert_eq!(
            parse_ai_input("/image  ./hw.png "),
            AiInput::AttachImage("./hw.png".to_string())
        );
        assert_eq!(
            parse_ai_input("integrate x^2"),
            AiInput::Prompt("integrate x^2".to_string())
        );
    }
}
