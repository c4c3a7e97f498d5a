//! 事件处理
//!
//! 轮询 crossterm 键盘事件，按当前模式与抽屉状态映射为 AppEvent：
//! 计算器按键直接转为 Command；AI 模式下的普通按键交给 run_app 编辑输入缓冲。

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tokio::sync::mpsc;

use crate::calc::{Operator, ScientificFunction};
use crate::core::{Command, Mode};

/// 应用事件
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// 直接发往会话的命令
    Command(Command),
    ToggleHistory,
    /// 历史抽屉滚动（负数向上）
    ScrollHistory(i16),
    Quit,
    /// AI 模式下的文本编辑键
    Key(KeyEvent),
}

/// 映射按键时需要的界面上下文
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyContext {
    pub mode: Mode,
    pub history_open: bool,
}

/// 事件处理器：持有 cmd_tx，poll 时读键盘并返回 AppEvent
pub struct EventHandler {
    cmd_tx: mpsc::UnboundedSender<Command>,
}

impl EventHandler {
    pub fn new(cmd_tx: mpsc::UnboundedSender<Command>) -> Self {
        Self { cmd_tx }
    }

    pub fn poll(&self, ctx: KeyContext) -> anyhow::Result<Option<AppEvent>> {
        if event::poll(std::time::Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    return Ok(map_key(key, ctx));
                }
            }
        }
        Ok(None)
    }

    pub fn send(&self, command: Command) {
        let _ = self.cmd_tx.send(command);
    }
}

fn scientific_shortcut(c: char) -> Option<ScientificFunction> {
    let function = match c {
        's' => ScientificFunction::Sin,
        'o' => ScientificFunction::Cos,
        't' => ScientificFunction::Tan,
        'l' => ScientificFunction::Log,
        'n' => ScientificFunction::Ln,
        'r' => ScientificFunction::Sqrt,
        'p' => ScientificFunction::Pi,
        'e' => ScientificFunction::E,
        _ => return None,
    };
    Some(function)
}

/// 按键映射；None 表示忽略
pub fn map_key(key: KeyEvent, ctx: KeyContext) -> Option<AppEvent> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    // 全局快捷键
    match key.code {
        KeyCode::Char('q') | KeyCode::Char('c') if ctrl => return Some(AppEvent::Quit),
        KeyCode::Char('t') if ctrl => return Some(AppEvent::Command(Command::ToggleTheme)),
        KeyCode::Char('h') if ctrl => return Some(AppEvent::ToggleHistory),
        KeyCode::F(4) => return Some(AppEvent::ToggleHistory),
        KeyCode::F(n @ 1..=3) => {
            let mode = Mode::ALL[usize::from(n) - 1];
            return Some(AppEvent::Command(Command::SetMode(mode)));
        }
        KeyCode::Tab => return Some(AppEvent::Command(Command::SetMode(ctx.mode.next()))),
        _ => {}
    }

    if ctx.history_open {
        return match key.code {
            KeyCode::Delete => Some(AppEvent::Command(Command::ClearHistory)),
            KeyCode::Esc => Some(AppEvent::ToggleHistory),
            KeyCode::Up => Some(AppEvent::ScrollHistory(-1)),
            KeyCode::Down => Some(AppEvent::ScrollHistory(1)),
            KeyCode::PageUp => Some(AppEvent::ScrollHistory(-10)),
            KeyCode::PageDown => Some(AppEvent::ScrollHistory(10)),
            _ => None,
        };
    }

    // 未绑定的 Ctrl 组合键不进入计算器或 AI 输入缓冲
    if ctrl {
        return None;
    }
    if ctx.mode == Mode::Ai {
        return Some(AppEvent::Key(key));
    }

    let command = match key.code {
        KeyCode::Enter => Command::Evaluate,
        KeyCode::Backspace => Command::Backspace,
        KeyCode::Esc => Command::Clear,
        KeyCode::Char(c) if c.is_ascii_digit() || c == '.' => Command::Digit(c),
        KeyCode::Char('=') => Command::Evaluate,
        KeyCode::Char('%') => Command::Percent,
        KeyCode::Char('c') | KeyCode::Char('C') => Command::Clear,
        KeyCode::Char(c) => match Operator::from_symbol(c) {
            Some(op) => Command::Operator(op),
            None if ctx.mode == Mode::Scientific => {
                Command::Scientific(scientific_shortcut(c)?)
            }
            None => return None,
        },
        _ => return None,
    };
    Some(AppEvent::Command(command))
}
