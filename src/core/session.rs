//! 会话：单一的顶层状态容器
//!
//! 持有计算器、历史、主题、模式、AI 子状态与偏好存储。每条 Command 同步执行到底；
//! 历史或主题一旦变化立即写入存储（不合并、不防抖）。AI 查询只在这里生成派发描述，
//! 真正的网络调用由编排器在后台执行，结果带着 generation 回来，过期的直接丢弃。

use crate::calc::{Calculator, Operator, ScientificFunction};
use crate::core::{AiQueryState, Mode, Theme, UiState};
use crate::llm::{AiResponse, ImageAttachment};
use crate::memory::{HistoryLog, Preferences};

/// 从 UI 发往会话的用户命令
#[derive(Debug, Clone)]
pub enum Command {
    /// 数字键或小数点
    Digit(char),
    Operator(Operator),
    Scientific(ScientificFunction),
    Percent,
    Clear,
    Backspace,
    Evaluate,
    SetMode(Mode),
    ToggleTheme,
    /// 清空全部历史
    ClearHistory,
    SetAiInput(String),
    AttachImage(ImageAttachment),
    RemoveImage,
    SubmitAi,
    /// 关闭结果并复位 AI 面板；同时作废仍在进行的查询
    DismissAi,
    Quit,
}

/// 一次待执行的 AI 查询
#[derive(Debug, Clone, PartialEq)]
pub struct AiDispatch {
    pub generation: u64,
    pub prompt: String,
    pub image: Option<ImageAttachment>,
}

pub struct Session {
    calculator: Calculator,
    history: HistoryLog,
    theme: Theme,
    mode: Mode,
    ai: AiQueryState,
    ai_generation: u64,
    preferences: Preferences,
    model: String,
}

impl Session {
    /// 从偏好存储恢复历史与主题
    pub fn load(preferences: Preferences, history_limit: usize) -> Self {
        let stored = preferences.load();
        tracing::info!(
            "Loaded {} history items, theme {}",
            stored.history.len(),
            stored.theme
        );
        Self {
            calculator: Calculator::new(),
            history: HistoryLog::from_items(stored.history, history_limit),
            theme: stored.theme,
            mode: Mode::default(),
            ai: AiQueryState::default(),
            ai_generation: 0,
            preferences,
            model: String::new(),
        }
    }

    /// 记录 AI 后端的模型名，随快照展示
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn calculator(&self) -> &Calculator {
        &self.calculator
    }

    pub fn history(&self) -> &HistoryLog {
        &self.history
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn ai(&self) -> &AiQueryState {
        &self.ai
    }

    /// 执行一条命令；若需要发起 AI 查询则返回派发描述
    pub fn handle(&mut self, command: Command) -> Option<AiDispatch> {
        match command {
            Command::Digit(d) => self.calculator.append_digit(d),
            Command::Operator(op) => self.calculator.apply_operator(op),
            Command::Scientific(function) => {
                if let Err(e) = self.calculator.apply_scientific(function) {
                    tracing::debug!("{}", e);
                }
            }
            Command::Percent => {
                if let Err(e) = self.calculator.percent() {
                    tracing::debug!("{}", e);
                }
            }
            Command::Clear => self.calculator.clear(),
            Command::Backspace => self.calculator.backspace(),
            Command::Evaluate => self.evaluate(),
            Command::SetMode(mode) => self.mode = mode,
            Command::ToggleTheme => {
                self.theme = self.theme.toggled();
                self.persist_theme();
            }
            Command::ClearHistory => {
                self.history.clear();
                self.persist_history();
            }
            Command::SetAiInput(input) => self.ai.input = input,
            Command::AttachImage(image) => self.ai.image = Some(image),
            Command::RemoveImage => self.ai.image = None,
            Command::SubmitAi => return self.submit_ai(),
            Command::DismissAi => self.dismiss_ai(),
            Command::Quit => {}
        }
        None
    }

    fn evaluate(&mut self) {
        match self.calculator.evaluate() {
            Ok(evaluation) => {
                self.history
                    .record(evaluation.expression, evaluation.result);
                self.persist_history();
            }
            Err(e) => tracing::debug!("{}", e),
        }
    }

    fn submit_ai(&mut self) -> Option<AiDispatch> {
        if self.ai.loading {
            tracing::debug!("AI query already in flight, ignoring submit");
            return None;
        }
        if !self.ai.has_query() {
            return None;
        }

        self.ai_generation += 1;
        self.ai.loading = true;
        self.ai.result = None;
        Some(AiDispatch {
            generation: self.ai_generation,
            prompt: self.ai.input.clone(),
            image: self.ai.image.clone(),
        })
    }

    fn dismiss_ai(&mut self) {
        if self.ai.loading {
            tracing::info!("Discarding in-flight AI query {}", self.ai_generation);
            self.ai_generation += 1;
        }
        self.ai = AiQueryState::default();
    }

    /// 写回 AI 结果；generation 过期或未在等待时丢弃并返回 false
    pub fn finish_ai(&mut self, generation: u64, response: AiResponse) -> bool {
        if generation != self.ai_generation || !self.ai.loading {
            tracing::info!(
                "Dropping stale AI response (generation {}, current {})",
                generation,
                self.ai_generation
            );
            return false;
        }
        self.ai.loading = false;
        self.ai.result = Some(response);
        true
    }

    fn persist_history(&mut self) {
        if let Err(e) = self.preferences.save_history(self.history.items()) {
            tracing::warn!("Failed to save history: {}", e);
        }
    }

    fn persist_theme(&mut self) {
        if let Err(e) = self.preferences.save_theme(self.theme) {
            tracing::warn!("Failed to save theme: {}", e);
        }
    }

    /// 投影出 UI 可渲染的快照
    pub fn snapshot(&self) -> UiState {
        UiState {
            mode: self.mode,
            theme: self.theme,
            display: self.calculator.display().to_string(),
            expression: self.calculator.expression().to_string(),
            phase: self.calculator.phase(),
            history: self.history.items().to_vec(),
            history_limit: self.history.limit(),
            ai: self.ai.clone(),
            model: self.model.clone(),
        }
    }
}
