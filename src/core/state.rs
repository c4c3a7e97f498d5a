//! 状态定义：模式、主题、AI 子状态与 UiState 投影
//!
//! UI 只持有轻量的 UiState 快照；完整状态由 Session 维护并在每次命令后投影出来。

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::calc::Phase;
use crate::llm::{AiResponse, ImageAttachment};
use crate::memory::HistoryItem;

/// 界面模式：决定渲染哪个面板，不影响计算器语义
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Standard,
    Scientific,
    Ai,
}

impl Mode {
    pub const ALL: [Mode; 3] = [Mode::Standard, Mode::Scientific, Mode::Ai];

    pub fn title(&self) -> &'static str {
        match self {
            Mode::Standard => "Basic",
            Mode::Scientific => "Sci",
            Mode::Ai => "AI",
        }
    }

    pub fn next(&self) -> Mode {
        match self {
            Mode::Standard => Mode::Scientific,
            Mode::Scientific => Mode::Ai,
            Mode::Ai => Mode::Standard,
        }
    }
}

/// 主题；持久化为 "light" / "dark"
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    #[default]
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn toggled(&self) -> Theme {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => Err(format!("Unknown theme: {other}")),
        }
    }
}

/// AI 面板子状态：不持久化，关闭结果或重新提交时复位
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AiQueryState {
    pub input: String,
    pub image: Option<ImageAttachment>,
    pub loading: bool,
    pub result: Option<AiResponse>,
}

impl AiQueryState {
    /// 是否有可提交的内容（文字或图片）
    pub fn has_query(&self) -> bool {
        !self.input.trim().is_empty() || self.image.is_some()
    }
}

/// UI 看到的「投影」状态，轻量且易于渲染
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UiState {
    pub mode: Mode,
    pub theme: Theme,
    pub display: String,
    pub expression: String,
    pub phase: Phase,
    pub history: Vec<HistoryItem>,
    /// 历史容量上限
    pub history_limit: usize,
    pub ai: AiQueryState,
    /// 当前 AI 后端的模型名
    pub model: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_theme_round_trip() {
        for theme in [Theme::Light, Theme::Dark] {
            assert_eq!(theme.as_str().parse::<Theme>(), Ok(theme));
        }
        assert!("solarized".parse::<Theme>().is_err());
        assert_eq!(Theme::Dark.toggled(), Theme::Light);
    }

    #[test]
    fn test_mode_cycle() {
        assert_eq!(Mode::Standard.next(), Mode::Scientific);
        assert_eq!(Mode::Ai.next(), Mode::Standard);
    }

    #[test]
    fn test_has_query() {
        let mut ai = AiQueryState::default();
        assert!(!ai.has_query());
        ai.input = "   ".to_string();
        assert!(!ai.has_query());
        ai.image = Some(ImageAttachment::from_bytes(b"img", "image/png"));
        assert!(ai.has_query());
    }
}
