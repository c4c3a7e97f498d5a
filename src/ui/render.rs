//! 界面渲染
//!
//! 根据 UiState 与本地视图状态绘制：顶部模式标签与主题，主体为计算器 / AI 面板或历史抽屉，
//! 底部为快捷键提示。配色随主题切换。

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Tabs, Wrap},
    Frame,
};

use crate::calc::{Phase, ScientificFunction};
use crate::core::{Mode, Theme, UiState};
use crate::llm::AiResponse;

/// 只存在于终端一侧的视图状态
#[derive(Debug, Default, Clone)]
pub struct ViewState {
    pub history_open: bool,
    pub history_scroll: u16,
    /// AI 输入缓冲
    pub ai_buffer: String,
    /// 一次性提示（如图片读取失败）
    pub notice: Option<String>,
}

/// 主题配色
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    pub bg: Color,
    pub fg: Color,
    pub dim: Color,
    pub accent: Color,
    pub error: Color,
}

impl Palette {
    pub fn for_theme(theme: Theme) -> Self {
        match theme {
            Theme::Dark => Self {
                bg: Color::Rgb(9, 9, 11),
                fg: Color::Rgb(244, 244, 245),
                dim: Color::Rgb(113, 113, 122),
                accent: Color::Rgb(129, 140, 248),
                error: Color::Rgb(248, 113, 113),
            },
            Theme::Light => Self {
                bg: Color::Rgb(250, 250, 250),
                fg: Color::Rgb(24, 24, 27),
                dim: Color::Rgb(113, 113, 122),
                accent: Color::Rgb(79, 70, 229),
                error: Color::Rgb(220, 38, 38),
            },
        }
    }
}

/// 绘制一帧
pub fn draw(f: &mut Frame, state: &UiState, view: &ViewState) {
    let palette = Palette::for_theme(state.theme);
    f.render_widget(
        Block::default().style(Style::default().bg(palette.bg).fg(palette.fg)),
        f.area(),
    );

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(8),
            Constraint::Length(1),
        ])
        .split(f.area());

    draw_header(f, chunks[0], state, &palette);
    if view.history_open {
        draw_history(f, chunks[1], state, view, &palette);
    } else {
        match state.mode {
            Mode::Standard | Mode::Scientific => draw_calculator(f, chunks[1], state, &palette),
            Mode::Ai => draw_ai(f, chunks[1], state, view, &palette),
        }
    }
    draw_footer(f, chunks[2], state, view, &palette);
}

fn draw_header(f: &mut Frame, area: Rect, state: &UiState, palette: &Palette) {
    let titles: Vec<Line> = Mode::ALL
        .iter()
        .enumerate()
        .map(|(i, m)| Line::from(format!(" F{} {} ", i + 1, m.title())))
        .collect();
    let selected = Mode::ALL
        .iter()
        .position(|m| *m == state.mode)
        .unwrap_or(0);

    let theme_icon = match state.theme {
        Theme::Dark => "☾ dark",
        Theme::Light => "☀ light",
    };
    let block = Block::default()
        .title(" CalcLab ")
        .title(Line::from(format!(" {} ", theme_icon)).alignment(Alignment::Right))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.dim));

    let tabs = Tabs::new(titles)
        .block(block)
        .select(selected)
        .style(Style::default().fg(palette.dim))
        .highlight_style(
            Style::default()
                .fg(palette.accent)
                .add_modifier(Modifier::BOLD),
        )
        .divider("│");
    f.render_widget(tabs, area);
}

fn draw_calculator(f: &mut Frame, area: Rect, state: &UiState, palette: &Palette) {
    let sci_height = if state.mode == Mode::Scientific { 4 } else { 0 };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5),
            Constraint::Length(sci_height),
            Constraint::Min(6),
        ])
        .split(area);

    let display_style = match state.phase {
        Phase::Error => Style::default()
            .fg(palette.error)
            .add_modifier(Modifier::BOLD),
        _ => Style::default().fg(palette.fg).add_modifier(Modifier::BOLD),
    };
    let screen = Paragraph::new(Text::from(vec![
        Line::from(Span::styled(
            state.expression.clone(),
            Style::default().fg(palette.dim),
        )),
        Line::from(""),
        Line::from(Span::styled(state.display.clone(), display_style)),
    ]))
    .alignment(Alignment::Right)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(palette.dim)),
    );
    f.render_widget(screen, chunks[0]);

    if state.mode == Mode::Scientific {
        let sci = Paragraph::new(scientific_legend(palette))
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .title(" Scientific ")
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(palette.dim)),
            );
        f.render_widget(sci, chunks[1]);
    }

    let keypad = Paragraph::new(keypad_legend(palette))
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(palette.dim)),
        );
    f.render_widget(keypad, chunks[2]);
}

fn key_span(key: &str, label: &str, palette: &Palette, style: Style) -> Vec<Span<'static>> {
    vec![
        Span::styled(format!(" {:^5}", label), style),
        Span::styled(format!("{:<4}", key), Style::default().fg(palette.dim)),
    ]
}

/// 科学函数面板：两行，括号内为快捷键
fn scientific_legend(palette: &Palette) -> Text<'static> {
    let shortcut = |function: ScientificFunction| match function {
        ScientificFunction::Sin => "s",
        ScientificFunction::Cos => "o",
        ScientificFunction::Tan => "t",
        ScientificFunction::Pi => "p",
        ScientificFunction::E => "e",
        ScientificFunction::Log => "l",
        ScientificFunction::Ln => "n",
        ScientificFunction::Sqrt => "r",
        ScientificFunction::Pow => "^",
    };
    let style = Style::default().fg(palette.accent);
    let lines: Vec<Line> = ScientificFunction::ALL
        .chunks(5)
        .map(|row| {
            let spans: Vec<Span> = row
                .iter()
                .flat_map(|function| {
                    vec![
                        Span::styled(format!(" {:^5}", function.label()), style),
                        Span::styled(
                            format!("{:<4}", format!("({})", shortcut(*function))),
                            Style::default().fg(palette.dim),
                        ),
                    ]
                })
                .collect();
            Line::from(spans)
        })
        .collect();
    Text::from(lines)
}

/// 标准键盘（与实体按键对应的 4 列布局）
fn keypad_legend(palette: &Palette) -> Text<'static> {
    let digit = Style::default().fg(palette.fg);
    let action = Style::default().fg(palette.dim).add_modifier(Modifier::BOLD);
    let operator = Style::default()
        .fg(palette.accent)
        .add_modifier(Modifier::BOLD);

    let rows: [[(&'static str, &'static str, Style); 4]; 5] = [
        [("Esc", "AC", action), ("Bksp", "⌫", action), ("%", "%", action), ("/", "÷", operator)],
        [("7", "7", digit), ("8", "8", digit), ("9", "9", digit), ("*", "×", operator)],
        [("4", "4", digit), ("5", "5", digit), ("6", "6", digit), ("-", "-", operator)],
        [("1", "1", digit), ("2", "2", digit), ("3", "3", digit), ("+", "+", operator)],
        [("0", "0", digit), (".", ".", digit), ("^", "^", operator), ("Enter", "=", operator)],
    ];

    let mut lines = Vec::new();
    for row in rows {
        let spans: Vec<Span> = row
            .iter()
            .flat_map(|(key, label, style)| {
                let key: &str = if key == label { "" } else { key };
                key_span(key, label, palette, *style)
            })
            .collect();
        lines.push(Line::from(spans));
        lines.push(Line::from(""));
    }
    Text::from(lines)
}

/// AI 输入框标题，带上模型名
fn ask_title(state: &UiState) -> String {
    let label = if state.ai.loading { "Waiting…" } else { "Ask" };
    if state.model.is_empty() {
        format!(" {} ", label)
    } else {
        format!(" {} ({}) ", label, state.model)
    }
}

fn history_title(state: &UiState) -> String {
    format!(" History ({}/{}) ", state.history.len(), state.history_limit)
}

fn draw_ai(f: &mut Frame, area: Rect, state: &UiState, view: &ViewState, palette: &Palette) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Length(4),
            Constraint::Min(4),
        ])
        .split(area);

    let intro = Paragraph::new(Text::from(vec![
        Line::from(Span::styled(
            "AI Math Lab",
            Style::default()
                .fg(palette.accent)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            "Type a problem or attach a photo with /image <path>. The AI solves it step by step.",
            Style::default().fg(palette.dim),
        )),
    ]))
    .wrap(Wrap { trim: true })
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(palette.accent)),
    );
    f.render_widget(intro, chunks[0]);

    let image_line = match &state.ai.image {
        Some(image) => Line::from(vec![
            Span::styled("▣ ", Style::default().fg(palette.accent)),
            Span::raw(format!(
                "{} ({} KB)",
                image.mime_type,
                image.approx_size().div_ceil(1024)
            )),
            Span::styled("  /noimage to remove", Style::default().fg(palette.dim)),
        ]),
        None => Line::from(Span::styled("No image", Style::default().fg(palette.dim))),
    };
    let input = Paragraph::new(Text::from(vec![
        Line::from(vec![
            Span::raw(view.ai_buffer.clone()),
            Span::styled("▏", Style::default().fg(palette.accent)),
        ]),
        image_line,
    ]))
    .wrap(Wrap { trim: false })
    .block(
        Block::default()
            .title(ask_title(state))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(palette.dim)),
    );
    f.render_widget(input, chunks[1]);

    let body = if state.ai.loading {
        Text::from(Line::from(Span::styled(
            "Thinking…",
            Style::default().fg(palette.dim).add_modifier(Modifier::ITALIC),
        )))
    } else if let Some(result) = &state.ai.result {
        result_text(result, palette)
    } else {
        Text::from("")
    };
    let result = Paragraph::new(body).wrap(Wrap { trim: false }).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(palette.dim)),
    );
    f.render_widget(result, chunks[2]);
}

fn section_title(title: &'static str, palette: &Palette) -> Line<'static> {
    Line::from(Span::styled(
        title,
        Style::default()
            .fg(palette.accent)
            .add_modifier(Modifier::BOLD),
    ))
}

fn result_text(result: &AiResponse, palette: &Palette) -> Text<'static> {
    let mut lines = vec![
        section_title("FINAL ANSWER", palette),
        Line::from(Span::styled(
            result.answer.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        section_title("EXPLANATION", palette),
        Line::from(result.explanation.clone()),
    ];
    if let Some(steps) = result.steps.as_ref().filter(|s| !s.is_empty()) {
        lines.push(Line::from(""));
        lines.push(section_title("STEPS", palette));
        for (i, step) in steps.iter().enumerate() {
            lines.push(Line::from(vec![
                Span::styled(format!("{:>2}. ", i + 1), Style::default().fg(palette.dim)),
                Span::raw(step.clone()),
            ]));
        }
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Esc: ask another question",
        Style::default().fg(palette.dim),
    )));
    Text::from(lines)
}

fn draw_history(f: &mut Frame, area: Rect, state: &UiState, view: &ViewState, palette: &Palette) {
    let text = if state.history.is_empty() {
        Text::from(Line::from(Span::styled(
            "Your history is empty",
            Style::default().fg(palette.dim),
        )))
    } else {
        let mut lines = Vec::new();
        for item in &state.history {
            lines.push(Line::from(Span::styled(
                item.expression.clone(),
                Style::default().fg(palette.dim),
            )));
            lines.push(Line::from(Span::styled(
                item.result.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            )));
            lines.push(Line::from(""));
        }
        Text::from(lines)
    };

    let mut block = Block::default()
        .title(history_title(state))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.accent));
    if !state.history.is_empty() {
        block = block.title_bottom(Line::from(Span::styled(
            " Del: clear memory ",
            Style::default().fg(palette.error),
        )));
    }
    let paragraph = Paragraph::new(text)
        .block(block)
        .scroll((view.history_scroll, 0));
    f.render_widget(paragraph, area);
}

fn draw_footer(f: &mut Frame, area: Rect, state: &UiState, view: &ViewState, palette: &Palette) {
    let line = if let Some(notice) = &view.notice {
        Line::from(Span::styled(notice.clone(), Style::default().fg(palette.error)))
    } else {
        let hint = if view.history_open {
            " ↑↓ scroll │ Del clear │ Esc close │ Ctrl+Q quit "
        } else if state.mode == Mode::Ai {
            " Enter submit │ Esc dismiss │ Tab mode │ Ctrl+T theme │ Ctrl+H history │ Ctrl+Q quit "
        } else {
            " Tab/F1-F3 mode │ Ctrl+T theme │ Ctrl+H history │ Ctrl+Q quit "
        };
        Line::from(Span::styled(hint, Style::default().fg(palette.dim)))
    };
    f.render_widget(Paragraph::new(line), area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ask_title_shows_model() {
        let mut state = UiState {
            model: "gemini-2.5-flash".to_string(),
            ..UiState::default()
        };
        assert_eq!(ask_title(&state), " Ask (gemini-2.5-flash) ");
        state.ai.loading = true;
        assert_eq!(ask_title(&state), " Waiting… (gemini-2.5-flash) ");
        state.model.clear();
        assert_eq!(ask_title(&state), " Waiting… ");
    }

    #[test]
    fn test_history_title_shows_capacity() {
        let state = UiState {
            history_limit: 20,
            ..UiState::default()
        };
        assert_eq!(history_title(&state), " History (0/20) ");
    }
}
