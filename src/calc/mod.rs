//! 计算层：输入/显示状态机、科学函数、算术求值器、结果格式化

pub mod calculator;
pub mod eval;
pub mod format;
pub mod scientific;

pub use calculator::{Calculator, Evaluation, Operator, Phase, DISPLAY_ERROR};
pub use eval::evaluate_expression;
pub use format::format_number;
pub use scientific::{FunctionKind, ScientificFunction};
