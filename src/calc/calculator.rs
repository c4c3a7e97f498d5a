//! 输入/显示状态机
//!
//! `expression` 为已累积的左侧表达式（含末尾运算符与空格），`entry` 为当前正在输入的操作数。
//! entry 显式建模为 Zero / Operand / Error 三态，display 由它投影而来，永不为空。
//!
//! 输入策略：
//! - 同一操作数内第二个小数点被忽略（不会产生 "1.2.3"）；
//! - 连续按运算符时，中间的 "0" 作为真实操作数写入表达式（如 `2 + 0 * `）；
//! - 求值成功后显示结果，继续按数字会接在结果后面。

use std::fmt;

use crate::calc::eval::evaluate_expression;
use crate::calc::format::format_number;
use crate::calc::scientific::{FunctionKind, ScientificFunction};
use crate::core::{CalcError, EvalError};

/// 错误状态下显示的字面量
pub const DISPLAY_ERROR: &str = "Error";
const DISPLAY_ZERO: &str = "0";

/// 二元运算符（表达式中使用 `+ - * / ^`）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Power,
}

impl Operator {
    pub fn symbol(&self) -> &'static str {
        match self {
            Operator::Add => "+",
            Operator::Subtract => "-",
            Operator::Multiply => "*",
            Operator::Divide => "/",
            Operator::Power => "^",
        }
    }

    /// 同时接受 ASCII 与显示符号（× ÷）
    pub fn from_symbol(c: char) -> Option<Self> {
        match c {
            '+' => Some(Operator::Add),
            '-' => Some(Operator::Subtract),
            '*' | '×' => Some(Operator::Multiply),
            '/' | '÷' => Some(Operator::Divide),
            '^' => Some(Operator::Power),
            _ => None,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Entry {
    /// 显示 "0"，尚未输入任何数字
    Zero,
    /// 非 "0" 的操作数文本（键入的数字，或求值 / 科学函数的结果）
    Operand(String),
    Error,
}

/// 供界面使用的阶段视图
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Phase {
    /// 无待定运算，显示 "0"
    #[default]
    Ready,
    /// 正在输入或显示一个操作数
    Entering,
    /// 运算符已按下，等待右操作数
    PendingOperator,
    Error,
}

/// 一次成功求值：完整表达式与规范化结果
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub expression: String,
    pub result: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Calculator {
    expression: String,
    entry: Entry,
}

impl Default for Calculator {
    fn default() -> Self {
        Self::new()
    }
}

impl Calculator {
    pub fn new() -> Self {
        Self {
            expression: String::new(),
            entry: Entry::Zero,
        }
    }

    pub fn display(&self) -> &str {
        match &self.entry {
            Entry::Zero => DISPLAY_ZERO,
            Entry::Operand(s) => s,
            Entry::Error => DISPLAY_ERROR,
        }
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    pub fn is_error(&self) -> bool {
        self.entry == Entry::Error
    }

    pub fn phase(&self) -> Phase {
        match (&self.entry, self.expression.is_empty()) {
            (Entry::Error, _) => Phase::Error,
            (Entry::Operand(_), _) => Phase::Entering,
            (Entry::Zero, true) => Phase::Ready,
            (Entry::Zero, false) => Phase::PendingOperator,
        }
    }

    /// 数字键（'0'..='9'）与小数点；其他字符忽略
    pub fn append_digit(&mut self, digit: char) {
        match digit {
            '.' => self.append_decimal_point(),
            d if d.is_ascii_digit() => match &mut self.entry {
                Entry::Operand(s) => s.push(d),
                Entry::Zero | Entry::Error => {
                    self.entry = if d == '0' {
                        Entry::Zero
                    } else {
                        Entry::Operand(d.to_string())
                    };
                }
            },
            other => tracing::debug!("Ignoring non-digit key {:?}", other),
        }
    }

    fn append_decimal_point(&mut self) {
        match &mut self.entry {
            Entry::Operand(s) if s.contains('.') => {
                tracing::debug!("Operand {} already has a decimal point", s);
            }
            Entry::Operand(s) => s.push('.'),
            Entry::Zero | Entry::Error => self.entry = Entry::Operand("0.".to_string()),
        }
    }

    /// `expression += display + " " + op + " "`，display 复位为 "0"；错误态下无操作
    pub fn apply_operator(&mut self, op: Operator) {
        if self.is_error() {
            return;
        }
        let display = self.display().to_string();
        self.expression
            .push_str(&format!("{} {} ", display, op.symbol()));
        self.entry = Entry::Zero;
    }

    pub fn clear(&mut self) {
        self.expression.clear();
        self.entry = Entry::Zero;
    }

    /// 删除当前操作数的最后一个字符；删空（或只剩 "-"）时回到 "0"；不影响 expression
    pub fn backspace(&mut self) {
        let Entry::Operand(s) = &mut self.entry else {
            self.entry = Entry::Zero;
            return;
        };
        s.pop();
        if s.is_empty() || s == "-" || s == DISPLAY_ZERO {
            self.entry = Entry::Zero;
        }
    }

    /// 科学函数：一元变换立即计算，常量替换显示，pow 等价于 `^`；
    /// 结果非有限数（如 log(-1)、sqrt(-1)）时进入错误态
    pub fn apply_scientific(&mut self, function: ScientificFunction) -> Result<(), CalcError> {
        match function.kind() {
            FunctionKind::Power => {
                self.apply_operator(Operator::Power);
                Ok(())
            }
            FunctionKind::Constant(value) => {
                self.set_value(value, function.name())
            }
            FunctionKind::Unary(transform) => {
                let value = transform(self.current_value());
                self.set_value(value, function.name())
            }
        }
    }

    /// 百分号：当前操作数除以 100
    pub fn percent(&mut self) -> Result<(), CalcError> {
        let value = self.current_value() / 100.0;
        self.set_value(value, "%")
    }

    /// 求值 `expression + display`。成功时显示结果并清空 expression；
    /// 失败时进入错误态，expression 保持不变
    pub fn evaluate(&mut self) -> Result<Evaluation, CalcError> {
        let full = format!("{}{}", self.expression, self.display());
        let outcome = evaluate_expression(&full)
            .and_then(|value| format_number(value).ok_or(EvalError::NonFinite));

        match outcome {
            Ok(result) => {
                self.expression.clear();
                self.entry = Self::entry_for(&result);
                Ok(Evaluation {
                    expression: full,
                    result,
                })
            }
            Err(e) => {
                tracing::debug!("Evaluation of {:?} failed: {}", full, e);
                self.entry = Entry::Error;
                Err(e.into())
            }
        }
    }

    /// 当前显示值；错误态或无法解析时为 NaN
    fn current_value(&self) -> f64 {
        match &self.entry {
            Entry::Zero => 0.0,
            Entry::Operand(s) => s.parse::<f64>().unwrap_or(f64::NAN),
            Entry::Error => f64::NAN,
        }
    }

    fn set_value(&mut self, value: f64, function: &str) -> Result<(), CalcError> {
        match format_number(value) {
            Some(text) => {
                self.entry = Self::entry_for(&text);
                Ok(())
            }
            None => {
                let input = self.display().to_string();
                self.entry = Entry::Error;
                Err(CalcError::Domain {
                    function: function.to_string(),
                    input,
                })
            }
        }
    }

    fn entry_for(text: &str) -> Entry {
        if text == DISPLAY_ZERO {
            Entry::Zero
        } else {
            Entry::Operand(text.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn typed(keys: &str) -> Calculator {
        let mut calc = Calculator::new();
        for c in keys.chars() {
            calc.append_digit(c);
        }
        calc
    }

    #[test]
    fn test_initial_state() {
        let calc = Calculator::new();
        assert_eq!(calc.display(), "0");
        assert_eq!(calc.expression(), "");
        assert_eq!(calc.phase(), Phase::Ready);
    }

    #[test]
    fn test_no_leading_zero() {
        assert_eq!(typed("05").display(), "5");
        assert_eq!(typed("0005").display(), "5");
        assert_eq!(typed("00").display(), "0");
        assert_eq!(typed("105").display(), "105");
    }

    #[test]
    fn test_decimal_point_policy() {
        assert_eq!(typed(".5").display(), "0.5");
        assert_eq!(typed("1.2.3").display(), "1.23");
        assert_eq!(typed("0.0").display(), "0.0");
    }

    #[test]
    fn test_operator_appends_display() {
        let mut calc = typed("12");
        calc.apply_operator(Operator::Add);
        assert_eq!(calc.expression(), "12 + ");
        assert_eq!(calc.display(), "0");
        assert_eq!(calc.phase(), Phase::PendingOperator);

        calc.append_digit('3');
        calc.apply_operator(Operator::Multiply);
        assert_eq!(calc.expression(), "12 + 3 * ");
        assert_eq!(calc.display(), "0");
    }

    #[test]
    fn test_consecutive_operators_use_zero_operand() {
        let mut calc = typed("2");
        calc.apply_operator(Operator::Add);
        calc.apply_operator(Operator::Multiply);
        assert_eq!(calc.expression(), "2 + 0 * ");
        calc.append_digit('5');
        let evaluation = calc.evaluate().unwrap();
        assert_eq!(evaluation.result, "2");
    }

    #[test]
    fn test_operator_ignored_in_error() {
        let mut calc = typed("6");
        calc.apply_operator(Operator::Divide);
        calc.evaluate().unwrap_err();
        let before = calc.expression().to_string();
        calc.apply_operator(Operator::Add);
        assert_eq!(calc.expression(), before);
        assert_eq!(calc.display(), "Error");
    }

    #[test]
    fn test_evaluate_two_plus_three() {
        let mut calc = typed("2");
        calc.apply_operator(Operator::Add);
        calc.append_digit('3');
        let evaluation = calc.evaluate().unwrap();
        assert_eq!(evaluation.expression, "2 + 3");
        assert_eq!(evaluation.result, "5");
        assert_eq!(calc.display(), "5");
        assert_eq!(calc.expression(), "");
    }

    #[test]
    fn test_division_by_zero_enters_error() {
        let mut calc = typed("6");
        calc.apply_operator(Operator::Divide);
        calc.append_digit('0');
        let err = calc.evaluate().unwrap_err();
        assert_eq!(err, CalcError::Evaluation(EvalError::NonFinite));
        assert_eq!(calc.display(), "Error");
        assert_eq!(calc.expression(), "6 / ");
        assert_eq!(calc.phase(), Phase::Error);
    }

    #[test]
    fn test_digit_replaces_error() {
        let mut calc = typed("6");
        calc.apply_operator(Operator::Divide);
        calc.evaluate().unwrap_err();
        calc.append_digit('7');
        assert_eq!(calc.display(), "7");
    }

    #[test]
    fn test_digits_extend_previous_result() {
        let mut calc = typed("2");
        calc.apply_operator(Operator::Add);
        calc.append_digit('3');
        calc.evaluate().unwrap();
        calc.append_digit('1');
        assert_eq!(calc.display(), "51");
    }

    #[test]
    fn test_backspace() {
        let mut calc = typed("12");
        calc.backspace();
        assert_eq!(calc.display(), "1");
        calc.backspace();
        assert_eq!(calc.display(), "0");
        calc.backspace();
        assert_eq!(calc.display(), "0");
    }

    #[test]
    fn test_backspace_clears_error_but_keeps_expression() {
        let mut calc = typed("6");
        calc.apply_operator(Operator::Divide);
        calc.evaluate().unwrap_err();
        calc.backspace();
        assert_eq!(calc.display(), "0");
        assert_eq!(calc.expression(), "6 / ");
    }

    #[test]
    fn test_clear_resets_everything() {
        let mut calc = typed("9");
        calc.apply_operator(Operator::Subtract);
        calc.append_digit('4');
        calc.clear();
        assert_eq!(calc, Calculator::new());
    }

    #[test]
    fn test_sqrt() {
        let mut calc = typed("16");
        calc.apply_scientific(ScientificFunction::Sqrt).unwrap();
        assert_eq!(calc.display(), "4");
    }

    #[test]
    fn test_sqrt_of_negative_is_error_not_nan() {
        let mut calc = typed("1");
        calc.apply_operator(Operator::Subtract);
        calc.append_digit('1');
        calc.evaluate().unwrap();
        calc.apply_operator(Operator::Subtract);
        calc.append_digit('1');
        calc.evaluate().unwrap();
        assert_eq!(calc.display(), "-1");

        let err = calc.apply_scientific(ScientificFunction::Sqrt).unwrap_err();
        assert!(matches!(err, CalcError::Domain { ref function, .. } if function == "sqrt"));
        assert_eq!(calc.display(), "Error");
    }

    #[test]
    fn test_log_of_zero_is_error() {
        let mut calc = Calculator::new();
        assert!(calc.apply_scientific(ScientificFunction::Log).is_err());
        assert_eq!(calc.display(), "Error");
    }

    #[test]
    fn test_trig_in_radians() {
        let mut calc = Calculator::new();
        calc.apply_scientific(ScientificFunction::Sin).unwrap();
        assert_eq!(calc.display(), "0");
        calc.apply_scientific(ScientificFunction::Cos).unwrap();
        assert_eq!(calc.display(), "1");
    }

    #[test]
    fn test_constants_replace_display() {
        let mut calc = typed("42");
        calc.apply_scientific(ScientificFunction::Pi).unwrap();
        assert_eq!(calc.display(), "3.141592653589793");
        calc.apply_scientific(ScientificFunction::E).unwrap();
        assert_eq!(calc.display(), "2.718281828459045");
    }

    #[test]
    fn test_pow_defers_to_evaluation() {
        let mut calc = typed("2");
        calc.apply_scientific(ScientificFunction::Pow).unwrap();
        assert_eq!(calc.expression(), "2 ^ ");
        assert_eq!(calc.display(), "0");
        calc.append_digit('1');
        calc.append_digit('0');
        assert_eq!(calc.evaluate().unwrap().result, "1024");
    }

    #[test]
    fn test_percent() {
        let mut calc = typed("50");
        calc.percent().unwrap();
        assert_eq!(calc.display(), "0.5");
    }

    #[test]
    fn test_scientific_on_error_stays_error() {
        let mut calc = typed("6");
        calc.apply_operator(Operator::Divide);
        calc.evaluate().unwrap_err();
        assert!(calc.apply_scientific(ScientificFunction::Sin).is_err());
        assert_eq!(calc.display(), "Error");
    }

    #[test]
    fn test_held_power_key_evaluates() {
        let mut calc = typed("1");
        for _ in 0..10_000 {
            calc.apply_operator(Operator::Power);
            calc.append_digit('1');
        }
        assert_eq!(calc.evaluate().unwrap().result, "1");
    }

    #[test]
    fn test_operator_symbols() {
        assert_eq!(Operator::from_symbol('×'), Some(Operator::Multiply));
        assert_eq!(Operator::from_symbol('÷'), Some(Operator::Divide));
        assert_eq!(Operator::from_symbol('x'), None);
    }
}
