//! 科学函数面板
//!
//! 一元变换（sin/cos/tan 弧度制、log 以 10 为底、ln、sqrt）、常量（π、e），
//! 以及 pow：与 `^` 运算符等价，延迟到求值时计算。

use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScientificFunction {
    Sin,
    Cos,
    Tan,
    Log,
    Ln,
    Sqrt,
    Pow,
    Pi,
    E,
}

/// 科学函数的作用方式
#[derive(Debug, Clone, Copy)]
pub enum FunctionKind {
    /// 立即作用于当前显示值
    Unary(fn(f64) -> f64),
    /// 直接替换显示值
    Constant(f64),
    /// 等价于追加 `^` 运算符
    Power,
}

impl ScientificFunction {
    /// 面板上的排列顺序
    pub const ALL: [ScientificFunction; 9] = [
        ScientificFunction::Sin,
        ScientificFunction::Cos,
        ScientificFunction::Tan,
        ScientificFunction::Pi,
        ScientificFunction::E,
        ScientificFunction::Log,
        ScientificFunction::Ln,
        ScientificFunction::Sqrt,
        ScientificFunction::Pow,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ScientificFunction::Sin => "sin",
            ScientificFunction::Cos => "cos",
            ScientificFunction::Tan => "tan",
            ScientificFunction::Log => "log",
            ScientificFunction::Ln => "ln",
            ScientificFunction::Sqrt => "sqrt",
            ScientificFunction::Pow => "pow",
            ScientificFunction::Pi => "pi",
            ScientificFunction::E => "e",
        }
    }

    /// 按键上的标签
    pub fn label(&self) -> &'static str {
        match self {
            ScientificFunction::Sqrt => "√",
            ScientificFunction::Pow => "^",
            ScientificFunction::Pi => "π",
            other => other.name(),
        }
    }

    pub fn kind(&self) -> FunctionKind {
        match self {
            ScientificFunction::Sin => FunctionKind::Unary(f64::sin),
            ScientificFunction::Cos => FunctionKind::Unary(f64::cos),
            ScientificFunction::Tan => FunctionKind::Unary(f64::tan),
            ScientificFunction::Log => FunctionKind::Unary(f64::log10),
            ScientificFunction::Ln => FunctionKind::Unary(f64::ln),
            ScientificFunction::Sqrt => FunctionKind::Unary(f64::sqrt),
            ScientificFunction::Pi => FunctionKind::Constant(std::f64::consts::PI),
            ScientificFunction::E => FunctionKind::Constant(std::f64::consts::E),
            ScientificFunction::Pow => FunctionKind::Power,
        }
    }
}

impl fmt::Display for ScientificFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ScientificFunction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|f| f.name() == s)
            .ok_or_else(|| format!("Unknown scientific function: {s}"))
    }
}
