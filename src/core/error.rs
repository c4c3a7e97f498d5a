//! 计算错误类型
//!
//! 所有错误都只作用于单次操作：调用方把显示置为 "Error"，不向上传播，也不会让进程退出。

use thiserror::Error;

/// 表达式求值失败（格式错误、除零、溢出等）
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("Unexpected character: {0:?}")]
    UnexpectedChar(char),

    #[error("Malformed number: {0}")]
    MalformedNumber(String),

    #[error("Unexpected token: {0}")]
    UnexpectedToken(String),

    #[error("Unexpected end of expression")]
    UnexpectedEnd,

    /// 结果或中间值为 Infinity / NaN（如 6 / 0）
    #[error("Result is not a finite number")]
    NonFinite,
}

/// 计算器操作错误：求值失败或科学函数超出定义域
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CalcError {
    #[error("Evaluation error: {0}")]
    Evaluation(#[from] EvalError),

    #[error("Domain error: {function}({input})")]
    Domain { function: String, input: String },
}
