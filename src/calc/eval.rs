//! 表达式求值器（仅算术）
//!
//! 输入为 `expression + display` 拼接出的字符串，先把显示符号（×、÷、^）归一为
//! `* / **`，再分词并用优先级爬升（precedence climbing）求值。
//!
//! 优先级（高到低）：`**`（右结合）> 一元 `-`/`+`（作用于幂的操作数，故 -2 ** 2 = -4）
//! > `* /` > `+ -`（左结合）。不支持括号与标识符，任何中间值或结果为非有限数即失败。

use crate::core::EvalError;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Number(f64),
    Plus,
    Minus,
    Star,
    Slash,
    Pow,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Number(v) => v.to_string(),
            Token::Plus => "+".to_string(),
            Token::Minus => "-".to_string(),
            Token::Star => "*".to_string(),
            Token::Slash => "/".to_string(),
            Token::Pow => "**".to_string(),
        }
    }

    fn binary(&self) -> Option<BinaryOp> {
        match self {
            Token::Plus => Some(BinaryOp::Add),
            Token::Minus => Some(BinaryOp::Sub),
            Token::Star => Some(BinaryOp::Mul),
            Token::Slash => Some(BinaryOp::Div),
            Token::Pow => Some(BinaryOp::Pow),
            Token::Number(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

impl BinaryOp {
    fn precedence(self) -> u8 {
        match self {
            BinaryOp::Add | BinaryOp::Sub => 1,
            BinaryOp::Mul | BinaryOp::Div => 2,
            BinaryOp::Pow => POW_PRECEDENCE,
        }
    }

    fn apply(self, lhs: f64, rhs: f64) -> f64 {
        match self {
            BinaryOp::Add => lhs + rhs,
            BinaryOp::Sub => lhs - rhs,
            BinaryOp::Mul => lhs * rhs,
            BinaryOp::Div => lhs / rhs,
            BinaryOp::Pow => lhs.powf(rhs),
        }
    }
}

const POW_PRECEDENCE: u8 = 3;

/// 显示符号 -> 可求值语法
pub fn normalize(expression: &str) -> String {
    expression
        .replace('×', "*")
        .replace('÷', "/")
        .replace('^', "**")
}

fn tokenize(source: &str) -> Result<Vec<Token>, EvalError> {
    let mut tokens = Vec::new();
    let mut chars = source.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '0'..='9' | '.' => {
                let mut literal = String::new();
                while let Some(&d) = chars.peek() {
                    if d.is_ascii_digit() || d == '.' {
                        literal.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let value = literal
                    .parse::<f64>()
                    .map_err(|_| EvalError::MalformedNumber(literal.clone()))?;
                tokens.push(Token::Number(value));
            }
            '+' => {
                chars.next();
                tokens.push(Token::Plus);
            }
            '-' => {
                chars.next();
                tokens.push(Token::Minus);
            }
            '/' => {
                chars.next();
                tokens.push(Token::Slash);
            }
            '*' => {
                chars.next();
                if chars.peek() == Some(&'*') {
                    chars.next();
                    tokens.push(Token::Pow);
                } else {
                    tokens.push(Token::Star);
                }
            }
            other => return Err(EvalError::UnexpectedChar(other)),
        }
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.peek();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    /// 左结合的 `+ -` 与 `* /`；递归深度只取决于优先级层数
    fn parse_expression(&mut self, min_precedence: u8) -> Result<f64, EvalError> {
        let mut lhs = self.parse_power()?;

        while let Some(token) = self.peek() {
            let Some(op) = token.binary() else {
                return Err(EvalError::UnexpectedToken(token.describe()));
            };
            let precedence = op.precedence();
            if precedence < min_precedence {
                break;
            }
            self.pos += 1;
            let rhs = self.parse_expression(precedence + 1)?;
            lhs = finite(op.apply(lhs, rhs))?;
        }

        Ok(lhs)
    }

    /// 幂链 `[±]a ** [±]b ** ...`：先迭代收集操作数，再从右向左折叠（右结合）。
    /// 操作数前的符号作用于它右侧整条幂链，故 -2 ** 2 = -4，2 ** -3 ** 2 = 2 ** -(9)
    fn parse_power(&mut self) -> Result<f64, EvalError> {
        let mut operands = vec![self.parse_signed()?];
        while self.peek() == Some(Token::Pow) {
            self.pos += 1;
            operands.push(self.parse_signed()?);
        }

        let mut operands = operands.into_iter().rev();
        let Some((negative, last)) = operands.next() else {
            return Err(EvalError::UnexpectedEnd);
        };
        let mut value = if negative { -last } else { last };
        for (negative, base) in operands {
            let power = finite(BinaryOp::Pow.apply(base, value))?;
            value = if negative { -power } else { power };
        }
        Ok(value)
    }

    /// 一元符号序列加一个数字，返回 (是否取负, 数值)
    fn parse_signed(&mut self) -> Result<(bool, f64), EvalError> {
        let mut negative = false;
        loop {
            match self.next() {
                Some(Token::Minus) => negative = !negative,
                Some(Token::Plus) => {}
                Some(Token::Number(value)) => return Ok((negative, value)),
                Some(other) => return Err(EvalError::UnexpectedToken(other.describe())),
                None => return Err(EvalError::UnexpectedEnd),
            }
        }
    }
}

fn finite(value: f64) -> Result<f64, EvalError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(EvalError::NonFinite)
    }
}

/// 求值一条算术表达式（可含 × ÷ ^ 显示符号）
pub fn evaluate_expression(expression: &str) -> Result<f64, EvalError> {
    let tokens = tokenize(&normalize(expression))?;
    let mut parser = Parser { tokens, pos: 0 };
    let value = parser.parse_expression(1)?;
    if let Some(extra) = parser.peek() {
        return Err(EvalError::UnexpectedToken(extra.describe()));
    }
    finite(value)
}
