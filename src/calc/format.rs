//! 结果规范化：数值 -> 显示字符串
//!
//! 规则：使用 f64 的最短往返十进制表示（`{}`），整数不带 ".0"，不使用指数记法；
//! -0 归一为 "0"；Infinity / NaN 不可显示，返回 None 由调用方转成 "Error"。

/// 将有限数值格式化为规范字符串；非有限值返回 None
pub fn format_number(value: f64) -> Option<String> {
    if !value.is_finite() {
        return None;
    }
    if value == 0.0 {
        return Some("0".to_string());
    }
    Some(format!("{}", value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integers_drop_fraction() {
        assert_eq!(format_number(5.0).as_deref(), Some("5"));
        assert_eq!(format_number(-12.0).as_deref(), Some("-12"));
    }

    #[test]
    fn test_shortest_round_trip() {
        assert_eq!(format_number(0.1 + 0.2).as_deref(), Some("0.30000000000000004"));
        assert_eq!(format_number(2.5).as_deref(), Some("2.5"));
        assert_eq!(
            format_number(std::f64::consts::PI).as_deref(),
            Some("3.141592653589793")
        );
    }

    #[test]
    fn test_no_exponent_notation() {
        assert_eq!(
            format_number(1e21).as_deref(),
            Some("1000000000000000000000")
        );
        assert_eq!(format_number(1e-7).as_deref(), Some("0.0000001"));
    }

    #[test]
    fn test_negative_zero_and_non_finite() {
        assert_eq!(format_number(-0.0).as_deref(), Some("0"));
        assert_eq!(format_number(f64::INFINITY), None);
        assert_eq!(format_number(f64::NAN), None);
    }
}
