use std::collections::HashSet;

use crate::models::DataType;
use super::types::FIELD_SEPARATOR;

/// Splits on `\n`, `\r\n` or a lone `\r`.
pub fn split_lines(text: &str) -> impl Iterator<Item = &str> {
    text.split("\r\n").flat_map(|chunk| chunk.split(['\r', '\n']))
}

/// Plain separator split. Empty fields, including a trailing one, are kept.
pub fn split_fields(line: &str) -> Vec<&str> {
    line.split(FIELD_SEPARATOR).collect()
}

/// Accepts `[+-]? (digits ('.' digits?)? | '.' digits) ([eE] [+-]? digits)?`.
pub fn is_decimal(value: &str) -> bool {
    let bytes = value.as_bytes();
    let mut pos = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        pos += 1;
    }

    let int_digits = count_digits(&bytes[pos..]);
    pos += int_digits;

    let mut frac_digits = 0;
    if bytes.get(pos) == Some(&b'.') {
        pos += 1;
        frac_digits = count_digits(&bytes[pos..]);
        pos += frac_digits;
    }

    if int_digits == 0 && frac_digits == 0 {
        return false;
    }

    if matches!(bytes.get(pos), Some(b'e' | b'E')) {
        pos += 1;
        if matches!(bytes.get(pos), Some(b'+' | b'-')) {
            pos += 1;
        }
        let exp_digits = count_digits(&bytes[pos..]);
        if exp_digits == 0 {
            return false;
        }
        pos += exp_digits;
    }

    pos == bytes.len()
}

fn count_digits(bytes: &[u8]) -> usize {
    bytes.iter().take_while(|b| b.is_ascii_digit()).count()
}

/// Numeric value of a decimal token. Tokens outside the finite `f64` range yield `None`
/// and take no part in the aggregates.
pub fn parse_decimal(value: &str) -> Option<f64> {
    if !is_decimal(value) {
        return None;
    }
    value.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Average of two finite values without overflowing to infinity.
fn midpoint(a: f64, b: f64) -> f64 {
    let sum = a + b;
    if sum.is_finite() {
        sum / 2.0
    } else {
        a / 2.0 + b / 2.0
    }
}

/// Arithmetic mean of finite values. Falls back to summing pre-divided terms when the
/// plain sum overflows.
fn mean(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    let sum = values.iter().sum::<f64>();
    if sum.is_finite() {
        sum / n
    } else {
        values.iter().map(|v| v / n).sum()
    }
}

/// Decimal literal without fraction or exponent that fits in an `i64`.
pub fn is_integer(value: &str) -> bool {
    if value.contains(['.', 'e', 'E']) {
        return false;
    }
    is_decimal(value) && value.parse::<i64>().is_ok()
}

pub fn is_boolean(value: &str) -> bool {
    value.eq_ignore_ascii_case("true") || value.eq_ignore_ascii_case("false")
}

/// Checked in order BOOLEAN, INTEGER, DECIMAL, falling back to STRING.
pub fn infer_data_type(values: &HashSet<String>) -> DataType {
    if values.is_empty() {
        return DataType::String;
    }

    match () {
        _ if values.iter().all(|v| is_boolean(v)) => DataType::Boolean,
        _ if values.iter().all(|v| is_integer(v)) => DataType::Integer,
        _ if values.iter().all(|v| is_decimal(v)) => DataType::Decimal,
        _ => DataType::String,
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumericSummary {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
}

impl NumericSummary {
    /// `None` when there are no values.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let n = sorted.len();
        let median = if n % 2 == 1 {
            sorted[n / 2]
        } else {
            midpoint(sorted[n / 2 - 1], sorted[n / 2])
        };

        Some(Self {
            min: sorted[0],
            max: sorted[n - 1],
            mean: mean(values),
            median,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(values: &[&str]) -> HashSet<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_decimal_grammar() {
        for ok in ["0", "-1", "+1", "1.5", ".5", "5.", "1e5", "1E+5", "-2.5e-3", "007"] {
            assert!(is_decimal(ok), "{ok} should be decimal");
        }
        for bad in ["", "+", "-", ".", "1.2.3", "1e", "e5", "1,000", "NaN", "inf", "0x10", "1 2", "١"] {
            assert!(!is_decimal(bad), "{bad} should not be decimal");
        }
    }

    #[test]
    fn test_integer_excludes_fraction_and_exponent() {
        assert!(is_integer("42"));
        assert!(is_integer("-7"));
        assert!(is_integer("+7"));
        assert!(!is_integer("1.0"));
        assert!(!is_integer("1e3"));
        assert!(!is_integer("abc"));
        // Outside i64 range still counts as a decimal.
        assert!(!is_integer("99999999999999999999"));
        assert!(is_decimal("99999999999999999999"));
    }

    #[test]
    fn test_type_inference_precedence() {
        assert_eq!(infer_data_type(&set(&["true", "FALSE"])), DataType::Boolean);
        assert_eq!(infer_data_type(&set(&["1", "2", "3"])), DataType::Integer);
        assert_eq!(infer_data_type(&set(&["1.5", "2"])), DataType::Decimal);
        assert_eq!(infer_data_type(&set(&["1", "a"])), DataType::String);
        assert_eq!(infer_data_type(&set(&["true", "1"])), DataType::String);
        assert_eq!(infer_data_type(&HashSet::new()), DataType::String);
    }

    #[test]
    fn test_numeric_summary() {
        let summary = NumericSummary::from_values(&[1.0, 44.0, 16.0]).unwrap();
        assert_eq!(summary.min, 1.0);
        assert_eq!(summary.max, 44.0);
        assert_eq!(summary.mean, 20.333333333333332);
        assert_eq!(summary.median, 16.0);

        let even = NumericSummary::from_values(&[4.0, 2.0]).unwrap();
        assert_eq!(even.median, 3.0);

        assert!(NumericSummary::from_values(&[]).is_none());
    }

    #[test]
    fn test_out_of_range_decimals_are_not_numeric_values() {
        assert!(is_decimal("1e99999"));
        assert_eq!(parse_decimal("1e99999"), None);
        assert_eq!(parse_decimal("-1e99999"), None);
        assert_eq!(parse_decimal("1e308"), Some(1e308));
    }

    #[test]
    fn test_summary_of_huge_values_stays_finite() {
        let summary = NumericSummary::from_values(&[1e308, 1e308]).unwrap();
        assert_eq!(summary.mean, 1e308);
        assert_eq!(summary.median, 1e308);

        let odd = NumericSummary::from_values(&[1e308, 1e308, 1e308]).unwrap();
        assert!(odd.mean.is_finite());
        assert!((odd.mean - 1e308).abs() < 1e294);
        assert_eq!(odd.median, 1e308);
    }

    #[test]
    fn test_split_lines_handles_all_line_endings() {
        let lines: Vec<_> = split_lines("a\nb\r\nc\rd").collect();
        assert_eq!(lines, vec!["a", "b", "c", "d"]);

        let with_blank: Vec<_> = split_lines("a\n\nb").collect();
        assert_eq!(with_blank, vec!["a", "", "b"]);
    }

    #[test]
    fn test_split_fields_keeps_empty_fields() {
        assert_eq!(split_fields("a,,c"), vec!["a", "", "c"]);
        assert_eq!(split_fields("a,b,"), vec!["a", "b", ""]);
        assert_eq!(split_fields(""), vec![""]);
    }
}
