//! Literal encoding.
//!
//! Culture-invariant renderings of scalar constants, matching the grammar
//! the protocol engine parses back. 64-bit integers carry `L`/`UL`
//! suffixes so the integer family round-trips by kind; doubles always keep
//! at least one fractional digit for the same reason.

use crate::error::RpcError;
use crate::value::Value;

/// Date literals use the invariant general format, UTC, second precision.
pub(crate) const DATE_FORMAT: &str = "%m/%d/%Y %H:%M:%S";

pub(crate) fn write_scalar(value: &Value, out: &mut String) -> Result<(), RpcError> {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(v) => out.push_str(if *v { "true" } else { "false" }),
        Value::Char(v) => {
            out.push('\'');
            if *v == '\'' {
                out.push_str("\\'");
            } else {
                out.push(*v);
            }
            out.push('\'');
        }
        Value::Int(v) => out.push_str(&v.to_string()),
        Value::Long(v) => {
            out.push_str(&v.to_string());
            out.push('L');
        }
        Value::ULong(v) => {
            out.push_str(&v.to_string());
            out.push_str("UL");
        }
        Value::Double(v) => write_double(*v, out)?,
        Value::Date(v) => {
            out.push('#');
            out.push_str(&v.format(DATE_FORMAT).to_string());
            out.push('#');
        }
        Value::Str(v) => {
            out.push('\'');
            for c in v.chars() {
                match c {
                    '\\' => out.push_str("\\\\"),
                    '"' => out.push_str("\\\""),
                    c => out.push(c),
                }
            }
            out.push('\'');
        }
        other => return Err(RpcError::invalid_constant(other.type_name())),
    }
    Ok(())
}

fn write_double(v: f64, out: &mut String) -> Result<(), RpcError> {
    if !v.is_finite() {
        return Err(RpcError::invalid_constant("Double (non-finite)"));
    }
    let rendered = v.to_string();
    out.push_str(&rendered);
    if !rendered.contains('.') {
        // Keep the kind visible on the wire: `3.0`, never `3`.
        out.push_str(".0");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn render(value: Value) -> String {
        let mut out = String::new();
        write_scalar(&value, &mut out).unwrap();
        out
    }

    #[test]
    fn test_integer_family() {
        assert_eq!(render(Value::Int(-7)), "-7");
        assert_eq!(render(Value::Long(7)), "7L");
        assert_eq!(render(Value::ULong(7)), "7UL");
    }

    #[test]
    fn test_double_keeps_fraction() {
        assert_eq!(render(Value::Double(3.5)), "3.5");
        assert_eq!(render(Value::Double(3.0)), "3.0");
        assert_eq!(render(Value::Double(-0.25)), "-0.25");
    }

    #[test]
    fn test_char_and_string_escapes() {
        assert_eq!(render(Value::Char('c')), "'c'");
        assert_eq!(render(Value::Char('\'')), "'\\''");
        assert_eq!(render(Value::from("a\\b\"c")), "'a\\\\b\\\"c'");
    }

    #[test]
    fn test_date_is_bracketed_utc() {
        let date = Utc.with_ymd_and_hms(2014, 5, 17, 12, 30, 5).unwrap();
        assert_eq!(render(Value::Date(date)), "#05/17/2014 12:30:05#");
    }

    #[test]
    fn test_null_and_bool() {
        assert_eq!(render(Value::Null), "null");
        assert_eq!(render(Value::Bool(true)), "true");
        assert_eq!(render(Value::Bool(false)), "false");
    }

    #[test]
    fn test_non_finite_double_is_rejected() {
        let mut out = String::new();
        assert!(write_scalar(&Value::Double(f64::NAN), &mut out).is_err());
    }
}
