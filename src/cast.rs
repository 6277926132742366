//! Permissive value conversions from dynamic [`Value`]s to Rust types.
//!
//! Every conversion exists as a `try_to_*` function returning
//! `Result<T, CastError>`. The binder decides what to do with a failure:
//! in the default path it falls back to the type's zero value, in strict
//! mode it aborts the bind pass.
//!
//! Accepted inputs are deliberately loose. Config values arrive as strings
//! from environment variables and flags, as integers or floats from files,
//! and occasionally as the wrong scalar entirely, so each conversion accepts
//! every representation with an obvious meaning.

use std::time::Duration;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use toml::Value;

use crate::error::CastError;

/// Boolean from a bool, a string (`1/t/true/0/f/false`, any case) or a number.
pub fn try_to_bool(value: &Value) -> Result<bool, CastError> {
    match value {
        Value::Boolean(b) => Ok(*b),
        Value::Integer(i) => Ok(*i != 0),
        Value::Float(f) => Ok(*f != 0.0),
        Value::String(s) => {
            let s = s.trim();
            if s == "1" || s.eq_ignore_ascii_case("t") || s.eq_ignore_ascii_case("true") {
                Ok(true)
            } else if s == "0" || s.eq_ignore_ascii_case("f") || s.eq_ignore_ascii_case("false") {
                Ok(false)
            } else {
                Err(CastError::new(format!("'{s}' is not a boolean")))
            }
        }
        other => Err(mismatch(other, "bool")),
    }
}

/// String form of any scalar. Arrays and tables are rejected.
pub fn try_to_string(value: &Value) -> Result<String, CastError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Integer(i) => Ok(i.to_string()),
        Value::Float(f) => Ok(f.to_string()),
        Value::Boolean(b) => Ok(b.to_string()),
        Value::Datetime(dt) => Ok(dt.to_string()),
        other => Err(mismatch(other, "string")),
    }
}

pub fn try_to_i64(value: &Value) -> Result<i64, CastError> {
    match value {
        Value::Integer(i) => Ok(*i),
        Value::Float(f) => float_to_i64(*f),
        Value::Boolean(b) => Ok(i64::from(*b)),
        Value::String(s) => parse_int(s),
        other => Err(mismatch(other, "integer")),
    }
}

pub fn try_to_u64(value: &Value) -> Result<u64, CastError> {
    match value {
        Value::Integer(i) => u64::try_from(*i)
            .map_err(|_| CastError::new(format!("{i} is negative, expected unsigned"))),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.starts_with('-') {
                return Err(CastError::new(format!(
                    "'{trimmed}' is negative, expected unsigned"
                )));
            }
            // Values above i64::MAX only parse as u64.
            match parse_radix(trim_zero_decimal(trimmed)) {
                Some((digits, radix)) => u64::from_str_radix(digits, radix)
                    .map_err(|e| CastError::new(format!("'{trimmed}' is not an integer: {e}"))),
                None => Err(CastError::new(format!("'{trimmed}' is not an integer"))),
            }
        }
        other => {
            let signed = try_to_i64(other)?;
            u64::try_from(signed)
                .map_err(|_| CastError::new(format!("{signed} is negative, expected unsigned")))
        }
    }
}

/// Convert to a signed integer of any width, refusing to wrap.
pub fn try_to_signed<T: TryFrom<i64>>(value: &Value) -> Result<T, CastError> {
    let wide = try_to_i64(value)?;
    T::try_from(wide).map_err(|_| out_of_range(wide, std::any::type_name::<T>()))
}

/// Convert to an unsigned integer of any width, refusing to wrap.
pub fn try_to_unsigned<T: TryFrom<u64>>(value: &Value) -> Result<T, CastError> {
    let wide = try_to_u64(value)?;
    T::try_from(wide).map_err(|_| out_of_range(wide, std::any::type_name::<T>()))
}

pub fn try_to_f64(value: &Value) -> Result<f64, CastError> {
    match value {
        Value::Float(f) => Ok(*f),
        Value::Integer(i) => Ok(*i as f64),
        Value::Boolean(b) => Ok(if *b { 1.0 } else { 0.0 }),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|e| CastError::new(format!("'{s}' is not a number: {e}"))),
        other => Err(mismatch(other, "float")),
    }
}

pub fn try_to_f32(value: &Value) -> Result<f32, CastError> {
    let wide = try_to_f64(value)?;
    if wide.is_finite() && wide.abs() > f64::from(f32::MAX) {
        return Err(out_of_range(wide, "f32"));
    }
    Ok(wide as f32)
}

/// Timestamp from a TOML datetime, a timestamp string, or Unix seconds.
///
/// Strings without an offset are read as UTC.
pub fn try_to_timestamp(value: &Value) -> Result<DateTime<Utc>, CastError> {
    match value {
        Value::Datetime(dt) => parse_timestamp(&dt.to_string()),
        Value::String(s) => parse_timestamp(s),
        Value::Integer(secs) => DateTime::from_timestamp(*secs, 0)
            .ok_or_else(|| out_of_range(*secs, "timestamp")),
        other => Err(mismatch(other, "timestamp")),
    }
}

/// Duration from a literal (`"1s"`, `"1h30m"`, `"500ms"`) or a nanosecond count.
pub fn try_to_duration(value: &Value) -> Result<Duration, CastError> {
    match value {
        Value::Integer(nanos) => u64::try_from(*nanos)
            .map(Duration::from_nanos)
            .map_err(|_| CastError::new(format!("negative duration {nanos}ns"))),
        Value::Float(nanos) => {
            if !nanos.is_finite() || *nanos < 0.0 || *nanos > u64::MAX as f64 {
                return Err(out_of_range(nanos, "duration"));
            }
            Ok(Duration::from_nanos(*nanos as u64))
        }
        Value::String(s) => {
            let s = s.trim();
            if s.contains(['n', 's', 'u', 'µ', 'μ', 'm', 'h']) {
                parse_duration(s)
            } else {
                parse_duration(&format!("{s}ns"))
            }
        }
        other => Err(mismatch(other, "duration")),
    }
}

/// Strings from an array (each element stringified) or a comma-delimited string.
pub fn try_to_string_seq(value: &Value) -> Result<Vec<String>, CastError> {
    match value {
        Value::Array(items) => items.iter().map(try_to_string).collect(),
        Value::String(s) => Ok(split_list(s).map(str::to_string).collect()),
        Value::Table(_) => Err(mismatch(value, "string sequence")),
        scalar => Ok(vec![try_to_string(scalar)?]),
    }
}

/// Integers from an array or a comma-delimited string. One bad element fails the whole list.
pub fn try_to_int_seq(value: &Value) -> Result<Vec<i64>, CastError> {
    match value {
        Value::Array(items) => items.iter().map(try_to_i64).collect(),
        Value::String(s) => split_list(s).map(parse_int).collect(),
        other => Err(mismatch(other, "integer sequence")),
    }
}

pub fn try_to_value_seq(value: &Value) -> Result<Vec<Value>, CastError> {
    match value {
        Value::Array(items) => Ok(items.clone()),
        Value::String(s) => Ok(split_list(s)
            .map(|item| Value::String(item.to_string()))
            .collect()),
        other => Err(mismatch(other, "sequence")),
    }
}

/// Parse a duration literal: one or more `<number><unit>` pairs.
///
/// Units are `ns`, `us` (or `µs`), `ms`, `s`, `m` and `h`. Numbers may carry
/// a fraction (`1.5h`). A bare `0` is accepted without a unit.
pub fn parse_duration(input: &str) -> Result<Duration, CastError> {
    let invalid = || CastError::new(format!("invalid duration '{input}'"));

    let mut rest = input.trim();
    if let Some(stripped) = rest.strip_prefix('+') {
        rest = stripped;
    }
    if rest.starts_with('-') {
        return Err(CastError::new(format!("negative duration '{input}'")));
    }
    if rest == "0" {
        return Ok(Duration::ZERO);
    }
    if rest.is_empty() {
        return Err(invalid());
    }

    let mut total: u128 = 0;
    while !rest.is_empty() {
        let int_len = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
        let (int_part, after_int) = rest.split_at(int_len);

        let (frac_part, after_num) = match after_int.strip_prefix('.') {
            Some(frac) => {
                let frac_len = frac.find(|c: char| !c.is_ascii_digit()).unwrap_or(frac.len());
                frac.split_at(frac_len)
            }
            None => ("", after_int),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(invalid());
        }

        let unit_len = after_num
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(after_num.len());
        let (unit, next) = after_num.split_at(unit_len);
        let scale: u128 = match unit {
            "ns" => 1,
            "us" | "µs" | "μs" => 1_000,
            "ms" => 1_000_000,
            "s" => 1_000_000_000,
            "m" => 60 * 1_000_000_000,
            "h" => 3_600 * 1_000_000_000,
            "" => return Err(CastError::new(format!("missing unit in duration '{input}'"))),
            other => {
                return Err(CastError::new(format!(
                    "unknown unit '{other}' in duration '{input}'"
                )));
            }
        };

        let whole: u128 = if int_part.is_empty() {
            0
        } else {
            int_part.parse().map_err(|_| invalid())?
        };
        total = total
            .checked_add(whole.checked_mul(scale).ok_or_else(invalid)?)
            .ok_or_else(invalid)?;

        if !frac_part.is_empty() {
            // Digits past nanosecond precision cannot contribute.
            let digits = &frac_part[..frac_part.len().min(18)];
            let numerator: u128 = digits.parse().map_err(|_| invalid())?;
            let denominator = 10u128.pow(digits.len() as u32);
            total = total
                .checked_add(numerator * scale / denominator)
                .ok_or_else(invalid)?;
        }

        if total > i64::MAX as u128 {
            return Err(CastError::new(format!("duration '{input}' overflows")));
        }
        rest = next;
    }

    Ok(Duration::from_nanos(total as u64))
}

const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f %z",
    "%Y-%m-%d %H:%M:%S%.f %:z",
];

const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d %b %Y"];

fn parse_timestamp(input: &str) -> Result<DateTime<Utc>, CastError> {
    let s = input.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Ok(dt.with_timezone(&Utc));
        }
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(naive.and_utc());
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt)
            && let Some(midnight) = date.and_hms_opt(0, 0, 0)
        {
            return Ok(midnight.and_utc());
        }
    }
    Err(CastError::new(format!("'{s}' is not a recognized timestamp")))
}

fn parse_int(input: &str) -> Result<i64, CastError> {
    let s = input.trim();
    let (negative, unsigned) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };
    let Some((digits, radix)) = parse_radix(trim_zero_decimal(unsigned)) else {
        return Err(CastError::new(format!("'{s}' is not an integer")));
    };
    // Parse with the sign attached so i64::MIN is reachable.
    let signed = if negative {
        format!("-{digits}")
    } else {
        digits.to_string()
    };
    i64::from_str_radix(&signed, radix)
        .map_err(|e| CastError::new(format!("'{s}' is not an integer: {e}")))
}

/// Split a `0x`/`0o`/`0b` prefix off an unsigned number.
fn parse_radix(s: &str) -> Option<(&str, u32)> {
    let lower = s.get(..2).map(str::to_ascii_lowercase);
    let (digits, radix) = match lower.as_deref() {
        Some("0x") => (&s[2..], 16),
        Some("0o") => (&s[2..], 8),
        Some("0b") => (&s[2..], 2),
        _ => (s, 10),
    };
    if digits.is_empty() || digits.starts_with(['+', '-']) {
        return None;
    }
    Some((digits, radix))
}

/// `"10.000"` → `"10"`. Anything else is returned unchanged.
fn trim_zero_decimal(s: &str) -> &str {
    match s.split_once('.') {
        Some((whole, frac)) if !whole.is_empty() && !frac.is_empty() && frac.bytes().all(|b| b == b'0') => {
            whole
        }
        _ => s,
    }
}

fn float_to_i64(f: f64) -> Result<i64, CastError> {
    let truncated = f.trunc();
    if !truncated.is_finite() || truncated < i64::MIN as f64 || truncated >= i64::MAX as f64 {
        return Err(out_of_range(f, "i64"));
    }
    Ok(truncated as i64)
}

fn split_list(s: &str) -> impl Iterator<Item = &str> {
    s.split(',').map(str::trim).filter(|item| !item.is_empty())
}

fn mismatch(value: &Value, target: &str) -> CastError {
    CastError::new(format!("cannot convert {} to {target}", value.type_str()))
}

fn out_of_range(value: impl std::fmt::Display, target: &str) -> CastError {
    CastError::new(format!("{value} is out of range for {target}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn s(v: &str) -> Value {
        Value::String(v.into())
    }

    #[test]
    fn bool_from_strings_any_case() {
        assert!(try_to_bool(&s("true")).unwrap());
        assert!(try_to_bool(&s("TRUE")).unwrap());
        assert!(try_to_bool(&s("1")).unwrap());
        assert!(try_to_bool(&s("t")).unwrap());
        assert!(!try_to_bool(&s("False")).unwrap());
        assert!(!try_to_bool(&s("0")).unwrap());
        assert!(try_to_bool(&s("yes")).is_err());
    }

    #[test]
    fn bool_from_numbers() {
        assert!(try_to_bool(&Value::Integer(7)).unwrap());
        assert!(!try_to_bool(&Value::Integer(0)).unwrap());
        assert!(try_to_bool(&Value::Float(0.5)).unwrap());
    }

    #[test]
    fn string_from_scalars() {
        assert_eq!(try_to_string(&Value::Integer(42)).unwrap(), "42");
        assert_eq!(try_to_string(&Value::Float(1.5)).unwrap(), "1.5");
        assert_eq!(try_to_string(&Value::Boolean(true)).unwrap(), "true");
        assert!(try_to_string(&Value::Array(vec![])).is_err());
    }

    #[test]
    fn integers_from_strings() {
        assert_eq!(try_to_i64(&s("8080")).unwrap(), 8080);
        assert_eq!(try_to_i64(&s(" -5 ")).unwrap(), -5);
        assert_eq!(try_to_i64(&s("0x1F")).unwrap(), 31);
        assert_eq!(try_to_i64(&s("0b101")).unwrap(), 5);
        assert_eq!(try_to_i64(&s("10.00")).unwrap(), 10);
        assert_eq!(try_to_i64(&s("-9223372036854775808")).unwrap(), i64::MIN);
        assert!(try_to_i64(&s("10.5")).is_err());
        assert!(try_to_i64(&s("abc")).is_err());
    }

    #[test]
    fn integers_from_other_scalars() {
        assert_eq!(try_to_i64(&Value::Float(3.9)).unwrap(), 3);
        assert_eq!(try_to_i64(&Value::Boolean(true)).unwrap(), 1);
        assert!(try_to_i64(&Value::Float(f64::NAN)).is_err());
    }

    #[test]
    fn narrowing_never_wraps() {
        assert_eq!(try_to_signed::<i8>(&Value::Integer(127)).unwrap(), 127);
        assert!(try_to_signed::<i8>(&Value::Integer(128)).is_err());
        assert!(try_to_unsigned::<u16>(&Value::Integer(70_000)).is_err());
        assert!(try_to_unsigned::<u32>(&Value::Integer(-1)).is_err());
        assert!(try_to_unsigned::<u8>(&s("-1")).is_err());
    }

    #[test]
    fn u64_above_i64_range() {
        assert_eq!(try_to_u64(&s("18446744073709551615")).unwrap(), u64::MAX);
    }

    #[test]
    fn floats() {
        assert_eq!(try_to_f64(&s("2.5")).unwrap(), 2.5);
        assert_eq!(try_to_f64(&Value::Integer(2)).unwrap(), 2.0);
        assert!(try_to_f32(&Value::Float(1e300)).is_err());
        assert_eq!(try_to_f32(&Value::Float(0.25)).unwrap(), 0.25);
    }

    #[test]
    fn duration_literals() {
        assert_eq!(parse_duration("1s").unwrap(), Duration::from_secs(1));
        assert_eq!(parse_duration("500ms").unwrap(), Duration::from_millis(500));
        assert_eq!(parse_duration("1h30m").unwrap(), Duration::from_secs(5400));
        assert_eq!(parse_duration("1.5s").unwrap(), Duration::from_millis(1500));
        assert_eq!(parse_duration(".5m").unwrap(), Duration::from_secs(30));
        assert_eq!(parse_duration("250us").unwrap(), Duration::from_micros(250));
        assert_eq!(parse_duration("0").unwrap(), Duration::ZERO);
    }

    #[test]
    fn duration_rejects_garbage() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("10").is_err());
        assert!(parse_duration("5 days").is_err());
        assert!(parse_duration("-1s").is_err());
        assert!(parse_duration("s").is_err());
    }

    #[test]
    fn duration_from_values() {
        assert_eq!(try_to_duration(&s("2m")).unwrap(), Duration::from_secs(120));
        assert_eq!(try_to_duration(&s("1500")).unwrap(), Duration::from_nanos(1500));
        assert_eq!(
            try_to_duration(&Value::Integer(1_000_000_000)).unwrap(),
            Duration::from_secs(1)
        );
        assert!(try_to_duration(&Value::Integer(-1)).is_err());
    }

    #[test]
    fn timestamps() {
        let expected = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();
        assert_eq!(try_to_timestamp(&s("2024-03-01T12:30:00Z")).unwrap(), expected);
        assert_eq!(try_to_timestamp(&s("2024-03-01 12:30:00")).unwrap(), expected);
        assert_eq!(
            try_to_timestamp(&s("2024-03-01T14:30:00+02:00")).unwrap(),
            expected
        );
        assert_eq!(
            try_to_timestamp(&Value::Integer(expected.timestamp())).unwrap(),
            expected
        );
        let midnight = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        assert_eq!(try_to_timestamp(&s("2024-03-01")).unwrap(), midnight);
        assert!(try_to_timestamp(&s("yesterday")).is_err());
    }

    #[test]
    fn timestamp_from_toml_datetime() {
        let table: toml::Table = toml::from_str("at = 2024-03-01T12:30:00Z").unwrap();
        let expected = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();
        assert_eq!(try_to_timestamp(&table["at"]).unwrap(), expected);
    }

    #[test]
    fn sequences_from_arrays_and_strings() {
        assert_eq!(
            try_to_string_seq(&s("a, b,,c")).unwrap(),
            vec!["a", "b", "c"]
        );
        assert_eq!(
            try_to_string_seq(&Value::Array(vec![s("x"), Value::Integer(1)])).unwrap(),
            vec!["x", "1"]
        );
        assert_eq!(try_to_int_seq(&s("1,2,3")).unwrap(), vec![1, 2, 3]);
        assert!(try_to_int_seq(&s("1,two")).is_err());
        assert_eq!(
            try_to_value_seq(&s("a,b")).unwrap(),
            vec![s("a"), s("b")]
        );
        assert!(try_to_value_seq(&Value::Integer(1)).is_err());
    }
}
