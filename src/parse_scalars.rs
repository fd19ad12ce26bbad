//! Lexical matchers and converters for the core scalar types.
//!
//! All matchers work on the raw plain-scalar text and never allocate unless a value is
//! actually constructed.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};

pub(crate) fn is_yaml_null(s: &str) -> bool {
    matches!(s, "" | "~" | "null" | "Null" | "NULL")
}

pub(crate) fn parse_yaml_bool(s: &str) -> Option<bool> {
    match s {
        "true" | "True" | "TRUE" => Some(true),
        "false" | "False" | "FALSE" => Some(false),
        _ => None,
    }
}

/// YAML 1.1 boolean words. Older parsers read these as booleans (the "Norway problem"),
/// so the dumper quotes them unless compatibility mode is off.
pub(crate) fn is_yaml11_bool(s: &str) -> bool {
    matches!(
        s,
        "y" | "Y"
            | "yes"
            | "Yes"
            | "YES"
            | "on"
            | "On"
            | "ON"
            | "n"
            | "N"
            | "no"
            | "No"
            | "NO"
            | "off"
            | "Off"
            | "OFF"
    )
}

/// YAML 1.1 sexagesimal numbers such as `190:20:30` or `-1:30.5`.
pub(crate) fn is_yaml11_base60(s: &str) -> bool {
    let t = s.strip_prefix(['-', '+']).unwrap_or(s);
    let (whole, frac) = match t.split_once('.') {
        Some((w, f)) => (w, Some(f)),
        None => (t, None),
    };
    let mut parts = whole.split(':');
    let Some(first) = parts.next() else {
        return false;
    };
    let digits = |p: &str| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit() || b == b'_');
    let mut groups = 0;
    if !digits(first) {
        return false;
    }
    for part in parts {
        if !digits(part) {
            return false;
        }
        groups += 1;
    }
    groups > 0 && frac.is_none_or(|f| f.bytes().all(|b| b.is_ascii_digit() || b == b'_'))
}

fn is_digit_of(b: u8, radix: u32) -> bool {
    (b as char).to_digit(radix).is_some()
}

/// Digits of `radix` with `_` separators; at least one digit, no trailing `_`.
fn valid_digits(digits: &str, radix: u32) -> bool {
    let mut saw = false;
    for b in digits.bytes() {
        if b == b'_' {
            continue;
        }
        if !is_digit_of(b, radix) {
            return false;
        }
        saw = true;
    }
    saw && !digits.ends_with('_')
}

/// Split an integer literal into sign, radix and digit text.
fn split_int(s: &str) -> Option<(bool, u32, &str)> {
    let (neg, rest) = match s.as_bytes().first()? {
        b'-' => (true, &s[1..]),
        b'+' => (false, &s[1..]),
        _ => (false, s),
    };
    if let Some(r) = rest.strip_prefix("0b") {
        return Some((neg, 2, r));
    }
    if let Some(r) = rest.strip_prefix("0x") {
        return Some((neg, 16, r));
    }
    if let Some(r) = rest.strip_prefix("0o") {
        return Some((neg, 8, r));
    }
    Some((neg, 10, rest))
}

pub(crate) fn is_yaml_int(s: &str) -> bool {
    match split_int(s) {
        Some((_, 10, digits)) => !digits.starts_with('_') && valid_digits(digits, 10),
        Some((_, radix, digits)) => valid_digits(digits, radix),
        None => false,
    }
}

fn parse_digits_u128(digits: &str, radix: u32) -> Option<u128> {
    let mut val: u128 = 0;
    for b in digits.bytes() {
        if b == b'_' {
            continue;
        }
        let d = (b as char).to_digit(radix)?;
        val = val.checked_mul(radix as u128)?.checked_add(d as u128)?;
    }
    Some(val)
}

/// Integer value of a literal accepted by [`is_yaml_int`].
///
/// Magnitudes beyond `i64` come back as `Err(f64)` so the caller can keep them as floats.
pub(crate) fn parse_yaml_int(s: &str) -> Result<i64, f64> {
    let Some((neg, radix, digits)) = split_int(s) else {
        return Err(f64::NAN);
    };
    match parse_digits_u128(digits, radix) {
        Some(mag) => match i128::try_from(mag) {
            Ok(m) => {
                let signed = if neg { -m } else { m };
                i64::try_from(signed).map_err(|_| signed as f64)
            }
            Err(_) => Err(if neg { -(mag as f64) } else { mag as f64 }),
        },
        None => {
            // Longer than u128: fall back to float accumulation.
            let mut f = 0.0f64;
            for b in digits.bytes().filter(|b| *b != b'_') {
                f = f * radix as f64 + f64::from((b as char).to_digit(radix).unwrap_or(0));
            }
            Err(if neg { -f } else { f })
        }
    }
}

/// `[-+]?digits[.digits][e[-+]digits]`, `.digits[e…]`, `[-+]?.inf` and `.nan` variants.
pub(crate) fn is_yaml_float(s: &str) -> bool {
    if s.is_empty() || s.ends_with('_') {
        return false;
    }
    if matches!(s, ".nan" | ".NaN" | ".NAN") {
        return true;
    }
    let body = s.strip_prefix(['-', '+']).unwrap_or(s);
    if matches!(body, ".inf" | ".Inf" | ".INF") {
        return true;
    }
    let bytes = s.as_bytes();
    let mut i = 0;
    let leading_dot = bytes[0] == b'.';
    if !leading_dot {
        if matches!(bytes[0], b'-' | b'+') {
            i += 1;
        }
        // [0-9][0-9_]*
        if !bytes.get(i).is_some_and(u8::is_ascii_digit) {
            return false;
        }
        while bytes.get(i).is_some_and(|b| b.is_ascii_digit() || *b == b'_') {
            i += 1;
        }
        if bytes.get(i) == Some(&b'.') {
            i += 1;
            while bytes.get(i).is_some_and(|b| b.is_ascii_digit() || *b == b'_') {
                i += 1;
            }
        }
    } else {
        // \.[0-9_]+
        i += 1;
        let start = i;
        while bytes.get(i).is_some_and(|b| b.is_ascii_digit() || *b == b'_') {
            i += 1;
        }
        if i == start {
            return false;
        }
    }
    if matches!(bytes.get(i), Some(b'e' | b'E')) {
        i += 1;
        if matches!(bytes.get(i), Some(b'-' | b'+')) {
            i += 1;
        }
        let start = i;
        while bytes.get(i).is_some_and(u8::is_ascii_digit) {
            i += 1;
        }
        if i == start {
            return false;
        }
    }
    i == bytes.len()
}

pub(crate) fn parse_yaml_float(s: &str) -> f64 {
    let cleaned: String = s.chars().filter(|c| *c != '_').collect::<String>().to_ascii_lowercase();
    let (sign, body) = match cleaned.as_bytes().first() {
        Some(b'-') => (-1.0, &cleaned[1..]),
        Some(b'+') => (1.0, &cleaned[1..]),
        _ => (1.0, cleaned.as_str()),
    };
    match body {
        ".inf" => sign * f64::INFINITY,
        ".nan" => f64::NAN,
        _ => body.parse::<f64>().map_or(f64::NAN, |v| sign * v),
    }
}

/// Components of a matched timestamp literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TimestampParts {
    year: i32,
    month: u32,
    day: u32,
    time: Option<(u32, u32, u32, u32)>,
    offset_secs: i32,
}

/// Scan up to `max` ASCII digits starting at `*i`; at least `min`.
fn take_digits(b: &[u8], i: &mut usize, min: usize, max: usize) -> Option<u32> {
    let start = *i;
    while *i < b.len() && *i - start < max && b[*i].is_ascii_digit() {
        *i += 1;
    }
    if *i - start < min {
        return None;
    }
    std::str::from_utf8(&b[start..*i]).ok()?.parse().ok()
}

/// `YYYY-MM-DD`, or `YYYY-M-D(T|t|[ \t]+)H:MM:SS[.frac][[ \t]*(Z|±H[H][:MM])]`.
pub(crate) fn match_timestamp(s: &str) -> Option<TimestampParts> {
    let b = s.as_bytes();
    let mut i = 0;
    let year = take_digits(b, &mut i, 4, 4)? as i32;
    if b.get(i) != Some(&b'-') {
        return None;
    }
    i += 1;
    let month_start = i;
    let month = take_digits(b, &mut i, 1, 2)?;
    let month_len = i - month_start;
    if b.get(i) != Some(&b'-') {
        return None;
    }
    i += 1;
    let day_start = i;
    let day = take_digits(b, &mut i, 1, 2)?;
    let day_len = i - day_start;

    if i == b.len() {
        // Date-only form requires two-digit month and day.
        if month_len != 2 || day_len != 2 {
            return None;
        }
        return Some(TimestampParts {
            year,
            month,
            day,
            time: None,
            offset_secs: 0,
        });
    }

    match b[i] {
        b'T' | b't' => i += 1,
        b' ' | b'\t' => {
            while matches!(b.get(i), Some(b' ' | b'\t')) {
                i += 1;
            }
        }
        _ => return None,
    }
    let hour = take_digits(b, &mut i, 1, 2)?;
    if b.get(i) != Some(&b':') {
        return None;
    }
    i += 1;
    let minute = take_digits(b, &mut i, 2, 2)?;
    if b.get(i) != Some(&b':') {
        return None;
    }
    i += 1;
    let second = take_digits(b, &mut i, 2, 2)?;

    let mut nanos = 0u32;
    if b.get(i) == Some(&b'.') {
        i += 1;
        let start = i;
        while i < b.len() && b[i].is_ascii_digit() {
            i += 1;
        }
        // Keep nanosecond precision, drop the rest.
        let frac = &s[start..i];
        let kept: String = frac.chars().take(9).collect();
        if !kept.is_empty() {
            nanos = format!("{kept:0<9}").parse().ok()?;
        }
    }

    while matches!(b.get(i), Some(b' ' | b'\t')) {
        i += 1;
    }
    let mut offset_secs = 0i32;
    match b.get(i) {
        None => {}
        Some(b'Z') => i += 1,
        Some(sign @ (b'+' | b'-')) => {
            let negative = *sign == b'-';
            i += 1;
            let tz_hour = take_digits(b, &mut i, 1, 2)? as i32;
            let mut tz_minute = 0i32;
            if b.get(i) == Some(&b':') {
                i += 1;
                tz_minute = take_digits(b, &mut i, 2, 2)? as i32;
            }
            offset_secs = (tz_hour * 60 + tz_minute) * 60;
            if negative {
                offset_secs = -offset_secs;
            }
        }
        Some(_) => return None,
    }
    if i != b.len() {
        return None;
    }
    Some(TimestampParts {
        year,
        month,
        day,
        time: Some((hour, minute, second, nanos)),
        offset_secs,
    })
}

pub(crate) fn construct_timestamp(parts: TimestampParts) -> Result<DateTime<FixedOffset>, String> {
    let date = NaiveDate::from_ymd_opt(parts.year, parts.month, parts.day)
        .ok_or_else(|| "invalid calendar date".to_string())?;
    let time = match parts.time {
        Some((h, m, s, nanos)) => NaiveTime::from_hms_nano_opt(h, m, s, nanos)
            .ok_or_else(|| "invalid time of day".to_string())?,
        None => NaiveTime::MIN,
    };
    let offset = FixedOffset::east_opt(parts.offset_secs)
        .ok_or_else(|| "invalid time zone offset".to_string())?;
    offset
        .from_local_datetime(&NaiveDateTime::new(date, time))
        .single()
        .ok_or_else(|| "ambiguous local time".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ints_accept_bases_and_separators() {
        for s in ["0", "-0", "+12", "1_000", "0b1010", "0x_FF", "0o17", "012"] {
            assert!(is_yaml_int(s), "{s}");
        }
        for s in ["", "_1", "1_", "0b", "0x1G", "0b2", "1.0", "- 1", "0o8"] {
            assert!(!is_yaml_int(s), "{s}");
        }
    }

    #[test]
    fn int_values() {
        assert_eq!(parse_yaml_int("0x1F"), Ok(31));
        assert_eq!(parse_yaml_int("-0b11"), Ok(-3));
        assert_eq!(parse_yaml_int("1_000"), Ok(1000));
        assert_eq!(parse_yaml_int("-9223372036854775808"), Ok(i64::MIN));
        assert_eq!(parse_yaml_int("9223372036854775808"), Err(9223372036854775808.0));
    }

    #[test]
    fn floats() {
        for s in ["1.5", "-1.5e3", "1e10", ".5", "1.", "+.inf", ".NaN", "1_0.0_1", "3"] {
            assert!(is_yaml_float(s), "{s}");
        }
        for s in ["", ".", "1.5_", "e5", "1e", "+.nan", ".infinity", "1.2.3", "0x10"] {
            assert!(!is_yaml_float(s), "{s}");
        }
        assert_eq!(parse_yaml_float("-1_0.5"), -10.5);
        assert_eq!(parse_yaml_float("-.INF"), f64::NEG_INFINITY);
        assert!(parse_yaml_float(".nan").is_nan());
    }

    #[test]
    fn yaml11_compat_words() {
        assert!(is_yaml11_bool("Yes"));
        assert!(!is_yaml11_bool("yES"));
        assert!(is_yaml11_base60("190:20:30"));
        assert!(is_yaml11_base60("-1:30.5"));
        assert!(!is_yaml11_base60("12"));
        assert!(!is_yaml11_base60("a:b"));
    }

    #[test]
    fn timestamps() {
        let d = construct_timestamp(match_timestamp("2002-12-14").unwrap()).unwrap();
        assert_eq!(d.to_rfc3339(), "2002-12-14T00:00:00+00:00");

        let t = construct_timestamp(match_timestamp("2001-12-14t21:59:43.10-05:00").unwrap()).unwrap();
        assert_eq!(t.to_rfc3339(), "2001-12-14T21:59:43.100-05:00");

        let spaced = match_timestamp("2001-12-14 21:59:43.10 -5").unwrap();
        assert_eq!(construct_timestamp(spaced).unwrap(), t);

        assert!(match_timestamp("2002-1-14").is_none());
        assert!(match_timestamp("2002-12-14x").is_none());
        assert!(construct_timestamp(match_timestamp("2002-13-14").unwrap()).is_err());
    }
}
