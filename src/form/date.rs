use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::form::value::FormValue;

/// Format used when a parsed date leaves the form without an explicit pattern.
pub const DEFAULT_DATE_FORMAT: &str = "YYYY-MM-DD HH:mm:ss";

/// Format used by range splitting when none is configured.
pub const DEFAULT_RANGE_FORMAT: &str = "YYYY-MM-DD";

const DATETIME_PATTERNS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
];

const DATE_PATTERNS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

/// Parse a value into a date.
///
/// Strings accept ISO-like date and datetime shapes (RFC 3339 included),
/// numbers are epoch milliseconds, and dates pass through.
pub fn parse_date(value: &FormValue) -> Option<NaiveDateTime> {
    match value {
        FormValue::Date(d) => Some(*d),
        FormValue::Number(n) => n
            .as_i64()
            .and_then(DateTime::<Utc>::from_timestamp_millis)
            .map(|d| d.naive_utc()),
        FormValue::String(s) => parse_date_str(s.trim()),
        _ => None,
    }
}

fn parse_date_str(s: &str) -> Option<NaiveDateTime> {
    if s.is_empty() {
        return None;
    }
    if let Ok(d) = DateTime::parse_from_rfc3339(s) {
        return Some(d.naive_local());
    }
    for pattern in DATETIME_PATTERNS {
        if let Ok(d) = NaiveDateTime::parse_from_str(s, pattern) {
            return Some(d);
        }
    }
    for pattern in DATE_PATTERNS {
        if let Ok(d) = NaiveDate::parse_from_str(s, pattern) {
            return d.and_hms_opt(0, 0, 0);
        }
    }
    None
}

/// Format a date with a `YYYY-MM-DD HH:mm:ss` style pattern.
pub fn format_date(date: &NaiveDateTime, pattern: &str) -> String {
    date.format(&to_chrono_pattern(pattern)).to_string()
}

// Longest tokens first so `YYYY` wins over `YY` and `SSS` is not split.
const TOKENS: &[(&str, &str)] = &[
    ("YYYY", "%Y"),
    ("SSS", "%3f"),
    ("YY", "%y"),
    ("MM", "%m"),
    ("DD", "%d"),
    ("HH", "%H"),
    ("hh", "%I"),
    ("mm", "%M"),
    ("ss", "%S"),
    ("A", "%p"),
];

/// Translate a display pattern into a chrono format string.
pub fn to_chrono_pattern(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() + 8);
    let mut rest = pattern;

    'outer: while !rest.is_empty() {
        for (token, spec) in TOKENS {
            if let Some(tail) = rest.strip_prefix(token) {
                out.push_str(spec);
                rest = tail;
                continue 'outer;
            }
        }
        let mut chars = rest.chars();
        if let Some(c) = chars.next() {
            if c == '%' {
                out.push_str("%%");
            } else {
                out.push(c);
            }
        }
        rest = chars.as_str();
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pattern_translation() {
        assert_eq!(to_chrono_pattern("YYYY-MM-DD"), "%Y-%m-%d");
        assert_eq!(to_chrono_pattern("YYYY-MM-DD HH:mm:ss"), "%Y-%m-%d %H:%M:%S");
        assert_eq!(to_chrono_pattern("DD/MM/YY 100%"), "%d/%m/%y 100%%");
    }

    #[test]
    fn parses_common_shapes() {
        let day = parse_date(&"2024-01-31".into()).unwrap();
        assert_eq!(format_date(&day, "YYYY-MM-DD"), "2024-01-31");

        let dt = parse_date(&"2024-01-31 08:15:00".into()).unwrap();
        assert_eq!(format_date(&dt, DEFAULT_DATE_FORMAT), "2024-01-31 08:15:00");

        assert!(parse_date(&"not a date".into()).is_none());
        assert!(parse_date(&FormValue::Null).is_none());
    }
}
