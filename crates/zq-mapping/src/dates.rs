//! Date parsing for Zephyr timestamps
//!
//! Zephyr Scale emits RFC 3339 strings, Zephyr Squad emits epoch
//! milliseconds, and hand-entered custom fields use whatever the user typed.
//! Everything that parses is rendered as RFC 3339; naive input is taken as UTC.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Offset, Utc};
use serde_json::Value;

const OFFSET_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%d %H:%M:%S%.f%z"];

const NAIVE_DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

// Day-first wins over month-first for ambiguous slash dates.
const DATE_FORMATS: [&str; 6] = [
    "%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%m/%d/%Y", "%d.%m.%Y", "%Y%m%d",
];

fn utc() -> FixedOffset {
    Utc.fix()
}

/// Parse a date or date-time string
#[must_use]
pub fn parse_datetime(input: &str) -> Option<DateTime<FixedOffset>> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(input) {
        return Some(parsed);
    }
    for format in OFFSET_FORMATS {
        if let Ok(parsed) = DateTime::parse_from_str(input, format) {
            return Some(parsed);
        }
    }
    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, format) {
            return Some(naive.and_utc().with_timezone(&utc()));
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(input, format) {
            return date
                .and_hms_opt(0, 0, 0)
                .map(|naive| naive.and_utc().with_timezone(&utc()));
        }
    }
    None
}

/// Parse a JSON value holding either a date string or epoch milliseconds
#[must_use]
pub fn parse_date_value(value: &Value) -> Option<DateTime<FixedOffset>> {
    match value {
        Value::String(s) => parse_datetime(s),
        Value::Number(n) => n
            .as_i64()
            .and_then(DateTime::<Utc>::from_timestamp_millis)
            .map(|dt| dt.with_timezone(&utc())),
        _ => None,
    }
}

/// Render a parsed timestamp the way target records carry dates
#[must_use]
pub fn to_iso(datetime: &DateTime<FixedOffset>) -> String {
    datetime.to_rfc3339()
}

/// Parse and render in one step
#[must_use]
pub fn iso_from_value(value: &Value) -> Option<String> {
    parse_date_value(value).map(|dt| to_iso(&dt))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rfc3339_round_trip() {
        assert_eq!(
            iso_from_value(&json!("2024-03-01T10:15:00Z")).as_deref(),
            Some("2024-03-01T10:15:00+00:00")
        );
        assert_eq!(
            iso_from_value(&json!("2024-03-01T10:15:00+02:00")).as_deref(),
            Some("2024-03-01T10:15:00+02:00")
        );
    }

    #[test]
    fn test_naive_inputs_are_utc() {
        assert_eq!(
            iso_from_value(&json!("2024-01-15")).as_deref(),
            Some("2024-01-15T00:00:00+00:00")
        );
        assert_eq!(
            iso_from_value(&json!("2024-01-15 08:30:00")).as_deref(),
            Some("2024-01-15T08:30:00+00:00")
        );
        assert_eq!(
            iso_from_value(&json!("15/01/2024")).as_deref(),
            Some("2024-01-15T00:00:00+00:00")
        );
    }

    #[test]
    fn test_epoch_millis() {
        assert_eq!(
            iso_from_value(&json!(1_704_067_200_000_i64)).as_deref(),
            Some("2024-01-01T00:00:00+00:00")
        );
    }

    #[test]
    fn test_unparseable() {
        assert!(iso_from_value(&json!("next tuesday")).is_none());
        assert!(iso_from_value(&json!("")).is_none());
        assert!(iso_from_value(&json!(true)).is_none());
        assert!(iso_from_value(&Value::Null).is_none());
    }
}
