//! Date display for record values.
//!
//! Records carry dates as RFC 3339 strings, naive `YYYY-MM-DD[ HH:MM:SS]`
//! strings or epoch milliseconds. All output is English and rendered in UTC.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// How a date is displayed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateFormat {
    /// `Jan 15, 2024, 10:30 AM`
    Short,
    /// `Jan 15, 2024, 10:30 AM`
    #[default]
    Medium,
    /// `January 15, 2024 at 10:30:05 AM`
    Long,
    /// `Monday, January 15, 2024 at 10:30:05 AM UTC`
    Full,
    /// `Jan 15, 2024`
    Date,
    /// `10:30:05 AM`
    Time,
    /// `Jan 15, 2024, 10:30 AM`
    DateTime,
    /// `2 hours ago`, `in 3 days`
    Relative,
}

impl DateFormat {
    fn pattern(self) -> &'static str {
        match self {
            Self::Short | Self::Medium | Self::DateTime | Self::Relative => "%b %-d, %Y, %I:%M %p",
            Self::Long => "%B %-d, %Y at %I:%M:%S %p",
            Self::Full => "%A, %B %-d, %Y at %I:%M:%S %p UTC",
            Self::Date => "%b %-d, %Y",
            Self::Time => "%I:%M:%S %p",
        }
    }
}

/// Parse a record value as a point in time.
///
/// Naive strings are taken as UTC; a bare date is midnight. Numbers are
/// epoch milliseconds.
pub fn parse_date(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(text) => parse_date_str(text.trim()),
        Value::Number(number) => {
            let millis = number
                .as_i64()
                .or_else(|| number.as_f64().map(|f| f.trunc() as i64))?;
            DateTime::from_timestamp_millis(millis)
        }
        _ => None,
    }
}

fn parse_date_str(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.with_timezone(&Utc));
    }
    for pattern in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, pattern) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Display `value` in `format`. Relative output is measured from now.
///
/// Missing, empty, zero and unparseable values render as an empty string.
pub fn format_date(value: Option<&Value>, format: DateFormat) -> String {
    format_date_at(value, format, Utc::now())
}

/// [`format_date`] with an explicit reference time for relative output.
pub fn format_date_at(value: Option<&Value>, format: DateFormat, now: DateTime<Utc>) -> String {
    let Some(value) = value.filter(|v| is_present(v)) else {
        return String::new();
    };
    let Some(date) = parse_date(value) else {
        return String::new();
    };
    match format {
        DateFormat::Relative => relative(date, now),
        _ => date.format(format.pattern()).to_string(),
    }
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(false) => false,
        Value::String(text) => !text.is_empty(),
        Value::Number(number) => number.as_f64() != Some(0.0),
        _ => true,
    }
}

/// `"5 minutes ago"` or `"in 5 minutes"`. Months are 30 days and years
/// twelve months.
fn relative(date: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (now - date).num_milliseconds().div_euclid(1000);
    let future = seconds < 0;
    let elapsed = seconds.unsigned_abs();
    if elapsed < 60 {
        let text = if future { "in a few seconds" } else { "a few seconds ago" };
        return text.to_string();
    }

    let minutes = elapsed / 60;
    let hours = minutes / 60;
    let days = hours / 24;
    let months = days / 30;
    let (count, unit) = if minutes < 60 {
        (minutes, "minute")
    } else if hours < 24 {
        (hours, "hour")
    } else if days < 30 {
        (days, "day")
    } else if months < 12 {
        (months, "month")
    } else {
        (months / 12, "year")
    };

    let plural = if count == 1 { "" } else { "s" };
    if future {
        format!("in {count} {unit}{plural}")
    } else {
        format!("{count} {unit}{plural} ago")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn at(text: &str) -> DateTime<Utc> {
        parse_date(&json!(text)).unwrap()
    }

    #[test]
    fn test_relative_units() {
        let now = at("2024-06-15T12:00:00Z");
        let cases = [
            ("2024-06-15T11:59:30Z", "a few seconds ago"),
            ("2024-06-15T12:00:30Z", "in a few seconds"),
            ("2024-06-15T11:59:00Z", "1 minute ago"),
            ("2024-06-15T10:00:00Z", "2 hours ago"),
            ("2024-06-18T12:00:00Z", "in 3 days"),
            ("2024-04-15T12:00:00Z", "2 months ago"),
            ("2022-06-15T12:00:00Z", "2 years ago"),
        ];
        for (value, expected) in cases {
            assert_eq!(
                format_date_at(Some(&json!(value)), DateFormat::Relative, now),
                expected,
                "{value}"
            );
        }
    }

    #[test]
    fn test_naive_strings_are_utc() {
        assert_eq!(at("2024-01-15 10:30:00"), at("2024-01-15T10:30:00Z"));
        assert_eq!(at("2024-01-15"), at("2024-01-15T00:00:00Z"));
        assert_eq!(at("2024-01-15T12:30:00+02:00"), at("2024-01-15T10:30:00Z"));
    }
}
