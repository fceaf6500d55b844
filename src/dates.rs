use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use thiserror::Error;

pub const MONTH_ABBREVIATIONS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DateError {
    #[error("record {record} has no {field}")]
    Missing { record: String, field: &'static str },
    #[error("record {record} has unparsable {field} {value:?}")]
    Invalid {
        record: String,
        field: &'static str,
        value: String,
    },
}

/// Parses a backend timestamp. RFC 3339 is the normal shape; bare dates and
/// zone-less date-times are read as UTC.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();

    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }

    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(Utc.from_utc_datetime(&naive));
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

pub fn record_timestamp(
    record: &str,
    field: &'static str,
    value: Option<&str>,
) -> Result<DateTime<Utc>, DateError> {
    let raw = value
        .filter(|raw| !raw.trim().is_empty())
        .ok_or_else(|| DateError::Missing {
            record: record.to_string(),
            field,
        })?;

    parse_timestamp(raw).ok_or_else(|| DateError::Invalid {
        record: record.to_string(),
        field,
        value: raw.to_string(),
    })
}

/// Long display form, e.g. "October 19, 2026".
pub fn format_display_date<Tz: TimeZone>(value: Option<&str>, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    match value.and_then(parse_timestamp) {
        Some(timestamp) => timestamp
            .with_timezone(tz)
            .format("%B %-d, %Y")
            .to_string(),
        None => "Invalid Date".to_string(),
    }
}
