//! Timestamp encoding for `TIMESTAMP` columns
//!
//! Values are written as `YYYY-MM-DD HH:MM:SS.sss+00:00`, the same shape the
//! column defaults produce. Reads are lenient about what other writers may
//! have stored, so queries order by `julianday(column)` rather than the raw
//! text.

use chrono::{DateTime, Datelike, NaiveDateTime, Utc};
use crate::{Error, Result};

const WRITE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f+00:00";

const NAIVE_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// Encode a timestamp for storage (millisecond precision)
///
/// Only four-digit years are accepted; SQLite's date functions cannot read
/// anything else.
pub fn encode(at: &DateTime<Utc>) -> Result<String> {
    if !(0..=9999).contains(&at.year()) {
        return Err(Error::InvalidValue(format!("timestamp out of range: {}", at)));
    }
    Ok(at.format(WRITE_FORMAT).to_string())
}

/// Encode an optional timestamp parameter
pub(crate) fn encode_opt(at: Option<&DateTime<Utc>>) -> Result<Option<String>> {
    at.map(encode).transpose()
}

/// Decode a stored timestamp
///
/// Accepts the native format, RFC 3339, and offset-less values such as
/// SQLite's `CURRENT_TIMESTAMP`, which are taken to be UTC.
pub fn decode(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f%:z") {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Read a nullable timestamp column from a row
pub(crate) fn column(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let raw: Option<String> = row.get(idx)?;
    match raw {
        None => Ok(None),
        Some(text) => decode(&text).map(Some).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                idx,
                rusqlite::types::Type::Text,
                Box::new(crate::Error::Parse(format!("Invalid timestamp: {}", text))),
            )
        }),
    }
}

/// Truncate to the precision the store keeps, for comparisons against reads
pub fn truncate(at: &DateTime<Utc>) -> DateTime<Utc> {
    encode(at).ok().and_then(|text| decode(&text)).unwrap_or(*at)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_encode_decode() {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 15).unwrap();
        let text = encode(&at).unwrap();
        assert_eq!(text, "2024-03-01 09:30:15.000+00:00");
        assert_eq!(decode(&text), Some(at));
    }

    #[test]
    fn test_decode_foreign_formats() {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 15).unwrap();
        assert_eq!(decode("2024-03-01 09:30:15"), Some(at));
        assert_eq!(decode("2024-03-01T09:30:15Z"), Some(at));
        assert_eq!(decode("2024-03-01T11:30:15+02:00"), Some(at));
        assert_eq!(decode("yesterday"), None);
    }

    #[test]
    fn test_encoding_sorts_chronologically() {
        let earlier = Utc.with_ymd_and_hms(2024, 1, 9, 23, 59, 59).unwrap();
        let later = Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).unwrap();
        assert!(encode(&earlier).unwrap() < encode(&later).unwrap());
    }

    #[test]
    fn test_five_digit_years_are_rejected() {
        let far = Utc.with_ymd_and_hms(10000, 1, 1, 0, 0, 0).unwrap();
        assert!(matches!(encode(&far), Err(Error::InvalidValue(_))));
        assert!(encode_opt(None).unwrap().is_none());

        let last = Utc.with_ymd_and_hms(9999, 12, 31, 23, 59, 59).unwrap();
        assert_eq!(decode(&encode(&last).unwrap()), Some(last));
    }
}
