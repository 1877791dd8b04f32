// ── Server timestamp format ──
//
// The screening server reports timestamps as `"2021.01.02 17:15:41"`,
// local to the server and without a zone marker. Transports parse them
// through here so every backend agrees on the interpretation.

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::error::ApiError;

const SERVER_FORMAT: &str = "%Y.%m.%d %H:%M:%S";

/// Parse a server-format timestamp, interpreting it as UTC.
pub fn parse_server_timestamp(value: &str) -> Result<DateTime<Utc>, ApiError> {
    NaiveDateTime::parse_from_str(value, SERVER_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|e| ApiError::BadTimestamp {
            value: value.to_owned(),
            message: e.to_string(),
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{Datelike, Timelike};

    use super::*;

    #[test]
    fn parses_documented_format() {
        let ts = parse_server_timestamp("2021.01.02 17:15:41").unwrap();
        assert_eq!((ts.year(), ts.month(), ts.day()), (2021, 1, 2));
        assert_eq!((ts.hour(), ts.minute(), ts.second()), (17, 15, 41));
    }

    #[test]
    fn rejects_iso8601_and_garbage() {
        assert!(parse_server_timestamp("2021-01-02T17:15:41").is_err());
        assert!(parse_server_timestamp("yesterday").is_err());
        assert!(parse_server_timestamp("").is_err());
    }

    #[test]
    fn bad_input_is_reported_with_the_offending_value() {
        let err = parse_server_timestamp("2021.13.40 99:99:99").unwrap_err();
        match err {
            ApiError::BadTimestamp { value, .. } => {
                assert_eq!(value, "2021.13.40 99:99:99");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
