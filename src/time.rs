use chrono::{DateTime, Duration as ChronoDuration, NaiveDate, NaiveDateTime, TimeZone, Utc};

use crate::error::QueryError;

/// Layouts carrying their own offset, for offsets RFC 3339 does not accept (`+0000`).
const ZONED_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%d %H:%M:%S%.f%z"];

/// Naive date-time layouts, tried in order after the zoned formats. Values without an offset
/// are taken to be UTC.
const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S%.f",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S%.f",
    "%m/%d/%Y %H:%M",
    "%B %d %Y %H:%M:%S",
    "%B %d %Y %H:%M",
    "%B %d, %Y %H:%M:%S",
    "%B %d, %Y %H:%M",
    "%d %B %Y %H:%M:%S",
    "%d %B %Y %H:%M",
];

/// Date-only layouts, resolved to midnight UTC. `%B` also matches abbreviated month names.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%B %d %Y",
    "%B %d, %Y",
    "%d %B %Y",
];

/// Shorter digit runs are not treated as epoch seconds; `2023` is a year, not 1970.
const MIN_EPOCH_DIGITS: usize = 9;

/// Parses a free form absolute date such as `2023-01-01T00:00:00Z`, `2023-01-01 12:30`,
/// `2023/01/01`, `01/01/2023`, `Jan 1 2023`, a bare year or unix epoch seconds.
///
/// `arg` is the flag the value came from, used to report a [`QueryError::Parse`].
pub fn parse_timestamp(arg: &'static str, value: &str) -> Result<DateTime<Utc>, QueryError> {
    let trimmed = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(trimmed) {
        return Ok(dt.with_timezone(&Utc));
    }
    for format in ZONED_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(trimmed, format) {
            return Ok(dt.with_timezone(&Utc));
        }
    }
    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return midnight(date).ok_or_else(|| QueryError::parse(arg, value));
        }
    }
    if !trimmed.is_empty() && trimmed.chars().all(|c| c.is_ascii_digit()) {
        let parsed = match trimmed.len() {
            4 => trimmed
                .parse::<i32>()
                .ok()
                .and_then(|year| NaiveDate::from_ymd_opt(year, 1, 1))
                .and_then(midnight),
            n if n >= MIN_EPOCH_DIGITS => trimmed
                .parse::<i64>()
                .ok()
                .and_then(|secs| Utc.timestamp_opt(secs, 0).single()),
            _ => None,
        };
        return parsed.ok_or_else(|| QueryError::parse(arg, value));
    }

    Err(QueryError::parse(arg, value))
}

/// Resolves a human readable expression against `now`.
///
/// Understands `now`, `today`, `yesterday` and durations in the humantime grammar with an
/// optional `ago` suffix (`2h`, `1h 30m`, `3days ago`). Anything else is handed to
/// [`parse_timestamp`].
pub fn parse_relative(
    arg: &'static str,
    value: &str,
    now: DateTime<Utc>,
) -> Result<DateTime<Utc>, QueryError> {
    let trimmed = value.trim();

    match trimmed.to_ascii_lowercase().as_str() {
        "now" => return Ok(now),
        "today" => {
            return midnight(now.date_naive()).ok_or_else(|| QueryError::parse(arg, value))
        }
        "yesterday" => {
            return midnight(now.date_naive())
                .and_then(|dt| dt.checked_sub_signed(ChronoDuration::days(1)))
                .ok_or_else(|| QueryError::parse(arg, value))
        }
        _ => {}
    }

    if let Ok(span) = humantime::parse_duration(strip_ago(trimmed)) {
        return ChronoDuration::from_std(span)
            .ok()
            .and_then(|span| now.checked_sub_signed(span))
            .ok_or_else(|| QueryError::parse(arg, value));
    }

    parse_timestamp(arg, value)
}

fn strip_ago(expr: &str) -> &str {
    let len = expr.len();
    if len > 3 && expr.is_char_boundary(len - 3) && expr[len - 3..].eq_ignore_ascii_case("ago") {
        expr[..len - 3].trim_end()
    } else {
        expr
    }
}

fn midnight(date: NaiveDate) -> Option<DateTime<Utc>> {
    date.and_hms_opt(0, 0, 0)
        .map(|naive| Utc.from_utc_datetime(&naive))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    #[test]
    fn parses_rfc3339_with_zulu_and_offset() {
        assert_eq!(
            parse_timestamp("start-time", "2023-01-01T00:00:00Z").unwrap(),
            at(2023, 1, 1, 0, 0, 0)
        );
        assert_eq!(
            parse_timestamp("start-time", "2023-01-01T02:00:00+02:00").unwrap(),
            at(2023, 1, 1, 0, 0, 0)
        );
    }

    #[test]
    fn naive_values_are_utc() {
        assert_eq!(
            parse_timestamp("end-time", "2023-01-01 01:30").unwrap(),
            at(2023, 1, 1, 1, 30, 0)
        );
        assert_eq!(
            parse_timestamp("end-time", "2023-01-01T01:30:15.250").unwrap(),
            at(2023, 1, 1, 1, 30, 15) + ChronoDuration::milliseconds(250)
        );
        assert_eq!(
            parse_timestamp("end-time", "2023-06-15").unwrap(),
            at(2023, 6, 15, 0, 0, 0)
        );
    }

    #[test]
    fn parses_rfc2822_and_epoch_seconds() {
        assert_eq!(
            parse_timestamp("start-time", "Sun, 01 Jan 2023 00:00:00 +0000").unwrap(),
            at(2023, 1, 1, 0, 0, 0)
        );
        assert_eq!(
            parse_timestamp("start-time", "1672531200").unwrap(),
            at(2023, 1, 1, 0, 0, 0)
        );
    }

    #[test]
    fn parses_slash_and_month_name_dates() {
        assert_eq!(
            parse_timestamp("start-time", "2023/01/01").unwrap(),
            at(2023, 1, 1, 0, 0, 0)
        );
        assert_eq!(
            parse_timestamp("start-time", "01/02/2023").unwrap(),
            at(2023, 1, 2, 0, 0, 0)
        );
        assert_eq!(
            parse_timestamp("start-time", "Jan 1 2023").unwrap(),
            at(2023, 1, 1, 0, 0, 0)
        );
        assert_eq!(
            parse_timestamp("start-time", "January 1, 2023 10:00").unwrap(),
            at(2023, 1, 1, 10, 0, 0)
        );
        assert_eq!(
            parse_timestamp("start-time", "1 March 2023").unwrap(),
            at(2023, 3, 1, 0, 0, 0)
        );
    }

    #[test]
    fn parses_compact_offsets() {
        assert_eq!(
            parse_timestamp("start-time", "2023-01-01T00:00:00+0000").unwrap(),
            at(2023, 1, 1, 0, 0, 0)
        );
        assert_eq!(
            parse_timestamp("start-time", "2023-01-01 05:30:00+0530").unwrap(),
            at(2023, 1, 1, 0, 0, 0)
        );
    }

    #[test]
    fn short_digit_runs_are_not_epoch_seconds() {
        assert_eq!(
            parse_timestamp("start-time", "2023").unwrap(),
            at(2023, 1, 1, 0, 0, 0)
        );
        assert_eq!(
            parse_timestamp("start-time", "12345").unwrap_err(),
            QueryError::parse("start-time", "12345")
        );
        assert_eq!(
            parse_timestamp("start-time", "100000000").unwrap(),
            at(1973, 3, 3, 9, 46, 40)
        );
    }

    #[test]
    fn unrecognised_date_names_the_argument() {
        let err = parse_timestamp("start-time", "next tuesday-ish").unwrap_err();
        assert_eq!(
            err,
            QueryError::Parse {
                arg: "start-time",
                value: "next tuesday-ish".into()
            }
        );
        assert!(err.to_string().contains("--start-time"));
        assert!(parse_timestamp("end-time", "").is_err());
    }

    #[test]
    fn relative_keywords() {
        let now = at(2024, 3, 10, 15, 45, 0);
        assert_eq!(parse_relative("until", "now", now).unwrap(), now);
        assert_eq!(parse_relative("until", " NOW ", now).unwrap(), now);
        assert_eq!(
            parse_relative("since", "today", now).unwrap(),
            at(2024, 3, 10, 0, 0, 0)
        );
        assert_eq!(
            parse_relative("since", "yesterday", now).unwrap(),
            at(2024, 3, 9, 0, 0, 0)
        );
    }

    #[test]
    fn relative_durations_count_back_from_now() {
        let now = at(2024, 3, 10, 15, 45, 0);
        assert_eq!(
            parse_relative("since", "2h", now).unwrap(),
            at(2024, 3, 10, 13, 45, 0)
        );
        assert_eq!(
            parse_relative("since", "1h 30m", now).unwrap(),
            at(2024, 3, 10, 14, 15, 0)
        );
        assert_eq!(
            parse_relative("since", "3days ago", now).unwrap(),
            at(2024, 3, 7, 15, 45, 0)
        );
        assert_eq!(
            parse_relative("since", "90m AGO", now).unwrap(),
            at(2024, 3, 10, 14, 15, 0)
        );
    }

    #[test]
    fn relative_falls_back_to_absolute() {
        let now = at(2024, 3, 10, 15, 45, 0);
        assert_eq!(
            parse_relative("since", "2024-03-01T00:00:00Z", now).unwrap(),
            at(2024, 3, 1, 0, 0, 0)
        );
        assert_eq!(
            parse_relative("until", "whenever", now).unwrap_err(),
            QueryError::parse("until", "whenever")
        );
    }
}
