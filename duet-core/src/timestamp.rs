//! Timestamps as they appear on the wire.
//!
//! The controller reports dates as `YYYY-MM-DDTHH:MM:SS` with no offset. They
//! are wall-clock readings in whatever zone the controller was set to, which is
//! assumed to be the zone of the process talking to it.

use std::time::SystemTime;

use chrono::{DateTime, Local, LocalResult, NaiveDateTime, Offset, TimeZone, Utc};
use thiserror::Error;

pub const WIRE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

#[derive(Debug, Error)]
#[error("invalid timestamp {value:?}: {source}")]
pub struct TimestampError {
    pub value: String,
    #[source]
    pub source: chrono::ParseError,
}

/// Parses a wire timestamp in the local timezone of the running process.
pub fn parse_wire_timestamp(value: &str) -> Result<SystemTime, TimestampError> {
    parse_wire_timestamp_in(value, &Local)
}

/// Parses a wire timestamp as a wall-clock reading in `tz`.
///
/// An ambiguous reading (clocks turned back) resolves to the earlier instant.
/// A reading that falls into a gap (clocks turned forward) is shifted by the
/// offset the zone reports for that reading taken as UTC.
pub fn parse_wire_timestamp_in<Tz: TimeZone>(
    value: &str,
    tz: &Tz,
) -> Result<SystemTime, TimestampError> {
    let naive =
        NaiveDateTime::parse_from_str(value, WIRE_FORMAT).map_err(|source| TimestampError {
            value: value.to_string(),
            source,
        })?;
    Ok(resolve_local(&naive, tz))
}

fn resolve_local<Tz: TimeZone>(naive: &NaiveDateTime, tz: &Tz) -> SystemTime {
    match tz.from_local_datetime(naive) {
        LocalResult::Single(at) => at.into(),
        LocalResult::Ambiguous(earliest, _) => earliest.into(),
        LocalResult::None => {
            let offset = tz.offset_from_utc_datetime(naive).fix();
            let secs = naive.and_utc().timestamp() - i64::from(offset.local_minus_utc());
            DateTime::<Utc>::from_timestamp(secs, 0)
                .unwrap_or_else(|| naive.and_utc())
                .into()
        }
    }
}

/// Formats an instant the way the controller expects it, in local time.
pub fn format_wire_timestamp(at: SystemTime) -> String {
    DateTime::<Local>::from(at).format(WIRE_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, NaiveDate};
    use std::time::{Duration, UNIX_EPOCH};

    /// Central European rules for 2024 only: +01:00, and +02:00 between
    /// 2024-03-31T01:00Z and 2024-10-27T01:00Z.
    #[derive(Clone, Copy, Debug)]
    struct CentralEurope2024;

    impl CentralEurope2024 {
        fn winter() -> FixedOffset {
            FixedOffset::east_opt(3600).unwrap()
        }

        fn summer() -> FixedOffset {
            FixedOffset::east_opt(2 * 3600).unwrap()
        }
    }

    impl TimeZone for CentralEurope2024 {
        type Offset = FixedOffset;

        fn from_offset(_offset: &FixedOffset) -> Self {
            CentralEurope2024
        }

        fn offset_from_local_date(&self, local: &NaiveDate) -> LocalResult<FixedOffset> {
            self.offset_from_local_datetime(&local.and_hms_opt(0, 0, 0).unwrap())
        }

        fn offset_from_local_datetime(&self, local: &NaiveDateTime) -> LocalResult<FixedOffset> {
            let valid: Vec<FixedOffset> = [Self::summer(), Self::winter()]
                .into_iter()
                .filter(|offset| {
                    let utc = *local
                        - chrono::Duration::seconds(i64::from(offset.local_minus_utc()));
                    self.offset_from_utc_datetime(&utc) == *offset
                })
                .collect();
            match valid.as_slice() {
                [] => LocalResult::None,
                [only] => LocalResult::Single(*only),
                [earlier, later, ..] => LocalResult::Ambiguous(*earlier, *later),
            }
        }

        fn offset_from_utc_date(&self, utc: &NaiveDate) -> FixedOffset {
            self.offset_from_utc_datetime(&utc.and_hms_opt(0, 0, 0).unwrap())
        }

        fn offset_from_utc_datetime(&self, utc: &NaiveDateTime) -> FixedOffset {
            let starts = NaiveDate::from_ymd_opt(2024, 3, 31)
                .unwrap()
                .and_hms_opt(1, 0, 0)
                .unwrap();
            let ends = NaiveDate::from_ymd_opt(2024, 10, 27)
                .unwrap()
                .and_hms_opt(1, 0, 0)
                .unwrap();
            if (starts..ends).contains(utc) {
                Self::summer()
            } else {
                Self::winter()
            }
        }
    }

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> SystemTime {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap().into()
    }

    #[test]
    fn parses_reading_in_given_zone() {
        let at = parse_wire_timestamp_in("1970-01-01T00:01:40", &Utc).unwrap();
        assert_eq!(at, UNIX_EPOCH + Duration::from_secs(100));

        let plus_two = FixedOffset::east_opt(2 * 3600).unwrap();
        let at = parse_wire_timestamp_in("2024-05-01T12:00:00", &plus_two).unwrap();
        let expected = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
        assert_eq!(at, SystemTime::from(expected));
    }

    #[test]
    fn summer_and_winter_readings_use_their_own_offset() {
        let tz = CentralEurope2024;
        assert_eq!(
            parse_wire_timestamp_in("2024-07-01T12:00:00", &tz).unwrap(),
            utc(2024, 7, 1, 10, 0)
        );
        assert_eq!(
            parse_wire_timestamp_in("2024-12-01T12:00:00", &tz).unwrap(),
            utc(2024, 12, 1, 11, 0)
        );
    }

    #[test]
    fn repeated_hour_resolves_to_earlier_instant() {
        let at = parse_wire_timestamp_in("2024-10-27T02:30:00", &CentralEurope2024).unwrap();
        assert_eq!(at, utc(2024, 10, 27, 0, 30));
    }

    #[test]
    fn skipped_hour_is_shifted_by_offset_at_reading() {
        let at = parse_wire_timestamp_in("2024-03-31T02:30:00", &CentralEurope2024).unwrap();
        assert_eq!(at, utc(2024, 3, 31, 0, 30));
    }

    #[test]
    fn rejects_offsets_and_garbage() {
        assert!(parse_wire_timestamp_in("2024-05-01T12:00:00Z", &Utc).is_err());
        assert!(parse_wire_timestamp_in("2024-05-01 12:00:00", &Utc).is_err());
        let err = parse_wire_timestamp("yesterday").unwrap_err();
        assert_eq!(err.value, "yesterday");
    }

    #[test]
    fn local_format_round_trips() {
        let at = parse_wire_timestamp("2023-11-20T08:15:30").unwrap();
        assert_eq!(format_wire_timestamp(at), "2023-11-20T08:15:30");
    }
}
