use crate::{TzError, TzResult};
use chrono::{
    DateTime, Datelike, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeDelta,
    TimeZone, Utc,
};
use chrono_tz::Tz;

/// Offset-less input formats accepted from forms, most specific first.
const LOCAL_INPUT_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Format produced for datetime-local form fields.
const INPUT_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// How far before a skipped local time to look for the offset that was in force.
const GAP_PROBE_DAYS: i64 = 2;

/// Interpret a wall-clock time in `tz` and convert it to UTC.
///
/// Repeated local times (clocks falling back) take the earlier instant. Skipped local
/// times (clocks springing forward) are read with the offset in force before the jump.
pub fn to_utc(local: NaiveDateTime, tz: Tz) -> DateTime<Utc> {
    match tz.from_local_datetime(&local) {
        LocalResult::Single(dt) => dt.with_timezone(&Utc),
        LocalResult::Ambiguous(earliest, _) => earliest.with_timezone(&Utc),
        LocalResult::None => resolve_gap(local, tz),
    }
}

/// Express a stored UTC instant in the caller's zone. The input is not modified.
pub fn to_zone(utc: DateTime<Utc>, tz: Tz) -> DateTime<Tz> {
    utc.with_timezone(&tz)
}

/// Last microsecond of the zone-local calendar day containing `now`, as a UTC instant.
///
/// The local date is taken in `tz`, not in UTC, and the conversion back uses the zone's
/// real rules for that date, so days that gain or lose an hour produce boundaries 25 or
/// 23 hours apart.
pub fn end_of_day_boundary_utc(tz: Tz, now: DateTime<Utc>) -> DateTime<Utc> {
    let local_date = now.with_timezone(&tz).date_naive();
    // wraps to 23:59:59.999999
    let last_instant = NaiveTime::MIN - TimeDelta::microseconds(1);
    let local = local_date.and_time(last_instant);
    match tz.from_local_datetime(&local) {
        LocalResult::Single(dt) => dt.with_timezone(&Utc),
        LocalResult::Ambiguous(_, latest) => latest.with_timezone(&Utc),
        LocalResult::None => resolve_gap(local, tz),
    }
}

/// Parse a timestamp typed by a caller in `tz`.
///
/// RFC 3339 input carries its own offset and is converted directly. Anything without an
/// offset is taken as wall-clock time in `tz`; a bare date means local midnight.
pub fn parse_local_input(input: &str, tz: Tz) -> TzResult<DateTime<Utc>> {
    let trimmed = input.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Utc));
    }
    for format in LOCAL_INPUT_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(to_utc(naive, tz));
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(to_utc(date.and_time(NaiveTime::MIN), tz));
    }
    Err(TzError::InvalidTimestamp {
        input: input.to_string(),
    })
}

/// Render a UTC instant as `YYYY-MM-DDTHH:MM` in the caller's zone.
pub fn format_for_input(utc: DateTime<Utc>, tz: Tz) -> String {
    to_zone(utc, tz).format(INPUT_FORMAT).to_string()
}

/// Abbreviation of the zone at the given instant, e.g. `EST` or `EDT`.
pub fn zone_label(tz: Tz, at: DateTime<Utc>) -> String {
    to_zone(at, tz).format("%Z").to_string()
}

/// Snapshot of "now" as seen from a zone.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LocalClock {
    pub now: DateTime<Tz>,
    pub date: NaiveDate,
    /// 1 = Monday .. 7 = Sunday.
    pub iso_weekday: u32,
}

pub fn local_clock(tz: Tz, now: DateTime<Utc>) -> LocalClock {
    let local = to_zone(now, tz);
    LocalClock {
        date: local.date_naive(),
        iso_weekday: local.weekday().number_from_monday(),
        now: local,
    }
}

fn resolve_gap(local: NaiveDateTime, tz: Tz) -> DateTime<Utc> {
    let before = tz
        .offset_from_utc_datetime(&(local - TimeDelta::days(GAP_PROBE_DAYS)))
        .fix()
        .local_minus_utc();
    Utc.from_utc_datetime(&(local - TimeDelta::seconds(i64::from(before))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    const NEW_YORK: Tz = Tz::America__New_York;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).single().expect("valid utc")
    }

    fn naive(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .and_then(|date| date.and_hms_opt(h, min, 0))
            .expect("valid naive")
    }

    #[test]
    fn boundary_is_last_microsecond_of_local_day() {
        // 10:00 EST on 2024-01-15.
        let boundary = end_of_day_boundary_utc(NEW_YORK, utc(2024, 1, 15, 15, 0));
        let expected = utc(2024, 1, 16, 4, 59) + TimeDelta::seconds(59);
        assert_eq!(boundary, expected + TimeDelta::microseconds(999_999));
        let local = to_zone(boundary, NEW_YORK);
        assert_eq!((local.hour(), local.minute(), local.second()), (23, 59, 59));
        assert_eq!(local.nanosecond(), 999_999_000);
    }

    #[test]
    fn boundary_uses_local_date_not_utc_date() {
        // 02:00 UTC on the 16th is still the evening of the 15th in New York.
        let late = end_of_day_boundary_utc(NEW_YORK, utc(2024, 1, 16, 2, 0));
        let early = end_of_day_boundary_utc(NEW_YORK, utc(2024, 1, 15, 15, 0));
        assert_eq!(late, early);
    }

    #[test]
    fn spring_forward_day_is_23_hours_long() {
        // DST starts 2024-03-10 02:00 local.
        let mar8 = end_of_day_boundary_utc(NEW_YORK, utc(2024, 3, 8, 17, 0));
        let mar9 = end_of_day_boundary_utc(NEW_YORK, utc(2024, 3, 9, 17, 0));
        let mar10 = end_of_day_boundary_utc(NEW_YORK, utc(2024, 3, 10, 17, 0));
        assert_eq!(mar9 - mar8, TimeDelta::hours(24));
        assert_eq!(mar10 - mar9, TimeDelta::hours(23));
        assert_eq!(mar9.hour(), 4);
        assert_eq!(mar10.hour(), 3);
    }

    #[test]
    fn fall_back_day_is_25_hours_long() {
        // DST ends 2024-11-03 02:00 local.
        let nov2 = end_of_day_boundary_utc(NEW_YORK, utc(2024, 11, 2, 17, 0));
        let nov3 = end_of_day_boundary_utc(NEW_YORK, utc(2024, 11, 3, 17, 0));
        let nov4 = end_of_day_boundary_utc(NEW_YORK, utc(2024, 11, 4, 17, 0));
        assert_eq!(nov3 - nov2, TimeDelta::hours(25));
        assert_eq!(nov4 - nov3, TimeDelta::hours(24));
    }

    #[test]
    fn fixed_offset_zones_have_uniform_days() {
        let kolkata = Tz::Asia__Kolkata;
        let a = end_of_day_boundary_utc(kolkata, utc(2024, 3, 9, 12, 0));
        let b = end_of_day_boundary_utc(kolkata, utc(2024, 3, 10, 12, 0));
        assert_eq!(b - a, TimeDelta::hours(24));
        assert_eq!(to_zone(a, kolkata).hour(), 23);
    }

    #[test]
    fn naive_input_is_read_in_the_callers_zone() {
        assert_eq!(to_utc(naive(2024, 1, 15, 9, 0), NEW_YORK), utc(2024, 1, 15, 14, 0));
        assert_eq!(to_utc(naive(2024, 7, 15, 9, 0), NEW_YORK), utc(2024, 7, 15, 13, 0));
        assert_eq!(to_utc(naive(2024, 7, 15, 9, 0), Tz::UTC), utc(2024, 7, 15, 9, 0));
    }

    #[test]
    fn skipped_local_time_uses_pre_transition_offset() {
        // 02:30 does not exist on 2024-03-10 in New York; read it as EST.
        assert_eq!(to_utc(naive(2024, 3, 10, 2, 30), NEW_YORK), utc(2024, 3, 10, 7, 30));
    }

    #[test]
    fn repeated_local_time_takes_the_earlier_instant() {
        // 01:30 happens twice on 2024-11-03; the first is EDT.
        assert_eq!(to_utc(naive(2024, 11, 3, 1, 30), NEW_YORK), utc(2024, 11, 3, 5, 30));
    }

    #[test]
    fn parses_form_and_rfc3339_input() {
        let expected = utc(2024, 1, 15, 14, 0);
        for input in [
            "2024-01-15T09:00",
            "2024-01-15T09:00:00",
            "2024-01-15T09:00:00.000",
            "2024-01-15 09:00",
            "2024-01-15T14:00:00Z",
            "2024-01-15T06:00:00-08:00",
        ] {
            assert_eq!(parse_local_input(input, NEW_YORK).expect(input), expected, "{input}");
        }
        assert_eq!(
            parse_local_input("2024-01-15", NEW_YORK).expect("date"),
            utc(2024, 1, 15, 5, 0)
        );
        assert!(matches!(
            parse_local_input("next tuesday", NEW_YORK),
            Err(TzError::InvalidTimestamp { .. })
        ));
    }

    #[test]
    fn display_helpers_render_in_zone() {
        let at = utc(2024, 1, 15, 14, 5);
        assert_eq!(format_for_input(at, NEW_YORK), "2024-01-15T09:05");
        assert_eq!(zone_label(NEW_YORK, at), "EST");
        assert_eq!(zone_label(NEW_YORK, utc(2024, 7, 15, 14, 5)), "EDT");
    }

    #[test]
    fn local_clock_reports_weekday_and_date() {
        // Monday 2024-01-15 23:30 local is Tuesday in UTC.
        let clock = local_clock(NEW_YORK, utc(2024, 1, 16, 4, 30));
        assert_eq!(clock.date, NaiveDate::from_ymd_opt(2024, 1, 15).expect("date"));
        assert_eq!(clock.iso_weekday, 1);
    }
}
