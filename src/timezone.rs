use chrono::{DateTime, NaiveDateTime, Utc};
use chrono_tz::Tz;

/// Parse an IANA zone name ("Asia/Tokyo").  Junk yields `None`, never a
/// panic; callers fall through to the next candidate.
pub fn parse_zone(name: &str) -> Option<Tz> {
    name.trim().parse::<Tz>().ok()
}

/// Pick the zone timestamps are displayed in.
///
/// Precedence: explicit request parameter, then the zone remembered on the
/// session, then the configured fallback.  Invalid names at any level fall
/// through to the next; an invalid fallback means UTC.
pub fn resolve_display_zone(explicit: Option<&str>, session: Option<&str>, fallback: &str) -> Tz {
    explicit
        .and_then(parse_zone)
        .or_else(|| session.and_then(parse_zone))
        .or_else(|| parse_zone(fallback))
        .unwrap_or(chrono_tz::UTC)
}

fn utc_from_millis(ts_ms: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ts_ms).unwrap_or(DateTime::UNIX_EPOCH)
}

/// Re-express a UTC timestamp as wall-clock time in `tz`.  The instant is
/// unchanged, only its label moves.
pub fn to_zone_naive(ts_ms: i64, tz: Tz) -> NaiveDateTime {
    utc_from_millis(ts_ms).with_timezone(&tz).naive_local()
}

/// Human-readable wall-clock stamp in `tz`, minute precision.
pub fn format_in_zone(ts_ms: i64, tz: Tz) -> String {
    utc_from_millis(ts_ms)
        .with_timezone(&tz)
        .format("%Y-%m-%d %H:%M")
        .to_string()
}
