use chrono::{DateTime, NaiveDateTime, Utc};

/// SQLite stores timestamps as "YYYY-MM-DD HH:MM:SS[.SSS]" without a timezone.
/// Values are always written in UTC.
pub fn parse_sqlite_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    raw.parse::<DateTime<Utc>>().ok().or_else(|| {
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f")
            .ok()
            .map(|ndt| ndt.and_utc())
    })
}
