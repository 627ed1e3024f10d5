use chrono::{DateTime, Datelike, SecondsFormat, Timelike, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Timestamp rendered in an exchange's local time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct LocalizedTimestamp {
    /// RFC 3339 UTC instant with millisecond precision, e.g. `2025-01-06T04:00:05.000Z`
    pub iso: String,
    /// `YYYY-MM-DD HH:mm:ss` in local time
    pub formatted: String,
    /// IANA timezone name used for rendering
    pub timezone: String,
    /// Offset from UTC, e.g. `+05:30`
    pub utc_offset: String,
    pub hours: u32,
    pub minutes: u32,
    pub seconds: u32,
    pub day: u32,
    /// 0-based month (January = 0)
    pub month: u32,
    pub year: i32,
}

/// Parse an IANA timezone name, falling back to UTC when absent or unknown
pub fn resolve_timezone(name: Option<&str>) -> Tz {
    name.and_then(|n| n.parse::<Tz>().ok()).unwrap_or(Tz::UTC)
}

/// Localize a UTC instant into the given exchange timezone
pub fn localize(timestamp: DateTime<Utc>, timezone: Option<&str>) -> LocalizedTimestamp {
    let tz = resolve_timezone(timezone);
    let local = timestamp.with_timezone(&tz);

    LocalizedTimestamp {
        iso: timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
        formatted: local.format("%Y-%m-%d %H:%M:%S").to_string(),
        timezone: tz.name().to_string(),
        utc_offset: local.format("%:z").to_string(),
        hours: local.hour(),
        minutes: local.minute(),
        seconds: local.second(),
        day: local.day(),
        month: local.month0(),
        year: local.year(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_localize_kolkata() {
        let ts = Utc.with_ymd_and_hms(2025, 1, 6, 4, 0, 5).unwrap();
        let local = localize(ts, Some("Asia/Kolkata"));

        assert_eq!(local.iso, "2025-01-06T04:00:05.000Z");
        assert_eq!(local.formatted, "2025-01-06 09:30:05");
        assert_eq!(local.timezone, "Asia/Kolkata");
        assert_eq!(local.utc_offset, "+05:30");
        assert_eq!((local.hours, local.minutes, local.seconds), (9, 30, 5));
        assert_eq!((local.day, local.month, local.year), (6, 0, 2025));
    }

    #[test]
    fn test_localize_crosses_date_boundary() {
        let ts = Utc.with_ymd_and_hms(2025, 3, 1, 2, 15, 0).unwrap();
        let local = localize(ts, Some("America/New_York"));

        assert_eq!(local.formatted, "2025-02-28 21:15:00");
        assert_eq!(local.utc_offset, "-05:00");
        assert_eq!(local.iso, "2025-03-01T02:15:00.000Z");
        assert_eq!((local.day, local.month), (28, 1));
    }

    #[test]
    fn test_missing_or_unknown_timezone_falls_back_to_utc() {
        let ts = Utc.with_ymd_and_hms(2025, 1, 6, 14, 30, 0).unwrap();

        for tz in [None, Some("Mars/Olympus_Mons")] {
            let local = localize(ts, tz);
            assert_eq!(local.timezone, "UTC");
            assert_eq!(local.utc_offset, "+00:00");
            assert_eq!(local.iso, "2025-01-06T14:30:00.000Z");
        }
    }
}
