//! Fixed-width UTC timestamps
//!
//! Every stored timestamp is written as RFC 3339 with exactly six fractional
//! digits and a `Z` suffix, so lexicographic order on the stored string is
//! chronological order. Both store backends sort on the raw value.

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use serde::{Deserialize, Deserializer, Serializer};

/// Current time truncated to the stored precision
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Render a timestamp in stored form
pub fn format(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Stored form as a JSON value, for partial updates
pub fn to_value(ts: &DateTime<Utc>) -> serde_json::Value {
    serde_json::Value::String(format(ts))
}

pub fn serialize<S>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format(ts))
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_fixed_width() {
        let whole = Utc.with_ymd_and_hms(2025, 1, 31, 10, 15, 0).unwrap();
        assert_eq!(format(&whole), "2025-01-31T10:15:00.000000Z");

        let later = whole + chrono::Duration::microseconds(1);
        assert!(format(&whole) < format(&later));
    }

    #[test]
    fn test_now_round_trips() {
        #[derive(serde::Serialize, serde::Deserialize)]
        struct Wrapper {
            #[serde(with = "crate::db::schemas::timestamp")]
            at: DateTime<Utc>,
        }

        let at = now();
        let json = serde_json::to_string(&Wrapper { at }).unwrap();
        let back: Wrapper = serde_json::from_str(&json).unwrap();
        assert_eq!(back.at, at);
    }
}
