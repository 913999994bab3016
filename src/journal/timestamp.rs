use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde_json::Value;

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Resolve the instant of a log record in `tz`.
///
/// A numeric `message.timestamp` (epoch milliseconds) wins over the record's
/// ISO-8601 `timestamp` string. Never falls back to the current time.
pub fn resolve(
    record_ts: Option<&Value>,
    message_ts: Option<&Value>,
    tz: Tz,
) -> Option<DateTime<Tz>> {
    if let Some(ts) = message_ts.and_then(from_epoch_millis) {
        return Some(ts.with_timezone(&tz));
    }
    record_ts
        .and_then(Value::as_str)
        .and_then(|raw| parse_iso(raw, tz))
}

fn from_epoch_millis(value: &Value) -> Option<DateTime<Utc>> {
    let millis = match value {
        Value::Number(n) => match n.as_i64() {
            Some(ms) => ms,
            None => {
                let f = n.as_f64()?;
                if !f.is_finite() || f.abs() > i64::MAX as f64 {
                    return None;
                }
                f.round() as i64
            }
        },
        _ => return None,
    };
    Utc.timestamp_millis_opt(millis).single()
}

/// ISO-8601 with a trailing `Z` read as UTC. Strings without any offset are
/// taken as wall-clock time in `tz`.
pub fn parse_iso(raw: &str, tz: Tz) -> Option<DateTime<Tz>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let normalized = match trimmed.strip_suffix('Z').or_else(|| trimmed.strip_suffix('z')) {
        Some(head) => format!("{head}+00:00"),
        None => trimmed.to_string(),
    };

    if let Ok(ts) = DateTime::parse_from_rfc3339(&normalized) {
        return Some(ts.with_timezone(&tz));
    }
    for fmt in ["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%dT%H:%M:%S%.f%z"] {
        if let Ok(ts) = DateTime::parse_from_str(&normalized, fmt) {
            return Some(ts.with_timezone(&tz));
        }
    }
    NAIVE_FORMATS.iter().find_map(|fmt| {
        NaiveDateTime::parse_from_str(&normalized, fmt)
            .ok()
            .and_then(|naive| tz.from_local_datetime(&naive).earliest())
    })
}

#[cfg(test)]
mod tests {
    use super::{parse_iso, resolve};
    use chrono::{TimeZone, Timelike};
    use chrono_tz::Asia::Shanghai;
    use chrono_tz::UTC;
    use serde_json::json;

    #[test]
    fn numeric_message_timestamp_wins() {
        let record = json!("2020-01-01T00:00:00Z");
        let message = json!(1_704_074_400_000_i64);
        let got = resolve(Some(&record), Some(&message), Shanghai).expect("resolves");
        assert_eq!(got, Shanghai.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap());
    }

    #[test]
    fn fractional_millis_are_accepted() {
        let message = json!(1_704_074_400_000.4_f64);
        let got = resolve(None, Some(&message), UTC).expect("resolves");
        assert_eq!(got.hour(), 2);
    }

    #[test]
    fn record_string_used_when_message_timestamp_is_not_numeric() {
        let record = json!("2024-01-01T02:00:00Z");
        let message = json!("not a number");
        let got = resolve(Some(&record), Some(&message), Shanghai).expect("resolves");
        assert_eq!(got.hour(), 10);
    }

    #[test]
    fn missing_or_malformed_timestamps_resolve_to_none() {
        assert!(resolve(None, None, Shanghai).is_none());
        assert!(resolve(Some(&json!("yesterday")), None, Shanghai).is_none());
        assert!(resolve(Some(&json!(1_704_074_400)), None, Shanghai).is_none());
        assert!(resolve(None, Some(&json!(f64::MAX)), Shanghai).is_none());
    }

    #[test]
    fn iso_offsets_and_naive_forms_parse() {
        let a = parse_iso("2024-01-01T10:00:00+08:00", UTC).expect("offset form");
        assert_eq!(a.hour(), 2);
        let b = parse_iso("2024-01-01 10:00:00.250+08:00", Shanghai).expect("space form");
        assert_eq!(b.hour(), 10);
        let c = parse_iso("2024-01-01T10:00:00", Shanghai).expect("naive form");
        assert_eq!(c, Shanghai.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap());
    }
}
