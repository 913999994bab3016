use crate::journal::activity::Stamped;
use std::collections::HashSet;

/// Minute bucket of the instant. Independent of the display zone.
fn minute_bucket(secs: i64) -> i64 {
    secs.div_euclid(60)
}

/// Sort ascending by timestamp and drop later items sharing
/// `(text, minute)` with an earlier one. Ties in time keep input order.
pub fn dedupe<T: Stamped>(mut items: Vec<T>) -> Vec<T> {
    items.sort_by_key(|item| *item.timestamp());
    let mut seen: HashSet<(String, i64)> = HashSet::with_capacity(items.len());
    items.retain(|item| {
        let key = (
            item.text().to_string(),
            minute_bucket(item.timestamp().timestamp()),
        );
        seen.insert(key)
    });
    items
}

#[cfg(test)]
mod tests {
    use super::dedupe;
    use crate::journal::activity::LearningNote;
    use crate::journal::timestamp::parse_iso;
    use chrono_tz::Asia::Shanghai;

    fn note(text: &str, ts: &str) -> LearningNote {
        LearningNote {
            timestamp: parse_iso(ts, Shanghai).expect("valid ts"),
            text: text.to_string(),
            source: "s.jsonl".to_string(),
        }
    }

    #[test]
    fn same_text_same_minute_collapses() {
        let got = dedupe(vec![
            note("a", "2024-01-01T10:00:30+08:00"),
            note("a", "2024-01-01T10:00:00+08:00"),
        ]);
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].timestamp, parse_iso("2024-01-01T10:00:00+08:00", Shanghai).unwrap());
    }

    #[test]
    fn different_minute_or_text_survives() {
        let got = dedupe(vec![
            note("a", "2024-01-01T10:01:00+08:00"),
            note("a", "2024-01-01T10:00:59+08:00"),
            note("b", "2024-01-01T10:00:10+08:00"),
        ]);
        let texts: Vec<&str> = got.iter().map(|n| n.text.as_str()).collect();
        assert_eq!(texts, ["b", "a", "a"]);
    }

    #[test]
    fn dedupe_is_idempotent_and_sorted() {
        let input = vec![
            note("c", "2024-01-02T09:00:00+08:00"),
            note("a", "2024-01-01T10:00:00+08:00"),
            note("a", "2024-01-01T10:00:20+08:00"),
            note("b", "2024-01-01T23:59:59+08:00"),
        ];
        let once = dedupe(input);
        let twice = dedupe(once.clone());
        assert_eq!(once, twice);
        assert!(once.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
        assert_eq!(once.len(), 3);
    }
}
