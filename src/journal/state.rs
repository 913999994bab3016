use crate::journal::util::write_json_atomic;
use anyhow::Result;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

pub const ACTIVITY_STREAK: &str = "activityStreak";
pub const LEARNING_STREAK: &str = "learningStreak";

/// What the current run observed, per streak.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreakSignals {
    pub activity: bool,
    pub learning: bool,
}

/// Persisted state object. Keys other than `streaks` and `lastUpdated`
/// belong to other tools and pass through untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JournalState {
    root: Map<String, Value>,
}

fn counter_value(value: &Value) -> i64 {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
            .unwrap_or(0),
        Value::String(s) => s.trim().parse::<i64>().unwrap_or(0),
        _ => 0,
    }
}

impl JournalState {
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(root) => Self { root },
            _ => Self::default(),
        }
    }

    pub fn as_value(&self) -> Value {
        Value::Object(self.root.clone())
    }

    pub fn streak(&self, name: &str) -> i64 {
        self.root
            .get("streaks")
            .and_then(|s| s.get(name))
            .map(counter_value)
            .unwrap_or(0)
    }

    pub fn streaks(&self) -> [(&'static str, i64); 2] {
        [
            (ACTIVITY_STREAK, self.streak(ACTIVITY_STREAK)),
            (LEARNING_STREAK, self.streak(LEARNING_STREAK)),
        ]
    }

    pub fn last_updated(&self) -> Option<&str> {
        self.root.get("lastUpdated").and_then(Value::as_str)
    }

    fn take_streaks(&mut self) -> Map<String, Value> {
        match self.root.remove("streaks") {
            Some(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }

    /// Increment each streak the run qualified for and stamp `lastUpdated`.
    ///
    /// Not idempotent: two qualifying runs on the same day count twice.
    pub fn merge(&mut self, signals: StreakSignals, generated_at: &str) {
        let mut streaks = self.take_streaks();
        if signals.activity {
            bump(&mut streaks, ACTIVITY_STREAK);
        }
        if signals.learning {
            bump(&mut streaks, LEARNING_STREAK);
        }
        self.root
            .insert("streaks".to_string(), Value::Object(streaks));
        self.root
            .insert("lastUpdated".to_string(), Value::from(generated_at));
    }
}

fn bump(streaks: &mut Map<String, Value>, name: &str) {
    let next = streaks.get(name).map(counter_value).unwrap_or(0) + 1;
    streaks.insert(name.to_string(), Value::from(next));
}

/// Missing, unreadable, or malformed state reads as empty.
pub fn load(path: &Path) -> JournalState {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) => {
            if path.exists() {
                tracing::warn!(file = %path.display(), error = %err, "state unreadable; starting empty");
            }
            return JournalState::default();
        }
    };
    match serde_json::from_str::<Value>(&raw) {
        Ok(value) => JournalState::from_value(value),
        Err(err) => {
            tracing::warn!(file = %path.display(), error = %err, "state malformed; starting empty");
            JournalState::default()
        }
    }
}

pub fn save(path: &Path, state: &JournalState) -> Result<PathBuf> {
    write_json_atomic(path, &state.as_value())
}

#[cfg(test)]
mod tests {
    use super::{ACTIVITY_STREAK, JournalState, LEARNING_STREAK, StreakSignals, load, save};
    use serde_json::json;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn missing_and_malformed_state_read_as_empty() {
        let tmp = tempdir().expect("tempdir");
        assert_eq!(load(&tmp.path().join("absent.json")), JournalState::default());

        let bad = tmp.path().join("bad.json");
        fs::write(&bad, "{ not json").expect("write");
        assert_eq!(load(&bad), JournalState::default());

        let array = tmp.path().join("array.json");
        fs::write(&array, "[1, 2]").expect("write");
        assert_eq!(load(&array), JournalState::default());
    }

    #[test]
    fn merge_increments_only_qualifying_streaks_and_keeps_foreign_keys() {
        let mut state = JournalState::from_value(json!({
            "streaks": {"activityStreak": 4, "custom": 9},
            "goals": [{"title": "ship"}],
            "lastUpdated": "old"
        }));
        state.merge(
            StreakSignals {
                activity: true,
                learning: false,
            },
            "2024-01-01T22:00:00+08:00",
        );
        assert_eq!(state.streak(ACTIVITY_STREAK), 5);
        assert_eq!(state.streak(LEARNING_STREAK), 0);
        assert_eq!(state.last_updated(), Some("2024-01-01T22:00:00+08:00"));
        let value = state.as_value();
        assert_eq!(value["goals"], json!([{"title": "ship"}]));
        assert_eq!(value["streaks"]["custom"], json!(9));
        assert!(value["streaks"].get(LEARNING_STREAK).is_none());
    }

    #[test]
    fn odd_counter_shapes_are_coerced() {
        let mut state = JournalState::from_value(json!({
            "streaks": {"activityStreak": "3", "learningStreak": 2.7}
        }));
        state.merge(
            StreakSignals {
                activity: true,
                learning: true,
            },
            "now",
        );
        assert_eq!(state.streak(ACTIVITY_STREAK), 4);
        assert_eq!(state.streak(LEARNING_STREAK), 3);

        let mut broken = JournalState::from_value(json!({"streaks": "nope"}));
        broken.merge(StreakSignals::default(), "now");
        assert_eq!(broken.as_value()["streaks"], json!({}));
    }

    #[test]
    fn save_round_trips_through_disk() {
        let tmp = tempdir().expect("tempdir");
        let path = tmp.path().join("nested/state.json");
        let mut state = JournalState::default();
        state.merge(
            StreakSignals {
                activity: true,
                learning: false,
            },
            "now",
        );
        save(&path, &state).expect("save");
        let raw = fs::read_to_string(&path).expect("read");
        assert!(raw.ends_with('\n'));
        assert_eq!(load(&path).streak(ACTIVITY_STREAK), 1);
    }
}
