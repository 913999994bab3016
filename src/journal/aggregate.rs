use crate::journal::activity::Activity;
use crate::journal::classify::{Classifier, Priority};
use crate::journal::rules::RuleTable;
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Inclusive range of local calendar dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn day(date: NaiveDate) -> Self {
        Self {
            start: date,
            end: date,
        }
    }

    /// `days` dates ending at `end`; a zero length is treated as one day.
    pub fn trailing(end: NaiveDate, days: u32) -> Self {
        let back = u64::from(days.max(1) - 1);
        let start = end.checked_sub_days(Days::new(back)).unwrap_or(NaiveDate::MIN);
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn len_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    pub text: String,
    #[serde(default)]
    pub done: bool,
    #[serde(default = "default_goal_priority")]
    pub priority: Priority,
}

fn default_goal_priority() -> Priority {
    Priority::Medium
}

pub fn default_goals() -> Vec<Goal> {
    let goal = |text: &str, priority| Goal {
        text: text.to_string(),
        done: false,
        priority,
    };
    vec![
        goal("完成 1 次深度学习（>=45 分钟）", Priority::High),
        goal("沉淀 3 条可复用知识点", Priority::Medium),
        goal("推进 1 个长期项目的关键一步", Priority::High),
        goal("睡前 5 分钟复盘", Priority::Low),
    ]
}

/// `round(min(100, 100 * count / target))`; non-positive targets give 0.
pub fn progress_pct(count: usize, target: i64) -> u32 {
    if target <= 0 {
        return 0;
    }
    let pct = (count as f64) * 100.0 / (target as f64);
    pct.min(100.0).round() as u32
}

pub fn completion_rate(goals: &[Goal]) -> u32 {
    if goals.is_empty() {
        return 0;
    }
    let done = goals.iter().filter(|g| g.done).count();
    ((done as f64) * 100.0 / (goals.len() as f64)).round() as u32
}

/// Most frequent category label. Ties resolve to rule-table declaration
/// order, with the unclassified label ranked after every declared rule.
pub fn top_category(activities: &[Activity], rules: &RuleTable) -> Option<String> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for activity in activities {
        *counts.entry(activity.category.as_str()).or_insert(0) += 1;
    }
    if counts.is_empty() {
        return None;
    }

    let rank = |label: &str| {
        rules
            .categories
            .iter()
            .position(|rule| rule.label == label)
            .unwrap_or(rules.categories.len())
    };

    counts
        .into_iter()
        .max_by(|(a_label, a_count), (b_label, b_count)| {
            a_count
                .cmp(b_count)
                .then_with(|| rank(b_label).cmp(&rank(a_label)))
        })
        .map(|(label, _)| label.to_string())
}

pub fn top_focus(today: &[Activity], rules: &RuleTable) -> String {
    top_category(today, rules).unwrap_or_else(|| rules.default_focus.clone())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklySummary {
    pub active_days: usize,
    pub total_activities: usize,
    pub top_category: String,
    pub deep_work_sessions: usize,
    pub completion_rate: u32,
    pub today_count: usize,
    pub window_days: i64,
}

pub fn weekly_summary(
    weekly: &[Activity],
    today: &[Activity],
    goals: &[Goal],
    classifier: &Classifier,
    window: &DateWindow,
) -> WeeklySummary {
    let active_days = weekly
        .iter()
        .map(|a| a.timestamp.date_naive())
        .collect::<BTreeSet<_>>()
        .len();
    let deep_work_sessions = weekly
        .iter()
        .filter(|a| classifier.is_deep_work(&a.text))
        .count();

    WeeklySummary {
        active_days,
        total_activities: weekly.len(),
        top_category: top_focus(weekly, classifier.rules()),
        deep_work_sessions,
        completion_rate: completion_rate(goals),
        today_count: today.len(),
        window_days: window.len_days(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackProgress {
    pub track: String,
    pub label: String,
    pub count: usize,
    pub target: i64,
    pub progress_pct: u32,
    pub facets: BTreeMap<String, usize>,
}

/// One entry per declared track, in declaration order, including tracks
/// with no activity this window.
pub fn track_progress(weekly: &[Activity], rules: &RuleTable) -> Vec<TrackProgress> {
    rules
        .tracks()
        .map(|(rule, track)| {
            let tagged = weekly
                .iter()
                .filter(|a| a.track.as_deref() == Some(track.id.as_str()));
            let mut count = 0usize;
            let mut facets = BTreeMap::new();
            for activity in tagged {
                count += 1;
                if let Some(facet) = &activity.facet {
                    *facets.entry(facet.clone()).or_insert(0) += 1;
                }
            }
            TrackProgress {
                track: track.id.clone(),
                label: rule.label.clone(),
                count,
                target: track.weekly_target,
                progress_pct: progress_pct(count, track.weekly_target),
                facets,
            }
        })
        .collect()
}
