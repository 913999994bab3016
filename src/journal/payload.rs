use crate::journal::activity::{Activity, LearningNote, TimelineEvent};
use crate::journal::aggregate::{Goal, TrackProgress, WeeklySummary};
use crate::journal::util::serialize_local;
use chrono::DateTime;
use chrono_tz::Tz;
use serde::Serialize;

pub const PAYLOAD_VERSION: &str = "v3";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PayloadSummary {
    pub activity_count: usize,
    pub top_focus: String,
    pub learning_count: usize,
    pub timeline_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PayloadMeta {
    pub local_only: bool,
    pub version: &'static str,
    pub source: String,
    pub timezone: String,
}

/// The journal document consumed by the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalPayload {
    #[serde(serialize_with = "serialize_local")]
    pub generated_at: DateTime<Tz>,
    pub date: String,
    pub summary: PayloadSummary,
    pub activities: Vec<Activity>,
    pub learning: Vec<LearningNote>,
    pub timeline: Vec<TimelineEvent>,
    pub goals: Vec<Goal>,
    pub weekly_summary: WeeklySummary,
    pub weekly_tracks: Vec<TrackProgress>,
    pub meta: PayloadMeta,
}

/// Last `n` items, preserving order.
pub fn tail<T: Clone>(items: &[T], n: usize) -> Vec<T> {
    items[items.len().saturating_sub(n)..].to_vec()
}
