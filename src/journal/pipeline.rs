use crate::journal::activity::{Activity, LearningNote, TimelineEvent};
use crate::journal::aggregate::{DateWindow, Goal, top_focus, track_progress, weekly_summary};
use crate::journal::classify::Classifier;
use crate::journal::clean::clean_text;
use crate::journal::config::{JournalConfig, OutputConfig};
use crate::journal::content::extract_text;
use crate::journal::dedupe::dedupe;
use crate::journal::payload::{
    JournalPayload, PAYLOAD_VERSION, PayloadMeta, PayloadSummary, tail,
};
use crate::journal::reader::{LineRecord, LogSource, RawMessage, SourcedRecord};
use crate::journal::state::{self, JournalState, StreakSignals};
use crate::journal::timestamp;
use crate::journal::util::{char_len, iso_local, truncate_chars, write_json_atomic};
use anyhow::Result;
use chrono::{DateTime, NaiveDate};
use chrono_tz::Tz;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;

/// Why a log record did not become journal data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Exclusion {
    Undecodable,
    NotMessage,
    MissingTimestamp,
    OutsideWindow,
    TooShort,
    NotUser,
}

impl Exclusion {
    pub const ALL: [Exclusion; 6] = [
        Self::Undecodable,
        Self::NotMessage,
        Self::MissingTimestamp,
        Self::OutsideWindow,
        Self::TooShort,
        Self::NotUser,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Undecodable => "undecodable",
            Self::NotMessage => "not_message",
            Self::MissingTimestamp => "missing_timestamp",
            Self::OutsideWindow => "outside_window",
            Self::TooShort => "too_short",
            Self::NotUser => "not_user",
        }
    }
}

/// A message record that survived extraction, resolution and cleaning.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub timestamp: DateTime<Tz>,
    pub role: String,
    pub text: String,
    pub source: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestStats {
    pub files_read: usize,
    pub files_skipped: usize,
    pub files_truncated: usize,
    pub lines: usize,
    pub duplicates_removed: usize,
    pub excluded: BTreeMap<&'static str, usize>,
}

impl IngestStats {
    fn exclude(&mut self, reason: Exclusion) {
        *self.excluded.entry(reason.as_str()).or_insert(0) += 1;
    }

    pub fn excluded(&self, reason: Exclusion) -> usize {
        self.excluded.get(reason.as_str()).copied().unwrap_or(0)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Collected {
    pub weekly: Vec<Activity>,
    pub today: Vec<Activity>,
    pub learning: Vec<LearningNote>,
    pub timeline: Vec<TimelineEvent>,
    pub stats: IngestStats,
}

pub struct Ingestor {
    classifier: Classifier,
    tz: Tz,
    output: OutputConfig,
    min_text_chars: usize,
    window_days: u32,
    goals: Vec<Goal>,
}

impl Ingestor {
    pub fn new(cfg: &JournalConfig) -> Result<Self> {
        Ok(Self {
            classifier: Classifier::new(&cfg.rules),
            tz: cfg.timezone()?,
            output: cfg.output.clone(),
            min_text_chars: cfg.ingest.min_text_chars,
            window_days: cfg.ingest.window_days,
            goals: cfg.goals.clone(),
        })
    }

    pub fn windows(&self, target: NaiveDate) -> (DateWindow, DateWindow) {
        (
            DateWindow::day(target),
            DateWindow::trailing(target, self.window_days),
        )
    }

    /// Resolve one line into a [`Candidate`] or the stage that dropped it.
    pub fn evaluate(
        &self,
        record: &SourcedRecord,
        window: &DateWindow,
    ) -> Result<Candidate, Exclusion> {
        let LineRecord::Decoded(raw) = &record.record else {
            return Err(Exclusion::Undecodable);
        };
        if !raw.is_message() {
            return Err(Exclusion::NotMessage);
        }
        let fallback = RawMessage::default();
        let message = raw.message.as_ref().unwrap_or(&fallback);

        let ts = timestamp::resolve(raw.timestamp.as_ref(), message.timestamp.as_ref(), self.tz)
            .ok_or(Exclusion::MissingTimestamp)?;
        if !window.contains(ts.date_naive()) {
            return Err(Exclusion::OutsideWindow);
        }

        let text = clean_text(&extract_text(&message.content));
        if char_len(&text) < self.min_text_chars {
            return Err(Exclusion::TooShort);
        }

        Ok(Candidate {
            timestamp: ts,
            role: message.role().unwrap_or("unknown").to_string(),
            text,
            source: record.source.clone(),
        })
    }

    fn to_activity(&self, candidate: &Candidate) -> Activity {
        let c = self.classifier.classify(&candidate.text);
        Activity {
            timestamp: candidate.timestamp,
            text: truncate_chars(&candidate.text, self.output.activity_text_chars),
            category: c.category,
            track: c.track,
            facet: c.facet,
            priority: c.priority,
            source: candidate.source.clone(),
        }
    }

    pub fn collect_records<I>(&self, records: I, target: NaiveDate) -> Collected
    where
        I: IntoIterator<Item = SourcedRecord>,
    {
        let (day, week) = self.windows(target);
        let mut stats = IngestStats::default();
        let mut weekly = Vec::new();
        let mut today = Vec::new();
        let mut learning = Vec::new();
        let mut timeline = Vec::new();

        for record in records {
            let candidate = match self.evaluate(&record, &week) {
                Ok(candidate) => candidate,
                Err(reason) => {
                    tracing::trace!(source = %record.source, reason = reason.as_str(), "record excluded");
                    stats.exclude(reason);
                    continue;
                }
            };
            let in_day = day.contains(candidate.timestamp.date_naive());
            let is_user = candidate.role == "user";

            if in_day {
                timeline.push(TimelineEvent {
                    timestamp: candidate.timestamp,
                    role: candidate.role.clone(),
                    text: truncate_chars(&candidate.text, self.output.activity_text_chars),
                    source: candidate.source.clone(),
                });
            }
            if !is_user {
                if !in_day {
                    stats.exclude(Exclusion::NotUser);
                }
                continue;
            }

            let activity = self.to_activity(&candidate);
            if in_day {
                if self.classifier.is_learning(&candidate.text) {
                    learning.push(LearningNote {
                        timestamp: candidate.timestamp,
                        text: truncate_chars(&candidate.text, self.output.learning_text_chars),
                        source: candidate.source.clone(),
                    });
                }
                today.push(activity.clone());
            }
            weekly.push(activity);
        }

        let raw_weekly = weekly.len();
        let weekly = dedupe(weekly);
        stats.duplicates_removed = raw_weekly - weekly.len();
        let today = dedupe(today);
        let mut timeline = dedupe(timeline);

        timeline.reverse();
        timeline.truncate(self.output.timeline_cap);

        let mut seen = HashSet::new();
        let learning = dedupe(learning)
            .into_iter()
            .filter(|note| seen.insert(note.text.clone()))
            .take(self.output.learning_cap)
            .collect();

        Collected {
            weekly,
            today,
            learning,
            timeline,
            stats,
        }
    }

    pub fn collect(&self, source: &LogSource, target: NaiveDate) -> Result<Collected> {
        let mut records = source.records()?;
        let mut collected = self.collect_records(records.by_ref(), target);
        let counters = records.counters();
        collected.stats.files_read = counters.files_opened;
        collected.stats.files_skipped = counters.files_skipped;
        collected.stats.files_truncated = counters.files_truncated;
        collected.stats.lines = counters.lines;
        Ok(collected)
    }

    pub fn build_payload(
        &self,
        collected: &Collected,
        target: NaiveDate,
        now: DateTime<Tz>,
        source_label: &str,
    ) -> JournalPayload {
        let (_, week) = self.windows(target);
        let rules = self.classifier.rules();
        JournalPayload {
            generated_at: now,
            date: target.to_string(),
            summary: PayloadSummary {
                activity_count: collected.today.len(),
                top_focus: top_focus(&collected.today, rules),
                learning_count: collected.learning.len(),
                timeline_count: collected.timeline.len(),
            },
            activities: tail(&collected.today, self.output.activity_tail),
            learning: collected.learning.clone(),
            timeline: collected.timeline.clone(),
            goals: self.goals.clone(),
            weekly_summary: weekly_summary(
                &collected.weekly,
                &collected.today,
                &self.goals,
                &self.classifier,
                &week,
            ),
            weekly_tracks: track_progress(&collected.weekly, rules),
            meta: PayloadMeta {
                local_only: true,
                version: PAYLOAD_VERSION,
                source: source_label.to_string(),
                timezone: self.tz.name().to_string(),
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct IngestRequest {
    pub source: LogSource,
    pub target_date: NaiveDate,
    pub now: DateTime<Tz>,
    pub out_path: PathBuf,
    pub state_path: PathBuf,
    pub dry_run: bool,
}

#[derive(Debug, Clone)]
pub struct IngestOutcome {
    pub payload: JournalPayload,
    pub state: JournalState,
    pub stats: IngestStats,
    pub written_payload: Option<PathBuf>,
    pub written_state: Option<PathBuf>,
}

/// Full read → classify → aggregate → write pass. The only error a healthy
/// filesystem produces is a missing source root.
pub fn run(cfg: &JournalConfig, req: &IngestRequest) -> Result<IngestOutcome> {
    let ingestor = Ingestor::new(cfg)?;
    let collected = ingestor.collect(&req.source, req.target_date)?;
    let payload = ingestor.build_payload(
        &collected,
        req.target_date,
        req.now,
        &req.source.root.display().to_string(),
    );

    let mut merged = state::load(&req.state_path);
    merged.merge(
        StreakSignals {
            activity: !collected.today.is_empty(),
            learning: !collected.learning.is_empty(),
        },
        &iso_local(&payload.generated_at),
    );

    tracing::info!(
        date = %req.target_date,
        activities = payload.summary.activity_count,
        learning = payload.summary.learning_count,
        weekly = collected.weekly.len(),
        files = collected.stats.files_read,
        "journal aggregated"
    );

    let (written_payload, written_state) = if req.dry_run {
        (None, None)
    } else {
        let payload_value = serde_json::to_value(&payload)?;
        let out = write_json_atomic(&req.out_path, &payload_value)?;
        let st = state::save(&req.state_path, &merged)?;
        (Some(out), Some(st))
    };

    Ok(IngestOutcome {
        payload,
        state: merged,
        stats: collected.stats,
        written_payload,
        written_state,
    })
}
