use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};

use crate::cli::IngestArgs;
use crate::commands::CommandReport;
use crate::error::JournalError;
use crate::journal::audit;
use crate::journal::config::{self, JournalConfig};
use crate::journal::paths::{JournalPaths, resolve_paths};
use crate::journal::pipeline::{self, Exclusion, IngestRequest};
use crate::journal::reader::{DEFAULT_FILE_PATTERN, LogSource};
use crate::journal::util::iso_local;

fn apply_flag_overrides(cfg: &mut JournalConfig, args: &IngestArgs) {
    if let Some(tz) = &args.tz {
        cfg.ingest.timezone = tz.trim().to_string();
    }
    if let Some(glob) = &args.sessions_glob {
        cfg.ingest.sessions_glob = Some(glob.clone());
    }
    if let Some(days) = args.window_days {
        cfg.ingest.window_days = days;
    }
    if let Some(tail) = args.activity_tail {
        cfg.output.activity_tail = tail;
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| JournalError::InvalidDate(raw.trim().to_string()).into())
}

fn log_source(cfg: &JournalConfig, paths: &JournalPaths) -> Result<LogSource> {
    match cfg.ingest.sessions_glob.as_deref() {
        Some(glob) => LogSource::from_glob(glob),
        None => LogSource::new(&paths.openclaw_sessions_dir, DEFAULT_FILE_PATTERN),
    }
}

pub fn run(args: &IngestArgs) -> Result<CommandReport> {
    let paths = resolve_paths()?;
    let mut cfg = config::load_config_from(&paths.config_file)?;
    apply_flag_overrides(&mut cfg, args);
    config::validate(&cfg)?;

    let tz = cfg.timezone()?;
    let now = Utc::now().with_timezone(&tz);
    let target_date = match args.date.as_deref() {
        Some(raw) => parse_date(raw)?,
        None => now.date_naive(),
    };

    let request = IngestRequest {
        source: log_source(&cfg, &paths)?,
        target_date,
        now,
        out_path: args.out.clone().unwrap_or_else(|| paths.journal_file.clone()),
        state_path: args.state.clone().unwrap_or_else(|| paths.state_file.clone()),
        dry_run: args.dry_run,
    };

    let outcome = match pipeline::run(&cfg, &request) {
        Ok(outcome) => outcome,
        Err(err) => {
            if !args.dry_run {
                let _ = audit::append_event(
                    &paths.logs_dir,
                    &iso_local(&now),
                    "ingest",
                    "failed",
                    &format!("{err:#}"),
                );
            }
            return Err(err).with_context(|| format!("ingest for {target_date} failed"));
        }
    };

    let mut report = CommandReport::new("ingest");
    let summary = &outcome.payload.summary;
    report.detail(format!("date={target_date}"));
    report.detail(format!("timezone={}", tz.name()));
    report.detail(format!("source={}", request.source.display()));
    report.detail(format!("activity_count={}", summary.activity_count));
    report.detail(format!("top_focus={}", summary.top_focus));
    report.detail(format!("learning_count={}", summary.learning_count));
    report.detail(format!("timeline_count={}", summary.timeline_count));
    report.detail(format!(
        "weekly_total={}",
        outcome.payload.weekly_summary.total_activities
    ));
    report.detail(format!(
        "files_read={} files_skipped={} files_truncated={} lines={}",
        outcome.stats.files_read,
        outcome.stats.files_skipped,
        outcome.stats.files_truncated,
        outcome.stats.lines
    ));
    report.detail(format!("duplicates_removed={}", outcome.stats.duplicates_removed));
    for reason in Exclusion::ALL {
        report.detail(format!(
            "excluded.{}={}",
            reason.as_str(),
            outcome.stats.excluded(reason)
        ));
    }
    for (name, value) in outcome.state.streaks() {
        report.detail(format!("streak.{name}={value}"));
    }
    if let Some(at) = outcome.state.last_updated() {
        report.detail(format!("state.last_updated={at}"));
    }

    match (&outcome.written_payload, &outcome.written_state) {
        (Some(journal), Some(state)) => {
            report.detail(format!("journal_file={}", journal.display()));
            report.detail(format!("state_file={}", state.display()));
            let message = format!(
                "date={target_date} activities={} learning={}",
                summary.activity_count, summary.learning_count
            );
            if let Err(err) =
                audit::append_event(&paths.logs_dir, &iso_local(&now), "ingest", "ok", &message)
            {
                report.issue(format!("audit log append failed: {err:#}"));
            }
        }
        _ => report.detail("dry_run=true (nothing written)"),
    }

    Ok(report)
}
