use anyhow::Result;
use std::env;
use std::path::Path;

use crate::commands::CommandReport;
use crate::journal::config;
use crate::journal::paths::resolve_paths;

include!(concat!(env!("OUT_DIR"), "/selfos_env_allowlist.rs"));

fn active_overrides() -> Vec<(&'static str, String)> {
    GENERATED_SELFOS_ENV_ALLOWLIST
        .iter()
        .filter_map(|key| match env::var(key) {
            Ok(v) if !v.trim().is_empty() => Some((*key, v.trim().to_string())),
            _ => None,
        })
        .collect()
}

fn check_exists(report: &mut CommandReport, name: &str, path: &Path, required: bool) {
    if path.exists() {
        report.detail(format!("path.{name}=ok ({})", path.display()));
    } else if required {
        report.issue(format!("path.{name}=missing ({})", path.display()));
    } else {
        report.detail(format!("path.{name}=absent ({})", path.display()));
    }
}

pub fn run() -> Result<CommandReport> {
    let paths = resolve_paths()?;
    let mut report = CommandReport::new("status");

    report.detail(format!("build_uuid={}", env!("BUILD_UUID")));
    report.detail(format!("selfos_home={}", paths.selfos_home.display()));
    report.detail(format!("data_dir={}", paths.data_dir.display()));
    check_exists(&mut report, "sessions_dir", &paths.openclaw_sessions_dir, true);
    check_exists(&mut report, "journal_file", &paths.journal_file, false);
    check_exists(&mut report, "state_file", &paths.state_file, false);
    check_exists(&mut report, "logs_dir", &paths.logs_dir, false);
    check_exists(&mut report, "config_file", &paths.config_file, false);

    match config::load_config_from(&paths.config_file).and_then(|cfg| {
        config::validate(&cfg)?;
        Ok(cfg)
    }) {
        Ok(cfg) => {
            report.detail(format!("config.timezone={}", cfg.ingest.timezone));
            report.detail(format!("config.window_days={}", cfg.ingest.window_days));
            report.detail(format!("config.activity_tail={}", cfg.output.activity_tail));
            report.detail(format!("config.categories={}", cfg.rules.categories.len()));
            report.detail(format!("config.tracks={}", cfg.rules.tracks().count()));
        }
        Err(err) => report.issue(format!("config invalid: {err:#}")),
    }

    for (key, value) in active_overrides() {
        report.detail(format!("env.{key}={value}"));
    }

    Ok(report)
}
