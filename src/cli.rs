use anyhow::{Result, bail};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::commands::{self, CommandReport};

#[derive(Parser, Debug)]
#[command(name = "selfos", version, about = "Daily journal aggregation over OpenClaw session logs")]
pub struct Cli {
    /// Print the command report as JSON on stdout.
    #[arg(long, global = true, default_value_t = false)]
    pub json: bool,

    /// Lower the default log filter to debug.
    #[arg(long, short = 'v', global = true, default_value_t = false)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Read session logs and write the journal payload and streak state.
    Ingest(IngestArgs),
    /// Show resolved paths, active overrides and what is missing.
    Status,
    /// Classify free text with the configured rule table.
    Classify(ClassifyArgs),
}

#[derive(Args, Debug, Clone, Default)]
pub struct IngestArgs {
    /// Session log location: a directory, or a directory plus file glob.
    #[arg(long = "sessions-glob", value_name = "GLOB")]
    pub sessions_glob: Option<String>,

    /// Journal payload destination.
    #[arg(long = "out", value_name = "FILE")]
    pub out: Option<PathBuf>,

    /// Streak state file.
    #[arg(long = "state", value_name = "FILE")]
    pub state: Option<PathBuf>,

    /// IANA timezone that defines calendar days.
    #[arg(long = "tz", value_name = "ZONE")]
    pub tz: Option<String>,

    /// Target day (YYYY-MM-DD); defaults to today in the configured timezone.
    #[arg(long = "date", value_name = "DATE")]
    pub date: Option<String>,

    #[arg(long = "window-days", value_name = "DAYS")]
    pub window_days: Option<u32>,

    /// How many of today's activities the payload keeps (80, 100, 120 or 140).
    #[arg(long = "activity-tail", value_name = "N")]
    pub activity_tail: Option<usize>,

    /// Aggregate and report without writing any file.
    #[arg(long = "dry-run", default_value_t = false)]
    pub dry_run: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ClassifyArgs {
    /// Text to classify; multiple words are joined with spaces.
    #[arg(required = true, num_args = 1..)]
    pub text: Vec<String>,
}

fn print_report(report: &CommandReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    let status = if report.ok { "ok" } else { "failed" };
    println!("{} [{status}]", report.command);
    for line in &report.details {
        println!("  {line}");
    }
    for issue in &report.issues {
        println!("  issue: {issue}");
    }
    Ok(())
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    crate::logging::init(cli.verbose);

    let report = match &cli.command {
        Command::Ingest(args) => commands::ingest::run(args)?,
        Command::Status => commands::status::run()?,
        Command::Classify(args) => commands::classify::run(args)?,
    };

    print_report(&report, cli.json)?;
    if !report.ok {
        bail!("{} reported {} issue(s)", report.command, report.issues.len());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{Cli, Command};
    use clap::{CommandFactory, Parser};

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn ingest_flags_parse() {
        let cli = Cli::try_parse_from([
            "selfos",
            "--json",
            "ingest",
            "--date",
            "2024-01-07",
            "--activity-tail",
            "80",
            "--dry-run",
        ])
        .expect("parse");
        assert!(cli.json);
        let Command::Ingest(args) = cli.command else {
            panic!("expected ingest");
        };
        assert_eq!(args.date.as_deref(), Some("2024-01-07"));
        assert_eq!(args.activity_tail, Some(80));
        assert!(args.dry_run);
    }

    #[test]
    fn classify_requires_text() {
        assert!(Cli::try_parse_from(["selfos", "classify"]).is_err());
    }
}
