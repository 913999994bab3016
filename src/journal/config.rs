use crate::error::JournalError;
use crate::journal::aggregate::{Goal, default_goals};
use crate::journal::clean::{ACTIVITY_TEXT_CHARS, LEARNING_TEXT_CHARS};
use crate::journal::rules::RuleTable;
use anyhow::{Result, anyhow};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;

pub const ACTIVITY_TAIL_CHOICES: [usize; 4] = [80, 100, 120, 140];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    pub timezone: String,
    pub sessions_glob: Option<String>,
    pub window_days: u32,
    pub min_text_chars: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            timezone: "Asia/Shanghai".to_string(),
            sessions_glob: None,
            window_days: 7,
            min_text_chars: 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub activity_tail: usize,
    pub learning_cap: usize,
    pub timeline_cap: usize,
    pub activity_text_chars: usize,
    pub learning_text_chars: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            activity_tail: 120,
            learning_cap: 12,
            timeline_cap: 200,
            activity_text_chars: ACTIVITY_TEXT_CHARS,
            learning_text_chars: LEARNING_TEXT_CHARS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalConfig {
    pub ingest: IngestConfig,
    pub output: OutputConfig,
    pub rules: RuleTable,
    pub goals: Vec<Goal>,
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            ingest: IngestConfig::default(),
            output: OutputConfig::default(),
            rules: RuleTable::default(),
            goals: default_goals(),
        }
    }
}

impl JournalConfig {
    pub fn timezone(&self) -> Result<Tz> {
        parse_timezone(&self.ingest.timezone)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PartialJournalConfig {
    ingest: Option<IngestConfig>,
    output: Option<OutputConfig>,
    rules: Option<RuleTable>,
    goals: Option<Vec<Goal>>,
}

pub fn parse_timezone(name: &str) -> Result<Tz> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| JournalError::InvalidTimezone(name.trim().to_string()).into())
}

fn env_or_u32(var: &str, fallback: u32) -> u32 {
    match env::var(var) {
        Ok(v) => v.trim().parse::<u32>().ok().unwrap_or(fallback),
        Err(_) => fallback,
    }
}

fn env_or_usize(var: &str, fallback: usize) -> usize {
    match env::var(var) {
        Ok(v) => v.trim().parse::<usize>().ok().unwrap_or(fallback),
        Err(_) => fallback,
    }
}

fn env_or_string(var: &str, fallback: &str) -> String {
    match env::var(var) {
        Ok(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => fallback.to_string(),
    }
}

fn env_or_optional_string(var: &str, fallback: Option<String>) -> Option<String> {
    match env::var(var) {
        Ok(v) if !v.trim().is_empty() => Some(v.trim().to_string()),
        _ => fallback,
    }
}

pub fn validate(cfg: &JournalConfig) -> Result<()> {
    cfg.timezone()?;
    if cfg.ingest.window_days == 0 {
        return Err(anyhow!("invalid window days: must be >= 1"));
    }
    if cfg.ingest.min_text_chars == 0 {
        return Err(anyhow!("invalid min text chars: must be >= 1"));
    }
    if !ACTIVITY_TAIL_CHOICES.contains(&cfg.output.activity_tail) {
        return Err(anyhow!(
            "invalid activity tail {}: use one of 80, 100, 120, 140",
            cfg.output.activity_tail
        ));
    }
    if cfg.output.activity_text_chars == 0 || cfg.output.learning_text_chars == 0 {
        return Err(anyhow!("invalid text budget: must be >= 1 character"));
    }
    cfg.rules.validate()?;
    Ok(())
}

fn merge_file_config(base: &mut JournalConfig, path: &Path) -> Result<()> {
    if !path.exists() {
        return Ok(());
    }

    let raw = fs::read_to_string(path).map_err(|err| {
        JournalError::InvalidConfig(format!("failed to read {}: {err}", path.display()))
    })?;
    let parsed: PartialJournalConfig = toml::from_str(&raw).map_err(|err| {
        JournalError::InvalidConfig(format!("failed to parse {}: {err}", path.display()))
    })?;
    if let Some(ingest) = parsed.ingest {
        base.ingest = ingest;
    }
    if let Some(output) = parsed.output {
        base.output = output;
    }
    if let Some(rules) = parsed.rules {
        base.rules = rules;
    }
    if let Some(goals) = parsed.goals {
        base.goals = goals;
    }
    Ok(())
}

fn apply_env_overrides(cfg: &mut JournalConfig) {
    cfg.ingest.timezone = env_or_string("SELFOS_TZ", &cfg.ingest.timezone);
    cfg.ingest.sessions_glob =
        env_or_optional_string("SELFOS_SESSIONS_GLOB", cfg.ingest.sessions_glob.take());
    cfg.ingest.window_days = env_or_u32("SELFOS_WINDOW_DAYS", cfg.ingest.window_days);
    cfg.output.activity_tail = env_or_usize("SELFOS_ACTIVITY_TAIL", cfg.output.activity_tail);
    cfg.output.learning_cap = env_or_usize("SELFOS_LEARNING_CAP", cfg.output.learning_cap);
    cfg.output.timeline_cap = env_or_usize("SELFOS_TIMELINE_CAP", cfg.output.timeline_cap);
}

/// Defaults, then the TOML file at `path` (if present), then `SELFOS_*`
/// environment overrides. Validation is left to the caller so CLI flags can
/// still be layered on top.
pub fn load_config_from(path: &Path) -> Result<JournalConfig> {
    let mut cfg = JournalConfig::default();
    merge_file_config(&mut cfg, path)?;
    apply_env_overrides(&mut cfg);
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::{JournalConfig, load_config_from, validate};
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn defaults_validate() {
        validate(&JournalConfig::default()).expect("defaults are valid");
    }

    #[test]
    fn file_sections_replace_defaults_independently() {
        let tmp = tempdir().expect("tempdir");
        let path = tmp.path().join("selfos.toml");
        fs::write(
            &path,
            r#"
[output]
activity_tail = 80

[rules]
default_focus = "休整"

[[rules.categories]]
label = "阅读"
keywords = ["book", "读书"]

[rules.categories.track]
id = "reading"
weekly_target = 3

[[rules.categories.track.facets]]
label = "小说"
keywords = ["novel"]

[[goals]]
text = "读 30 页"
done = true
priority = "high"
"#,
        )
        .expect("write config");

        let cfg = load_config_from(&path).expect("load config");
        assert_eq!(cfg.output.activity_tail, 80);
        assert_eq!(cfg.output.learning_cap, 12);
        assert_eq!(cfg.ingest.window_days, 7);
        assert_eq!(cfg.rules.default_focus, "休整");
        assert_eq!(cfg.rules.categories.len(), 1);
        let track = cfg.rules.categories[0].track.as_ref().expect("track");
        assert_eq!(track.id, "reading");
        assert_eq!(track.facets[0].label, "小说");
        assert_eq!(cfg.goals.len(), 1);
        assert!(cfg.goals[0].done);
        validate(&cfg).expect("file config validates");
    }

    #[test]
    fn missing_file_yields_defaults() {
        let tmp = tempdir().expect("tempdir");
        let cfg = load_config_from(&tmp.path().join("absent.toml")).expect("load");
        assert_eq!(cfg.output.activity_tail, 120);
    }

    #[test]
    fn malformed_file_is_reported() {
        let tmp = tempdir().expect("tempdir");
        let path = tmp.path().join("selfos.toml");
        fs::write(&path, "[output\nactivity_tail = ").expect("write");
        assert!(load_config_from(&path).is_err());
    }

    #[test]
    fn validation_rejects_bad_values() {
        let mut cfg = JournalConfig::default();
        cfg.output.activity_tail = 90;
        assert!(validate(&cfg).is_err());

        let mut cfg = JournalConfig::default();
        cfg.ingest.timezone = "Mars/Olympus".to_string();
        assert!(validate(&cfg).is_err());

        let mut cfg = JournalConfig::default();
        cfg.ingest.window_days = 0;
        assert!(validate(&cfg).is_err());
    }
}
