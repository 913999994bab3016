use anyhow::Result;
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct JournalPaths {
    pub selfos_home: PathBuf,
    pub data_dir: PathBuf,
    pub journal_file: PathBuf,
    pub state_file: PathBuf,
    pub logs_dir: PathBuf,
    pub config_file: PathBuf,
    pub openclaw_sessions_dir: PathBuf,
}

fn required_home_dir() -> Result<PathBuf> {
    if let Some(home) = dirs::home_dir() {
        return Ok(home);
    }
    Err(anyhow::anyhow!("HOME directory could not be resolved"))
}

fn env_or_default_path(var: &str, fallback: PathBuf) -> PathBuf {
    match env::var(var) {
        Ok(v) if !v.trim().is_empty() => PathBuf::from(v.trim()),
        _ => fallback,
    }
}

pub fn resolve_paths() -> Result<JournalPaths> {
    let home = required_home_dir()?;
    let selfos_home = env_or_default_path("SELFOS_HOME", home.join("SelfOS"));

    let data_dir = env_or_default_path("SELFOS_DATA_DIR", selfos_home.join("data"));
    let journal_file = env_or_default_path("SELFOS_JOURNAL_FILE", data_dir.join("journal.json"));
    let state_file = env_or_default_path("SELFOS_STATE_FILE", data_dir.join("state.json"));
    let logs_dir = env_or_default_path("SELFOS_LOGS_DIR", selfos_home.join("logs"));
    let config_file = env_or_default_path("SELFOS_CONFIG_PATH", selfos_home.join("selfos.toml"));
    let openclaw_sessions_dir = env_or_default_path(
        "OPENCLAW_SESSIONS_DIR",
        home.join(".openclaw/agents/main/sessions"),
    );

    Ok(JournalPaths {
        selfos_home,
        data_dir,
        journal_file,
        state_file,
        logs_dir,
        config_file,
        openclaw_sessions_dir,
    })
}
