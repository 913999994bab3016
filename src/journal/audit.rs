use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::Path;

pub const AUDIT_LOG_FILE: &str = "audit.log";

#[derive(Debug, Clone, Serialize)]
pub struct AuditEvent {
    pub at: String,
    pub phase: String,
    pub status: String,
    pub message: String,
}

pub fn append_event(
    logs_dir: &Path,
    at: &str,
    phase: &str,
    status: &str,
    message: &str,
) -> Result<()> {
    fs::create_dir_all(logs_dir)
        .with_context(|| format!("failed to create {}", logs_dir.display()))?;
    let event = AuditEvent {
        at: at.to_string(),
        phase: phase.to_string(),
        status: status.to_string(),
        message: message.to_string(),
    };

    let line = format!("{}\n", serde_json::to_string(&event)?);
    let path = logs_dir.join(AUDIT_LOG_FILE);
    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    file.write_all(line.as_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{AUDIT_LOG_FILE, append_event};
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn events_append_one_json_line_each() {
        let tmp = tempdir().expect("tempdir");
        let logs = tmp.path().join("logs");
        append_event(&logs, "t1", "ingest", "ok", "first").expect("append");
        append_event(&logs, "t2", "ingest", "ok", "second").expect("append");
        let raw = fs::read_to_string(logs.join(AUDIT_LOG_FILE)).expect("read");
        let lines: Vec<&str> = raw.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].contains("\"message\":\"second\""));
    }
}
