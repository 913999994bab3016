use crate::error::JournalError;
use anyhow::{Context, Result};
use globset::{Glob, GlobMatcher};
use serde::Deserialize;
use serde_json::Value;
use std::fs;
use std::io::{BufRead, BufReader, Split};
use std::path::{Path, PathBuf};
use std::vec;

pub const DEFAULT_FILE_PATTERN: &str = "*.jsonl";

/// Directory of session logs plus a file-name pattern.
#[derive(Debug, Clone)]
pub struct LogSource {
    pub root: PathBuf,
    pattern: String,
    matcher: GlobMatcher,
}

fn expand_home(raw: &str) -> PathBuf {
    if raw == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    } else if let Some(rest) = raw.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    PathBuf::from(raw)
}

fn has_glob_meta(component: &str) -> bool {
    component.contains(['*', '?', '[', '{'])
}

impl LogSource {
    pub fn new(root: impl Into<PathBuf>, pattern: &str) -> Result<Self> {
        let matcher = Glob::new(pattern)
            .with_context(|| format!("invalid session file pattern: {pattern}"))?
            .compile_matcher();
        Ok(Self {
            root: root.into(),
            pattern: pattern.to_string(),
            matcher,
        })
    }

    /// `~/.openclaw/agents/main/sessions/*.jsonl` style glob, or a plain
    /// directory (which then matches [`DEFAULT_FILE_PATTERN`]).
    pub fn from_glob(raw: &str) -> Result<Self> {
        let path = expand_home(raw.trim());
        let file_component = path
            .file_name()
            .and_then(|s| s.to_str())
            .map(ToOwned::to_owned);
        match file_component {
            Some(name) if has_glob_meta(&name) => {
                let root = path
                    .parent()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| PathBuf::from("."));
                Self::new(root, &name)
            }
            _ => Self::new(path, DEFAULT_FILE_PATTERN),
        }
    }

    pub fn display(&self) -> String {
        self.root.join(&self.pattern).display().to_string()
    }

    /// Matching files directly under `root`, sorted by path. A missing root
    /// is the only hard failure.
    pub fn files(&self) -> Result<Vec<PathBuf>> {
        if !self.root.is_dir() {
            return Err(JournalError::MissingSourceRoot(self.root.clone()).into());
        }
        let read_dir = fs::read_dir(&self.root)
            .with_context(|| format!("failed to read {}", self.root.display()))?;

        let mut out = Vec::new();
        for entry in read_dir.flatten() {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let matched = path
                .file_name()
                .is_some_and(|name| self.matcher.is_match(Path::new(name)));
            if matched {
                out.push(path);
            }
        }
        out.sort();
        Ok(out)
    }

    pub fn records(&self) -> Result<LogRecords> {
        Ok(LogRecords::new(self.files()?))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawMessage {
    #[serde(default)]
    pub role: Option<Value>,
    #[serde(default)]
    pub content: Value,
    #[serde(default)]
    pub timestamp: Option<Value>,
}

/// One decoded log line.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawLogRecord {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub timestamp: Option<Value>,
    #[serde(default)]
    pub message: Option<RawMessage>,
}

impl RawMessage {
    /// String role, if the field is present and textual.
    pub fn role(&self) -> Option<&str> {
        self.role.as_ref().and_then(Value::as_str)
    }
}

impl RawLogRecord {
    pub fn is_message(&self) -> bool {
        self.kind.as_deref() == Some("message")
    }
}

#[derive(Debug, Clone)]
pub enum LineRecord {
    Decoded(RawLogRecord),
    Undecodable,
}

#[derive(Debug, Clone)]
pub struct SourcedRecord {
    pub source: String,
    pub record: LineRecord,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadCounters {
    pub files_opened: usize,
    pub files_skipped: usize,
    pub files_truncated: usize,
    pub lines: usize,
}

fn decode_line(trimmed: &str) -> LineRecord {
    let Ok(value) = serde_json::from_str::<Value>(trimmed) else {
        return LineRecord::Undecodable;
    };
    if !value.is_object() {
        return LineRecord::Undecodable;
    }
    match serde_json::from_value::<RawLogRecord>(value) {
        Ok(record) => LineRecord::Decoded(record),
        Err(_) => LineRecord::Undecodable,
    }
}

struct OpenFile {
    name: String,
    lines: Split<BufReader<fs::File>>,
}

/// Lazy record stream across every file of a [`LogSource`].
pub struct LogRecords {
    files: vec::IntoIter<PathBuf>,
    current: Option<OpenFile>,
    counters: ReadCounters,
}

impl LogRecords {
    pub fn new(files: Vec<PathBuf>) -> Self {
        Self {
            files: files.into_iter(),
            current: None,
            counters: ReadCounters::default(),
        }
    }

    pub fn counters(&self) -> ReadCounters {
        self.counters
    }

    fn open_next(&mut self) -> bool {
        for path in self.files.by_ref() {
            let name = path
                .file_name()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_else(|| path.display().to_string());
            match fs::File::open(&path) {
                Ok(file) => {
                    self.counters.files_opened += 1;
                    tracing::debug!(file = %path.display(), "reading session log");
                    self.current = Some(OpenFile {
                        name,
                        lines: BufReader::new(file).split(b'\n'),
                    });
                    return true;
                }
                Err(err) => {
                    self.counters.files_skipped += 1;
                    tracing::warn!(file = %path.display(), error = %err, "skipping unreadable session log");
                }
            }
        }
        false
    }
}

impl Iterator for LogRecords {
    type Item = SourcedRecord;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.current.is_none() && !self.open_next() {
                return None;
            }
            let open = self.current.as_mut()?;
            match open.lines.next() {
                Some(Ok(raw)) => {
                    let decoded = String::from_utf8_lossy(&raw);
                    let trimmed = decoded.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    self.counters.lines += 1;
                    return Some(SourcedRecord {
                        source: open.name.clone(),
                        record: decode_line(trimmed),
                    });
                }
                Some(Err(err)) => {
                    self.counters.files_truncated += 1;
                    tracing::warn!(file = %open.name, error = %err, "stopping read of corrupt session log");
                    self.current = None;
                }
                None => {
                    self.current = None;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{LineRecord, LogSource};
    use crate::error::JournalError;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn from_glob_splits_directory_and_pattern() {
        let source = LogSource::from_glob("/var/sessions/*.jsonl").expect("glob");
        assert_eq!(source.root, std::path::PathBuf::from("/var/sessions"));
        assert_eq!(source.display(), "/var/sessions/*.jsonl");

        let dir_only = LogSource::from_glob("/var/sessions").expect("dir");
        assert_eq!(dir_only.display(), "/var/sessions/*.jsonl");
    }

    #[test]
    fn missing_root_is_fatal() {
        let tmp = tempdir().expect("tempdir");
        let source = LogSource::new(tmp.path().join("absent"), "*.jsonl").expect("source");
        let err = source.files().expect_err("missing root must fail");
        assert!(matches!(
            err.downcast_ref::<JournalError>(),
            Some(JournalError::MissingSourceRoot(_))
        ));
    }

    #[test]
    fn records_skip_blank_lines_and_flag_garbage() {
        let tmp = tempdir().expect("tempdir");
        fs::write(
            tmp.path().join("b.jsonl"),
            "{\"type\":\"message\",\"message\":{\"role\":\"user\",\"content\":\"hi\"}}\n\n{not json\n",
        )
        .expect("write b");
        fs::write(tmp.path().join("a.jsonl"), "{\"type\":\"custom\"}\n").expect("write a");
        fs::write(tmp.path().join("notes.txt"), "{\"type\":\"message\"}\n").expect("write txt");

        let source = LogSource::new(tmp.path(), "*.jsonl").expect("source");
        let mut records = source.records().expect("records");
        let collected: Vec<_> = records.by_ref().collect();

        let sources: Vec<&str> = collected.iter().map(|r| r.source.as_str()).collect();
        assert_eq!(sources, ["a.jsonl", "b.jsonl", "b.jsonl"]);
        assert!(matches!(&collected[0].record, LineRecord::Decoded(r) if !r.is_message()));
        assert!(matches!(&collected[1].record, LineRecord::Decoded(r) if r.is_message()));
        assert!(matches!(collected[2].record, LineRecord::Undecodable));

        let counters = records.counters();
        assert_eq!(counters.files_opened, 2);
        assert_eq!(counters.lines, 3);
    }

    #[test]
    fn message_with_wrong_shape_is_undecodable() {
        let tmp = tempdir().expect("tempdir");
        fs::write(
            tmp.path().join("s.jsonl"),
            "{\"type\":\"message\",\"message\":\"flat\"}\n[1,2]\n",
        )
        .expect("write");
        let source = LogSource::new(tmp.path(), "*.jsonl").expect("source");
        let collected: Vec<_> = source.records().expect("records").collect();
        assert_eq!(collected.len(), 2);
        assert!(collected.iter().all(|r| matches!(r.record, LineRecord::Undecodable)));
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_file_is_skipped_and_others_continue() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = tempdir().expect("tempdir");
        let locked = tmp.path().join("a.jsonl");
        fs::write(&locked, "{\"type\":\"message\"}\n").expect("write a");
        fs::write(tmp.path().join("b.jsonl"), "{\"type\":\"message\"}\n").expect("write b");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).expect("chmod");
        if fs::File::open(&locked).is_ok() {
            // Running as root: permissions do not block the open.
            return;
        }

        let source = LogSource::new(tmp.path(), "*.jsonl").expect("source");
        let mut records = source.records().expect("records");
        let collected: Vec<_> = records.by_ref().collect();
        let sources: Vec<&str> = collected.iter().map(|r| r.source.as_str()).collect();
        assert_eq!(sources, ["b.jsonl"]);

        let counters = records.counters();
        assert_eq!(counters.files_skipped, 1);
        assert_eq!(counters.files_opened, 1);
        assert_eq!(counters.files_truncated, 0);
    }
}
