use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat};
use chrono_tz::Tz;
use serde::Serializer;
use serde_json::Value;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Keep at most `max_chars` Unicode scalar values of `input`.
pub fn truncate_chars(input: &str, max_chars: usize) -> String {
    match input.char_indices().nth(max_chars) {
        Some((idx, _)) => input[..idx].to_string(),
        None => input.to_string(),
    }
}

pub fn char_len(input: &str) -> usize {
    input.chars().count()
}

/// RFC 3339 with the zone offset spelled out (`+08:00`, never `Z`), and
/// fractional seconds only when present.
pub fn iso_local(ts: &DateTime<Tz>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, false)
}

pub fn serialize_local<S>(ts: &DateTime<Tz>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&iso_local(ts))
}

/// Pretty JSON with a trailing newline, written through a sibling temp file
/// and renamed into place.
pub fn write_json_atomic(path: &Path, value: &Value) -> Result<PathBuf> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&parent)
        .with_context(|| format!("failed to create {}", parent.display()))?;

    let data = serde_json::to_string_pretty(value)?;
    let mut tmp = tempfile::NamedTempFile::new_in(&parent)
        .with_context(|| format!("failed to stage write in {}", parent.display()))?;
    tmp.write_all(format!("{data}\n").as_bytes())?;
    tmp.persist(path)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path.to_path_buf())
}
