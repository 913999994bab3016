use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum JournalError {
    #[error("sessions dir not found: {}", .0.display())]
    MissingSourceRoot(PathBuf),
    #[error("unknown timezone `{0}`")]
    InvalidTimezone(String),
    #[error("invalid date `{0}`; expected YYYY-MM-DD")]
    InvalidDate(String),
    #[error("config file invalid or unreadable: {0}")]
    InvalidConfig(String),
}
