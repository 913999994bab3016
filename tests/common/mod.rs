use assert_cmd::Command;

/// Every override the binary reads besides the ones a test sets itself.
const OVERRIDE_KEYS: &[&str] = &[
    "SELFOS_ACTIVITY_TAIL",
    "SELFOS_CONFIG_PATH",
    "SELFOS_DATA_DIR",
    "SELFOS_ENV_FILE",
    "SELFOS_JOURNAL_FILE",
    "SELFOS_LEARNING_CAP",
    "SELFOS_LOGS_DIR",
    "SELFOS_SESSIONS_GLOB",
    "SELFOS_STATE_FILE",
    "SELFOS_TIMELINE_CAP",
    "SELFOS_TZ",
    "SELFOS_WINDOW_DAYS",
];

/// Drop inherited overrides so paths resolve under the test's SELFOS_HOME.
/// Call before setting per-test values, which then take precedence.
pub fn isolate(cmd: &mut Command) -> &mut Command {
    for key in OVERRIDE_KEYS {
        cmd.env_remove(key);
    }
    cmd
}
