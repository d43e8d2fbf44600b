use flexi_logger::{FlexiLoggerError, Logger, LoggerHandle};

const LOG_ENV_VAR: &str = "TASKLIST_LOG";
const DEFAULT_SPEC: &str = "warn";

/// Log spec from `TASKLIST_LOG`, then `RUST_LOG`, then `warn`.
pub fn log_spec() -> String {
    [LOG_ENV_VAR, "RUST_LOG"]
        .iter()
        .filter_map(|name| std::env::var(name).ok())
        .find(|value| !value.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_SPEC.to_string())
}

/// Logs go to stderr so they never mix with `--json` output.
pub fn init_logging() -> Result<LoggerHandle, FlexiLoggerError> {
    Logger::try_with_str(log_spec())?.log_to_stderr().start()
}
