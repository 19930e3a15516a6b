//! Logging bootstrap and safety policy.
//!
//! # Responsibility
//! - Initialize process-wide logging exactly once, to rolling files or
//!   stderr.
//! - Capture panics as metadata-only log events.
//!
//! # Invariants
//! - Initialization is idempotent for an identical configuration and
//!   rejected for a conflicting one.
//! - Initialization never panics; the sink is write-only and the core
//!   never blocks on it.

use std::path::{Path, PathBuf};

use flexi_logger::{Cleanup, Criterion, FileSpec, Logger, LoggerHandle, Naming, WriteMode};
use log::{error, info};
use once_cell::sync::OnceCell;

const LOG_FILE_BASENAME: &str = "shoplite";
const MAX_LOG_FILE_SIZE_BYTES: u64 = 8 * 1024 * 1024;
const MAX_LOG_FILES: usize = 4;
const MAX_PANIC_PAYLOAD_CHARS: usize = 200;

static LOGGING: OnceCell<ActiveLogging> = OnceCell::new();

struct ActiveLogging {
    level: &'static str,
    log_dir: Option<PathBuf>,
    _handle: LoggerHandle,
}

/// Initializes logging at `level`, writing rolling files under `log_dir`
/// or to stderr when no directory is given.
///
/// # Errors
/// - Unsupported level names.
/// - A relative or uncreatable log directory.
/// - A previous initialization with a different configuration.
pub fn init_logging(level: &str, log_dir: Option<&str>) -> Result<(), String> {
    let level = parse_level(level)?;
    let log_dir = log_dir.map(parse_log_dir).transpose()?;

    if let Some(active) = LOGGING.get() {
        return check_active(active, level, log_dir.as_deref());
    }

    let dir_for_init = log_dir.clone();
    let active = LOGGING.get_or_try_init(|| -> Result<ActiveLogging, String> {
        let builder = Logger::try_with_str(level)
            .map_err(|err| format!("invalid log level `{level}`: {err}"))?;

        let handle = match &dir_for_init {
            Some(dir) => {
                std::fs::create_dir_all(dir).map_err(|err| {
                    format!("failed to create log directory `{}`: {err}", dir.display())
                })?;
                builder
                    .log_to_file(
                        FileSpec::default()
                            .directory(dir.as_path())
                            .basename(LOG_FILE_BASENAME),
                    )
                    .rotate(
                        Criterion::Size(MAX_LOG_FILE_SIZE_BYTES),
                        Naming::Numbers,
                        Cleanup::KeepLogFiles(MAX_LOG_FILES),
                    )
                    .write_mode(WriteMode::BufferAndFlush)
                    .append()
                    .format_for_files(flexi_logger::detailed_format)
                    .start()
            }
            None => builder.start(),
        }
        .map_err(|err| format!("failed to start logger: {err}"))?;

        install_panic_capture();

        info!(
            "event=logging_init module=core status=ok level={level} sink={} version={}",
            dir_for_init
                .as_ref()
                .map_or("stderr".to_string(), |dir| dir.display().to_string()),
            env!("CARGO_PKG_VERSION")
        );

        Ok(ActiveLogging {
            level,
            log_dir: dir_for_init,
            _handle: handle,
        })
    })?;

    check_active(active, level, log_dir.as_deref())
}

/// Returns `(level, log_dir)` when logging is active.
pub fn logging_status() -> Option<(&'static str, Option<PathBuf>)> {
    LOGGING
        .get()
        .map(|active| (active.level, active.log_dir.clone()))
}

/// Default log level for the current build mode.
pub fn default_log_level() -> &'static str {
    if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    }
}

fn check_active(
    active: &ActiveLogging,
    level: &'static str,
    log_dir: Option<&Path>,
) -> Result<(), String> {
    if active.level != level || active.log_dir.as_deref() != log_dir {
        return Err(format!(
            "logging already initialized with level `{}`; refusing to reconfigure",
            active.level
        ));
    }
    Ok(())
}

fn parse_level(level: &str) -> Result<&'static str, String> {
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" => Ok("trace"),
        "debug" => Ok("debug"),
        "info" => Ok("info"),
        "warn" | "warning" => Ok("warn"),
        "error" => Ok("error"),
        other => Err(format!(
            "unsupported log level `{other}`; expected trace|debug|info|warn|error"
        )),
    }
}

fn parse_log_dir(log_dir: &str) -> Result<PathBuf, String> {
    let trimmed = log_dir.trim();
    if trimmed.is_empty() {
        return Err("log directory cannot be empty".to_string());
    }
    let path = Path::new(trimmed);
    if !path.is_absolute() {
        return Err(format!(
            "log directory must be an absolute path, got `{trimmed}`"
        ));
    }
    Ok(path.to_path_buf())
}

fn install_panic_capture() {
    let previous_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let location = panic_info
            .location()
            .map_or("unknown".to_string(), |loc| {
                format!("{}:{}", loc.file(), loc.line())
            });
        let payload = panic_info
            .payload()
            .downcast_ref::<&str>()
            .map(|message| (*message).to_string())
            .or_else(|| panic_info.payload().downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".to_string());
        error!(
            "event=panic_captured module=core status=error location={location} payload={}",
            scrub(&payload, MAX_PANIC_PAYLOAD_CHARS)
        );
        previous_hook(panic_info);
    }));
}

/// Panic payloads can carry user-controlled text; flatten newlines and cap
/// the length before they reach the log.
fn scrub(value: &str, max_chars: usize) -> String {
    let flattened = value.replace(['\n', '\r'], " ");
    let mut capped: String = flattened.chars().take(max_chars).collect();
    if flattened.chars().count() > max_chars {
        capped.push_str("...");
    }
    capped
}

#[cfg(test)]
mod tests {
    use super::{parse_level, parse_log_dir, scrub};

    #[test]
    fn level_names_normalize_case_insensitively() {
        assert_eq!(parse_level("INFO").unwrap(), "info");
        assert_eq!(parse_level(" Warning ").unwrap(), "warn");
        assert!(parse_level("loud").is_err());
    }

    #[test]
    fn relative_log_directories_are_rejected() {
        let err = parse_log_dir("logs/dev").unwrap_err();
        assert!(err.contains("absolute"));
        assert!(parse_log_dir("").is_err());
    }

    #[test]
    fn scrub_flattens_and_caps_payloads() {
        let scrubbed = scrub("line1\nline2\rline3", 8);
        assert!(!scrubbed.contains('\n'));
        assert!(scrubbed.ends_with("..."));
        assert_eq!(scrub("short", 8), "short");
    }
}
