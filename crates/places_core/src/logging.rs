//! Logging bootstrap for the places core.
//!
//! # Responsibility
//! - Start rotating file logs once per process.
//! - Keep diagnostic events metadata-only (ids and counts, never titles).
//!
//! # Invariants
//! - Repeating init with the same level and directory is a no-op.
//! - Init with a different level or directory is rejected.
//! - Init never panics.

use crate::config::LogConfig;
use flexi_logger::{
    Cleanup, Criterion, FileSpec, LogSpecification, Logger, LoggerHandle, Naming, WriteMode,
};
use log::{error, info, LevelFilter};
use once_cell::sync::OnceCell;
use std::path::{Path, PathBuf};

const LOG_FILE_BASENAME: &str = "places";
const LOG_ROTATE_BYTES: u64 = 5 * 1024 * 1024;
const LOG_FILES_KEPT: usize = 3;
const PANIC_PAYLOAD_LIMIT: usize = 160;

static ACTIVE_LOGGER: OnceCell<ActiveLogger> = OnceCell::new();

struct ActiveLogger {
    level: LevelFilter,
    dir: PathBuf,
    _handle: LoggerHandle,
}

impl ActiveLogger {
    fn ensure_same(&self, level: LevelFilter, dir: &Path) -> Result<(), String> {
        if self.dir != dir {
            return Err(format!(
                "logging already active in `{}`; refusing `{}`",
                self.dir.display(),
                dir.display()
            ));
        }
        if self.level != level {
            return Err(format!(
                "logging already active at level `{}`; refusing `{level}`",
                self.level
            ));
        }
        Ok(())
    }
}

/// Starts file logging at `level` under the absolute directory `log_dir`.
///
/// # Errors
/// - Unknown level, empty or relative directory.
/// - Directory creation or logger startup failure.
/// - Conflicting re-initialization.
pub fn init_logging(level: &str, log_dir: &Path) -> Result<(), String> {
    start_once(parse_level(level)?, log_dir)
}

/// Starts logging from config. Returns `Ok(false)` when no directory is set.
///
/// A missing level falls back to `default_log_level()`.
pub fn init_from_config(config: &LogConfig) -> Result<bool, String> {
    let Some(dir) = config.dir.as_deref() else {
        return Ok(false);
    };
    let level = match config.level.as_deref() {
        Some(raw) => parse_level(raw)?,
        None => default_log_level(),
    };
    start_once(level, dir)?;
    Ok(true)
}

/// Active `(level, directory)`, or `None` before init.
pub fn logging_status() -> Option<(LevelFilter, PathBuf)> {
    ACTIVE_LOGGER
        .get()
        .map(|active| (active.level, active.dir.clone()))
}

/// `Debug` in debug builds, `Info` in release builds.
pub fn default_log_level() -> LevelFilter {
    if cfg!(debug_assertions) {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    }
}

fn start_once(level: LevelFilter, dir: &Path) -> Result<(), String> {
    if dir.as_os_str().is_empty() || !dir.is_absolute() {
        return Err(format!(
            "log directory must be an absolute path, got `{}`",
            dir.display()
        ));
    }
    ACTIVE_LOGGER
        .get_or_try_init(|| start_logger(level, dir))?
        .ensure_same(level, dir)
}

fn start_logger(level: LevelFilter, dir: &Path) -> Result<ActiveLogger, String> {
    std::fs::create_dir_all(dir)
        .map_err(|err| format!("cannot create log directory `{}`: {err}", dir.display()))?;

    let files = FileSpec::default().directory(dir).basename(LOG_FILE_BASENAME);
    let rotation = Criterion::Size(LOG_ROTATE_BYTES);
    let handle = Logger::with(LogSpecification::builder().default(level).build())
        .log_to_file(files)
        .rotate(rotation, Naming::Timestamps, Cleanup::KeepLogFiles(LOG_FILES_KEPT))
        .format_for_files(flexi_logger::detailed_format)
        .write_mode(WriteMode::BufferAndFlush)
        .append()
        .start()
        .map_err(|err| format!("cannot start logger: {err}"))?;

    install_panic_hook();
    info!(
        "event=core_init module=logging status=ok level={level} version={} log_dir={}",
        env!("CARGO_PKG_VERSION"),
        dir.display()
    );

    Ok(ActiveLogger {
        level,
        dir: dir.to_path_buf(),
        _handle: handle,
    })
}

/// Accepts level names case-insensitively, plus `warning` for `warn`.
fn parse_level(raw: &str) -> Result<LevelFilter, String> {
    let trimmed = raw.trim();
    let name = if trimmed.eq_ignore_ascii_case("warning") {
        "warn"
    } else {
        trimmed
    };
    name.parse::<LevelFilter>()
        .map_err(|_| format!("unsupported log level `{trimmed}`"))
}

// Called once, from inside the logger OnceCell initializer. Payloads are
// flattened to one line and capped before they reach the log file.
fn install_panic_hook() {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let location = panic_info
            .location()
            .map(|loc| format!("{}:{}", loc.file(), loc.line()))
            .unwrap_or_else(|| "unknown".to_string());
        let payload = panic_info.payload();
        let raw = payload
            .downcast_ref::<&str>()
            .copied()
            .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
            .unwrap_or("non-string panic payload");
        let mut summary: String = raw
            .chars()
            .take(PANIC_PAYLOAD_LIMIT)
            .map(|ch| if ch == '\n' || ch == '\r' { ' ' } else { ch })
            .collect();
        if raw.chars().nth(PANIC_PAYLOAD_LIMIT).is_some() {
            summary.push_str("...");
        }
        error!(
            "event=panic_captured module=logging status=error location={location} payload={summary}"
        );
        previous(panic_info);
    }));
}

#[cfg(test)]
mod tests {
    use super::{init_from_config, init_logging, logging_status, parse_level};
    use crate::config::LogConfig;
    use log::LevelFilter;
    use std::path::Path;

    #[test]
    fn parse_level_is_case_insensitive_and_accepts_warning() {
        assert_eq!(parse_level(" DEBUG ").unwrap(), LevelFilter::Debug);
        assert_eq!(parse_level("Warning").unwrap(), LevelFilter::Warn);
        assert_eq!(parse_level("off").unwrap(), LevelFilter::Off);
        assert!(parse_level("verbose").unwrap_err().contains("verbose"));
    }

    #[test]
    fn relative_directory_is_rejected() {
        let err = init_logging("info", Path::new("logs")).expect_err("relative dir");
        assert!(err.contains("absolute"));
    }

    #[test]
    fn config_without_directory_skips_init() {
        assert_eq!(init_from_config(&LogConfig::default()), Ok(false));
    }

    #[test]
    fn init_is_idempotent_and_rejects_conflicts() {
        let first = tempfile::tempdir().expect("temp dir");
        let second = tempfile::tempdir().expect("temp dir");

        init_logging("info", first.path()).expect("first init");
        init_logging("INFO", first.path()).expect("same config is a no-op");

        let level_err = init_logging("debug", first.path()).expect_err("level conflict");
        assert!(level_err.contains("refusing"));
        let dir_err = init_logging("info", second.path()).expect_err("dir conflict");
        assert!(dir_err.contains("refusing"));

        let (level, dir) = logging_status().expect("logging active");
        assert_eq!(level, LevelFilter::Info);
        assert_eq!(dir, first.path());
    }
}
