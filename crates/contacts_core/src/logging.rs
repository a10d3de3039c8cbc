//! Process logging setup.
//!
//! # Responsibility
//! - Start the `flexi_logger` backend for the `log` facade once per process.
//! - Route records to stderr, or to size-rotated files in a log directory.
//! - Turn panics into single-line `panic_captured` events.
//!
//! # Invariants
//! - Repeating [`init_logging`] with the same level and sink is a no-op.
//! - A second call with a different level or sink fails instead of switching.
//! - Setup errors are returned, never panicked.
//! - Events carry ids and status only; contact field values are never logged.

use flexi_logger::{
    Cleanup, Criterion, Duplicate, FileSpec, Logger, LoggerHandle, Naming, WriteMode,
};
use log::{error, info};
use once_cell::sync::OnceCell;
use std::fmt::{Display, Formatter};
use std::panic::PanicHookInfo;
use std::path::{Path, PathBuf};

const LOG_FILE_BASENAME: &str = "contacts";
const ROTATE_AT_BYTES: u64 = 10 * 1024 * 1024;
const KEEP_LOG_FILES: usize = 5;
const PANIC_PAYLOAD_LIMIT: usize = 160;
const LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

static ACTIVE: OnceCell<ActiveLogger> = OnceCell::new();
static PANIC_HOOK: OnceCell<()> = OnceCell::new();

/// Where log records go.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Sink {
    Stderr,
    /// Rotated files; warnings and errors are also copied to stderr.
    Dir(PathBuf),
}

impl Sink {
    fn parse(log_dir: Option<&str>) -> Result<Self, String> {
        let Some(raw) = log_dir else {
            return Ok(Self::Stderr);
        };
        let raw = raw.trim();
        if raw.is_empty() {
            return Err("log directory cannot be blank".to_string());
        }
        let dir = Path::new(raw);
        if !dir.is_absolute() {
            return Err(format!("log directory must be absolute, got `{raw}`"));
        }
        Ok(Self::Dir(dir.to_path_buf()))
    }

    fn dir(&self) -> Option<&Path> {
        match self {
            Self::Stderr => None,
            Self::Dir(dir) => Some(dir),
        }
    }

    fn attach(&self, logger: Logger) -> Result<Logger, String> {
        match self {
            Self::Stderr => Ok(logger
                .log_to_stderr()
                .format_for_stderr(flexi_logger::detailed_format)),
            Self::Dir(dir) => {
                std::fs::create_dir_all(dir).map_err(|err| {
                    format!("cannot create log directory `{}`: {err}", dir.display())
                })?;
                Ok(logger
                    .log_to_file(FileSpec::default().directory(dir).basename(LOG_FILE_BASENAME))
                    .rotate(
                        Criterion::Size(ROTATE_AT_BYTES),
                        Naming::Numbers,
                        Cleanup::KeepLogFiles(KEEP_LOG_FILES),
                    )
                    .append()
                    .write_mode(WriteMode::BufferAndFlush)
                    .duplicate_to_stderr(Duplicate::Warn)
                    .format_for_files(flexi_logger::detailed_format))
            }
        }
    }
}

impl Display for Sink {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stderr => write!(f, "stderr"),
            Self::Dir(dir) => write!(f, "{}", dir.display()),
        }
    }
}

struct ActiveLogger {
    level: &'static str,
    sink: Sink,
    _handle: LoggerHandle,
}

/// Starts process logging at `level`.
///
/// `log_dir = None` writes to stderr. `Some(dir)` writes rotated files under
/// the absolute directory `dir`, creating it when missing.
///
/// # Errors
/// - Unknown level, or a blank or relative `log_dir`.
/// - Logging already started with another level or sink.
/// - The backend could not start.
pub fn init_logging(level: &str, log_dir: Option<&str>) -> Result<(), String> {
    let level = parse_level(level)?;
    let sink = Sink::parse(log_dir)?;

    let active = ACTIVE.get_or_try_init(|| start(level, &sink))?;

    if active.sink != sink {
        return Err(format!(
            "logging already writes to `{}`; cannot switch to `{sink}`",
            active.sink
        ));
    }
    if active.level != level {
        return Err(format!(
            "logging already runs at `{}`; cannot switch to `{level}`",
            active.level
        ));
    }
    Ok(())
}

fn start(level: &'static str, sink: &Sink) -> Result<ActiveLogger, String> {
    let logger = Logger::try_with_str(level)
        .map_err(|err| format!("invalid log level `{level}`: {err}"))?;
    let handle = sink
        .attach(logger)?
        .start()
        .map_err(|err| format!("logger backend failed to start: {err}"))?;

    install_panic_hook();
    info!(
        "event=logging_init module=core status=ok level={level} sink={sink} version={} os={}",
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS
    );

    Ok(ActiveLogger {
        level,
        sink: sink.clone(),
        _handle: handle,
    })
}

/// Active `(level, log_dir)`; `log_dir` is `None` for stderr.
///
/// Returns `None` before logging starts.
pub fn logging_status() -> Option<(&'static str, Option<PathBuf>)> {
    ACTIVE
        .get()
        .map(|active| (active.level, active.sink.dir().map(Path::to_path_buf)))
}

/// `debug` for debug builds, `info` for release builds.
pub fn default_log_level() -> &'static str {
    if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    }
}

fn parse_level(raw: &str) -> Result<&'static str, String> {
    let lowered = raw.trim().to_ascii_lowercase();
    let lowered = if lowered == "warning" { "warn".to_string() } else { lowered };
    LEVELS
        .iter()
        .copied()
        .find(|level| *level == lowered)
        .ok_or_else(|| format!("unknown log level `{raw}`; use one of {}", LEVELS.join("|")))
}

fn install_panic_hook() {
    if PANIC_HOOK.set(()).is_err() {
        return;
    }

    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic| {
        error!(
            "event=panic_captured module=core status=error location={} payload={}",
            panic_location(panic),
            one_line(&panic_payload(panic), PANIC_PAYLOAD_LIMIT)
        );
        previous(panic);
    }));
}

fn panic_location(panic: &PanicHookInfo<'_>) -> String {
    panic
        .location()
        .map(|at| format!("{}:{}", at.file(), at.line()))
        .unwrap_or_else(|| "unknown".to_string())
}

fn panic_payload(panic: &PanicHookInfo<'_>) -> String {
    let payload = panic.payload();
    payload
        .downcast_ref::<&str>()
        .map(|text| (*text).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "<non-string payload>".to_string())
}

/// Collapses line breaks and caps the length at `limit` characters.
fn one_line(text: &str, limit: usize) -> String {
    let flat = text.replace(['\r', '\n'], " ");
    if flat.chars().count() <= limit {
        return flat;
    }
    let mut cut: String = flat.chars().take(limit).collect();
    cut.push_str("...");
    cut
}

#[cfg(test)]
mod tests {
    use super::{init_logging, logging_status, one_line, parse_level, Sink};
    use std::path::PathBuf;

    #[test]
    fn levels_are_case_insensitive_and_accept_warning_alias() {
        assert_eq!(parse_level("INFO").unwrap(), "info");
        assert_eq!(parse_level(" Warning ").unwrap(), "warn");
        assert!(parse_level("loud").is_err());
    }

    #[test]
    fn sink_requires_absolute_non_blank_directory() {
        assert_eq!(Sink::parse(None).unwrap(), Sink::Stderr);
        assert!(Sink::parse(Some("  ")).is_err());
        assert!(Sink::parse(Some("logs/dev"))
            .unwrap_err()
            .contains("absolute"));
        assert_eq!(
            Sink::parse(Some("/var/log/contacts")).unwrap(),
            Sink::Dir(PathBuf::from("/var/log/contacts"))
        );
        assert_eq!(Sink::Stderr.to_string(), "stderr");
    }

    #[test]
    fn one_line_flattens_and_truncates() {
        assert_eq!(one_line("a\nb", 10), "a b");
        let cut = one_line("line1\nline2\rline3", 8);
        assert_eq!(cut, "line1 li...");
    }

    #[test]
    fn init_is_idempotent_and_rejects_switching() {
        let dir = tempfile::tempdir().unwrap();
        let dir_str = dir.path().to_str().unwrap().to_string();

        init_logging("info", Some(&dir_str)).expect("first init");
        init_logging("INFO", Some(&dir_str)).expect("same config is a no-op");

        let err = init_logging("debug", Some(&dir_str)).unwrap_err();
        assert!(err.contains("cannot switch"));
        let err = init_logging("info", None).unwrap_err();
        assert!(err.contains("cannot switch"));

        let (level, active_dir) = logging_status().expect("logging is active");
        assert_eq!(level, "info");
        assert_eq!(active_dir.as_deref(), Some(dir.path()));
    }
}
