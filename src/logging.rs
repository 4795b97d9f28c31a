//! Diagnostics for the `ado` binary.
//!
//! Stdout carries command results, so log lines go to stderr or to a file.
//! The level defaults to `warn` so retry notices stay visible; `off` turns
//! logging off entirely. Lines are plain text or JSON.

use std::path::PathBuf;
use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

const LEVEL_ENV: &str = "ADO_LOG_LEVEL";
const FILE_ENV: &str = "ADO_LOG_FILE";
const FORMAT_ENV: &str = "ADO_LOG_FORMAT";

/// Read a level name. Accepts the tracing names plus `warning`;
/// unknown names give `None`.
#[must_use]
pub fn parse_level(name: &str) -> Option<LevelFilter> {
    let name = name.trim();
    if name.eq_ignore_ascii_case("warning") {
        return Some(LevelFilter::WARN);
    }
    name.parse().ok()
}

/// Shape of each log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("text") {
            Ok(Self::Text)
        } else if s.eq_ignore_ascii_case("json") {
            Ok(Self::Json)
        } else {
            Err(format!("unknown log format '{s}' (expected text or json)"))
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogConfig {
    /// `LevelFilter::OFF` disables logging.
    pub level: LevelFilter,
    /// Stderr when unset.
    pub file: Option<PathBuf>,
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LevelFilter::WARN,
            file: None,
            format: LogFormat::Text,
        }
    }
}

impl LogConfig {
    pub fn is_enabled(&self) -> bool {
        self.level != LevelFilter::OFF
    }

    /// Only events from this crate pass; HTTP and TLS internals stay quiet.
    fn filter(&self) -> EnvFilter {
        EnvFilter::new(format!("ado_cli={}", self.level))
    }

    fn writer(&self) -> Option<(NonBlocking, WorkerGuard)> {
        match &self.file {
            Some(path) => std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .ok()
                .map(tracing_appender::non_blocking),
            None => Some(tracing_appender::non_blocking(std::io::stderr())),
        }
    }
}

/// Flushes buffered log lines when dropped; keep it alive until exit.
pub struct LogGuard {
    _guard: WorkerGuard,
}

/// Install the global subscriber.
///
/// Returns `None` when logging is off or the log file cannot be opened.
///
/// ```rust,no_run
/// use ado_cli::logging::{LogConfig, init_logging};
/// use tracing::level_filters::LevelFilter;
///
/// let _guard = init_logging(LogConfig {
///     level: LevelFilter::DEBUG,
///     ..LogConfig::default()
/// });
/// ```
#[must_use = "dropping the guard stops the log writer"]
pub fn init_logging(config: LogConfig) -> Option<LogGuard> {
    if !config.is_enabled() {
        return None;
    }
    let (writer, guard) = config.writer()?;
    let to_file = config.file.is_some();
    let registry = tracing_subscriber::registry().with(config.filter());

    match config.format {
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_writer(writer)
                    .with_span_events(FmtSpan::CLOSE)
                    .with_file(to_file)
                    .with_line_number(to_file),
            )
            .init(),
        LogFormat::Text => registry
            .with(
                fmt::layer()
                    .compact()
                    .with_writer(writer)
                    .with_ansi(!to_file)
                    .with_target(to_file),
            )
            .init(),
    }

    Some(LogGuard { _guard: guard })
}

/// Logging settings read straight from argv, before clap parses it.
///
/// Flags beat `ADO_LOG_*` variables; unparsable values fall back to the
/// defaults.
#[must_use]
pub fn parse_early_log_config(args: &[String]) -> LogConfig {
    let lookup = |flag: &str, env: &str| flag_value(args, flag).or_else(|| std::env::var(env).ok());
    let defaults = LogConfig::default();

    LogConfig {
        level: lookup("--log-level", LEVEL_ENV)
            .and_then(|s| parse_level(&s))
            .unwrap_or(defaults.level),
        file: lookup("--log-file", FILE_ENV)
            .filter(|s| !s.is_empty())
            .map(PathBuf::from),
        format: lookup("--log-format", FORMAT_ENV)
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.format),
    }
}

/// Value of `--flag value` or `--flag=value`.
fn flag_value(args: &[String], flag: &str) -> Option<String> {
    args.iter().enumerate().find_map(|(i, arg)| {
        let rest = arg.strip_prefix(flag)?;
        if rest.is_empty() {
            args.get(i + 1).cloned()
        } else {
            rest.strip_prefix('=').map(str::to_string)
        }
    })
}
