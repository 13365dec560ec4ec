//! Tracing setup: a coloured stderr layer plus a JSON layer written to a
//! daily rolling log file.
//!
//! | Variable        | Default                 | Controls              |
//! |-----------------|-------------------------|-----------------------|
//! | `LOG_FILE_PATH` | `logs/visit_report.log` | JSON log file         |
//! | `RUST_LOG`      | `info`                  | stderr layer filter   |
//! | `RUST_LOG_JSON` | `debug`                 | JSON file layer filter|

use anyhow::Result;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

pub const DEFAULT_LOG_FILE: &str = "logs/visit_report.log";

/// Where the JSON log goes and the baseline level of each layer.
#[derive(Debug, Clone, PartialEq)]
pub struct LogSettings {
    pub dir: PathBuf,
    pub file_name: OsString,
    pub stderr_level: &'static str,
    pub file_level: &'static str,
}

impl LogSettings {
    /// Resolves settings from a variable lookup, normally `std::env::var`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let path = lookup("LOG_FILE_PATH").unwrap_or_else(|| DEFAULT_LOG_FILE.to_string());
        let path = Path::new(&path);

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let file_name = path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| OsString::from("visit_report.log"));

        Self {
            dir,
            file_name,
            stderr_level: "info",
            file_level: "debug",
        }
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }
}

/// Installs the global subscriber. Keep the guard alive until exit so the
/// file writer flushes.
pub fn init(settings: &LogSettings) -> Result<WorkerGuard> {
    let file_appender = tracing_appender::rolling::daily(&settings.dir, &settings.file_name);
    let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive(settings.stderr_level.parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive(settings.file_level.parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .try_init()?;

    Ok(guard)
}
