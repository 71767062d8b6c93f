//! Tracing subscriber setup shared by the repository binaries.
//!
//! Output is controlled through environment variables:
//!
//! - `LOG_LEVEL`: default filter directive when `RUST_LOG` is unset (`info`)
//! - `LOG_FORMAT`: `human` or `json`
//! - `LOG_OUTPUT`: `console`, `file`, `both` or `off`
//! - `LOG_FILE_PATH`: file written (rolled daily) when file output is enabled

use std::{
    env,
    path::{Path, PathBuf},
};
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{
    filter::Directive,
    fmt::writer::{BoxMakeWriter, MakeWriterExt},
    prelude::*,
    registry, EnvFilter, Layer,
};

const DEFAULT_LOG_FILE: &str = "/tmp/maven-repo.log";

/// Where formatted events are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogOutput {
    Console,
    File,
    Both,
    Off,
}

impl LogOutput {
    fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "file" => LogOutput::File,
            "both" => LogOutput::Both,
            "off" | "none" => LogOutput::Off,
            _ => LogOutput::Console,
        }
    }
}

/// Event formatting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Human,
    Json,
}

impl LogFormat {
    fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Human
        }
    }
}

/// Resolved logging settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub level: String,
    pub format: LogFormat,
    pub output: LogOutput,
    pub file_path: PathBuf,
}

impl Default for LogSettings {
    fn default() -> Self {
        LogSettings {
            level: "info".to_string(),
            format: LogFormat::Human,
            output: LogOutput::Console,
            file_path: PathBuf::from(DEFAULT_LOG_FILE),
        }
    }
}

impl LogSettings {
    /// Read settings from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = LogSettings::default();
        LogSettings {
            level: lookup("LOG_LEVEL")
                .filter(|level| !level.trim().is_empty())
                .unwrap_or(defaults.level),
            format: lookup("LOG_FORMAT")
                .map(|v| LogFormat::parse(&v))
                .unwrap_or(defaults.format),
            output: lookup("LOG_OUTPUT")
                .map(|v| LogOutput::parse(&v))
                .unwrap_or(defaults.output),
            file_path: lookup("LOG_FILE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.file_path),
        }
    }
}

fn build_filter(level: &str) -> EnvFilter {
    let mut filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    for noisy in ["tokio=warn", "hyper=warn", "tower_http=info"] {
        if let Ok(directive) = noisy.parse::<Directive>() {
            filter = filter.add_directive(directive);
        }
    }
    filter
}

fn file_writer(path: &Path) -> (NonBlocking, WorkerGuard) {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("/tmp"));
    let file_name = path
        .file_name()
        .unwrap_or_else(|| "maven-repo.log".as_ref());
    let appender = tracing_appender::rolling::daily(dir, file_name);
    tracing_appender::non_blocking(appender)
}

/// Installs the global subscriber.
///
/// The returned guard must be kept alive for as long as file output should be
/// flushed. Returns `None` when no file output is configured or when a global
/// subscriber was already installed.
pub fn init_subscriber(settings: &LogSettings) -> Option<WorkerGuard> {
    let filter = build_filter(&settings.level);

    let (writer, guard) = match settings.output {
        LogOutput::Off => {
            let _ = registry().with(filter).try_init();
            return None;
        }
        LogOutput::Console => (BoxMakeWriter::new(std::io::stdout), None),
        LogOutput::File => {
            let (non_blocking, guard) = file_writer(&settings.file_path);
            (BoxMakeWriter::new(non_blocking), Some(guard))
        }
        LogOutput::Both => {
            let (non_blocking, guard) = file_writer(&settings.file_path);
            (
                BoxMakeWriter::new(std::io::stdout.and(non_blocking)),
                Some(guard),
            )
        }
    };

    let fmt_layer = tracing_subscriber::fmt::layer().with_writer(writer);
    let fmt_layer = match settings.format {
        LogFormat::Json => fmt_layer.json().boxed(),
        LogFormat::Human => fmt_layer.boxed(),
    };

    if registry().with(fmt_layer).with(filter).try_init().is_err() {
        return None;
    }
    guard
}
