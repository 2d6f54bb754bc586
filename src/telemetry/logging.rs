//! Subscriber setup
//!
//! Console output is compact text or JSON; a plain-text file can be added
//! alongside it. `SIGN_LOG` overrides the filter (falling back to `RUST_LOG`)
//! and `SIGN_LOG_FORMAT=json` forces JSON on the console.

use std::path::PathBuf;

use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

pub use tracing_appender::non_blocking::WorkerGuard as LogGuard;

const FILTER_ENV: &str = "SIGN_LOG";
const FORMAT_ENV: &str = "SIGN_LOG_FORMAT";
const DEFAULT_LOG_FILE: &str = "sign-recognizer.log";

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub console_enabled: bool,
    pub file_enabled: bool,
    /// Defaults to `sign-recognizer.log` in the working directory
    pub file_path: Option<PathBuf>,
    pub json_format: bool,
    /// Filter directive used without an environment override
    pub default_level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            console_enabled: true,
            file_enabled: false,
            file_path: None,
            json_format: false,
            default_level: "info".to_string(),
        }
    }
}

impl LogConfig {
    /// `-v` raises the default to debug, `-vv` to trace
    pub fn with_verbosity(mut self, verbose: u8) -> Self {
        match verbose {
            0 => {}
            1 => self.default_level = "debug".to_string(),
            _ => self.default_level = "trace".to_string(),
        }
        self
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_env(FILTER_ENV)
            .or_else(|_| EnvFilter::try_from_env("RUST_LOG"))
            .unwrap_or_else(|_| EnvFilter::new(&self.default_level))
    }

    fn wants_json(&self) -> bool {
        std::env::var(FORMAT_ENV)
            .map(|v| v.eq_ignore_ascii_case("json"))
            .unwrap_or(self.json_format)
    }
}

/// Install the global subscriber.
///
/// Keep the returned guard alive until exit; dropping it flushes the file writer.
pub fn init_logging(config: &LogConfig) -> Result<Option<LogGuard>, Box<dyn std::error::Error + Send + Sync>> {
    let json = config.wants_json();

    let (file_layer, guard) = if config.file_enabled {
        let path = config
            .file_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE));
        let (writer, guard) = tracing_appender::non_blocking(std::fs::File::create(&path)?);
        eprintln!("Logging to file: {}", path.display());

        let layer = fmt::layer()
            .with_writer(writer)
            .with_ansi(false)
            .with_file(true)
            .with_line_number(true);
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    let json_layer = (config.console_enabled && json).then(|| {
        fmt::layer()
            .json()
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
    });
    let text_layer = (config.console_enabled && !json).then(|| fmt::layer().compact());

    tracing_subscriber::registry()
        .with(config.filter())
        .with(file_layer)
        .with(json_layer)
        .with(text_layer)
        .try_init()?;

    tracing::info!(
        target: "sign_recognizer",
        version = env!("CARGO_PKG_VERSION"),
        json,
        file = config.file_enabled,
        "Logging initialized"
    );

    Ok(guard)
}
