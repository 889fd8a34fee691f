//! Tracing setup shared by the bridge and the hook process.
//!
//! Logs go to a file under `<state>/logs/` so the hook, which runs with
//! Claude Code owning its stdio, never writes to the terminal.

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info,tower_http=warn,hyper=warn";
const FILTER_ENV: &str = "CHATPANE_LOG_FILTER";
const FORMAT_ENV: &str = "CHATPANE_LOG_FORMAT";

pub const BRIDGE_LOG: &str = "bridge.log";
pub const HOOK_LOG: &str = "hook.log";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LogFormat {
    Json,
    Pretty,
}

impl LogFormat {
    fn from_env_value(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.trim().eq_ignore_ascii_case("pretty") => LogFormat::Pretty,
            _ => LogFormat::Json,
        }
    }
}

pub struct LoggingHandle {
    pub run_id: String,
    /// Flushes buffered lines when dropped.
    pub guard: WorkerGuard,
}

/// First directive string that parses: `CHATPANE_LOG_FILTER`, then
/// `RUST_LOG`, then the built-in default.
fn select_filter(own: Option<&str>, rust_log: Option<&str>) -> String {
    [own, rust_log]
        .into_iter()
        .flatten()
        .find(|d| EnvFilter::try_new(d).is_ok())
        .unwrap_or(DEFAULT_FILTER)
        .to_string()
}

pub fn init_logging(log_dir: &Path, file_name: &str) -> anyhow::Result<LoggingHandle> {
    std::fs::create_dir_all(log_dir)?;

    let directives = select_filter(
        std::env::var(FILTER_ENV).ok().as_deref(),
        std::env::var("RUST_LOG").ok().as_deref(),
    );
    let format = LogFormat::from_env_value(std::env::var(FORMAT_ENV).ok().as_deref());

    let (writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::never(log_dir, file_name));
    let subscriber = tracing_subscriber::registry().with(EnvFilter::try_new(&directives)?);

    match format {
        LogFormat::Pretty => subscriber
            .with(fmt::layer().with_writer(writer).with_ansi(false).pretty())
            .try_init()?,
        LogFormat::Json => subscriber
            .with(
                fmt::layer()
                    .with_writer(writer)
                    .json()
                    .flatten_event(true)
                    .with_current_span(true),
            )
            .try_init()?,
    }

    let started_ms = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    let run_id = format!("pid-{}-{started_ms}", std::process::id());

    tracing::info!(
        component = "logging",
        event = "logging.initialized",
        run_id = %run_id,
        log_path = %log_dir.join(file_name).display(),
        format = ?format,
        filter = %directives,
    );

    Ok(LoggingHandle { run_id, guard })
}
