//! Tracing setup for the bot process.
//!
//! Lines look like `2026-03-01 12:00:00  INFO faq_bot::handlers::ai_chat: step: ... chat_id=42`.
//! The HTTP stacks under the providers and teloxide are noisy at `info`, so unless `RUST_LOG`
//! says otherwise they are held at `warn`.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::Arc;

use tracing_subscriber::{
    fmt::format::{FmtSpan, Writer},
    fmt::time::FormatTime,
    fmt::writer::{BoxMakeWriter, MakeWriterExt},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Registry,
};

/// Filter used when `RUST_LOG` is unset or invalid.
pub const DEFAULT_LOG_FILTER: &str =
    "info,hyper=warn,hyper_util=warn,h2=warn,reqwest=warn,teloxide=warn";

struct LocalSeconds;

impl FormatTime for LocalSeconds {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        write!(w, "{} ", chrono::Local::now().format("%Y-%m-%d %H:%M:%S"))
    }
}

/// Opens `path` for appending, creating it and any missing parent directories.
pub fn open_log_file(path: &str) -> io::Result<File> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    OpenOptions::new().create(true).append(true).open(path)
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

/// Installs the global subscriber. Output goes to stdout and, when `log_file_path` is not
/// blank, is also appended to that file. No ANSI colours, so both sinks stay plain text.
///
/// Fails if the file cannot be opened or a global subscriber is already installed.
pub fn init_tracing(log_file_path: &str) -> anyhow::Result<()> {
    let writer = if log_file_path.trim().is_empty() {
        BoxMakeWriter::new(io::stdout)
    } else {
        let file = Arc::new(open_log_file(log_file_path)?);
        BoxMakeWriter::new(io::stdout.and(file))
    };

    let event_format = tracing_subscriber::fmt::format()
        .with_timer(LocalSeconds)
        .with_level(true)
        .with_target(true)
        .with_thread_ids(false);

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .event_format(event_format)
        .with_span_events(FmtSpan::NONE)
        .with_ansi(false);

    Registry::default()
        .with(env_filter())
        .with(fmt_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to set global subscriber: {}", e))?;

    Ok(())
}
