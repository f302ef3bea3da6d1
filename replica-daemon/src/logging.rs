//! Logger handle with a file sink and a console sink.
//!
//! Both sinks get the same line for every event at `info` or above:
//!
//! ```text
//! 2026-10-19 14:03:07,512 - INFO: Folder synchronization complete: /src -> /replica
//! ```
//!
//! The handle wraps a [`Dispatch`] instead of installing a global subscriber;
//! the runner scopes it around everything it does.

use std::fmt;
use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use chrono::Local;
use tracing::{Dispatch, Event, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields, MakeWriter};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::EnvFilter;

use crate::error::{io_err, DaemonError};

/// Severity threshold for both sinks.
pub const DEFAULT_FILTER: &str = "info";

/// Local time, millisecond precision, comma before the millis.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S,%3f";

/// `<timestamp> - <LEVEL>: <message>` event formatter.
#[derive(Debug, Clone, Copy, Default)]
pub struct LineFormat;

impl<S, N> FormatEvent<S, N> for LineFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        write!(
            writer,
            "{} - {}: ",
            Local::now().format(TIMESTAMP_FORMAT),
            event.metadata().level()
        )?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Cloneable handle to the process's log sinks.
#[derive(Debug, Clone)]
pub struct Logger {
    dispatch: Dispatch,
}

impl Logger {
    /// Log to `log_file` (appending, parent directories created) and to stderr.
    pub fn open(log_file: &Path) -> Result<Self, DaemonError> {
        if let Some(parent) = log_file.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_file)
            .map_err(|e| io_err(log_file, e))?;

        Self::with_writers(Mutex::new(file), std::io::stderr)
    }

    /// Build a logger over arbitrary writers. `open` is this with a file and stderr.
    pub fn with_writers<F, C>(file: F, console: C) -> Result<Self, DaemonError>
    where
        F: for<'w> MakeWriter<'w> + Send + Sync + 'static,
        C: for<'w> MakeWriter<'w> + Send + Sync + 'static,
    {
        let filter = EnvFilter::try_new(DEFAULT_FILTER)?;
        let subscriber = tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .event_format(LineFormat)
                    .with_ansi(false)
                    .with_writer(file),
            )
            .with(
                tracing_subscriber::fmt::layer()
                    .event_format(LineFormat)
                    .with_ansi(false)
                    .with_writer(console),
            );

        Ok(Self {
            dispatch: Dispatch::new(subscriber),
        })
    }

    pub fn dispatch(&self) -> &Dispatch {
        &self.dispatch
    }

    /// Run `f` with this logger as the current dispatcher.
    pub fn in_scope<T>(&self, f: impl FnOnce() -> T) -> T {
        tracing::dispatcher::with_default(&self.dispatch, f)
    }
}
