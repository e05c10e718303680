//! Emit targets for the backend logger
//!
//! A sink receives records that already passed filtering and were stamped
//! with process metadata. Writing them out (and any buffering or rotation)
//! is entirely the sink's concern.

mod console;
#[cfg(feature = "file-sink")]
mod file;

pub use console::ConsoleSink;
#[cfg(feature = "file-sink")]
pub use file::{DEFAULT_MAX_BYTES, DEFAULT_MAX_FILES, FileSink, FileSinkConfig};

use crate::core::types::{Metadata, Severity};
use anyhow::Result;
use chrono::{DateTime, TimeZone};
use std::sync::Arc;

/// Destination for emitted records
pub trait Sink: Send + Sync {
    /// Write one record. Must not panic; I/O failures are the sink's to report.
    fn emit(&self, severity: Severity, message: &str, metadata: &Metadata);

    /// Push any buffered records out
    fn flush(&self) -> Result<()> {
        Ok(())
    }
}

impl<F> Sink for F
where
    F: Fn(Severity, &str, &Metadata) + Send + Sync,
{
    fn emit(&self, severity: Severity, message: &str, metadata: &Metadata) {
        self(severity, message, metadata)
    }
}

/// Fans each record out to several sinks, in order
#[derive(Default)]
pub struct MultiSink {
    sinks: Vec<Arc<dyn Sink>>,
}

impl MultiSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sink to the fan-out
    pub fn with(mut self, sink: Arc<dyn Sink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl Sink for MultiSink {
    fn emit(&self, severity: Severity, message: &str, metadata: &Metadata) {
        for sink in &self.sinks {
            sink.emit(severity, message, metadata);
        }
    }

    fn flush(&self) -> Result<()> {
        // Flush every sink even if an earlier one fails
        let mut first_error = None;
        for sink in &self.sinks {
            if let Err(e) = sink.flush() {
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

/// Colon-joined prefix identifying where a record came from
///
/// Parts appear in a fixed order (app name, pid, context name, context id,
/// module name) and empty parts are skipped.
pub fn format_prefix(metadata: &Metadata) -> String {
    let pid = metadata.pid.to_string();
    [
        metadata.app_name.as_deref(),
        Some(pid.as_str()),
        metadata.context_name.as_deref(),
        metadata.context_id.as_deref(),
        metadata.module_name.as_deref(),
    ]
    .into_iter()
    .flatten()
    .filter(|part| !part.is_empty())
    .collect::<Vec<_>>()
    .join(":")
}

/// Format a record as `HH:MM:SS:mmm SEVERITY prefix message`
pub fn format_line<Tz>(
    time: &DateTime<Tz>,
    severity: Severity,
    message: &str,
    metadata: &Metadata,
) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let timestamp = time.format("%H:%M:%S:%3f");
    let prefix = format_prefix(metadata);
    if prefix.is_empty() {
        format!("{timestamp} {} {message}", severity.label())
    } else {
        format!("{timestamp} {} {prefix} {message}", severity.label())
    }
}
