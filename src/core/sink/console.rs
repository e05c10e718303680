use super::{Sink, format_line};
use crate::core::types::{Metadata, Severity};
use anyhow::{Context, Result};
use chrono::Local;
use std::io::{self, Write};

const RESET: &str = "\x1b[0m";

fn color(severity: Severity) -> &'static str {
    match severity {
        Severity::Debug => "\x1b[36m",
        Severity::Warn => "\x1b[33m",
        Severity::Error => "\x1b[31m",
    }
}

/// Writes formatted lines to standard output
///
/// The severity word is wrapped in ANSI colour codes unless colour is
/// turned off.
#[derive(Debug, Clone)]
pub struct ConsoleSink {
    colored: bool,
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsoleSink {
    /// Create a console sink with coloured output
    pub fn new() -> Self {
        ConsoleSink { colored: true }
    }

    /// Turn colouring on or off
    pub fn colored(mut self, colored: bool) -> Self {
        self.colored = colored;
        self
    }

    /// Render a record the way this sink prints it
    pub fn render(&self, severity: Severity, message: &str, metadata: &Metadata) -> String {
        let line = format_line(&Local::now(), severity, message, metadata);
        if !self.colored {
            return line;
        }
        // The label always follows the fixed-width timestamp and a space
        let label = severity.label();
        match line.split_once(' ') {
            Some((time, rest)) => match rest.strip_prefix(label) {
                Some(tail) => format!("{time} {}{label}{RESET}{tail}", color(severity)),
                None => line,
            },
            None => line,
        }
    }
}

impl Sink for ConsoleSink {
    fn emit(&self, severity: Severity, message: &str, metadata: &Metadata) {
        let line = self.render(severity, message, metadata);
        let mut out = io::stdout().lock();
        if let Err(e) = writeln!(out, "{line}") {
            eprintln!("Console sink write error: {e:?}");
        }
    }

    fn flush(&self) -> Result<()> {
        io::stdout().flush().context("Failed to flush stdout")
    }
}
