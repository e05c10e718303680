//! Per-module logging entry points
//!
//! A [`ModuleLogger`] is cheap to create and can exist before any backend is
//! registered. It binds to the registry's [`LoggerHandle`] the first time it
//! logs and keeps that binding, so later backend swaps reach it through the
//! handle.
//!
//! # Binding
//!
//! ```text
//! Unbound --first log call--> Active    (handle found, module not disabled)
//!                        \--> Disabled  (module disabled, or no backend and
//!                                        BindPolicy::Permanent)
//! ```
//!
//! `Active` and `Disabled` are final unless [`ModuleLogger::rebind`] is
//! called. Whether a module is disabled is decided once, at bind time.

use crate::core::handle::{LoggerHandle, current_backend, resolve_handle};
use crate::core::registry::Registry;
use crate::core::types::{Metadata, Severity};
use crate::core::value::{LogValue, render_values};
use arc_swap::ArcSwap;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

/// What a module logger does when it finds no backend at bind time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BindPolicy {
    /// Give up for good: the logger stays disabled even if a backend is
    /// registered later
    #[default]
    Permanent,
    /// Stay unbound and try again on the next call
    Retry,
}

/// Observable binding state of a [`ModuleLogger`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindState {
    Unbound,
    Active,
    Disabled,
}

enum Binding {
    Unbound,
    Active(Arc<LoggerHandle>),
    Disabled,
}

/// Minimal logging capability handed to consumers
pub trait Logger {
    /// Log the values at the given severity, as one line
    fn log(&self, severity: Severity, values: &[LogValue]);

    fn debug(&self, values: &[LogValue]) {
        self.log(Severity::Debug, values)
    }

    fn warn(&self, values: &[LogValue]) {
        self.log(Severity::Warn, values)
    }

    fn error(&self, values: &[LogValue]) {
        self.log(Severity::Error, values)
    }
}

/// Logger scoped to one module name
pub struct ModuleLogger {
    name: String,
    registry: Arc<Registry>,
    policy: BindPolicy,
    binding: ArcSwap<Binding>,
    // Serialises Unbound -> bound transitions only
    bind_lock: Mutex<()>,
}

impl ModuleLogger {
    /// Create an unbound logger for `name`
    pub fn new(registry: &Arc<Registry>, name: impl Into<String>) -> Self {
        ModuleLogger {
            name: name.into(),
            registry: Arc::clone(registry),
            policy: BindPolicy::default(),
            binding: ArcSwap::from_pointee(Binding::Unbound),
            bind_lock: Mutex::new(()),
        }
    }

    /// Choose what happens when no backend is found at bind time
    pub fn with_policy(mut self, policy: BindPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn policy(&self) -> BindPolicy {
        self.policy
    }

    pub fn state(&self) -> BindState {
        match &**self.binding.load() {
            Binding::Unbound => BindState::Unbound,
            Binding::Active(_) => BindState::Active,
            Binding::Disabled => BindState::Disabled,
        }
    }

    /// Drop the current binding; the next call binds again from scratch
    pub fn rebind(&self) {
        self.binding.store(Arc::new(Binding::Unbound));
    }

    /// Whether the backend this logger would write to runs verbose
    ///
    /// Does not bind the logger.
    pub fn is_verbose(&self) -> bool {
        match &**self.binding.load() {
            Binding::Active(handle) => handle.current().is_verbose(),
            Binding::Disabled => false,
            Binding::Unbound => {
                current_backend(&self.registry).is_some_and(|backend| backend.is_verbose())
            }
        }
    }

    /// Log with a context (request, job, ...) added to the record
    pub fn log_with_context(
        &self,
        severity: Severity,
        context_name: &str,
        context_id: &str,
        values: &[LogValue],
    ) {
        let metadata = Metadata::for_module(&self.name).with_context(context_name, context_id);
        self.emit(severity, values, metadata);
    }

    fn emit(&self, severity: Severity, values: &[LogValue], metadata: Metadata) {
        match &**self.binding.load() {
            Binding::Active(handle) => handle.log(severity, &render_values(values), metadata),
            Binding::Disabled => {}
            Binding::Unbound => {
                if let Some(handle) = self.bind() {
                    handle.log(severity, &render_values(values), metadata);
                }
            }
        }
    }

    /// Decide the binding, once, for an unbound logger
    fn bind(&self) -> Option<Arc<LoggerHandle>> {
        let _bind = self.bind_lock.lock();
        // Another thread may have bound while we waited
        match &**self.binding.load() {
            Binding::Active(handle) => return Some(Arc::clone(handle)),
            Binding::Disabled => return None,
            Binding::Unbound => {}
        }

        let (next, handle) = match resolve_handle(&self.registry) {
            Some(handle) if handle.current().is_disabled(&self.name) => (Binding::Disabled, None),
            Some(handle) => (Binding::Active(Arc::clone(&handle)), Some(handle)),
            None if self.policy == BindPolicy::Permanent => (Binding::Disabled, None),
            None => return None,
        };
        self.binding.store(Arc::new(next));
        handle
    }
}

impl Logger for ModuleLogger {
    fn log(&self, severity: Severity, values: &[LogValue]) {
        self.emit(severity, values, Metadata::for_module(&self.name));
    }
}

impl PartialEq for ModuleLogger {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for ModuleLogger {}

impl fmt::Debug for ModuleLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleLogger")
            .field("name", &self.name)
            .field("policy", &self.policy)
            .field("state", &self.state())
            .finish()
    }
}

/// Log values at debug severity: `debug!(logger, "loaded", count, "items")`
#[macro_export]
macro_rules! debug {
    ($logger:expr $(, $value:expr)* $(,)?) => {{
        use $crate::Logger as _;
        $logger.debug(&[$($crate::LogValue::from($value)),*])
    }};
}

/// Log values at warn severity
#[macro_export]
macro_rules! warn {
    ($logger:expr $(, $value:expr)* $(,)?) => {{
        use $crate::Logger as _;
        $logger.warn(&[$($crate::LogValue::from($value)),*])
    }};
}

/// Log values at error severity
#[macro_export]
macro_rules! error {
    ($logger:expr $(, $value:expr)* $(,)?) => {{
        use $crate::Logger as _;
        $logger.error(&[$($crate::LogValue::from($value)),*])
    }};
}
