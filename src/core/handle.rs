//! Indirection between module loggers and the active backend
//!
//! Module loggers hold on to a [`LoggerHandle`], never to a backend directly.
//! Registering a new backend swaps the handle's contents, so every logger
//! bound earlier follows the swap without being recreated.

use crate::core::registry::{Registry, RegistryError, Token};
use crate::core::service::LoggerService;
use crate::core::types::{Metadata, Severity};
use arc_swap::ArcSwap;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

lazy_static::lazy_static! {
    /// Token under which the shared [`LoggerHandle`] is registered
    pub static ref LOGGER_HANDLE: Token<LoggerHandle> = Token::new("logger-handle");
    /// Token under which the active backend itself is registered, for
    /// consumers that resolve the service directly
    pub static ref LOGGER_SERVICE: Token<LoggerService> = Token::new("logger-service");
    // Keeps the handle swap and the LOGGER_SERVICE entry in step
    static ref REGISTER_LOCK: Mutex<()> = Mutex::new(());
}

/// Atomically swappable reference to the current backend
pub struct LoggerHandle {
    current: ArcSwap<LoggerService>,
}

impl LoggerHandle {
    pub fn new(service: Arc<LoggerService>) -> Self {
        LoggerHandle {
            current: ArcSwap::new(service),
        }
    }

    /// The backend records are routed to right now
    pub fn current(&self) -> Arc<LoggerService> {
        self.current.load_full()
    }

    /// Hand one record to the current backend
    pub fn log(&self, severity: Severity, message: &str, metadata: Metadata) {
        self.current.load().log(severity, message, metadata)
    }

    /// Route all future records to `service`, returning the previous backend
    pub fn replace(&self, service: Arc<LoggerService>) -> Arc<LoggerService> {
        self.current.swap(service)
    }
}

impl fmt::Debug for LoggerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoggerHandle")
            .field("current", &self.current.load_full())
            .finish()
    }
}

/// Make `service` the active backend
///
/// The first call creates the handle and registers it; later calls only swap
/// the handle's backend, so the handle in the registry is never replaced.
/// The service is also registered under [`LOGGER_SERVICE`]. Concurrent
/// registrations are serialised, so that entry always names the same backend
/// as the handle.
///
/// # Errors
/// Propagates registry errors; with the built-in tokens none are expected.
pub fn register_backend(
    registry: &Registry,
    service: Arc<LoggerService>,
) -> Result<(), RegistryError> {
    let _registering = REGISTER_LOCK.lock();
    let (handle, created) =
        registry.resolve_or_register_with(&*LOGGER_HANDLE, || {
            Arc::new(LoggerHandle::new(service.clone()))
        })?;
    if !created {
        handle.replace(service.clone());
    }
    registry.register(&*LOGGER_SERVICE, service)
}

/// Find a handle to log through
///
/// Prefers the registered handle. If only a bare service is registered, wraps
/// it in a fresh handle that nothing else shares.
pub fn resolve_handle(registry: &Registry) -> Option<Arc<LoggerHandle>> {
    registry.try_resolve(&*LOGGER_HANDLE).or_else(|| {
        registry
            .try_resolve(&*LOGGER_SERVICE)
            .map(|service| Arc::new(LoggerHandle::new(service)))
    })
}

/// The backend currently in effect, if any
pub fn current_backend(registry: &Registry) -> Option<Arc<LoggerService>> {
    match registry.try_resolve(&*LOGGER_HANDLE) {
        Some(handle) => Some(handle.current()),
        None => registry.try_resolve(&*LOGGER_SERVICE),
    }
}
