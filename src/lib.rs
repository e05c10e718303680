//! # logbind
//!
//! Module-scoped logging with a backend that can be swapped at runtime.
//!
//! Application modules create cheap [`ModuleLogger`]s by name. Each one binds
//! lazily to a shared [`LoggerHandle`] kept in a [`Registry`]; replacing the
//! backend only swaps what the handle points at, so loggers created earlier
//! keep working and follow the new backend.
//!
//! ## Features
//!
//! - Enable/disable filtering by module name
//! - Scoped filter overrides that restore themselves ([`ConfigGuard`])
//! - Console sink with coloured severities
//! - Size-rotated file sink (cargo feature `file-sink`, on by default)
//! - A small typed token registry for wiring services together
//!
//! ## Example
//!
//! ```rust
//! use logbind::{Logging, ModuleLogger, Registry};
//! use std::sync::Arc;
//!
//! let registry = Arc::new(Registry::new());
//! let db = ModuleLogger::new(&registry, "db");
//!
//! Logging::new()
//!     .app_name("shop")
//!     .disable(["cache"])
//!     .start(&registry)
//!     .expect("Failed to start logging");
//!
//! logbind::warn!(db, "slow query:", 1250, "ms");
//! ```

mod core;
pub use core::{
    FilterConfig, FilterOverride, Logging, Metadata, Severity,
    guard::ConfigGuard,
    handle::{
        LOGGER_HANDLE, LOGGER_SERVICE, LoggerHandle, current_backend, register_backend,
        resolve_handle,
    },
    module_logger::{BindPolicy, BindState, Logger, ModuleLogger},
    module_set, process_id,
    registry::{Registry, RegistryError, Token, TokenId},
    service::LoggerService,
    sink::{ConsoleSink, MultiSink, Sink, format_line, format_prefix},
    value::{LogValue, render_values},
};
#[cfg(feature = "file-sink")]
pub use core::sink::{DEFAULT_MAX_BYTES, DEFAULT_MAX_FILES, FileSink, FileSinkConfig};
