// Core types
pub mod types;
pub use types::*;

// Loggable values
pub mod value;

// Token registry
pub mod registry;

// Emit targets
pub mod sink;

// Backend logger and the handle module loggers bind to
pub mod handle;
pub mod service;

// Per-module loggers
pub mod module_logger;

// Scoped configuration overrides
pub mod guard;

use anyhow::{Context, Result};
use fxhash::FxHashSet;
use handle::register_backend;
use registry::Registry;
use service::LoggerService;
#[cfg(feature = "file-sink")]
use sink::FileSinkConfig;
use sink::{ConsoleSink, MultiSink, Sink};
#[cfg(feature = "file-sink")]
use std::path::PathBuf;
use std::sync::Arc;

/// Logging setup, applied once at startup
pub struct Logging {
    app_name: Option<String>,
    console: bool,
    colored: bool,
    #[cfg(feature = "file-sink")]
    file: Option<FileSinkConfig>,
    sinks: Vec<Arc<dyn Sink>>,
    config: FilterConfig,
}

impl Default for Logging {
    fn default() -> Self {
        Self::new()
    }
}

impl Logging {
    /// Create a new setup with default settings
    ///
    /// By default:
    /// - Coloured console output is on
    /// - No log file is written
    /// - Every module is enabled
    pub fn new() -> Self {
        Logging {
            app_name: None,
            console: true,
            colored: true,
            #[cfg(feature = "file-sink")]
            file: None,
            sinks: Vec::new(),
            config: FilterConfig::default(),
        }
    }

    /// Name stamped on every record
    pub fn app_name(mut self, name: impl Into<String>) -> Self {
        self.app_name = Some(name.into());
        self
    }

    /// Turn console output on or off
    pub fn console(mut self, enabled: bool) -> Self {
        self.console = enabled;
        self
    }

    /// Turn ANSI colours on the console on or off
    pub fn colored(mut self, colored: bool) -> Self {
        self.colored = colored;
        self
    }

    /// Also write to a rotating log file
    ///
    /// # Arguments
    /// * `path` - Path to the active log file. Rotated files get `.1`, `.2`, ...
    ///   appended to it.
    ///
    /// # Returns
    /// The builder for method chaining
    #[cfg(feature = "file-sink")]
    pub fn with_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.file = Some(FileSinkConfig::new(path.into()));
        self
    }

    /// Write to a log file with custom rotation limits
    #[cfg(feature = "file-sink")]
    pub fn with_file_config(mut self, config: FileSinkConfig) -> Self {
        self.file = Some(config);
        self
    }

    /// Add a custom sink next to the built-in ones
    pub fn with_sink(mut self, sink: Arc<dyn Sink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Only emit records from these modules
    ///
    /// Replaces any set passed to an earlier `enable` call. A disabled set,
    /// if one is configured, still takes precedence.
    pub fn enable<I, S>(mut self, module_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.enabled_modules = Some(module_set(module_names));
        self
    }

    /// Never emit records from these modules
    ///
    /// Adds to the modules disabled by earlier `disable` calls.
    pub fn disable<I, S>(mut self, module_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config
            .disabled_modules
            .get_or_insert_with(FxHashSet::default)
            .extend(module_names.into_iter().map(Into::into));
        self
    }

    /// Mark the backend as verbose; callers can check it with `is_verbose`
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.config.verbose = verbose;
        self
    }

    /// Build the backend without registering it
    ///
    /// # Errors
    /// Returns an error if the log file could not be opened
    pub fn build(self) -> Result<LoggerService> {
        let mut sinks = MultiSink::new();
        if self.console {
            sinks = sinks.with(Arc::new(ConsoleSink::new().colored(self.colored)));
        }
        #[cfg(feature = "file-sink")]
        if let Some(file) = self.file {
            let path = file.path.clone();
            let sink = sink::FileSink::new(file)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            sinks = sinks.with(Arc::new(sink));
        }
        for sink in self.sinks {
            sinks = sinks.with(sink);
        }

        let service = LoggerService::with_config(Arc::new(sinks), self.config);
        Ok(match self.app_name {
            Some(name) => service.app_name(name),
            None => service,
        })
    }

    /// Build the backend and make it the active one in `registry`
    ///
    /// Module loggers created earlier pick it up on their next call, unless
    /// they already gave up binding.
    ///
    /// # Errors
    /// Returns an error if the log file could not be opened
    pub fn start(self, registry: &Registry) -> Result<Arc<LoggerService>> {
        let service = Arc::new(self.build()?);
        register_backend(registry, Arc::clone(&service))
            .context("Failed to register logger backend")?;
        Ok(service)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::handle::current_backend;

    #[test]
    fn test_builder_config() {
        let service = Logging::new()
            .console(false)
            .app_name("svc")
            .enable(["api", "db"])
            .disable(["db"])
            .disable(["cache"])
            .verbose(true)
            .build()
            .unwrap();

        let config = service.config();
        assert_eq!(service.get_app_name(), Some("svc"));
        assert_eq!(config.enabled_modules, Some(module_set(["api", "db"])));
        assert_eq!(config.disabled_modules, Some(module_set(["db", "cache"])));
        assert!(config.verbose);
    }

    #[test]
    fn test_enable_replaces_disable_extends() {
        let service = Logging::new()
            .console(false)
            .enable(["a"])
            .enable(["b"])
            .disable(["x"])
            .disable(["y"])
            .build()
            .unwrap();

        let config = service.config();
        assert_eq!(config.enabled_modules, Some(module_set(["b"])));
        assert_eq!(config.disabled_modules, Some(module_set(["x", "y"])));
        assert!(!config.verbose);
    }

    #[test]
    fn test_start_registers_backend() {
        let registry = Registry::new();
        let service = Logging::new().console(false).start(&registry).unwrap();

        let active = current_backend(&registry).unwrap();
        assert!(Arc::ptr_eq(&active, &service));
    }

    #[cfg(feature = "file-sink")]
    #[test]
    fn test_start_with_file() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let log_path = temp_dir.path().join("logs").join("svc.log");
        let registry = Registry::new();

        let service = Logging::new()
            .console(false)
            .app_name("svc")
            .with_file(&log_path)
            .start(&registry)
            .unwrap();
        service.log(Severity::Warn, "written", Metadata::for_module("io"));
        service.flush().unwrap();

        let contents = std::fs::read_to_string(&log_path).unwrap();
        assert!(contents.contains(&format!("WARN svc:{}:io written", process_id())));
    }
}
