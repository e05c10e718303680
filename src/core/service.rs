use crate::core::sink::Sink;
use crate::core::types::{FilterConfig, Metadata, Severity, process_id};
use anyhow::Result;
use arc_swap::ArcSwap;
use std::fmt;
use std::sync::Arc;

/// Backend logger: filters records by module and hands them to a sink
///
/// The filter configuration can be replaced at any time; the sink is fixed
/// at construction. Reading the configuration on the logging path never
/// takes a lock.
pub struct LoggerService {
    app_name: Option<String>,
    config: ArcSwap<FilterConfig>,
    sink: Arc<dyn Sink>,
}

impl LoggerService {
    /// Create a backend with an empty filter configuration
    pub fn new(sink: Arc<dyn Sink>) -> Self {
        Self::with_config(sink, FilterConfig::default())
    }

    /// Create a backend with an initial filter configuration
    pub fn with_config(sink: Arc<dyn Sink>, config: FilterConfig) -> Self {
        LoggerService {
            app_name: None,
            config: ArcSwap::from_pointee(config),
            sink,
        }
    }

    /// Set the application name stamped on every record
    pub fn app_name(mut self, name: impl Into<String>) -> Self {
        self.app_name = Some(name.into());
        self
    }

    pub fn get_app_name(&self) -> Option<&str> {
        self.app_name.as_deref()
    }

    /// Filter and emit one record
    ///
    /// Records whose module is filtered out are dropped silently. Surviving
    /// records get the app name and process id stamped before the sink sees
    /// them.
    pub fn log(&self, severity: Severity, message: &str, mut metadata: Metadata) {
        if let Some(module_name) = metadata.module_name.as_deref()
            && !self.config.load().allows(module_name)
        {
            return;
        }

        if let Some(app_name) = &self.app_name {
            metadata.app_name = Some(app_name.clone());
        }
        metadata.pid = process_id();

        self.sink.emit(severity, message, &metadata);
    }

    /// Replace the whole filter configuration
    pub fn configure(&self, config: FilterConfig) {
        self.config.store(Arc::new(config));
    }

    /// Store an already shared configuration, keeping its identity
    pub(crate) fn configure_shared(&self, config: Arc<FilterConfig>) {
        self.config.store(config);
    }

    /// Atomically replace the configuration with `update(current)`
    ///
    /// Returns the configuration that was replaced.
    pub(crate) fn update_config<F>(&self, update: F) -> Arc<FilterConfig>
    where
        F: Fn(&FilterConfig) -> FilterConfig,
    {
        self.config.rcu(|current| Arc::new(update(&**current)))
    }

    /// The active filter configuration
    pub fn config(&self) -> Arc<FilterConfig> {
        self.config.load_full()
    }

    /// Whether `module_name` is currently in the disabled set
    pub fn is_disabled(&self, module_name: &str) -> bool {
        self.config.load().is_disabled(module_name)
    }

    /// Add modules to the disabled set
    pub fn disable<I, S>(&self, module_names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = module_names.into_iter().map(Into::into).collect();
        if names.is_empty() {
            return;
        }
        self.update_config(|current| {
            let mut next = current.clone();
            next.disabled_modules
                .get_or_insert_with(Default::default)
                .extend(names.iter().cloned());
            next
        });
    }

    pub fn is_verbose(&self) -> bool {
        self.config.load().verbose
    }

    /// Flush the sink
    pub fn flush(&self) -> Result<()> {
        self.sink.flush()
    }
}

impl fmt::Debug for LoggerService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoggerService")
            .field("app_name", &self.app_name)
            .field("config", &self.config.load_full())
            .finish_non_exhaustive()
    }
}
