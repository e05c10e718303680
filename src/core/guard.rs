use crate::core::handle::current_backend;
use crate::core::registry::Registry;
use crate::core::service::LoggerService;
use crate::core::types::{FilterConfig, FilterOverride};
use std::sync::Arc;

/// Temporarily overrides the active backend's filter configuration
///
/// The override is layered over the configuration in effect at construction
/// (each overridden field replaces the saved one wholesale). When the guard
/// is dropped the saved configuration is stored back as-is, discarding any
/// change made in between, including by other guards. Nested guards must
/// therefore be dropped in reverse order of creation.
///
/// With no backend registered the guard does nothing.
#[must_use = "the override is undone when the guard is dropped"]
pub struct ConfigGuard {
    target: Option<(Arc<LoggerService>, Arc<FilterConfig>)>,
}

impl ConfigGuard {
    /// Apply `overrides` to the currently registered backend
    pub fn new(registry: &Registry, overrides: FilterOverride) -> Self {
        let target = current_backend(registry).map(|service| {
            let saved = service.update_config(|current| current.merged(&overrides));
            (service, saved)
        });
        ConfigGuard { target }
    }

    /// Disable the named modules for the guard's lifetime
    pub fn disable<I, S>(registry: &Registry, module_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(registry, FilterOverride::disabled(module_names))
    }

    /// Enable only the named modules for the guard's lifetime
    ///
    /// A disabled set already in effect is left in place and still wins
    /// over the enabled set.
    pub fn enable_only<I, S>(registry: &Registry, module_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(registry, FilterOverride::enabled(module_names))
    }

    /// Whether a backend was found and overridden
    pub fn is_active(&self) -> bool {
        self.target.is_some()
    }

    /// The configuration that will be restored
    pub fn saved_config(&self) -> Option<&Arc<FilterConfig>> {
        self.target.as_ref().map(|(_, saved)| saved)
    }

    /// Restore the saved configuration now
    pub fn dispose(self) {
        drop(self)
    }
}

impl Drop for ConfigGuard {
    fn drop(&mut self) {
        if let Some((service, saved)) = self.target.take() {
            service.configure_shared(saved);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::handle::register_backend;
    use crate::core::sink::Sink;
    use crate::core::types::{Metadata, Severity, module_set};

    fn registered() -> (Registry, Arc<LoggerService>) {
        let registry = Registry::new();
        let sink: Arc<dyn Sink> = Arc::new(|_: Severity, _: &str, _: &Metadata| {});
        let service = Arc::new(LoggerService::new(sink));
        register_backend(&registry, service.clone()).unwrap();
        (registry, service)
    }

    #[test]
    fn test_override_and_restore() {
        let (registry, service) = registered();
        let before = service.config();

        let guard = ConfigGuard::disable(&registry, ["db"]);
        assert!(guard.is_active());
        assert!(service.is_disabled("db"));

        guard.dispose();
        assert!(Arc::ptr_eq(&service.config(), &before));
    }

    #[test]
    fn test_restore_discards_intervening_changes() {
        let (registry, service) = registered();
        service.configure(FilterConfig {
            verbose: true,
            ..Default::default()
        });
        let before = service.config();

        {
            let _guard = ConfigGuard::enable_only(&registry, ["a"]);
            service.configure(FilterConfig {
                disabled_modules: Some(module_set(["x"])),
                ..Default::default()
            });
        }

        assert!(Arc::ptr_eq(&service.config(), &before));
        assert!(service.is_verbose());
    }

    #[test]
    fn test_override_keeps_unspecified_fields() {
        let (registry, service) = registered();
        service.configure(FilterConfig {
            disabled_modules: Some(module_set(["a"])),
            verbose: true,
            ..Default::default()
        });

        let _guard = ConfigGuard::enable_only(&registry, ["a", "b"]);
        let active = service.config();

        assert_eq!(active.enabled_modules, Some(module_set(["a", "b"])));
        assert_eq!(active.disabled_modules, Some(module_set(["a"])));
        assert!(active.verbose);
    }

    #[test]
    fn test_no_backend_is_inert() {
        let registry = Registry::new();
        let guard = ConfigGuard::disable(&registry, ["db"]);
        assert!(!guard.is_active());
        assert!(guard.saved_config().is_none());
        guard.dispose();
    }
}
