use fxhash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::fmt;

lazy_static::lazy_static! {
    // Captured once, the first time any record is stamped
    static ref PROCESS_ID: u32 = std::process::id();
}

/// Get the identifier of the current process
pub fn process_id() -> u32 {
    *PROCESS_ID
}

/// Severity of a log record
///
/// Only three severities exist; there is no level threshold, filtering is
/// done by module name.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Diagnostic output for developers
    Debug,
    /// Something unexpected that the application recovered from
    Warn,
    /// A failure the application could not handle
    Error,
}

impl Severity {
    /// Lowercase name, as passed to sinks
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Debug => "debug",
            Severity::Warn => "warn",
            Severity::Error => "error",
        }
    }

    /// Uppercase label used in formatted lines
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Debug => "DEBUG",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Metadata travelling with a record from the caller to the sink
///
/// Callers fill in `module_name` and the optional context fields; the
/// backend stamps `app_name` and `pid` before emitting.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Metadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_name: Option<String>,
    pub pid: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_id: Option<String>,
}

impl Metadata {
    /// Metadata for a record coming from the named module
    pub fn for_module(name: impl Into<String>) -> Self {
        Metadata {
            module_name: Some(name.into()),
            ..Default::default()
        }
    }

    /// Attach a context name and id (e.g. a request or job)
    pub fn with_context(mut self, name: impl Into<String>, id: impl Into<String>) -> Self {
        self.context_name = Some(name.into());
        self.context_id = Some(id.into());
        self
    }
}

/// Filtering configuration of a backend
///
/// When both sets are present the disabled set wins: a module listed there is
/// dropped even if it is also enabled.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FilterConfig {
    #[serde(default)]
    pub enabled_modules: Option<FxHashSet<String>>,
    #[serde(default)]
    pub disabled_modules: Option<FxHashSet<String>>,
    #[serde(default)]
    pub verbose: bool,
}

impl FilterConfig {
    /// Whether a record from `module_name` passes this filter
    pub fn allows(&self, module_name: &str) -> bool {
        if let Some(disabled) = &self.disabled_modules {
            if disabled.contains(module_name) {
                return false;
            }
        } else if let Some(enabled) = &self.enabled_modules
            && !enabled.contains(module_name)
        {
            return false;
        }
        true
    }

    /// Whether `module_name` is in the disabled set
    pub fn is_disabled(&self, module_name: &str) -> bool {
        self.disabled_modules
            .as_ref()
            .is_some_and(|set| set.contains(module_name))
    }

    /// Layer `overrides` on top of this configuration
    ///
    /// Each field present in `overrides` replaces the corresponding field
    /// wholesale; absent fields keep their current value.
    pub fn merged(&self, overrides: &FilterOverride) -> FilterConfig {
        FilterConfig {
            enabled_modules: overrides
                .enabled_modules
                .clone()
                .unwrap_or_else(|| self.enabled_modules.clone()),
            disabled_modules: overrides
                .disabled_modules
                .clone()
                .unwrap_or_else(|| self.disabled_modules.clone()),
            verbose: overrides.verbose.unwrap_or(self.verbose),
        }
    }
}

/// Partial filter configuration applied by a [`ConfigGuard`](crate::ConfigGuard)
///
/// The outer `Option` says whether the field is overridden at all; for the
/// module sets the inner `Option` is the new value, so `Some(None)` clears a set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterOverride {
    pub enabled_modules: Option<Option<FxHashSet<String>>>,
    pub disabled_modules: Option<Option<FxHashSet<String>>>,
    pub verbose: Option<bool>,
}

impl FilterOverride {
    /// Override that replaces the disabled set
    pub fn disabled<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FilterOverride {
            disabled_modules: Some(Some(module_set(names))),
            ..Default::default()
        }
    }

    /// Override that replaces the enabled set
    pub fn enabled<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FilterOverride {
            enabled_modules: Some(Some(module_set(names))),
            ..Default::default()
        }
    }

    /// Also override the verbose flag
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = Some(verbose);
        self
    }
}

/// Collect module names into a set
pub fn module_set<I, S>(names: I) -> FxHashSet<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    names.into_iter().map(Into::into).collect()
}
