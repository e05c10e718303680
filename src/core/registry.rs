//! Token registry
//!
//! A small container mapping typed tokens to shared singleton values. The
//! host application owns one `Registry` (usually as `Arc<Registry>`) and hands
//! it to whatever needs to look services up.

use fxhash::FxHashMap;
use parking_lot::RwLock;
use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use thiserror::Error;

/// Token identifier type
///
/// Id 0 is reserved for the unset token.
pub type TokenId = usize;

// Global counter for generating unique token IDs
static NEXT_TOKEN_ID: AtomicUsize = AtomicUsize::new(1);

/// Errors returned by [`Registry`] operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Registering under the unset token
    #[error("Invalid token: cannot register a value under an unset token")]
    InvalidToken,

    /// Resolving a token nothing was registered under
    #[error("Service not found: {token}")]
    ServiceNotFound { token: String },

    /// The stored value is not of the token's type
    #[error("Type mismatch for token: {token}")]
    TypeMismatch { token: String },
}

/// Typed key into a [`Registry`]
///
/// Tokens compare by identity: every call to [`Token::new`] yields a distinct
/// key even when the display names are equal.
pub struct Token<T> {
    id: TokenId,
    name: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Token<T> {
    /// Create a new token with a fresh identity
    pub fn new(name: &'static str) -> Self {
        Token {
            id: NEXT_TOKEN_ID.fetch_add(1, Ordering::SeqCst),
            name,
            _marker: PhantomData,
        }
    }

    /// The unset token; nothing can be registered under it
    pub const fn unset() -> Self {
        Token {
            id: 0,
            name: "<unset>",
            _marker: PhantomData,
        }
    }

    pub fn id(&self) -> TokenId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_unset(&self) -> bool {
        self.id == 0
    }
}

impl<T> Default for Token<T> {
    fn default() -> Self {
        Self::unset()
    }
}

// Manual impls: derives would require `T: Clone` etc.
impl<T> Clone for Token<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Token<T> {}

impl<T> PartialEq for Token<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for Token<T> {}

impl<T> fmt::Debug for Token<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Token({}#{})", self.name, self.id)
    }
}

impl<T> fmt::Display for Token<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.name, self.id)
    }
}

type Entry = Arc<dyn Any + Send + Sync>;

/// Container of registered singletons keyed by token identity
#[derive(Default)]
pub struct Registry {
    entries: RwLock<FxHashMap<TokenId, Entry>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a value, replacing whatever was registered under the token
    ///
    /// # Errors
    /// Returns [`RegistryError::InvalidToken`] for the unset token.
    pub fn register<T>(&self, token: &Token<T>, value: Arc<T>) -> Result<(), RegistryError>
    where
        T: Send + Sync + 'static,
    {
        if token.is_unset() {
            return Err(RegistryError::InvalidToken);
        }
        self.entries.write().insert(token.id, value);
        Ok(())
    }

    /// Resolve a registered value
    ///
    /// # Errors
    /// Returns [`RegistryError::ServiceNotFound`] if nothing is registered
    /// under the token.
    pub fn resolve<T>(&self, token: &Token<T>) -> Result<Arc<T>, RegistryError>
    where
        T: Send + Sync + 'static,
    {
        let entry = self
            .entries
            .read()
            .get(&token.id)
            .cloned()
            .ok_or_else(|| RegistryError::ServiceNotFound {
                token: token.to_string(),
            })?;

        entry
            .downcast::<T>()
            .map_err(|_| RegistryError::TypeMismatch {
                token: token.to_string(),
            })
    }

    /// Resolve a registered value, or `None` if there is none
    pub fn try_resolve<T>(&self, token: &Token<T>) -> Option<Arc<T>>
    where
        T: Send + Sync + 'static,
    {
        self.resolve(token).ok()
    }

    /// Resolve the value under `token`, registering `init()` first if absent
    ///
    /// The check and the insert happen under one write lock. The returned
    /// flag is `true` when `init` was called.
    ///
    /// # Errors
    /// Returns [`RegistryError::InvalidToken`] for the unset token and
    /// [`RegistryError::TypeMismatch`] if the existing value has another type.
    pub fn resolve_or_register_with<T, F>(
        &self,
        token: &Token<T>,
        init: F,
    ) -> Result<(Arc<T>, bool), RegistryError>
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> Arc<T>,
    {
        if token.is_unset() {
            return Err(RegistryError::InvalidToken);
        }

        let mut entries = self.entries.write();
        if let Some(existing) = entries.get(&token.id) {
            let value = existing
                .clone()
                .downcast::<T>()
                .map_err(|_| RegistryError::TypeMismatch {
                    token: token.to_string(),
                })?;
            return Ok((value, false));
        }

        let value = init();
        entries.insert(token.id, value.clone());
        Ok((value, true))
    }

    /// Check whether anything is registered under the token
    pub fn contains<T>(&self, token: &Token<T>) -> bool {
        self.entries.read().contains_key(&token.id)
    }

    /// Remove the value registered under the token, returning it
    pub fn unregister<T>(&self, token: &Token<T>) -> Option<Arc<T>>
    where
        T: Send + Sync + 'static,
    {
        let entry = self.entries.write().remove(&token.id)?;
        entry.downcast::<T>().ok()
    }

    /// Number of registered values
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("entries", &self.len())
            .finish()
    }
}
