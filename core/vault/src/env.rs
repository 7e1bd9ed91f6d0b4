//! Environment lookup service consumed by environment-backed key sources.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use secretary_common::{Error, Result};

/// Read-only key/value lookup for environment variables.
pub trait Environment: Send + Sync {
    /// Look up a variable, returning `None` when it is not set.
    fn lookup(&self, name: &str) -> Option<String>;

    /// Look up a variable, telling an unset variable apart from an unusable value.
    ///
    /// # Errors
    /// - `EnvironmentVariableNotUnicode` if the value is set but not Unicode
    fn try_lookup(&self, name: &str) -> Result<Option<String>> {
        Ok(self.lookup(name))
    }
}

/// The current process environment.
///
/// [`Environment::lookup`] treats a value that is not Unicode as unset;
/// [`Environment::try_lookup`] reports it instead.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnvironment;

impl Environment for ProcessEnvironment {
    fn lookup(&self, name: &str) -> Option<String> {
        self.try_lookup(name).ok().flatten()
    }

    fn try_lookup(&self, name: &str) -> Result<Option<String>> {
        match std::env::var_os(name) {
            None => Ok(None),
            Some(value) => value
                .into_string()
                .map(Some)
                .map_err(|_| Error::EnvironmentVariableNotUnicode(name.to_string())),
        }
    }
}

/// In-memory environment.
///
/// Useful where the process environment must not be touched, such as
/// concurrently running tests.
#[derive(Debug, Default)]
pub struct MemoryEnvironment {
    vars: RwLock<HashMap<String, String>>,
}

impl MemoryEnvironment {
    /// Create an empty environment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a variable.
    pub fn set(&self, name: impl Into<String>, value: impl Into<String>) {
        let mut vars = self.vars.write().unwrap_or_else(|e| e.into_inner());
        vars.insert(name.into(), value.into());
    }

    /// Remove a variable.
    pub fn remove(&self, name: &str) {
        let mut vars = self.vars.write().unwrap_or_else(|e| e.into_inner());
        vars.remove(name);
    }
}

impl Environment for MemoryEnvironment {
    fn lookup(&self, name: &str) -> Option<String> {
        let vars = self.vars.read().unwrap_or_else(|e| e.into_inner());
        vars.get(name).cloned()
    }
}

impl<E: Environment + ?Sized> Environment for Arc<E> {
    fn lookup(&self, name: &str) -> Option<String> {
        (**self).lookup(name)
    }

    fn try_lookup(&self, name: &str) -> Result<Option<String>> {
        (**self).try_lookup(name)
    }
}

impl<E: Environment + ?Sized> Environment for &E {
    fn lookup(&self, name: &str) -> Option<String> {
        (**self).lookup(name)
    }

    fn try_lookup(&self, name: &str) -> Result<Option<String>> {
        (**self).try_lookup(name)
    }
}
