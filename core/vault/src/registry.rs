//! Memoizing resolver from descriptor strings to key sources.
//!
//! Resolved sources are cached for the lifetime of the registry and never
//! evicted. Lookups are a single atomic load of an immutable snapshot of the
//! cache; inserts publish a new snapshot with compare-and-swap, so callers
//! racing on the same new descriptor all end up holding the instance that
//! won the race. Failed resolutions are never cached.

use arc_swap::ArcSwap;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

use crate::env::{Environment, ProcessEnvironment};
use crate::source::KeySource;
use secretary_common::{Descriptor, Result, Scheme};

type SourceMap = HashMap<String, Arc<KeySource>>;

/// Resolver and cache for key sources.
///
/// Construct one per process and pass it to whatever needs to encrypt or
/// decrypt. The registry is `Send + Sync` when its environment is.
pub struct KeySourceRegistry<E = ProcessEnvironment> {
    environment: E,
    sources: ArcSwap<SourceMap>,
    pass_through: Arc<KeySource>,
}

impl KeySourceRegistry<ProcessEnvironment> {
    /// Create a registry reading the process environment.
    pub fn new() -> Self {
        Self::with_environment(ProcessEnvironment)
    }
}

impl Default for KeySourceRegistry<ProcessEnvironment> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Environment> KeySourceRegistry<E> {
    /// Create a registry using a custom environment lookup.
    pub fn with_environment(environment: E) -> Self {
        Self {
            environment,
            sources: ArcSwap::from_pointee(SourceMap::new()),
            pass_through: Arc::new(KeySource::PassThrough),
        }
    }

    /// Resolve a descriptor to its key source.
    ///
    /// # Postconditions
    /// - A descriptor resolved once is served from the cache afterwards,
    ///   without parsing or reading the environment again
    /// - `plain://` descriptors all share one pass-through source and are
    ///   not cached
    ///
    /// # Errors
    /// - `InvalidDescriptor` if the descriptor is not `scheme://authority`, or
    ///   an `env`/`passwd` descriptor carries userinfo, a port, a path, a query
    ///   or a fragment
    /// - `UnknownScheme` for any scheme other than `env`, `passwd`, `plain`
    /// - `EnvironmentVariableNotFound` for an unset `env` variable; a later
    ///   call retries the lookup
    /// - `EnvironmentVariableNotUnicode` for an `env` variable holding
    ///   non-Unicode data
    pub fn resolve(&self, descriptor: &str) -> Result<Arc<KeySource>> {
        if let Some(source) = self.sources.load().get(descriptor) {
            trace!(scheme = %source.scheme(), "Key source cache hit");
            return Ok(Arc::clone(source));
        }

        let parsed = Descriptor::parse(descriptor)?;
        debug!(descriptor = %parsed, "Resolving key source");

        match parsed.scheme() {
            Scheme::Plain => Ok(Arc::clone(&self.pass_through)),
            Scheme::Env | Scheme::Passwd => {
                let source = KeySource::from_descriptor(&parsed, &self.environment)?;
                Ok(self.insert(descriptor, Arc::new(source)))
            }
        }
    }

    /// Encrypt `text` with the source `descriptor` names.
    pub fn encrypt_text(&self, descriptor: &str, text: &str) -> Result<String> {
        self.resolve(descriptor)?.encrypt_text(text)
    }

    /// Decrypt `text` with the source `descriptor` names.
    pub fn decrypt_text(&self, descriptor: &str, text: &str) -> Result<String> {
        self.resolve(descriptor)?.decrypt_text(text)
    }

    /// Check whether `descriptor` has been resolved and cached.
    pub fn is_cached(&self, descriptor: &str) -> bool {
        self.sources.load().contains_key(descriptor)
    }

    /// Number of cached key sources.
    pub fn len(&self) -> usize {
        self.sources.load().len()
    }

    /// Check if nothing has been cached yet.
    pub fn is_empty(&self) -> bool {
        self.sources.load().is_empty()
    }

    /// Get the environment this registry reads from.
    pub fn environment(&self) -> &E {
        &self.environment
    }

    /// Publish `candidate` unless another caller got there first.
    ///
    /// Returns the instance visible in the cache afterwards.
    fn insert(&self, descriptor: &str, candidate: Arc<KeySource>) -> Arc<KeySource> {
        let previous = self.sources.rcu(|current| {
            if current.contains_key(descriptor) {
                Arc::clone(current)
            } else {
                let mut next = SourceMap::clone(current);
                next.insert(descriptor.to_string(), Arc::clone(&candidate));
                Arc::new(next)
            }
        });

        match previous.get(descriptor) {
            Some(winner) => {
                debug!(scheme = %winner.scheme(), "Lost key source race, using cached instance");
                Arc::clone(winner)
            }
            None => candidate,
        }
    }
}

impl<E> fmt::Debug for KeySourceRegistry<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeySourceRegistry")
            .field("cached", &self.sources.load().len())
            .finish_non_exhaustive()
    }
}
