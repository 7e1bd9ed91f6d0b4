//! Key source resolution for Secretary.
//!
//! This module provides:
//! - The environment lookup service key sources read from
//! - Key sources: literal passphrase, environment variable, pass-through
//! - A memoizing registry resolving descriptors to key sources
//!
//! # Architecture
//! Callers hand a descriptor such as `env://MY_SECRET` to the
//! [`KeySourceRegistry`], which resolves it once and then serves the cached
//! [`KeySource`]. The source supplies the passphrase the crypto layer derives
//! its key from.

pub mod env;
pub mod registry;
pub mod source;

pub use env::{Environment, MemoryEnvironment, ProcessEnvironment};
pub use registry::KeySourceRegistry;
pub use source::{EnvironmentSource, KeySource, LiteralSource, PassphraseSource};
