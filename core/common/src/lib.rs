//! Common utilities and types shared across Secretary modules.
//!
//! This module provides the error taxonomy used by every layer and the
//! descriptor types that name a key source.

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::{Descriptor, Scheme};
