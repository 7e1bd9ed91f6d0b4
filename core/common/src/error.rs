//! Common error types for Secretary.
//!
//! Messages never carry passphrases, derived keys, or the authority of a
//! `passwd://` descriptor.

use thiserror::Error;

/// Top-level error type for Secretary operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// Descriptor is not a well-formed `scheme://authority` URI.
    #[error("Invalid descriptor: {0}")]
    InvalidDescriptor(String),

    /// Descriptor names a scheme no key source handles.
    #[error("Unknown scheme '{0}'")]
    UnknownScheme(String),

    /// Environment variable backing a key source is not set.
    #[error("Environment variable '{0}' not set")]
    EnvironmentVariableNotFound(String),

    /// Environment variable is set but its value is not valid Unicode.
    #[error("Environment variable '{0}' is not valid Unicode")]
    EnvironmentVariableNotUnicode(String),

    /// Derived key does not fit the cipher construction.
    #[error("Key derivation failed: {0}")]
    KeyDerivation(String),

    /// Secure randomness could not be obtained.
    #[error("Random source unavailable: {0}")]
    RandomSource(String),

    /// Ciphertext failed to authenticate.
    ///
    /// Wrong passphrases and corrupted or truncated input are deliberately
    /// reported the same way.
    #[error("Authentication failed")]
    Authentication,

    /// Input is structurally unusable.
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// Textual encoding could not be decoded.
    #[error("Encoding error: {0}")]
    Encoding(String),
}

/// Result type alias using the common Error.
pub type Result<T> = std::result::Result<T, Error>;
