//! Key sources: where a passphrase comes from.
//!
//! A [`KeySource`] is built once from a [`Descriptor`] and is immutable
//! afterwards. Environment-backed sources capture the variable's value at
//! construction time and never read the environment again.

use std::fmt;
use tracing::debug;

use crate::env::Environment;
use secretary_common::{Descriptor, Error, Result, Scheme};
use secretary_crypto::{aead, Passphrase};

/// Capability shared by key sources that hold a passphrase.
pub trait PassphraseSource {
    /// Get the passphrase.
    fn passphrase(&self) -> &Passphrase;

    /// Encrypt text under this source's passphrase, hex-encoded.
    fn encrypt_text(&self, text: &str) -> Result<String> {
        aead::encrypt_text(text, self.passphrase())
    }

    /// Decrypt hex-encoded text under this source's passphrase.
    fn decrypt_text(&self, text: &str) -> Result<String> {
        aead::decrypt_text(text, self.passphrase())
    }
}

/// Passphrase given literally in the descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiteralSource {
    passphrase: Passphrase,
}

impl LiteralSource {
    /// Create a literal source.
    pub fn new(passphrase: impl Into<String>) -> Self {
        Self {
            passphrase: Passphrase::new(passphrase),
        }
    }
}

impl PassphraseSource for LiteralSource {
    fn passphrase(&self) -> &Passphrase {
        &self.passphrase
    }
}

/// Passphrase captured from an environment variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentSource {
    variable: String,
    passphrase: Passphrase,
}

impl EnvironmentSource {
    /// Read `variable` from `env` and hold its value.
    ///
    /// # Errors
    /// - `EnvironmentVariableNotFound` if the variable is not set
    /// - `EnvironmentVariableNotUnicode` if its value is not Unicode
    pub fn capture<E: Environment + ?Sized>(variable: &str, env: &E) -> Result<Self> {
        let value = env
            .try_lookup(variable)?
            .ok_or_else(|| Error::EnvironmentVariableNotFound(variable.to_string()))?;

        debug!(variable, "Captured passphrase from environment");

        Ok(Self {
            variable: variable.to_string(),
            passphrase: Passphrase::new(value),
        })
    }

    /// Name of the backing variable.
    pub fn variable(&self) -> &str {
        &self.variable
    }
}

impl PassphraseSource for EnvironmentSource {
    fn passphrase(&self) -> &Passphrase {
        &self.passphrase
    }
}

/// A resolved key source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeySource {
    /// `passwd://PASSPHRASE`
    Literal(LiteralSource),
    /// `env://VARIABLE`
    Environment(EnvironmentSource),
    /// `plain://` - no encryption at all.
    PassThrough,
}

impl KeySource {
    /// Build the key source a descriptor names.
    ///
    /// # Errors
    /// - `InvalidDescriptor` if an `env` or `passwd` descriptor has an empty authority
    /// - `EnvironmentVariableNotFound` for an unset `env` variable
    /// - `EnvironmentVariableNotUnicode` for an `env` variable holding non-Unicode data
    pub fn from_descriptor<E: Environment + ?Sized>(
        descriptor: &Descriptor,
        env: &E,
    ) -> Result<Self> {
        match descriptor.scheme() {
            Scheme::Env => {
                let variable = require_authority(descriptor, "environment variable name")?;
                Ok(KeySource::Environment(EnvironmentSource::capture(variable, env)?))
            }
            Scheme::Passwd => {
                let passphrase = require_authority(descriptor, "passphrase")?;
                Ok(KeySource::Literal(LiteralSource::new(passphrase)))
            }
            Scheme::Plain => Ok(KeySource::PassThrough),
        }
    }

    /// Scheme this source was resolved from.
    pub fn scheme(&self) -> Scheme {
        match self {
            KeySource::Literal(_) => Scheme::Passwd,
            KeySource::Environment(_) => Scheme::Env,
            KeySource::PassThrough => Scheme::Plain,
        }
    }

    /// Passphrase held by this source, if it uses one.
    pub fn passphrase(&self) -> Option<&Passphrase> {
        match self {
            KeySource::Literal(source) => Some(source.passphrase()),
            KeySource::Environment(source) => Some(source.passphrase()),
            KeySource::PassThrough => None,
        }
    }

    /// Encrypt text, or return it unchanged for [`KeySource::PassThrough`].
    pub fn encrypt_text(&self, text: &str) -> Result<String> {
        match self {
            KeySource::Literal(source) => source.encrypt_text(text),
            KeySource::Environment(source) => source.encrypt_text(text),
            KeySource::PassThrough => Ok(text.to_string()),
        }
    }

    /// Decrypt text, or return it unchanged for [`KeySource::PassThrough`].
    pub fn decrypt_text(&self, text: &str) -> Result<String> {
        match self {
            KeySource::Literal(source) => source.decrypt_text(text),
            KeySource::Environment(source) => source.decrypt_text(text),
            KeySource::PassThrough => Ok(text.to_string()),
        }
    }
}

impl fmt::Display for KeySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeySource::Literal(_) => write!(f, "passwd://[REDACTED]"),
            KeySource::Environment(source) => write!(f, "env://{}", source.variable()),
            KeySource::PassThrough => write!(f, "plain://"),
        }
    }
}

fn require_authority<'a>(descriptor: &'a Descriptor, what: &str) -> Result<&'a str> {
    let authority = descriptor.authority();
    if authority.is_empty() {
        return Err(Error::InvalidDescriptor(format!(
            "{}:// requires a {}",
            descriptor.scheme(),
            what
        )));
    }
    Ok(authority)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::MemoryEnvironment;

    fn resolve(text: &str, env: &MemoryEnvironment) -> Result<KeySource> {
        KeySource::from_descriptor(&Descriptor::parse(text)?, env)
    }

    #[test]
    fn test_literal_source() {
        let env = MemoryEnvironment::new();
        let source = resolve("passwd://secret", &env).unwrap();

        assert_eq!(source.scheme(), Scheme::Passwd);
        assert_eq!(source.passphrase().unwrap().expose(), "secret");
    }

    #[test]
    fn test_environment_source_captures_once() {
        let env = MemoryEnvironment::new();
        env.set("MY_SECRET", "first");

        let source = resolve("env://MY_SECRET", &env).unwrap();
        env.set("MY_SECRET", "second");

        assert_eq!(source.passphrase().unwrap().expose(), "first");
        env.remove("MY_SECRET");
        assert_eq!(source.passphrase().unwrap().expose(), "first");
    }

    #[test]
    fn test_environment_source_missing_variable() {
        let env = MemoryEnvironment::new();
        assert_eq!(
            resolve("env://MISSING_VAR", &env),
            Err(Error::EnvironmentVariableNotFound("MISSING_VAR".to_string()))
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_environment_source_non_unicode_value() {
        use crate::env::ProcessEnvironment;
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let name = "SECRETARY_TEST_NON_UNICODE_PASSPHRASE";
        std::env::set_var(name, OsStr::from_bytes(b"\xff\xfe"));

        let result = EnvironmentSource::capture(name, &ProcessEnvironment);
        std::env::remove_var(name);

        assert_eq!(
            result,
            Err(Error::EnvironmentVariableNotUnicode(name.to_string()))
        );
    }

    #[test]
    fn test_empty_authority_rejected() {
        let env = MemoryEnvironment::new();
        assert!(matches!(
            resolve("env://", &env),
            Err(Error::InvalidDescriptor(_))
        ));
        assert!(matches!(
            resolve("passwd://", &env),
            Err(Error::InvalidDescriptor(_))
        ));
    }

    #[test]
    fn test_pass_through_is_identity() {
        let env = MemoryEnvironment::new();
        let source = resolve("plain://anything", &env).unwrap();

        assert!(source.passphrase().is_none());
        assert_eq!(source.encrypt_text("hello").unwrap(), "hello");
        assert_eq!(source.decrypt_text("not hex at all").unwrap(), "not hex at all");
    }

    #[test]
    fn test_literal_roundtrip() {
        let env = MemoryEnvironment::new();
        let source = resolve("passwd://secret", &env).unwrap();

        let encrypted = source.encrypt_text("attack at dawn").unwrap();
        assert_ne!(encrypted, "attack at dawn");
        assert_eq!(source.decrypt_text(&encrypted).unwrap(), "attack at dawn");
    }

    #[test]
    fn test_env_and_literal_with_same_passphrase_interoperate() {
        let env = MemoryEnvironment::new();
        env.set("MY_SECRET", "secret");

        let literal = resolve("passwd://secret", &env).unwrap();
        let from_env = resolve("env://MY_SECRET", &env).unwrap();

        let encrypted = literal.encrypt_text("shared").unwrap();
        assert_eq!(from_env.decrypt_text(&encrypted).unwrap(), "shared");
    }

    #[test]
    fn test_display_never_shows_passphrase() {
        let env = MemoryEnvironment::new();
        env.set("MY_SECRET", "hunter2");

        let literal = resolve("passwd://hunter2", &env).unwrap();
        let from_env = resolve("env://MY_SECRET", &env).unwrap();

        assert_eq!(literal.to_string(), "passwd://[REDACTED]");
        assert_eq!(from_env.to_string(), "env://MY_SECRET");
        assert!(!format!("{:?}", literal).contains("hunter2"));
        assert!(!format!("{:?}", from_env).contains("hunter2"));
    }
}
