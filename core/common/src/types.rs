//! Descriptor types naming where a passphrase comes from.

use percent_encoding::percent_decode_str;
use std::fmt;
use std::str::FromStr;
use url::Url;

/// Key source scheme selected by a descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scheme {
    /// Passphrase read from an environment variable (`env://NAME`).
    Env,
    /// Passphrase given literally (`passwd://PASSPHRASE`).
    Passwd,
    /// No encryption (`plain://anything`).
    Plain,
}

impl Scheme {
    /// Every scheme understood by the registry.
    pub const ALL: [Scheme; 3] = [Scheme::Env, Scheme::Passwd, Scheme::Plain];

    /// Get the scheme name as written in descriptors.
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Env => "env",
            Scheme::Passwd => "passwd",
            Scheme::Plain => "plain",
        }
    }
}

impl FromStr for Scheme {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s {
            "env" => Ok(Scheme::Env),
            "passwd" => Ok(Scheme::Passwd),
            "plain" => Ok(Scheme::Plain),
            other => Err(crate::Error::UnknownScheme(other.to_string())),
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed `scheme://authority` descriptor.
///
/// The authority is percent-decoded, so `passwd://p%40ss` carries the
/// passphrase `p@ss`. Formatting never reveals the authority of a `passwd`
/// descriptor.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Descriptor {
    raw: String,
    scheme: Scheme,
    authority: String,
}

impl Descriptor {
    /// Parse a descriptor string.
    ///
    /// # Errors
    /// - `InvalidDescriptor` if the text is not a URI with an authority
    /// - `UnknownScheme` if the scheme is not one of [`Scheme::ALL`]
    pub fn parse(text: &str) -> crate::Result<Self> {
        let url = Url::parse(text).map_err(|e| crate::Error::InvalidDescriptor(e.to_string()))?;

        if !url.has_authority() {
            return Err(crate::Error::InvalidDescriptor(format!(
                "expected {}://authority",
                url.scheme()
            )));
        }

        let scheme = url.scheme().parse::<Scheme>()?;

        if scheme != Scheme::Plain {
            reject_extra_components(&url)?;
        }

        let authority = percent_decode_str(url.host_str().unwrap_or_default())
            .decode_utf8()
            .map_err(|_| {
                crate::Error::InvalidDescriptor("authority is not valid UTF-8".to_string())
            })?
            .into_owned();

        Ok(Self {
            raw: text.to_string(),
            scheme,
            authority,
        })
    }

    /// Build the descriptor for a literal passphrase.
    pub fn passwd(passphrase: &str) -> crate::Result<Self> {
        let encoded: String =
            percent_encoding::utf8_percent_encode(passphrase, AUTHORITY_ESCAPES).collect();
        Self::parse(&format!("passwd://{}", encoded))
    }

    /// Build the descriptor for an environment variable.
    pub fn env(variable: &str) -> crate::Result<Self> {
        let encoded: String =
            percent_encoding::utf8_percent_encode(variable, AUTHORITY_ESCAPES).collect();
        Self::parse(&format!("env://{}", encoded))
    }

    /// Get the descriptor text as given.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Get the scheme.
    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    /// Get the decoded, scheme-specific authority.
    pub fn authority(&self) -> &str {
        &self.authority
    }
}

/// Everything after `://` must be the authority itself.
///
/// The URL parser would otherwise split `passwd://p@ss` into userinfo and
/// host and silently key on `ss`.
fn reject_extra_components(url: &Url) -> crate::Result<()> {
    let extra = if !url.username().is_empty() || url.password().is_some() {
        Some("userinfo")
    } else if url.port().is_some() {
        Some("port")
    } else if !url.path().is_empty() {
        Some("path")
    } else if url.query().is_some() {
        Some("query")
    } else if url.fragment().is_some() {
        Some("fragment")
    } else {
        None
    };

    match extra {
        Some(part) => Err(crate::Error::InvalidDescriptor(format!(
            "{}:// authority must not contain a {}; percent-encode reserved characters",
            url.scheme(),
            part
        ))),
        None => Ok(()),
    }
}

/// Characters escaped when building a descriptor from a bare value.
const AUTHORITY_ESCAPES: &percent_encoding::AsciiSet = &percent_encoding::NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

impl fmt::Display for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.scheme {
            Scheme::Passwd => write!(f, "passwd://[REDACTED]"),
            Scheme::Env | Scheme::Plain => write!(f, "{}://{}", self.scheme, self.authority),
        }
    }
}

impl fmt::Debug for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Descriptor({})", self)
    }
}
