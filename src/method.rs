//! ACME validation methods.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// An ACME validation method, as named in the ACME protocol.
///
/// Parsing never fails: unrecognised names are kept as [`ValidationMethod::Unknown`]
/// so that the scan can report them as a fatal `InvalidMethod` problem before
/// any network activity happens.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ValidationMethod {
    /// `http-01`
    Http01,
    /// `dns-01`
    Dns01,
    /// `tls-sni-01`, permanently disabled by the CA
    TlsSni01,
    /// `tls-sni-02`, permanently disabled by the CA
    TlsSni02,
    /// Anything else
    Unknown(String),
}

impl ValidationMethod {
    /// Methods the CA currently accepts.
    pub const SUPPORTED: [ValidationMethod; 2] = [ValidationMethod::Http01, ValidationMethod::Dns01];

    /// The ACME challenge type, e.g. `http-01`.
    pub fn as_str(&self) -> &str {
        match self {
            ValidationMethod::Http01 => "http-01",
            ValidationMethod::Dns01 => "dns-01",
            ValidationMethod::TlsSni01 => "tls-sni-01",
            ValidationMethod::TlsSni02 => "tls-sni-02",
            ValidationMethod::Unknown(other) => other,
        }
    }

    /// True for every method the engine recognises, including disabled ones.
    pub fn is_known(&self) -> bool {
        !matches!(self, ValidationMethod::Unknown(_))
    }

    /// True for the legacy methods the CA no longer accepts.
    pub fn is_disabled(&self) -> bool {
        matches!(self, ValidationMethod::TlsSni01 | ValidationMethod::TlsSni02)
    }
}

impl From<&str> for ValidationMethod {
    fn from(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "http-01" => ValidationMethod::Http01,
            "dns-01" => ValidationMethod::Dns01,
            "tls-sni-01" => ValidationMethod::TlsSni01,
            "tls-sni-02" => ValidationMethod::TlsSni02,
            _ => ValidationMethod::Unknown(value.to_string()),
        }
    }
}

impl From<String> for ValidationMethod {
    fn from(value: String) -> Self {
        ValidationMethod::from(value.as_str())
    }
}

impl From<ValidationMethod> for String {
    fn from(value: ValidationMethod) -> Self {
        value.as_str().to_string()
    }
}

impl FromStr for ValidationMethod {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(ValidationMethod::from(s))
    }
}

impl fmt::Display for ValidationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
