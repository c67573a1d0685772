//! MAC address newtype: the stable key of every shade.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Hardware address of a shade, normalised to lowercase `aa:bb:cc:dd:ee:ff`.
///
/// The bridge reports MACs as strings and expects them back verbatim in
/// every per-shade request, so the textual form is kept instead of raw bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Mac(String);

impl Mac {
    /// Parse and normalise a MAC address.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidMac`] unless the input is six
    /// two-digit hex octets separated by `:`.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let octets: Vec<&str> = input.split(':').collect();
        let valid = octets.len() == 6
            && octets
                .iter()
                .all(|o| o.len() == 2 && o.chars().all(|c| c.is_ascii_hexdigit()));

        if !valid {
            return Err(ValidationError::InvalidMac(input.to_string()));
        }

        Ok(Self(input.to_ascii_lowercase()))
    }

    /// Build a MAC from raw octets.
    #[must_use]
    pub fn from_octets(octets: [u8; 6]) -> Self {
        let text = octets
            .iter()
            .map(|o| format!("{o:02x}"))
            .collect::<Vec<_>>()
            .join(":");
        Self(text)
    }

    /// Access the normalised textual form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Mac {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Mac {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Mac {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Mac> for String {
    fn from(mac: Mac) -> Self {
        mac.0
    }
}
