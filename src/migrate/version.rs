//! Migration version identifiers.

use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::{MigrateError, MigrateResult};

/// Identifier of the "nothing applied" position.
pub const ZERO: &str = "0";

/// A totally ordered migration version, in practice `YYYYMMDDHHMMSS`.
///
/// Versions compare as strings, so timestamp versions must share a width.
/// The sentinel [`Version::zero`] sorts before every other valid version.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Version(String);

impl Version {
    /// Parse and validate a version string.
    pub fn parse(raw: &str) -> MigrateResult<Self> {
        if is_valid(raw) {
            Ok(Self(raw.to_string()))
        } else {
            Err(MigrateError::InvalidVersion(raw.to_string()))
        }
    }

    /// The position before the first migration.
    pub fn zero() -> Self {
        Self(ZERO.to_string())
    }

    pub fn is_zero(&self) -> bool {
        self.0 == ZERO
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Date encoded in a `YYYYMMDDHHMMSS` version, if it is one.
    pub fn datetime(&self) -> Option<NaiveDateTime> {
        let digits = self.0.get(..14)?;
        NaiveDateTime::parse_from_str(digits, "%Y%m%d%H%M%S").ok()
    }

    /// Human readable date of the version, falling back to the raw value.
    pub fn display_datetime(&self) -> String {
        match self.datetime() {
            Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
            None => self.0.clone(),
        }
    }
}

/// Versions are non-empty and ASCII alphanumeric.
pub fn is_valid(raw: &str) -> bool {
    !raw.is_empty() && raw.chars().all(|c| c.is_ascii_alphanumeric())
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Version {
    type Error = MigrateError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Version::parse(&value)
    }
}

impl From<Version> for String {
    fn from(v: Version) -> Self {
        v.0
    }
}

impl AsRef<str> for Version {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
