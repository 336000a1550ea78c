use core::ops::Deref;
use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use bincode::{Encode, Decode, BorrowDecode};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::{ValidationError, ValidationResult};

// Institutional keys: an academic-program prefix followed by 4 to 6 digits.
static PREFIXED_KEY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(AM|BIE|BIS|BLG|BII|BIM|BIB|CLG|CIM|CIE|CII|CIB|IB|IE|II|IM|ISC|LG|MI|MXI|MXM|MXE|MXS|MIA)[0-9]{4,6}$")
        .unwrap()
});

// Administrator keys: the literal prefix plus a single digit, kept lowercase.
static ADMIN_KEY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^admin[0-9]$").unwrap());

// Legacy staff keys with no prefix.
static NUMERIC_KEY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]{4,6}$").unwrap());

/// An institutional user key ("clave"), validated and normalized on construction.
///
/// Keys are stored uppercased except for `admin` keys, which keep their
/// lowercase prefix. Every alternate form is matched against the full
/// string, so trailing garbage after a valid prefix is rejected.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserKey(String);

impl UserKey {
    pub fn new(raw: &str) -> ValidationResult<Self> {
        let trimmed = raw.trim();
        let normalized = if trimmed.starts_with("admin") {
            trimmed.to_string()
        } else {
            trimmed.to_uppercase()
        };
        if PREFIXED_KEY_RE.is_match(&normalized)
            || ADMIN_KEY_RE.is_match(&normalized)
            || NUMERIC_KEY_RE.is_match(&normalized)
        {
            Ok(UserKey(normalized))
        } else {
            Err(ValidationError::InvalidKey(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True for `admin` keys, which name back-office accounts.
    pub fn is_admin(&self) -> bool {
        self.0.starts_with("admin")
    }
}

impl Encode for UserKey {
    fn encode<E: bincode::enc::Encoder>(&self, encoder: &mut E) -> Result<(), bincode::error::EncodeError> {
        self.0.encode(encoder)
    }
}

impl<CTX> Decode<CTX> for UserKey {
    fn decode<D: bincode::de::Decoder>(decoder: &mut D) -> Result<Self, bincode::error::DecodeError> {
        let s: String = Decode::decode(decoder)?;
        Ok(UserKey(s))
    }
}

impl<'de, CTX> BorrowDecode<'de, CTX> for UserKey {
    fn borrow_decode<D: bincode::de::BorrowDecoder<'de>>(decoder: &mut D) -> Result<Self, bincode::error::DecodeError> {
        let s: String = BorrowDecode::borrow_decode(decoder)?;
        Ok(UserKey(s))
    }
}

impl AsRef<str> for UserKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Deref for UserKey {
    type Target = str;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromStr for UserKey {
    type Err = ValidationError;
    fn from_str(s: &str) -> ValidationResult<Self> {
        Self::new(s)
    }
}

impl fmt::Display for UserKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
