//! Partner invite codes.
//! Code format: 6 uppercase alphanumerics, e.g. K7QPX2, A1B2C3

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Characters a partner code may contain.
pub const CODE_ALPHABET: &[u8; 36] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Fixed length of every partner code.
pub const CODE_LEN: usize = 6;

/// Reasons a candidate partner code fails validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CodeError {
    #[error("partner code must be exactly {CODE_LEN} characters")]
    Length,
    #[error("partner code may only contain letters and digits")]
    Charset,
}

/// A 6-character invite code, always stored uppercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PartnerCode(String);

impl PartnerCode {
    /// Draw a fresh code from the given RNG stream.
    #[must_use]
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let code = (0..CODE_LEN)
            .map(|_| char::from(CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())]))
            .collect();
        Self(code)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PartnerCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for PartnerCode {
    type Err = CodeError;

    /// Normalize user input (trim, uppercase) and validate shape.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase();
        if normalized.chars().count() != CODE_LEN {
            return Err(CodeError::Length);
        }
        if !normalized.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(CodeError::Charset);
        }
        Ok(Self(normalized))
    }
}
