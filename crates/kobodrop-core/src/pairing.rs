//! Pairing codes
//!
//! A pairing code is six characters typed on an e-reader keyboard. Generated codes
//! use an alphabet without `0`, `1`, `I` and `O` so that nothing is ambiguous to
//! read aloud. Parsing is more lenient: it accepts any uppercase letter or digit so
//! that user input like `abc-123` normalizes to `ABC123`.

use std::fmt::{Display, Formatter, Result as FmtResult};

use rand::Rng;

use crate::error::AppError;

/// Symbols a generated code may contain.
pub const CODE_ALPHABET: &[u8; 32] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Number of characters in a pairing code.
pub const CODE_LENGTH: usize = 6;

const INVALID_FORMAT_MESSAGE: &str =
    "Invalid code format. Please enter a 6-character code (e.g. ABC123 or ABC-123).";

/// Generate a code using the thread-local RNG.
pub fn generate_code() -> String {
    generate_code_with(&mut rand::rng())
}

/// Generate a code from the given RNG, each symbol drawn uniformly and independently.
pub fn generate_code_with<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..CODE_LENGTH)
        .map(|_| CODE_ALPHABET[rng.random_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}

/// Uppercase and drop everything that is not an ASCII letter or digit.
pub fn normalize(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// Insert a dash after the third character (`ABC234` -> `ABC-234`).
pub fn group_for_display(code: &str) -> String {
    if code.len() == CODE_LENGTH && code.is_ascii() {
        format!("{}-{}", &code[..3], &code[3..])
    } else {
        code.to_string()
    }
}

/// A normalized, well-formed pairing code.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PairingCode(String);

impl PairingCode {
    /// Normalize user input and check it is exactly six characters from `[A-Z0-9]`.
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        let normalized = normalize(raw);
        if normalized.is_empty() {
            return Err(AppError::InvalidInput(
                "Pairing code is required".to_string(),
            ));
        }
        if normalized.len() != CODE_LENGTH {
            return Err(AppError::InvalidInput(INVALID_FORMAT_MESSAGE.to_string()));
        }
        Ok(PairingCode(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn grouped(&self) -> String {
        group_for_display(&self.0)
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl Display for PairingCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PairingCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
