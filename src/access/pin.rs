//! Numeric access credentials.
//!
//! An access is identified within its project by a 2-digit UID and
//! authenticated by an 8-digit PIN. Only a bcrypt hash of the PIN is stored.

use std::fmt::Display;

use bcrypt::{BcryptError, hash, verify};
use rand::Rng;

use crate::Error;

/// The number of digits in an access UID.
pub const UID_LENGTH: usize = 2;
/// The number of digits in an access PIN.
pub const PIN_LENGTH: usize = 8;

/// Generate a random UID, zero padded to [UID_LENGTH] digits.
pub fn generate_uid() -> String {
    random_digits(UID_LENGTH)
}

/// Generate a random PIN, zero padded to [PIN_LENGTH] digits.
pub fn generate_pin() -> String {
    random_digits(PIN_LENGTH)
}

fn random_digits(length: usize) -> String {
    let mut rng = rand::rng();

    (0..length)
        .map(|_| char::from(b'0' + rng.random_range(0..10u8)))
        .collect()
}

/// Whether `value` is exactly `length` ASCII digits.
pub fn is_numeric_code(value: &str, length: usize) -> bool {
    value.len() == length && value.bytes().all(|byte| byte.is_ascii_digit())
}

/// A salted and hashed PIN.
#[derive(Debug, Clone, PartialEq)]
pub struct PinHash(String);

impl PinHash {
    /// Hash `pin` with the bcrypt `cost`.
    ///
    /// # Errors
    ///
    /// Returns [Error::HashingError] if the PIN could not be hashed.
    pub fn new(pin: &str, cost: u32) -> Result<Self, Error> {
        hash(pin, cost)
            .map(Self)
            .map_err(|error| Error::HashingError(error.to_string()))
    }

    /// Wrap a hash loaded from storage without checking it.
    pub fn new_unchecked(raw_hash: &str) -> Self {
        Self(raw_hash.to_owned())
    }

    /// Check that `pin` matches the stored hash.
    pub fn verify(&self, pin: &str) -> Result<bool, BcryptError> {
        verify(pin, &self.0)
    }

    /// The encoded hash.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for PinHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
