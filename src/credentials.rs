use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use crate::error::ValidationError;

static USERNAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("^[A-Za-z0-9_]+$").expect("username pattern is valid"));

/// A validated username.
///
/// Usernames are at least three characters long and consist only of letters,
/// digits, and underscores. The validated string becomes the `CN` component of
/// the request subject and the stem of every output file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserName {
    actual: String,
}

impl UserName {
    /// Validates a candidate username.
    ///
    /// # Errors
    /// [`ValidationError::UsernameTooShort`] if the name is shorter than three
    /// characters, [`ValidationError::UsernameInvalidCharacters`] if it
    /// contains anything outside `[A-Za-z0-9_]`.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        if raw.chars().count() < 3 {
            return Err(ValidationError::UsernameTooShort);
        }
        if !USERNAME_PATTERN.is_match(raw) {
            return Err(ValidationError::UsernameInvalidCharacters);
        }
        Ok(Self {
            actual: raw.to_string(),
        })
    }

    /// The validated username, exactly as submitted.
    pub fn as_str(&self) -> &str {
        &self.actual
    }
}

impl fmt::Display for UserName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.actual)
    }
}

/// A validated passphrase, held only until the private key is encrypted.
///
/// The buffer is wiped when the holder is dropped. Callers must not retain
/// their own copies of the passphrase bytes after constructing this.
pub struct Passphrase {
    bytes: Zeroizing<Vec<u8>>,
}

impl Passphrase {
    /// Validates a passphrase against its confirmation copy.
    ///
    /// The length check runs before the content compare, so differing-length
    /// pairs never reach the byte comparison. The byte comparison itself is
    /// constant time.
    ///
    /// # Errors
    /// [`ValidationError::PassphraseTooShort`] if shorter than eight bytes,
    /// [`ValidationError::PassphraseLengthMismatch`] if the copies differ in
    /// length, [`ValidationError::PassphraseMismatch`] if they differ in
    /// content.
    pub fn new(raw: Vec<u8>, confirm: Vec<u8>) -> Result<Self, ValidationError> {
        let raw = Zeroizing::new(raw);
        let confirm = Zeroizing::new(confirm);

        if raw.len() < 8 {
            return Err(ValidationError::PassphraseTooShort);
        }
        if raw.len() != confirm.len() {
            return Err(ValidationError::PassphraseLengthMismatch);
        }
        if raw.as_slice().ct_eq(confirm.as_slice()).unwrap_u8() != 1 {
            return Err(ValidationError::PassphraseMismatch);
        }
        Ok(Self { bytes: raw })
    }

    /// The passphrase bytes, for the key encryptor only.
    pub(crate) fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl fmt::Debug for Passphrase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Passphrase").finish_non_exhaustive()
    }
}

/// Rejects empty text-field input.
///
/// Front-end gate for fields that only need to be present, such as the output
/// directory selector; the stronger validators above handle the rest.
pub fn require_non_empty(raw: &str) -> Result<&str, ValidationError> {
    if raw.is_empty() {
        return Err(ValidationError::EmptyField);
    }
    Ok(raw)
}
