//! use csrkit::error::{ValidationError, WorkflowError};

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while validating user-supplied input, before any work starts.
///
/// These are always recoverable by resubmitting corrected input and never
/// leave partial files behind. The messages are written for direct display in
/// a form or status line.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The username is shorter than three characters.
    #[error("Username must be at least three characters long")]
    UsernameTooShort,

    /// The username contains a character outside `[A-Za-z0-9_]`.
    #[error("Username can only contain letters, digits, and underscores")]
    UsernameInvalidCharacters,

    /// The passphrase is shorter than eight bytes.
    #[error("Password must be at least eight characters")]
    PassphraseTooShort,

    /// The passphrase and its confirmation have different lengths.
    #[error("Password fields do not match (different lengths)")]
    PassphraseLengthMismatch,

    /// The passphrase and its confirmation differ in content.
    #[error("Password fields do not match")]
    PassphraseMismatch,

    /// A required field was left empty.
    #[error("Field must not be empty")]
    EmptyField,
}

/// Errors raised inside a running workflow. Terminal for that run.
///
/// Crypto and I/O faults are caught by the orchestrator, wrapped into a
/// [`FailureReport`](crate::workflow::FailureReport) with their full cause
/// chain, and delivered as the run's single failure event.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// No RSA implementation is available from the cryptographic backend.
    ///
    /// The default pure-Rust backend is always present; this variant exists
    /// for hosts that substitute a runtime-loaded backend.
    #[error("no RSA implementation is available from the cryptographic backend")]
    CryptoProviderUnavailable,

    /// RSA key pair generation failed.
    #[error("failed to generate RSA key pair")]
    KeyGeneration(#[source] rsa::Error),

    /// The certificate request could not be built or signed.
    #[error("failed to build or sign certificate request: {0}")]
    Signing(String),

    /// Password-based encryption of the private key failed.
    #[error("failed to encrypt private key")]
    Encryption(#[source] pkcs8::Error),

    /// An output file could not be written.
    #[error("failed to write {}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An output file could not be read back.
    #[error("failed to read {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
