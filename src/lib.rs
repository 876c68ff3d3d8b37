//! # CsrKit - Certificate Signing Request Generation
//!
//! CsrKit turns a validated identity and passphrase into a complete,
//! disk-persisted certificate-signing artifact set, built entirely with
//! rustcrypto libraries and no OpenSSL or ring dependencies:
//!
//! - a fresh 4096-bit RSA key pair,
//! - an encrypted PKCS#8 private key file (`<username>.key`),
//! - a signed PKCS#10 certificate signing request (`<username>.csr`),
//! - a SHA-256 content digest of the request file (`<username>.sha256`).
//!
//! The pipeline runs as a single background task that reports human-readable
//! progress to a caller-supplied sink and finishes with exactly one terminal
//! event: a success carrying the digest value, or a failure report carrying
//! the full cause chain. The caller, whether a GUI form, a service endpoint,
//! or a test harness, stays responsive and decides what to do with the
//! messages.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::path::PathBuf;
//!
//! use csrkit::credentials::{Passphrase, UserName};
//! use csrkit::workflow;
//!
//! # fn main() -> Result<(), csrkit::error::ValidationError> {
//! // Validate input up front; validation failures never start the workflow.
//! let user = UserName::parse("alice_01")?;
//! let passphrase = Passphrase::new(b"longenough1".to_vec(), b"longenough1".to_vec())?;
//!
//! let handle = workflow::run(
//!     user,
//!     passphrase,
//!     PathBuf::from("/tmp/out"),
//!     |message| println!("{message}"),
//!     |digest| println!("CSR digest: {digest}"),
//!     |report| eprintln!("{report}"),
//! );
//!
//! // The task owns the work; join when you want the outcome to be final.
//! handle.join();
//! # Ok(())
//! # }
//! ```
//!
//! ## Output Format
//!
//! The artifact files are written with unconditional overwrite into the
//! caller-supplied directory:
//!
//! - `<username>.key`: PEM `ENCRYPTED PRIVATE KEY`. PKCS#8, PBKDF2-HMAC-SHA1
//!   derived key, 3DES cipher, 100000 iterations, fresh salt per run.
//! - `<username>.csr`: PEM `CERTIFICATE REQUEST`. Subject
//!   `CN=<username>, C=XA`, critical basicConstraints (CA:true) and critical
//!   keyUsage (dataEncipherment) inside a PKCS#9 extension request, signed
//!   `sha1WithRSAEncryption`.
//! - `<username>.sha256`: 64 lowercase hex characters and a newline, the
//!   SHA-256 of the `.csr` file's bytes as written to disk.
//!
//! The legacy algorithm choices are the on-disk contract of existing
//! consumers of these files and are preserved deliberately; see
//! [`request::RequestOptions`] for the parts that can be overridden.
//!
//! ## Error Handling
//!
//! Input validation is synchronous and never touches the filesystem:
//!
//! ```rust
//! use csrkit::credentials::UserName;
//! use csrkit::error::ValidationError;
//!
//! match UserName::parse("ab") {
//!     Ok(name) => println!("validated {name}"),
//!     Err(ValidationError::UsernameTooShort) => println!("pick a longer name"),
//!     Err(e) => println!("rejected: {e}"),
//! }
//! ```
//!
//! Faults inside a running workflow are terminal for that run. They never
//! cross the task boundary as raw errors; the run's failure callback receives
//! a [`workflow::FailureReport`] that renders the message and every cause,
//! innermost last. Files already written before the failure are left on disk
//! and should be treated as unverified.
//!
//! ## Module Organization
//!
//! - [`credentials`]: username and passphrase validation
//! - [`key`]: RSA key pair generation
//! - [`request`]: PKCS#10 request construction and signing
//! - [`encrypt`]: password-based private key encryption
//! - [`digest`]: streaming SHA-256 content digests
//! - [`artifacts`]: output path derivation and persistence
//! - [`workflow`]: the background task, its stages, progress, and reporting
//! - [`error`]: validation and workflow error types

pub mod artifacts;
pub mod credentials;
pub mod digest;
pub mod encrypt;
pub mod error;
pub mod key;
pub mod request;
pub mod workflow;

#[cfg(test)]
mod testing;
