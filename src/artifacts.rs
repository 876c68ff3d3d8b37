use std::fs::{self, File};
use std::path::{Path, PathBuf};

use crate::credentials::UserName;
use crate::digest::{self, DigestValue};
use crate::encrypt::EncryptedPrivateKey;
use crate::error::WorkflowError;

/// The three output file paths derived from an identity and a directory.
///
/// Derivation is pure: no I/O and no existence checks. Existence checking and
/// overwrite confirmation belong to the caller; the writers below always
/// replace whole files.
#[derive(Debug, Clone)]
pub struct ArtifactSet {
    private_key: PathBuf,
    request: PathBuf,
    digest: PathBuf,
}

impl ArtifactSet {
    pub fn new(user: &UserName, directory: &Path) -> Self {
        Self {
            private_key: directory.join(format!("{user}.key")),
            request: directory.join(format!("{user}.csr")),
            digest: directory.join(format!("{user}.sha256")),
        }
    }

    /// Path of the encrypted private key file (`<username>.key`).
    pub fn private_key_path(&self) -> &Path {
        &self.private_key
    }

    /// Path of the certificate signing request file (`<username>.csr`).
    pub fn request_path(&self) -> &Path {
        &self.request
    }

    /// Path of the digest file (`<username>.sha256`).
    pub fn digest_path(&self) -> &Path {
        &self.digest
    }

    pub fn write_private_key(&self, key: &EncryptedPrivateKey) -> Result<(), WorkflowError> {
        write_file(&self.private_key, key.as_pem().as_bytes())
    }

    pub fn write_request(&self, pem: &str) -> Result<(), WorkflowError> {
        write_file(&self.request, pem.as_bytes())
    }

    /// Digests the request file as it exists on disk.
    ///
    /// The digest must reflect exactly what the file contains, so the bytes
    /// are read back rather than hashed from the in-memory request.
    pub fn digest_request(&self) -> Result<DigestValue, WorkflowError> {
        let mut file = File::open(&self.request).map_err(|source| WorkflowError::Read {
            path: self.request.clone(),
            source,
        })?;
        digest::digest_reader(&mut file).map_err(|source| WorkflowError::Read {
            path: self.request.clone(),
            source,
        })
    }

    /// Writes the digest file: the hex digest and a trailing newline.
    pub fn write_digest(&self, value: &DigestValue) -> Result<(), WorkflowError> {
        write_file(&self.digest, format!("{value}\n").as_bytes())
    }
}

// Truncate-and-write replacement. No atomic rename: an interrupted write can
// leave a truncated file, and a failed run's directory contents are untrusted.
fn write_file(path: &Path, contents: &[u8]) -> Result<(), WorkflowError> {
    fs::write(path, contents).map_err(|source| WorkflowError::Write {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artifact_set(directory: &Path) -> ArtifactSet {
        let user = UserName::parse("alice_01").unwrap();
        ArtifactSet::new(&user, directory)
    }

    #[test]
    fn paths_derive_from_username_and_directory() {
        let set = artifact_set(Path::new("/tmp/out"));
        assert_eq!(set.private_key_path(), Path::new("/tmp/out/alice_01.key"));
        assert_eq!(set.request_path(), Path::new("/tmp/out/alice_01.csr"));
        assert_eq!(set.digest_path(), Path::new("/tmp/out/alice_01.sha256"));
    }

    #[test]
    fn digest_file_carries_a_trailing_newline() {
        let dir = tempfile::tempdir().unwrap();
        let set = artifact_set(dir.path());

        set.write_request("not really a csr").unwrap();
        let value = set.digest_request().unwrap();
        set.write_digest(&value).unwrap();

        let written = fs::read_to_string(set.digest_path()).unwrap();
        assert_eq!(written, format!("{value}\n"));
    }

    #[test]
    fn writes_replace_existing_content() {
        let dir = tempfile::tempdir().unwrap();
        let set = artifact_set(dir.path());

        set.write_request("first run, longer than the second").unwrap();
        set.write_request("second run").unwrap();

        let written = fs::read_to_string(set.request_path()).unwrap();
        assert_eq!(written, "second run");
    }

    #[test]
    fn reading_a_missing_request_reports_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let set = artifact_set(dir.path());

        let err = set.digest_request().unwrap_err();
        assert!(matches!(err, WorkflowError::Read { ref path, .. }
            if path == set.request_path()));
    }
}
