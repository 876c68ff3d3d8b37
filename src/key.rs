use rsa::{RsaPrivateKey, RsaPublicKey};

use crate::error::WorkflowError;

/// RSA modulus size for every generated key pair.
pub const KEY_BITS: usize = 4096;

/// A freshly generated RSA key pair.
///
/// Key pairs are created once per workflow run and never persisted in raw
/// form; the private key leaves memory only through the password-based
/// encryptor in [`crate::encrypt`].
pub struct RsaKeyPair {
    private: RsaPrivateKey,
    public: RsaPublicKey,
}

impl RsaKeyPair {
    /// Generate a [`KEY_BITS`]-bit RSA key pair from the operating system's
    /// secure random source.
    ///
    /// This is CPU-bound and can take tens of seconds; callers must not
    /// assume sub-second latency.
    pub fn generate() -> Result<Self, WorkflowError> {
        let mut rng = rand_core::OsRng;
        let private =
            RsaPrivateKey::new(&mut rng, KEY_BITS).map_err(WorkflowError::KeyGeneration)?;
        let public = RsaPublicKey::from(&private);
        Ok(Self { private, public })
    }

    pub fn private_key(&self) -> &RsaPrivateKey {
        &self.private
    }

    pub fn public_key(&self) -> &RsaPublicKey {
        &self.public
    }
}

#[cfg(test)]
impl RsaKeyPair {
    /// Wrap an existing private key so unit tests can avoid the cost of
    /// generating a full-size modulus.
    pub(crate) fn from_private_key(private: RsaPrivateKey) -> Self {
        let public = RsaPublicKey::from(&private);
        Self { private, public }
    }
}
