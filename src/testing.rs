//! Shared fixtures for the unit tests.

use std::sync::LazyLock;

use rsa::RsaPrivateKey;

// One modest key for the whole test binary; full-size generation is exercised
// by the end-to-end workflow tests.
static RSA_2048: LazyLock<RsaPrivateKey> = LazyLock::new(|| {
    RsaPrivateKey::new(&mut rand_core::OsRng, 2048).expect("test key generation")
});

pub(crate) fn rsa_2048() -> &'static RsaPrivateKey {
    &RSA_2048
}
