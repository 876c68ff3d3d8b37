use std::fmt;
use std::io::{self, Read};

use sha2::{Digest, Sha256};

const CHUNK_SIZE: usize = 8192;

/// A SHA-256 digest rendered as 64 lowercase hexadecimal characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestValue(String);

impl DigestValue {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DigestValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Computes the SHA-256 digest of everything `reader` yields.
///
/// Reads in fixed-size chunks so arbitrarily large inputs never need to be
/// held in memory at once.
pub fn digest_reader<R: Read>(reader: &mut R) -> io::Result<DigestValue> {
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; CHUNK_SIZE];
    loop {
        let read = reader.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }
    Ok(DigestValue(hex::encode(hasher.finalize())))
}
