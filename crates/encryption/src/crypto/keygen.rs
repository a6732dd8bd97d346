//! Fresh key material for the encryption configuration section.

use rand::RngCore;

use super::cipher::{BLOCK_LEN, KEY_LEN};
use super::codec;

/// A Base64 key and IV pair ready to paste into configuration.
#[derive(Clone, PartialEq, Eq)]
pub struct GeneratedKey {
    pub key: String,
    pub iv: String,
}

impl std::fmt::Debug for GeneratedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("GeneratedKey([REDACTED])")
    }
}

/// Fill a buffer of `len` bytes from the thread-local CSPRNG.
pub fn random_bytes(len: usize) -> Vec<u8> {
    let mut bytes = vec![0u8; len];
    rand::rng().fill_bytes(&mut bytes);
    bytes
}

/// Generate a random [`KEY_LEN`]-byte key and [`BLOCK_LEN`]-byte IV.
pub fn generate() -> GeneratedKey {
    GeneratedKey {
        key: codec::encode(&random_bytes(KEY_LEN)),
        iv: codec::encode(&random_bytes(BLOCK_LEN)),
    }
}
