//! Keyed block-cipher transforms.
//!
//! **Algorithm choice:** DES in CBC mode with PKCS#7 padding. This matches the
//! ciphertext already stored by consumers of this service; it is a 64-bit block
//! cipher and offers confidentiality only. There is no authentication tag, so a
//! tampered ciphertext is only detected if it breaks the padding.
//!
//! Other algorithms plug in by implementing [`CipherProvider`].

use std::io;

use cbc::cipher::{
    block_padding::{Padding, Pkcs7},
    generic_array::GenericArray,
    Block, BlockDecryptMut, BlockEncryptMut, KeyIvInit,
};
use thiserror::Error;

/// Byte length of a DES key (8 bytes, 56 effective bits).
pub const KEY_LEN: usize = 8;

/// Byte length of a DES block, and of the IV actually used.
pub const BLOCK_LEN: usize = 8;

type DesCbcEnc = cbc::Encryptor<des::Des>;
type DesCbcDec = cbc::Decryptor<des::Des>;

/// Errors produced while running a single encrypt or decrypt call.
#[derive(Debug, Error)]
pub enum CipherError {
    /// The key is the wrong length for the cipher.
    #[error("invalid key length: expected {expected} bytes, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    /// The IV is shorter than one cipher block.
    #[error("invalid IV length: expected at least {expected} bytes, got {actual}")]
    InvalidIvLength { expected: usize, actual: usize },

    /// The encrypted text is not valid Base64.
    #[error("encrypted text is not valid base64")]
    InvalidBase64(#[source] base64::DecodeError),

    /// The ciphertext ended part-way through a block (or was empty).
    #[error("ciphertext is not a whole number of blocks ({remaining} trailing bytes)")]
    IncompleteBlock { remaining: usize },

    /// The final block did not carry valid padding.
    #[error("invalid padding in final block")]
    InvalidPadding,

    /// The decrypted bytes are not valid UTF-8 text.
    #[error("decrypted bytes are not valid utf-8")]
    InvalidText(#[source] std::string::FromUtf8Error),

    /// A transform was used after it had been finalized.
    #[error("transform has already been finalized")]
    Finalized,

    /// The underlying byte sink or source failed.
    #[error("stream i/o failed")]
    Io(#[source] io::Error),
}

impl CipherError {
    /// Short, stable name of the failure class, safe to put in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            CipherError::InvalidKeyLength { .. } => "InvalidKeyLength",
            CipherError::InvalidIvLength { .. } => "InvalidIvLength",
            CipherError::InvalidBase64(_) => "InvalidBase64",
            CipherError::IncompleteBlock { .. } => "IncompleteBlock",
            CipherError::InvalidPadding => "InvalidPadding",
            CipherError::InvalidText(_) => "InvalidText",
            CipherError::Finalized => "Finalized",
            CipherError::Io(_) => "Io",
        }
    }
}

impl From<io::Error> for CipherError {
    /// Unwraps a [`CipherError`] that was tunnelled through `std::io` by the
    /// stream adapters; any other I/O error is kept as [`CipherError::Io`].
    fn from(err: io::Error) -> Self {
        if !err.get_ref().is_some_and(|inner| inner.is::<CipherError>()) {
            return CipherError::Io(err);
        }
        match err.into_inner().map(|inner| inner.downcast::<CipherError>()) {
            Some(Ok(inner)) => *inner,
            _ => CipherError::Io(io::Error::other("cipher error lost while unwrapping")),
        }
    }
}

impl From<CipherError> for io::Error {
    fn from(err: CipherError) -> Self {
        match err {
            CipherError::Io(inner) => inner,
            other => io::Error::new(io::ErrorKind::InvalidData, other),
        }
    }
}

/// A keyed, stateful byte transform created for a single call.
///
/// Bytes are pushed through [`update`](Transform::update) in any chunking;
/// complete output is appended to `output` as it becomes available.
/// [`finalize`](Transform::finalize) emits (or validates) the padded final
/// block. A transform cannot be reused after it has been finalized.
#[cfg_attr(test, mockall::automock)]
pub trait Transform: Send {
    /// Feed `input` and append any completed output bytes.
    fn update(&mut self, input: &[u8], output: &mut Vec<u8>) -> Result<(), CipherError>;

    /// Flush the final block, appending its output bytes.
    fn finalize(&mut self, output: &mut Vec<u8>) -> Result<(), CipherError>;
}

/// Creates keyed encrypt and decrypt transforms.
#[cfg_attr(test, mockall::automock)]
pub trait CipherProvider: Send + Sync {
    /// Create a transform that encrypts with `key` and `iv`.
    fn create_encryptor(&self, key: &[u8], iv: &[u8]) -> Result<Box<dyn Transform>, CipherError>;

    /// Create a transform that decrypts with `key` and `iv`.
    fn create_decryptor(&self, key: &[u8], iv: &[u8]) -> Result<Box<dyn Transform>, CipherError>;
}

/// DES-CBC with PKCS#7 padding.
///
/// The key must be exactly [`KEY_LEN`] bytes. The IV must be at least
/// [`BLOCK_LEN`] bytes; only the first block of it is used.
#[derive(Debug, Clone, Copy, Default)]
pub struct DesCbcProvider;

impl CipherProvider for DesCbcProvider {
    fn create_encryptor(&self, key: &[u8], iv: &[u8]) -> Result<Box<dyn Transform>, CipherError> {
        Ok(Box::new(CbcEncryptTransform {
            cipher: build_cipher(key, iv)?,
            pending: Vec::with_capacity(BLOCK_LEN),
            finished: false,
        }))
    }

    fn create_decryptor(&self, key: &[u8], iv: &[u8]) -> Result<Box<dyn Transform>, CipherError> {
        Ok(Box::new(CbcDecryptTransform {
            cipher: build_cipher(key, iv)?,
            pending: Vec::with_capacity(BLOCK_LEN),
            finished: false,
        }))
    }
}

fn build_cipher<C: KeyIvInit>(key: &[u8], iv: &[u8]) -> Result<C, CipherError> {
    if key.len() != KEY_LEN {
        return Err(CipherError::InvalidKeyLength {
            expected: KEY_LEN,
            actual: key.len(),
        });
    }
    if iv.len() < BLOCK_LEN {
        return Err(CipherError::InvalidIvLength {
            expected: BLOCK_LEN,
            actual: iv.len(),
        });
    }
    C::new_from_slices(key, &iv[..BLOCK_LEN]).map_err(|_| CipherError::InvalidKeyLength {
        expected: KEY_LEN,
        actual: key.len(),
    })
}

struct CbcEncryptTransform {
    cipher: DesCbcEnc,
    /// Bytes not yet forming a whole block.
    pending: Vec<u8>,
    finished: bool,
}

impl Transform for CbcEncryptTransform {
    fn update(&mut self, input: &[u8], output: &mut Vec<u8>) -> Result<(), CipherError> {
        if self.finished {
            return Err(CipherError::Finalized);
        }
        self.pending.extend_from_slice(input);

        let whole = self.pending.len() - self.pending.len() % BLOCK_LEN;
        for chunk in self.pending[..whole].chunks_exact(BLOCK_LEN) {
            let mut block: Block<DesCbcEnc> = GenericArray::clone_from_slice(chunk);
            self.cipher.encrypt_block_mut(&mut block);
            output.extend_from_slice(&block);
        }
        self.pending.drain(..whole);
        Ok(())
    }

    fn finalize(&mut self, output: &mut Vec<u8>) -> Result<(), CipherError> {
        if self.finished {
            return Err(CipherError::Finalized);
        }
        self.finished = true;

        // `pending` is always shorter than a block here; PKCS#7 fills the rest
        // (a whole extra block when the input was block-aligned).
        let pos = self.pending.len();
        let mut block: Block<DesCbcEnc> = GenericArray::default();
        block[..pos].copy_from_slice(&self.pending);
        Pkcs7::pad(&mut block, pos);
        self.cipher.encrypt_block_mut(&mut block);
        output.extend_from_slice(&block);
        self.pending.clear();
        Ok(())
    }
}

struct CbcDecryptTransform {
    cipher: DesCbcDec,
    /// Undecrypted bytes; always holds back the last whole block so its
    /// padding can be checked in `finalize`.
    pending: Vec<u8>,
    finished: bool,
}

impl Transform for CbcDecryptTransform {
    fn update(&mut self, input: &[u8], output: &mut Vec<u8>) -> Result<(), CipherError> {
        if self.finished {
            return Err(CipherError::Finalized);
        }
        self.pending.extend_from_slice(input);
        if self.pending.len() <= BLOCK_LEN {
            return Ok(());
        }

        let mut ready = self.pending.len() - self.pending.len() % BLOCK_LEN;
        if ready == self.pending.len() {
            ready -= BLOCK_LEN;
        }
        for chunk in self.pending[..ready].chunks_exact(BLOCK_LEN) {
            let mut block: Block<DesCbcDec> = GenericArray::clone_from_slice(chunk);
            self.cipher.decrypt_block_mut(&mut block);
            output.extend_from_slice(&block);
        }
        self.pending.drain(..ready);
        Ok(())
    }

    fn finalize(&mut self, output: &mut Vec<u8>) -> Result<(), CipherError> {
        if self.finished {
            return Err(CipherError::Finalized);
        }
        self.finished = true;

        if self.pending.len() != BLOCK_LEN {
            return Err(CipherError::IncompleteBlock {
                remaining: self.pending.len(),
            });
        }
        let mut block: Block<DesCbcDec> = GenericArray::clone_from_slice(&self.pending);
        self.cipher.decrypt_block_mut(&mut block);
        let plain = Pkcs7::unpad(&block).map_err(|_| CipherError::InvalidPadding)?;
        output.extend_from_slice(plain);
        self.pending.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: [u8; KEY_LEN] = [174, 24, 30, 83, 12, 25, 215, 48];
    const IV: [u8; BLOCK_LEN] = [231, 254, 102, 26, 219, 118, 196, 80];

    fn run(transform: &mut dyn Transform, input: &[u8], chunk: usize) -> Result<Vec<u8>, CipherError> {
        let mut out = Vec::new();
        for piece in input.chunks(chunk.max(1)) {
            transform.update(piece, &mut out)?;
        }
        transform.finalize(&mut out)?;
        Ok(out)
    }

    fn encrypt(plain: &[u8]) -> Vec<u8> {
        let mut enc = DesCbcProvider.create_encryptor(&KEY, &IV).unwrap();
        run(enc.as_mut(), plain, plain.len()).unwrap()
    }

    #[test]
    fn encrypt_decrypt_round_trip() {
        let plain = b"123-45-6789";
        let cipher = encrypt(plain);
        assert_eq!(cipher.len(), 16);

        let mut dec = DesCbcProvider.create_decryptor(&KEY, &IV).unwrap();
        assert_eq!(run(dec.as_mut(), &cipher, cipher.len()).unwrap(), plain);
    }

    #[test]
    fn block_aligned_input_gets_a_full_padding_block() {
        let cipher = encrypt(b"12345678");
        assert_eq!(cipher.len(), 2 * BLOCK_LEN);
    }

    #[test]
    fn chunking_does_not_change_output() {
        let plain = b"The quick brown fox jumps over the lazy dog";
        let whole = encrypt(plain);

        for chunk in [1, 3, 7, 8, 9, 64] {
            let mut enc = DesCbcProvider.create_encryptor(&KEY, &IV).unwrap();
            assert_eq!(run(enc.as_mut(), plain, chunk).unwrap(), whole, "chunk {chunk}");

            let mut dec = DesCbcProvider.create_decryptor(&KEY, &IV).unwrap();
            assert_eq!(run(dec.as_mut(), &whole, chunk).unwrap(), plain, "chunk {chunk}");
        }
    }

    #[test]
    fn only_first_block_of_long_iv_is_used() {
        let mut long_iv = IV.to_vec();
        long_iv.extend_from_slice(&[1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11]);

        let mut enc = DesCbcProvider.create_encryptor(&KEY, &long_iv).unwrap();
        let out = run(enc.as_mut(), b"hello", 5).unwrap();
        assert_eq!(out, encrypt(b"hello"));
    }

    #[test]
    fn invalid_key_length_rejected() {
        let err = DesCbcProvider.create_encryptor(&[0u8; 16], &IV).err().unwrap();
        assert!(matches!(
            err,
            CipherError::InvalidKeyLength { expected: 8, actual: 16 }
        ));
    }

    #[test]
    fn short_iv_rejected() {
        let err = DesCbcProvider.create_decryptor(&KEY, &IV[..4]).err().unwrap();
        assert!(matches!(err, CipherError::InvalidIvLength { actual: 4, .. }));
    }

    #[test]
    fn partial_block_fails_on_finalize() {
        let mut cipher = encrypt(b"hello world");
        cipher.pop();
        let mut dec = DesCbcProvider.create_decryptor(&KEY, &IV).unwrap();
        let err = run(dec.as_mut(), &cipher, cipher.len()).unwrap_err();
        assert!(matches!(err, CipherError::IncompleteBlock { remaining: 7 }));
    }

    #[test]
    fn empty_ciphertext_fails_on_finalize() {
        let mut dec = DesCbcProvider.create_decryptor(&KEY, &IV).unwrap();
        let err = run(dec.as_mut(), &[], 1).unwrap_err();
        assert!(matches!(err, CipherError::IncompleteBlock { remaining: 0 }));
    }

    #[test]
    fn transform_cannot_be_reused_after_finalize() {
        let mut enc = DesCbcProvider.create_encryptor(&KEY, &IV).unwrap();
        let mut out = Vec::new();
        enc.finalize(&mut out).unwrap();
        assert!(matches!(enc.update(b"x", &mut out), Err(CipherError::Finalized)));
        assert!(matches!(enc.finalize(&mut out), Err(CipherError::Finalized)));
    }

    #[test]
    fn wrong_key_does_not_recover_plaintext() {
        let cipher = encrypt(b"secret value");
        let other_key = [1u8, 2, 3, 4, 5, 6, 7, 8];
        let mut dec = DesCbcProvider.create_decryptor(&other_key, &IV).unwrap();
        let result = run(dec.as_mut(), &cipher, cipher.len()).ok();
        assert_ne!(result.as_deref(), Some(&b"secret value"[..]));
    }

    #[test]
    fn io_error_round_trips_cipher_error() {
        let io_err: io::Error = CipherError::InvalidPadding.into();
        assert_eq!(io_err.kind(), io::ErrorKind::InvalidData);
        assert!(matches!(CipherError::from(io_err), CipherError::InvalidPadding));

        let plain = io::Error::new(io::ErrorKind::BrokenPipe, "sink closed");
        let err = CipherError::from(plain);
        assert_eq!(err.kind(), "Io");
    }
}
