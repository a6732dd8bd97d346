//! Symmetric cipher primitives used by the encryption service.
//!
//! This module is free of configuration and logging concerns. It provides:
//!
//! - [`cipher`]: the [`Transform`] / [`CipherProvider`] capability and the
//!   default DES-CBC provider.
//! - [`stream`]: writer and reader adapters that run bytes through a transform.
//! - [`codec`]: Base64 text encoding for keys and ciphertext.
//! - [`keygen`]: random key material.
//!
//! # Ciphertext format
//!
//! ```text
//! base64(DES-CBC(key, iv[..8], PKCS7(utf8(plaintext))))
//! ```
//!
//! There is no version prefix and no authentication tag.

pub mod cipher;
pub mod codec;
pub mod keygen;
pub mod stream;

pub use cipher::{CipherError, CipherProvider, DesCbcProvider, Transform, BLOCK_LEN, KEY_LEN};
pub use stream::{CryptoReader, CryptoWriter};
