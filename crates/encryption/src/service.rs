//! [`EncryptionService`]: encrypt, decrypt and probe Base64 text fields.
//!
//! # Failure model
//!
//! Configuration problems surface from [`EncryptionService::new`] as a
//! [`ConfigError`]. Once built, the service never returns an error: a failed
//! call yields `None`, plus at most one log event when logging is enabled.
//! Callers cannot tell bad input from an internal failure.

use std::io::{self, Read, Write};
use std::sync::Arc;

use crate::config::{EncryptionConfig, SECTION};
use crate::crypto::{codec, CipherError, CipherProvider, CryptoReader, CryptoWriter};
use crate::error::ConfigError;
use crate::logging::{source_chain, LoggerAdapter};

/// Decoded key or IV bytes.
///
/// Zeroed on drop and never printed.
struct KeyMaterial(Vec<u8>);

impl KeyMaterial {
    fn decode(value: &str, field: &'static str) -> Result<Self, ConfigError> {
        codec::decode(value)
            .map(Self)
            .map_err(|source| ConfigError::Malformed {
                section: SECTION.into(),
                field,
                source,
            })
    }
}

impl Drop for KeyMaterial {
    fn drop(&mut self) {
        self.0.iter_mut().for_each(|b| *b = 0);
    }
}

impl std::fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("KeyMaterial([REDACTED])")
    }
}

/// Configuration-gated text encryption.
///
/// Build once at startup and share (`Arc<EncryptionService>`); every call
/// creates its own transform and buffers, so no locking is needed.
pub struct EncryptionService {
    logger: Arc<dyn LoggerAdapter>,
    provider: Arc<dyn CipherProvider>,
    config: EncryptionConfig,
    key: KeyMaterial,
    iv: KeyMaterial,
}

impl std::fmt::Debug for EncryptionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptionService")
            .field("config", &self.config)
            .field("key", &self.key)
            .field("iv", &self.iv)
            .finish_non_exhaustive()
    }
}

impl EncryptionService {
    /// Decode the key material in `config` and build the service.
    ///
    /// When enabled, the key and IV are handed to `provider` once so that
    /// material the cipher cannot use stops startup instead of failing every
    /// call. Logs one warning if both `logging_enabled` and
    /// `log_decrypt_input` are set.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::Malformed`] if `Key` or `IV` is not Base64.
    /// - [`ConfigError::Unusable`] if the provider rejects the key or IV.
    pub fn new(
        logger: Arc<dyn LoggerAdapter>,
        provider: Arc<dyn CipherProvider>,
        config: EncryptionConfig,
    ) -> Result<Self, ConfigError> {
        let key = KeyMaterial::decode(&config.key, "Key")?;
        let iv = KeyMaterial::decode(&config.iv, "IV")?;

        if config.enabled {
            provider
                .create_encryptor(&key.0, &iv.0)
                .map_err(|source| ConfigError::Unusable {
                    section: SECTION.into(),
                    field: match source {
                        CipherError::InvalidIvLength { .. } => "IV",
                        _ => "Key",
                    },
                    source,
                })?;
        }

        if config.logging_enabled && config.log_decrypt_input {
            logger.warn(
                "Encryption input value logging has been enabled, this is intended \
                 only for troubleshooting purposes and should be disabled once completed!",
            );
        }

        Ok(Self {
            logger,
            provider,
            config,
            key,
            iv,
        })
    }

    /// The configuration the service was built with.
    pub fn config(&self) -> &EncryptionConfig {
        &self.config
    }

    /// Encrypt `plain_text` and return it as Base64.
    ///
    /// Returns `None` when the service is disabled, the input is blank, or
    /// encryption fails.
    pub fn encrypt(&self, plain_text: &str) -> Option<String> {
        if !self.accepts(plain_text) {
            return None;
        }

        match self.try_encrypt(plain_text) {
            Ok(encrypted) => Some(encrypted),
            Err(e) => {
                if self.config.logging_enabled {
                    self.log_unexpected("encrypt", &e);
                }
                None
            }
        }
    }

    /// Decrypt Base64 `encrypted_text` back to text.
    ///
    /// Returns `None` when the service is disabled, the input is blank, or
    /// decryption fails.
    pub fn decrypt(&self, encrypted_text: &str) -> Option<String> {
        if !self.accepts(encrypted_text) {
            return None;
        }

        match self.try_decrypt(encrypted_text) {
            Ok(decrypted) => Some(decrypted),
            Err(e) => {
                if !self.config.logging_enabled {
                    return None;
                }
                if self.config.log_decrypt_input {
                    let chain = source_chain(&e);
                    self.logger.error_with(
                        &e,
                        &format!("Unable to decrypt: {encrypted_text}. {e}. | {chain}"),
                    );
                } else {
                    self.log_unexpected("decrypt", &e);
                }
                None
            }
        }
    }

    /// Whether `encrypted_text` decrypts successfully.
    ///
    /// This runs a full [`decrypt`](Self::decrypt), including its logging.
    pub fn can_decrypt(&self, encrypted_text: &str) -> bool {
        if !self.accepts(encrypted_text) {
            return false;
        }
        self.decrypt(encrypted_text).is_some()
    }

    fn accepts(&self, text: &str) -> bool {
        self.config.enabled && !text.trim().is_empty()
    }

    fn try_encrypt(&self, plain_text: &str) -> Result<String, CipherError> {
        let transform = self.provider.create_encryptor(&self.key.0, &self.iv.0)?;
        let mut stream = CryptoWriter::new(Vec::new(), transform);
        stream.write_all(plain_text.as_bytes())?;
        stream.flush_final_block()?;
        Ok(codec::encode(&stream.into_inner()))
    }

    fn try_decrypt(&self, encrypted_text: &str) -> Result<String, CipherError> {
        let encrypted = codec::decode(encrypted_text).map_err(CipherError::InvalidBase64)?;
        let transform = self.provider.create_decryptor(&self.key.0, &self.iv.0)?;
        let mut stream = CryptoReader::new(encrypted.as_slice(), transform);

        // Plaintext is never longer than its ciphertext.
        let mut buffer = vec![0u8; encrypted.len()];
        let mut filled = 0;
        while filled < buffer.len() {
            let n = stream.read(&mut buffer[filled..])?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        // Run the stream to its end so the final block is always checked.
        io::copy(&mut stream, &mut io::sink())?;
        buffer.truncate(filled);

        let text = String::from_utf8(buffer).map_err(CipherError::InvalidText)?;
        Ok(text.trim_end_matches('\0').to_owned())
    }

    fn log_unexpected(&self, operation: &str, e: &CipherError) {
        let chain = source_chain(e);
        self.logger.error_with(
            e,
            &format!(
                "An unexpected error of type {} was raised in {operation}. {e}. | {chain}",
                e.kind()
            ),
        );
    }
}
