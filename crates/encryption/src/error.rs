//! Configuration error types.
//!
//! Every variant here is fatal: it is raised while resolving configuration or
//! constructing the [`EncryptionService`](crate::EncryptionService), before the
//! service can be used. Per-call failures are [`CipherError`](crate::CipherError)s
//! and never leave the service.

use thiserror::Error;

use crate::crypto::CipherError;

/// Errors raised while resolving or applying the encryption configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Encryption is enabled but a required value is blank.
    #[error("configuration section '{section}' is missing required value '{field}'")]
    Missing {
        /// Section the value was expected in.
        section: String,
        /// Name of the missing field (`Key` or `IV`).
        field: &'static str,
    },

    /// A key or IV value is not valid Base64.
    #[error("configuration value '{section}:{field}' is not valid base64")]
    Malformed {
        /// Section the value was read from.
        section: String,
        /// Name of the malformed field (`Key` or `IV`).
        field: &'static str,
        /// Underlying decoder error.
        #[source]
        source: base64::DecodeError,
    },

    /// A key or IV decodes but the cipher refuses it (usually its length).
    #[error("configuration value '{section}:{field}' cannot be used by the cipher")]
    Unusable {
        /// Section the value was read from.
        section: String,
        /// Name of the rejected field (`Key` or `IV`).
        field: &'static str,
        /// Cipher's reason for refusing it.
        #[source]
        source: CipherError,
    },

    /// The section exists but one of its values has the wrong shape.
    #[error("configuration section '{section}' could not be bound")]
    Invalid {
        /// Section that failed to bind.
        section: String,
        /// Underlying binding error.
        #[source]
        source: serde_json::Error,
    },

    /// The configuration source itself could not be read.
    #[error("configuration source could not be read")]
    Source(#[from] ::config::ConfigError),
}

impl ConfigError {
    /// Name of the offending field, when the error concerns a single value.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            ConfigError::Missing { field, .. }
            | ConfigError::Malformed { field, .. }
            | ConfigError::Unusable { field, .. } => Some(field),
            ConfigError::Invalid { .. } | ConfigError::Source(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine as _;

    #[test]
    fn field_names_the_offending_value() {
        let missing = ConfigError::Missing {
            section: "RnCore:Encryption".into(),
            field: "Key",
        };
        assert_eq!(missing.field(), Some("Key"));

        let source = base64::engine::general_purpose::STANDARD
            .decode("!!")
            .unwrap_err();
        let malformed = ConfigError::Malformed {
            section: "RnCore:Encryption".into(),
            field: "IV",
            source,
        };
        assert_eq!(malformed.field(), Some("IV"));
    }

    #[test]
    fn display_includes_section_and_field() {
        let e = ConfigError::Missing {
            section: "RnCore:Encryption".into(),
            field: "IV",
        };
        let msg = e.to_string();
        assert!(msg.contains("RnCore:Encryption"));
        assert!(msg.contains("'IV'"));
    }

    #[test]
    fn unusable_keeps_cipher_reason() {
        let e = ConfigError::Unusable {
            section: "RnCore:Encryption".into(),
            field: "Key",
            source: CipherError::InvalidKeyLength {
                expected: 8,
                actual: 16,
            },
        };
        assert_eq!(e.field(), Some("Key"));
        assert!(e.to_string().contains("'RnCore:Encryption:Key'"));
        let source = std::error::Error::source(&e).unwrap();
        assert!(source.to_string().contains("16"));
    }

    #[test]
    fn invalid_has_no_single_field() {
        let source = serde_json::from_str::<bool>("\"maybe\"").unwrap_err();
        let e = ConfigError::Invalid {
            section: "RnCore:Encryption".into(),
            source,
        };
        assert_eq!(e.field(), None);
        assert!(std::error::Error::source(&e).is_some());
    }
}
