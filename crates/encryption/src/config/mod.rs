//! Encryption configuration: the value object and its resolver.
//!
//! The section is optional. Without it the service runs disabled; with it,
//! an enabled configuration must carry both a key and an IV or resolution
//! fails before anything else starts.

pub mod source;

pub use source::SectionSource;

use serde::{Deserialize, Deserializer};

use crate::error::ConfigError;
use crate::logging::LoggerAdapter;

/// Well-known name of the configuration section.
pub const SECTION: &str = "RnCore:Encryption";

/// Resolved encryption settings.
///
/// [`Default`] is the disabled configuration used when the section is absent.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EncryptionConfig {
    /// Master switch. When `false` every operation returns `None`.
    #[serde(deserialize_with = "flexible_bool")]
    pub enabled: bool,

    /// Base64 symmetric key. **Required** when enabled.
    pub key: String,

    /// Base64 initialization vector. **Required** when enabled.
    pub iv: String,

    /// Whether per-call failures are logged at all.
    #[serde(rename = "loggingenabled", deserialize_with = "flexible_bool")]
    pub logging_enabled: bool,

    /// Whether decrypt failures include the raw input. Troubleshooting only.
    #[serde(rename = "logdecryptinput", deserialize_with = "flexible_bool")]
    pub log_decrypt_input: bool,
}

impl std::fmt::Debug for EncryptionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Key material stays out of debug output.
        f.debug_struct("EncryptionConfig")
            .field("enabled", &self.enabled)
            .field("key", &"[REDACTED]")
            .field("iv", &"[REDACTED]")
            .field("logging_enabled", &self.logging_enabled)
            .field("log_decrypt_input", &self.log_decrypt_input)
            .finish()
    }
}

impl EncryptionConfig {
    /// Resolve the [`SECTION`] from `source`.
    ///
    /// A missing section logs a warning and yields the disabled default.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::Missing`] if enabled and `Key` or `IV` is blank.
    /// - [`ConfigError::Invalid`] if a value has the wrong type.
    /// - [`ConfigError::Source`] if the source cannot be read.
    pub fn resolve<S>(source: &S, logger: &dyn LoggerAdapter) -> Result<Self, ConfigError>
    where
        S: SectionSource + ?Sized,
    {
        let Some(section) = source.section(SECTION)? else {
            logger.warn(&format!(
                "Unable to find configuration section '{SECTION}', \
                 as a result the encryption service will be disabled."
            ));
            return Ok(Self::default());
        };

        let cfg: Self = serde_json::from_value(section).map_err(|source| ConfigError::Invalid {
            section: SECTION.into(),
            source,
        })?;

        cfg.validate()?;
        Ok(cfg)
    }

    /// Check the enabled-requires-key-material rule.
    fn validate(&self) -> Result<(), ConfigError> {
        if !self.enabled {
            return Ok(());
        }
        ensure_non_blank(&self.key, "Key")?;
        ensure_non_blank(&self.iv, "IV")?;
        Ok(())
    }
}

fn ensure_non_blank(value: &str, field: &'static str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Missing {
            section: SECTION.into(),
            field,
        });
    }
    Ok(())
}

/// Accept a JSON boolean or a `"true"` / `"false"` string in any case.
fn flexible_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
    }

    match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => Ok(b),
        Flag::Text(s) if s.trim().eq_ignore_ascii_case("true") => Ok(true),
        Flag::Text(s) if s.trim().eq_ignore_ascii_case("false") => Ok(false),
        Flag::Text(s) => Err(serde::de::Error::custom(format!(
            "expected a boolean, got '{s}'"
        ))),
    }
}
