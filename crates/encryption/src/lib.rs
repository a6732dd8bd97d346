//! Configuration-gated symmetric encryption for text fields.
//!
//! Resolve an [`EncryptionConfig`] from a [`SectionSource`], build an
//! [`EncryptionService`], then call [`encrypt`](EncryptionService::encrypt),
//! [`decrypt`](EncryptionService::decrypt) and
//! [`can_decrypt`](EncryptionService::can_decrypt). Results are Base64 text;
//! `None` means "could not process" (disabled, blank input, or failure).
//!
//! ```no_run
//! let source = serde_json::json!({
//!     "RnCore": { "Encryption": {
//!         "Enabled": true,
//!         "Key": "rigeU7mR2zA=",
//!         "IV": "5ffasfasg4w/stkaYXm/+Mi4Aw=",
//!     } }
//! });
//! let service = encryption::from_source(&source)?;
//! let stored = service.encrypt("Hello World");
//! # Ok::<(), encryption::ConfigError>(())
//! ```

pub mod config;
pub mod crypto;
pub mod error;
pub mod logging;
pub mod service;

use std::sync::Arc;

pub use config::{EncryptionConfig, SectionSource, SECTION};
pub use crypto::{CipherError, CipherProvider, DesCbcProvider};
pub use error::ConfigError;
pub use logging::{LoggerAdapter, TracingLogger};
pub use service::EncryptionService;

/// Resolve configuration from `source` and build a service that logs through
/// `tracing` and encrypts with [`DesCbcProvider`].
///
/// # Errors
///
/// Returns any [`ConfigError`] from resolution or construction; both are
/// meant to stop startup.
pub fn from_source<S>(source: &S) -> Result<EncryptionService, ConfigError>
where
    S: SectionSource + ?Sized,
{
    let logger: Arc<dyn LoggerAdapter> = Arc::new(TracingLogger);
    let config = EncryptionConfig::resolve(source, logger.as_ref())?;
    EncryptionService::new(logger, Arc::new(DesCbcProvider), config)
}
