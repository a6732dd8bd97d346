//! Logger capability used by the resolver and the service.
//!
//! # Logging invariants
//!
//! - **No plaintext or key material** is ever passed to a logger.
//! - Ciphertext input reaches a log line only when `log_decrypt_input` is set.

use std::error::Error;

use tracing::{error, warn};

use crate::crypto::CipherError;

/// Sink for the few events the service emits.
#[cfg_attr(test, mockall::automock)]
pub trait LoggerAdapter: Send + Sync {
    /// Advisory event (missing section, risky settings).
    fn warn(&self, message: &str);

    /// Failure event with the error that caused it.
    fn error_with(&self, error: &CipherError, message: &str);
}

/// [`LoggerAdapter`] that emits `tracing` events under the `encryption` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl LoggerAdapter for TracingLogger {
    fn warn(&self, message: &str) {
        warn!(target: "encryption", "{message}");
    }

    fn error_with(&self, error: &CipherError, message: &str) {
        error!(target: "encryption", error = %error, kind = error.kind(), "{message}");
    }
}

/// Render the source chain of `err` as a single line, innermost last.
///
/// Returns an empty string when the error has no source.
pub fn source_chain(err: &dyn Error) -> String {
    let mut parts = Vec::new();
    let mut next = err.source();
    while let Some(cause) = next {
        parts.push(cause.to_string());
        next = cause.source();
    }
    parts.join(" <- ")
}
