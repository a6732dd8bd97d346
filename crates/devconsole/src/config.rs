//! Command-line flags and configuration source for the developer console.
//!
//! The encryption section is read from an optional JSON settings file and
//! then from `DEVCONSOLE_`-prefixed environment variables, which win. Nested
//! keys use `__`, e.g. `DEVCONSOLE_RNCORE__ENCRYPTION__ENABLED=true`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "DEVCONSOLE";

/// Developer console for the encryption service.
#[derive(Debug, Parser)]
#[command(name = "devconsole", version)]
pub struct Cli {
    /// JSON settings file holding the `RnCore:Encryption` section.
    #[arg(long, env = "SETTINGS_PATH", default_value = "appsettings.json")]
    pub settings: PathBuf,

    /// Tracing log level (e.g. `info`, `debug`). `RUST_LOG` takes precedence.
    #[arg(long, env = "LOG_LEVEL", default_value_t = default_log_level())]
    pub log_level: String,

    /// Emit logs as JSON lines.
    #[arg(long)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// What to run. Defaults to a round trip of `Hello World!`.
#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Encrypt then decrypt a value and print both results.
    Roundtrip {
        #[arg(default_value = "Hello World!")]
        text: String,
    },
    /// Encrypt a value.
    Encrypt { text: String },
    /// Decrypt a Base64 value.
    Decrypt { text: String },
    /// Report whether a Base64 value decrypts.
    CanDecrypt { text: String },
    /// Print a fresh random key and IV for the settings file.
    GenerateKey,
}

impl Default for Command {
    fn default() -> Self {
        Command::Roundtrip {
            text: "Hello World!".into(),
        }
    }
}

fn default_log_level() -> String {
    "info".into()
}

/// Build the layered configuration source.
///
/// # Errors
///
/// Returns an error if the settings file exists but cannot be parsed.
pub fn load_source(settings: &Path) -> Result<::config::Config> {
    ::config::Config::builder()
        .add_source(
            ::config::File::from(settings)
                .format(::config::FileFormat::Json)
                .required(false),
        )
        .add_source(
            ::config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__"),
        )
        .build()
        .with_context(|| format!("failed to load settings from {}", settings.display()))
}
