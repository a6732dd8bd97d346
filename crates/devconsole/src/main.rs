//! `devconsole`: exercise the encryption service from the command line.
//!
//! Startup sequence:
//! 1. Parse flags.
//! 2. Initialise tracing.
//! 3. Load the settings file + environment overrides.
//! 4. Resolve the `RnCore:Encryption` section and build the service.
//! 5. Run the requested command and print its result to stdout.

mod config;
mod telemetry;

use std::io::{self, Write};

use anyhow::{Context, Result};
use clap::Parser;
use encryption::{crypto::keygen, EncryptionService};
use tracing::info;

use crate::config::{Cli, Command};

/// Printed in place of an absent result.
const NONE: &str = "<none>";

fn main() -> Result<()> {
    // -----------------------------------------------------------------------
    // 1. Flags
    // -----------------------------------------------------------------------
    let cli = Cli::parse();

    // -----------------------------------------------------------------------
    // 2. Telemetry
    // -----------------------------------------------------------------------
    telemetry::init_telemetry(&cli.log_level, cli.json_logs)?;
    info!(version = env!("CARGO_PKG_VERSION"), "devconsole starting");

    let command = cli.command.unwrap_or_default();
    let mut out = io::stdout().lock();

    // Key generation needs no configuration.
    if command == Command::GenerateKey {
        return print_generated_key(&mut out).context("failed to write output");
    }

    // -----------------------------------------------------------------------
    // 3. Configuration
    // -----------------------------------------------------------------------
    let source = crate::config::load_source(&cli.settings)?;

    // -----------------------------------------------------------------------
    // 4. Service
    // -----------------------------------------------------------------------
    let service = encryption::from_source(&source).map_err(|e| {
        tracing::error!(error = %e, "encryption configuration invalid");
        e
    })?;
    info!(enabled = service.config().enabled, "encryption service ready");

    // -----------------------------------------------------------------------
    // 5. Command
    // -----------------------------------------------------------------------
    run(&service, &command, &mut out).context("failed to write output")
}

/// Execute `command` against `service`, writing results to `out`.
fn run(service: &EncryptionService, command: &Command, out: &mut impl Write) -> io::Result<()> {
    match command {
        Command::Roundtrip { text } => {
            let encrypted = service.encrypt(text);
            let decrypted = encrypted.as_deref().and_then(|e| service.decrypt(e));
            writeln!(out, "{}", encrypted.as_deref().unwrap_or(NONE))?;
            writeln!(out, "{}", decrypted.as_deref().unwrap_or(NONE))?;
        }
        Command::Encrypt { text } => {
            writeln!(out, "{}", service.encrypt(text).as_deref().unwrap_or(NONE))?;
        }
        Command::Decrypt { text } => {
            writeln!(out, "{}", service.decrypt(text).as_deref().unwrap_or(NONE))?;
        }
        Command::CanDecrypt { text } => {
            writeln!(out, "{}", service.can_decrypt(text))?;
        }
        Command::GenerateKey => print_generated_key(out)?,
    }
    Ok(())
}

fn print_generated_key(out: &mut impl Write) -> io::Result<()> {
    let generated = keygen::generate();
    writeln!(out, "Key: {}", generated.key)?;
    writeln!(out, "IV:  {}", generated.iv)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn service(enabled: bool) -> EncryptionService {
        let source = json!({ "RnCore": { "Encryption": {
            "Enabled": enabled,
            "Key": "rigeU7mR2zA=",
            "IV": "5ffasfasg4w/stkaYXm/+Mi4Aw=",
        } } });
        encryption::from_source(&source).unwrap()
    }

    fn output(service: &EncryptionService, command: Command) -> String {
        let mut out = Vec::new();
        run(service, &command, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn roundtrip_prints_ciphertext_then_plaintext() {
        let printed = output(&service(true), Command::Roundtrip { text: "Hello World".into() });
        assert_eq!(printed, "4+xz0sKZYMUEF7bU6tZ20A==\nHello World\n");
    }

    #[test]
    fn disabled_service_prints_none() {
        let printed = output(&service(false), Command::default());
        assert_eq!(printed, "<none>\n<none>\n");
    }

    #[test]
    fn decrypt_and_probe() {
        let svc = service(true);
        assert_eq!(
            output(&svc, Command::Decrypt { text: "4+xz0sKZYMUEF7bU6tZ20A==".into() }),
            "Hello World\n"
        );
        assert_eq!(
            output(&svc, Command::CanDecrypt { text: "not-valid-base64!!".into() }),
            "false\n"
        );
        assert_eq!(
            output(&svc, Command::Encrypt { text: "   ".into() }),
            "<none>\n"
        );
    }

    #[test]
    fn generate_key_prints_both_values() {
        let printed = output(&service(false), Command::GenerateKey);
        let lines: Vec<_> = printed.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("Key: "));
        assert!(lines[1].starts_with("IV:  "));
    }
}
