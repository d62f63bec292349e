//! Command implementations.

mod check;
mod fetch;
mod inspect;
mod pins;

pub use check::run_check;
pub use fetch::run_fetch;
pub use inspect::run_inspect;
pub use pins::run_pins;

use std::path::PathBuf;

use anyhow::{Context, Result};
use certpin::PinningValidator;

use crate::config::PinConfig;

/// Message shown when pinning rejects a server.
pub const UNTRUSTED_MESSAGE: &str = "connection could not be securely established";

/// Build a validator from explicit `--cert` paths, falling back to the
/// config entry for `host`.
fn load_validator(host: &str, certs: &[PathBuf], config: &PinConfig) -> Result<PinningValidator> {
    let paths = if certs.is_empty() {
        config.certificates_for(host)
    } else {
        certs.to_vec()
    };
    if paths.is_empty() {
        anyhow::bail!("no pinned certificates for {host}: pass --cert or add a [[pins]] entry");
    }

    let validator =
        PinningValidator::from_files(&paths).context("Failed to load pinned certificates")?;
    for cert in validator.trusted_certificates().iter() {
        tracing::info!(
            host = %host,
            subject = %cert.subject(),
            fingerprint = %cert.fingerprint(),
            "pinned certificate loaded"
        );
    }
    Ok(validator)
}
