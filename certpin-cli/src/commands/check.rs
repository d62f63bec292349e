//! Offline pinning decision for a chain stored on disk.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use certpin::{decide_with_deadline, AuthChallenge, Decision, TrustChain, TrustVerdict};
use rustls::pki_types::{CertificateDer, ServerName};

use super::{load_validator, UNTRUSTED_MESSAGE};
use crate::config::PinConfig;

/// Decide whether the chain in `chain_paths` (leaf first) would be trusted
/// for `host`.
pub async fn run_check(
    host: &str,
    chain_paths: &[PathBuf],
    certs: &[PathBuf],
    config: &PinConfig,
    json: bool,
) -> Result<()> {
    let verdict = check_chain(host, chain_paths, certs, config).await?;

    if json {
        let value = serde_json::json!({
            "host": host,
            "trusted": true,
            "verdict": verdict.to_string(),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        println!("trusted ({verdict})");
    }
    Ok(())
}

/// Run the decision and return the accepting verdict.
async fn check_chain(
    host: &str,
    chain_paths: &[PathBuf],
    certs: &[PathBuf],
    config: &PinConfig,
) -> Result<TrustVerdict> {
    let validator = load_validator(host, certs, config)?;

    let mut presented = Vec::with_capacity(chain_paths.len());
    for path in chain_paths {
        let der = std::fs::read(path)
            .with_context(|| format!("Failed to read certificate {}", path.display()))?;
        presented.push(CertificateDer::from(der));
    }

    let server_name = ServerName::try_from(host.to_string()).context("Invalid host name")?;
    let chain = TrustChain::new(presented).with_server_name(server_name);
    let challenge = AuthChallenge::server_trust(host, chain);

    let decision =
        decide_with_deadline(Arc::new(validator), challenge, config.evaluation_timeout()).await;
    match decision {
        Decision::UseCredential(credential) => Ok(credential.verdict()),
        Decision::Cancel => anyhow::bail!("{UNTRUSTED_MESSAGE}"),
    }
}
