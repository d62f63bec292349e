//! Fetch a URL over a pinned TLS connection.

use std::error::Error as StdError;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use certpin::tls::build_client_config;

use super::{load_validator, UNTRUSTED_MESSAGE};
use crate::config::PinConfig;

/// GET `url`, trusting only the certificates pinned for its host.
///
/// Prints the response body to stdout.
pub async fn run_fetch(url: &str, certs: &[PathBuf], config: &PinConfig) -> Result<()> {
    let url = reqwest::Url::parse(url).context("Invalid URL")?;
    let host = url.host_str().context("URL has no host")?.to_string();

    let validator = load_validator(&host, certs, config)?;
    let tls_config =
        build_client_config(Arc::new(validator)).context("Failed to build TLS config")?;

    let client = reqwest::Client::builder()
        .use_preconfigured_tls(tls_config)
        .https_only(true)
        .build()
        .context("Failed to build HTTP client")?;

    tracing::info!(url = %url, "fetching");
    let response = match client.get(url.clone()).send().await {
        Ok(response) => response,
        Err(e) if is_certificate_rejection(&e) => {
            tracing::debug!(error = ?e, "server certificate rejected");
            anyhow::bail!("{UNTRUSTED_MESSAGE}");
        }
        Err(e) => return Err(e).with_context(|| format!("Request to {url} failed")),
    };

    let status = response.status();
    let body = response.text().await.context("Failed to read response body")?;
    tracing::info!(status = %status, bytes = body.len(), "response received");
    println!("{body}");

    Ok(())
}

/// Whether a rustls certificate error sits anywhere in the source chain.
///
/// rustls errors reach us wrapped in `io::Error`, whose `source()` skips the
/// wrapped error itself, so the inner value is unwrapped by hand.
fn is_certificate_rejection(error: &(dyn StdError + 'static)) -> bool {
    let mut current = Some(error);
    while let Some(err) = current {
        if let Some(rustls::Error::InvalidCertificate(_)) = err.downcast_ref::<rustls::Error>() {
            return true;
        }
        current = match err.downcast_ref::<std::io::Error>().and_then(|io| io.get_ref()) {
            Some(inner) => Some(inner as &(dyn StdError + 'static)),
            None => err.source(),
        };
    }
    false
}
