//! List configured pins.

use std::path::PathBuf;

use anyhow::Result;
use certpin::Certificate;
use serde::Serialize;

use crate::config::PinConfig;

#[derive(Debug, Serialize)]
struct PinListing {
    host: String,
    label: Option<String>,
    certificates: Vec<PinnedFile>,
}

#[derive(Debug, Serialize)]
struct PinnedFile {
    path: PathBuf,
    /// `None` when the file could not be loaded
    fingerprint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

pub fn run_pins(config: &PinConfig, json: bool) -> Result<()> {
    let listing = list_pins(config);

    if json {
        println!("{}", serde_json::to_string_pretty(&listing)?);
        return Ok(());
    }
    if listing.is_empty() {
        println!("No pinned hosts configured");
        return Ok(());
    }

    for pin in &listing {
        match &pin.label {
            Some(label) => println!("{} ({label})", pin.host),
            None => println!("{}", pin.host),
        }
        for file in &pin.certificates {
            match (&file.fingerprint, &file.error) {
                (Some(fingerprint), _) => println!("  {fingerprint}  {}", file.path.display()),
                (None, error) => println!(
                    "  <unusable: {}>  {}",
                    error.as_deref().unwrap_or("unknown error"),
                    file.path.display()
                ),
            }
        }
    }

    Ok(())
}

/// Load every configured certificate; unusable files are recorded, not fatal.
fn list_pins(config: &PinConfig) -> Vec<PinListing> {
    config
        .pins
        .iter()
        .map(|pin| PinListing {
            host: pin.host.clone(),
            label: pin.label.clone(),
            certificates: pin
                .certificates
                .iter()
                .map(|path| {
                    let path = config.resolve(path);
                    match Certificate::from_file(&path) {
                        Ok(cert) => PinnedFile {
                            path,
                            fingerprint: Some(cert.fingerprint().to_string()),
                            error: None,
                        },
                        Err(e) => PinnedFile {
                            path,
                            fingerprint: None,
                            error: Some(e.to_string()),
                        },
                    }
                })
                .collect(),
        })
        .collect()
}
