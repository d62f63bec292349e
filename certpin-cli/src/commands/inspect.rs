//! Show the identity of a certificate file.

use std::path::Path;

use anyhow::{Context, Result};
use certpin::Certificate;

use crate::utils::format_timestamp_secs;

pub fn run_inspect(path: &Path, json: bool) -> Result<()> {
    let cert = Certificate::from_file(path)
        .with_context(|| format!("Failed to load {}", path.display()))?;

    if json {
        let value = serde_json::json!({
            "subject": cert.subject(),
            "issuer": cert.issuer(),
            "not_before": cert.not_before(),
            "not_after": cert.not_after(),
            "fingerprint": cert.fingerprint().as_str(),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        println!("Subject:     {}", cert.subject());
        println!("Issuer:      {}", cert.issuer());
        println!("Not before:  {}", format_timestamp_secs(cert.not_before()));
        println!("Not after:   {}", format_timestamp_secs(cert.not_after()));
        println!("Fingerprint: {}", cert.fingerprint());
    }

    Ok(())
}
