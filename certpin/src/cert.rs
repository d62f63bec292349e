//! Certificate handles and DER loading.
//!
//! # Security
//!
//! - Input is limited to 16KB to prevent DoS
//! - The x509_parser library handles ASN.1 parsing safely
//! - Fingerprint comparison is constant-time

use std::fmt;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rustls::pki_types::CertificateDer;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use thiserror::Error;
use x509_parser::prelude::*;

/// Maximum certificate size (16KB is generous for a single cert)
pub const MAX_CERT_SIZE: usize = 16 * 1024;

/// Errors that can occur while loading an anchor certificate.
#[derive(Debug, Error)]
pub enum CertLoadError {
    /// The certificate bytes could not be read from their source.
    #[error("failed to read certificate at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The bytes were read but are not exactly one valid certificate.
    #[error("bad certificate: {0}")]
    BadCertificate(String),
}

/// SHA-256 fingerprint of a certificate's DER encoding.
///
/// Formatted as `SHA256:{url_safe_base64_no_padding}`.
#[derive(Clone)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// The prefix used for fingerprint strings.
    pub const PREFIX: &'static str = "SHA256:";

    /// Compute the fingerprint of DER bytes.
    #[must_use]
    pub fn of_der(der: &[u8]) -> Self {
        let hash = Sha256::digest(der);
        Self(format!("{}{}", Self::PREFIX, URL_SAFE_NO_PAD.encode(hash)))
    }

    /// Get the fingerprint as a string reference.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl PartialEq for Fingerprint {
    fn eq(&self, other: &Self) -> bool {
        self.0.as_bytes().ct_eq(other.0.as_bytes()).into()
    }
}

impl Eq for Fingerprint {}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", self.0)
    }
}

/// A parsed X.509 certificate.
///
/// Beyond the identity fields kept for diagnostics, the certificate is
/// treated as opaque: two certificates are equal when their DER bytes are.
#[derive(Clone)]
pub struct Certificate {
    der: CertificateDer<'static>,
    subject: String,
    issuer: String,
    not_before: i64,
    not_after: i64,
    fingerprint: Fingerprint,
}

impl Certificate {
    /// Decode exactly one DER-encoded certificate.
    ///
    /// # Errors
    ///
    /// Returns `CertLoadError::BadCertificate` if the input is empty, too
    /// large, malformed, or followed by trailing bytes.
    pub fn from_der(der: &[u8]) -> Result<Self, CertLoadError> {
        if der.is_empty() {
            return Err(CertLoadError::BadCertificate("empty input".to_string()));
        }
        // Input size validation (DoS protection)
        if der.len() > MAX_CERT_SIZE {
            return Err(CertLoadError::BadCertificate(format!(
                "certificate too large: {} bytes (max {MAX_CERT_SIZE})",
                der.len()
            )));
        }

        let (rest, cert) = X509Certificate::from_der(der)
            .map_err(|e| CertLoadError::BadCertificate(format!("{e:?}")))?;
        if !rest.is_empty() {
            return Err(CertLoadError::BadCertificate(format!(
                "{} trailing bytes after certificate",
                rest.len()
            )));
        }

        let validity = cert.validity();
        Ok(Self {
            subject: cert.subject().to_string(),
            issuer: cert.issuer().to_string(),
            not_before: validity.not_before.timestamp(),
            not_after: validity.not_after.timestamp(),
            fingerprint: Fingerprint::of_der(der),
            der: CertificateDer::from(der.to_vec()),
        })
    }

    /// Read a file and decode it as a single DER certificate.
    ///
    /// # Errors
    ///
    /// Returns `CertLoadError::Io` if the file cannot be read and
    /// `CertLoadError::BadCertificate` if its content is not one certificate.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, CertLoadError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| CertLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_der(&bytes)
    }

    /// The raw DER encoding.
    #[must_use]
    pub fn der(&self) -> &CertificateDer<'static> {
        &self.der
    }

    /// Subject distinguished name, RFC 4514 style.
    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Issuer distinguished name, RFC 4514 style.
    #[must_use]
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Start of the validity period (Unix seconds).
    #[must_use]
    pub fn not_before(&self) -> i64 {
        self.not_before
    }

    /// End of the validity period (Unix seconds).
    #[must_use]
    pub fn not_after(&self) -> i64 {
        self.not_after
    }

    #[must_use]
    pub fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }

    /// Whether `der` is byte-identical to this certificate.
    #[must_use]
    pub fn matches_der(&self, der: &[u8]) -> bool {
        self.der.as_ref() == der
    }
}

impl PartialEq for Certificate {
    fn eq(&self, other: &Self) -> bool {
        self.der.as_ref() == other.der.as_ref()
    }
}

impl Eq for Certificate {}

impl fmt::Debug for Certificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Certificate")
            .field("subject", &self.subject)
            .field("fingerprint", &self.fingerprint)
            .finish()
    }
}
