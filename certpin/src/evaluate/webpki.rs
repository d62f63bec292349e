//! Default evaluator backed by rustls' webpki verification primitives.

use std::sync::Arc;

use rustls::client::{verify_server_cert_signed_by_trust_anchor, verify_server_name};
use rustls::crypto::CryptoProvider;
use rustls::pki_types::UnixTime;
use rustls::server::ParsedCertificate;
use rustls::{CertificateError, RootCertStore};
use x509_parser::prelude::*;

use super::{EvaluationError, TrustEvaluator, TrustVerdict};
use crate::challenge::TrustChain;

/// Evaluates chains with webpki path validation.
///
/// Anchors come from the chain. System roots are mixed in only when the
/// chain's anchors-only flag is off. A leaf that is byte-identical to an
/// anchor terminates the chain at that anchor without path building.
#[derive(Debug, Clone)]
pub struct WebPkiEvaluator {
    system_roots: Arc<RootCertStore>,
    provider: Arc<CryptoProvider>,
}

impl WebPkiEvaluator {
    /// Evaluator whose system roots are the Mozilla root program.
    #[must_use]
    pub fn new() -> Self {
        Self::with_system_roots(RootCertStore {
            roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
        })
    }

    /// Evaluator with a custom set of system roots.
    #[must_use]
    pub fn with_system_roots(system_roots: RootCertStore) -> Self {
        Self {
            system_roots: Arc::new(system_roots),
            provider: Arc::new(rustls::crypto::ring::default_provider()),
        }
    }

    fn root_store(&self, chain: &TrustChain) -> Result<RootCertStore, rustls::Error> {
        let mut roots = RootCertStore::empty();
        for anchor in chain.anchors().iter() {
            roots.add(anchor.der().clone())?;
        }
        if !chain.anchors_only() {
            roots.extend(self.system_roots.roots.iter().cloned());
        }
        Ok(roots)
    }
}

impl Default for WebPkiEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl TrustEvaluator for WebPkiEvaluator {
    fn evaluate(&self, chain: &TrustChain) -> Result<TrustVerdict, EvaluationError> {
        let leaf = chain.leaf().ok_or(EvaluationError::EmptyChain)?;
        let now = chain.verify_time().unwrap_or_else(UnixTime::now);

        let Ok(parsed_leaf) = ParsedCertificate::try_from(leaf) else {
            return Ok(TrustVerdict::Invalid);
        };

        let mut periods = Vec::with_capacity(chain.certificates().len());
        for (index, der) in chain.certificates().iter().enumerate() {
            let Ok((_, cert)) = X509Certificate::from_der(der) else {
                tracing::debug!(index, "unparseable certificate in presented chain");
                return Ok(TrustVerdict::Invalid);
            };
            let validity = cert.validity();
            periods.push((validity.not_before.timestamp(), validity.not_after.timestamp()));
        }

        let roots = match self.root_store(chain) {
            Ok(roots) => roots,
            Err(e) => {
                tracing::debug!(error = %e, "anchor rejected as trust anchor");
                return Ok(TrustVerdict::InvalidTrustSetting);
            }
        };

        // A pinned leaf skips path building, so intermediates are checked here too.
        let now_secs = i64::try_from(now.as_secs()).unwrap_or(i64::MAX);
        for (index, (not_before, not_after)) in periods.into_iter().enumerate() {
            if now_secs < not_before || now_secs > not_after {
                tracing::debug!(
                    index,
                    not_before,
                    not_after,
                    now = now_secs,
                    "certificate not valid now"
                );
                return Ok(TrustVerdict::RecoverableTrustFailure);
            }
        }

        if !chain.anchors().contains_der(leaf) {
            if let Err(e) = verify_server_cert_signed_by_trust_anchor(
                &parsed_leaf,
                &roots,
                chain.intermediates(),
                now,
                self.provider.signature_verification_algorithms.all,
            ) {
                return classify(e);
            }
        }

        if let Some(name) = chain.server_name() {
            if let Err(e) = verify_server_name(&parsed_leaf, name) {
                tracing::debug!(error = %e, "leaf not valid for server name");
                return Ok(TrustVerdict::RecoverableTrustFailure);
            }
        }

        Ok(TrustVerdict::Proceed)
    }
}

/// Map a webpki path-validation failure onto a verdict.
fn classify(error: rustls::Error) -> Result<TrustVerdict, EvaluationError> {
    let rustls::Error::InvalidCertificate(cert_error) = error else {
        return Err(EvaluationError::Backend(error.to_string()));
    };
    tracing::debug!(error = ?cert_error, "path validation failed");

    let verdict = match cert_error {
        CertificateError::UnknownIssuer
        | CertificateError::Expired
        | CertificateError::NotValidYet
        | CertificateError::NotValidForName => TrustVerdict::RecoverableTrustFailure,
        CertificateError::BadEncoding => TrustVerdict::Invalid,
        CertificateError::Revoked => TrustVerdict::OtherDeny,
        CertificateError::BadSignature
        | CertificateError::UnhandledCriticalExtension
        | CertificateError::InvalidPurpose => TrustVerdict::FatalTrustFailure,
        // Anything else webpki rejects is not fixable by configuration.
        _ => TrustVerdict::FatalTrustFailure,
    };
    Ok(verdict)
}
