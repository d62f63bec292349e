//! rustls integration.
//!
//! Provides client-side TLS configuration using rustls 0.23+.
//!
//! # Verifiers
//!
//! - [`PinnedServerVerifier`]: Raises a server-trust challenge for every
//!   handshake and lets an injected [`ChallengeDecider`] accept or cancel it

use std::fmt;
use std::sync::Arc;

use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::CryptoProvider;
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{CertificateError, ClientConfig, DigitallySignedStruct, SignatureScheme};

use crate::challenge::{AuthChallenge, TrustChain};
use crate::validator::{ChallengeDecider, Decision};

/// Server certificate verifier that defers the trust decision to a
/// [`ChallengeDecider`].
///
/// # Security
///
/// - The decider sees the full presented chain, the server name and the
///   handshake time
/// - `Cancel` aborts the handshake
/// - Handshake signatures are still verified against the leaf key
pub struct PinnedServerVerifier<D: ?Sized> {
    decider: Arc<D>,
    provider: Arc<CryptoProvider>,
}

impl<D: ChallengeDecider + ?Sized> PinnedServerVerifier<D> {
    /// Create a verifier backed by `decider`.
    pub fn new(decider: Arc<D>) -> Arc<Self> {
        Arc::new(Self {
            decider,
            provider: Arc::new(rustls::crypto::ring::default_provider()),
        })
    }
}

impl<D: ?Sized> fmt::Debug for PinnedServerVerifier<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PinnedServerVerifier").finish_non_exhaustive()
    }
}

impl<D: ChallengeDecider + ?Sized + 'static> ServerCertVerifier for PinnedServerVerifier<D> {
    fn verify_server_cert(
        &self,
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
        server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        let chain = TrustChain::from_handshake(end_entity, intermediates, server_name, now);
        let challenge = AuthChallenge::server_trust(server_name.to_str(), chain);

        match self.decider.decide(challenge) {
            Decision::UseCredential(_) => Ok(ServerCertVerified::assertion()),
            Decision::Cancel => Err(rustls::Error::InvalidCertificate(
                CertificateError::ApplicationVerificationFailure,
            )),
        }
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls12_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls13_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.provider
            .signature_verification_algorithms
            .supported_schemes()
    }
}

/// Build a TLS client config whose server trust is decided by `decider`.
///
/// No client certificate is presented.
///
/// # Errors
///
/// Returns an error if the ring provider cannot be used with the default
/// protocol versions.
pub fn build_client_config<D>(decider: Arc<D>) -> Result<ClientConfig, rustls::Error>
where
    D: ChallengeDecider + ?Sized + 'static,
{
    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let config = ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()?
        .dangerous()
        .with_custom_certificate_verifier(PinnedServerVerifier::new(decider))
        .with_no_client_auth();

    Ok(config)
}
