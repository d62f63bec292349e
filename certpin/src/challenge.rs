//! Authentication challenges and the server chains they carry.

use std::fmt;

use rustls::pki_types::{CertificateDer, ServerName, UnixTime};

use crate::anchors::TrustedAnchorSet;

/// How the remote side asks to be authenticated.
///
/// Only [`AuthenticationMethod::ServerTrust`] is handled by a pinning
/// validator. Every other method is rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AuthenticationMethod {
    /// Prove the server's identity from its certificate chain.
    ServerTrust,
    /// The server asks the client for a certificate.
    ClientCertificate,
    HttpBasic,
    HttpDigest,
    Negotiate,
}

impl fmt::Display for AuthenticationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ServerTrust => "server-trust",
            Self::ClientCertificate => "client-certificate",
            Self::HttpBasic => "http-basic",
            Self::HttpDigest => "http-digest",
            Self::Negotiate => "negotiate",
        };
        f.write_str(name)
    }
}

/// A presented certificate chain plus the evaluator configuration for it.
///
/// The chain is owned by the network layer. A validator only sets the anchor
/// list and the anchors-only flag, then hands it to an evaluator.
#[derive(Debug, Clone)]
pub struct TrustChain {
    /// Leaf first, then intermediates in presentation order.
    certificates: Vec<CertificateDer<'static>>,
    /// Name the leaf must be valid for, when known.
    server_name: Option<ServerName<'static>>,
    /// Evaluation time; `None` means "now".
    verify_time: Option<UnixTime>,
    anchors: TrustedAnchorSet,
    anchors_only: bool,
}

impl TrustChain {
    /// Wrap a presented chain. Anchors start empty and system roots are
    /// allowed until the chain is configured otherwise.
    #[must_use]
    pub fn new(certificates: Vec<CertificateDer<'static>>) -> Self {
        Self {
            certificates,
            server_name: None,
            verify_time: None,
            anchors: TrustedAnchorSet::default(),
            anchors_only: false,
        }
    }

    /// Build a chain from the pieces rustls hands a server verifier.
    #[must_use]
    pub fn from_handshake(
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
        server_name: &ServerName<'_>,
        now: UnixTime,
    ) -> Self {
        let mut certificates = Vec::with_capacity(intermediates.len() + 1);
        certificates.push(end_entity.clone().into_owned());
        certificates.extend(intermediates.iter().map(|c| c.clone().into_owned()));
        Self::new(certificates)
            .with_server_name(server_name.to_owned())
            .with_verify_time(now)
    }

    #[must_use]
    pub fn with_server_name(mut self, server_name: ServerName<'static>) -> Self {
        self.server_name = Some(server_name);
        self
    }

    #[must_use]
    pub fn with_verify_time(mut self, time: UnixTime) -> Self {
        self.verify_time = Some(time);
        self
    }

    /// Replace the anchor list used for evaluation.
    pub fn set_anchor_certificates(&mut self, anchors: &TrustedAnchorSet) {
        self.anchors = anchors.clone();
    }

    /// Restrict evaluation to the anchor list (no system roots).
    pub fn set_anchor_certificates_only(&mut self, anchors_only: bool) {
        self.anchors_only = anchors_only;
    }

    #[must_use]
    pub fn certificates(&self) -> &[CertificateDer<'static>] {
        &self.certificates
    }

    #[must_use]
    pub fn leaf(&self) -> Option<&CertificateDer<'static>> {
        self.certificates.first()
    }

    #[must_use]
    pub fn intermediates(&self) -> &[CertificateDer<'static>] {
        self.certificates.get(1..).unwrap_or_default()
    }

    #[must_use]
    pub fn server_name(&self) -> Option<&ServerName<'static>> {
        self.server_name.as_ref()
    }

    #[must_use]
    pub fn verify_time(&self) -> Option<UnixTime> {
        self.verify_time
    }

    #[must_use]
    pub fn anchors(&self) -> &TrustedAnchorSet {
        &self.anchors
    }

    #[must_use]
    pub fn anchors_only(&self) -> bool {
        self.anchors_only
    }
}

/// A request from the network layer to authenticate a connection.
#[derive(Debug, Clone)]
pub struct AuthChallenge {
    method: AuthenticationMethod,
    /// Host the challenge was raised for. Informational only.
    host: String,
    trust: Option<TrustChain>,
}

impl AuthChallenge {
    #[must_use]
    pub fn new(
        method: AuthenticationMethod,
        host: impl Into<String>,
        trust: Option<TrustChain>,
    ) -> Self {
        Self {
            method,
            host: host.into(),
            trust,
        }
    }

    /// A server-trust challenge carrying `chain`.
    #[must_use]
    pub fn server_trust(host: impl Into<String>, chain: TrustChain) -> Self {
        Self::new(AuthenticationMethod::ServerTrust, host, Some(chain))
    }

    #[must_use]
    pub fn method(&self) -> &AuthenticationMethod {
        &self.method
    }

    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Take the chain out of the challenge.
    #[must_use]
    pub fn into_trust(self) -> Option<TrustChain> {
        self.trust
    }
}
