//! Certificate fixtures for integration tests.
//!
//! Everything is generated with rcgen; nothing touches the network.

#![allow(dead_code)]

use certpin::{AuthChallenge, Certificate, TrustChain};
use rcgen::{BasicConstraints, CertificateParams, DnType, IsCa, KeyPair, KeyUsagePurpose};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::RootCertStore;

/// A certificate authority standing in for a public CA.
pub struct TestCa {
    cert: rcgen::Certificate,
    key: KeyPair,
}

impl TestCa {
    pub fn new(common_name: &str) -> Self {
        let key = KeyPair::generate().expect("Failed to generate CA key");
        let mut params = CertificateParams::new(Vec::<String>::new()).unwrap();
        params.distinguished_name.push(DnType::CommonName, common_name);
        params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
        params.key_usages = vec![
            KeyUsagePurpose::KeyCertSign,
            KeyUsagePurpose::CrlSign,
            KeyUsagePurpose::DigitalSignature,
        ];
        let cert = params.self_signed(&key).expect("Failed to build CA");
        Self { cert, key }
    }

    pub fn der(&self) -> CertificateDer<'static> {
        self.cert.der().clone()
    }

    /// A root store containing only this CA.
    pub fn root_store(&self) -> RootCertStore {
        let mut roots = RootCertStore::empty();
        roots.add(self.der()).expect("CA should be a usable trust anchor");
        roots
    }

    pub fn issue(&self, dns_name: &str) -> CertificateDer<'static> {
        let key = KeyPair::generate().expect("Failed to generate leaf key");
        let mut params = CertificateParams::new(vec![dns_name.to_string()]).unwrap();
        params.distinguished_name.push(DnType::CommonName, dns_name);
        params
            .signed_by(&key, &self.cert, &self.key)
            .expect("Failed to issue leaf")
            .der()
            .clone()
    }
}

/// Self-signed server certificate for `dns_name`.
pub fn server_cert(dns_name: &str) -> CertificateDer<'static> {
    let key = KeyPair::generate().expect("Failed to generate key");
    let mut params = CertificateParams::new(vec![dns_name.to_string()]).unwrap();
    params.distinguished_name.push(DnType::CommonName, dns_name);
    params
        .self_signed(&key)
        .expect("Failed to build certificate")
        .der()
        .clone()
}

pub fn parse(der: &CertificateDer<'_>) -> Certificate {
    Certificate::from_der(der).expect("fixture should parse")
}

/// A server-trust challenge as a TLS client would raise it for `host`.
pub fn challenge_for(host: &str, chain: Vec<CertificateDer<'static>>) -> AuthChallenge {
    let name = ServerName::try_from(host.to_string()).expect("valid host");
    let trust = TrustChain::new(chain)
        .with_server_name(name)
        .with_verify_time(UnixTime::now());
    AuthChallenge::server_trust(host, trust)
}
