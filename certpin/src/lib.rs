//! Certificate pinning for TLS clients.
//!
//! A [`PinningValidator`] holds a fixed set of trusted certificates and
//! answers server-trust [`AuthChallenge`]s: the presented chain is evaluated
//! against those certificates only, never against the system trust store.
//!
//! Collaborators are injected via traits:
//! - [`TrustEvaluator`] - Raw chain evaluation (defaults to [`WebPkiEvaluator`])
//! - [`ChallengeDecider`] - What a network layer asks for a decision
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use certpin::{tls::build_client_config, PinningValidator};
//!
//! let validator = PinningValidator::from_file("www.example.com.cer")?;
//! let config = build_client_config(Arc::new(validator))?;
//! // hand `config` to any rustls-based client
//! ```

pub mod anchors;
pub mod cert;
pub mod challenge;
pub mod evaluate;
pub mod tls;
pub mod validator;

#[cfg(test)]
mod testing;

pub use anchors::TrustedAnchorSet;
pub use cert::{CertLoadError, Certificate, Fingerprint, MAX_CERT_SIZE};
pub use challenge::{AuthChallenge, AuthenticationMethod, TrustChain};
pub use evaluate::{EvaluationError, TrustEvaluator, TrustVerdict, WebPkiEvaluator};
pub use validator::{
    decide_with_deadline, ChallengeDecider, Credential, Decision, PinningValidator, Rejection,
};
