//! Raw trust evaluation.
//!
//! A [`TrustEvaluator`] is the only source of trust truth: given a configured
//! [`TrustChain`](crate::TrustChain) it answers with a [`TrustVerdict`]. It
//! reads the anchor list and the anchors-only flag from the chain. The
//! validator never builds chains itself.

mod webpki;

use std::fmt;
use std::sync::Arc;

use crate::challenge::TrustChain;

pub use webpki::WebPkiEvaluator;

/// Categorical outcome of evaluating a chain against its anchors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum TrustVerdict {
    /// The chain is trusted.
    Proceed,
    /// The chain is trusted, with no explicit trust setting involved.
    Unspecified,
    /// Not trusted, but a different configuration could make it trusted
    /// (unknown issuer, expired, wrong name).
    RecoverableTrustFailure,
    /// Not trusted, and no configuration change would fix it.
    FatalTrustFailure,
    /// The chain could not be evaluated as given.
    Invalid,
    /// A certificate in the chain is explicitly denied.
    OtherDeny,
    /// The evaluator configuration itself is unusable.
    InvalidTrustSetting,
}

impl fmt::Display for TrustVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Proceed => "proceed",
            Self::Unspecified => "unspecified",
            Self::RecoverableTrustFailure => "recoverable-trust-failure",
            Self::FatalTrustFailure => "fatal-trust-failure",
            Self::Invalid => "invalid",
            Self::OtherDeny => "deny",
            Self::InvalidTrustSetting => "invalid-trust-setting",
        };
        f.write_str(name)
    }
}

/// The evaluator call itself failed (as opposed to returning a negative
/// verdict).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum EvaluationError {
    /// The chain contains no certificates.
    #[error("no certificates presented")]
    EmptyChain,

    /// The underlying verifier failed for a reason unrelated to the chain.
    #[error("trust evaluation failed: {0}")]
    Backend(String),
}

/// Evaluates a configured chain.
///
/// Implementations must be safe to call from several handshakes at once.
/// Calls may block (trust-store I/O, clock checks).
pub trait TrustEvaluator: Send + Sync {
    /// Evaluate `chain` against the anchors configured on it.
    ///
    /// # Errors
    ///
    /// Returns an `EvaluationError` when no verdict could be produced.
    fn evaluate(&self, chain: &TrustChain) -> Result<TrustVerdict, EvaluationError>;
}

impl<T: TrustEvaluator + ?Sized> TrustEvaluator for Arc<T> {
    fn evaluate(&self, chain: &TrustChain) -> Result<TrustVerdict, EvaluationError> {
        (**self).evaluate(chain)
    }
}
