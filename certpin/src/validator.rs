//! Certificate pinning validator.
//!
//! [`PinningValidator`] answers server-trust challenges using only its own
//! anchor certificates. System roots are never consulted: every evaluation
//! runs with anchors-only set, and there is no way to turn that off.
//!
//! # Example
//!
//! ```ignore
//! use certpin::{AuthChallenge, Decision, PinningValidator, TrustChain};
//!
//! let validator = PinningValidator::from_file("www.example.com.cer")?;
//! let challenge = AuthChallenge::server_trust("www.example.com", TrustChain::new(presented));
//! match validator.decide(challenge) {
//!     Decision::UseCredential(credential) => { /* continue handshake */ }
//!     Decision::Cancel => { /* abort connection */ }
//! }
//! ```

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::anchors::TrustedAnchorSet;
use crate::cert::{CertLoadError, Certificate};
use crate::challenge::{AuthChallenge, AuthenticationMethod, TrustChain};
use crate::evaluate::{EvaluationError, TrustEvaluator, TrustVerdict, WebPkiEvaluator};

/// Proof that a server chain was accepted.
#[derive(Debug, Clone)]
pub struct Credential {
    chain: TrustChain,
    verdict: TrustVerdict,
}

impl Credential {
    /// The evaluated chain, as configured for evaluation.
    #[must_use]
    pub fn trust(&self) -> &TrustChain {
        &self.chain
    }

    /// The accepting verdict (`Proceed` or `Unspecified`).
    #[must_use]
    pub fn verdict(&self) -> TrustVerdict {
        self.verdict
    }
}

/// What the network layer should do with a challenge.
#[derive(Debug, Clone)]
pub enum Decision {
    /// Continue the handshake with this credential.
    UseCredential(Credential),
    /// Abort the connection attempt.
    Cancel,
}

impl Decision {
    #[must_use]
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::UseCredential(_))
    }
}

/// Why a challenge was not accepted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum Rejection {
    /// The challenge is not a server-trust challenge.
    #[error("unsupported authentication method: {0}")]
    UnsupportedMethod(AuthenticationMethod),

    /// The challenge carries no certificate chain.
    #[error("no server trust attached to challenge")]
    MissingTrust,

    /// The evaluator could not produce a verdict.
    #[error(transparent)]
    EvaluationFailed(#[from] EvaluationError),

    /// The chain was evaluated and not trusted.
    #[error("certificate not trusted: {0}")]
    Untrusted(TrustVerdict),
}

/// Anything that can answer an authentication challenge.
///
/// Network layers take a decider by injection; [`PinningValidator`] is the
/// implementation this crate provides.
pub trait ChallengeDecider: Send + Sync {
    fn decide(&self, challenge: AuthChallenge) -> Decision;
}

impl<T: ChallengeDecider + ?Sized> ChallengeDecider for Arc<T> {
    fn decide(&self, challenge: AuthChallenge) -> Decision {
        (**self).decide(challenge)
    }
}

/// Validates server chains against a fixed set of pinned certificates.
///
/// The anchor set is read-only after construction, so a validator can be
/// shared across concurrent handshakes without locking.
#[derive(Debug)]
pub struct PinningValidator<E = WebPkiEvaluator> {
    trusted: TrustedAnchorSet,
    evaluator: E,
}

impl PinningValidator {
    /// Create a validator trusting exactly `trusted`.
    #[must_use]
    pub fn new(trusted: impl Into<TrustedAnchorSet>) -> Self {
        Self::with_evaluator(trusted, WebPkiEvaluator::new())
    }

    /// Create a validator pinned to the single DER certificate at `path`.
    ///
    /// # Errors
    ///
    /// Returns `CertLoadError::Io` if the file cannot be read and
    /// `CertLoadError::BadCertificate` if it is not exactly one certificate.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, CertLoadError> {
        let certificate = Certificate::from_file(path)?;
        Ok(Self::new(vec![certificate]))
    }

    /// Create a validator pinned to one certificate per file.
    ///
    /// # Errors
    ///
    /// Returns the first `CertLoadError` encountered.
    pub fn from_files<P: AsRef<Path>>(
        paths: impl IntoIterator<Item = P>,
    ) -> Result<Self, CertLoadError> {
        Ok(Self::new(TrustedAnchorSet::from_files(paths)?))
    }
}

impl<E: TrustEvaluator> PinningValidator<E> {
    /// Create a validator that delegates chain evaluation to `evaluator`.
    #[must_use]
    pub fn with_evaluator(trusted: impl Into<TrustedAnchorSet>, evaluator: E) -> Self {
        Self {
            trusted: trusted.into(),
            evaluator,
        }
    }

    #[must_use]
    pub fn trusted_certificates(&self) -> &TrustedAnchorSet {
        &self.trusted
    }

    /// Evaluate a challenge, keeping the reason for a rejection.
    ///
    /// # Errors
    ///
    /// Returns a [`Rejection`] for every outcome other than a trusted chain.
    pub fn evaluate(&self, challenge: AuthChallenge) -> Result<Credential, Rejection> {
        if *challenge.method() != AuthenticationMethod::ServerTrust {
            return Err(Rejection::UnsupportedMethod(challenge.method().clone()));
        }
        let host = challenge.host().to_string();
        let mut chain = challenge.into_trust().ok_or(Rejection::MissingTrust)?;

        chain.set_anchor_certificates(&self.trusted);
        chain.set_anchor_certificates_only(true);

        let verdict = self.evaluator.evaluate(&chain)?;
        match verdict {
            TrustVerdict::Proceed | TrustVerdict::Unspecified => {
                tracing::debug!(host = %host, verdict = %verdict, "pinned certificate accepted");
                Ok(Credential { chain, verdict })
            }
            TrustVerdict::RecoverableTrustFailure
            | TrustVerdict::FatalTrustFailure
            | TrustVerdict::Invalid
            | TrustVerdict::OtherDeny
            | TrustVerdict::InvalidTrustSetting => Err(Rejection::Untrusted(verdict)),
        }
    }
}

impl<E: TrustEvaluator> ChallengeDecider for PinningValidator<E> {
    fn decide(&self, challenge: AuthChallenge) -> Decision {
        let host = challenge.host().to_string();
        match self.evaluate(challenge) {
            Ok(credential) => Decision::UseCredential(credential),
            Err(Rejection::Untrusted(verdict)) => {
                tracing::warn!(host = %host, verdict = %verdict, "could not verify certificate");
                Decision::Cancel
            }
            Err(Rejection::EvaluationFailed(e)) => {
                tracing::warn!(host = %host, error = %e, "trust evaluation failed");
                Decision::Cancel
            }
            Err(rejection) => {
                tracing::debug!(host = %host, reason = %rejection, "challenge cancelled");
                Decision::Cancel
            }
        }
    }
}

/// Run a blocking decision on the blocking pool, bounded by `deadline`.
///
/// Evaluation may block on trust-store I/O, so latency-sensitive callers
/// should not run it inline. A timeout or a panicked worker yields
/// [`Decision::Cancel`].
pub async fn decide_with_deadline<D>(
    decider: Arc<D>,
    challenge: AuthChallenge,
    deadline: Duration,
) -> Decision
where
    D: ChallengeDecider + ?Sized + 'static,
{
    let host = challenge.host().to_string();
    let task = tokio::task::spawn_blocking(move || decider.decide(challenge));

    match tokio::time::timeout(deadline, task).await {
        Ok(Ok(decision)) => decision,
        Ok(Err(e)) => {
            tracing::error!(host = %host, error = %e, "trust evaluation task failed");
            Decision::Cancel
        }
        Err(_) => {
            tracing::warn!(host = %host, ?deadline, "trust evaluation timed out");
            Decision::Cancel
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::self_signed;
    use rustls::pki_types::ServerName;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Evaluator returning a fixed answer and recording what it saw.
    #[derive(Default)]
    struct FixedEvaluator {
        answer: Option<TrustVerdict>,
        calls: AtomicUsize,
        saw_anchors_only: AtomicUsize,
    }

    impl FixedEvaluator {
        fn returning(verdict: TrustVerdict) -> Self {
            Self {
                answer: Some(verdict),
                ..Default::default()
            }
        }

        fn failing() -> Self {
            Self::default()
        }
    }

    impl TrustEvaluator for FixedEvaluator {
        fn evaluate(&self, chain: &TrustChain) -> Result<TrustVerdict, EvaluationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if chain.anchors_only() {
                self.saw_anchors_only.fetch_add(1, Ordering::SeqCst);
            }
            self.answer
                .ok_or_else(|| EvaluationError::Backend("unavailable".to_string()))
        }
    }

    fn anchor() -> Certificate {
        Certificate::from_der(&self_signed("localhost")).unwrap()
    }

    fn challenge() -> AuthChallenge {
        let chain = TrustChain::new(vec![self_signed("localhost")])
            .with_server_name(ServerName::try_from("localhost").unwrap().to_owned());
        AuthChallenge::server_trust("localhost", chain)
    }

    #[test]
    fn test_accepting_verdicts_use_credential() {
        for verdict in [TrustVerdict::Proceed, TrustVerdict::Unspecified] {
            let evaluator = FixedEvaluator::returning(verdict);
            let validator = PinningValidator::with_evaluator(vec![anchor()], evaluator);

            match validator.decide(challenge()) {
                Decision::UseCredential(credential) => assert_eq!(credential.verdict(), verdict),
                Decision::Cancel => panic!("{verdict} should be accepted"),
            }
        }
    }

    #[test]
    fn test_rejecting_verdicts_cancel() {
        let rejecting = [
            TrustVerdict::RecoverableTrustFailure,
            TrustVerdict::FatalTrustFailure,
            TrustVerdict::Invalid,
            TrustVerdict::OtherDeny,
            TrustVerdict::InvalidTrustSetting,
        ];
        for verdict in rejecting {
            let evaluator = FixedEvaluator::returning(verdict);
            let validator = PinningValidator::with_evaluator(vec![anchor()], evaluator);

            assert!(!validator.decide(challenge()).is_accepted(), "{verdict}");
            assert_eq!(
                validator.evaluate(challenge()).unwrap_err(),
                Rejection::Untrusted(verdict)
            );
        }
    }

    #[test]
    fn test_evaluator_error_cancels() {
        let validator = PinningValidator::with_evaluator(vec![anchor()], FixedEvaluator::failing());

        assert!(!validator.decide(challenge()).is_accepted());
        assert!(matches!(
            validator.evaluate(challenge()),
            Err(Rejection::EvaluationFailed(EvaluationError::Backend(_)))
        ));
    }

    #[test]
    fn test_other_methods_cancel_without_evaluation() {
        let evaluator = Arc::new(FixedEvaluator::returning(TrustVerdict::Proceed));
        let validator = PinningValidator::with_evaluator(vec![anchor()], evaluator.clone());

        for method in [
            AuthenticationMethod::ClientCertificate,
            AuthenticationMethod::HttpBasic,
            AuthenticationMethod::HttpDigest,
            AuthenticationMethod::Negotiate,
        ] {
            let chain = TrustChain::new(vec![self_signed("localhost")]);
            let challenge = AuthChallenge::new(method.clone(), "localhost", Some(chain));

            assert!(!validator.decide(challenge.clone()).is_accepted());
            assert_eq!(
                validator.evaluate(challenge).unwrap_err(),
                Rejection::UnsupportedMethod(method)
            );
        }
        assert_eq!(evaluator.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_missing_trust_cancels() {
        let validator = PinningValidator::with_evaluator(
            vec![anchor()],
            FixedEvaluator::returning(TrustVerdict::Proceed),
        );
        let challenge = AuthChallenge::new(AuthenticationMethod::ServerTrust, "localhost", None);

        assert_eq!(
            validator.evaluate(challenge.clone()).unwrap_err(),
            Rejection::MissingTrust
        );
        assert!(!validator.decide(challenge).is_accepted());
    }

    #[test]
    fn test_chain_is_configured_with_exact_anchors_only() {
        let evaluator = Arc::new(FixedEvaluator::returning(TrustVerdict::Proceed));
        let pinned = vec![anchor(), anchor()];
        let validator = PinningValidator::with_evaluator(pinned.clone(), evaluator.clone());

        let Decision::UseCredential(credential) = validator.decide(challenge()) else {
            panic!("expected credential");
        };

        assert_eq!(credential.trust().anchors().as_slice(), pinned.as_slice());
        assert!(credential.trust().anchors_only());
        assert_eq!(evaluator.calls.load(Ordering::SeqCst), 1);
        assert_eq!(evaluator.saw_anchors_only.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_validator_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PinningValidator>();
    }

    #[derive(Debug)]
    struct SlowDecider(Duration);

    impl ChallengeDecider for SlowDecider {
        fn decide(&self, _challenge: AuthChallenge) -> Decision {
            std::thread::sleep(self.0);
            Decision::Cancel
        }
    }

    #[tokio::test]
    async fn test_deadline_returns_decision_in_time() {
        let validator = Arc::new(PinningValidator::with_evaluator(
            vec![anchor()],
            FixedEvaluator::returning(TrustVerdict::Proceed),
        ));

        let decision = decide_with_deadline(validator, challenge(), Duration::from_secs(5)).await;
        assert!(decision.is_accepted());
    }

    #[tokio::test]
    async fn test_deadline_exceeded_cancels() {
        let decider = Arc::new(SlowDecider(Duration::from_millis(500)));

        let decision = decide_with_deadline(decider, challenge(), Duration::from_millis(20)).await;
        assert!(!decision.is_accepted());
    }
}
