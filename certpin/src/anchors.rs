//! The fixed set of certificates a validator trusts.

use std::path::Path;

use crate::cert::{CertLoadError, Certificate};

/// Ordered, immutable collection of anchor certificates.
///
/// Stored as given: no deduplication and no well-formedness checks beyond
/// what [`Certificate`] already guarantees. An empty set is allowed and
/// trusts nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrustedAnchorSet {
    certificates: Vec<Certificate>,
}

impl TrustedAnchorSet {
    #[must_use]
    pub fn new(certificates: Vec<Certificate>) -> Self {
        Self { certificates }
    }

    /// Load one anchor per file, in order.
    ///
    /// # Errors
    ///
    /// Returns the first `CertLoadError` encountered.
    pub fn from_files<P: AsRef<Path>>(
        paths: impl IntoIterator<Item = P>,
    ) -> Result<Self, CertLoadError> {
        let certificates = paths
            .into_iter()
            .map(Certificate::from_file)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(certificates))
    }

    #[must_use]
    pub fn as_slice(&self) -> &[Certificate] {
        &self.certificates
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.certificates.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.certificates.is_empty()
    }

    /// Whether `der` is byte-identical to one of the anchors.
    #[must_use]
    pub fn contains_der(&self, der: &[u8]) -> bool {
        self.certificates.iter().any(|c| c.matches_der(der))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Certificate> {
        self.certificates.iter()
    }
}

impl From<Vec<Certificate>> for TrustedAnchorSet {
    fn from(certificates: Vec<Certificate>) -> Self {
        Self::new(certificates)
    }
}
