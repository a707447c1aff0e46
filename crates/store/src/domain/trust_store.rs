// crates/store/src/domain/trust_store.rs

use crate::crypto::certificate::ParsedCertificate;

/// A source of trust anchors, as seen by the path builder.
///
/// Implemented by every anchor source (in-memory sets, the platform source,
/// test roots) and by the aggregating collection itself.
pub trait TrustStore: Send + Sync {
    /// Whether `cert` is a trust anchor in this source, by exact DER identity.
    fn contains(&self, cert: &ParsedCertificate) -> bool;

    /// Every anchor in this source.
    fn anchors(&self) -> Vec<ParsedCertificate>;

    /// Anchors whose subject matches the issuer of `cert`.
    fn issuers_of(&self, cert: &ParsedCertificate) -> Vec<ParsedCertificate> {
        self.anchors()
            .into_iter()
            .filter(|anchor| anchor.subject_der() == cert.issuer_der())
            .collect()
    }

    /// Whether `cert` ships by default with the platform.
    fn is_known_root(&self, _cert: &ParsedCertificate) -> bool {
        false
    }
}
