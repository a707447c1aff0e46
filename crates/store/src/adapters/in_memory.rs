// adapters/in_memory.rs

use std::collections::HashSet;

use crate::crypto::certificate::ParsedCertificate;
use crate::domain::trust_store::TrustStore;

/// An unordered collection of trust anchors keyed by DER identity.
///
/// Enumeration follows insertion order. Not meant for concurrent mutation;
/// shared read-only access is fine once writes have stopped.
#[derive(Debug, Clone, Default)]
pub struct AnchorSet {
  order: Vec<ParsedCertificate>,
  index: HashSet<ParsedCertificate>,
}

impl AnchorSet {
  pub fn new() -> Self {
    Self::default()
  }

  /// Insert `cert` unless an identical one is present. Returns whether it was new.
  pub fn add(&mut self, cert: ParsedCertificate) -> bool {
    if !self.index.insert(cert.clone()) {
      return false;
    }
    self.order.push(cert);
    true
  }

  pub fn contains(&self, cert: &ParsedCertificate) -> bool {
    self.index.contains(cert)
  }

  pub fn all(&self) -> &[ParsedCertificate] {
    &self.order
  }

  pub fn len(&self) -> usize {
    self.order.len()
  }

  pub fn is_empty(&self) -> bool {
    self.order.is_empty()
  }

  pub fn clear(&mut self) {
    self.order.clear();
    self.index.clear();
  }
}

impl FromIterator<ParsedCertificate> for AnchorSet {
  fn from_iter<I: IntoIterator<Item = ParsedCertificate>>(iter: I) -> Self {
    let mut set = AnchorSet::new();
    for cert in iter {
      set.add(cert);
    }
    set
  }
}

impl Extend<ParsedCertificate> for AnchorSet {
  fn extend<I: IntoIterator<Item = ParsedCertificate>>(&mut self, iter: I) {
    for cert in iter {
      self.add(cert);
    }
  }
}

impl TrustStore for AnchorSet {
  fn contains(&self, cert: &ParsedCertificate) -> bool {
    AnchorSet::contains(self, cert)
  }

  fn anchors(&self) -> Vec<ParsedCertificate> {
    self.order.clone()
  }

  fn issuers_of(&self, cert: &ParsedCertificate) -> Vec<ParsedCertificate> {
    self
      .order
      .iter()
      .filter(|anchor| anchor.subject_der() == cert.issuer_der())
      .cloned()
      .collect()
  }
}
