// adapters/collection.rs

use std::collections::HashSet;

use crate::crypto::certificate::ParsedCertificate;
use crate::domain::trust_store::TrustStore;

/// Fans queries out across an ordered list of borrowed anchor sources.
///
/// Membership is the union of all sources; order only affects enumeration.
/// Sources are added up front, before the first query.
#[derive(Default)]
pub struct TrustStoreCollection<'a> {
  sources: Vec<&'a dyn TrustStore>,
  known_roots: Option<&'a dyn TrustStore>,
}

impl<'a> TrustStoreCollection<'a> {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn add_source(&mut self, store: &'a dyn TrustStore) {
    self.sources.push(store);
  }

  /// The one source whose `is_known_root` answers for the whole collection.
  pub fn set_known_root_source(&mut self, store: &'a dyn TrustStore) {
    self.known_roots = Some(store);
  }

  pub fn len_sources(&self) -> usize {
    self.sources.len()
  }
}

impl TrustStore for TrustStoreCollection<'_> {
  fn contains(&self, cert: &ParsedCertificate) -> bool {
    self.sources.iter().any(|s| s.contains(cert))
  }

  fn anchors(&self) -> Vec<ParsedCertificate> {
    dedup(self.sources.iter().flat_map(|s| s.anchors()))
  }

  fn issuers_of(&self, cert: &ParsedCertificate) -> Vec<ParsedCertificate> {
    dedup(self.sources.iter().flat_map(|s| s.issuers_of(cert)))
  }

  fn is_known_root(&self, cert: &ParsedCertificate) -> bool {
    self.known_roots.is_some_and(|s| s.is_known_root(cert))
  }
}

fn dedup(certs: impl Iterator<Item = ParsedCertificate>) -> Vec<ParsedCertificate> {
  let mut seen = HashSet::new();
  certs.filter(|c| seen.insert(c.clone())).collect()
}
