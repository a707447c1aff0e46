// adapters/system.rs

use std::sync::Arc;

use crate::adapters::collection::TrustStoreCollection;
use crate::adapters::in_memory::AnchorSet;
use crate::adapters::native::NativeTrustStore;
use crate::adapters::test_roots::TestRootCerts;
use crate::crypto::certificate::ParsedCertificate;
use crate::domain::trust_store::TrustStore;

/// The platform-provided anchor source behind a system trust store.
#[derive(Debug, Clone)]
pub enum PlatformSource {
  /// No platform anchors.
  Empty,
  /// Anchors read from bundles or directories. Everything here ships with
  /// the platform, so membership doubles as known-root classification.
  Static(Arc<AnchorSet>),
  /// The OS certificate database.
  Native(Arc<NativeTrustStore>),
}

impl PlatformSource {
  pub fn uses_system_trust_store(&self) -> bool {
    match self {
      PlatformSource::Empty => false,
      PlatformSource::Static(_) => true,
      PlatformSource::Native(store) => store.is_available(),
    }
  }
}

impl TrustStore for PlatformSource {
  fn contains(&self, cert: &ParsedCertificate) -> bool {
    match self {
      PlatformSource::Empty => false,
      PlatformSource::Static(anchors) => anchors.contains(cert),
      PlatformSource::Native(store) => store.contains(cert),
    }
  }

  fn anchors(&self) -> Vec<ParsedCertificate> {
    match self {
      PlatformSource::Empty => Vec::new(),
      PlatformSource::Static(anchors) => anchors.all().to_vec(),
      PlatformSource::Native(store) => store.anchors(),
    }
  }

  fn issuers_of(&self, cert: &ParsedCertificate) -> Vec<ParsedCertificate> {
    match self {
      PlatformSource::Empty => Vec::new(),
      PlatformSource::Static(anchors) => anchors.issuers_of(cert),
      PlatformSource::Native(store) => store.issuers_of(cert),
    }
  }

  fn is_known_root(&self, cert: &ParsedCertificate) -> bool {
    match self {
      PlatformSource::Empty => false,
      PlatformSource::Static(anchors) => anchors.contains(cert),
      PlatformSource::Native(store) => store.is_known_root(cert),
    }
  }
}

/// Trust anchors for TLS server verification: the platform source, anchors
/// added at runtime, and optionally test roots, behind one query surface.
///
/// Adding anchors only touches this instance; the shared platform source is
/// never mutated.
#[derive(Debug)]
pub struct SystemTrustStore {
  platform: PlatformSource,
  additional: AnchorSet,
  test_roots: Option<Arc<TestRootCerts>>,
}

impl SystemTrustStore {
  /// Test roots are ignored for `PlatformSource::Empty`.
  pub fn new(platform: PlatformSource, test_roots: Option<Arc<TestRootCerts>>) -> Self {
    let test_roots = match platform {
      PlatformSource::Empty => None,
      _ => test_roots,
    };
    Self {
      platform,
      additional: AnchorSet::new(),
      test_roots,
    }
  }

  /// A store that trusts nothing but its additional anchors.
  pub fn empty() -> Self {
    Self::new(PlatformSource::Empty, None)
  }

  /// Trust `cert` in this instance from now on.
  pub fn add_trust_anchor(&mut self, cert: ParsedCertificate) {
    self.additional.add(cert);
  }

  /// The composed view handed to path building: additional anchors, then the
  /// platform source, then test roots.
  pub fn get_trust_store(&self) -> TrustStoreCollection<'_> {
    let mut collection = TrustStoreCollection::new();
    collection.add_source(&self.additional);
    collection.add_source(&self.platform);
    if let Some(test_roots) = &self.test_roots {
      collection.add_source(test_roots.as_ref());
    }
    collection.set_known_root_source(&self.platform);
    collection
  }

  /// True only for anchors added through `add_trust_anchor`.
  pub fn is_additional_trust_anchor(&self, cert: &ParsedCertificate) -> bool {
    self.additional.contains(cert)
  }

  pub fn uses_system_trust_store(&self) -> bool {
    self.platform.uses_system_trust_store()
  }

  pub fn is_known_root(&self, cert: &ParsedCertificate) -> bool {
    self.platform.is_known_root(cert)
  }

  pub fn contains(&self, cert: &ParsedCertificate) -> bool {
    self.get_trust_store().contains(cert)
  }

  pub fn platform(&self) -> &PlatformSource {
    &self.platform
  }

  pub fn has_test_roots(&self) -> bool {
    self.test_roots.is_some()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn cert(cn: &str) -> ParsedCertificate {
    let mut params = rcgen::CertificateParams::new(vec![]);
    params.distinguished_name.push(rcgen::DnType::CommonName, cn);
    let der = rcgen::Certificate::from_params(params)
      .and_then(|c| c.serialize_der())
      .expect("cert");
    ParsedCertificate::from_der(der).expect("parse")
  }

  #[test]
  fn empty_store_ignores_test_roots() {
    let roots = Arc::new(TestRootCerts::new());
    let root = cert("test-root");
    roots.add(root.clone());

    let store = SystemTrustStore::new(PlatformSource::Empty, Some(roots));
    assert!(!store.has_test_roots());
    assert!(!store.contains(&root));
    assert!(!store.uses_system_trust_store());
  }

  #[test]
  fn collection_order_is_additional_platform_test() {
    let (extra, platform_cert, test_cert) = (cert("extra"), cert("platform"), cert("test"));
    let platform = PlatformSource::Static(Arc::new(vec![platform_cert.clone()].into_iter().collect()));
    let roots = Arc::new(TestRootCerts::new());
    roots.add(test_cert.clone());

    let mut store = SystemTrustStore::new(platform, Some(roots));
    store.add_trust_anchor(extra.clone());

    let collection = store.get_trust_store();
    assert_eq!(collection.len_sources(), 3);
    assert_eq!(collection.anchors(), vec![extra, platform_cert.clone(), test_cert.clone()]);
    assert!(collection.is_known_root(&platform_cert));
    assert!(!collection.is_known_root(&test_cert));
  }

  #[test]
  fn unavailable_native_platform_does_not_use_system_store() {
    let store = SystemTrustStore::new(
      PlatformSource::Native(Arc::new(NativeTrustStore::unavailable("headless"))),
      None,
    );
    assert!(!store.uses_system_trust_store());
    assert!(!store.contains(&cert("anything")));
  }
}
