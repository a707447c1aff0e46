// adapters/test_roots.rs

use std::path::Path;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, warn};

use crate::adapters::in_memory::AnchorSet;
use crate::crypto::certificate::{parse_bundle, CertFormat, ParsedBundle, ParsedCertificate};
use crate::domain::error::{TrustResult, TrustStoreError};
use crate::domain::trust_store::TrustStore;

/// Test-only trust anchors layered into system trust stores.
///
/// Hand an `Arc<TestRootCerts>` to `TrustStoreOptions` before building a
/// store; stores built earlier never see it. Roots added or cleared later
/// are visible to every store that holds it.
#[derive(Debug, Default)]
pub struct TestRootCerts {
  anchors: RwLock<AnchorSet>,
}

impl TestRootCerts {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn add(&self, cert: ParsedCertificate) -> bool {
    self.write().add(cert)
  }

  /// Add every certificate in `data`; returns how many were new.
  pub fn add_from_bytes(&self, data: &[u8], format: CertFormat) -> usize {
    self.add_bundle(parse_bundle(data, format))
  }

  /// Add every certificate in the file at `path`; returns how many were new.
  ///
  /// A file that yields no certificate at all fails with the first decode
  /// error instead of silently adding nothing.
  pub fn add_from_file(&self, path: impl AsRef<Path>) -> TrustResult<usize> {
    let path = path.as_ref();
    let data = std::fs::read(path)?;
    let mut bundle = parse_bundle(&data, CertFormat::Auto);
    if bundle.certificates.is_empty() && !bundle.errors.is_empty() {
      return Err(TrustStoreError::Certificate(bundle.errors.swap_remove(0)));
    }
    let added = self.add_bundle(bundle);
    debug!(path = %path.display(), added, "loaded test roots");
    Ok(added)
  }

  fn add_bundle(&self, bundle: ParsedBundle) -> usize {
    for e in &bundle.errors {
      warn!(error = %e, "skipping test root");
    }
    let mut anchors = self.write();
    bundle
      .certificates
      .into_iter()
      .filter(|c| anchors.add(c.clone()))
      .count()
  }

  pub fn clear(&self) {
    self.write().clear();
  }

  pub fn is_empty(&self) -> bool {
    self.read().is_empty()
  }

  pub fn len(&self) -> usize {
    self.read().len()
  }

  // The guarded data is a plain set, so a poisoned lock is still usable.
  fn read(&self) -> RwLockReadGuard<'_, AnchorSet> {
    self.anchors.read().unwrap_or_else(PoisonError::into_inner)
  }

  fn write(&self) -> RwLockWriteGuard<'_, AnchorSet> {
    self.anchors.write().unwrap_or_else(PoisonError::into_inner)
  }
}

impl TrustStore for TestRootCerts {
  fn contains(&self, cert: &ParsedCertificate) -> bool {
    self.read().contains(cert)
  }

  fn anchors(&self) -> Vec<ParsedCertificate> {
    self.read().all().to_vec()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn pem(cn: &str) -> String {
    let mut params = rcgen::CertificateParams::new(vec![]);
    params.distinguished_name.push(rcgen::DnType::CommonName, cn);
    rcgen::Certificate::from_params(params)
      .and_then(|c| c.serialize_pem())
      .expect("cert")
  }

  #[test]
  fn add_from_bytes_counts_new_roots_only() {
    let roots = TestRootCerts::new();
    let bundle = format!("{}{}", pem("a"), pem("b"));
    assert_eq!(roots.add_from_bytes(bundle.as_bytes(), CertFormat::Auto), 2);
    assert_eq!(roots.add_from_bytes(bundle.as_bytes(), CertFormat::Auto), 0);
    assert_eq!(roots.len(), 2);
  }

  #[test]
  fn add_from_file_reads_bundle_and_reports_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("roots.pem");
    std::fs::write(&path, pem("file-root")).unwrap();

    let roots = TestRootCerts::new();
    assert_eq!(roots.add_from_file(&path).unwrap(), 1);
    assert!(roots.add_from_file(dir.path().join("missing.pem")).is_err());
  }

  #[test]
  fn add_from_file_rejects_a_file_without_certificates() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("garbage.pem");
    std::fs::write(&path, b"this is not a certificate").unwrap();

    let roots = TestRootCerts::new();
    let err = roots.add_from_file(&path).unwrap_err();
    assert!(matches!(err, TrustStoreError::Certificate(_)), "{err:?}");
    assert!(roots.is_empty());

    let empty = dir.path().join("empty.pem");
    std::fs::write(&empty, b"").unwrap();
    assert!(matches!(
      roots.add_from_file(&empty),
      Err(TrustStoreError::Certificate(crate::domain::error::CertificateError::Empty))
    ));
  }

  #[test]
  fn add_from_file_keeps_good_roots_next_to_bad_sections() {
    let dir = tempfile::tempdir().unwrap();
    let corrupt = "-----BEGIN CERTIFICATE-----\nAAAA\n-----END CERTIFICATE-----\n";
    let path = dir.path().join("mixed.pem");
    std::fs::write(&path, format!("{}{corrupt}", pem("good"))).unwrap();

    let roots = TestRootCerts::new();
    assert_eq!(roots.add_from_file(&path).unwrap(), 1);
  }

  #[test]
  fn clear_removes_everything() {
    let roots = TestRootCerts::new();
    roots.add_from_bytes(pem("x").as_bytes(), CertFormat::Auto);
    assert!(!roots.is_empty());
    roots.clear();
    assert!(roots.is_empty());
    assert!(roots.anchors().is_empty());
  }
}
