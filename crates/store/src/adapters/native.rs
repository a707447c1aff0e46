// adapters/native.rs

use std::fmt;
use std::sync::Arc;

#[cfg(feature = "native-roots")]
use std::collections::{HashMap, HashSet};

#[cfg(feature = "native-roots")]
use once_cell::sync::OnceCell;
use tracing::error;
#[cfg(feature = "native-roots")]
use tracing::{debug, warn};

use crate::crypto::certificate::ParsedCertificate;
#[cfg(feature = "native-roots")]
use crate::domain::error::TrustResult;
use crate::domain::error::TrustStoreError;
use crate::domain::trust_store::TrustStore;
#[cfg(feature = "native-roots")]
use crate::domain::types::TrustStoreDefaults;
use crate::domain::types::UserSlotPolicy;

/// A certificate record handed back by a native database lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeRecord {
  pub der: Vec<u8>,
  /// The platform ships this certificate as a default root.
  pub default_root: bool,
  /// User slot holding the record; `None` for platform records.
  pub user_slot: Option<String>,
}

/// The OS certificate database, treated as a black box.
pub trait NativeCertDatabase: Send + Sync {
  /// Look `cert` up. Native lookups key on issuer and serial number, so the
  /// record returned may belong to a different certificate.
  fn find(&self, cert: &ParsedCertificate) -> Option<NativeRecord>;

  fn anchors(&self) -> Vec<ParsedCertificate>;

  /// Prime expensive native caches. May block.
  fn warm_up(&self) {}
}

enum Backend {
  Open(Box<dyn NativeCertDatabase>),
  Unavailable(String),
}

/// Trust anchors served by a native certificate database.
///
/// Every answer is re-checked against the exact bytes of the query and
/// against the store's user-slot policy. If the database could not be opened
/// the store stays inoperative and every query answers "not found".
pub struct NativeTrustStore {
  backend: Arc<Backend>,
  user_slots: UserSlotPolicy,
}

impl NativeTrustStore {
  pub fn open(db: impl NativeCertDatabase + 'static) -> Self {
    Self {
      backend: Arc::new(Backend::Open(Box::new(db))),
      user_slots: UserSlotPolicy::AllowAll,
    }
  }

  pub fn unavailable(reason: impl Into<String>) -> Self {
    Self {
      backend: Arc::new(Backend::Unavailable(reason.into())),
      user_slots: UserSlotPolicy::AllowAll,
    }
  }

  /// The OS store for this build, or an inoperative store if it cannot be opened.
  pub fn system() -> Self {
    #[cfg(not(feature = "native-roots"))]
    {
      let e = TrustStoreError::Feature("native-roots");
      error!(error = %e, "native certificate store unavailable");
      Self::unavailable(e.to_string())
    }
    #[cfg(feature = "native-roots")]
    {
      match SystemCertDatabase::open() {
        Ok(db) => Self::open(db),
        Err(e) => {
          error!(error = %e, "native certificate store unavailable");
          Self::unavailable(e.to_string())
        }
      }
    }
  }

  /// A view of the same database under a different user-slot policy.
  pub fn with_user_slots(&self, user_slots: UserSlotPolicy) -> Self {
    Self {
      backend: Arc::clone(&self.backend),
      user_slots,
    }
  }

  pub fn user_slots(&self) -> &UserSlotPolicy {
    &self.user_slots
  }

  pub fn is_available(&self) -> bool {
    matches!(*self.backend, Backend::Open(_))
  }

  pub fn unavailable_reason(&self) -> Option<&str> {
    match &*self.backend {
      Backend::Open(_) => None,
      Backend::Unavailable(reason) => Some(reason),
    }
  }

  pub fn warm_up(&self) {
    if let Backend::Open(db) = &*self.backend {
      db.warm_up();
    }
  }

  fn lookup(&self, cert: &ParsedCertificate) -> Option<NativeRecord> {
    match &*self.backend {
      Backend::Open(db) => db.find(cert).filter(|record| {
        record.der == cert.der() && self.user_slots.permits(record.user_slot.as_deref())
      }),
      Backend::Unavailable(_) => None,
    }
  }
}

impl TrustStore for NativeTrustStore {
  fn contains(&self, cert: &ParsedCertificate) -> bool {
    self.lookup(cert).is_some()
  }

  fn anchors(&self) -> Vec<ParsedCertificate> {
    match &*self.backend {
      Backend::Open(db) if self.user_slots == UserSlotPolicy::AllowAll => db.anchors(),
      Backend::Open(db) => db.anchors().into_iter().filter(|c| self.contains(c)).collect(),
      Backend::Unavailable(_) => Vec::new(),
    }
  }

  fn is_known_root(&self, cert: &ParsedCertificate) -> bool {
    self.lookup(cert).is_some_and(|record| record.default_root)
  }
}

impl fmt::Debug for NativeTrustStore {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match &*self.backend {
      Backend::Open(_) => write!(f, "NativeTrustStore(open, {:?})", self.user_slots),
      Backend::Unavailable(reason) => write!(f, "NativeTrustStore(unavailable: {reason})"),
    }
  }
}

/// Snapshot of the OS certificate store.
///
/// A certificate counts as a default root when its subject and public key
/// belong to the Mozilla root program. That classification is computed on
/// first use, or ahead of time by `warm_up`. Everything else is reported as
/// living in the `TrustStoreDefaults::NATIVE_USER_SLOT` user slot.
#[cfg(feature = "native-roots")]
pub struct SystemCertDatabase {
  anchors: Vec<ParsedCertificate>,
  // several distinct certificates may share issuer and serial
  by_issuer_serial: HashMap<(Vec<u8>, Vec<u8>), Vec<ParsedCertificate>>,
  default_roots: OnceCell<HashSet<ParsedCertificate>>,
}

#[cfg(feature = "native-roots")]
impl SystemCertDatabase {
  pub fn open() -> TrustResult<Self> {
    let result = rustls_native_certs::load_native_certs();
    for e in &result.errors {
      warn!(error = %e, "native certificate store reported an error");
    }
    if result.certs.is_empty() && !result.errors.is_empty() {
      let reasons: Vec<String> = result.errors.iter().map(ToString::to_string).collect();
      return Err(TrustStoreError::NativeUnavailable(reasons.join("; ")));
    }

    let certs = result.certs.into_iter().filter_map(|der| {
      ParsedCertificate::from_der(der)
        .map_err(|e| warn!(error = %e, "skipping unparseable native certificate"))
        .ok()
    });
    Ok(Self::from_certificates(certs))
  }

  pub fn from_certificates(certs: impl IntoIterator<Item = ParsedCertificate>) -> Self {
    let mut anchors = Vec::new();
    let mut by_issuer_serial: HashMap<_, Vec<ParsedCertificate>> = HashMap::new();
    for cert in certs {
      let key = (cert.issuer_der().to_vec(), cert.serial_number().to_vec());
      let entries = by_issuer_serial.entry(key).or_default();
      if entries.contains(&cert) {
        continue;
      }
      entries.push(cert.clone());
      anchors.push(cert);
    }
    Self {
      anchors,
      by_issuer_serial,
      default_roots: OnceCell::new(),
    }
  }

  fn default_roots(&self) -> &HashSet<ParsedCertificate> {
    self.default_roots.get_or_init(|| {
      let roots: HashSet<_> = self
        .anchors
        .iter()
        .filter(|c| is_mozilla_root(c))
        .cloned()
        .collect();
      debug!(count = roots.len(), "classified native default roots");
      roots
    })
  }
}

#[cfg(feature = "native-roots")]
impl NativeCertDatabase for SystemCertDatabase {
  /// The byte-identical entry if the store holds one, otherwise whichever
  /// entry shares the issuer and serial number.
  fn find(&self, cert: &ParsedCertificate) -> Option<NativeRecord> {
    let key = (cert.issuer_der().to_vec(), cert.serial_number().to_vec());
    let entries = self.by_issuer_serial.get(&key)?;
    let found = entries.iter().find(|e| *e == cert).or_else(|| entries.first())?;
    let default_root = self.default_roots().contains(found);
    Some(NativeRecord {
      der: found.der().to_vec(),
      default_root,
      user_slot: (!default_root).then(|| TrustStoreDefaults::NATIVE_USER_SLOT.to_string()),
    })
  }

  fn anchors(&self) -> Vec<ParsedCertificate> {
    self.anchors.clone()
  }

  fn warm_up(&self) {
    self.default_roots();
  }
}

#[cfg(feature = "native-roots")]
fn is_mozilla_root(cert: &ParsedCertificate) -> bool {
  let Ok(anchor) = webpki::anchor_from_trusted_cert(cert.der_cert()) else {
    return false;
  };
  webpki_roots::TLS_SERVER_ROOTS.iter().any(|root| {
    root.subject.as_ref() == anchor.subject.as_ref()
      && root.subject_public_key_info.as_ref() == anchor.subject_public_key_info.as_ref()
  })
}
