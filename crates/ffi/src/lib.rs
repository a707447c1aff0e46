use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::Context;
use system_trust_store as sts;
use sts::domain::error::{CertificateError, TrustStoreError};
use sts::TrustStore;

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum FfiError {
    #[error("{message}")]
    Generic { message: String },
}

impl From<TrustStoreError> for FfiError {
    fn from(e: TrustStoreError) -> Self {
        FfiError::Generic {
            message: e.to_string(),
        }
    }
}

impl From<CertificateError> for FfiError {
    fn from(e: CertificateError) -> Self {
        FfiError::Generic {
            message: e.to_string(),
        }
    }
}

impl From<anyhow::Error> for FfiError {
    fn from(e: anyhow::Error) -> Self {
        FfiError::Generic {
            message: format!("{e:#}"),
        }
    }
}

// ===== FFI types mirroring the public Rust API (FFI-friendly) =====

#[derive(uniffi::Enum, Debug, Clone, Copy)]
pub enum FfiPlatformKind { Native, StaticUnix, Bundle, None }

impl From<FfiPlatformKind> for sts::PlatformKind {
    fn from(v: FfiPlatformKind) -> Self {
        match v { FfiPlatformKind::Native => sts::PlatformKind::Native, FfiPlatformKind::StaticUnix => sts::PlatformKind::StaticUnix, FfiPlatformKind::Bundle => sts::PlatformKind::Bundle, FfiPlatformKind::None => sts::PlatformKind::None }
    }
}

#[derive(uniffi::Record, Debug, Clone)]
pub struct FfiSkippedInput {
    pub path: String,
    pub reason: String,
}

#[derive(uniffi::Record, Debug, Clone)]
pub struct FfiLoadReport {
    pub cert_file: Option<String>,
    pub cert_dir: Option<String>,
    pub anchors_loaded: u64,
    pub skipped: Vec<FfiSkippedInput>,
}

impl From<sts::LoadReport> for FfiLoadReport {
    fn from(v: sts::LoadReport) -> Self {
        FfiLoadReport {
            cert_file: v.cert_file.map(|p| p.display().to_string()),
            cert_dir: v.cert_dir.map(|p| p.display().to_string()),
            anchors_loaded: v.anchors_loaded as u64,
            skipped: v.skipped.into_iter().map(|s| FfiSkippedInput { path: s.path.display().to_string(), reason: s.reason }).collect(),
        }
    }
}

// ===== Trust store object =====

/// A system trust store owned by a foreign caller.
#[derive(uniffi::Object)]
pub struct FfiTrustStore {
    inner: Mutex<sts::SystemTrustStore>,
}

#[uniffi::export]
impl FfiTrustStore {
    /// Backed by the platform chosen for this build.
    #[uniffi::constructor]
    pub fn new_ssl() -> Arc<Self> {
        Self::wrap(sts::create_ssl_system_trust_store())
    }

    #[uniffi::constructor]
    pub fn new_empty() -> Arc<Self> {
        Self::wrap(sts::create_empty_system_trust_store())
    }

    #[uniffi::constructor]
    pub fn with_platform(platform: FfiPlatformKind) -> Arc<Self> {
        let options = sts::TrustStoreOptions::secure_default().with_platform(platform.into());
        Self::wrap(sts::create_ssl_system_trust_store_with(options))
    }

    /// Native store trusting user certificates from `slot` only.
    #[uniffi::constructor]
    pub fn with_user_slot_restriction(slot: String) -> Arc<Self> {
        Self::wrap(sts::create_ssl_system_trust_store_with_user_slot_restriction(slot))
    }

    #[uniffi::constructor]
    pub fn with_no_user_slots() -> Arc<Self> {
        Self::wrap(sts::create_ssl_system_trust_store_with_no_user_slots())
    }

    pub fn add_trust_anchor(&self, der: Vec<u8>) -> Result<(), FfiError> {
        let cert = parse_der(der)?;
        self.lock().add_trust_anchor(cert);
        Ok(())
    }

    /// Add every certificate in a PEM bundle; returns how many parsed.
    pub fn add_trust_anchors_pem(&self, pem: String) -> Result<u32, FfiError> {
        let bundle = sts::crypto::certificate::parse_bundle(pem.as_bytes(), sts::CertFormat::PemSequence);
        if let Some(e) = bundle.errors.into_iter().next() {
            return Err(e.into());
        }
        let count = bundle.certificates.len() as u32;
        let mut store = self.lock();
        for cert in bundle.certificates {
            store.add_trust_anchor(cert);
        }
        Ok(count)
    }

    pub fn contains(&self, der: Vec<u8>) -> Result<bool, FfiError> {
        let cert = parse_der(der)?;
        Ok(self.lock().contains(&cert))
    }

    pub fn is_known_root(&self, der: Vec<u8>) -> Result<bool, FfiError> {
        let cert = parse_der(der)?;
        Ok(self.lock().is_known_root(&cert))
    }

    pub fn is_additional_trust_anchor(&self, der: Vec<u8>) -> Result<bool, FfiError> {
        let cert = parse_der(der)?;
        Ok(self.lock().is_additional_trust_anchor(&cert))
    }

    pub fn uses_system_trust_store(&self) -> bool {
        self.lock().uses_system_trust_store()
    }

    pub fn anchor_count(&self) -> u64 {
        self.lock().get_trust_store().anchors().len() as u64
    }
}

impl FfiTrustStore {
    fn wrap(store: sts::SystemTrustStore) -> Arc<Self> {
        Arc::new(Self { inner: Mutex::new(store) })
    }

    fn lock(&self) -> MutexGuard<'_, sts::SystemTrustStore> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn parse_der(der: Vec<u8>) -> anyhow::Result<sts::ParsedCertificate> {
    sts::ParsedCertificate::from_der(der).context("invalid certificate")
}

// ===== Process-wide helpers =====

#[uniffi::export]
pub fn initialize_trust_store_cache_ffi() -> Result<(), FfiError> {
    sts::initialize_trust_store_cache().map_err(FfiError::from)
}

#[uniffi::export]
pub fn static_roots_load_report_ffi() -> Option<FfiLoadReport> {
    sts::static_roots_load_report().map(Into::into)
}

/// The shared load report as JSON, if the load has run.
#[uniffi::export]
pub fn static_roots_load_report_json() -> Result<Option<String>, FfiError> {
    sts::static_roots_load_report()
        .map(|report| serde_json::to_string(&report).context("serialize load report"))
        .transpose()
        .map_err(FfiError::from)
}


uniffi::setup_scaffolding!();
