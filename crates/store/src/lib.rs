// crates/store/src/lib.rs

//! System trust anchors for TLS server certificate verification.
//!
//! A [`SystemTrustStore`] combines the platform's anchors (a native certificate
//! database, or bundles and directories read once per process) with anchors
//! added at runtime and optional test roots. Anchors added to one store never
//! leak into another.

pub mod adapters;
pub mod crypto;
pub mod domain;

use tracing::debug;

use adapters::global;

/// A store backed by the platform chosen for this build.
pub fn create_ssl_system_trust_store() -> SystemTrustStore {
    create_ssl_system_trust_store_with(TrustStoreOptions::secure_default())
}

/// A store backed by `options.platform`, with `options.test_roots` layered in.
///
/// The first call for a cached platform loads the shared source; later calls
/// reuse it.
pub fn create_ssl_system_trust_store_with(options: TrustStoreOptions) -> SystemTrustStore {
    let TrustStoreOptions {
        platform,
        test_roots,
        user_slots,
    } = options;
    debug!(?platform, ?user_slots, test_roots = test_roots.is_some(), "creating system trust store");
    SystemTrustStore::new(global::platform_source(platform, &user_slots), test_roots)
}

/// A store backed by the native certificate database that trusts user
/// certificates from `slot` only. Platform-shipped roots stay trusted.
pub fn create_ssl_system_trust_store_with_user_slot_restriction(slot: impl Into<String>) -> SystemTrustStore {
    create_ssl_system_trust_store_with(
        TrustStoreOptions::secure_default()
            .with_platform(PlatformKind::Native)
            .with_user_slots(UserSlotPolicy::RestrictTo(slot.into())),
    )
}

/// A store backed by the native certificate database that trusts no
/// user-installed certificates.
pub fn create_ssl_system_trust_store_with_no_user_slots() -> SystemTrustStore {
    create_ssl_system_trust_store_with(
        TrustStoreOptions::secure_default()
            .with_platform(PlatformKind::Native)
            .with_user_slots(UserSlotPolicy::NoUserSlots),
    )
}

/// A store with no platform anchors and no test roots.
pub fn create_empty_system_trust_store() -> SystemTrustStore {
    SystemTrustStore::empty()
}

/// Start loading the platform source in the background so the first store
/// created later does not pay for it. Safe to call more than once.
pub fn initialize_trust_store_cache() -> TrustResult<()> {
    global::schedule_warm_up(TrustStoreDefaults::PLATFORM)
}

/// Diagnostics of the shared file-based load, once it has run.
pub fn static_roots_load_report() -> Option<LoadReport> {
    global::load_report(TrustStoreDefaults::PLATFORM)
}

// Re-exports for convenience
pub use adapters::collection::TrustStoreCollection;
pub use adapters::in_memory::AnchorSet;
pub use adapters::native::{NativeCertDatabase, NativeRecord, NativeTrustStore};
pub use adapters::static_unix::{LoadedRoots, StaticUnixLoader};
pub use adapters::system::{PlatformSource, SystemTrustStore};
pub use adapters::test_roots::TestRootCerts;
pub use crypto::certificate::{CertFormat, ParsedCertificate};
pub use domain::error::{CertificateError, TrustResult, TrustStoreError};
pub use domain::trust_store::TrustStore;
pub use domain::types::{
    LoadReport, PlatformKind, SkippedInput, StaticUnixConfig, TrustStoreDefaults, TrustStoreOptions,
    UserSlotPolicy,
};
