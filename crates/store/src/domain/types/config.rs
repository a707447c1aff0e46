use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::adapters::test_roots::TestRootCerts;
use crate::domain::error::TrustResult;

use super::core::PlatformKind;

/// Centralized defaults for the system trust store.
pub struct TrustStoreDefaults;

impl TrustStoreDefaults {
    /// Single bundle path; replaces the whole file candidate list when set.
    pub const CERT_FILE_ENV: &'static str = "SSL_CERT_FILE";
    /// Colon separated directories; replaces the directory candidate list when set.
    pub const CERT_DIR_ENV: &'static str = "SSL_CERT_DIR";
    pub const CERT_DIR_SEPARATOR: char = ':';

    /// Possible certificate files; stop after finding one.
    pub const STATIC_ROOT_CERT_FILES: &'static [&'static str] = &[
        "/etc/ssl/certs/ca-certificates.crt",                // Debian/Ubuntu/Gentoo etc.
        "/etc/pki/tls/certs/ca-bundle.crt",                  // Fedora/RHEL 6
        "/etc/ssl/ca-bundle.pem",                            // OpenSUSE
        "/etc/pki/tls/cacert.pem",                           // OpenELEC
        "/etc/pki/ca-trust/extracted/pem/tls-ca-bundle.pem", // CentOS/RHEL 7
        "/etc/ssl/cert.pem",                                 // Alpine Linux
    ];

    /// Possible directories with certificate files; stop after reading at
    /// least one certificate from a directory.
    pub const STATIC_ROOT_CERT_DIRS: &'static [&'static str] = &[
        "/etc/ssl/certs",                // SLES10/SLES11
        "/etc/pki/tls/certs",            // Fedora/RHEL
        "/system/etc/security/cacerts",  // Android
    ];

    /// Slot name given to native certificates that are not platform-shipped
    /// roots when the OS store does not report slots itself.
    pub const NATIVE_USER_SLOT: &'static str = "user";

    /// The fixed bundle used by `PlatformKind::Bundle`.
    pub const BUNDLE_ROOT_CERTS_FILE: &'static str = "/config/ssl/cert.pem";

    pub const PLATFORM: PlatformKind = PlatformKind::current();
}

/// Candidate inputs for the static Unix loader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StaticUnixConfig {
    /// Bundle files, tried in order.
    pub cert_files: Vec<PathBuf>,
    /// Directories scanned recursively, tried in order.
    pub cert_dirs: Vec<PathBuf>,
}

impl Default for StaticUnixConfig {
    fn default() -> Self {
        Self::defaults()
    }
}

impl StaticUnixConfig {
    /// The built-in distribution paths, ignoring the environment.
    pub fn defaults() -> Self {
        Self {
            cert_files: TrustStoreDefaults::STATIC_ROOT_CERT_FILES
                .iter()
                .map(PathBuf::from)
                .collect(),
            cert_dirs: TrustStoreDefaults::STATIC_ROOT_CERT_DIRS
                .iter()
                .map(PathBuf::from)
                .collect(),
        }
    }

    /// One fixed bundle file and no directories.
    pub fn bundle() -> Self {
        Self {
            cert_files: vec![PathBuf::from(TrustStoreDefaults::BUNDLE_ROOT_CERTS_FILE)],
            cert_dirs: Vec::new(),
        }
    }

    /// Defaults with `SSL_CERT_FILE` / `SSL_CERT_DIR` applied from the process
    /// environment. Values that are not valid UTF-8 are treated as unset.
    pub fn from_env() -> Self {
        Self::resolve_with(|name| std::env::var(name).ok())
    }

    /// Defaults with the overrides returned by `lookup` applied.
    /// Empty values do not override anything.
    pub fn resolve_with<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::defaults();
        if let Some(file) = lookup(TrustStoreDefaults::CERT_FILE_ENV).filter(|v| !v.is_empty()) {
            config.cert_files = vec![PathBuf::from(file)];
        }
        if let Some(dirs) = lookup(TrustStoreDefaults::CERT_DIR_ENV).filter(|v| !v.is_empty()) {
            config.cert_dirs = split_cert_dirs(&dirs);
        }
        config
    }

    pub fn from_json(json: &str) -> TrustResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Split an `SSL_CERT_DIR` style value. Segments are whitespace-trimmed and
/// empty ones dropped.
pub fn split_cert_dirs(value: &str) -> Vec<PathBuf> {
    value
        .split(TrustStoreDefaults::CERT_DIR_SEPARATOR)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .collect()
}

/// Which user-installed native certificates may act as trust anchors.
///
/// Records that ship with the platform are always eligible; the policy only
/// narrows certificates that live in a user slot.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode", content = "slot")]
pub enum UserSlotPolicy {
    #[default]
    AllowAll,
    /// Only user certificates stored in the named slot.
    RestrictTo(String),
    /// No user certificates at all.
    NoUserSlots,
}

impl UserSlotPolicy {
    /// Whether a record stored in `slot` (`None` for platform records) is eligible.
    pub fn permits(&self, slot: Option<&str>) -> bool {
        match (self, slot) {
            (_, None) | (UserSlotPolicy::AllowAll, Some(_)) => true,
            (UserSlotPolicy::RestrictTo(allowed), Some(slot)) => allowed == slot,
            (UserSlotPolicy::NoUserSlots, Some(_)) => false,
        }
    }
}

/// Construction-time options for a system trust store.
#[derive(Debug, Clone, Default)]
pub struct TrustStoreOptions {
    pub platform: PlatformKind,
    /// Test-only anchors layered into the store. Only stores constructed
    /// after these are supplied see them.
    pub test_roots: Option<Arc<TestRootCerts>>,
    /// Applies to `PlatformKind::Native` only.
    pub user_slots: UserSlotPolicy,
}

impl TrustStoreOptions {
    /// Platform chosen for the build target, no test roots.
    pub fn secure_default() -> Self {
        Self {
            platform: TrustStoreDefaults::PLATFORM,
            test_roots: None,
            user_slots: UserSlotPolicy::AllowAll,
        }
    }

    pub fn with_platform(mut self, platform: PlatformKind) -> Self {
        self.platform = platform;
        self
    }

    pub fn with_test_roots(mut self, test_roots: Arc<TestRootCerts>) -> Self {
        self.test_roots = Some(test_roots);
        self
    }

    pub fn with_user_slots(mut self, user_slots: UserSlotPolicy) -> Self {
        self.user_slots = user_slots;
        self
    }
}
