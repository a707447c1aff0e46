use serde::{Deserialize, Serialize};

/// Which platform loader backs the system trust store.
///
/// Selected once at startup by [`PlatformKind::current`]; callers may also
/// pick one explicitly through `TrustStoreOptions`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlatformKind {
    /// The OS certificate database (keychain, NSS, schannel).
    Native,
    /// Certificate bundles and directories on a Unix filesystem.
    StaticUnix,
    /// A single fixed bundle file, no environment overrides.
    Bundle,
    /// No platform anchors at all.
    None,
}

impl PlatformKind {
    /// The loader appropriate for the build target.
    pub const fn current() -> Self {
        if cfg!(any(target_os = "macos", target_os = "ios", windows)) {
            PlatformKind::Native
        } else if cfg!(target_os = "fuchsia") {
            PlatformKind::Bundle
        } else if cfg!(any(unix, target_os = "android")) {
            PlatformKind::StaticUnix
        } else {
            PlatformKind::None
        }
    }

    /// Whether the backing source is expensive enough to be shared process-wide.
    pub const fn is_cached(self) -> bool {
        !matches!(self, PlatformKind::None)
    }
}

impl Default for PlatformKind {
    fn default() -> Self {
        Self::current()
    }
}
