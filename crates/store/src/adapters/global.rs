// adapters/global.rs

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use once_cell::sync::OnceCell;
use tracing::{debug, error, info};

use crate::adapters::in_memory::AnchorSet;
use crate::adapters::native::NativeTrustStore;
use crate::adapters::static_unix::{LoadedRoots, StaticUnixLoader};
use crate::adapters::system::PlatformSource;
use crate::domain::error::{TrustResult, TrustStoreError};
use crate::domain::types::{LoadReport, PlatformKind, StaticUnixConfig, UserSlotPolicy};

struct Shared {
  anchors: Arc<AnchorSet>,
  report: LoadReport,
}

/// Anchors loaded at most once per process and immutable afterwards.
///
/// The first caller runs the load on its own thread; concurrent first callers
/// wait for that one load and all observe its result.
pub struct SharedRoots {
  cell: OnceCell<Shared>,
  load: fn() -> LoadedRoots,
}

impl SharedRoots {
  pub const fn new(load: fn() -> LoadedRoots) -> Self {
    Self {
      cell: OnceCell::new(),
      load,
    }
  }

  pub fn anchors(&self) -> Arc<AnchorSet> {
    self.shared().anchors.clone()
  }

  pub fn report(&self) -> &LoadReport {
    &self.shared().report
  }

  /// The report of a completed load. Never triggers one.
  pub fn report_if_loaded(&self) -> Option<&LoadReport> {
    self.cell.get().map(|shared| &shared.report)
  }

  pub fn is_loaded(&self) -> bool {
    self.cell.get().is_some()
  }

  fn shared(&self) -> &Shared {
    self.cell.get_or_init(|| {
      let LoadedRoots { anchors, report } = (self.load)();
      info!(count = anchors.len(), "root certificates loaded");
      Shared {
        anchors: Arc::new(anchors),
        report,
      }
    })
  }
}

fn load_static_unix() -> LoadedRoots {
  StaticUnixLoader::from_env().load()
}

fn load_bundle() -> LoadedRoots {
  StaticUnixLoader::new(StaticUnixConfig::bundle()).load()
}

static STATIC_UNIX_ROOTS: SharedRoots = SharedRoots::new(load_static_unix);
static BUNDLE_ROOTS: SharedRoots = SharedRoots::new(load_bundle);
static NATIVE_STORE: OnceCell<Arc<NativeTrustStore>> = OnceCell::new();

fn native_store() -> &'static Arc<NativeTrustStore> {
  NATIVE_STORE.get_or_init(|| Arc::new(NativeTrustStore::system()))
}

/// The process-wide backing source for `kind`, loading it on first use.
///
/// `user_slots` narrows a native source; the shared database is reused.
pub fn platform_source(kind: PlatformKind, user_slots: &UserSlotPolicy) -> PlatformSource {
  match kind {
    PlatformKind::Native if *user_slots == UserSlotPolicy::AllowAll => {
      PlatformSource::Native(Arc::clone(native_store()))
    }
    PlatformKind::Native => {
      PlatformSource::Native(Arc::new(native_store().with_user_slots(user_slots.clone())))
    }
    PlatformKind::StaticUnix => PlatformSource::Static(STATIC_UNIX_ROOTS.anchors()),
    PlatformKind::Bundle => PlatformSource::Static(BUNDLE_ROOTS.anchors()),
    PlatformKind::None => PlatformSource::Empty,
  }
}

/// Diagnostics of the shared file-based load for `kind`, if it already ran.
pub fn load_report(kind: PlatformKind) -> Option<LoadReport> {
  match kind {
    PlatformKind::StaticUnix => STATIC_UNIX_ROOTS.report_if_loaded().cloned(),
    PlatformKind::Bundle => BUNDLE_ROOTS.report_if_loaded().cloned(),
    PlatformKind::Native | PlatformKind::None => None,
  }
}

/// Load the shared source for `kind` and prime native caches, blocking the
/// calling thread.
pub fn warm_up(kind: PlatformKind) -> TrustResult<()> {
  if !kind.is_cached() {
    return Ok(());
  }
  catch_unwind(AssertUnwindSafe(|| match platform_source(kind, &UserSlotPolicy::AllowAll) {
    PlatformSource::Native(store) => store.warm_up(),
    PlatformSource::Static(_) | PlatformSource::Empty => {}
  }))
  .map_err(|_| TrustStoreError::Panic("trust store warm-up panicked".into()))?;
  debug!(?kind, "trust store warm-up finished");
  Ok(())
}

/// Whether the shared source for `kind` has finished loading.
pub fn is_warm(kind: PlatformKind) -> bool {
  match kind {
    PlatformKind::Native => NATIVE_STORE.get().is_some(),
    PlatformKind::StaticUnix => STATIC_UNIX_ROOTS.is_loaded(),
    PlatformKind::Bundle => BUNDLE_ROOTS.is_loaded(),
    PlatformKind::None => true,
  }
}

/// Run `warm_up(kind)` on a background worker so no caller blocks on it.
pub fn schedule_warm_up(kind: PlatformKind) -> TrustResult<()> {
  spawn_background(move || {
    if let Err(e) = warm_up(kind) {
      error!(error = %e, "background trust store warm-up failed");
    }
  })
}

/// Inside a Tokio runtime the blocking pool is used; otherwise a dedicated
/// thread is spawned.
fn spawn_background(task: impl FnOnce() + Send + 'static) -> TrustResult<()> {
  if let Ok(handle) = tokio::runtime::Handle::try_current() {
    drop(handle.spawn_blocking(task));
    return Ok(());
  }

  std::thread::Builder::new()
    .name("trust-store-warm-up".into())
    .spawn(task)?;
  Ok(())
}
