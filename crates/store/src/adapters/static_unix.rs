// adapters/static_unix.rs

use std::path::{Path, PathBuf};

use tracing::{debug, error, warn};
use walkdir::WalkDir;

use crate::adapters::in_memory::AnchorSet;
use crate::crypto::certificate::{parse_bundle, CertFormat};
use crate::domain::error::{TrustResult, TrustStoreError};
use crate::domain::types::{LoadReport, StaticUnixConfig, TrustStoreDefaults};

/// Anchors produced by a platform load, plus what happened on the way.
#[derive(Debug, Clone, Default)]
pub struct LoadedRoots {
  pub anchors: AnchorSet,
  pub report: LoadReport,
}

/// Populates an anchor set from certificate bundles and directories without
/// a native certificate database.
///
/// Two independent phases, each "first success wins":
/// 1. the first candidate file that yields a certificate;
/// 2. the first candidate directory in which some file yields a certificate.
#[derive(Debug, Clone)]
pub struct StaticUnixLoader {
  config: StaticUnixConfig,
  honors_env: bool,
}

impl StaticUnixLoader {
  pub fn new(config: StaticUnixConfig) -> Self {
    Self {
      config,
      honors_env: false,
    }
  }

  /// Default candidates with `SSL_CERT_FILE` / `SSL_CERT_DIR` applied.
  pub fn from_env() -> Self {
    Self {
      config: StaticUnixConfig::from_env(),
      honors_env: true,
    }
  }

  pub fn config(&self) -> &StaticUnixConfig {
    &self.config
  }

  /// What to tell the user when neither phase found a certificate. Only a
  /// loader built from the environment points at the override variables.
  pub(crate) fn empty_load_hint(&self) -> String {
    if self.honors_env {
      return format!(
        "No CA certificates were found. Try using environment variable {} or {}",
        TrustStoreDefaults::CERT_FILE_ENV,
        TrustStoreDefaults::CERT_DIR_ENV,
      );
    }
    let candidates: Vec<String> = self
      .config
      .cert_files
      .iter()
      .chain(&self.config.cert_dirs)
      .map(|p| p.display().to_string())
      .collect();
    format!("No CA certificates were found in {}", candidates.join(", "))
  }

  /// Run both phases. Never fails; an empty result is reported and logged.
  pub fn load(&self) -> LoadedRoots {
    let mut loaded = LoadedRoots::default();
    loaded.load_files(&self.config.cert_files);
    loaded.load_dirs(&self.config.cert_dirs);
    loaded.report.anchors_loaded = loaded.anchors.len();

    if loaded.report.is_empty_load() {
      error!("{}", self.empty_load_hint());
    } else {
      debug!(
        file = ?loaded.report.cert_file,
        dir = ?loaded.report.cert_dir,
        count = loaded.anchors.len(),
        "static root certificates loaded"
      );
    }
    loaded
  }
}

impl LoadedRoots {
  fn load_files(&mut self, files: &[PathBuf]) {
    for path in files {
      let data = match std::fs::read(path) {
        Ok(data) => data,
        Err(e) => {
          debug!(path = %path.display(), error = %e, "certificate file unavailable");
          self.report.skip(path, e);
          continue;
        }
      };
      if self.add_certificates_from_bytes(path, &data) {
        self.report.cert_file = Some(path.clone());
        break;
      }
    }
  }

  fn load_dirs(&mut self, dirs: &[PathBuf]) {
    for dir in dirs {
      let files = match regular_files(dir) {
        Ok(files) => files,
        Err(e) => {
          debug!(dir = %dir.display(), error = %e, "certificate directory unavailable");
          self.report.skip(dir, e);
          continue;
        }
      };

      // every file in the directory is read, even after the first hit
      let mut dir_ok = false;
      for path in files {
        match std::fs::read(&path) {
          Ok(data) => dir_ok |= self.add_certificates_from_bytes(&path, &data),
          Err(e) => {
            debug!(path = %path.display(), error = %e, "certificate file unreadable");
            self.report.skip(path, e);
          }
        }
      }

      if dir_ok {
        self.report.cert_dir = Some(dir.clone());
        break;
      }
    }
  }

  /// Add every certificate in `data`. True if at least one parsed, even if
  /// it was already present.
  fn add_certificates_from_bytes(&mut self, path: &Path, data: &[u8]) -> bool {
    let format = CertFormat::detect(data);
    let bundle = parse_bundle(data, format);

    for e in &bundle.errors {
      // Files without PEM armor are only guesses at DER; stray non-certificate
      // files in a directory are expected.
      if format == CertFormat::PemSequence {
        warn!(path = %path.display(), error = %e, "skipping unparseable certificate");
      } else {
        debug!(path = %path.display(), error = %e, "not a certificate");
      }
      self.report.skip(path, e);
    }

    let certs_ok = !bundle.certificates.is_empty();
    self.anchors.extend(bundle.certificates);
    certs_ok
  }
}

/// All regular files under `dir`, recursively, in sorted order. Symlinks are
/// followed; a link back to an ancestor directory is reported and not entered.
fn regular_files(dir: &Path) -> TrustResult<Vec<PathBuf>> {
  if !std::fs::metadata(dir)?.is_dir() {
    return Err(TrustStoreError::Config(format!("{} is not a directory", dir.display())));
  }

  let mut files = Vec::new();
  for entry in WalkDir::new(dir).follow_links(true) {
    let entry = match entry {
      Ok(entry) => entry,
      Err(e) if e.depth() == 0 => return Err(e.into()),
      Err(e) => {
        match e.loop_ancestor() {
          Some(ancestor) => warn!(ancestor = %ancestor.display(), error = %e, "skipping directory symlink cycle"),
          None => debug!(error = %e, "skipping unreadable directory entry"),
        }
        continue;
      }
    };
    if entry.file_type().is_file() {
      files.push(entry.into_path());
    }
  }
  files.sort();
  files.dedup();
  Ok(files)
}
