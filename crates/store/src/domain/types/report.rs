use std::path::PathBuf;

use serde::Serialize;

/// Diagnostic summary of a platform load.
///
/// A load never fails outright; everything that went wrong along the way ends
/// up in `skipped`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LoadReport {
    /// Bundle file that satisfied the file phase.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cert_file: Option<PathBuf>,
    /// Directory that satisfied the directory phase.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cert_dir: Option<PathBuf>,
    /// Distinct anchors in the loaded set.
    pub anchors_loaded: usize,
    pub skipped: Vec<SkippedInput>,
}

impl LoadReport {
    /// Neither phase produced a single certificate.
    pub fn is_empty_load(&self) -> bool {
        self.cert_file.is_none() && self.cert_dir.is_none()
    }

    pub(crate) fn skip(&mut self, path: impl Into<PathBuf>, reason: impl ToString) {
        self.skipped.push(SkippedInput {
            path: path.into(),
            reason: reason.to_string(),
        });
    }
}

/// An input that contributed nothing, or only partially.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedInput {
    pub path: PathBuf,
    pub reason: String,
}
