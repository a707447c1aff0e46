// crates/store/src/domain/error.rs
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrustStoreError {
  #[error("configuration: {0}")]
  Config(String),

  #[error(transparent)]
  Io(#[from] std::io::Error),

  #[error(transparent)]
  Json(#[from] serde_json::Error),

  #[error(transparent)]
  Walk(#[from] walkdir::Error),

  #[error(transparent)]
  Certificate(#[from] CertificateError),

  #[error("native certificate store unavailable: {0}")]
  NativeUnavailable(String),

  #[error("feature not enabled: {0}")]
  Feature(&'static str),

  // Useful when we catch_unwind to avoid crossing FFI boundaries with panics.
  #[error("internal panic: {0}")]
  Panic(String),
}

/// Why a single certificate buffer was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CertificateError {
  #[error("empty certificate buffer")]
  Empty,

  #[error("malformed PEM section: {0}")]
  Pem(String),

  #[error("invalid DER certificate: {0}")]
  Der(String),
}

pub type TrustResult<T> = Result<T, TrustStoreError>;
