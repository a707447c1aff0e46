//! Certificate handles consumed by the trust store.
//!
//! Bundles are split into raw DER buffers first and every buffer is then
//! decoded on its own, so one corrupt entry never hides its neighbours.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use rustls_pemfile::Item;
use rustls_pki_types::CertificateDer;
use x509_cert::der::{Decode, Encode};
use x509_cert::Certificate;

use crate::domain::error::CertificateError;

const PEM_ARMOR: &[u8] = b"-----BEGIN ";

/// Encoding hint for a certificate buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CertFormat {
    /// PEM if the buffer carries PEM armor, otherwise a single DER certificate.
    #[default]
    Auto,
    /// Zero or more concatenated `CERTIFICATE` PEM sections.
    PemSequence,
    /// Exactly one DER certificate.
    Der,
}

impl CertFormat {
    /// The concrete format `Auto` would pick for `data`.
    pub fn detect(data: &[u8]) -> Self {
        if has_pem_armor(data) {
            CertFormat::PemSequence
        } else {
            CertFormat::Der
        }
    }
}

struct Inner {
    der: CertificateDer<'static>,
    subject: Vec<u8>,
    issuer: Vec<u8>,
    serial: Vec<u8>,
}

/// A structurally valid X.509 certificate.
///
/// Cloning shares the underlying buffer. Equality and hashing use the exact
/// DER encoding, which is the identity used by every anchor source.
#[derive(Clone)]
pub struct ParsedCertificate(Arc<Inner>);

impl ParsedCertificate {
    pub fn from_der(der: impl Into<CertificateDer<'static>>) -> Result<Self, CertificateError> {
        let der = der.into();
        if der.is_empty() {
            return Err(CertificateError::Empty);
        }

        let cert = Certificate::from_der(der.as_ref())
            .map_err(|e| CertificateError::Der(e.to_string()))?;
        let tbs = &cert.tbs_certificate;
        let subject = tbs
            .subject
            .to_der()
            .map_err(|e| CertificateError::Der(format!("subject: {e}")))?;
        let issuer = tbs
            .issuer
            .to_der()
            .map_err(|e| CertificateError::Der(format!("issuer: {e}")))?;
        let serial = tbs.serial_number.as_bytes().to_vec();

        Ok(Self(Arc::new(Inner {
            der,
            subject,
            issuer,
            serial,
        })))
    }

    pub fn der(&self) -> &[u8] {
        self.0.der.as_ref()
    }

    pub fn der_cert(&self) -> &CertificateDer<'static> {
        &self.0.der
    }

    /// DER encoding of the subject `Name`, outer SEQUENCE included.
    pub fn subject_der(&self) -> &[u8] {
        &self.0.subject
    }

    /// DER encoding of the issuer `Name`, outer SEQUENCE included.
    pub fn issuer_der(&self) -> &[u8] {
        &self.0.issuer
    }

    pub fn serial_number(&self) -> &[u8] {
        &self.0.serial
    }

    pub fn is_self_issued(&self) -> bool {
        self.0.subject == self.0.issuer
    }
}

impl PartialEq for ParsedCertificate {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.der() == other.der()
    }
}

impl Eq for ParsedCertificate {}

impl Hash for ParsedCertificate {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.der().hash(state);
    }
}

impl fmt::Debug for ParsedCertificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParsedCertificate")
            .field("der_len", &self.der().len())
            .field("serial", &self.serial_number())
            .finish()
    }
}

/// Result of splitting and decoding a bundle.
#[derive(Debug, Default)]
pub struct ParsedBundle {
    pub certificates: Vec<ParsedCertificate>,
    pub errors: Vec<CertificateError>,
}

/// Split `data` into raw certificate buffers without decoding them.
///
/// Malformed PEM sections are reported and skipped; sections of other types
/// (keys, CRLs) are ignored.
pub fn certificates_from_bytes(
    data: &[u8],
    format: CertFormat,
) -> (Vec<CertificateDer<'static>>, Vec<CertificateError>) {
    match format {
        CertFormat::Der => single_der(data),
        CertFormat::PemSequence => pem_sequence(data),
        CertFormat::Auto => certificates_from_bytes(data, CertFormat::detect(data)),
    }
}

/// Split `data` and decode every certificate individually.
pub fn parse_bundle(data: &[u8], format: CertFormat) -> ParsedBundle {
    let (buffers, mut errors) = certificates_from_bytes(data, format);
    let mut certificates = Vec::with_capacity(buffers.len());
    for der in buffers {
        match ParsedCertificate::from_der(der) {
            Ok(cert) => certificates.push(cert),
            Err(e) => errors.push(e),
        }
    }
    ParsedBundle {
        certificates,
        errors,
    }
}

fn has_pem_armor(data: &[u8]) -> bool {
    data.windows(PEM_ARMOR.len()).any(|w| w == PEM_ARMOR)
}

fn single_der(data: &[u8]) -> (Vec<CertificateDer<'static>>, Vec<CertificateError>) {
    if data.is_empty() {
        return (Vec::new(), vec![CertificateError::Empty]);
    }
    (vec![CertificateDer::from(data.to_vec())], Vec::new())
}

fn pem_sequence(mut data: &[u8]) -> (Vec<CertificateDer<'static>>, Vec<CertificateError>) {
    let mut certs = Vec::new();
    let mut errors = Vec::new();
    loop {
        let remaining = data.len();
        match rustls_pemfile::read_one(&mut data) {
            Ok(Some(Item::X509Certificate(der))) => certs.push(der),
            Ok(Some(_)) => {}
            Ok(None) => break,
            Err(e) => {
                errors.push(CertificateError::Pem(e.to_string()));
                // a reader that made no progress would spin forever
                if data.len() == remaining {
                    break;
                }
            }
        }
    }
    (certs, errors)
}
