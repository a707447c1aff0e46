#![allow(dead_code)]

use std::path::{Path, PathBuf};

use rcgen::{Certificate, CertificateParams, DnType};
use system_trust_store as sts;

/// A generated self-signed certificate in both encodings.
///
/// rcgen re-signs on every serialization, so the DER is recovered from the
/// PEM rather than serialized separately.
pub struct TestCert {
    pub pem: String,
    pub der: Vec<u8>,
}

impl TestCert {
    pub fn parsed(&self) -> sts::ParsedCertificate {
        sts::ParsedCertificate::from_der(self.der.clone()).expect("parse test cert")
    }
}

pub fn make_cert(common_name: &str) -> TestCert {
    let mut params = CertificateParams::new(vec![]);
    params.distinguished_name.push(DnType::CommonName, common_name);
    let cert = Certificate::from_params(params).expect("cert");
    let pem = cert.serialize_pem().expect("cert pem");
    let bundle = sts::crypto::certificate::parse_bundle(pem.as_bytes(), sts::CertFormat::PemSequence);
    let der = bundle.certificates[0].der().to_vec();
    TestCert { pem, der }
}

/// Concatenate the PEM encodings of `certs` into one bundle.
pub fn pem_bundle(certs: &[&TestCert]) -> String {
    certs.iter().map(|c| c.pem.as_str()).collect::<Vec<_>>().join("\n")
}

/// Write `contents` to `dir/name`, creating parent directories.
pub fn write_file(dir: &Path, name: &str, contents: impl AsRef<[u8]>) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create parent");
    }
    std::fs::write(&path, contents).expect("write file");
    path
}

/// A loader config restricted to the given candidates.
pub fn config(files: &[PathBuf], dirs: &[PathBuf]) -> sts::StaticUnixConfig {
    sts::StaticUnixConfig {
        cert_files: files.to_vec(),
        cert_dirs: dirs.to_vec(),
    }
}
