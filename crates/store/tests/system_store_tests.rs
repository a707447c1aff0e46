mod common;

use std::sync::Arc;

use common::make_cert;
use system_trust_store as sts;
use sts::TrustStore;

fn static_platform(certs: &[&common::TestCert]) -> sts::PlatformSource {
    let anchors: sts::AnchorSet = certs.iter().map(|c| c.parsed()).collect();
    sts::PlatformSource::Static(Arc::new(anchors))
}

#[test]
fn added_anchor_is_trusted_but_not_a_known_root() {
    let (platform_root, extra) = (make_cert("platform-root"), make_cert("extra"));
    let mut store = sts::SystemTrustStore::new(static_platform(&[&platform_root]), None);
    store.add_trust_anchor(extra.parsed());

    assert!(store.uses_system_trust_store());
    assert!(store.contains(&extra.parsed()));
    assert!(store.is_additional_trust_anchor(&extra.parsed()));
    assert!(!store.is_known_root(&extra.parsed()));

    assert!(store.contains(&platform_root.parsed()));
    assert!(store.is_known_root(&platform_root.parsed()));
    assert!(!store.is_additional_trust_anchor(&platform_root.parsed()));
    assert!(store.get_trust_store().is_known_root(&platform_root.parsed()));
}

#[test]
fn adding_an_anchor_twice_is_harmless() {
    let extra = make_cert("twice");
    let mut store = sts::create_empty_system_trust_store();
    store.add_trust_anchor(extra.parsed());
    store.add_trust_anchor(extra.parsed());
    assert_eq!(store.get_trust_store().anchors(), vec![extra.parsed()]);
}

#[test]
fn instances_sharing_a_platform_are_isolated() {
    let platform = static_platform(&[&make_cert("shared-root")]);
    let extra = make_cert("only-in-first");

    let mut first = sts::SystemTrustStore::new(platform.clone(), None);
    let second = sts::SystemTrustStore::new(platform, None);
    first.add_trust_anchor(extra.parsed());

    assert!(first.contains(&extra.parsed()));
    assert!(!second.contains(&extra.parsed()));
    assert!(!second.is_additional_trust_anchor(&extra.parsed()));
}

#[test]
fn concurrent_instances_do_not_see_each_others_anchors() {
    let platform = static_platform(&[]);
    let certs: Vec<_> = (0..4).map(|i| make_cert(&format!("thread-{i}"))).collect();
    let parsed: Vec<_> = certs.iter().map(|c| c.parsed()).collect();

    let handles: Vec<_> = parsed
        .iter()
        .cloned()
        .map(|cert| {
            let platform = platform.clone();
            std::thread::spawn(move || {
                let mut store = sts::SystemTrustStore::new(platform, None);
                store.add_trust_anchor(cert);
                store.get_trust_store().anchors()
            })
        })
        .collect();

    for (handle, cert) in handles.into_iter().zip(parsed) {
        assert_eq!(handle.join().unwrap(), vec![cert]);
    }
}

#[test]
fn empty_store_uses_no_system_anchors() {
    let mut store = sts::create_empty_system_trust_store();
    let extra = make_cert("explicit");
    assert!(!store.uses_system_trust_store());
    assert!(matches!(store.platform(), sts::PlatformSource::Empty));

    store.add_trust_anchor(extra.parsed());
    assert!(store.contains(&extra.parsed()));
    assert!(!store.is_known_root(&extra.parsed()));
}

#[test]
fn none_platform_factory_builds_an_empty_store() {
    let roots = Arc::new(sts::TestRootCerts::new());
    let test_root = make_cert("ignored-test-root");
    roots.add(test_root.parsed());

    let options = sts::TrustStoreOptions::secure_default()
        .with_platform(sts::PlatformKind::None)
        .with_test_roots(roots);
    let store = sts::create_ssl_system_trust_store_with(options);

    assert!(!store.uses_system_trust_store());
    assert!(!store.has_test_roots());
    assert!(!store.contains(&test_root.parsed()));
}

#[test]
fn test_roots_layer_in_only_when_supplied() {
    let roots = Arc::new(sts::TestRootCerts::new());
    let test_root = make_cert("test-root");
    roots.add(test_root.parsed());

    let with = sts::SystemTrustStore::new(static_platform(&[]), Some(Arc::clone(&roots)));
    let without = sts::SystemTrustStore::new(static_platform(&[]), None);

    assert!(with.contains(&test_root.parsed()));
    assert!(!with.is_known_root(&test_root.parsed()));
    assert!(!with.is_additional_trust_anchor(&test_root.parsed()));
    assert!(!without.contains(&test_root.parsed()));
}

#[test]
fn test_root_changes_are_visible_through_the_shared_handle() {
    let roots = Arc::new(sts::TestRootCerts::new());
    let store = sts::SystemTrustStore::new(static_platform(&[]), Some(Arc::clone(&roots)));
    let late = make_cert("late-test-root");

    assert!(!store.contains(&late.parsed()));
    roots.add_from_bytes(late.pem.as_bytes(), sts::CertFormat::Auto);
    assert!(store.contains(&late.parsed()));
    roots.clear();
    assert!(!store.contains(&late.parsed()));
}

#[test]
fn issuers_are_found_across_sources() {
    let mut ca_params = rcgen::CertificateParams::new(vec![]);
    ca_params.distinguished_name.push(rcgen::DnType::CommonName, "issuing-ca");
    ca_params.is_ca = rcgen::IsCa::Ca(rcgen::BasicConstraints::Unconstrained);
    let ca = rcgen::Certificate::from_params(ca_params).unwrap();

    let mut leaf_params = rcgen::CertificateParams::new(vec!["example.test".to_string()]);
    leaf_params.distinguished_name.push(rcgen::DnType::CommonName, "leaf");
    let leaf = rcgen::Certificate::from_params(leaf_params).unwrap();

    let ca_cert = sts::ParsedCertificate::from_der(ca.serialize_der().unwrap()).unwrap();
    let leaf_cert = sts::ParsedCertificate::from_der(leaf.serialize_der_with_signer(&ca).unwrap()).unwrap();
    assert!(!leaf_cert.is_self_issued());

    let platform = sts::PlatformSource::Static(Arc::new(std::iter::once(ca_cert.clone()).collect()));
    let mut store = sts::SystemTrustStore::new(platform, None);
    // the same anchor added again must not show up twice
    store.add_trust_anchor(ca_cert.clone());

    assert_eq!(store.get_trust_store().issuers_of(&leaf_cert), vec![ca_cert]);
    assert!(store.get_trust_store().issuers_of(&make_cert("stranger").parsed()).is_empty());
}

#[test]
fn unavailable_native_store_behaves_like_an_empty_platform() {
    let native = sts::NativeTrustStore::unavailable("no database");
    let mut store = sts::SystemTrustStore::new(sts::PlatformSource::Native(Arc::new(native)), None);
    let extra = make_cert("native-extra");

    assert!(!store.uses_system_trust_store());
    store.add_trust_anchor(extra.parsed());
    assert!(store.contains(&extra.parsed()));
    assert!(!store.is_known_root(&extra.parsed()));
}

#[test]
fn native_store_answers_are_checked_against_query_bytes() {
    struct OneRecord(Vec<u8>);

    impl sts::NativeCertDatabase for OneRecord {
        fn find(&self, _cert: &sts::ParsedCertificate) -> Option<sts::NativeRecord> {
            Some(sts::NativeRecord {
                der: self.0.clone(),
                default_root: true,
                user_slot: None,
            })
        }
        fn anchors(&self) -> Vec<sts::ParsedCertificate> {
            vec![sts::ParsedCertificate::from_der(self.0.clone()).unwrap()]
        }
    }

    let (known, asked) = (make_cert("native-known"), make_cert("native-asked"));
    let native = sts::NativeTrustStore::open(OneRecord(known.der.clone()));
    let store = sts::SystemTrustStore::new(sts::PlatformSource::Native(Arc::new(native)), None);

    assert!(store.uses_system_trust_store());
    assert!(store.contains(&known.parsed()));
    assert!(store.is_known_root(&known.parsed()));
    assert!(!store.contains(&asked.parsed()));
    assert!(!store.is_known_root(&asked.parsed()));
}

/// Native records as (DER, user slot); slotless records ship with the platform.
struct SlottedDb(Vec<(Vec<u8>, Option<&'static str>)>);

impl sts::NativeCertDatabase for SlottedDb {
    fn find(&self, cert: &sts::ParsedCertificate) -> Option<sts::NativeRecord> {
        let (der, slot) = self.0.iter().find(|(der, _)| der.as_slice() == cert.der())?;
        Some(sts::NativeRecord {
            der: der.clone(),
            default_root: slot.is_none(),
            user_slot: slot.map(str::to_string),
        })
    }
    fn anchors(&self) -> Vec<sts::ParsedCertificate> {
        self.0
            .iter()
            .map(|(der, _)| sts::ParsedCertificate::from_der(der.clone()).unwrap())
            .collect()
    }
}

#[test]
fn user_slot_policies_narrow_native_trust() {
    let (builtin, corp, other) = (make_cert("builtin-root"), make_cert("corp-ca"), make_cert("other-ca"));
    let native = Arc::new(sts::NativeTrustStore::open(SlottedDb(vec![
        (builtin.der.clone(), None),
        (corp.der.clone(), Some("corp-slot")),
        (other.der.clone(), Some("other-slot")),
    ])));

    let restricted = sts::SystemTrustStore::new(
        sts::PlatformSource::Native(Arc::new(
            native.with_user_slots(sts::UserSlotPolicy::RestrictTo("corp-slot".into())),
        )),
        None,
    );
    assert!(restricted.contains(&builtin.parsed()));
    assert!(restricted.is_known_root(&builtin.parsed()));
    assert!(restricted.contains(&corp.parsed()));
    assert!(!restricted.is_known_root(&corp.parsed()));
    assert!(!restricted.contains(&other.parsed()));
    assert_eq!(
        restricted.get_trust_store().anchors(),
        vec![builtin.parsed(), corp.parsed()]
    );

    let no_user = sts::SystemTrustStore::new(
        sts::PlatformSource::Native(Arc::new(native.with_user_slots(sts::UserSlotPolicy::NoUserSlots))),
        None,
    );
    assert!(no_user.contains(&builtin.parsed()));
    assert!(!no_user.contains(&corp.parsed()));
    assert!(!no_user.contains(&other.parsed()));
    assert_eq!(no_user.get_trust_store().anchors(), vec![builtin.parsed()]);

    let unrestricted = sts::SystemTrustStore::new(sts::PlatformSource::Native(native), None);
    assert!(unrestricted.contains(&other.parsed()));
}

#[test]
fn slot_restricted_factories_use_the_native_platform() {
    let restricted = sts::create_ssl_system_trust_store_with_user_slot_restriction("corp-slot");
    let sts::PlatformSource::Native(store) = restricted.platform() else {
        panic!("native platform expected");
    };
    assert_eq!(store.user_slots(), &sts::UserSlotPolicy::RestrictTo("corp-slot".into()));

    let no_user = sts::create_ssl_system_trust_store_with_no_user_slots();
    let sts::PlatformSource::Native(store) = no_user.platform() else {
        panic!("native platform expected");
    };
    assert_eq!(store.user_slots(), &sts::UserSlotPolicy::NoUserSlots);
}
