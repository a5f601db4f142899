//! Entity metadata, binding filters, and the in-memory catalog.

use std::str::FromStr;

use rstest::{fixture, rstest};

use super::*;
use crate::option::OptionKind;
use crate::tests::support::{
    BIND_PAYLOAD, BROKEN_MODULE, DEMO_MODULE, DUAL_PAYLOAD, FOREIGN_PAYLOAD, ONE_SIDE_PAYLOAD,
    REVERSE_PAYLOAD, SCANNER_MODULE, demo_catalog,
};

#[fixture]
fn catalog() -> InMemoryCatalog {
    demo_catalog()
}

fn details(platform: &str, architecture: &str, kind: ConnectionType) -> PayloadDetails {
    PayloadDetails {
        id: PayloadId::from("test/payload"),
        name: String::from("payload"),
        platform: platform.to_owned(),
        architecture: architecture.to_owned(),
        kind,
        handler: Vec::new(),
        description: String::new(),
    }
}

fn module(catalog: &InMemoryCatalog, id: &str) -> Module {
    catalog.module(&ModuleId::from(id)).expect("module registered")
}

fn payload(catalog: &InMemoryCatalog, id: &str) -> Payload {
    catalog.payload(&PayloadId::from(id)).expect("payload registered")
}

#[rstest]
#[case("exploit/linux/demo/backdoor", "exploit")]
#[case("auxiliary/multi/scan/ports", "auxiliary")]
#[case("standalone", "standalone")]
fn category_is_the_first_path_segment(#[case] id: &str, #[case] category: &str) {
    assert_eq!(ModuleDetails::new(id, "Name").category, category);
}

#[rstest]
#[case("reverse_tcp", ConnectionType::ReverseTcp)]
#[case("BIND_TCP", ConnectionType::BindTcp)]
#[case("one_side", ConnectionType::OneSide)]
fn connection_types_parse(#[case] raw: &str, #[case] expected: ConnectionType) {
    assert_eq!(ConnectionType::from_str(raw).expect("known type"), expected);
}

#[rstest]
fn empty_binding_accepts_anything() {
    let binding = PayloadBinding::default();
    assert!(binding.accepts(&details("windows", "x86", ConnectionType::BindTcp)));
}

#[rstest]
#[case(details("Linux", "x64", ConnectionType::ReverseTcp), true)]
#[case(details("windows", "x64", ConnectionType::ReverseTcp), false)]
#[case(details("linux", "armle", ConnectionType::ReverseTcp), false)]
#[case(details("linux", "x64", ConnectionType::OneSide), false)]
fn binding_filters_combine(#[case] payload: PayloadDetails, #[case] accepted: bool) {
    let binding = PayloadBinding {
        platforms: Some(vec![String::from("linux")]),
        architectures: Some(vec![String::from("x64"), String::from("x86")]),
        types: Some(vec![ConnectionType::ReverseTcp, ConnectionType::BindTcp]),
        ..PayloadBinding::default()
    };
    assert_eq!(binding.accepts(&payload), accepted);
}

#[rstest]
#[case(REVERSE_PAYLOAD, true)]
#[case(BIND_PAYLOAD, true)]
#[case(DUAL_PAYLOAD, true)]
#[case(ONE_SIDE_PAYLOAD, true)]
#[case(FOREIGN_PAYLOAD, false)]
#[case("linux/x64/absent", false)]
fn payload_compatibility_follows_the_binding(
    catalog: InMemoryCatalog,
    #[case] id: &str,
    #[case] compatible: bool,
) {
    let demo = module(&catalog, DEMO_MODULE);
    assert_eq!(
        catalog.check_payload_compatible(&PayloadId::from(id), &demo),
        compatible
    );
}

#[rstest]
fn modules_without_a_binding_take_no_payload(catalog: InMemoryCatalog) {
    let broken = module(&catalog, BROKEN_MODULE);
    assert!(!catalog.check_payload_compatible(&PayloadId::from(REVERSE_PAYLOAD), &broken));
}

#[rstest]
#[case("x64/xor", true)]
#[case("generic/base64", true)]
#[case("x86/shikata", false)]
#[case("x64/absent", false)]
fn encoder_compatibility_follows_architecture(
    catalog: InMemoryCatalog,
    #[case] id: &str,
    #[case] compatible: bool,
) {
    let reverse = payload(&catalog, REVERSE_PAYLOAD);
    assert_eq!(
        catalog.check_encoder_compatible(&EncoderId::from(id), &reverse),
        compatible
    );
}

#[rstest]
fn duplicates_are_rejected(mut catalog: InMemoryCatalog) {
    let copy = module(&catalog, DEMO_MODULE);
    let error = catalog.add_module(copy).expect_err("duplicate module");
    assert_eq!(
        error.to_string(),
        format!("module '{DEMO_MODULE}' is already registered")
    );

    let plugin = catalog.plugin("demo").expect("plugin registered");
    assert!(catalog.add_plugin(plugin).is_err());
}

#[rstest]
fn listings_keep_registration_order(catalog: InMemoryCatalog) {
    let ids: Vec<String> = catalog
        .entries(EntityKind::Module)
        .into_iter()
        .map(|entry| entry.id)
        .collect();
    assert_eq!(ids, [DEMO_MODULE, SCANNER_MODULE, BROKEN_MODULE]);
}

#[rstest]
#[case("0", DEMO_MODULE)]
#[case("2", BROKEN_MODULE)]
#[case("9", "9")]
#[case("backdoor", DEMO_MODULE)]
#[case("exploit/other", "exploit/other")]
fn shorthand_resolves_numbers_and_aliases(
    mut catalog: InMemoryCatalog,
    #[case] raw: &str,
    #[case] expected: &str,
) {
    catalog.add_alias(EntityKind::Module, "backdoor", DEMO_MODULE);
    assert_eq!(catalog.find_shorthand(EntityKind::Module, raw), expected);
}

#[rstest]
fn catalog_hands_out_fresh_instances(catalog: InMemoryCatalog) {
    let mut first = module(&catalog, DEMO_MODULE);
    first.unbind_payload();
    first
        .options_mut()
        .get_mut("RHOST")
        .expect("declared")
        .commit(OptionValue::Text(String::from("10.0.0.1")));

    let second = module(&catalog, DEMO_MODULE);
    assert!(second.options().get("RHOST").and_then(ModuleOption::value).is_none());
}

#[rstest]
fn missing_required_covers_module_and_payload(catalog: InMemoryCatalog) {
    let mut demo = module(&catalog, DEMO_MODULE);
    assert_eq!(demo.missing_required(), ["RHOST"]);

    let bind = payload(&catalog, BIND_PAYLOAD).with_option(
        "RPORT",
        ModuleOption::new(OptionKind::Port, "Remote port.").with_required(true),
    );
    demo.bind_payload(Some(bind), PayloadId::from(BIND_PAYLOAD));
    assert_eq!(demo.missing_required(), ["RHOST", "RPORT"]);
}
