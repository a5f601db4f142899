//! Unit tests for option validation and commit semantics.

use rstest::rstest;

use super::*;

struct StubResolver {
    payload: Option<&'static str>,
    live_session: u32,
}

impl OptionResolver for StubResolver {
    fn resolve_payload(&self, raw: &str) -> Option<PayloadId> {
        self.payload.filter(|id| *id == raw).map(PayloadId::from)
    }

    fn resolve_encoder(&self, raw: &str) -> Option<EncoderId> {
        (raw == "x64/xor").then(|| EncoderId::from(raw))
    }

    fn session_exists(&self, id: SessionId, _filter: &SessionFilter) -> bool {
        id.get() == self.live_session
    }
}

fn resolver() -> StubResolver {
    StubResolver {
        payload: Some("linux/x64/shell_reverse_tcp"),
        live_session: 3,
    }
}

#[rstest]
#[case::ipv4(OptionKind::Ipv4, "10.0.0.1")]
#[case::ipv6(OptionKind::Ipv6, "fe80::1")]
#[case::ip_accepts_v4(OptionKind::Ip, "192.168.1.1")]
#[case::ip_accepts_v6(OptionKind::Ip, "::1")]
#[case::mac_colons(OptionKind::Mac, "aa:bb:cc:dd:ee:ff")]
#[case::mac_dashes(OptionKind::Mac, "AA-BB-CC-00-11-22")]
#[case::ipv4_cidr(OptionKind::Ipv4Cidr, "10.0.0.0/8")]
#[case::ipv6_cidr(OptionKind::Ipv6Cidr, "2001:db8::/32")]
#[case::port_range(OptionKind::PortRange, "20-25")]
fn text_kinds_store_verbatim(#[case] kind: OptionKind, #[case] raw: &str) {
    let mut option = ModuleOption::new(kind, "test");
    option.set(raw, &NoReferences).expect("valid value");
    assert_eq!(option.value(), Some(&OptionValue::Text(raw.to_owned())));
}

#[rstest]
#[case::ipv4_octet(OptionKind::Ipv4, "300.1.1.1")]
#[case::ipv4_given_v6(OptionKind::Ipv4, "::1")]
#[case::ipv6_given_v4(OptionKind::Ipv6, "127.0.0.1")]
#[case::mac_short(OptionKind::Mac, "aa:bb:cc:dd:ee")]
#[case::cidr_prefix(OptionKind::Ipv4Cidr, "10.0.0.0/33")]
#[case::cidr_missing_prefix(OptionKind::Ipv6Cidr, "::1")]
#[case::port_zero(OptionKind::Port, "0")]
#[case::port_overflow(OptionKind::Port, "65536")]
#[case::port_range_inverted(OptionKind::PortRange, "25-20")]
#[case::number_negative(OptionKind::Number, "-1")]
#[case::integer_text(OptionKind::Integer, "ten")]
#[case::float_nan(OptionKind::Float, "NaN")]
#[case::boolean_other(OptionKind::Boolean, "true")]
fn malformed_values_name_the_expected_kind(#[case] kind: OptionKind, #[case] raw: &str) {
    let option = ModuleOption::new(kind, "test");
    let error = option.parse(raw, &NoReferences).expect_err("must reject");
    assert_eq!(
        error.to_string(),
        format!("Invalid option value, expected valid {}!", kind.label())
    );
}

#[rstest]
#[case("Y", true)]
#[case("yes", true)]
#[case("YES", true)]
#[case("N", false)]
#[case("no", false)]
#[case("nO", false)]
fn boolean_coercion_is_case_insensitive(#[case] raw: &str, #[case] expected: bool) {
    let mut option = ModuleOption::new(OptionKind::Boolean, "flag");
    option.set(raw, &NoReferences).expect("valid boolean");
    assert_eq!(option.value(), Some(&OptionValue::Bool(expected)));
    assert_eq!(option.is_truthy(), expected);
}

#[rstest]
#[case::number(OptionKind::Number, "42", OptionValue::Integer(42))]
#[case::integer(OptionKind::Integer, "-7", OptionValue::Integer(-7))]
#[case::float(OptionKind::Float, "2.5", OptionValue::Float(2.5))]
#[case::port(OptionKind::Port, "4444", OptionValue::Port(4444))]
fn numeric_kinds_store_typed_values(
    #[case] kind: OptionKind,
    #[case] raw: &str,
    #[case] expected: OptionValue,
) {
    let mut option = ModuleOption::new(kind, "numeric");
    option.set(raw, &NoReferences).expect("valid number");
    assert_eq!(option.value(), Some(&expected));
}

#[test]
fn port_derives_packed_forms() {
    let option = ModuleOption::new(OptionKind::Port, "port")
        .with_default("4444")
        .expect("valid port");
    let packed = option.packed().expect("port is packed");
    assert_eq!(packed.big, vec![0x11, 0x5c]);
    assert_eq!(packed.little, vec![0x5c, 0x11]);
}

#[test]
fn ipv4_derives_packed_forms() {
    let option = ModuleOption::new(OptionKind::Ipv4, "host")
        .with_default("192.168.0.10")
        .expect("valid host");
    let packed = option.packed().expect("ipv4 is packed");
    assert_eq!(packed.big, vec![192, 168, 0, 10]);
    assert_eq!(packed.little, vec![10, 0, 168, 192]);
}

#[test]
fn rejected_value_leaves_option_unchanged() {
    let mut option = ModuleOption::new(OptionKind::Port, "port")
        .with_default("8080")
        .expect("valid port");
    let before = option.clone();
    assert!(option.set("http", &NoReferences).is_err());
    assert_eq!(option, before);
}

#[test]
fn payload_reference_resolves_through_resolver() {
    let mut option = ModuleOption::new(OptionKind::Payload, "payload");
    option
        .set("linux/x64/shell_reverse_tcp", &resolver())
        .expect("compatible payload");
    assert_eq!(
        option.value(),
        Some(&OptionValue::Payload(PayloadId::from(
            "linux/x64/shell_reverse_tcp"
        )))
    );
}

#[rstest]
#[case::payload(OptionKind::Payload, "windows/x86/shell", "payload")]
#[case::encoder(OptionKind::Encoder, "x86/shikata", "encoder")]
#[case::session_unknown(OptionKind::Session, "9", "session")]
#[case::session_not_numeric(OptionKind::Session, "abc", "session")]
fn unresolved_references_report_compatibility(
    #[case] kind: OptionKind,
    #[case] raw: &str,
    #[case] label: &str,
) {
    let option = ModuleOption::new(kind, "reference");
    let error = option.parse(raw, &resolver()).expect_err("must reject");
    assert!(matches!(error, OptionError::Compatibility { .. }));
    assert_eq!(
        error.to_string(),
        format!("Invalid option value, expected valid {label}!")
    );
}

#[test]
fn session_reference_accepts_live_session() {
    let mut option = ModuleOption::new(OptionKind::Session, "session");
    option.set(" 3 ", &resolver()).expect("live session");
    assert_eq!(option.value(), Some(&OptionValue::Session(SessionId::new(3))));
}

#[test]
fn option_set_is_case_insensitive_and_ordered() {
    let mut set = OptionSet::new()
        .with("rhost", ModuleOption::new(OptionKind::Ip, "target").with_required(true))
        .with("RPORT", ModuleOption::new(OptionKind::Port, "port"))
        .with("verbose", ModuleOption::new(OptionKind::Boolean, "chatty"));

    assert!(set.contains("Rhost"));
    assert_eq!(set.names(), vec!["RHOST", "RPORT", "VERBOSE"]);
    assert_eq!(set.missing_required(), vec!["RHOST"]);

    set.remove("rport");
    assert_eq!(set.names(), vec!["RHOST", "VERBOSE"]);
}

#[test]
fn booleans_display_as_yes_and_no() {
    assert_eq!(OptionValue::Bool(true).to_string(), "yes");
    assert_eq!(OptionValue::Bool(false).to_string(), "no");
}
