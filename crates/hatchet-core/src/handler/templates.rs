//! Base option templates merged into modules and payloads.

use crate::option::{ModuleOption, OptionKind, OptionSet, OptionValue};

use super::{HandlerDefaults, HandlerField};

fn host(description: &str, host: &str) -> ModuleOption {
    ModuleOption::new(OptionKind::Ip, description)
        .with_required(true)
        .with_value(OptionValue::Text(host.to_owned()))
}

fn port(description: &str, port: u16) -> ModuleOption {
    ModuleOption::new(OptionKind::Port, description)
        .with_required(true)
        .with_value(OptionValue::Port(port))
}

/// Module-side fields: listener address, bind target, payload, blinder.
pub(super) fn module_template(defaults: &HandlerDefaults) -> OptionSet {
    OptionSet::new()
        .with(
            HandlerField::Lhost.as_str(),
            host("Local host to listen on.", &defaults.listen_host),
        )
        .with(
            HandlerField::Lport.as_str(),
            port("Local port to listen on.", defaults.port),
        )
        .with(
            HandlerField::Rbport.as_str(),
            port("Remote bind port to connect to.", defaults.port),
        )
        .with(
            HandlerField::Payload.as_str(),
            ModuleOption::new(OptionKind::Payload, "Payload to use.").with_required(true),
        )
        .with(
            HandlerField::Blinder.as_str(),
            ModuleOption::new(OptionKind::Boolean, "Start blinder instead of a payload.")
                .with_required(true),
        )
}

/// Payload-side fields: connect-back address and bind port.
pub(super) fn payload_template(defaults: &HandlerDefaults) -> OptionSet {
    OptionSet::new()
        .with(
            HandlerField::Cbhost.as_str(),
            host("Connect-back host.", &defaults.connect_back_host),
        )
        .with(
            HandlerField::Cbport.as_str(),
            port("Connect-back port.", defaults.port),
        )
        .with(
            HandlerField::Bport.as_str(),
            port("Bind port.", defaults.port),
        )
}
