//! Local validators for the option types that need no collaborators.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use super::{OptionError, OptionKind, OptionValue};

/// Parses `input` for a kind that validates without any collaborator.
///
/// Returns `None` for the reference kinds (`payload`, `encoder`, `session`),
/// which the caller resolves separately.
pub(super) fn parse_local(
    kind: OptionKind,
    input: &str,
) -> Option<Result<OptionValue, OptionError>> {
    let raw = input.trim();
    let parsed = match kind {
        OptionKind::Ipv4 => text_if(kind, raw.parse::<Ipv4Addr>().is_ok(), raw),
        OptionKind::Ipv6 => text_if(kind, raw.parse::<Ipv6Addr>().is_ok(), raw),
        OptionKind::Ip => text_if(kind, raw.parse::<IpAddr>().is_ok(), raw),
        OptionKind::Mac => text_if(kind, is_mac(raw), raw),
        OptionKind::Ipv4Cidr => text_if(kind, is_cidr::<Ipv4Addr>(raw, 32), raw),
        OptionKind::Ipv6Cidr => text_if(kind, is_cidr::<Ipv6Addr>(raw, 128), raw),
        OptionKind::PortRange => text_if(kind, is_port_range(raw), raw),
        OptionKind::Port => parse_port(raw)
            .map(OptionValue::Port)
            .ok_or_else(|| OptionError::validation(kind.label())),
        OptionKind::Number => parse_number(raw)
            .map(OptionValue::Integer)
            .ok_or_else(|| OptionError::validation(kind.label())),
        OptionKind::Integer => raw
            .parse::<i64>()
            .map(OptionValue::Integer)
            .map_err(|_| OptionError::validation(kind.label())),
        OptionKind::Float => parse_float(raw)
            .map(OptionValue::Float)
            .ok_or_else(|| OptionError::validation(kind.label())),
        OptionKind::Boolean => parse_boolean(raw)
            .map(OptionValue::Bool)
            .ok_or_else(|| OptionError::validation(kind.label())),
        OptionKind::Payload | OptionKind::Encoder | OptionKind::Session => return None,
    };
    Some(parsed)
}

fn text_if(kind: OptionKind, valid: bool, raw: &str) -> Result<OptionValue, OptionError> {
    if valid {
        Ok(OptionValue::Text(raw.to_owned()))
    } else {
        Err(OptionError::validation(kind.label()))
    }
}

/// Accepts `y`, `yes`, `n`, and `no` in any case.
pub(crate) fn parse_boolean(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" => Some(true),
        "n" | "no" => Some(false),
        _ => None,
    }
}

fn parse_port(raw: &str) -> Option<u16> {
    raw.parse::<u16>().ok().filter(|port| *port != 0)
}

/// Non-negative decimal digits only.
fn parse_number(raw: &str) -> Option<i64> {
    if raw.is_empty() || !raw.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }
    raw.parse::<i64>().ok()
}

fn parse_float(raw: &str) -> Option<f64> {
    raw.parse::<f64>().ok().filter(|value| value.is_finite())
}

fn is_mac(raw: &str) -> bool {
    let groups: Vec<&str> = raw.split([':', '-']).collect();
    groups.len() == 6
        && groups
            .iter()
            .all(|group| group.len() == 2 && group.bytes().all(|byte| byte.is_ascii_hexdigit()))
}

fn is_cidr<A: std::str::FromStr>(raw: &str, max_prefix: u8) -> bool {
    let Some((address, prefix)) = raw.split_once('/') else {
        return false;
    };
    address.parse::<A>().is_ok()
        && prefix
            .parse::<u8>()
            .is_ok_and(|bits| bits <= max_prefix && !prefix.starts_with('+'))
}

fn is_port_range(raw: &str) -> bool {
    let Some((low, high)) = raw.split_once('-') else {
        return false;
    };
    match (parse_port(low), parse_port(high)) {
        (Some(low_port), Some(high_port)) => low_port <= high_port,
        _ => false,
    }
}
