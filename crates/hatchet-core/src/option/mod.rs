//! Typed, validated option values.
//!
//! Every configurable field on a module or payload is a [`ModuleOption`]
//! tagged with an [`OptionKind`]. Setting an option is split into a pure
//! [`ModuleOption::parse`] step and an infallible [`ModuleOption::commit`], so
//! a rejected value leaves the option exactly as it was. The reference kinds
//! (`payload`, `encoder`, `session`) resolve against live entities through an
//! [`OptionResolver`]; every other kind validates locally.

mod error;
mod validate;

use std::fmt;
use std::net::Ipv4Addr;

use indexmap::IndexMap;
use strum::{Display, EnumString, IntoStaticStr};

use crate::ids::{EncoderId, PayloadId, SessionId};

pub use self::error::OptionError;
pub(crate) use self::validate::parse_boolean;

/// Type tag that selects the validator for an option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum OptionKind {
    /// Dotted-quad IPv4 address.
    Ipv4,
    /// IPv6 address.
    Ipv6,
    /// Either IPv4 or IPv6 address.
    Ip,
    /// Six colon- or dash-separated hex octets.
    Mac,
    /// IPv4 network in CIDR notation.
    Ipv4Cidr,
    /// IPv6 network in CIDR notation.
    Ipv6Cidr,
    /// TCP/UDP port in `1..=65535`.
    Port,
    /// Inclusive `low-high` port range.
    PortRange,
    /// Non-negative decimal number.
    Number,
    /// Signed decimal integer.
    Integer,
    /// Finite floating-point number.
    Float,
    /// `yes`/`no` flag.
    Boolean,
    /// Reference to a payload compatible with the current module.
    Payload,
    /// Reference to an encoder compatible with the current payload.
    Encoder,
    /// Reference to a live session on a matching platform.
    Session,
}

impl OptionKind {
    /// Name used in validation messages.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Ipv4 => "IPv4",
            Self::Ipv6 => "IPv6",
            Self::Ip => "IP",
            Self::Mac => "MAC",
            Self::Ipv4Cidr => "IPv4 CIDR",
            Self::Ipv6Cidr => "IPv6 CIDR",
            Self::Port => "port",
            Self::PortRange => "port range",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Boolean => "boolean",
            Self::Payload => "payload",
            Self::Encoder => "encoder",
            Self::Session => "session",
        }
    }
}

/// A validated option value.
#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue {
    /// Address, network, MAC, or port-range text, stored verbatim.
    Text(String),
    /// Result of a `number` or `integer` option.
    Integer(i64),
    /// Result of a `float` option.
    Float(f64),
    /// Result of a `boolean` option.
    Bool(bool),
    /// Result of a `port` option.
    Port(u16),
    /// Resolved payload reference.
    Payload(PayloadId),
    /// Resolved encoder reference.
    Encoder(EncoderId),
    /// Resolved session reference.
    Session(SessionId),
}

impl OptionValue {
    /// Returns `true` for `yes` booleans and for `y`/`yes` text.
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Bool(flag) => *flag,
            Self::Text(text) => parse_boolean(text).unwrap_or(false),
            _ => false,
        }
    }

    /// Returns the textual value, if this is a text variant.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Returns the port, if this is a port variant.
    #[must_use]
    pub const fn as_port(&self) -> Option<u16> {
        match self {
            Self::Port(port) => Some(*port),
            _ => None,
        }
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Integer(value) => write!(f, "{value}"),
            Self::Float(value) => write!(f, "{value}"),
            Self::Bool(true) => f.write_str("yes"),
            Self::Bool(false) => f.write_str("no"),
            Self::Port(port) => write!(f, "{port}"),
            Self::Payload(id) => write!(f, "{id}"),
            Self::Encoder(id) => write!(f, "{id}"),
            Self::Session(id) => write!(f, "{id}"),
        }
    }
}

/// Little- and big-endian byte forms of an IPv4 host or a port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedValue {
    /// Least significant byte first.
    pub little: Vec<u8>,
    /// Network byte order.
    pub big: Vec<u8>,
}

impl PackedValue {
    #[expect(
        clippy::little_endian_bytes,
        clippy::big_endian_bytes,
        reason = "packed forms are explicit byte orders"
    )]
    fn derive(kind: OptionKind, value: &OptionValue) -> Option<Self> {
        match (kind, value) {
            (OptionKind::Ipv4, OptionValue::Text(text)) => {
                let big = text.parse::<Ipv4Addr>().ok()?.octets().to_vec();
                let little = big.iter().rev().copied().collect();
                Some(Self { little, big })
            }
            (OptionKind::Port, OptionValue::Port(port)) => Some(Self {
                little: port.to_le_bytes().to_vec(),
                big: port.to_be_bytes().to_vec(),
            }),
            _ => None,
        }
    }
}

/// Restricts which sessions a `session` option accepts.
///
/// An empty platform list defers to the current module's platforms.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionFilter {
    /// Accepted session platforms.
    pub platforms: Vec<String>,
    /// Accepted session type, if restricted.
    pub session_type: Option<String>,
}

/// Resolves the cross-entity option kinds against live state.
pub trait OptionResolver {
    /// Resolves a payload name or shorthand compatible with the current
    /// module.
    fn resolve_payload(&self, raw: &str) -> Option<PayloadId>;

    /// Resolves an encoder name or shorthand compatible with the current
    /// payload.
    fn resolve_encoder(&self, raw: &str) -> Option<EncoderId>;

    /// Returns `true` when `id` names a live session accepted by `filter`.
    fn session_exists(&self, id: SessionId, filter: &SessionFilter) -> bool;
}

/// Resolver that rejects every reference; used where no entities exist.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoReferences;

impl OptionResolver for NoReferences {
    fn resolve_payload(&self, _raw: &str) -> Option<PayloadId> {
        None
    }

    fn resolve_encoder(&self, _raw: &str) -> Option<EncoderId> {
        None
    }

    fn session_exists(&self, _id: SessionId, _filter: &SessionFilter) -> bool {
        false
    }
}

/// A single typed option on a module or payload.
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleOption {
    kind: OptionKind,
    value: Option<OptionValue>,
    required: bool,
    description: String,
    packed: Option<PackedValue>,
    sessions: SessionFilter,
}

impl ModuleOption {
    /// Creates an optional, unset option.
    pub fn new(kind: OptionKind, description: impl Into<String>) -> Self {
        Self {
            kind,
            value: None,
            required: false,
            description: description.into(),
            packed: None,
            sessions: SessionFilter::default(),
        }
    }

    /// Marks the option as required or optional.
    #[must_use]
    pub const fn with_required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Seeds the option with an already-validated value.
    #[must_use]
    pub fn with_value(mut self, value: OptionValue) -> Self {
        self.commit(value);
        self
    }

    /// Seeds the option by parsing `raw` with the local validators.
    ///
    /// # Errors
    ///
    /// Returns [`OptionError::Validation`] when `raw` does not parse, or
    /// [`OptionError::Compatibility`] for reference kinds.
    pub fn with_default(mut self, raw: &str) -> Result<Self, OptionError> {
        self.set(raw, &NoReferences)?;
        Ok(self)
    }

    /// Restricts a `session` option to the given platforms and type.
    #[must_use]
    pub fn with_session_filter(mut self, filter: SessionFilter) -> Self {
        self.sessions = filter;
        self
    }

    /// Type tag of this option.
    #[must_use]
    pub const fn kind(&self) -> OptionKind {
        self.kind
    }

    /// Current value, if any.
    #[must_use]
    pub const fn value(&self) -> Option<&OptionValue> {
        self.value.as_ref()
    }

    /// Whether the option must hold a value before the module runs.
    #[must_use]
    pub const fn is_required(&self) -> bool {
        self.required
    }

    /// Human-readable description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Packed byte forms for `ipv4` and `port` options.
    #[must_use]
    pub const fn packed(&self) -> Option<&PackedValue> {
        self.packed.as_ref()
    }

    /// Session restriction for `session` options.
    #[must_use]
    pub const fn session_filter(&self) -> &SessionFilter {
        &self.sessions
    }

    /// Returns `true` when the current value is truthy.
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        self.value.as_ref().is_some_and(OptionValue::is_truthy)
    }

    /// Current value rendered for listings; empty when unset.
    #[must_use]
    pub fn display_value(&self) -> String {
        self.value
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default()
    }

    /// Validates `raw` without touching the option.
    ///
    /// # Errors
    ///
    /// Returns [`OptionError::Validation`] for malformed local values and
    /// [`OptionError::Compatibility`] when a reference does not resolve.
    pub fn parse(
        &self,
        raw: &str,
        resolver: &dyn OptionResolver,
    ) -> Result<OptionValue, OptionError> {
        if let Some(local) = validate::parse_local(self.kind, raw) {
            return local;
        }
        let trimmed = raw.trim();
        match self.kind {
            OptionKind::Payload => resolver
                .resolve_payload(trimmed)
                .map(OptionValue::Payload)
                .ok_or_else(|| OptionError::compatibility("payload")),
            OptionKind::Encoder => resolver
                .resolve_encoder(trimmed)
                .map(OptionValue::Encoder)
                .ok_or_else(|| OptionError::compatibility("encoder")),
            _ => trimmed
                .parse::<SessionId>()
                .ok()
                .filter(|id| resolver.session_exists(*id, &self.sessions))
                .map(OptionValue::Session)
                .ok_or_else(|| OptionError::compatibility("session")),
        }
    }

    /// Replaces the value and its derived byte forms.
    pub fn commit(&mut self, value: OptionValue) {
        self.packed = PackedValue::derive(self.kind, &value);
        self.value = Some(value);
    }

    /// Parses and commits `raw` in one step.
    ///
    /// # Errors
    ///
    /// Propagates [`ModuleOption::parse`] failures; the option is unchanged
    /// on error.
    pub fn set(&mut self, raw: &str, resolver: &dyn OptionResolver) -> Result<(), OptionError> {
        let value = self.parse(raw, resolver)?;
        self.commit(value);
        Ok(())
    }

    /// Clears the value.
    pub fn clear(&mut self) {
        self.value = None;
        self.packed = None;
    }

    /// Changes whether the option is required.
    pub const fn set_required(&mut self, required: bool) {
        self.required = required;
    }

    /// Copies the value and byte forms of `other` without changing the kind,
    /// description, or requirement.
    pub(crate) fn adopt_value(&mut self, other: &Self) {
        self.value.clone_from(&other.value);
        self.packed.clone_from(&other.packed);
    }
}

/// Ordered options keyed by upper-case name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OptionSet {
    options: IndexMap<String, ModuleOption>,
}

impl OptionSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an option, builder style.
    #[must_use]
    pub fn with(mut self, name: &str, option: ModuleOption) -> Self {
        self.insert(name, option);
        self
    }

    /// Inserts or replaces an option, returning the previous one.
    pub fn insert(&mut self, name: &str, option: ModuleOption) -> Option<ModuleOption> {
        self.options.insert(name.to_ascii_uppercase(), option)
    }

    /// Looks up an option, ignoring case.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ModuleOption> {
        self.options.get(name.to_ascii_uppercase().as_str())
    }

    /// Looks up an option mutably, ignoring case.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut ModuleOption> {
        self.options.get_mut(name.to_ascii_uppercase().as_str())
    }

    /// Removes an option while keeping the order of the rest.
    pub fn remove(&mut self, name: &str) -> Option<ModuleOption> {
        self.options.shift_remove(name.to_ascii_uppercase().as_str())
    }

    /// Returns `true` when the option exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Iterates options in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ModuleOption)> {
        self.options.iter().map(|(name, option)| (name.as_str(), option))
    }

    /// Option names in declaration order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.options.keys().map(String::as_str).collect()
    }

    /// Names of required options that hold no value.
    #[must_use]
    pub fn missing_required(&self) -> Vec<&str> {
        self.iter()
            .filter(|(_, option)| option.is_required() && option.value().is_none())
            .map(|(name, _)| name)
            .collect()
    }

    /// Number of options.
    #[must_use]
    pub fn len(&self) -> usize {
        self.options.len()
    }

    /// Returns `true` when the set holds no options.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }
}

#[cfg(test)]
mod tests;
