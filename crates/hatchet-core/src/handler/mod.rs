//! Handler option synthesis.
//!
//! Modules that accept payloads expose connection fields (`LHOST`, `LPORT`,
//! `RBPORT`, `PAYLOAD`, `BLINDER`) and their payloads expose the matching
//! connector fields (`CBHOST`, `CBPORT`, `BPORT`). Which of them apply depends
//! on the chosen payload's connection direction, so the console re-runs
//! [`HandlerRegistry::synthesize`] around every command.
//!
//! The registry keeps one persisted option set per module id and per payload
//! id. Fields pruned from a live option map are restored from the registry
//! the next time they apply, so operator-entered values survive payload
//! switches. Each pass publishes a [`HandlerMap`] holding only the fields that
//! survived pruning; listener and connector code reads host and port values
//! from it.
//!
//! Synthesis is idempotent: two passes with no intervening option change
//! publish equal maps.

mod templates;

use std::collections::HashMap;

use hatchet_config::Config;
use indexmap::IndexMap;
use strum::{Display, EnumString, IntoStaticStr};
use tracing::debug;

use crate::entity::{ConnectionType, Module};
use crate::ids::{ModuleId, PayloadId};
use crate::option::{ModuleOption, OptionSet, OptionValue};

const HANDLER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::handler");

/// Connection fields managed by the synthesizer.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumString, IntoStaticStr,
)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum HandlerField {
    /// Local listener host.
    Lhost,
    /// Local listener port.
    Lport,
    /// Remote port a bind payload listens on.
    Rbport,
    /// Chosen payload.
    Payload,
    /// Blinder toggle.
    Blinder,
    /// Host a reverse payload connects back to.
    Cbhost,
    /// Port a reverse payload connects back to.
    Cbport,
    /// Port a bind payload listens on.
    Bport,
}

impl HandlerField {
    /// Module-side fields, in publication order.
    pub const MODULE: [Self; 5] = [
        Self::Lhost,
        Self::Lport,
        Self::Rbport,
        Self::Payload,
        Self::Blinder,
    ];

    /// Payload-side fields, in publication order.
    pub const PAYLOAD: [Self; 3] = [Self::Cbhost, Self::Cbport, Self::Bport];

    /// Upper-case option name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        self.into()
    }
}

/// Connection fields published for listeners and connectors.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HandlerMap {
    fields: IndexMap<HandlerField, Option<OptionValue>>,
}

impl HandlerMap {
    fn publish(entry: &OptionSet, live: &OptionSet, fields: &[HandlerField]) -> Self {
        let published = fields
            .iter()
            .filter(|field| live.contains(field.as_str()))
            .map(|field| {
                let value = entry
                    .get(field.as_str())
                    .and_then(ModuleOption::value)
                    .cloned();
                (*field, value)
            })
            .collect();
        Self { fields: published }
    }

    /// Returns `true` when the field survived pruning.
    #[must_use]
    pub fn contains(&self, field: HandlerField) -> bool {
        self.fields.contains_key(&field)
    }

    /// Value of a published field; `None` when absent or unset.
    #[must_use]
    pub fn get(&self, field: HandlerField) -> Option<&OptionValue> {
        self.fields.get(&field).and_then(Option::as_ref)
    }

    /// Host text of an address field.
    #[must_use]
    pub fn host(&self, field: HandlerField) -> Option<&str> {
        self.get(field).and_then(OptionValue::as_text)
    }

    /// Port number of a port field.
    #[must_use]
    pub fn port(&self, field: HandlerField) -> Option<u16> {
        self.get(field).and_then(OptionValue::as_port)
    }

    /// Published fields in order.
    pub fn iter(&self) -> impl Iterator<Item = (HandlerField, Option<&OptionValue>)> {
        self.fields.iter().map(|(field, value)| (*field, value.as_ref()))
    }

    /// Number of published fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` when nothing survived pruning.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Values seeded into freshly created templates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerDefaults {
    /// Default `LHOST`.
    pub listen_host: String,
    /// Default `CBHOST`.
    pub connect_back_host: String,
    /// Default for every port field.
    pub port: u16,
}

impl Default for HandlerDefaults {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for HandlerDefaults {
    fn from(config: &Config) -> Self {
        Self {
            listen_host: config.listen_host().to_owned(),
            connect_back_host: config.connect_back_host().to_owned(),
            port: config.handler_port(),
        }
    }
}

/// Process-scoped store of persisted handler options.
#[derive(Debug, Default)]
pub struct HandlerRegistry {
    defaults: HandlerDefaults,
    modules: HashMap<ModuleId, OptionSet>,
    payloads: HashMap<PayloadId, OptionSet>,
}

impl HandlerRegistry {
    /// Creates an empty registry seeding templates from `defaults`.
    #[must_use]
    pub fn new(defaults: HandlerDefaults) -> Self {
        Self {
            defaults,
            modules: HashMap::new(),
            payloads: HashMap::new(),
        }
    }

    /// Persisted module-side options for `id`.
    #[must_use]
    pub fn module_entry(&self, id: &ModuleId) -> Option<&OptionSet> {
        self.modules.get(id)
    }

    /// Persisted payload-side options for `id`.
    #[must_use]
    pub fn payload_entry(&self, id: &PayloadId) -> Option<&OptionSet> {
        self.payloads.get(id)
    }

    /// Recomputes the handler fields of `module` and its chosen payload.
    ///
    /// Modules without a payload binding are left untouched.
    pub fn synthesize(&mut self, module: &mut Module) {
        let Some(binding) = module.payload.as_ref() else {
            return;
        };
        let chosen = binding.value.clone();
        let blinder_disabled = binding.blinder == Some(false);
        let mut tolerated = binding.handler.clone();

        let entry = self
            .modules
            .entry(module.details.id.clone())
            .or_insert_with(|| templates::module_template(&self.defaults));
        merge_absent(&mut module.options, entry);

        let resolved = chosen
            .clone()
            .filter(|id| module.payloads.contains_key(id));
        if let Some(option) = module.options.get_mut(HandlerField::Payload.as_str()) {
            match chosen {
                Some(id) => option.commit(OptionValue::Payload(id)),
                None => option.clear(),
            }
        }
        if let Some(blinder) = module.options.get_mut(HandlerField::Blinder.as_str()) {
            if resolved.is_some() {
                blinder.commit(OptionValue::Bool(false));
                blinder.set_required(false);
            } else {
                if blinder.value().is_none() {
                    blinder.commit(OptionValue::Bool(true));
                }
                blinder.set_required(true);
            }
        }
        if blinder_disabled {
            module.options.remove(HandlerField::Blinder.as_str());
        }

        match &resolved {
            None => {
                let blinder_on = module
                    .options
                    .get(HandlerField::Blinder.as_str())
                    .is_some_and(ModuleOption::is_truthy);
                if let Some(option) = module.options.get_mut(HandlerField::Payload.as_str()) {
                    if blinder_on {
                        option.clear();
                        option.set_required(false);
                    } else {
                        option.set_required(true);
                    }
                }
                if blinder_on {
                    module.unbind_payload();
                }
                for field in [HandlerField::Lhost, HandlerField::Lport, HandlerField::Rbport] {
                    module.options.remove(field.as_str());
                }
            }
            Some(id) => {
                if let Some(option) = module.options.get_mut(HandlerField::Payload.as_str()) {
                    option.set_required(true);
                }
                if let Some(payload) = module.payloads.get_mut(id) {
                    let kind = payload.details().kind;
                    tolerated.extend(payload.details().handler.iter().copied());

                    let payload_entry = self
                        .payloads
                        .entry(id.clone())
                        .or_insert_with(|| templates::payload_template(&self.defaults));
                    merge_absent(payload.options_mut(), payload_entry);
                    prune(&mut module.options, payload.options_mut(), kind, &tolerated);
                    persist(payload_entry, payload.options(), &HandlerField::PAYLOAD);
                    payload.set_handler(HandlerMap::publish(
                        payload_entry,
                        payload.options(),
                        &HandlerField::PAYLOAD,
                    ));
                }
            }
        }

        persist(entry, &module.options, &HandlerField::MODULE);
        let published = HandlerMap::publish(entry, &module.options, &HandlerField::MODULE);
        debug!(
            target: HANDLER_TARGET,
            module = %module.details.id,
            payload = ?resolved.as_ref().map(PayloadId::as_str),
            fields = published.len(),
            "handler options synthesized"
        );
        module.handler = Some(published);
    }
}

fn merge_absent(live: &mut OptionSet, template: &OptionSet) {
    for (name, option) in template.iter() {
        if !live.contains(name) {
            live.insert(name, option.clone());
        }
    }
}

fn prune(
    module: &mut OptionSet,
    payload: &mut OptionSet,
    kind: ConnectionType,
    tolerated: &[ConnectionType],
) {
    let reverse =
        kind == ConnectionType::ReverseTcp || tolerated.contains(&ConnectionType::ReverseTcp);
    let bind = kind == ConnectionType::BindTcp || tolerated.contains(&ConnectionType::BindTcp);
    if !reverse {
        module.remove(HandlerField::Lhost.as_str());
        module.remove(HandlerField::Lport.as_str());
        payload.remove(HandlerField::Cbhost.as_str());
        payload.remove(HandlerField::Cbport.as_str());
    }
    if !bind {
        module.remove(HandlerField::Rbport.as_str());
        payload.remove(HandlerField::Bport.as_str());
    }
}

fn persist(entry: &mut OptionSet, live: &OptionSet, fields: &[HandlerField]) {
    for field in fields {
        let Some(current) = live.get(field.as_str()) else {
            continue;
        };
        match entry.get_mut(field.as_str()) {
            Some(stored) => stored.adopt_value(current),
            None => {
                entry.insert(field.as_str(), current.clone());
            }
        }
    }
}
