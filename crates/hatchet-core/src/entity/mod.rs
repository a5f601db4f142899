//! Modules, payloads, and encoders as the console sees them.
//!
//! Instances are produced by a [`Catalog`] and owned by the selection state
//! once chosen. The optional capabilities a module may carry (a payload
//! binding, its own command namespace, the published handler map) are plain
//! optional fields rather than probed attributes.

mod catalog;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use thiserror::Error;

use crate::command::CommandNamespace;
use crate::handler::HandlerMap;
use crate::ids::{EncoderId, ModuleId, PayloadId};
use crate::jobs::JobContext;
use crate::option::{ModuleOption, OptionSet, OptionValue};
use crate::report::Reporter;
use crate::sessions::SessionTable;

pub use self::catalog::{Catalog, CatalogEntry, CatalogError, EntityKind, InMemoryCatalog};

/// Connection direction declared by a payload.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionType {
    /// The target connects back to a local listener.
    ReverseTcp,
    /// The console connects to a port bound on the target.
    BindTcp,
    /// Fire-and-forget; no connection is established.
    OneSide,
}

/// Descriptive metadata for a module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleDetails {
    /// Catalog path, e.g. `exploit/linux/demo/login`.
    pub id: ModuleId,
    /// Display name.
    pub name: String,
    /// Top-level category, e.g. `exploit`.
    pub category: String,
    /// Platforms the module targets; `multi` matches any.
    pub platforms: Vec<String>,
    /// One-line description.
    pub description: String,
    /// Reliability rank.
    pub rank: String,
    /// Free-form metadata (authors, references, notes).
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl ModuleDetails {
    /// Creates details with the category taken from the first path segment.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        let module_id = ModuleId::new(id);
        let category = module_id
            .as_str()
            .split('/')
            .next()
            .unwrap_or_default()
            .to_owned();
        Self {
            id: module_id,
            name: name.into(),
            category,
            platforms: Vec::new(),
            description: String::new(),
            rank: String::from("normal"),
            extra: BTreeMap::new(),
        }
    }

    /// Adds a target platform.
    #[must_use]
    pub fn platform(mut self, platform: impl Into<String>) -> Self {
        self.platforms.push(platform.into());
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the rank.
    #[must_use]
    pub fn rank(mut self, rank: impl Into<String>) -> Self {
        self.rank = rank.into();
        self
    }

    /// Attaches a free-form metadata entry.
    #[must_use]
    pub fn extra(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}

/// How a module binds to payloads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PayloadBinding {
    /// Currently chosen payload.
    pub value: Option<PayloadId>,
    /// `Some(false)` disables the blinder listener for this module.
    pub blinder: Option<bool>,
    /// Connection types tolerated in addition to the payload's own.
    pub handler: Vec<ConnectionType>,
    /// Accepted payload platforms; `None` accepts any.
    pub platforms: Option<Vec<String>>,
    /// Accepted payload architectures; `None` accepts any.
    pub architectures: Option<Vec<String>>,
    /// Accepted payload connection types; `None` accepts any.
    pub types: Option<Vec<ConnectionType>>,
}

impl PayloadBinding {
    /// Binding with a default payload.
    pub fn with_default(payload: impl Into<String>) -> Self {
        Self {
            value: Some(PayloadId::new(payload)),
            ..Self::default()
        }
    }

    /// Returns `true` when the payload passes every declared filter.
    #[must_use]
    pub fn accepts(&self, payload: &PayloadDetails) -> bool {
        let platform_ok = self.platforms.as_ref().is_none_or(|platforms| {
            platforms
                .iter()
                .any(|platform| platform.eq_ignore_ascii_case(&payload.platform))
        });
        let architecture_ok = self.architectures.as_ref().is_none_or(|architectures| {
            architectures
                .iter()
                .any(|architecture| architecture.eq_ignore_ascii_case(&payload.architecture))
        });
        let type_ok = self
            .types
            .as_ref()
            .is_none_or(|types| types.contains(&payload.kind));
        platform_ok && architecture_ok && type_ok
    }
}

/// Descriptive metadata for a payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadDetails {
    /// Catalog path, e.g. `linux/x64/shell_reverse_tcp`.
    pub id: PayloadId,
    /// Display name.
    pub name: String,
    /// Target platform.
    pub platform: String,
    /// Target architecture.
    pub architecture: String,
    /// Connection direction.
    pub kind: ConnectionType,
    /// Connection types tolerated in addition to `kind`.
    pub handler: Vec<ConnectionType>,
    /// One-line description.
    pub description: String,
}

/// A payload instance owned by the module that selected it.
#[derive(Debug, Clone, PartialEq)]
pub struct Payload {
    details: PayloadDetails,
    options: OptionSet,
    encoder: Option<EncoderId>,
    handler: Option<HandlerMap>,
}

impl Payload {
    /// Creates a payload with no options of its own.
    #[must_use]
    pub fn new(details: PayloadDetails) -> Self {
        Self {
            details,
            options: OptionSet::new(),
            encoder: None,
            handler: None,
        }
    }

    /// Adds an option, builder style.
    #[must_use]
    pub fn with_option(mut self, name: &str, option: ModuleOption) -> Self {
        self.options.insert(name, option);
        self
    }

    /// Descriptive metadata.
    #[must_use]
    pub const fn details(&self) -> &PayloadDetails {
        &self.details
    }

    /// Catalog path.
    #[must_use]
    pub const fn id(&self) -> &PayloadId {
        &self.details.id
    }

    /// Payload options, including merged handler fields.
    #[must_use]
    pub const fn options(&self) -> &OptionSet {
        &self.options
    }

    /// Mutable payload options.
    pub const fn options_mut(&mut self) -> &mut OptionSet {
        &mut self.options
    }

    /// Bound encoder, if any.
    #[must_use]
    pub const fn encoder(&self) -> Option<&EncoderId> {
        self.encoder.as_ref()
    }

    /// Binds an encoder.
    pub fn set_encoder(&mut self, encoder: Option<EncoderId>) {
        self.encoder = encoder;
    }

    /// Handler fields published for connectors.
    #[must_use]
    pub const fn handler(&self) -> Option<&HandlerMap> {
        self.handler.as_ref()
    }

    pub(crate) fn set_handler(&mut self, handler: HandlerMap) {
        self.handler = Some(handler);
    }
}

/// An encoder that transforms payload bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Encoder {
    /// Catalog path, e.g. `x64/xor`.
    pub id: EncoderId,
    /// Display name.
    pub name: String,
    /// Architecture the encoder supports; `generic` fits any.
    pub architecture: String,
    /// One-line description.
    pub description: String,
}

/// Failure raised by a module's run entry point.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct ModuleFailure {
    message: String,
}

impl ModuleFailure {
    /// Wraps a human-readable failure message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Snapshot of everything a module's action may read while running.
///
/// Built under the selection lock and then released, so a long-running
/// action never holds console state.
#[derive(Clone)]
pub struct RunContext {
    /// Module metadata.
    pub details: ModuleDetails,
    /// Module options as of `run`.
    pub options: OptionSet,
    /// Published module handler map.
    pub handler: Option<HandlerMap>,
    /// Chosen payload, including its handler map.
    pub payload: Option<Payload>,
    /// Live session table for registering connections.
    pub sessions: SessionTable,
    /// Operator-facing output.
    pub reporter: Arc<dyn Reporter>,
    /// Stop flag when running as a background job.
    pub job: Option<JobContext>,
}

impl RunContext {
    /// Looks up a module option value, falling back to the payload's options.
    #[must_use]
    pub fn option(&self, name: &str) -> Option<&OptionValue> {
        self.options
            .get(name)
            .or_else(|| self.payload.as_ref().and_then(|payload| payload.options().get(name)))
            .and_then(ModuleOption::value)
    }

    /// Returns `true` when the enclosing job was asked to stop.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.job.as_ref().is_some_and(JobContext::is_stopped)
    }
}

impl fmt::Debug for RunContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunContext")
            .field("module", &self.details.id)
            .field("payload", &self.payload.as_ref().map(Payload::id))
            .field("job", &self.job)
            .finish_non_exhaustive()
    }
}

/// Entry point executed by `run`.
pub trait ModuleAction: Send + Sync {
    /// Executes the module.
    ///
    /// # Errors
    ///
    /// Returns [`ModuleFailure`] when the module cannot complete.
    fn run(&self, context: &RunContext) -> Result<(), ModuleFailure>;
}

impl<F> ModuleAction for F
where
    F: Fn(&RunContext) -> Result<(), ModuleFailure> + Send + Sync,
{
    fn run(&self, context: &RunContext) -> Result<(), ModuleFailure> {
        self(context)
    }
}

/// A loaded module.
#[derive(Clone)]
pub struct Module {
    pub(crate) details: ModuleDetails,
    pub(crate) options: OptionSet,
    pub(crate) payload: Option<PayloadBinding>,
    pub(crate) commands: Arc<CommandNamespace>,
    pub(crate) handler: Option<HandlerMap>,
    pub(crate) payloads: IndexMap<PayloadId, Payload>,
    action: Arc<dyn ModuleAction>,
}

impl Module {
    /// Creates a module with no options, binding, or commands.
    pub fn new(details: ModuleDetails, action: impl ModuleAction + 'static) -> Self {
        Self {
            details,
            options: OptionSet::new(),
            payload: None,
            commands: Arc::new(CommandNamespace::new()),
            handler: None,
            payloads: IndexMap::new(),
            action: Arc::new(action),
        }
    }

    /// Adds an option, builder style.
    #[must_use]
    pub fn with_option(mut self, name: &str, option: ModuleOption) -> Self {
        self.options.insert(name, option);
        self
    }

    /// Declares how the module binds payloads.
    #[must_use]
    pub fn with_payload_binding(mut self, binding: PayloadBinding) -> Self {
        self.payload = Some(binding);
        self
    }

    /// Attaches module-specific commands.
    #[must_use]
    pub fn with_commands(mut self, commands: CommandNamespace) -> Self {
        self.commands = Arc::new(commands);
        self
    }

    /// Descriptive metadata.
    #[must_use]
    pub const fn details(&self) -> &ModuleDetails {
        &self.details
    }

    /// Catalog path.
    #[must_use]
    pub const fn id(&self) -> &ModuleId {
        &self.details.id
    }

    /// Module options, including merged handler fields.
    #[must_use]
    pub const fn options(&self) -> &OptionSet {
        &self.options
    }

    /// Mutable module options.
    pub const fn options_mut(&mut self) -> &mut OptionSet {
        &mut self.options
    }

    /// Payload binding, if the module accepts payloads.
    #[must_use]
    pub const fn payload_binding(&self) -> Option<&PayloadBinding> {
        self.payload.as_ref()
    }

    /// Module-specific command namespace (possibly empty).
    #[must_use]
    pub fn commands(&self) -> Arc<CommandNamespace> {
        Arc::clone(&self.commands)
    }

    /// Handler fields published for listeners.
    #[must_use]
    pub const fn handler(&self) -> Option<&HandlerMap> {
        self.handler.as_ref()
    }

    /// The chosen payload, when it has been resolved and instantiated.
    #[must_use]
    pub fn current_payload(&self) -> Option<&Payload> {
        let id = self.payload.as_ref()?.value.as_ref()?;
        self.payloads.get(id)
    }

    /// Mutable access to the chosen payload.
    pub fn current_payload_mut(&mut self) -> Option<&mut Payload> {
        let id = self.payload.as_ref()?.value.as_ref()?;
        self.payloads.get_mut(id)
    }

    /// Caches a payload instance and makes it the chosen one.
    pub(crate) fn bind_payload(&mut self, payload: Option<Payload>, id: PayloadId) {
        if let Some(instance) = payload {
            self.payloads.entry(id.clone()).or_insert(instance);
        }
        self.payload.get_or_insert_with(PayloadBinding::default).value = Some(id);
    }

    /// Clears the chosen payload without dropping cached instances.
    pub(crate) fn unbind_payload(&mut self) {
        if let Some(binding) = self.payload.as_mut() {
            binding.value = None;
        }
    }

    /// Names of required module and payload options that hold no value.
    #[must_use]
    pub fn missing_required(&self) -> Vec<String> {
        let module = self.options.missing_required().into_iter();
        let payload = self
            .current_payload()
            .map(|payload| payload.options().missing_required())
            .unwrap_or_default();
        module.chain(payload).map(str::to_owned).collect()
    }

    /// The run entry point.
    #[must_use]
    pub fn action(&self) -> Arc<dyn ModuleAction> {
        Arc::clone(&self.action)
    }
}

impl fmt::Debug for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Module")
            .field("details", &self.details)
            .field("options", &self.options)
            .field("payload", &self.payload)
            .field("commands", &self.commands.len())
            .field("handler", &self.handler)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests;
