//! Catalog seam through which the console discovers loadable entities.
//!
//! The on-disk loader is an external collaborator; the console only needs
//! fresh instances, listings, shorthand resolution, and the two
//! compatibility checks. [`InMemoryCatalog`] is the in-process
//! implementation used by the binary and by tests.

use std::collections::HashMap;

use indexmap::IndexMap;
use strum::{Display, EnumString};
use thiserror::Error;

use super::{Encoder, Module, Payload};
use crate::ids::{EncoderId, ModuleId, PayloadId};
use crate::plugin::Plugin;

/// The kinds of entity a catalog lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum EntityKind {
    /// Attack or scan units.
    Module,
    /// Delivery primitives.
    Payload,
    /// Payload transformers.
    Encoder,
    /// Command bundles.
    Plugin,
}

/// One row of a catalog listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    /// Catalog path or plugin name.
    pub id: String,
    /// Display name.
    pub name: String,
    /// One-line description.
    pub description: String,
}

/// Registration failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CatalogError {
    /// An entity with the same id is already registered.
    #[error("{kind} '{id}' is already registered")]
    Duplicate {
        /// Kind of the rejected entity.
        kind: EntityKind,
        /// Conflicting id.
        id: String,
    },
}

/// Source of modules, payloads, encoders, and plugins.
pub trait Catalog: Send + Sync {
    /// Listing of the given kind, in a stable order.
    fn entries(&self, kind: EntityKind) -> Vec<CatalogEntry>;

    /// A fresh instance of the module.
    fn module(&self, id: &ModuleId) -> Option<Module>;

    /// A fresh instance of the payload.
    fn payload(&self, id: &PayloadId) -> Option<Payload>;

    /// The encoder's description.
    fn encoder(&self, id: &EncoderId) -> Option<Encoder>;

    /// A fresh copy of the plugin.
    fn plugin(&self, name: &str) -> Option<Plugin>;

    /// Expands a shorthand into a full id.
    ///
    /// A decimal shorthand indexes the listing of `kind`; anything else is
    /// returned unchanged.
    fn find_shorthand(&self, kind: EntityKind, name: &str) -> String {
        name.parse::<usize>()
            .ok()
            .and_then(|index| self.entries(kind).into_iter().nth(index))
            .map_or_else(|| name.to_owned(), |entry| entry.id)
    }

    /// Returns `true` when the payload exists and passes the module's
    /// binding filters.
    fn check_payload_compatible(&self, payload: &PayloadId, module: &Module) -> bool {
        let Some(binding) = module.payload_binding() else {
            return false;
        };
        self.payload(payload)
            .is_some_and(|instance| binding.accepts(instance.details()))
    }

    /// Returns `true` when the encoder exists and fits the payload's
    /// architecture.
    fn check_encoder_compatible(&self, encoder: &EncoderId, payload: &Payload) -> bool {
        self.encoder(encoder).is_some_and(|instance| {
            instance.architecture == "generic"
                || instance
                    .architecture
                    .eq_ignore_ascii_case(&payload.details().architecture)
        })
    }
}

/// Catalog backed by prototypes held in memory.
#[derive(Default)]
pub struct InMemoryCatalog {
    modules: IndexMap<ModuleId, Module>,
    payloads: IndexMap<PayloadId, Payload>,
    encoders: IndexMap<EncoderId, Encoder>,
    plugins: IndexMap<String, Plugin>,
    aliases: HashMap<(EntityKind, String), String>,
}

impl InMemoryCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a module prototype.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Duplicate`] when the id is taken.
    pub fn add_module(&mut self, module: Module) -> Result<(), CatalogError> {
        let id = module.id().clone();
        if self.modules.contains_key(&id) {
            return Err(duplicate(EntityKind::Module, id.as_str()));
        }
        self.modules.insert(id, module);
        Ok(())
    }

    /// Registers a payload prototype.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Duplicate`] when the id is taken.
    pub fn add_payload(&mut self, payload: Payload) -> Result<(), CatalogError> {
        let id = payload.id().clone();
        if self.payloads.contains_key(&id) {
            return Err(duplicate(EntityKind::Payload, id.as_str()));
        }
        self.payloads.insert(id, payload);
        Ok(())
    }

    /// Registers an encoder.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Duplicate`] when the id is taken.
    pub fn add_encoder(&mut self, encoder: Encoder) -> Result<(), CatalogError> {
        if self.encoders.contains_key(&encoder.id) {
            return Err(duplicate(EntityKind::Encoder, encoder.id.as_str()));
        }
        self.encoders.insert(encoder.id.clone(), encoder);
        Ok(())
    }

    /// Registers a plugin.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Duplicate`] when the name is taken.
    pub fn add_plugin(&mut self, plugin: Plugin) -> Result<(), CatalogError> {
        let name = plugin.name().to_owned();
        if self.plugins.contains_key(&name) {
            return Err(duplicate(EntityKind::Plugin, &name));
        }
        self.plugins.insert(name, plugin);
        Ok(())
    }

    /// Registers a named shorthand for an id.
    pub fn add_alias(&mut self, kind: EntityKind, alias: &str, id: &str) {
        self.aliases.insert((kind, alias.to_owned()), id.to_owned());
    }
}

fn duplicate(kind: EntityKind, id: &str) -> CatalogError {
    CatalogError::Duplicate {
        kind,
        id: id.to_owned(),
    }
}

impl Catalog for InMemoryCatalog {
    fn entries(&self, kind: EntityKind) -> Vec<CatalogEntry> {
        match kind {
            EntityKind::Module => self
                .modules
                .values()
                .map(|module| CatalogEntry {
                    id: module.id().to_string(),
                    name: module.details().name.clone(),
                    description: module.details().description.clone(),
                })
                .collect(),
            EntityKind::Payload => self
                .payloads
                .values()
                .map(|payload| CatalogEntry {
                    id: payload.id().to_string(),
                    name: payload.details().name.clone(),
                    description: payload.details().description.clone(),
                })
                .collect(),
            EntityKind::Encoder => self
                .encoders
                .values()
                .map(|encoder| CatalogEntry {
                    id: encoder.id.to_string(),
                    name: encoder.name.clone(),
                    description: encoder.description.clone(),
                })
                .collect(),
            EntityKind::Plugin => self
                .plugins
                .values()
                .map(|plugin| CatalogEntry {
                    id: plugin.name().to_owned(),
                    name: plugin.name().to_owned(),
                    description: plugin.description().to_owned(),
                })
                .collect(),
        }
    }

    fn module(&self, id: &ModuleId) -> Option<Module> {
        self.modules.get(id).cloned()
    }

    fn payload(&self, id: &PayloadId) -> Option<Payload> {
        self.payloads.get(id).cloned()
    }

    fn encoder(&self, id: &EncoderId) -> Option<Encoder> {
        self.encoders.get(id).cloned()
    }

    fn plugin(&self, name: &str) -> Option<Plugin> {
        self.plugins.get(name).cloned()
    }

    fn find_shorthand(&self, kind: EntityKind, name: &str) -> String {
        if let Some(id) = self.aliases.get(&(kind, name.to_owned())) {
            return id.clone();
        }
        name.parse::<usize>()
            .ok()
            .and_then(|index| self.entries(kind).into_iter().nth(index))
            .map_or_else(|| name.to_owned(), |entry| entry.id)
    }
}
