//! The current-module selection and option assignment.

use indexmap::IndexMap;

use crate::entity::{Catalog, EntityKind, Module};
use crate::handler::HandlerField;
use crate::ids::{EncoderId, ModuleId, PayloadId, SessionId};
use crate::option::{OptionError, OptionKind, OptionResolver, OptionValue, SessionFilter};
use crate::sessions::SessionTable;

/// Loaded module instances and which one is current.
///
/// Instances are kept across re-selection, so options set on a module are
/// still there when the operator comes back to it.
#[derive(Debug, Default)]
pub struct Selection {
    modules: IndexMap<ModuleId, Module>,
    current: Option<ModuleId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Owner {
    Module,
    Payload,
}

impl Selection {
    /// Creates an empty selection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `id` current, instantiating it from `catalog` on first use.
    ///
    /// A fresh instance binds its declared default payload when the catalog
    /// reports it compatible; otherwise the default is dropped. Returns
    /// `false` when the catalog has no such module.
    pub fn select(&mut self, id: &ModuleId, catalog: &dyn Catalog) -> bool {
        if !self.modules.contains_key(id) {
            let Some(mut module) = catalog.module(id) else {
                return false;
            };
            let default = module
                .payload_binding()
                .and_then(|binding| binding.value.clone());
            if let Some(payload) = default {
                if catalog.check_payload_compatible(&payload, &module) {
                    let instance = catalog.payload(&payload);
                    module.bind_payload(instance, payload);
                } else {
                    module.unbind_payload();
                }
            }
            self.modules.insert(id.clone(), module);
        }
        self.current = Some(id.clone());
        true
    }

    /// Clears the current module; loaded instances are kept.
    pub fn deselect(&mut self) {
        self.current = None;
    }

    /// The current module.
    #[must_use]
    pub fn current(&self) -> Option<&Module> {
        self.modules.get(self.current.as_ref()?)
    }

    /// Mutable access to the current module.
    pub fn current_mut(&mut self) -> Option<&mut Module> {
        self.modules.get_mut(self.current.as_ref()?)
    }

    /// Number of loaded module instances.
    #[must_use]
    pub fn loaded(&self) -> usize {
        self.modules.len()
    }

    /// Validates `raw` and assigns it to the named option.
    ///
    /// The option is looked up on the current module first and then on its
    /// chosen payload. Nothing changes unless validation succeeds; then the
    /// value is committed and payload or encoder references are bound.
    ///
    /// # Errors
    ///
    /// Returns [`OptionError::NoModuleSelected`], [`OptionError::UnknownOption`],
    /// or the validation failure from the option itself.
    pub fn set_option(
        &mut self,
        name: &str,
        raw: &str,
        catalog: &dyn Catalog,
        sessions: &SessionTable,
    ) -> Result<(), OptionError> {
        let id = self.current.clone().ok_or(OptionError::NoModuleSelected)?;
        let module = self.modules.get(&id).ok_or(OptionError::NoModuleSelected)?;
        let owner = owner_of(module, name)?;
        let option = match owner {
            Owner::Module => module.options().get(name),
            Owner::Payload => module
                .current_payload()
                .and_then(|payload| payload.options().get(name)),
        }
        .ok_or_else(|| OptionError::unknown(name))?;

        let resolver = LiveResolver {
            catalog,
            module,
            sessions,
        };
        let value = option.parse(raw, &resolver)?;
        let instance = match &value {
            OptionValue::Payload(payload) if !module.payloads.contains_key(payload) => Some(
                catalog
                    .payload(payload)
                    .ok_or(OptionError::compatibility("payload"))?,
            ),
            _ => None,
        };

        let target = self
            .modules
            .get_mut(&id)
            .ok_or(OptionError::NoModuleSelected)?;
        let slot = match owner {
            Owner::Module => target.options_mut().get_mut(name),
            Owner::Payload => target
                .current_payload_mut()
                .and_then(|payload| payload.options_mut().get_mut(name)),
        };
        if let Some(stored) = slot {
            stored.commit(value.clone());
        }
        match value {
            OptionValue::Payload(payload) => target.bind_payload(instance, payload),
            OptionValue::Encoder(encoder) => {
                if let Some(payload) = target.current_payload_mut() {
                    payload.set_encoder(Some(encoder));
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Clears the named option.
    ///
    /// Clearing `PAYLOAD` also drops the chosen payload and resets the
    /// blinder to its default.
    ///
    /// # Errors
    ///
    /// Returns [`OptionError::Required`] for other required options, plus
    /// the lookup errors of [`Selection::set_option`].
    pub fn unset_option(&mut self, name: &str) -> Result<(), OptionError> {
        let module = self.current_mut().ok_or(OptionError::NoModuleSelected)?;
        let owner = owner_of(module, name)?;
        let kind = match owner {
            Owner::Module => module.options().get(name),
            Owner::Payload => module
                .current_payload()
                .and_then(|payload| payload.options().get(name)),
        }
        .map(|option| (option.kind(), option.is_required()))
        .ok_or_else(|| OptionError::unknown(name))?;

        match kind {
            (OptionKind::Payload, _) => {
                module.unbind_payload();
                for field in [HandlerField::Payload, HandlerField::Blinder] {
                    if let Some(option) = module.options_mut().get_mut(field.as_str()) {
                        option.clear();
                    }
                }
                return Ok(());
            }
            (_, true) => {
                return Err(OptionError::Required {
                    name: name.to_ascii_uppercase(),
                });
            }
            (OptionKind::Encoder, false) => {
                if let Some(payload) = module.current_payload_mut() {
                    payload.set_encoder(None);
                }
            }
            _ => {}
        }
        let slot = match owner {
            Owner::Module => module.options_mut().get_mut(name),
            Owner::Payload => module
                .current_payload_mut()
                .and_then(|payload| payload.options_mut().get_mut(name)),
        };
        if let Some(option) = slot {
            option.clear();
        }
        Ok(())
    }
}

fn owner_of(module: &Module, name: &str) -> Result<Owner, OptionError> {
    if module.options().contains(name) {
        return Ok(Owner::Module);
    }
    if module
        .current_payload()
        .is_some_and(|payload| payload.options().contains(name))
    {
        return Ok(Owner::Payload);
    }
    Err(OptionError::unknown(name))
}

/// Resolves reference options against the catalog and the live sessions.
struct LiveResolver<'a> {
    catalog: &'a dyn Catalog,
    module: &'a Module,
    sessions: &'a SessionTable,
}

impl OptionResolver for LiveResolver<'_> {
    fn resolve_payload(&self, raw: &str) -> Option<PayloadId> {
        let id = PayloadId::new(self.catalog.find_shorthand(EntityKind::Payload, raw));
        self.catalog
            .check_payload_compatible(&id, self.module)
            .then_some(id)
    }

    fn resolve_encoder(&self, raw: &str) -> Option<EncoderId> {
        let payload = self.module.current_payload()?;
        let id = EncoderId::new(self.catalog.find_shorthand(EntityKind::Encoder, raw));
        self.catalog
            .check_encoder_compatible(&id, payload)
            .then_some(id)
    }

    fn session_exists(&self, id: SessionId, filter: &SessionFilter) -> bool {
        let platforms = if filter.platforms.is_empty() {
            &self.module.details().platforms
        } else {
            &filter.platforms
        };
        let session_type = filter.session_type.as_deref();
        if platforms.is_empty() {
            return self.sessions.check_exist(id, "multi", session_type);
        }
        platforms
            .iter()
            .any(|platform| self.sessions.check_exist(id, platform.trim(), session_type))
    }
}

#[cfg(test)]
mod tests {
    use rstest::{fixture, rstest};

    use super::*;
    use crate::entity::InMemoryCatalog;
    use crate::handler::HandlerRegistry;
    use crate::tests::support::{
        BIND_PAYLOAD, DEMO_MODULE, REVERSE_PAYLOAD, SCANNER_MODULE, demo_catalog,
    };

    type Selected = (Selection, InMemoryCatalog);

    #[fixture]
    fn selected() -> Selected {
        let catalog = demo_catalog();
        let mut selection = Selection::new();
        assert!(selection.select(&ModuleId::from(DEMO_MODULE), &catalog));
        if let Some(module) = selection.current_mut() {
            HandlerRegistry::default().synthesize(module);
        }
        (selection, catalog)
    }

    #[test]
    fn unknown_modules_are_not_selected() {
        let mut selection = Selection::new();
        assert!(!selection.select(&ModuleId::from("exploit/none"), &demo_catalog()));
        assert!(selection.current().is_none());
    }

    #[rstest]
    fn setting_a_payload_binds_and_caches_it(selected: Selected) {
        let (mut selection, catalog) = selected;
        let sessions = SessionTable::new();
        selection
            .set_option("payload", REVERSE_PAYLOAD, &catalog, &sessions)
            .expect("compatible payload");

        let module = selection.current().expect("module selected");
        assert_eq!(
            module.current_payload().map(|payload| payload.id().as_str()),
            Some(REVERSE_PAYLOAD)
        );
        assert_eq!(
            module.options().get("PAYLOAD").and_then(|option| option.value()),
            Some(&OptionValue::Payload(PayloadId::from(REVERSE_PAYLOAD)))
        );
    }

    #[rstest]
    fn incompatible_payload_changes_nothing(selected: Selected) {
        let (mut selection, catalog) = selected;
        let sessions = SessionTable::new();
        let before = selection.current().map(|module| module.options().clone());

        let error = selection
            .set_option("PAYLOAD", "windows/x86/shell_reverse_tcp", &catalog, &sessions)
            .expect_err("incompatible");

        assert_eq!(error.to_string(), "Invalid option value, expected valid payload!");
        assert_eq!(selection.current().map(|module| module.options().clone()), before);
        assert!(selection.current().and_then(Module::current_payload).is_none());
    }

    #[rstest]
    fn payload_options_are_reachable_once_bound(selected: Selected) {
        let (mut selection, catalog) = selected;
        let sessions = SessionTable::new();
        selection
            .set_option("PAYLOAD", BIND_PAYLOAD, &catalog, &sessions)
            .expect("compatible payload");
        selection
            .set_option("timeout", "30", &catalog, &sessions)
            .expect("payload option");

        let payload = selection
            .current()
            .and_then(Module::current_payload)
            .expect("payload bound");
        assert_eq!(
            payload.options().get("TIMEOUT").and_then(|option| option.value()),
            Some(&OptionValue::Integer(30))
        );
    }

    #[rstest]
    fn session_options_filter_by_module_platform(selected: Selected) {
        let (mut selection, catalog) = selected;
        let sessions = SessionTable::new();
        let (windows, _) = sessions.open("windows", "shell", "10.0.0.9", 4444);
        let (linux, _) = sessions.open("linux", "shell", "10.0.0.8", 4444);

        let rejected =
            selection.set_option("session", &windows.to_string(), &catalog, &sessions);
        assert!(matches!(
            rejected,
            Err(OptionError::Compatibility { kind: "session" })
        ));

        selection
            .set_option("session", &linux.to_string(), &catalog, &sessions)
            .expect("linux session accepted");
    }

    #[rstest]
    fn encoders_bind_to_the_chosen_payload(selected: Selected) {
        let (mut selection, catalog) = selected;
        let sessions = SessionTable::new();
        let bound_encoder = |selection: &Selection| {
            selection
                .current()
                .and_then(Module::current_payload)
                .and_then(|payload| payload.encoder().cloned())
        };

        let without_payload = selection.set_option("ENCODER", "x64/xor", &catalog, &sessions);
        assert!(matches!(
            without_payload,
            Err(OptionError::Compatibility { kind: "encoder" })
        ));

        selection
            .set_option("PAYLOAD", REVERSE_PAYLOAD, &catalog, &sessions)
            .expect("compatible payload");
        let before = selection.current().map(|module| module.options().clone());
        let rejected = selection.set_option("ENCODER", "x86/shikata", &catalog, &sessions);
        assert!(matches!(
            rejected,
            Err(OptionError::Compatibility { kind: "encoder" })
        ));
        assert_eq!(selection.current().map(|module| module.options().clone()), before);
        assert_eq!(bound_encoder(&selection), None);

        selection
            .set_option("encoder", "x64/xor", &catalog, &sessions)
            .expect("compatible encoder");
        assert_eq!(bound_encoder(&selection), Some(EncoderId::from("x64/xor")));
        assert_eq!(
            selection
                .current()
                .and_then(|module| module.options().get("ENCODER"))
                .and_then(|option| option.value()),
            Some(&OptionValue::Encoder(EncoderId::from("x64/xor")))
        );

        selection.unset_option("ENCODER").expect("optional encoder");
        assert_eq!(bound_encoder(&selection), None);
        assert!(
            selection
                .current()
                .and_then(|module| module.options().get("ENCODER"))
                .and_then(|option| option.value())
                .is_none()
        );
    }

    #[rstest]
    fn unknown_option_is_reported(selected: Selected) {
        let (mut selection, catalog) = selected;
        let error = selection
            .set_option("NOPE", "1", &catalog, &SessionTable::new())
            .expect_err("unknown");
        assert_eq!(error, OptionError::unknown("NOPE"));
    }

    #[test]
    fn setting_without_module_fails() {
        let mut selection = Selection::new();
        let error = selection
            .set_option("RHOST", "127.0.0.1", &demo_catalog(), &SessionTable::new())
            .expect_err("no module");
        assert_eq!(error, OptionError::NoModuleSelected);
    }

    #[rstest]
    fn required_options_cannot_be_unset(selected: Selected) {
        let (mut selection, _) = selected;
        let error = selection.unset_option("rhost").expect_err("required");
        assert_eq!(error, OptionError::Required { name: String::from("RHOST") });
        selection.unset_option("VERBOSE").expect("optional");
    }

    #[rstest]
    fn unsetting_payload_drops_the_binding(selected: Selected) {
        let (mut selection, catalog) = selected;
        let sessions = SessionTable::new();
        selection
            .set_option("PAYLOAD", REVERSE_PAYLOAD, &catalog, &sessions)
            .expect("compatible payload");
        selection.unset_option("PAYLOAD").expect("payload unset");
        assert!(selection.current().and_then(Module::current_payload).is_none());
    }

    #[test]
    fn default_payload_is_bound_on_first_selection() {
        let catalog = demo_catalog();
        let mut selection = Selection::new();
        assert!(selection.select(&ModuleId::from(SCANNER_MODULE), &catalog));
        let module = selection.current().expect("selected");
        assert_eq!(
            module.current_payload().map(|payload| payload.id().as_str()),
            Some(REVERSE_PAYLOAD)
        );
    }

    #[test]
    fn instances_survive_reselection() {
        let catalog = demo_catalog();
        let sessions = SessionTable::new();
        let mut selection = Selection::new();
        let demo = ModuleId::from(DEMO_MODULE);
        assert!(selection.select(&demo, &catalog));
        selection
            .set_option("RHOST", "10.1.1.1", &catalog, &sessions)
            .expect("valid host");
        selection.deselect();
        assert!(selection.current().is_none());

        assert!(selection.select(&demo, &catalog));
        assert_eq!(
            selection
                .current()
                .and_then(|module| module.options().get("RHOST"))
                .map(|option| option.display_value()),
            Some(String::from("10.1.1.1"))
        );
        assert_eq!(selection.loaded(), 1);
    }
}
