//! Plugins: named bundles of labelled command groups.
//!
//! Loaded plugins live in a [`PluginSet`] kept in registration order. The
//! shell replaces the whole set on load and unload, and the dispatcher
//! searches it after the core and module namespaces.

use indexmap::IndexMap;
use thiserror::Error;

use crate::command::{Command, CommandNamespace};

/// Plugin set failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PluginError {
    /// A plugin with the same name is already loaded.
    #[error("Plugin already loaded: {name}!")]
    AlreadyLoaded {
        /// Plugin name.
        name: String,
    },

    /// No loaded plugin has this name.
    #[error("Plugin not loaded: {name}!")]
    NotLoaded {
        /// Plugin name.
        name: String,
    },
}

/// A plugin and its command groups.
#[derive(Debug, Clone)]
pub struct Plugin {
    name: String,
    description: String,
    commands: IndexMap<String, CommandNamespace>,
}

impl Plugin {
    /// Creates a plugin with no commands.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            commands: IndexMap::new(),
        }
    }

    /// Adds a labelled command group, builder style.
    #[must_use]
    pub fn with_group(mut self, label: &str, commands: CommandNamespace) -> Self {
        self.commands.insert(label.to_owned(), commands);
        self
    }

    /// Plugin name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// One-line description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Command groups in declaration order.
    pub fn groups(&self) -> impl Iterator<Item = (&str, &CommandNamespace)> {
        self.commands
            .iter()
            .map(|(label, namespace)| (label.as_str(), namespace))
    }
}

/// Loaded plugins in registration order.
#[derive(Debug, Clone, Default)]
pub struct PluginSet {
    plugins: IndexMap<String, Plugin>,
}

impl PluginSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a plugin.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::AlreadyLoaded`] for duplicate names.
    pub fn register(&mut self, plugin: Plugin) -> Result<(), PluginError> {
        if self.plugins.contains_key(plugin.name()) {
            return Err(PluginError::AlreadyLoaded {
                name: plugin.name().to_owned(),
            });
        }
        self.plugins.insert(plugin.name().to_owned(), plugin);
        Ok(())
    }

    /// Removes a plugin, keeping the order of the rest.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::NotLoaded`] for unknown names.
    pub fn remove(&mut self, name: &str) -> Result<Plugin, PluginError> {
        self.plugins
            .shift_remove(name)
            .ok_or_else(|| PluginError::NotLoaded {
                name: name.to_owned(),
            })
    }

    /// Looks up a plugin by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Plugin> {
        self.plugins.get(name)
    }

    /// Finds a command in plugin order, then group order.
    #[must_use]
    pub fn find_command(&self, name: &str) -> Option<&Command> {
        self.plugins
            .values()
            .flat_map(Plugin::groups)
            .find_map(|(_, namespace)| namespace.get(name))
    }

    /// Plugins in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Plugin> {
        self.plugins.values()
    }

    /// Number of loaded plugins.
    #[must_use]
    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    /// Returns `true` when no plugins are loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use rstest::{fixture, rstest};

    use super::*;
    use crate::command::CommandDetails;

    fn command(owner: &str, category: &str, name: &str) -> Command {
        Command::new(
            CommandDetails::new(category, name, format!("{owner}:{name}"), name),
            |_, _| Ok(()),
        )
    }

    fn plugin(name: &str, groups: Vec<(&str, Vec<&str>)>) -> Plugin {
        groups
            .into_iter()
            .fold(Plugin::new(name, "test plugin"), |plugin, (label, names)| {
                let namespace = names
                    .iter()
                    .fold(CommandNamespace::new(), |namespace, command_name| {
                        namespace.with(command(name, label, command_name))
                    });
                plugin.with_group(label, namespace)
            })
    }

    #[fixture]
    fn set() -> PluginSet {
        let mut set = PluginSet::new();
        set.register(plugin(
            "alpha",
            vec![("scan", vec!["ping"]), ("net", vec!["sniff", "ping"])],
        ))
            .expect("register alpha");
        set.register(plugin("beta", vec![("net", vec!["sniff", "trace"])]))
            .expect("register beta");
        set
    }

    #[rstest]
    fn duplicate_names_are_rejected(mut set: PluginSet) {
        let error = set
            .register(plugin("alpha", Vec::new()))
            .expect_err("duplicate rejected");
        assert_eq!(error.to_string(), "Plugin already loaded: alpha!");
        assert_eq!(set.len(), 2);
    }

    #[rstest]
    #[case::first_group_wins("ping", "scan")]
    #[case::first_plugin_wins("sniff", "net")]
    #[case::later_plugin("trace", "net")]
    fn finds_commands_in_registration_order(
        set: PluginSet,
        #[case] name: &str,
        #[case] category: &str,
    ) {
        let found = set.find_command(name).expect("command found");
        assert_eq!(found.details().category, category);
    }

    #[rstest]
    fn first_plugin_shadows_later_ones(mut set: PluginSet) {
        let sniff = set.find_command("sniff").expect("sniff found");
        assert_eq!(sniff.details().description, "alpha:sniff");

        set.remove("alpha").expect("alpha loaded");
        assert!(set.find_command("ping").is_none());
        let sniff = set.find_command("sniff").expect("beta still loaded");
        assert_eq!(sniff.details().description, "beta:sniff");
    }

    #[rstest]
    fn removing_unknown_plugin_fails(mut set: PluginSet) {
        assert!(matches!(set.remove("gamma"), Err(PluginError::NotLoaded { .. })));
    }
}
