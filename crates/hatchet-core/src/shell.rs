//! Process-scoped console state.
//!
//! A [`Shell`] owns everything a command may touch: the catalog, the
//! selection, the handler registry, the job and session tables, and the
//! command namespaces. It is shared as `Arc<Shell>` between the foreground
//! loop and background jobs.
//!
//! Namespaces are read far more often than they change, so the core
//! namespace and the plugin set sit behind [`ArcSwap`]: readers take a
//! snapshot without locking and writers publish a whole new value. The
//! selection and the handler registry are behind mutexes; when both are
//! needed the selection is locked first.

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use arc_swap::ArcSwap;
use hatchet_config::Config;
use parking_lot::{Mutex, MutexGuard};
use tracing::debug;

use crate::command::CommandNamespace;
use crate::commands;
use crate::console::{LineSource, ReadLine};
use crate::dispatch::{self, DispatchError, Dispatched};
use crate::entity::Catalog;
use crate::handler::{HandlerDefaults, HandlerRegistry};
use crate::jobs::JobTable;
use crate::plugin::{Plugin, PluginError, PluginSet};
use crate::report::{Reporter, SharedWriter, TerminalReporter};
use crate::selection::Selection;
use crate::sessions::SessionTable;
use crate::system::{ProcessRunner, SystemRunner};

const CONSOLE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::console");

/// Builder for [`Shell`].
pub struct ShellBuilder {
    catalog: Arc<dyn Catalog>,
    reporter: Option<Arc<dyn Reporter>>,
    system: Option<Arc<dyn SystemRunner>>,
    core: Option<CommandNamespace>,
    input: Option<Box<dyn LineSource>>,
    prompt: String,
    defaults: HandlerDefaults,
}

impl ShellBuilder {
    /// Starts a builder over `catalog` with built-in defaults.
    #[must_use]
    pub fn new(catalog: Arc<dyn Catalog>) -> Self {
        let config = Config::default();
        Self {
            catalog,
            reporter: None,
            system: None,
            core: None,
            input: None,
            prompt: config.prompt().to_owned(),
            defaults: HandlerDefaults::from(&config),
        }
    }

    /// Takes the prompt label and handler defaults from `config`.
    #[must_use]
    pub fn config(mut self, config: &Config) -> Self {
        config.prompt().clone_into(&mut self.prompt);
        self.defaults = HandlerDefaults::from(config);
        self
    }

    /// Sends operator output to `reporter` instead of standard output.
    #[must_use]
    pub fn reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.reporter = Some(reporter);
        self
    }

    /// Runs `!` commands through `system`.
    #[must_use]
    pub fn system_runner(mut self, system: Arc<dyn SystemRunner>) -> Self {
        self.system = Some(system);
        self
    }

    /// Replaces the built-in core namespace.
    #[must_use]
    pub fn core_commands(mut self, core: CommandNamespace) -> Self {
        self.core = Some(core);
        self
    }

    /// Reads confirmations and interactive lines from `input`.
    #[must_use]
    pub fn input(mut self, input: Box<dyn LineSource>) -> Self {
        self.input = Some(input);
        self
    }

    /// Builds the shared shell.
    #[must_use]
    pub fn build(self) -> Arc<Shell> {
        let reporter = self.reporter.unwrap_or_else(|| {
            Arc::new(TerminalReporter::new(SharedWriter::new(io::stdout())))
        });
        let core = self.core.unwrap_or_else(commands::core_namespace);
        Arc::new(Shell {
            prompt: self.prompt,
            catalog: self.catalog,
            reporter,
            system: self.system.unwrap_or_else(|| Arc::new(ProcessRunner)),
            core: ArcSwap::from_pointee(core),
            plugins: ArcSwap::from_pointee(PluginSet::new()),
            selection: Mutex::new(Selection::new()),
            handlers: Mutex::new(HandlerRegistry::new(self.defaults)),
            jobs: JobTable::new(),
            sessions: SessionTable::new(),
            input: Mutex::new(self.input),
            exit_requested: AtomicBool::new(false),
        })
    }
}

/// Shared console state.
pub struct Shell {
    prompt: String,
    catalog: Arc<dyn Catalog>,
    reporter: Arc<dyn Reporter>,
    system: Arc<dyn SystemRunner>,
    core: ArcSwap<CommandNamespace>,
    plugins: ArcSwap<PluginSet>,
    selection: Mutex<Selection>,
    handlers: Mutex<HandlerRegistry>,
    jobs: JobTable,
    sessions: SessionTable,
    input: Mutex<Option<Box<dyn LineSource>>>,
    exit_requested: AtomicBool,
}

impl Shell {
    /// Starts a [`ShellBuilder`].
    #[must_use]
    pub fn builder(catalog: Arc<dyn Catalog>) -> ShellBuilder {
        ShellBuilder::new(catalog)
    }

    /// Prompt for the next line, naming the current module if any.
    #[must_use]
    pub fn prompt(&self) -> String {
        match self.selection.lock().current() {
            Some(module) => format!(
                "({}: {}: {})> ",
                self.prompt,
                module.details().category,
                module.details().name
            ),
            None => format!("({})> ", self.prompt),
        }
    }

    /// Entity catalog.
    #[must_use]
    pub fn catalog(&self) -> &dyn Catalog {
        self.catalog.as_ref()
    }

    /// Operator output.
    #[must_use]
    pub fn reporter(&self) -> &dyn Reporter {
        self.reporter.as_ref()
    }

    /// Shared handle to the operator output, for background work.
    #[must_use]
    pub fn reporter_handle(&self) -> Arc<dyn Reporter> {
        Arc::clone(&self.reporter)
    }

    /// Runner for `!` commands.
    #[must_use]
    pub fn system(&self) -> &dyn SystemRunner {
        self.system.as_ref()
    }

    /// Background job table.
    #[must_use]
    pub const fn jobs(&self) -> &JobTable {
        &self.jobs
    }

    /// Open session table.
    #[must_use]
    pub const fn sessions(&self) -> &SessionTable {
        &self.sessions
    }

    /// Locks the selection.
    pub fn selection(&self) -> MutexGuard<'_, Selection> {
        self.selection.lock()
    }

    /// Locks the handler registry.
    ///
    /// Callers that also hold the selection must lock it first.
    pub fn handlers(&self) -> MutexGuard<'_, HandlerRegistry> {
        self.handlers.lock()
    }

    /// Snapshot of the core namespace.
    #[must_use]
    pub fn core_commands(&self) -> Arc<CommandNamespace> {
        self.core.load_full()
    }

    /// Publishes a new core namespace.
    pub fn replace_core_commands(&self, core: CommandNamespace) {
        self.core.store(Arc::new(core));
    }

    /// Snapshot of the current module's namespace, if a module is selected.
    #[must_use]
    pub fn module_commands(&self) -> Option<Arc<CommandNamespace>> {
        self.selection.lock().current().map(crate::entity::Module::commands)
    }

    /// Snapshot of the loaded plugins.
    #[must_use]
    pub fn plugins(&self) -> Arc<PluginSet> {
        self.plugins.load_full()
    }

    /// Adds a plugin to the loaded set.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::AlreadyLoaded`] for duplicate names.
    pub fn load_plugin(&self, plugin: Plugin) -> Result<(), PluginError> {
        self.update_plugins(|plugins| plugins.register(plugin.clone()))
    }

    /// Removes a plugin from the loaded set.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::NotLoaded`] for unknown names.
    pub fn unload_plugin(&self, name: &str) -> Result<(), PluginError> {
        self.update_plugins(|plugins| plugins.remove(name).map(|_| ()))
    }

    fn update_plugins(
        &self,
        mut change: impl FnMut(&mut PluginSet) -> Result<(), PluginError>,
    ) -> Result<(), PluginError> {
        loop {
            let current = self.plugins.load_full();
            let mut next = (*current).clone();
            change(&mut next)?;
            let previous = self.plugins.compare_and_swap(&current, Arc::new(next));
            if Arc::ptr_eq(&previous, &current) {
                return Ok(());
            }
        }
    }

    /// Dispatches one tokenized line.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError`] when a handler fails or a background job
    /// cannot start; other problems are reported and yield an outcome.
    pub fn execute(self: &Arc<Self>, tokens: &[String]) -> Result<Dispatched, DispatchError> {
        dispatch::execute(self, tokens)
    }

    /// Reaps finished jobs and dead sessions, then re-synthesizes handler
    /// options for the current module. Jobs that panicked are reported.
    pub fn update_events(&self) {
        let jobs = self.jobs.stop_dead();
        for job in jobs.iter().filter(|job| job.panicked) {
            self.reporter()
                .error(&format!("Job {} ({}) terminated unexpectedly!", job.id, job.name));
        }
        let sessions = self.sessions.close_dead();
        if !jobs.is_empty() || !sessions.is_empty() {
            debug!(
                target: CONSOLE_TARGET,
                jobs = jobs.len(),
                sessions = sessions.len(),
                "reaped background state"
            );
        }
        self.synthesize_handlers();
    }

    /// Runs handler synthesis for the current module.
    pub fn synthesize_handlers(&self) {
        let mut selection = self.selection.lock();
        if let Some(module) = selection.current_mut() {
            self.handlers.lock().synthesize(module);
        }
    }

    /// Reads one line from the input source.
    pub fn read_line(&self, prompt: &str) -> ReadLine {
        match self.input.lock().as_mut() {
            Some(input) => input.read_line(prompt),
            None => ReadLine::Eof,
        }
    }

    /// Asks a yes/no question; anything but `y`/`yes` is a no.
    pub fn confirm(&self, question: &str) -> bool {
        match self.read_line(question) {
            ReadLine::Line(answer) => crate::option::parse_boolean(&answer).unwrap_or(false),
            ReadLine::Interrupted | ReadLine::Eof => false,
        }
    }

    /// Asks the console loop to stop after the current command.
    pub fn request_exit(&self) {
        self.exit_requested.store(true, Ordering::SeqCst);
    }

    /// Returns `true` once exit has been requested.
    #[must_use]
    pub fn exit_requested(&self) -> bool {
        self.exit_requested.load(Ordering::SeqCst)
    }
}

impl std::fmt::Debug for Shell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Shell")
            .field("prompt", &self.prompt)
            .field("core", &self.core.load().len())
            .field("plugins", &self.plugins.load().len())
            .field("jobs", &self.jobs)
            .field("sessions", &self.sessions)
            .finish_non_exhaustive()
    }
}
