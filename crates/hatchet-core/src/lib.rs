//! Console core for the Hatchet security-testing shell.
//!
//! The crate holds everything between a line of operator input and the
//! module code it ends up running:
//!
//! - the typed [`option`] system, including the cross-entity payload,
//!   encoder, and session references;
//! - the [`entity`] model and the [`entity::Catalog`] seam behind which
//!   modules, payloads, encoders, and plugins are discovered;
//! - the [`handler`] synthesizer, which decides which connection fields
//!   (`LHOST`, `LPORT`, `RBPORT`, `CBHOST`, `CBPORT`, `BPORT`, `PAYLOAD`,
//!   `BLINDER`) apply to the current module and payload and publishes them as
//!   handler maps for listeners and connectors;
//! - command namespaces, the [`dispatch`]er that walks them, and the
//!   built-in [`commands`];
//! - background [`jobs`], live [`sessions`], and loaded [`plugin`]s;
//! - the [`shell::Shell`] state object and the [`console::Console`] loop.
//!
//! Network I/O, payload generation, and on-disk module discovery are left to
//! collaborators.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use hatchet_core::console::{Console, ScriptedSource};
//! use hatchet_core::entity::InMemoryCatalog;
//! use hatchet_core::shell::Shell;
//!
//! let shell = Shell::builder(Arc::new(InMemoryCatalog::new()))
//!     .input(Box::new(ScriptedSource::new(["help", "exit"])))
//!     .build();
//! Console::new(shell).run();
//! ```

pub mod command;
pub mod commands;
pub mod console;
pub mod dispatch;
pub mod entity;
pub mod handler;
pub mod ids;
pub mod jobs;
pub mod option;
pub mod plugin;
pub mod report;
pub mod selection;
pub mod sessions;
pub mod shell;
mod show;
pub mod system;

#[cfg(test)]
mod tests;

pub use self::console::{Console, ConsoleError, LineSource, ReadLine};
pub use self::dispatch::{DispatchError, Dispatched};
pub use self::entity::{Catalog, InMemoryCatalog, Module, Payload};
pub use self::report::{Reporter, TerminalReporter};
pub use self::shell::{Shell, ShellBuilder};
