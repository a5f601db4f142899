//! Errors raised while parsing or locating option values.

use thiserror::Error;

/// Failures surfaced by [`ModuleOption::set`](super::ModuleOption::set) and
/// by option lookups on the current selection.
///
/// A failed `set` never mutates the option, the module, or the payload it
/// would have bound.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OptionError {
    /// The raw value does not parse as the option's type.
    #[error("Invalid option value, expected valid {expected}!")]
    Validation {
        /// Human-readable name of the expected type.
        expected: &'static str,
    },

    /// A payload, encoder, or session reference did not resolve.
    #[error("Invalid option value, expected valid {kind}!")]
    Compatibility {
        /// Kind of entity that failed to resolve.
        kind: &'static str,
    },

    /// Neither the current module nor its payload declares the option.
    #[error("Unrecognized option: {name}!")]
    UnknownOption {
        /// Option name as typed by the operator.
        name: String,
    },

    /// A required option cannot be cleared.
    #[error("Option {name} is required and cannot be unset!")]
    Required {
        /// Name of the required option.
        name: String,
    },

    /// Options were addressed while no module was selected.
    #[error("No module selected.")]
    NoModuleSelected,
}

impl OptionError {
    /// Builds a [`OptionError::Validation`] for the given type name.
    #[must_use]
    pub const fn validation(expected: &'static str) -> Self {
        Self::Validation { expected }
    }

    /// Builds a [`OptionError::Compatibility`] for the given entity kind.
    #[must_use]
    pub const fn compatibility(kind: &'static str) -> Self {
        Self::Compatibility { kind }
    }

    /// Builds a [`OptionError::UnknownOption`].
    pub fn unknown(name: impl Into<String>) -> Self {
        Self::UnknownOption { name: name.into() }
    }
}
