#![deny(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

//! # zq-mapping
//!
//! Declarative field rules, custom-field coercion, and the entity mapping
//! registry for the Zephyr to qTest migration.
//!
//! A [`FieldRule`] maps one source field to one target field, optionally
//! transforming and validating the value on the way, and declares what
//! happens when that fails. An [`EntityRule`] is the ordered rule list for
//! one entity kind. The [`MappingRegistry`] holds one `EntityRule` per kind
//! together with the named functions and custom-field coercer the rules use.

mod builtin;
pub mod coercer;
pub mod custom_fields;
pub mod dates;
pub mod entity;
pub mod functions;
pub mod normalize;
mod numeric;
pub mod registry;
pub mod rules;
pub mod transforms;

pub use coercer::{Coerced, CustomFieldCoercer};
pub use custom_fields::{CustomFieldMapping, CustomFieldProfile};
pub use entity::MappedEntity;
pub use functions::FunctionRegistry;
pub use normalize::{ExecutionStatus, Priority, lookup_priority, map_priority, map_status};
pub use registry::{MappingRegistry, new_default_registry};
pub use rules::{
    EntityRule, FieldOutcome, FieldRule, OnFail, RuleDsl, RuleSet, TransformKind, ValidationKind,
};

use thiserror::Error;

/// Errors raised by a custom-field mapper
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CustomFieldError {
    /// The source data is not shaped the way Zephyr documents it
    #[error("Malformed custom field: {0}")]
    Malformed(String),

    /// A coercion or override function failed in a way the data cannot explain
    #[error("Unexpected error in custom field mapper for '{field}': {message}")]
    Unexpected { field: String, message: String },
}

/// Errors that can occur during mapping
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Field '{field}' rejected: {message}")]
    FieldRejected { field: String, message: String },

    #[error("No mapping rule registered for entity kind '{0}'")]
    MissingRule(zq_model::EntityKind),

    #[error("Unknown function '{0}'")]
    UnknownFunction(String),

    #[error("Transform error: {0}")]
    Transform(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Rule parse error: {0}")]
    Parse(String),

    #[error(transparent)]
    CustomField(#[from] CustomFieldError),
}

impl Error {
    /// Build a hard field rejection for a rule whose failure policy is `Error`.
    pub fn field_rejected(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::FieldRejected {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Whether this error belongs to the class of failures the input data
    /// cannot explain, as opposed to expected domain validation problems.
    #[must_use]
    pub fn is_unexpected(&self) -> bool {
        matches!(self, Error::CustomField(CustomFieldError::Unexpected { .. }))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
