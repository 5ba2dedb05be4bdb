#![deny(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

//! # zq-model
//!
//! Source and target record vocabulary for the Zephyr to qTest migration engine.
//!
//! Source records arrive as loosely-typed JSON objects mirroring the Zephyr
//! API. This crate names the entity kinds, the closed set of qTest target
//! kinds, and the custom-field union that every other layer works against.

/// Custom-field source union and normalized target field.
pub mod custom_field;
/// Source entity kinds and target entity kinds.
pub mod kind;
/// Record type alias and field-access helpers.
pub mod record;

pub use custom_field::{CustomField, CustomFieldType, TargetFieldType, TransformedField};
pub use kind::{EntityKind, TargetKind};
pub use record::{Record, first_present, get_path, stringify, value_to_id, value_to_text};

use thiserror::Error;

/// Errors that can occur when interpreting source records
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Invalid custom field at position {index}: {reason}")]
    InvalidCustomField { index: usize, reason: String },

    #[error("Unknown entity kind: {0}")]
    UnknownEntityKind(String),

    #[error("Conversion error in {context}: {message}")]
    Conversion { context: String, message: String },
}

impl Error {
    /// Build an invalid-custom-field error with its position in the source collection.
    pub fn invalid_custom_field(index: usize, reason: impl Into<String>) -> Self {
        Self::InvalidCustomField {
            index,
            reason: reason.into(),
        }
    }

    /// Build a conversion error with conversion context.
    pub fn conversion(context: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Conversion {
            context: context.into(),
            message: message.into(),
        }
    }
}

/// Crate-local result type for model operations.
pub type Result<T> = std::result::Result<T, Error>;
