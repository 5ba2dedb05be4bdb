#![deny(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

//! # zq-transform
//!
//! Entity transformers for test cases, test cycles and test executions.
//!
//! A transformer runs the mapping registry over one source record, then maps
//! the nested collections, custom fields and attachments, and resolves
//! cross-references through an injected [`MappingLookup`]. Every step is
//! attempted; failures are collected into a [`TransformationResult`] instead
//! of aborting the call.

pub mod config;
pub mod resolver;
pub mod result;
mod test_case;
mod test_cycle;
mod test_execution;
pub mod transformer;

pub use config::TransformerConfig;
pub use resolver::{InMemoryLookup, LookupError, MappingLookup, MappingType, NoLookup};
pub use result::TransformationResult;
pub use test_case::TestCaseTransformer;
pub use test_cycle::TestCycleTransformer;
pub use test_execution::TestExecutionTransformer;
pub use transformer::{EntityTransformer, TransformContext, Transformers};

use thiserror::Error;
use zq_model::EntityKind;

/// Errors that can occur while setting up or running transformers
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error(transparent)]
    Mapping(#[from] zq_mapping::Error),

    #[error("Configuration error in {source_name}: {message}")]
    Config {
        source_name: String,
        message: String,
    },

    #[error("No transformer for entity kind '{0}'")]
    UnsupportedKind(EntityKind),
}

impl Error {
    /// Build a configuration error naming where the bad input came from.
    pub fn config(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Config {
            source_name: source_name.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
