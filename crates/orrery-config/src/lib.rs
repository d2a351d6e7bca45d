//! Orrery Config
//!
//! This crate contains the workflow definition types for orrery and the
//! parser that builds them from JSON documents.
//!
//! A [`WorkflowDefinition`] is pure data: variables, an ordered list of
//! steps and an optional list of connections. It never embeds executable
//! code; the `plugin_id` of each step selects behaviour from the step
//! registry at execution time.
//!
//! Parsing is a syntax-to-struct transform only. Whether plugins exist or
//! connections form a DAG is checked later by the resolver and executor.

mod connection;
mod error;
mod parser;
mod reader;
mod step;
mod value;
mod variable;
mod version;
mod workflow;

pub use connection::{Connection, read_connections};
pub use error::ConfigError;
pub use parser::{parse_document, parse_file, parse_str};
pub use step::WorkflowStepDefinition;
pub use value::{ParameterKind, ParameterValue};
pub use variable::{VariableType, WorkflowVariable};
pub use version::{SUPPORTED_VERSIONS, detect_version, normalize_version};
pub use workflow::WorkflowDefinition;
