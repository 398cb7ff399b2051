//! Error types for the criteria builder
//!
//! Each stage of the pipeline has its own error enum; [`Error`] wraps them so a
//! whole build can be driven with `?`.

use thiserror::Error;

use crate::value::ValueType;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Build errors. Any of these aborts the build; no partial condition is returned.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Invalid filter key '{key}': {source}")]
    Key {
        key: String,
        #[source]
        source: KeyError,
    },

    #[error("Cannot resolve '{path}': {source}")]
    Resolve {
        path: String,
        #[source]
        source: ResolveError,
    },

    #[error("Invalid value for '{key}': {source}")]
    Coercion {
        key: String,
        #[source]
        source: CoercionError,
    },

    #[error("Attribute '{path}' of type {value_type} is not orderable and cannot be used with '{operator}'")]
    NotOrderable {
        path: String,
        value_type: ValueType,
        operator: &'static str,
    },

    #[error("Operator '{operator}' requires a text attribute, but '{path}' is {value_type}")]
    OperatorNotApplicable {
        path: String,
        value_type: ValueType,
        operator: &'static str,
    },

    #[error("Malformed value for '{operator}': {message}")]
    MalformedValue {
        operator: &'static str,
        message: String,
    },

    #[error("Too many filters: {count} exceeds the maximum of {max}")]
    TooManyFilters { count: usize, max: usize },

    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),
}

/// Filter key parsing errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyError {
    #[error("unknown operator '{0}'")]
    UnknownOperator(String),

    #[error("attribute path is empty")]
    EmptyPath,
}

/// Attribute path resolution errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("unknown entity '{0}'")]
    UnknownEntity(String),

    #[error("entity '{entity}' has no relation '{relation}'")]
    UnknownRelation { entity: String, relation: String },

    #[error("entity '{entity}' has no attribute '{attribute}'")]
    UnknownAttribute { entity: String, attribute: String },

    #[error("attribute path is empty")]
    EmptyPath,

    #[error("attribute path contains an empty segment")]
    EmptySegment,
}

/// Value coercion errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoercionError {
    #[error("cannot parse '{raw}' as {target}")]
    Parse { raw: String, target: ValueType },

    #[error("expected a single value, got {0}")]
    NotScalar(&'static str),
}

/// Schema loading and validation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("invalid schema document: {0}")]
    Parse(String),

    #[error("cannot read schema file '{path}': {message}")]
    Io { path: String, message: String },

    #[error("relation '{entity}.{relation}' targets unknown entity '{target}'")]
    UnknownTarget {
        entity: String,
        relation: String,
        target: String,
    },

    #[error("'{0}' is not a valid SQL identifier")]
    InvalidIdentifier(String),

    #[error("entity '{entity}' declares '{name}' as both attribute and relation")]
    AmbiguousMember { entity: String, name: String },

    #[error("unknown entity '{0}'")]
    UnknownEntity(String),
}
