//! Error types for the NodeBuilder domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error enum; [`Error`] covers loading and wiring.

use thiserror::Error;

/// The top-level error type for loading and wiring NodeBuilder.
///
/// Mapping itself reports through the bounded-context errors below.
#[derive(Debug, Error)]
pub enum Error {
    // --- Schema errors ---
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("Unknown entity type: {0}")]
    NotFound(String),

    #[error("Entity type {entity_type} has no association named {name}")]
    UnknownAssociation { entity_type: String, name: String },

    #[error("Lookup failed: {0}")]
    Lookup(String),
}

/// Raised when a bound setter is invoked, never when it is built.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssignmentError {
    #[error("{entity_type} has no setter method {method}")]
    NoSuchMethod { entity_type: String, method: String },

    #[error("{entity_type} has no field {field}")]
    NoSuchField { entity_type: String, field: String },

    #[error("Field {field} of {entity_type} is not publicly assignable")]
    Inaccessible { entity_type: String, field: String },

    #[error("Setter expected an entity of type {expected}, got {found}")]
    TypeMismatch { expected: String, found: String },

    #[error("Invalid value for {member}: {reason}")]
    InvalidValue { member: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransformError {
    #[error("Transform {transform} failed: {reason}")]
    Failed { transform: String, reason: String },

    #[error("Unknown transform: {0}")]
    UnknownTransform(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("Entity type {0} has no registered constructor")]
    NotConstructible(String),

    #[error("Value cannot be wrapped as {entity_type}: {source}")]
    WrongType {
        entity_type: String,
        #[source]
        source: AssignmentError,
    },

    #[error(transparent)]
    Schema(#[from] SchemaError),
}
