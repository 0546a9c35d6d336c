//! Core error types for Hiqual RS
//!
//! Every failure except a property read is surfaced to the caller with the
//! path, type or value needed to diagnose it.

use thiserror::Error;

use crate::config::ConfigError;

/// Core error type for all Hiqual operations
#[derive(Error, Debug)]
pub enum HqError {
    #[error("Cannot compile path '{path}' against {root}: {reason}")]
    Compilation {
        path: String,
        root: String,
        reason: String,
    },

    #[error("Type {provided} is not assignable to {declared} at segment {segment} of '{path}'")]
    TypeMismatch {
        path: String,
        segment: usize,
        declared: String,
        provided: String,
    },

    #[error("Cannot instantiate {type_name} while resolving '{path}'")]
    Instantiation { type_name: String, path: String },

    #[error("Cannot write '{path}' on {root}: {reason}")]
    PropertyWrite {
        path: String,
        root: String,
        reason: String,
    },

    #[error("Operator {operator} on '{property}' requires a value")]
    InvalidCondition { property: String, operator: String },

    #[error("Cannot coerce {found} into {target}")]
    UnsupportedCollectionKind { found: String, target: String },

    #[error("Alias '{alias}' collides with the reserved separator or another alias")]
    AliasCollision { alias: String },

    #[error("{operation} requires a non-empty collection")]
    EmptyCollection { operation: &'static str },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Execution error: {0}")]
    Execution(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type alias using HqError
pub type HqResult<T> = Result<T, HqError>;

impl HqError {
    pub fn compilation(
        path: impl Into<String>,
        root: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Compilation {
            path: path.into(),
            root: root.into(),
            reason: reason.into(),
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            HqError::Compilation { .. } => "path_compilation_failed",
            HqError::TypeMismatch { .. } => "type_mismatch",
            HqError::Instantiation { .. } => "instantiation_failed",
            HqError::PropertyWrite { .. } => "property_write_failed",
            HqError::InvalidCondition { .. } => "invalid_condition",
            HqError::UnsupportedCollectionKind { .. } => "unsupported_collection_kind",
            HqError::AliasCollision { .. } => "alias_collision",
            HqError::EmptyCollection { .. } => "empty_collection",
            HqError::InvalidArgument(_) => "invalid_argument",
            HqError::Execution(_) => "execution_failed",
            HqError::Config(_) => "configuration_error",
        }
    }

    /// Whether the failure was raised while configuring rather than running
    pub fn is_build_time(&self) -> bool {
        matches!(
            self,
            HqError::Compilation { .. }
                | HqError::TypeMismatch { .. }
                | HqError::Instantiation { .. }
                | HqError::AliasCollision { .. }
                | HqError::Config(_)
        )
    }
}
