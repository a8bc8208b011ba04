//! Error types for taskchain operations.
//!
//! This module defines [`TaskChainError`], the error type used throughout
//! the engine, and a [`Result`] type alias for convenience.
//!
//! # Error Handling Strategy
//!
//! - Bad input shapes are reported before any task runs
//! - Lookups never fall back to a default silently
//! - Failures raised by task bodies pass through untouched via
//!   [`TaskChainError::Task`]

use std::path::PathBuf;
use thiserror::Error;

/// Broad classification of a [`TaskChainError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad input shape, raised at registration or run setup.
    Structural,
    /// Unknown key, partition, run id, group or title placeholder.
    Lookup,
    /// A unique name or key was written twice.
    Duplicate,
    /// A task body failed.
    Task,
    /// Engine-internal failure (poisoned lock, missing entropy).
    Internal,
}

/// Core error type for taskchain operations.
#[derive(Debug, Error)]
pub enum TaskChainError {
    /// Invalid input structure or values.
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// Title template could not be parsed.
    #[error("Invalid title template '{title}': {message}")]
    InvalidTitle { title: String, message: String },

    /// Graph dependency cycle detected.
    #[error("Circular dependency detected: {cycle}")]
    CircularDependency { cycle: String },

    /// Requested entry does not exist.
    #[error("{kind} not found: {key}")]
    NotFound { kind: &'static str, key: String },

    /// Title template references a placeholder the engine does not provide.
    #[error("Unknown placeholder '{{{placeholder}}}' in title '{title}'")]
    UnknownPlaceholder { placeholder: String, title: String },

    /// Group name registered twice.
    #[error("Group '{name}' exists already")]
    DuplicateGroup { name: String },

    /// Run context key written twice without removal.
    #[error("Task key '{key}' is already set in this run")]
    DuplicateKey { key: String },

    /// Plan file not found at the given location.
    #[error("Plan not found: {path}")]
    PlanNotFound { path: PathBuf },

    /// Failed to parse a plan file.
    #[error("Failed to parse plan at {path}: {message}")]
    PlanParse { path: PathBuf, message: String },

    /// Engine-internal failure.
    #[error("Internal error: {message}")]
    Internal { message: String },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error raised by a task body, passed through unchanged.
    #[error(transparent)]
    Task(#[from] anyhow::Error),
}

impl TaskChainError {
    /// Shorthand for a [`TaskChainError::Validation`].
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Shorthand for a [`TaskChainError::NotFound`].
    pub fn not_found(kind: &'static str, key: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            key: key.into(),
        }
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. }
            | Self::InvalidTitle { .. }
            | Self::CircularDependency { .. }
            | Self::PlanParse { .. } => ErrorKind::Structural,
            Self::NotFound { .. } | Self::UnknownPlaceholder { .. } | Self::PlanNotFound { .. } => {
                ErrorKind::Lookup
            }
            Self::DuplicateGroup { .. } | Self::DuplicateKey { .. } => ErrorKind::Duplicate,
            Self::Task(_) => ErrorKind::Task,
            Self::Internal { .. } | Self::Io(_) => ErrorKind::Internal,
        }
    }
}

/// Result type alias for taskchain operations.
pub type Result<T> = std::result::Result<T, TaskChainError>;
