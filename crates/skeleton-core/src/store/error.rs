//! # Skeleton Core Store Errors
//!
//! Defines [`StoreError`], the error type shared by the versioned database
//! engine, [`Store`](crate::store::Store), the store factory and the
//! [`MultiStore`](crate::store::MultiStore).
use std::path::PathBuf;
use thiserror::Error;

use crate::kernel::error::ErrorKind;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Invalid store name provided: '{name}'")]
    InvalidName { name: String },

    #[error("Key '{key}' not found")]
    KeyNotFound { key: String },

    #[error("Version {version} not found")]
    VersionNotFound { version: i64 },

    #[error("Version {version} already exists with different contents")]
    VersionExists { version: i64 },

    #[error("Failed to create database '{name}' at '{}': {source}", path.display())]
    StorageInit {
        name: String,
        path: PathBuf,
        #[source]
        source: Box<StoreError>,
    },

    #[error("I/O error during operation '{operation}' on path '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization to '{format}' failed: {source}")]
    SerializationError {
        format: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },

    #[error("Deserialization from '{format}' failed: {source}")]
    DeserializationError {
        format: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },

    #[error("Snapshot '{}' is corrupted: {reason}", path.display())]
    Corrupted { path: PathBuf, reason: String },

    #[error("Database '{name}' is closed")]
    Closed { name: String },
}

impl StoreError {
    pub fn io(source: std::io::Error, operation: impl Into<String>, path: PathBuf) -> Self {
        StoreError::Io {
            source,
            operation: operation.into(),
            path,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::InvalidName { .. } => ErrorKind::InvalidInput,
            StoreError::VersionExists { .. } => ErrorKind::AlreadyExists,
            StoreError::KeyNotFound { .. } | StoreError::VersionNotFound { .. } => ErrorKind::NotFound,
            StoreError::StorageInit { .. }
            | StoreError::Io { .. }
            | StoreError::SerializationError { .. }
            | StoreError::DeserializationError { .. }
            | StoreError::Corrupted { .. } => ErrorKind::WrappedCause,
            StoreError::Closed { .. } => ErrorKind::StateError,
        }
    }
}

/// Result type of the storage layer.
pub type StoreResult<T> = std::result::Result<T, StoreError>;
