//! # Skeleton Core Plugin System Errors
//!
//! Defines [`PluginSystemError`], covering duplicate or missing plugins,
//! failures while a plugin is being added (initialization and resource
//! registration), and the aggregate errors produced by bulk start/stop.
use std::fmt;

use crate::kernel::error::{Error, ErrorKind};

#[derive(Debug, thiserror::Error)]
pub enum PluginSystemError {
    #[error("Plugin with ID '{plugin_id}' already exists")]
    AlreadyExists { plugin_id: String },

    #[error("Plugin with ID '{plugin_id}' not found")]
    NotFound { plugin_id: String },

    #[error("Failed to initialize plugin '{plugin_id}': {source}")]
    InitializationError {
        plugin_id: String,
        #[source]
        source: Box<Error>,
    },

    #[error("Failed to register resources for plugin '{plugin_id}': {source}")]
    ResourceRegistrationError {
        plugin_id: String,
        #[source]
        source: Box<Error>,
    },

    #[error("Errors starting plugins: [{}]", join_failures(.failures))]
    StartFailed { failures: Vec<PluginFailure> },

    #[error("Errors stopping plugins: [{}]", join_failures(.failures))]
    StopFailed { failures: Vec<PluginFailure> },

    #[error("{operation} not implemented")]
    NotImplemented { operation: &'static str },
}

impl PluginSystemError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PluginSystemError::AlreadyExists { .. } => ErrorKind::AlreadyExists,
            PluginSystemError::NotFound { .. } => ErrorKind::NotFound,
            PluginSystemError::InitializationError { .. }
            | PluginSystemError::ResourceRegistrationError { .. } => ErrorKind::WrappedCause,
            PluginSystemError::StartFailed { .. } | PluginSystemError::StopFailed { .. } => {
                ErrorKind::Aggregate
            }
            PluginSystemError::NotImplemented { .. } => ErrorKind::NotImplemented,
        }
    }

    /// Per-plugin failures of an aggregate error; empty for every other variant.
    pub fn failures(&self) -> &[PluginFailure] {
        match self {
            PluginSystemError::StartFailed { failures } | PluginSystemError::StopFailed { failures } => {
                failures
            }
            _ => &[],
        }
    }
}

/// One plugin's failure inside a bulk start or stop pass.
#[derive(Debug)]
pub struct PluginFailure {
    pub plugin_id: String,
    pub error: Error,
}

impl fmt::Display for PluginFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "plugin {}: {}", self.plugin_id, self.error)
    }
}

fn join_failures(failures: &[PluginFailure]) -> String {
    failures
        .iter()
        .map(|failure| failure.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
