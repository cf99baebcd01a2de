//! # Skeleton Core Kernel Errors
//!
//! Defines the top-level error type of the kernel.
//!
//! Every subsystem owns a closed error enum ([`ComponentError`],
//! [`PluginSystemError`], [`StoreError`], [`EventSystemError`]); the kernel's
//! [`Error`] wraps them and adds the lifecycle and dispatch failures raised by
//! the [`System`](crate::kernel::system::System) itself. [`Error::kind`] maps
//! any error onto the coarse [`ErrorKind`] taxonomy callers branch on.
use std::fmt;
use std::path::PathBuf;
use std::result::Result as StdResult;

use crate::component::error::ComponentError;
use crate::event::error::EventSystemError;
use crate::kernel::system::SystemStatus;
use crate::plugin_system::error::PluginSystemError;
use crate::store::error::StoreError;
use thiserror::Error as ThisError;

/// Kernel error type
#[derive(Debug, ThisError)]
pub enum Error {
    /// Component registrar error (factory or component lookups and registration)
    #[error("Component registry error: {0}")]
    Component(#[from] ComponentError),

    /// Plugin manager error
    #[error("Plugin system error: {0}")]
    PluginSystem(#[from] PluginSystemError),

    /// Store, store factory or multi-store error
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Event bus error
    #[error("Event system error: {0}")]
    EventSystem(#[from] EventSystemError),

    /// `start` was called while the system was not in the `Initialized` state.
    #[error("System not initialized (current status: {status})")]
    NotInitialized { status: SystemStatus },

    /// `stop` was called while the system was not in the `Started` state.
    #[error("System not started (current status: {status})")]
    NotStarted { status: SystemStatus },

    /// The component exists but lacks the capability the call dispatches to.
    #[error("Component '{component_id}' is not {expected}")]
    CapabilityMismatch {
        component_id: String,
        expected: Capability,
    },

    /// Default behaviour of base components that were not given an implementation.
    #[error("{operation} not implemented")]
    NotImplemented { operation: String },

    /// Configuration could not be read or parsed.
    #[error("Configuration error for '{}': {message}", path.display())]
    Config { path: PathBuf, message: String },

    /// Malformed caller input outside the store layer.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Generic error with message
    #[error("Error: {0}")]
    Other(String),
}

/// Capability a component must expose for a dispatch call to succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    SystemComponent,
    Operation,
    Service,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::SystemComponent => write!(f, "a system component"),
            Capability::Operation => write!(f, "an operation"),
            Capability::Service => write!(f, "a service"),
        }
    }
}

/// Coarse classification of every error the kernel can return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Lookup miss: factory, component, plugin, store, key or version.
    NotFound,
    /// Duplicate registration.
    AlreadyExists,
    /// Malformed store name, configuration or other caller input.
    InvalidInput,
    /// Stubbed capability.
    NotImplemented,
    /// Operation invoked outside its required lifecycle state.
    StateError,
    /// Bulk operation with per-item failures.
    Aggregate,
    /// Error wrapping an underlying engine, storage or plugin failure.
    WrappedCause,
    /// Anything else, including type mismatches at dispatch time.
    Other,
}

impl Error {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Component(e) => e.kind(),
            Error::PluginSystem(e) => e.kind(),
            Error::Store(e) => e.kind(),
            Error::EventSystem(e) => e.kind(),
            Error::NotInitialized { .. } | Error::NotStarted { .. } => ErrorKind::StateError,
            Error::CapabilityMismatch { .. } => ErrorKind::Other,
            Error::NotImplemented { .. } => ErrorKind::NotImplemented,
            Error::Config { .. } | Error::InvalidInput(_) => ErrorKind::InvalidInput,
            Error::Other(_) => ErrorKind::Other,
        }
    }

    pub fn not_implemented(operation: impl Into<String>) -> Self {
        Error::NotImplemented {
            operation: operation.into(),
        }
    }
}

/// Shorthand for Result with our Error type
pub type Result<T> = StdResult<T, Error>;

impl From<&str> for Error {
    fn from(msg: &str) -> Self {
        Error::Other(msg.to_string())
    }
}

impl From<String> for Error {
    fn from(msg: String) -> Self {
        Error::Other(msg)
    }
}
