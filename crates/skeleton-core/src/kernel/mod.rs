//! # Skeleton Core Kernel
//!
//! The [`System`] and everything it needs to run: the call [`Context`],
//! configuration, the [`Logger`] abstraction, the kernel [`Error`] type and
//! helper routines for registering and booting components.
//!
//! A system starts `Stopped`, is moved to `Initialized` by
//! [`System::initialize`], to `Started` by [`System::start`] (which starts
//! the plugins) and back to `Stopped` by [`System::stop`] (which stops the
//! registered services).
pub mod config;
pub mod constants;
pub mod context;
pub mod error;
pub mod logger;
pub mod system;
pub mod utils;

pub use config::{ConfigFormat, Configuration, OperationConfiguration, ServiceConfiguration, StoreConfiguration};
pub use context::Context;
pub use error::{Capability, Error, ErrorKind, Result};
pub use logger::{LogFacadeLogger, LogLevel, Logger};
pub use system::{ServiceFailure, System, SystemBuilder, SystemStatus};
pub use utils::{
    FactoryConfig, create_configured_components, register_component, register_component_factory,
    start_service_from_config, stop_service_by_id,
};

#[cfg(test)]
mod tests;
