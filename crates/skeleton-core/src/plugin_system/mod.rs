//! # Skeleton Core Plugin System
//!
//! Plugins are services that contribute resources to the kernel when they
//! are added. The [`PluginManager`] keeps them and starts or stops all of
//! them in one best-effort pass, reporting every failure at once.
pub mod error;
pub mod manager;
pub mod traits;

pub use error::{PluginFailure, PluginSystemError};
pub use manager::PluginManager;
pub use traits::Plugin;

#[cfg(test)]
mod tests;
