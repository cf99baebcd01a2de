//! Embeddable application kernel.
//!
//! Components are created by factories held in a [`ComponentRegistrar`],
//! plugins contribute them through the [`PluginManager`], and the [`System`]
//! drives their lifecycle. Persistent state lives in a versioned
//! [`MultiStore`].
pub mod component;
pub mod event;
pub mod kernel;
pub mod plugin_system;
pub mod store;
pub mod utils;

// Re-export key public types/traits for easier use by the binary and plugins
pub use component::{
    Component, ComponentConfig, ComponentFactory, ComponentRegistrar, ComponentType, Operation,
    OperationInput, OperationOutput, Service, Startable, SystemComponent,
};
pub use event::{Event, EventBus};
pub use kernel::error::Error as KernelError;
pub use kernel::{Configuration, Context, Result, System, SystemStatus};
pub use plugin_system::{Plugin, PluginManager};
pub use store::{Database, MultiStore, Store, StoreError};
