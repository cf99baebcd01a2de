//! Components and the registrar that creates and tracks them.
pub mod base;
pub mod error;
pub mod registrar;
pub mod traits;

pub use base::{
    BaseComponent, BaseSystemComponent, BaseSystemOperation, BaseSystemService, ComponentInfo,
    FnFactory,
};
pub use error::ComponentError;
pub use registrar::ComponentRegistrar;
pub use traits::{
    Component, ComponentConfig, ComponentFactory, ComponentType, Operation, OperationInput,
    OperationOutput, Service, Startable, SystemComponent,
};

#[cfg(test)]
mod tests;
