use std::fmt::{self, Debug};
use std::sync::{Arc, Weak};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::kernel::context::Context;
use crate::kernel::error::Result;
use crate::kernel::system::System;

/// Kind of a component. Drives dispatch, not structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComponentType {
    Basic,
    SystemComponent,
    Operation,
    Service,
    Application,
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ComponentType::Basic => "basic",
            ComponentType::SystemComponent => "system-component",
            ComponentType::Operation => "operation",
            ComponentType::Service => "service",
            ComponentType::Application => "application",
        };
        f.write_str(name)
    }
}

/// A named, typed unit managed by the kernel.
///
/// Capabilities are discovered through the `as_*` queries rather than the
/// reported [`ComponentType`]; a component only answers `Some` for the
/// capabilities it actually implements.
pub trait Component: Send + Sync + Debug {
    fn id(&self) -> &str;
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn component_type(&self) -> ComponentType;

    fn as_system_component(&self) -> Option<&dyn SystemComponent> {
        None
    }

    fn as_operation(&self) -> Option<&dyn Operation> {
        None
    }

    fn as_service(&self) -> Option<&dyn Service> {
        None
    }
}

/// A component bound to a kernel.
pub trait SystemComponent: Component {
    /// Called once before use. The handle is weak; the kernel owns its components.
    fn initialize(&self, ctx: &Context, system: &Weak<System>) -> Result<()>;
}

/// Something with a start/stop lifecycle.
#[async_trait]
pub trait Startable: Send + Sync {
    async fn start(&self, ctx: &Context) -> Result<()>;
    async fn stop(&self, ctx: &Context) -> Result<()>;
}

/// A system component that can be started and stopped.
pub trait Service: SystemComponent + Startable {}

impl<T: SystemComponent + Startable + ?Sized> Service for T {}

/// Input handed to [`Operation::execute`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OperationInput {
    pub data: Value,
}

impl OperationInput {
    pub fn new(data: impl Into<Value>) -> Self {
        Self { data: data.into() }
    }
}

/// Result of [`Operation::execute`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OperationOutput {
    pub data: Value,
}

impl OperationOutput {
    pub fn new(data: impl Into<Value>) -> Self {
        Self { data: data.into() }
    }
}

/// A system component that runs a unit of work on request.
#[async_trait]
pub trait Operation: SystemComponent {
    async fn execute(&self, ctx: &Context, input: OperationInput) -> Result<OperationOutput>;
}

/// Parameters for creating one component through a factory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentConfig {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub factory_id: String,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub custom_config: Value,
}

impl ComponentConfig {
    pub fn new(id: impl Into<String>, factory_id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            description: id.clone(),
            id,
            factory_id: factory_id.into(),
            custom_config: Value::Null,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_custom_config(mut self, custom_config: impl Into<Value>) -> Self {
        self.custom_config = custom_config.into();
        self
    }
}

/// Turns a [`ComponentConfig`] into a component.
pub trait ComponentFactory: Send + Sync {
    fn create_component(&self, config: &ComponentConfig) -> Result<Arc<dyn Component>>;
}
