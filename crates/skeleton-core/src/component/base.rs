//! Ready-made component building blocks.
//!
//! Each type composes a [`ComponentInfo`] (and, for system components, the
//! kernel handle) instead of layering behaviour through inheritance. Custom
//! components usually embed one of these and forward the identity methods.
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, Weak};

use async_trait::async_trait;

use crate::component::traits::{
    Component, ComponentConfig, ComponentFactory, ComponentType, Operation, OperationInput,
    OperationOutput, Service, Startable, SystemComponent,
};
use crate::kernel::context::Context;
use crate::kernel::error::{Error, Result};
use crate::kernel::system::System;

/// Identity shared by every component.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ComponentInfo {
    pub id: String,
    pub name: String,
    pub description: String,
}

impl ComponentInfo {
    pub fn new(id: impl Into<String>, name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
        }
    }
}

impl From<&ComponentConfig> for ComponentInfo {
    fn from(config: &ComponentConfig) -> Self {
        Self::new(&config.id, &config.name, &config.description)
    }
}

/// Plain component with no capabilities.
#[derive(Debug, Clone)]
pub struct BaseComponent {
    info: ComponentInfo,
}

impl BaseComponent {
    pub fn new(info: ComponentInfo) -> Self {
        Self { info }
    }

    pub fn info(&self) -> &ComponentInfo {
        &self.info
    }
}

impl Component for BaseComponent {
    fn id(&self) -> &str {
        &self.info.id
    }

    fn name(&self) -> &str {
        &self.info.name
    }

    fn description(&self) -> &str {
        &self.info.description
    }

    fn component_type(&self) -> ComponentType {
        ComponentType::Basic
    }
}

/// Component that remembers the kernel it was initialized against.
pub struct BaseSystemComponent {
    info: ComponentInfo,
    system: RwLock<Weak<System>>,
}

impl BaseSystemComponent {
    pub fn new(info: ComponentInfo) -> Self {
        Self {
            info,
            system: RwLock::new(Weak::new()),
        }
    }

    pub fn info(&self) -> &ComponentInfo {
        &self.info
    }

    /// Kernel this component was initialized against, while it is alive.
    pub fn system(&self) -> Option<Arc<System>> {
        self.system
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .upgrade()
    }

    fn bind(&self, system: &Weak<System>) {
        *self.system.write().unwrap_or_else(PoisonError::into_inner) = system.clone();
    }
}

impl fmt::Debug for BaseSystemComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BaseSystemComponent")
            .field("info", &self.info)
            .field("initialized", &self.system().is_some())
            .finish()
    }
}

impl Component for BaseSystemComponent {
    fn id(&self) -> &str {
        &self.info.id
    }

    fn name(&self) -> &str {
        &self.info.name
    }

    fn description(&self) -> &str {
        &self.info.description
    }

    fn component_type(&self) -> ComponentType {
        ComponentType::SystemComponent
    }

    fn as_system_component(&self) -> Option<&dyn SystemComponent> {
        Some(self)
    }
}

impl SystemComponent for BaseSystemComponent {
    fn initialize(&self, _ctx: &Context, system: &Weak<System>) -> Result<()> {
        self.bind(system);
        Ok(())
    }
}

/// Operation skeleton. `execute` must be provided by the embedding type.
#[derive(Debug)]
pub struct BaseSystemOperation {
    base: BaseSystemComponent,
}

impl BaseSystemOperation {
    pub fn new(info: ComponentInfo) -> Self {
        Self {
            base: BaseSystemComponent::new(info),
        }
    }

    pub fn base(&self) -> &BaseSystemComponent {
        &self.base
    }
}

impl Component for BaseSystemOperation {
    fn id(&self) -> &str {
        self.base.id()
    }

    fn name(&self) -> &str {
        self.base.name()
    }

    fn description(&self) -> &str {
        self.base.description()
    }

    // Reported as Basic; dispatch goes through `as_operation`.
    fn component_type(&self) -> ComponentType {
        ComponentType::Basic
    }

    fn as_system_component(&self) -> Option<&dyn SystemComponent> {
        Some(self)
    }

    fn as_operation(&self) -> Option<&dyn Operation> {
        Some(self)
    }
}

impl SystemComponent for BaseSystemOperation {
    fn initialize(&self, ctx: &Context, system: &Weak<System>) -> Result<()> {
        self.base.initialize(ctx, system)
    }
}

#[async_trait]
impl Operation for BaseSystemOperation {
    async fn execute(&self, _ctx: &Context, _input: OperationInput) -> Result<OperationOutput> {
        Err(Error::not_implemented("execute"))
    }
}

/// Service skeleton. `start` and `stop` must be provided by the embedding type.
#[derive(Debug)]
pub struct BaseSystemService {
    base: BaseSystemComponent,
}

impl BaseSystemService {
    pub fn new(info: ComponentInfo) -> Self {
        Self {
            base: BaseSystemComponent::new(info),
        }
    }

    pub fn base(&self) -> &BaseSystemComponent {
        &self.base
    }
}

impl Component for BaseSystemService {
    fn id(&self) -> &str {
        self.base.id()
    }

    fn name(&self) -> &str {
        self.base.name()
    }

    fn description(&self) -> &str {
        self.base.description()
    }

    fn component_type(&self) -> ComponentType {
        ComponentType::Service
    }

    fn as_system_component(&self) -> Option<&dyn SystemComponent> {
        Some(self)
    }

    fn as_service(&self) -> Option<&dyn Service> {
        Some(self)
    }
}

impl SystemComponent for BaseSystemService {
    fn initialize(&self, ctx: &Context, system: &Weak<System>) -> Result<()> {
        self.base.initialize(ctx, system)
    }
}

#[async_trait]
impl Startable for BaseSystemService {
    async fn start(&self, _ctx: &Context) -> Result<()> {
        Err(Error::not_implemented("start"))
    }

    async fn stop(&self, _ctx: &Context) -> Result<()> {
        Err(Error::not_implemented("stop"))
    }
}

/// Closure-backed [`ComponentFactory`].
pub struct FnFactory<F> {
    create: F,
}

impl<F> FnFactory<F>
where
    F: Fn(&ComponentConfig) -> Result<Arc<dyn Component>> + Send + Sync,
{
    pub fn new(create: F) -> Self {
        Self { create }
    }
}

impl<F> ComponentFactory for FnFactory<F>
where
    F: Fn(&ComponentConfig) -> Result<Arc<dyn Component>> + Send + Sync,
{
    fn create_component(&self, config: &ComponentConfig) -> Result<Arc<dyn Component>> {
        (self.create)(config)
    }
}
