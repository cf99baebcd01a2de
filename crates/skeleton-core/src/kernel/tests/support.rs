use std::sync::{Arc, Mutex, PoisonError, RwLock, Weak};

use async_trait::async_trait;
use serde_json::json;

use crate::component::base::{BaseComponent, ComponentInfo, FnFactory};
use crate::component::traits::{
    Component, ComponentConfig, ComponentFactory, ComponentType, Operation, OperationInput,
    OperationOutput, Service, Startable, SystemComponent,
};
use crate::kernel::context::Context;
use crate::kernel::error::{Error, Result};
use crate::kernel::system::System;
use crate::plugin_system::traits::Plugin;

/// Shared, ordered record of lifecycle calls.
pub type CallLog = Arc<Mutex<Vec<String>>>;

pub fn call_log() -> CallLog {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn calls(log: &CallLog) -> Vec<String> {
    log.lock().unwrap_or_else(PoisonError::into_inner).clone()
}

fn record(log: &CallLog, entry: String) {
    log.lock().unwrap_or_else(PoisonError::into_inner).push(entry);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Failures {
    pub start: bool,
    pub stop: bool,
}

/// Service that records every lifecycle call.
#[derive(Debug)]
pub struct RecordingService {
    id: String,
    log: CallLog,
    failures: Failures,
    dispatch_to: Option<String>,
    system: RwLock<Weak<System>>,
}

impl RecordingService {
    pub fn new(id: &str, log: &CallLog, failures: Failures) -> Arc<Self> {
        Arc::new(Self {
            id: id.to_string(),
            log: Arc::clone(log),
            failures,
            dispatch_to: None,
            system: RwLock::new(Weak::new()),
        })
    }

    /// Like [`RecordingService::new`], but `start` and `stop` also start or
    /// stop `target` through the kernel.
    pub fn dispatching(id: &str, log: &CallLog, target: &str) -> Arc<Self> {
        Arc::new(Self {
            id: id.to_string(),
            log: Arc::clone(log),
            failures: Failures::default(),
            dispatch_to: Some(target.to_string()),
            system: RwLock::new(Weak::new()),
        })
    }

    fn bound_system(&self) -> Result<Arc<System>> {
        self.system()
            .ok_or_else(|| Error::Other(format!("{} is not bound to a system", self.id)))
    }

    pub fn system(&self) -> Option<Arc<System>> {
        self.system.read().unwrap_or_else(PoisonError::into_inner).upgrade()
    }
}

impl Component for RecordingService {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.id
    }

    fn description(&self) -> &str {
        "records lifecycle calls"
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

impl SystemComponent for RecordingService {
    fn initialize(&self, _ctx: &Context, system: &Weak<System>) -> Result<()> {
        record(&self.log, format!("initialize:{}", self.id));
        *self.system.write().unwrap_or_else(PoisonError::into_inner) = system.clone();
        Ok(())
    }
}

#[async_trait]
impl Startable for RecordingService {
    async fn start(&self, ctx: &Context) -> Result<()> {
        record(&self.log, format!("start:{}", self.id));
        if self.failures.start {
            return Err(Error::Other(format!("{} cannot start", self.id)));
        }
        if let Some(target) = &self.dispatch_to {
            self.bound_system()?.start_service(ctx, target).await?;
        }
        Ok(())
    }

    async fn stop(&self, ctx: &Context) -> Result<()> {
        record(&self.log, format!("stop:{}", self.id));
        if self.failures.stop {
            return Err(Error::Other(format!("{} cannot stop", self.id)));
        }
        if let Some(target) = &self.dispatch_to {
            self.bound_system()?.stop_service(ctx, target).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl Plugin for RecordingService {
    /// Contributes an `echo` operation and a `basic` component to the kernel.
    async fn register_resources(&self, _ctx: &Context) -> Result<()> {
        record(&self.log, format!("register:{}", self.id));
        let system = self.bound_system()?;
        let registrar = system.component_registrar();
        registrar.register_factory("echo", echo_factory()).await?;
        registrar.create_component(&ComponentConfig::new("echo", "echo")).await?;
        registrar.register_factory("basic", basic_factory()).await?;
        registrar.create_component(&ComponentConfig::new("basic", "basic")).await?;
        Ok(())
    }
}

/// Factory producing [`RecordingService`]s that share one call log.
pub fn recording_factory(log: &CallLog, failures: Failures) -> Arc<dyn ComponentFactory> {
    let log = Arc::clone(log);
    Arc::new(FnFactory::new(move |config: &ComponentConfig| {
        Ok(RecordingService::new(&config.id, &log, failures) as Arc<dyn Component>)
    }))
}

/// Operation returning its input wrapped as `{"echo": input}`.
#[derive(Debug)]
pub struct EchoOperation {
    info: ComponentInfo,
}

impl Component for EchoOperation {
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
        ComponentType::Operation
    }

    fn as_system_component(&self) -> Option<&dyn SystemComponent> {
        Some(self)
    }

    fn as_operation(&self) -> Option<&dyn Operation> {
        Some(self)
    }
}

impl SystemComponent for EchoOperation {
    fn initialize(&self, _ctx: &Context, _system: &Weak<System>) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl Operation for EchoOperation {
    async fn execute(&self, _ctx: &Context, input: OperationInput) -> Result<OperationOutput> {
        Ok(OperationOutput::new(json!({ "echo": input.data })))
    }
}

pub fn echo_factory() -> Arc<dyn ComponentFactory> {
    Arc::new(FnFactory::new(|config: &ComponentConfig| {
        Ok(Arc::new(EchoOperation {
            info: ComponentInfo::from(config),
        }) as Arc<dyn Component>)
    }))
}

pub fn basic_factory() -> Arc<dyn ComponentFactory> {
    Arc::new(FnFactory::new(|config: &ComponentConfig| {
        Ok(Arc::new(BaseComponent::new(ComponentInfo::from(config))) as Arc<dyn Component>)
    }))
}
