//! Convenience wrappers over the registrar and the kernel for the common
//! "register, create, initialize, start" sequences.
use std::sync::Arc;

use crate::component::traits::{Component, ComponentConfig, ComponentFactory, Startable, SystemComponent};
use crate::kernel::context::Context;
use crate::kernel::error::{Capability, Error, Result};
use crate::kernel::logger::LogLevel;
use crate::kernel::system::System;

/// A factory plus the ids of the components to create with it.
pub struct FactoryConfig {
    pub factory_id: String,
    pub factory: Arc<dyn ComponentFactory>,
    pub component_ids: Vec<String>,
}

/// Register `factory` under `config.factory_id`, create the component and,
/// if it is an operation or a service, initialize it against `system`.
pub async fn register_component(
    ctx: &Context,
    system: &System,
    config: &ComponentConfig,
    factory: Arc<dyn ComponentFactory>,
) -> Result<Arc<dyn Component>> {
    system.logger().logf(
        LogLevel::Debug,
        format_args!(
            "Registering component {} with factory ID {}",
            config.id, config.factory_id
        ),
    );
    let registrar = system.component_registrar();
    registrar.register_factory(&config.factory_id, factory).await?;
    let component = registrar.create_component(config).await?;
    initialize_component(ctx, system, component.as_ref())?;
    Ok(component)
}

/// Register a factory and create one component per id, using the id as
/// name and description.
pub async fn register_component_factory(system: &System, factory_config: FactoryConfig) -> Result<()> {
    let registrar = system.component_registrar();
    registrar
        .register_factory(&factory_config.factory_id, factory_config.factory)
        .await?;

    for id in &factory_config.component_ids {
        let config = ComponentConfig::new(id.as_str(), factory_config.factory_id.as_str());
        registrar.create_component(&config).await?;
    }
    Ok(())
}

/// Create a service from `config`, initialize it and start it.
pub async fn start_service_from_config(
    ctx: &Context,
    system: &System,
    config: &ComponentConfig,
) -> Result<Arc<dyn Component>> {
    let component = system.component_registrar().create_component(config).await?;
    let service = component.as_service().ok_or_else(|| Error::CapabilityMismatch {
        component_id: component.id().to_string(),
        expected: Capability::Service,
    })?;
    service.initialize(ctx, &system.handle())?;
    service.start(ctx).await?;
    Ok(component)
}

/// Stop the service registered under `id` without touching the kernel status.
pub async fn stop_service_by_id(ctx: &Context, system: &System, id: &str) -> Result<()> {
    let component = system.component_registrar().get_component(id).await?;
    let service = component.as_service().ok_or_else(|| Error::CapabilityMismatch {
        component_id: id.to_string(),
        expected: Capability::Service,
    })?;
    service.stop(ctx).await
}

/// Create the operations and services listed in the system configuration.
///
/// Operations are created and initialized; services are also started. The
/// factories they name must already be registered.
pub async fn create_configured_components(ctx: &Context, system: &System) -> Result<()> {
    let configuration = system.configuration();
    for operation in &configuration.operations {
        let component = system
            .component_registrar()
            .create_component(&operation.component)
            .await?;
        initialize_component(ctx, system, component.as_ref())?;
    }
    for service in &configuration.services {
        start_service_from_config(ctx, system, &service.component).await?;
    }
    Ok(())
}

fn initialize_component(ctx: &Context, system: &System, component: &dyn Component) -> Result<()> {
    if let Some(operation) = component.as_operation() {
        operation.initialize(ctx, &system.handle())
    } else if let Some(service) = component.as_service() {
        service.initialize(ctx, &system.handle())
    } else {
        Ok(())
    }
}
