use std::sync::{Arc, Weak};

use serde_json::json;

use crate::component::base::{
    BaseComponent, BaseSystemComponent, BaseSystemOperation, BaseSystemService, ComponentInfo,
};
use crate::component::traits::{
    Component, ComponentConfig, ComponentType, Operation, OperationInput, Startable,
    SystemComponent,
};
use crate::kernel::context::Context;
use crate::kernel::error::ErrorKind;
use crate::kernel::system::System;

fn info(id: &str) -> ComponentInfo {
    ComponentInfo::new(id, format!("{id} name"), format!("{id} description"))
}

#[test]
fn test_base_component_identity() {
    let component = BaseComponent::new(info("plain"));
    assert_eq!(component.id(), "plain");
    assert_eq!(component.name(), "plain name");
    assert_eq!(component.description(), "plain description");
    assert_eq!(component.component_type(), ComponentType::Basic);
    assert!(component.as_system_component().is_none());
    assert!(component.as_operation().is_none());
    assert!(component.as_service().is_none());
}

#[test]
fn test_system_component_keeps_weak_handle() {
    let component = BaseSystemComponent::new(info("sys"));
    assert_eq!(component.component_type(), ComponentType::SystemComponent);
    assert!(component.system().is_none());

    let system = System::new();
    component
        .initialize(&Context::background(), &Arc::downgrade(&system))
        .expect("initialize");
    assert!(Arc::ptr_eq(&component.system().expect("bound"), &system));

    // The handle does not keep the kernel alive
    drop(system);
    assert!(component.system().is_none());
}

#[tokio::test]
async fn test_operation_defaults() {
    let operation = BaseSystemOperation::new(info("op"));
    // Operations report Basic; the capability query is what dispatch relies on
    assert_eq!(operation.component_type(), ComponentType::Basic);
    let capability = operation.as_operation().expect("operation capability");
    assert!(operation.as_service().is_none());

    capability
        .initialize(&Context::background(), &Weak::new())
        .expect("initialize");
    let err = capability
        .execute(&Context::background(), OperationInput::new(json!({"x": 1})))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotImplemented);
}

#[tokio::test]
async fn test_service_defaults() {
    let service = BaseSystemService::new(info("svc"));
    assert_eq!(service.component_type(), ComponentType::Service);
    let capability = service.as_service().expect("service capability");
    assert!(service.as_operation().is_none());

    let ctx = Context::background();
    assert_eq!(capability.start(&ctx).await.unwrap_err().kind(), ErrorKind::NotImplemented);
    assert_eq!(capability.stop(&ctx).await.unwrap_err().kind(), ErrorKind::NotImplemented);
}

#[test]
fn test_component_config_serde_names() {
    let config: ComponentConfig = serde_json::from_value(json!({
        "id": "reader",
        "name": "Reader",
        "description": "reads",
        "factoryId": "readers",
        "customConfig": {"batch": 10}
    }))
    .expect("config");
    assert_eq!(config.factory_id, "readers");
    assert_eq!(config.custom_config["batch"], 10);

    let info = ComponentInfo::from(&config);
    assert_eq!(info.name, "Reader");

    let minimal: ComponentConfig =
        serde_json::from_value(json!({"id": "x", "factoryId": "f"})).expect("minimal config");
    assert!(minimal.name.is_empty());
    assert!(minimal.custom_config.is_null());
}
