use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::component::base::{BaseComponent, BaseSystemService, ComponentInfo, FnFactory};
use crate::component::error::ComponentError;
use crate::component::registrar::ComponentRegistrar;
use crate::component::traits::{Component, ComponentConfig, ComponentFactory, ComponentType};
use crate::kernel::error::{Error, ErrorKind, Result};

fn basic_factory() -> Arc<dyn ComponentFactory> {
    Arc::new(FnFactory::new(|config: &ComponentConfig| {
        Ok(Arc::new(BaseComponent::new(ComponentInfo::from(config))) as Arc<dyn Component>)
    }))
}

fn service_factory() -> Arc<dyn ComponentFactory> {
    Arc::new(FnFactory::new(|config: &ComponentConfig| {
        Ok(Arc::new(BaseSystemService::new(ComponentInfo::from(config))) as Arc<dyn Component>)
    }))
}

#[tokio::test]
async fn test_register_factory_twice_keeps_first() -> Result<()> {
    let registrar = ComponentRegistrar::new();
    let first = basic_factory();
    registrar.register_factory("basic", Arc::clone(&first)).await?;

    let err = registrar
        .register_factory("basic", service_factory())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Component(ComponentError::FactoryAlreadyExists { ref id }) if id == "basic"
    ));
    assert_eq!(err.kind(), ErrorKind::AlreadyExists);

    // The first binding still creates basic components
    let stored = registrar.get_factory("basic").await?;
    assert!(Arc::ptr_eq(&stored, &first));
    assert_eq!(registrar.factory_count().await, 1);
    Ok(())
}

#[tokio::test]
async fn test_create_component_with_unknown_factory() -> Result<()> {
    let registrar = ComponentRegistrar::new();
    registrar.register_factory("basic", basic_factory()).await?;
    registrar
        .create_component(&ComponentConfig::new("existing", "basic"))
        .await?;

    let err = registrar
        .create_component(&ComponentConfig::new("new", "missing"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(registrar.component_count().await, 1);
    assert!(registrar.get_component("new").await.is_err());
    Ok(())
}

#[tokio::test]
async fn test_create_component_keys_by_component_id() -> Result<()> {
    let registrar = ComponentRegistrar::new();
    registrar.register_factory("basic", basic_factory()).await?;

    let config = ComponentConfig::new("reader", "basic")
        .with_name("Reader")
        .with_description("reads things");
    let created = registrar.create_component(&config).await?;
    assert_eq!(created.name(), "Reader");

    let fetched = registrar.get_component("reader").await?;
    assert!(Arc::ptr_eq(&created, &fetched));
    assert!(registrar.get_component("basic").await.is_err());
    Ok(())
}

#[tokio::test]
async fn test_create_component_overwrites_same_id() -> Result<()> {
    let registrar = ComponentRegistrar::new();
    registrar.register_factory("basic", basic_factory()).await?;

    let first = registrar
        .create_component(&ComponentConfig::new("dup", "basic").with_name("first"))
        .await?;
    let second = registrar
        .create_component(&ComponentConfig::new("dup", "basic").with_name("second"))
        .await?;

    assert!(!Arc::ptr_eq(&first, &second));
    assert_eq!(registrar.get_component("dup").await?.name(), "second");
    assert_eq!(registrar.component_count().await, 1);
    Ok(())
}

#[tokio::test]
async fn test_factory_error_leaves_components_unchanged() -> Result<()> {
    let registrar = ComponentRegistrar::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let counted = Arc::clone(&calls);
    registrar
        .register_factory(
            "broken",
            Arc::new(FnFactory::new(move |config: &ComponentConfig| {
                counted.fetch_add(1, Ordering::SeqCst);
                Err(Error::InvalidInput(format!("cannot build {}", config.id)))
            })),
        )
        .await?;

    let err = registrar
        .create_component(&ComponentConfig::new("x", "broken"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(registrar.component_count().await, 0);
    Ok(())
}

#[tokio::test]
async fn test_unregister_factory_removes_component_with_same_id_only() -> Result<()> {
    let registrar = ComponentRegistrar::new();
    registrar.register_factory("shared", basic_factory()).await?;
    registrar
        .create_component(&ComponentConfig::new("shared", "shared"))
        .await?;
    registrar
        .create_component(&ComponentConfig::new("other", "shared"))
        .await?;

    registrar.unregister_factory("shared").await?;

    // Only the component whose id coincides with the factory id goes away;
    // "other" was made by the same factory and survives.
    assert!(registrar.get_component("shared").await.is_err());
    assert!(registrar.get_component("other").await.is_ok());
    assert!(registrar.get_factory("shared").await.is_err());
    Ok(())
}

#[tokio::test]
async fn test_unregister_missing_entries() {
    let registrar = ComponentRegistrar::new();
    let err = registrar.unregister_factory("nope").await.unwrap_err();
    assert!(matches!(
        err,
        Error::Component(ComponentError::FactoryNotFound { .. })
    ));

    let err = registrar.unregister_component("nope").await.unwrap_err();
    assert!(matches!(
        err,
        Error::Component(ComponentError::ComponentNotFound { .. })
    ));
}

#[tokio::test]
async fn test_components_by_type_and_snapshots() -> Result<()> {
    let registrar = ComponentRegistrar::new();
    registrar.register_factory("basic", basic_factory()).await?;
    registrar.register_factory("service", service_factory()).await?;

    for id in ["b1", "b2"] {
        registrar.create_component(&ComponentConfig::new(id, "basic")).await?;
    }
    registrar.create_component(&ComponentConfig::new("s1", "service")).await?;

    let mut basics: Vec<String> = registrar
        .get_components_by_type(ComponentType::Basic)
        .await
        .iter()
        .map(|c| c.id().to_string())
        .collect();
    basics.sort();
    assert_eq!(basics, vec!["b1", "b2"]);

    let services = registrar.get_components_by_type(ComponentType::Service).await;
    assert_eq!(services.len(), 1);
    assert!(services[0].as_service().is_some());

    assert!(registrar
        .get_components_by_type(ComponentType::Application)
        .await
        .is_empty());
    assert_eq!(registrar.get_all_components().await.len(), 3);
    assert_eq!(registrar.get_all_factories().await.len(), 2);

    registrar.unregister_component("b1").await?;
    assert_eq!(registrar.get_all_components().await.len(), 2);
    Ok(())
}

#[tokio::test]
async fn test_concurrent_creates_last_writer_wins() -> Result<()> {
    let registrar = Arc::new(ComponentRegistrar::new());
    registrar.register_factory("basic", basic_factory()).await?;

    let mut handles = Vec::new();
    for n in 0..8 {
        let registrar = Arc::clone(&registrar);
        handles.push(tokio::spawn(async move {
            registrar
                .create_component(&ComponentConfig::new("racer", "basic").with_name(format!("r{n}")))
                .await
        }));
    }
    for handle in handles {
        handle.await.expect("task panicked")?;
    }

    assert_eq!(registrar.component_count().await, 1);
    assert!(registrar.get_component("racer").await?.name().starts_with('r'));
    Ok(())
}

#[tokio::test]
async fn test_concurrent_creates_with_distinct_ids() -> Result<()> {
    let registrar = ComponentRegistrar::new();
    registrar.register_factory("service", service_factory()).await?;

    let configs: Vec<ComponentConfig> = (0..16)
        .map(|n| ComponentConfig::new(format!("svc{n}"), "service"))
        .collect();
    let results = futures::future::join_all(configs.iter().map(|c| registrar.create_component(c))).await;

    assert!(results.iter().all(|r| r.is_ok()));
    assert_eq!(registrar.component_count().await, 16);
    assert_eq!(
        registrar.get_components_by_type(ComponentType::Service).await.len(),
        16
    );
    Ok(())
}
