use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use async_trait::async_trait;

use crate::component::traits::{Component, ComponentType, Service, Startable, SystemComponent};
use crate::kernel::context::Context;
use crate::kernel::error::{Error, ErrorKind, Result};
use crate::kernel::system::System;
use crate::plugin_system::error::PluginSystemError;
use crate::plugin_system::manager::PluginManager;
use crate::plugin_system::traits::Plugin;

#[derive(Debug, Default, Clone, Copy)]
struct Behavior {
    fail_init: bool,
    fail_register: bool,
    fail_start: bool,
    fail_stop: bool,
}

#[derive(Debug)]
struct MockPlugin {
    id: String,
    behavior: Behavior,
    initialized: AtomicUsize,
    registered: AtomicUsize,
    starts: AtomicUsize,
    stops: AtomicUsize,
}

impl MockPlugin {
    fn new(id: &str) -> Arc<Self> {
        Self::with_behavior(id, Behavior::default())
    }

    fn with_behavior(id: &str, behavior: Behavior) -> Arc<Self> {
        Arc::new(Self {
            id: id.to_string(),
            behavior,
            initialized: AtomicUsize::new(0),
            registered: AtomicUsize::new(0),
            starts: AtomicUsize::new(0),
            stops: AtomicUsize::new(0),
        })
    }
}

impl Component for MockPlugin {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.id
    }

    fn description(&self) -> &str {
        "mock plugin"
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

impl SystemComponent for MockPlugin {
    fn initialize(&self, _ctx: &Context, _system: &Weak<System>) -> Result<()> {
        self.initialized.fetch_add(1, Ordering::SeqCst);
        if self.behavior.fail_init {
            return Err(Error::Other("init failed".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl Startable for MockPlugin {
    async fn start(&self, _ctx: &Context) -> Result<()> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        if self.behavior.fail_start {
            return Err(Error::Other(format!("{} refused to start", self.id)));
        }
        Ok(())
    }

    async fn stop(&self, _ctx: &Context) -> Result<()> {
        self.stops.fetch_add(1, Ordering::SeqCst);
        if self.behavior.fail_stop {
            return Err(Error::Other(format!("{} refused to stop", self.id)));
        }
        Ok(())
    }
}

#[async_trait]
impl Plugin for MockPlugin {
    async fn register_resources(&self, _ctx: &Context) -> Result<()> {
        self.registered.fetch_add(1, Ordering::SeqCst);
        if self.behavior.fail_register {
            return Err(Error::Other("registration failed".to_string()));
        }
        Ok(())
    }
}

#[tokio::test]
async fn test_add_plugin_runs_initialize_then_register() -> Result<()> {
    let manager = PluginManager::new();
    let ctx = Context::background();
    let plugin = MockPlugin::new("alpha");

    manager.add_plugin(&ctx, plugin.clone()).await?;
    assert_eq!(plugin.initialized.load(Ordering::SeqCst), 1);
    assert_eq!(plugin.registered.load(Ordering::SeqCst), 1);
    assert_eq!(manager.get_plugin("alpha").await?.id(), "alpha");
    assert_eq!(manager.plugin_count().await, 1);
    Ok(())
}

#[tokio::test]
async fn test_add_duplicate_plugin() -> Result<()> {
    let manager = PluginManager::new();
    let ctx = Context::background();
    manager.add_plugin(&ctx, MockPlugin::new("alpha")).await?;

    let duplicate = MockPlugin::new("alpha");
    let err = manager.add_plugin(&ctx, duplicate.clone()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AlreadyExists);
    // Rejected before any callback runs
    assert_eq!(duplicate.initialized.load(Ordering::SeqCst), 0);
    Ok(())
}

#[tokio::test]
async fn test_add_plugin_is_all_or_nothing() {
    let manager = PluginManager::new();
    let ctx = Context::background();

    let failing_register = MockPlugin::with_behavior(
        "register",
        Behavior {
            fail_register: true,
            ..Behavior::default()
        },
    );
    let err = manager.add_plugin(&ctx, failing_register).await.unwrap_err();
    assert!(matches!(
        err,
        Error::PluginSystem(PluginSystemError::ResourceRegistrationError { ref plugin_id, .. })
            if plugin_id == "register"
    ));
    assert_eq!(err.kind(), ErrorKind::WrappedCause);
    let missing = manager.get_plugin("register").await.unwrap_err();
    assert_eq!(missing.kind(), ErrorKind::NotFound);

    let failing_init = MockPlugin::with_behavior(
        "init",
        Behavior {
            fail_init: true,
            ..Behavior::default()
        },
    );
    let err = manager.add_plugin(&ctx, failing_init.clone()).await.unwrap_err();
    assert!(matches!(
        err,
        Error::PluginSystem(PluginSystemError::InitializationError { .. })
    ));
    assert!(err.to_string().contains("init"));
    // Resources are never registered for a plugin that failed to initialize
    assert_eq!(failing_init.registered.load(Ordering::SeqCst), 0);
    assert_eq!(manager.plugin_count().await, 0);
}

#[tokio::test]
async fn test_remove_plugin_does_not_stop_it() -> Result<()> {
    let manager = PluginManager::new();
    let ctx = Context::background();
    let plugin = MockPlugin::new("alpha");
    manager.add_plugin(&ctx, plugin.clone()).await?;
    manager.start_plugins(&ctx).await?;

    let removed = manager.remove_plugin(plugin.as_ref()).await?;
    assert_eq!(removed.id(), "alpha");
    assert_eq!(plugin.stops.load(Ordering::SeqCst), 0);
    assert_eq!(manager.plugin_count().await, 0);

    let err = manager.remove_plugin(plugin.as_ref()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    Ok(())
}

#[tokio::test]
async fn test_start_plugins_is_idempotent() -> Result<()> {
    let manager = PluginManager::new();
    let ctx = Context::background();
    let plugin = MockPlugin::new("alpha");
    manager.add_plugin(&ctx, plugin.clone()).await?;

    manager.start_plugins(&ctx).await?;
    manager.start_plugins(&ctx).await?;
    assert_eq!(plugin.starts.load(Ordering::SeqCst), 1);
    assert!(manager.is_started().await);

    manager.stop_plugins(&ctx).await?;
    manager.stop_plugins(&ctx).await?;
    assert_eq!(plugin.stops.load(Ordering::SeqCst), 1);
    assert!(!manager.is_started().await);

    // A new cycle starts the plugin again
    manager.start_plugins(&ctx).await?;
    assert_eq!(plugin.starts.load(Ordering::SeqCst), 2);
    Ok(())
}

#[tokio::test]
async fn test_stop_before_start_is_noop() -> Result<()> {
    let manager = PluginManager::new();
    let ctx = Context::background();
    let plugin = MockPlugin::new("alpha");
    manager.add_plugin(&ctx, plugin.clone()).await?;

    manager.stop_plugins(&ctx).await?;
    assert_eq!(plugin.stops.load(Ordering::SeqCst), 0);
    Ok(())
}

#[tokio::test]
async fn test_start_failure_attempts_all_and_aggregates() -> Result<()> {
    let manager = PluginManager::new();
    let ctx = Context::background();
    let healthy_a = MockPlugin::new("a-healthy");
    let broken = MockPlugin::with_behavior(
        "b-broken",
        Behavior {
            fail_start: true,
            fail_stop: true,
            ..Behavior::default()
        },
    );
    let healthy_c = MockPlugin::new("c-healthy");
    for plugin in [&healthy_a, &broken, &healthy_c] {
        manager.add_plugin(&ctx, Arc::clone(plugin) as Arc<dyn Plugin>).await?;
    }

    let err = manager.start_plugins(&ctx).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Aggregate);
    assert!(err.to_string().contains("b-broken"));
    match &err {
        Error::PluginSystem(e) => {
            assert_eq!(e.failures().len(), 1);
            assert_eq!(e.failures()[0].plugin_id, "b-broken");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    for plugin in [&healthy_a, &broken, &healthy_c] {
        assert_eq!(plugin.starts.load(Ordering::SeqCst), 1, "{} attempted", plugin.id);
    }
    // Best effort: the manager still counts as started
    assert!(manager.is_started().await);

    let err = manager.stop_plugins(&ctx).await.unwrap_err();
    assert!(matches!(
        err,
        Error::PluginSystem(PluginSystemError::StopFailed { .. })
    ));
    assert!(err.to_string().contains("b-broken"));
    for plugin in [&healthy_a, &broken, &healthy_c] {
        assert_eq!(plugin.stops.load(Ordering::SeqCst), 1);
    }
    assert!(!manager.is_started().await);
    Ok(())
}

#[tokio::test]
async fn test_get_plugins_sorted_by_id() -> Result<()> {
    let manager = PluginManager::new();
    let ctx = Context::background();
    for id in ["gamma", "alpha", "beta"] {
        manager.add_plugin(&ctx, MockPlugin::new(id)).await?;
    }
    let ids: Vec<String> = manager
        .get_plugins()
        .await
        .iter()
        .map(|p| p.id().to_string())
        .collect();
    assert_eq!(ids, vec!["alpha", "beta", "gamma"]);
    Ok(())
}

#[tokio::test]
async fn test_discovery_is_not_implemented() {
    let manager = PluginManager::new();
    let ctx = Context::background().with_plugin_paths(["/opt/plugins"]);

    let err = manager.discover_plugins(&ctx).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotImplemented);

    let err = manager
        .load_remote_plugin(&ctx, "https://example.com/plugin")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotImplemented);
}
