use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, Weak};

use tokio::sync::{Mutex, RwLock};

use crate::component::registrar::ComponentRegistrar;
use crate::component::traits::{
    Component, ComponentType, OperationInput, OperationOutput, Service, Startable,
};
use crate::event::EventBus;
use crate::kernel::config::Configuration;
use crate::kernel::constants::{DEFAULT_DATA_DIR, DEFAULT_ROOT_STORE};
use crate::kernel::context::Context;
use crate::kernel::error::{Capability, Error, Result};
use crate::kernel::logger::{LogFacadeLogger, LogLevel, Logger};
use crate::plugin_system::PluginManager;
use crate::store::{
    DefaultStoreFactory, MultiStore, SnapshotDatabase, Store, StoreFactory, create_multi_store,
    generate_storage_info,
};

/// Lifecycle state of a [`System`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SystemStatus {
    Initialized,
    Started,
    Stopped,
}

impl fmt::Display for SystemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SystemStatus::Initialized => "initialized",
            SystemStatus::Started => "started",
            SystemStatus::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// A service that failed to stop during [`System::stop_with_report`].
#[derive(Debug)]
pub struct ServiceFailure {
    pub service_id: String,
    pub error: Error,
}

/// The kernel.
///
/// Ties together the component registrar, the plugin manager, the
/// multi-store, the event bus and the logger, and drives the lifecycle
/// `Stopped -> Initialized -> Started -> Stopped`.
///
/// `start`, `stop` and the dispatch calls (`execute_operation`,
/// `start_service`, `stop_service`) share the kernel lock for their whole
/// duration, so plugin and service callbacks may dispatch back into the
/// kernel. Only `initialize` takes it exclusively. Transitions are
/// serialized among themselves, and a callback must not call `initialize`,
/// `start` or `stop`. The status has its own lock, held only to read or
/// commit it.
pub struct System {
    lock: RwLock<()>,
    transition: Mutex<()>,
    status: RwLock<SystemStatus>,
    configuration: Configuration,
    registrar: Arc<ComponentRegistrar>,
    plugin_manager: Arc<PluginManager>,
    multi_store: Arc<MultiStore>,
    event_bus: Arc<EventBus>,
    logger: Arc<dyn Logger>,
    handle: Weak<System>,
}

impl System {
    /// Kernel with default parts and an in-memory multi-store.
    pub fn new() -> Arc<Self> {
        Self::builder().build()
    }

    pub fn builder() -> SystemBuilder {
        SystemBuilder::default()
    }

    /// Kernel whose multi-store follows `configuration.store`.
    ///
    /// With a base directory the stores are persisted there and the root
    /// store's latest version is loaded; otherwise they stay in memory.
    pub fn from_configuration(configuration: Configuration) -> Result<Arc<Self>> {
        let store_config = configuration.store.clone();
        let builder = Self::builder();
        let builder = match &store_config.base_dir {
            Some(base_dir) => {
                let factory: Arc<dyn StoreFactory> = Arc::new(DefaultStoreFactory::on_disk(base_dir));
                let multi_store = create_multi_store(&store_config.root_store, factory)?;
                multi_store.load()?;
                builder.with_multi_store(Arc::new(multi_store))
            }
            None => {
                let factory: Arc<dyn StoreFactory> =
                    Arc::new(DefaultStoreFactory::in_memory(DEFAULT_DATA_DIR));
                builder.with_multi_store(Arc::new(create_multi_store(&store_config.root_store, factory)?))
            }
        };
        Ok(builder.with_configuration(configuration).build())
    }

    pub async fn status(&self) -> SystemStatus {
        *self.status.read().await
    }

    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    pub fn component_registrar(&self) -> &Arc<ComponentRegistrar> {
        &self.registrar
    }

    pub fn plugin_manager(&self) -> &Arc<PluginManager> {
        &self.plugin_manager
    }

    pub fn multi_store(&self) -> &Arc<MultiStore> {
        &self.multi_store
    }

    pub fn event_bus(&self) -> &Arc<EventBus> {
        &self.event_bus
    }

    pub fn logger(&self) -> &Arc<dyn Logger> {
        &self.logger
    }

    /// Weak handle to this kernel, as handed to components on initialize.
    pub fn handle(&self) -> Weak<System> {
        self.handle.clone()
    }

    /// Enter `Initialized` and bind the plugin manager to this kernel.
    pub async fn initialize(&self, ctx: &Context) -> Result<()> {
        let _transition = self.transition.lock().await;
        let _exclusive = self.lock.write().await;
        *self.status.write().await = SystemStatus::Initialized;
        self.plugin_manager.initialize(ctx, &self.handle).await?;
        self.logger.log(LogLevel::Debug, "System initialized");
        Ok(())
    }

    /// Start all plugins and enter `Started`.
    ///
    /// Requires `Initialized`. If any plugin fails to start the error is
    /// returned and the status does not change.
    pub async fn start(&self, ctx: &Context) -> Result<()> {
        let _transition = self.transition.lock().await;
        let _shared = self.lock.read().await;
        let status = self.status().await;
        if status != SystemStatus::Initialized {
            return Err(Error::NotInitialized { status });
        }

        if let Err(e) = self.plugin_manager.start_plugins(ctx).await {
            self.logger
                .logf(LogLevel::Error, format_args!("Error starting plugins: {}", e));
            return Err(e);
        }

        *self.status.write().await = SystemStatus::Started;
        self.logger.log(LogLevel::Info, "System started");
        Ok(())
    }

    /// Stop every registered service and enter `Stopped`.
    ///
    /// Requires `Started`. Services that fail to stop are logged and skipped;
    /// the call still succeeds. Plugins are not stopped here.
    pub async fn stop(&self, ctx: &Context) -> Result<()> {
        self.stop_with_report(ctx).await.map(|_| ())
    }

    /// [`System::stop`], also returning the services that failed to stop.
    pub async fn stop_with_report(&self, ctx: &Context) -> Result<Vec<ServiceFailure>> {
        let _transition = self.transition.lock().await;
        let _shared = self.lock.read().await;
        let status = self.status().await;
        if status != SystemStatus::Started {
            return Err(Error::NotStarted { status });
        }

        let mut services = self
            .registrar
            .get_components_by_type(ComponentType::Service)
            .await;
        services.sort_by(|a, b| a.id().cmp(b.id()));

        let mut failures = Vec::new();
        for component in services {
            let Some(service) = component.as_service() else {
                return Err(Error::CapabilityMismatch {
                    component_id: component.id().to_string(),
                    expected: Capability::Service,
                });
            };
            if let Err(error) = service.stop(ctx).await {
                self.logger.logf(
                    LogLevel::Error,
                    format_args!("Error stopping service '{}': {}", component.id(), error),
                );
                failures.push(ServiceFailure {
                    service_id: component.id().to_string(),
                    error,
                });
            }
        }

        *self.status.write().await = SystemStatus::Stopped;
        self.logger.log(LogLevel::Info, "System stopped");
        Ok(failures)
    }

    /// Run the operation registered under `operation_id`.
    pub async fn execute_operation(
        &self,
        ctx: &Context,
        operation_id: &str,
        input: OperationInput,
    ) -> Result<OperationOutput> {
        let _shared = self.lock.read().await;
        let component = self.registrar.get_component(operation_id).await?;
        let operation = component.as_operation().ok_or_else(|| Error::CapabilityMismatch {
            component_id: operation_id.to_string(),
            expected: Capability::Operation,
        })?;
        operation.execute(ctx, input).await
    }

    pub async fn start_service(&self, ctx: &Context, service_id: &str) -> Result<()> {
        let _shared = self.lock.read().await;
        let component = self.service_component(service_id).await?;
        let service = as_service(&component, service_id)?;
        service.start(ctx).await?;
        self.logger
            .logf(LogLevel::Debug, format_args!("Started service '{}'", service_id));
        Ok(())
    }

    pub async fn stop_service(&self, ctx: &Context, service_id: &str) -> Result<()> {
        let _shared = self.lock.read().await;
        let component = self.service_component(service_id).await?;
        let service = as_service(&component, service_id)?;
        service.stop(ctx).await?;
        self.logger
            .logf(LogLevel::Debug, format_args!("Stopped service '{}'", service_id));
        Ok(())
    }

    /// Stop then start a service. If stopping fails the service is not started.
    pub async fn restart_service(&self, ctx: &Context, service_id: &str) -> Result<()> {
        self.stop_service(ctx, service_id).await?;
        self.start_service(ctx, service_id).await
    }

    async fn service_component(&self, service_id: &str) -> Result<Arc<dyn Component>> {
        self.registrar.get_component(service_id).await
    }
}

fn as_service<'a>(
    component: &'a Arc<dyn Component>,
    service_id: &str,
) -> Result<&'a dyn Service> {
    component.as_service().ok_or_else(|| Error::CapabilityMismatch {
        component_id: service_id.to_string(),
        expected: Capability::Service,
    })
}

impl fmt::Debug for System {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("System")
            .field("configuration", &self.configuration)
            .field("multi_store", &self.multi_store)
            .finish_non_exhaustive()
    }
}

/// Assembles a [`System`] from its parts. Unset parts get defaults.
#[derive(Default)]
pub struct SystemBuilder {
    configuration: Option<Configuration>,
    registrar: Option<Arc<ComponentRegistrar>>,
    plugin_manager: Option<Arc<PluginManager>>,
    multi_store: Option<Arc<MultiStore>>,
    event_bus: Option<Arc<EventBus>>,
    logger: Option<Arc<dyn Logger>>,
}

impl SystemBuilder {
    pub fn with_configuration(mut self, configuration: Configuration) -> Self {
        self.configuration = Some(configuration);
        self
    }

    pub fn with_registrar(mut self, registrar: Arc<ComponentRegistrar>) -> Self {
        self.registrar = Some(registrar);
        self
    }

    pub fn with_plugin_manager(mut self, plugin_manager: Arc<PluginManager>) -> Self {
        self.plugin_manager = Some(plugin_manager);
        self
    }

    pub fn with_multi_store(mut self, multi_store: Arc<MultiStore>) -> Self {
        self.multi_store = Some(multi_store);
        self
    }

    pub fn with_event_bus(mut self, event_bus: Arc<EventBus>) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    pub fn with_logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn build(self) -> Arc<System> {
        let multi_store = self.multi_store.unwrap_or_else(|| Arc::new(in_memory_multi_store()));
        Arc::new_cyclic(|handle| System {
            lock: RwLock::new(()),
            transition: Mutex::new(()),
            status: RwLock::new(SystemStatus::Stopped),
            configuration: self.configuration.unwrap_or_default(),
            registrar: self.registrar.unwrap_or_default(),
            plugin_manager: self.plugin_manager.unwrap_or_default(),
            multi_store,
            event_bus: self.event_bus.unwrap_or_default(),
            logger: self
                .logger
                .unwrap_or_else(|| Arc::new(LogFacadeLogger::default())),
            handle: handle.clone(),
        })
    }
}

fn in_memory_multi_store() -> MultiStore {
    let factory = DefaultStoreFactory::in_memory(DEFAULT_DATA_DIR);
    let (_, path): (String, PathBuf) =
        generate_storage_info(DEFAULT_ROOT_STORE, factory.databases_dir());
    let root = Store::new(
        DEFAULT_ROOT_STORE,
        path,
        Box::new(SnapshotDatabase::in_memory(DEFAULT_ROOT_STORE)),
    );
    MultiStore::new(Arc::new(root), Arc::new(factory))
}
