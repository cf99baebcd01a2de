//! Core logging plugin.
//!
//! Installs the process-wide logging backend when added to a kernel: a
//! `tracing-subscriber` registry writing to stderr, with `log` records
//! bridged in through `tracing-log`. It also contributes the `log-level`
//! operation, which changes the active level at runtime.
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing_log::AsLog;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{EnvFilter, Registry, fmt as tracing_fmt, reload};

use skeleton_core::component::{BaseSystemOperation, BaseSystemService, ComponentInfo};
use skeleton_core::kernel::error::{Error as KernelError, Result as KernelResult};
use skeleton_core::kernel::{LogLevel, register_component};
use skeleton_core::{
    Component, ComponentConfig, ComponentFactory, ComponentType, Context, Operation, OperationInput,
    OperationOutput, Plugin, Service, Startable, System, SystemComponent,
};

pub const PLUGIN_ID: &str = "core-logging";
pub const LOG_LEVEL_FACTORY_ID: &str = "log-level";
pub const LOG_LEVEL_OPERATION_ID: &str = "log-level";

type FilterHandle = reload::Handle<EnvFilter, Registry>;

// Serializes backend installation with level changes across plugin instances.
static BACKEND_LOCK: Mutex<()> = Mutex::new(());

/// Settings read from the plugin's custom config.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggingConfig {
    /// Initial level. `RUST_LOG` is used when unset.
    #[serde(default)]
    pub level: Option<String>,
    /// Emit JSON lines instead of human-readable text.
    #[serde(default)]
    pub json: bool,
}

impl LoggingConfig {
    pub fn from_value(value: &Value) -> KernelResult<Self> {
        if value.is_null() {
            return Ok(Self::default());
        }
        serde_json::from_value(value.clone())
            .map_err(|e| KernelError::InvalidInput(format!("invalid logging config: {}", e)))
    }

    fn initial_filter(&self) -> KernelResult<EnvFilter> {
        match &self.level {
            Some(level) => Ok(EnvFilter::new(directive(level.parse()?))),
            None => Ok(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))),
        }
    }
}

fn directive(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Debug => "debug",
        LogLevel::Info => "info",
        LogLevel::Warn => "warn",
        LogLevel::Error | LogLevel::Fatal => "error",
    }
}

/// Shared slot for the reload handle of the installed filter.
#[derive(Clone, Default)]
struct Backend {
    handle: Arc<Mutex<Option<FilterHandle>>>,
}

impl Backend {
    fn is_installed(&self) -> bool {
        self.handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Install the global subscriber. Returns `false` if another one was
    /// already in place, in which case only the `log` max level is managed.
    fn install(&self, config: &LoggingConfig) -> KernelResult<bool> {
        let _guard = BACKEND_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
        let mut slot = self.handle.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.is_some() {
            return Ok(true);
        }

        let filter = config.initial_filter()?;
        let max_level = filter
            .max_level_hint()
            .map(|level| level.as_log())
            .unwrap_or(log::LevelFilter::Trace);
        let (filter, handle) = reload::Layer::new(filter);
        let subscriber = tracing_subscriber::registry()
            .with(filter)
            .with(config.json.then(|| tracing_fmt::layer().json().with_writer(std::io::stderr)))
            .with((!config.json).then(|| tracing_fmt::layer().with_writer(std::io::stderr)));

        if tracing::subscriber::set_global_default(subscriber).is_err() {
            log::debug!("A global tracing subscriber is already installed");
            return Ok(false);
        }
        if let Err(e) = tracing_log::LogTracer::init() {
            tracing::debug!("log records are not bridged: {}", e);
        }
        log::set_max_level(max_level);
        *slot = Some(handle);
        Ok(true)
    }

    fn set_level(&self, level: LogLevel) -> KernelResult<()> {
        let _guard = BACKEND_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
        log::set_max_level(level.into());
        let slot = self.handle.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = slot.as_ref() {
            handle
                .reload(EnvFilter::new(directive(level)))
                .map_err(|e| KernelError::Other(format!("failed to reload log filter: {}", e)))?;
        }
        Ok(())
    }
}

impl fmt::Debug for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Backend")
            .field("installed", &self.is_installed())
            .finish()
    }
}

/// Sets up application logging and exposes the `log-level` operation.
#[derive(Debug)]
pub struct LoggingPlugin {
    base: BaseSystemService,
    config: LoggingConfig,
    backend: Backend,
    started: AtomicBool,
}

impl LoggingPlugin {
    pub fn new(config: LoggingConfig) -> Self {
        Self {
            base: BaseSystemService::new(ComponentInfo::new(
                PLUGIN_ID,
                "Core Logging",
                "Installs the logging backend and the log-level operation",
            )),
            config,
            backend: Backend::default(),
            started: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &LoggingConfig {
        &self.config
    }

    /// Whether this plugin owns the process-wide subscriber.
    pub fn backend_installed(&self) -> bool {
        self.backend.is_installed()
    }

    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }
}

impl Default for LoggingPlugin {
    fn default() -> Self {
        Self::new(LoggingConfig::default())
    }
}

impl Component for LoggingPlugin {
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

impl SystemComponent for LoggingPlugin {
    fn initialize(&self, ctx: &Context, system: &Weak<System>) -> KernelResult<()> {
        self.base.initialize(ctx, system)
    }
}

#[async_trait]
impl Startable for LoggingPlugin {
    async fn start(&self, _ctx: &Context) -> KernelResult<()> {
        self.started.store(true, Ordering::SeqCst);
        log::info!("Core Logging Plugin started");
        Ok(())
    }

    async fn stop(&self, _ctx: &Context) -> KernelResult<()> {
        log::info!("Shutting down Core Logging Plugin");
        log::logger().flush();
        self.started.store(false, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait]
impl Plugin for LoggingPlugin {
    async fn register_resources(&self, ctx: &Context) -> KernelResult<()> {
        let system = self
            .base
            .base()
            .system()
            .ok_or_else(|| KernelError::Other(format!("plugin '{}' is not bound to a system", PLUGIN_ID)))?;

        if !self.backend.install(&self.config)? {
            log::info!("Keeping the existing logging backend");
        }

        let factory = Arc::new(LogLevelFactory {
            backend: self.backend.clone(),
        });
        register_component(
            ctx,
            &system,
            &ComponentConfig::new(LOG_LEVEL_OPERATION_ID, LOG_LEVEL_FACTORY_ID)
                .with_name("Log level")
                .with_description("Changes the active log level"),
            factory,
        )
        .await?;
        log::debug!("Registered '{}' operation", LOG_LEVEL_OPERATION_ID);
        Ok(())
    }
}

struct LogLevelFactory {
    backend: Backend,
}

impl ComponentFactory for LogLevelFactory {
    fn create_component(&self, config: &ComponentConfig) -> KernelResult<Arc<dyn Component>> {
        Ok(Arc::new(LogLevelOperation {
            base: BaseSystemOperation::new(ComponentInfo::from(config)),
            backend: self.backend.clone(),
        }))
    }
}

/// Takes `{"level": "<level>"}` and returns the level now in effect.
#[derive(Debug)]
pub struct LogLevelOperation {
    base: BaseSystemOperation,
    backend: Backend,
}

impl Component for LogLevelOperation {
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
        ComponentType::Operation
    }

    fn as_system_component(&self) -> Option<&dyn SystemComponent> {
        Some(self)
    }

    fn as_operation(&self) -> Option<&dyn Operation> {
        Some(self)
    }
}

impl SystemComponent for LogLevelOperation {
    fn initialize(&self, ctx: &Context, system: &Weak<System>) -> KernelResult<()> {
        self.base.initialize(ctx, system)
    }
}

#[async_trait]
impl Operation for LogLevelOperation {
    async fn execute(&self, _ctx: &Context, input: OperationInput) -> KernelResult<OperationOutput> {
        let level: LogLevel = input
            .data
            .get("level")
            .and_then(Value::as_str)
            .ok_or_else(|| KernelError::InvalidInput("expected a string field 'level'".to_string()))?
            .parse()?;

        self.backend.set_level(level)?;
        log::info!("Log level set to {}", level);
        Ok(OperationOutput::new(json!({
            "level": level.to_string(),
            "backend": self.backend.is_installed(),
        })))
    }
}
