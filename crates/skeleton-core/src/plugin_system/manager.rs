use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};

use tokio::sync::RwLock;

use crate::component::traits::{Component, Startable, SystemComponent};
use crate::kernel::context::Context;
use crate::kernel::error::Result;
use crate::kernel::system::System;
use crate::plugin_system::error::{PluginFailure, PluginSystemError};
use crate::plugin_system::traits::Plugin;

#[derive(Default)]
struct PluginState {
    plugins: HashMap<String, Arc<dyn Plugin>>,
    started: bool,
}

impl PluginState {
    /// Plugins in id order so bulk passes are reproducible.
    fn sorted(&self) -> Vec<(String, Arc<dyn Plugin>)> {
        let mut plugins: Vec<(String, Arc<dyn Plugin>)> = self
            .plugins
            .iter()
            .map(|(id, plugin)| (id.clone(), Arc::clone(plugin)))
            .collect();
        plugins.sort_by(|a, b| a.0.cmp(&b.0));
        plugins
    }
}

/// Owns the registered plugins and drives their collective lifecycle.
///
/// One lock guards the plugin map and the started flag. Adding a plugin and
/// the bulk start/stop passes hold it exclusively for their whole duration,
/// so plugin callbacks must not call back into the manager.
pub struct PluginManager {
    state: RwLock<PluginState>,
    system: RwLock<Weak<System>>,
}

impl PluginManager {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(PluginState::default()),
            system: RwLock::new(Weak::new()),
        }
    }

    /// Bind the kernel plugins are initialized against. Can be called again.
    pub async fn initialize(&self, _ctx: &Context, system: &Weak<System>) -> Result<()> {
        *self.system.write().await = system.clone();
        Ok(())
    }

    /// Initialize `plugin`, let it register its resources, then keep it.
    ///
    /// Nothing is kept if either step fails.
    pub async fn add_plugin(&self, ctx: &Context, plugin: Arc<dyn Plugin>) -> Result<()> {
        let mut state = self.state.write().await;
        let plugin_id = plugin.id().to_string();
        if state.plugins.contains_key(&plugin_id) {
            return Err(PluginSystemError::AlreadyExists { plugin_id }.into());
        }

        let system = self.system.read().await.clone();
        if let Err(e) = plugin.initialize(ctx, &system) {
            log::error!("Failed to initialize plugin '{}': {}", plugin_id, e);
            return Err(PluginSystemError::InitializationError {
                plugin_id,
                source: Box::new(e),
            }
            .into());
        }

        if let Err(e) = plugin.register_resources(ctx).await {
            log::error!("Failed to register resources for plugin '{}': {}", plugin_id, e);
            return Err(PluginSystemError::ResourceRegistrationError {
                plugin_id,
                source: Box::new(e),
            }
            .into());
        }

        log::info!("Added plugin '{}'", plugin_id);
        state.plugins.insert(plugin_id, plugin);
        Ok(())
    }

    /// Forget `plugin`. The plugin is not stopped.
    pub async fn remove_plugin(&self, plugin: &dyn Plugin) -> Result<Arc<dyn Plugin>> {
        let plugin_id = plugin.id();
        let removed = self.state.write().await.plugins.remove(plugin_id);
        match removed {
            Some(removed) => {
                log::info!("Removed plugin '{}'", plugin_id);
                Ok(removed)
            }
            None => Err(PluginSystemError::NotFound {
                plugin_id: plugin_id.to_string(),
            }
            .into()),
        }
    }

    pub async fn get_plugin(&self, plugin_id: &str) -> Result<Arc<dyn Plugin>> {
        self.state
            .read()
            .await
            .plugins
            .get(plugin_id)
            .cloned()
            .ok_or_else(|| {
                PluginSystemError::NotFound {
                    plugin_id: plugin_id.to_string(),
                }
                .into()
            })
    }

    /// All plugins, ordered by id.
    pub async fn get_plugins(&self) -> Vec<Arc<dyn Plugin>> {
        self.state
            .read()
            .await
            .sorted()
            .into_iter()
            .map(|(_, plugin)| plugin)
            .collect()
    }

    pub async fn plugin_count(&self) -> usize {
        self.state.read().await.plugins.len()
    }

    pub async fn is_started(&self) -> bool {
        self.state.read().await.started
    }

    /// Start every plugin. Does nothing if the plugins are already started.
    ///
    /// Every plugin is attempted. Failures are collected into one
    /// [`PluginSystemError::StartFailed`], and the plugins count as started
    /// either way.
    pub async fn start_plugins(&self, ctx: &Context) -> Result<()> {
        let mut state = self.state.write().await;
        if state.started {
            log::debug!("Plugins already started");
            return Ok(());
        }

        let mut failures = Vec::new();
        for (plugin_id, plugin) in state.sorted() {
            match plugin.start(ctx).await {
                Ok(()) => log::debug!("Started plugin '{}'", plugin_id),
                Err(error) => {
                    log::error!("Error starting plugin '{}': {}", plugin_id, error);
                    failures.push(PluginFailure { plugin_id, error });
                }
            }
        }
        state.started = true;

        if failures.is_empty() {
            log::info!("Started {} plugins", state.plugins.len());
            Ok(())
        } else {
            Err(PluginSystemError::StartFailed { failures }.into())
        }
    }

    /// Stop every plugin. Does nothing if the plugins are not started.
    ///
    /// Mirrors [`PluginManager::start_plugins`]: every plugin is attempted and
    /// the started flag is cleared regardless of failures.
    pub async fn stop_plugins(&self, ctx: &Context) -> Result<()> {
        let mut state = self.state.write().await;
        if !state.started {
            log::debug!("Plugins not started, nothing to stop");
            return Ok(());
        }

        let mut failures = Vec::new();
        for (plugin_id, plugin) in state.sorted() {
            match plugin.stop(ctx).await {
                Ok(()) => log::debug!("Stopped plugin '{}'", plugin_id),
                Err(error) => {
                    log::error!("Error stopping plugin '{}': {}", plugin_id, error);
                    failures.push(PluginFailure { plugin_id, error });
                }
            }
        }
        state.started = false;

        if failures.is_empty() {
            log::info!("Stopped {} plugins", state.plugins.len());
            Ok(())
        } else {
            Err(PluginSystemError::StopFailed { failures }.into())
        }
    }

    /// Search the context's plugin paths for plugins. Not available yet.
    pub async fn discover_plugins(&self, _ctx: &Context) -> Result<Vec<Arc<dyn Plugin>>> {
        Err(PluginSystemError::NotImplemented {
            operation: "discover_plugins",
        }
        .into())
    }

    /// Fetch a plugin from a remote location. Not available yet.
    pub async fn load_remote_plugin(&self, _ctx: &Context, _plugin_url: &str) -> Result<Arc<dyn Plugin>> {
        Err(PluginSystemError::NotImplemented {
            operation: "load_remote_plugin",
        }
        .into())
    }
}

impl Default for PluginManager {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for PluginManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginManager").finish_non_exhaustive()
    }
}
