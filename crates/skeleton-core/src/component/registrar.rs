use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::component::error::ComponentError;
use crate::component::traits::{Component, ComponentConfig, ComponentFactory, ComponentType};
use crate::kernel::error::Result;

/// Registry of component factories and the components they produced.
///
/// Factories and components live in two independently locked maps. When both
/// are needed the factory lock is taken first.
pub struct ComponentRegistrar {
    factories: RwLock<HashMap<String, Arc<dyn ComponentFactory>>>,
    components: RwLock<HashMap<String, Arc<dyn Component>>>,
}

impl ComponentRegistrar {
    pub fn new() -> Self {
        Self {
            factories: RwLock::new(HashMap::new()),
            components: RwLock::new(HashMap::new()),
        }
    }

    /// Bind `factory` to `id`. Fails if the id is already bound.
    pub async fn register_factory(&self, id: &str, factory: Arc<dyn ComponentFactory>) -> Result<()> {
        let mut factories = self.factories.write().await;
        if factories.contains_key(id) {
            return Err(ComponentError::FactoryAlreadyExists { id: id.to_string() }.into());
        }
        factories.insert(id.to_string(), factory);
        log::debug!("Registered component factory '{}'", id);
        Ok(())
    }

    /// Remove the factory bound to `id`.
    ///
    /// A component whose id equals `id` is removed as well. Components the
    /// factory created under other ids are left alone.
    pub async fn unregister_factory(&self, id: &str) -> Result<()> {
        let mut factories = self.factories.write().await;
        if factories.remove(id).is_none() {
            return Err(ComponentError::FactoryNotFound { id: id.to_string() }.into());
        }

        let mut components = self.components.write().await;
        if components.remove(id).is_some() {
            log::debug!("Removed component '{}' together with its factory", id);
        }
        log::debug!("Unregistered component factory '{}'", id);
        Ok(())
    }

    pub async fn get_factory(&self, id: &str) -> Result<Arc<dyn ComponentFactory>> {
        self.factories
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| ComponentError::FactoryNotFound { id: id.to_string() }.into())
    }

    /// All registered factories, in no particular order.
    pub async fn get_all_factories(&self) -> Vec<Arc<dyn ComponentFactory>> {
        self.factories.read().await.values().cloned().collect()
    }

    pub async fn factory_ids(&self) -> Vec<String> {
        self.factories.read().await.keys().cloned().collect()
    }

    /// Create a component through the factory named by `config.factory_id`
    /// and register it under the component's own id, replacing any previous
    /// component with that id.
    pub async fn create_component(&self, config: &ComponentConfig) -> Result<Arc<dyn Component>> {
        let factories = self.factories.read().await;
        let factory = factories
            .get(&config.factory_id)
            .ok_or_else(|| ComponentError::FactoryNotFound {
                id: config.factory_id.clone(),
            })?;

        let component = factory.create_component(config)?;

        let mut components = self.components.write().await;
        if components
            .insert(component.id().to_string(), Arc::clone(&component))
            .is_some()
        {
            log::debug!("Replaced existing component '{}'", component.id());
        }
        log::debug!(
            "Created component '{}' ({}) with factory '{}'",
            component.id(),
            component.component_type(),
            config.factory_id
        );
        Ok(component)
    }

    pub async fn get_component(&self, id: &str) -> Result<Arc<dyn Component>> {
        self.components
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| ComponentError::ComponentNotFound { id: id.to_string() }.into())
    }

    /// Components reporting `component_type`, in no particular order.
    pub async fn get_components_by_type(&self, component_type: ComponentType) -> Vec<Arc<dyn Component>> {
        self.components
            .read()
            .await
            .values()
            .filter(|component| component.component_type() == component_type)
            .cloned()
            .collect()
    }

    /// All registered components, in no particular order.
    pub async fn get_all_components(&self) -> Vec<Arc<dyn Component>> {
        self.components.read().await.values().cloned().collect()
    }

    pub async fn unregister_component(&self, id: &str) -> Result<()> {
        if self.components.write().await.remove(id).is_none() {
            return Err(ComponentError::ComponentNotFound { id: id.to_string() }.into());
        }
        log::debug!("Unregistered component '{}'", id);
        Ok(())
    }

    pub async fn factory_count(&self) -> usize {
        self.factories.read().await.len()
    }

    pub async fn component_count(&self) -> usize {
        self.components.read().await.len()
    }
}

impl Default for ComponentRegistrar {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ComponentRegistrar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentRegistrar").finish_non_exhaustive()
    }
}
