use async_trait::async_trait;

use crate::component::traits::Service;
use crate::kernel::context::Context;
use crate::kernel::error::Result;

/// A self-registering service.
///
/// When added to the [`PluginManager`](crate::plugin_system::PluginManager)
/// a plugin is first initialized against the kernel, then asked to register
/// whatever factories, components or subscriptions it contributes.
#[async_trait]
pub trait Plugin: Service {
    async fn register_resources(&self, ctx: &Context) -> Result<()>;
}
