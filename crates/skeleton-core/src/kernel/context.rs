//! Call context threaded through every kernel operation.
//!
//! A [`Context`] carries correlation metadata only; nothing in the kernel
//! cancels work based on it. Derivation methods return a new context and
//! leave the receiver untouched.
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use serde_json::Value;

/// Key the trace id is stored under.
pub const TRACE_ID_KEY: &str = "traceID";

#[derive(Debug, Clone, Default)]
pub struct Context {
    values: Arc<HashMap<String, Value>>,
    plugin_paths: Arc<Vec<PathBuf>>,
    remote_plugin_locations: Arc<Vec<String>>,
}

impl Context {
    /// Empty root context.
    pub fn background() -> Self {
        Self::default()
    }

    /// Copy of this context with `key` bound to `value`.
    pub fn with_value(&self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let mut values = (*self.values).clone();
        values.insert(key.into(), value.into());
        Self {
            values: Arc::new(values),
            ..self.clone()
        }
    }

    pub fn value(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn with_trace_id(&self, trace_id: impl Into<String>) -> Self {
        self.with_value(TRACE_ID_KEY, trace_id.into())
    }

    pub fn trace_id(&self) -> Option<&str> {
        self.value(TRACE_ID_KEY).and_then(Value::as_str)
    }

    /// Copy of this context searching `paths` for plugins.
    pub fn with_plugin_paths<I, P>(&self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            plugin_paths: Arc::new(paths.into_iter().map(Into::into).collect()),
            ..self.clone()
        }
    }

    pub fn plugin_paths(&self) -> &[PathBuf] {
        &self.plugin_paths
    }

    /// Copy of this context with remote plugin locations (repository URLs and the like).
    pub fn with_remote_plugin_locations<I, S>(&self, locations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            remote_plugin_locations: Arc::new(locations.into_iter().map(Into::into).collect()),
            ..self.clone()
        }
    }

    pub fn remote_plugin_locations(&self) -> &[String] {
        &self.remote_plugin_locations
    }
}
