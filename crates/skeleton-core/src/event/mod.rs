//! # Skeleton Core Event System
//!
//! Topic based publish/subscribe. Handlers receive an [`Event`] carrying the
//! topic it was published on and an arbitrary JSON payload. See [`EventBus`]
//! for the delivery modes.
pub mod bus;
pub mod error;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use bus::{EventBus, EventHandler};
pub use error::EventSystemError;

/// Identifier handed out for every subscription
pub type SubscriptionId = u64;

pub const EVENT_TYPE_DATA_EXTRACTED: &str = "data_extracted";
pub const EVENT_TYPE_DATA_TRANSFORMED: &str = "data_transformed";
pub const EVENT_TYPE_DATA_LOADED: &str = "data_loaded";

/// Something that happened, published on the topic named by `event_type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub event_type: String,
    pub data: Value,
}

impl Event {
    pub fn new(event_type: impl Into<String>, data: impl Into<Value>) -> Self {
        Self {
            event_type: event_type.into(),
            data: data.into(),
        }
    }
}
