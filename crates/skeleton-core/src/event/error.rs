//! # Skeleton Core Event System Errors
//!
//! Errors raised by the [`EventBus`](crate::event::EventBus) when managing
//! subscriptions.
use crate::event::SubscriptionId;
use crate::kernel::error::ErrorKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EventSystemError {
    #[error("Invalid event topic: '{topic}'")]
    InvalidTopic { topic: String },

    #[error("No subscription {id} registered for topic '{topic}'")]
    SubscriptionNotFound { topic: String, id: SubscriptionId },
}

impl EventSystemError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EventSystemError::InvalidTopic { .. } => ErrorKind::InvalidInput,
            EventSystemError::SubscriptionNotFound { .. } => ErrorKind::NotFound,
        }
    }
}
