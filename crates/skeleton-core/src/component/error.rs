//! # Skeleton Core Component Errors
//!
//! Errors raised by the [`ComponentRegistrar`](crate::component::ComponentRegistrar)
//! when looking up or registering factories and components.
use thiserror::Error;

use crate::kernel::error::ErrorKind;

#[derive(Debug, Error)]
pub enum ComponentError {
    #[error("Factory with ID '{id}' not found")]
    FactoryNotFound { id: String },

    #[error("Factory with ID '{id}' already exists")]
    FactoryAlreadyExists { id: String },

    #[error("Component with ID '{id}' not found")]
    ComponentNotFound { id: String },
}

impl ComponentError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ComponentError::FactoryNotFound { .. } | ComponentError::ComponentNotFound { .. } => {
                ErrorKind::NotFound
            }
            ComponentError::FactoryAlreadyExists { .. } => ErrorKind::AlreadyExists,
        }
    }
}
