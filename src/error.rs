//! Error types for PetalSonic Router

use crate::backend::BackendError;
use crate::ids::{ControllerId, EntityId};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RouterError {
    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Listener {0} is not registered")]
    UnregisteredListener(EntityId),

    #[error("Entity {0} has no audio emitter attached")]
    UnknownEmitter(EntityId),

    #[error("Emitter {entity} has no sound named '{name}'")]
    UnknownSound { entity: EntityId, name: String },

    #[error("Sound controller {0} not found")]
    UnknownController(ControllerId),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Command queue error: {0}")]
    CommandQueue(String),

    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),
}

pub type Result<T> = std::result::Result<T, RouterError>;
