//! Container error types

use geoflux_core::ConfigError;
use thiserror::Error;

/// Container-related errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ContainerError {
    /// Invalid animation, layer or light configuration
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Layer names are unique within a container
    #[error("Layer name already in use: {0}")]
    DuplicateLayer(String),

    /// No layer with this name
    #[error("Layer not found: {0}")]
    LayerNotFound(String),
}

/// Result type for container operations
pub type Result<T> = std::result::Result<T, ContainerError>;
