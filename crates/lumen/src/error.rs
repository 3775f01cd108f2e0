//! # Scene Errors

use lumen_ecs::EcsError;
use thiserror::Error;

/// Errors raised by scenes, systems and the frame loop.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SceneError {
    /// A registry operation failed.
    #[error(transparent)]
    Ecs(#[from] EcsError),

    /// A system failed during a frame.
    #[error("system '{system}' failed in frame {frame}: {source}")]
    System {
        /// Name of the failing system.
        system: &'static str,
        /// Frame number.
        frame: u64,
        /// Underlying registry error.
        #[source]
        source: EcsError,
    },

    /// The game loop configuration is invalid.
    #[error("invalid game loop config: {0}")]
    InvalidConfig(String),

    /// A configuration file could not be read.
    #[error("failed to read config '{path}': {message}")]
    ConfigIo {
        /// Path of the file.
        path: String,
        /// Underlying I/O error message.
        message: String,
    },
}

/// Result type for scene operations.
pub type SceneResult<T> = Result<T, SceneError>;
