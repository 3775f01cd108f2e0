//! # ECS Error Types
//!
//! All errors that can occur in the entity-component store.
//!
//! Every error is local and recoverable: a failed call never leaves the
//! registry in a partially-updated state.

use thiserror::Error;

use crate::ecs::{ComponentTypeId, EntityId};

/// Errors that can occur in the entity-component store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EcsError {
    /// The entity table is full.
    #[error("entity capacity exceeded: all {capacity} entity slots are in use")]
    CapacityExceeded {
        /// Fixed entity capacity of the registry.
        capacity: usize,
    },

    /// The component type table is full.
    #[error("too many component types: maximum is {max}")]
    TooManyTypes {
        /// Maximum number of component types.
        max: usize,
    },

    /// The entity was never created, was destroyed, or is a stale generation.
    #[error("invalid entity: {0}")]
    InvalidEntity(EntityId),

    /// The component type handle was never registered, or does not match
    /// the requested Rust type.
    #[error("invalid component type: {0}")]
    InvalidType(ComponentTypeId),

    /// The entity already owns an instance of this component type.
    #[error("entity {entity} already has component {ty}")]
    AlreadyPresent {
        /// The entity.
        entity: EntityId,
        /// The component type.
        ty: ComponentTypeId,
    },

    /// The entity does not own an instance of this component type.
    #[error("entity {entity} does not have component {ty}")]
    NotPresent {
        /// The entity.
        entity: EntityId,
        /// The component type.
        ty: ComponentTypeId,
    },

    /// Size/alignment pair cannot describe a component layout.
    #[error("invalid component layout: size {size}, align {align}")]
    InvalidLayout {
        /// Instance size in bytes.
        size: usize,
        /// Requested alignment in bytes.
        align: usize,
    },

    /// Growing a component buffer would overflow the address space.
    #[error("storage for component {ty} cannot grow to {requested} instances")]
    StorageOverflow {
        /// The component type whose storage could not grow.
        ty: ComponentTypeId,
        /// Number of instances that was requested.
        requested: usize,
    },

    /// Configuration values are out of range or could not be parsed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration file could not be read.
    #[error("cannot read configuration {path}: {message}")]
    ConfigIo {
        /// Path of the file.
        path: String,
        /// Underlying I/O error message.
        message: String,
    },
}

/// Result type for ECS operations.
pub type EcsResult<T> = Result<T, EcsError>;
