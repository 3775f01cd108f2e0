//! # LUMEN ECS
//!
//! A small entity-component store.
//!
//! - Entities are opaque ids issued up to a fixed capacity
//! - Component types are registered at runtime by instance size (or by Rust
//!   type through [`Component`])
//! - Each entity owns at most one instance of each type
//! - Queries visit every owner of a type in ascending entity order
//!
//! ## Example
//!
//! ```rust,ignore
//! use lumen_ecs::{Position, Registry, RegistryConfig};
//!
//! let mut registry = Registry::new(RegistryConfig::default())?;
//! let position = registry.register::<Position>()?;
//!
//! let entity = registry.create_entity()?;
//! registry.insert(entity, position, Position::new(1.0, 2.0, 3.0))?;
//!
//! registry.for_each_as(position, |entity, p| println!("{entity}: {p:?}"))?;
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod ecs;
pub mod error;
pub mod memory;
pub mod sync;

pub use config::{IdPolicy, RegistryConfig};
pub use ecs::{
    Component, ComponentHandle, ComponentInfo, ComponentTypeId, EntityId, Position, Query,
    Registry, Velocity, MAX_COMPONENT_TYPES,
};
pub use error::{EcsError, EcsResult};
pub use sync::SharedRegistry;
