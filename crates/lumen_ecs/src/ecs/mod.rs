//! # Entity Component Store
//!
//! Type-erased component storage addressed by entity index.
//!
//! ## Design
//!
//! - Entities are plain indices plus a generation, handed out by an allocator
//!   with a fixed capacity
//! - Each component type owns one byte buffer; the instance of entity `i`
//!   lives at offset `i * size`
//! - A presence matrix (one `u64` row per entity) records ownership
//! - Queries scan entity indices in ascending order
//!
//! The byte-level API works on sizes and `ComponentTypeId`s; the typed API
//! (`register::<C>`, `insert`, `get_as`, ...) layers `bytemuck` casts on top.

mod component;
mod entity;
mod presence;
mod query;
mod registry;
mod storage;
mod typed;

pub use component::{
    Component, ComponentInfo, ComponentTypeId, ComponentTypeTable, Position, Velocity,
    MAX_COMPONENT_TYPES,
};
pub use entity::{EntityAllocator, EntityId};
pub use presence::{PresenceMatrix, RowTypes};
pub use query::Query;
pub use registry::Registry;
pub use storage::{ByteStorage, ErasedStorage, TagStorage};
pub use typed::ComponentHandle;
