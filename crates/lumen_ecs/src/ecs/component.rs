//! # Component System
//!
//! Components are pure data containers with no behavior. The registry stores
//! them as raw bytes; the [`Component`] trait marks the Rust types that may be
//! viewed through those bytes.
//!
//! The [`ComponentTypeTable`] maps each registered type to a stable
//! [`ComponentTypeId`], its layout, and the storage block it owns.

use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;

use bytemuck::{Pod, Zeroable};
use tracing::debug;

use super::storage::{ByteStorage, ErasedStorage, TagStorage};
use crate::error::{EcsError, EcsResult};

/// Hard upper bound on component types (one bit per type in a presence row).
pub const MAX_COMPONENT_TYPES: usize = 64;

/// Largest alignment derived for byte-only registrations.
const MAX_DERIVED_ALIGN: usize = 16;

/// Marker trait for ECS components.
///
/// Components must be:
/// - `Pod`: Plain old data, any byte pattern is a valid value
/// - `Zeroable`: A freshly attached (zeroed) slot is a valid value
/// - `Send + Sync`: The registry may be shared behind a lock
///
/// # Example
///
/// ```rust,ignore
/// #[derive(Clone, Copy, Pod, Zeroable)]
/// #[repr(C)]
/// struct Health {
///     current: u32,
///     max: u32,
/// }
///
/// impl Component for Health {
///     const NAME: &'static str = "Health";
/// }
/// ```
pub trait Component: Pod + Send + Sync + 'static {
    /// Human-readable type name, used in logs.
    const NAME: &'static str;
}

/// Stable handle of a registered component type (its registration order).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct ComponentTypeId(u8);

impl ComponentTypeId {
    /// Creates a handle from a raw registration index.
    #[inline]
    #[must_use]
    pub const fn new(index: u8) -> Self {
        Self(index)
    }

    /// Returns the registration index.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ComponentTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl fmt::Debug for ComponentTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComponentTypeId({})", self.0)
    }
}

/// Registration record of a component type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ComponentInfo {
    id: ComponentTypeId,
    size: usize,
    align: usize,
    name: Option<&'static str>,
    rust_type: Option<TypeId>,
}

impl ComponentInfo {
    /// Handle of the component type.
    #[inline]
    #[must_use]
    pub const fn id(&self) -> ComponentTypeId {
        self.id
    }

    /// Size of one instance in bytes.
    #[inline]
    #[must_use]
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Alignment of every instance in bytes.
    #[inline]
    #[must_use]
    pub const fn align(&self) -> usize {
        self.align
    }

    /// Name of the Rust type, for typed registrations.
    #[inline]
    #[must_use]
    pub const fn name(&self) -> Option<&'static str> {
        self.name
    }

    /// Checks whether this type was registered as `C`.
    #[inline]
    #[must_use]
    pub fn is<C: Component>(&self) -> bool {
        self.rust_type == Some(TypeId::of::<C>())
    }
}

/// A registered type together with the storage it owns.
#[derive(Debug)]
struct ComponentEntry {
    info: ComponentInfo,
    storage: Box<dyn ErasedStorage>,
}

/// Table of registered component types.
///
/// Types are never unregistered; storage is released when the table drops.
#[derive(Debug)]
pub struct ComponentTypeTable {
    /// Entries in registration order (index == `ComponentTypeId`).
    entries: Vec<ComponentEntry>,
    /// Typed registrations, for idempotent `register::<C>()`.
    by_rust_type: HashMap<TypeId, ComponentTypeId>,
    /// Maximum number of entries.
    max_types: usize,
    /// Initial capacity (in instances) of every new storage block.
    initial_capacity: usize,
}

impl ComponentTypeTable {
    /// Creates an empty table.
    ///
    /// `max_types` is clamped to [`MAX_COMPONENT_TYPES`].
    #[must_use]
    pub fn new(max_types: usize, initial_capacity: usize) -> Self {
        let max_types = max_types.min(MAX_COMPONENT_TYPES);
        Self {
            entries: Vec::with_capacity(max_types),
            by_rust_type: HashMap::new(),
            max_types,
            initial_capacity,
        }
    }

    /// Returns the number of registered types.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Checks if no type is registered.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Alignment used when only a size is known: the largest power of two
    /// dividing `size`, capped at 16 bytes.
    #[must_use]
    pub fn derived_align(size: usize) -> usize {
        if size == 0 {
            1
        } else {
            (1usize << size.trailing_zeros()).min(MAX_DERIVED_ALIGN)
        }
    }

    /// Registers a component type with the given layout.
    ///
    /// # Errors
    ///
    /// - [`EcsError::TooManyTypes`] if the table is full.
    /// - [`EcsError::InvalidLayout`] if `align` is not a power of two or
    ///   `size` is not a multiple of `align`.
    pub fn register(&mut self, size: usize, align: usize) -> EcsResult<ComponentTypeId> {
        self.register_entry(size, align, None)
    }

    /// Registers `C`, or returns its existing handle.
    ///
    /// # Errors
    ///
    /// [`EcsError::TooManyTypes`] if `C` is new and the table is full.
    pub fn register_typed<C: Component>(&mut self) -> EcsResult<ComponentTypeId> {
        if let Some(&id) = self.by_rust_type.get(&TypeId::of::<C>()) {
            return Ok(id);
        }
        let id = self.register_entry(
            std::mem::size_of::<C>(),
            std::mem::align_of::<C>(),
            Some((TypeId::of::<C>(), C::NAME)),
        )?;
        self.by_rust_type.insert(TypeId::of::<C>(), id);
        Ok(id)
    }

    fn register_entry(
        &mut self,
        size: usize,
        align: usize,
        rust_type: Option<(TypeId, &'static str)>,
    ) -> EcsResult<ComponentTypeId> {
        if self.entries.len() >= self.max_types {
            return Err(EcsError::TooManyTypes {
                max: self.max_types,
            });
        }
        if !align.is_power_of_two() || size % align != 0 {
            return Err(EcsError::InvalidLayout { size, align });
        }

        let id = ComponentTypeId::new(self.entries.len() as u8);
        let storage: Box<dyn ErasedStorage> = if size == 0 {
            Box::new(TagStorage)
        } else {
            Box::new(ByteStorage::new(id, size, align, self.initial_capacity)?)
        };

        let info = ComponentInfo {
            id,
            size,
            align,
            name: rust_type.map(|(_, name)| name),
            rust_type: rust_type.map(|(type_id, _)| type_id),
        };
        debug!(
            ty = %id,
            size,
            align,
            name = info.name.unwrap_or("<bytes>"),
            "component type registered"
        );
        self.entries.push(ComponentEntry { info, storage });
        Ok(id)
    }

    /// Returns the handle `C` was registered under, if any.
    #[must_use]
    pub fn lookup<C: Component>(&self) -> Option<ComponentTypeId> {
        self.by_rust_type.get(&TypeId::of::<C>()).copied()
    }

    /// Returns the registration record of `ty`.
    ///
    /// # Errors
    ///
    /// [`EcsError::InvalidType`] if `ty` is not registered.
    pub fn info(&self, ty: ComponentTypeId) -> EcsResult<&ComponentInfo> {
        self.entries
            .get(ty.index())
            .map(|entry| &entry.info)
            .ok_or(EcsError::InvalidType(ty))
    }

    /// Returns the storage of `ty`.
    ///
    /// # Errors
    ///
    /// [`EcsError::InvalidType`] if `ty` is not registered.
    pub fn storage(&self, ty: ComponentTypeId) -> EcsResult<&dyn ErasedStorage> {
        self.entries
            .get(ty.index())
            .map(|entry| entry.storage.as_ref())
            .ok_or(EcsError::InvalidType(ty))
    }

    /// Returns the mutable storage of `ty`.
    ///
    /// # Errors
    ///
    /// [`EcsError::InvalidType`] if `ty` is not registered.
    pub fn storage_mut(&mut self, ty: ComponentTypeId) -> EcsResult<&mut dyn ErasedStorage> {
        match self.entries.get_mut(ty.index()) {
            Some(entry) => Ok(entry.storage.as_mut()),
            None => Err(EcsError::InvalidType(ty)),
        }
    }

    /// Iterates over all registration records in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &ComponentInfo> {
        self.entries.iter().map(|entry| &entry.info)
    }
}

/// Position component for entities.
///
/// Represents a 3D position in world space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Position {
    /// X coordinate in world space.
    pub x: f32,
    /// Y coordinate in world space.
    pub y: f32,
    /// Z coordinate in world space.
    pub z: f32,
}

impl Component for Position {
    const NAME: &'static str = "Position";
}

impl Position {
    /// Creates a new position.
    #[inline]
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// Velocity component for entities.
///
/// Represents movement speed in world units per second.
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Velocity {
    /// X velocity component.
    pub x: f32,
    /// Y velocity component.
    pub y: f32,
    /// Z velocity component.
    pub z: f32,
}

impl Component for Velocity {
    const NAME: &'static str = "Velocity";
}

impl Velocity {
    /// Creates a new velocity.
    #[inline]
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}
