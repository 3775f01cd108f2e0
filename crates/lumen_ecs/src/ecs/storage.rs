//! # Component Storage
//!
//! Type-erased, identity-addressed component storage.
//!
//! Every component type owns one storage block. An entity's instance lives at
//! byte range `[index * size, (index + 1) * size)`, where `index` is the
//! entity index. That single addressing function is used by attach, get,
//! detach and iteration alike; there is no insertion-order packing.
//!
//! - Access is O(1) via entity index
//! - Capacity doubles until it covers the highest attached index
//! - Existing bytes survive growth; new bytes are zero

use std::fmt;
use std::ops::Range;

use tracing::{debug, warn};

use super::component::ComponentTypeId;
use crate::error::{EcsError, EcsResult};
use crate::memory::AlignedBuffer;

/// Uniform interface over per-type component storage.
///
/// Implementations only deal in bytes; the typed layer casts at the boundary.
pub trait ErasedStorage: Send + Sync + fmt::Debug {
    /// Size of one instance in bytes.
    fn instance_size(&self) -> usize;

    /// Number of instances that can be addressed without growing.
    fn capacity(&self) -> usize;

    /// Grows the storage so that `index` is addressable.
    ///
    /// # Errors
    ///
    /// [`EcsError::StorageOverflow`] if the new size cannot be represented
    /// or allocated. The storage is unchanged on error.
    fn reserve(&mut self, index: usize) -> EcsResult<()>;

    /// Returns the bytes of the slot at `index`, if addressable.
    fn slot(&self, index: usize) -> Option<&[u8]>;

    /// Returns the mutable bytes of the slot at `index`, if addressable.
    fn slot_mut(&mut self, index: usize) -> Option<&mut [u8]>;

    /// Zero-fills the slot at `index` and returns it.
    fn reset_slot(&mut self, index: usize) -> Option<&mut [u8]> {
        let slot = self.slot_mut(index)?;
        slot.fill(0);
        Some(slot)
    }
}

/// Byte range of the slot at `index`.
#[inline]
fn slot_range(index: usize, instance_size: usize) -> Option<Range<usize>> {
    let start = index.checked_mul(instance_size)?;
    let end = start.checked_add(instance_size)?;
    Some(start..end)
}

/// Growable storage for a component type with a non-zero instance size.
#[derive(Debug)]
pub struct ByteStorage {
    /// Owning component type (for error reporting).
    ty: ComponentTypeId,
    /// The backing bytes, `capacity * instance_size` long.
    buffer: AlignedBuffer,
    /// Size of one instance in bytes.
    instance_size: usize,
    /// Capacity in instances.
    capacity: usize,
}

impl ByteStorage {
    /// Creates zeroed storage for `initial_capacity` instances.
    ///
    /// # Errors
    ///
    /// - [`EcsError::InvalidLayout`] if `instance_size` is zero or `align` is
    ///   not a valid alignment.
    /// - [`EcsError::StorageOverflow`] if the byte size overflows or cannot be
    ///   allocated.
    pub fn new(
        ty: ComponentTypeId,
        instance_size: usize,
        align: usize,
        initial_capacity: usize,
    ) -> EcsResult<Self> {
        if instance_size == 0 || !align.is_power_of_two() {
            return Err(EcsError::InvalidLayout {
                size: instance_size,
                align,
            });
        }
        let capacity = initial_capacity.max(1);
        let overflow = EcsError::StorageOverflow {
            ty,
            requested: capacity,
        };
        let bytes = capacity
            .checked_mul(instance_size)
            .ok_or_else(|| overflow.clone())?;
        let buffer = AlignedBuffer::zeroed(bytes, align).map_err(|err| {
            warn!(%ty, bytes, %err, "component storage allocation failed");
            overflow
        })?;

        Ok(Self {
            ty,
            buffer,
            instance_size,
            capacity,
        })
    }
}

impl ErasedStorage for ByteStorage {
    #[inline]
    fn instance_size(&self) -> usize {
        self.instance_size
    }

    #[inline]
    fn capacity(&self) -> usize {
        self.capacity
    }

    fn reserve(&mut self, index: usize) -> EcsResult<()> {
        let overflow = EcsError::StorageOverflow {
            ty: self.ty,
            requested: index.saturating_add(1),
        };
        let required = index.checked_add(1).ok_or_else(|| overflow.clone())?;
        if required <= self.capacity {
            return Ok(());
        }

        let mut new_capacity = self.capacity.max(1);
        while new_capacity < required {
            new_capacity = new_capacity.checked_mul(2).ok_or_else(|| overflow.clone())?;
        }
        let bytes = new_capacity
            .checked_mul(self.instance_size)
            .ok_or_else(|| overflow.clone())?;
        self.buffer.grow_zeroed(bytes).map_err(|err| {
            warn!(ty = %self.ty, bytes, %err, "component storage growth failed");
            overflow
        })?;

        debug!(
            ty = %self.ty,
            from = self.capacity,
            to = new_capacity,
            "component storage grown"
        );
        self.capacity = new_capacity;
        Ok(())
    }

    #[inline]
    fn slot(&self, index: usize) -> Option<&[u8]> {
        if index >= self.capacity {
            return None;
        }
        self.buffer
            .as_slice()
            .get(slot_range(index, self.instance_size)?)
    }

    #[inline]
    fn slot_mut(&mut self, index: usize) -> Option<&mut [u8]> {
        if index >= self.capacity {
            return None;
        }
        let range = slot_range(index, self.instance_size)?;
        self.buffer.as_mut_slice().get_mut(range)
    }
}

/// Storage for zero-sized (tag) components. Never allocates.
#[derive(Debug)]
pub struct TagStorage;

impl ErasedStorage for TagStorage {
    #[inline]
    fn instance_size(&self) -> usize {
        0
    }

    #[inline]
    fn capacity(&self) -> usize {
        usize::MAX
    }

    fn reserve(&mut self, _index: usize) -> EcsResult<()> {
        Ok(())
    }

    #[inline]
    fn slot(&self, _index: usize) -> Option<&[u8]> {
        Some(&[])
    }

    #[inline]
    fn slot_mut(&mut self, _index: usize) -> Option<&mut [u8]> {
        Some(&mut [])
    }
}
