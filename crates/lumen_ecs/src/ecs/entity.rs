//! # Entity Management
//!
//! Entities are lightweight identifiers consisting of:
//! - An index into component storage and the presence matrix
//! - A generation counter for detecting stale references
//!
//! The allocator hands out indices from a monotonic counter. Under
//! [`IdPolicy::Recycle`] destroyed indices are reused with a bumped
//! generation; under [`IdPolicy::Monotonic`] they are retired for good.
//! An index whose generation reaches `u32::MAX` is retired under either
//! policy, so a stale identifier can never match a later entity.

use std::fmt;

use tracing::{debug, warn};

use crate::config::IdPolicy;
use crate::error::{EcsError, EcsResult};

/// Unique identifier for an entity.
///
/// The ID is split into two parts:
/// - Lower 32 bits: Index into component storage
/// - Upper 32 bits: Generation counter for detecting stale references
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct EntityId(u64);

impl EntityId {
    /// Creates a new entity ID from index and generation.
    ///
    /// # Arguments
    ///
    /// * `index` - The index into component storage (0 to 2^32-1)
    /// * `generation` - The generation counter (0 to 2^32-1)
    #[inline]
    #[must_use]
    pub const fn new(index: u32, generation: u32) -> Self {
        Self(((generation as u64) << 32) | (index as u64))
    }

    /// Returns the index portion of the entity ID.
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0 as u32
    }

    /// Returns the generation portion of the entity ID.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        (self.0 >> 32) as u32
    }

    /// Null/invalid entity ID.
    pub const NULL: Self = Self(u64::MAX);

    /// Checks if this entity ID is null/invalid.
    #[inline]
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.0 == u64::MAX
    }

    /// Returns the packed 64-bit representation.
    #[inline]
    #[must_use]
    pub const fn to_bits(self) -> u64 {
        self.0
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::NULL
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            f.write_str("null")
        } else {
            write!(f, "{}v{}", self.index(), self.generation())
        }
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({self})")
    }
}

/// State of one issued entity index.
#[derive(Clone, Copy, Debug)]
struct EntitySlot {
    /// Generation of the most recent entity stored at this index.
    generation: u32,
    /// Whether the entity at this index is currently alive.
    alive: bool,
}

/// Issues and retires entity identifiers.
///
/// Indices are issued in increasing order from `0` up to the fixed capacity.
/// `issued()` is the high-water mark: every index below it has been handed
/// out at least once, none above it ever has.
#[derive(Debug)]
pub struct EntityAllocator {
    /// One slot per issued index.
    slots: Vec<EntitySlot>,
    /// Retired indices available for reuse (Recycle policy only).
    free_indices: Vec<u32>,
    /// Number of currently alive entities.
    alive_count: usize,
    /// Maximum number of indices.
    capacity: usize,
    /// Reuse policy.
    policy: IdPolicy,
}

impl EntityAllocator {
    /// Creates an allocator for at most `capacity` entity indices.
    ///
    /// `capacity` must not exceed `u32::MAX`; the registry config validates this.
    #[must_use]
    pub fn new(capacity: usize, policy: IdPolicy) -> Self {
        Self {
            slots: Vec::new(),
            free_indices: Vec::new(),
            alive_count: 0,
            capacity,
            policy,
        }
    }

    /// Returns the maximum number of entity indices.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the number of indices issued so far.
    #[inline]
    #[must_use]
    pub fn issued(&self) -> usize {
        self.slots.len()
    }

    /// Returns the number of currently alive entities.
    #[inline]
    #[must_use]
    pub const fn alive_count(&self) -> usize {
        self.alive_count
    }

    /// Allocates a new entity identifier.
    ///
    /// # Errors
    ///
    /// [`EcsError::CapacityExceeded`] when no index is available. The
    /// allocator is unchanged in that case.
    pub fn allocate(&mut self) -> EcsResult<EntityId> {
        if let Some(index) = self.free_indices.pop() {
            let slot = &mut self.slots[index as usize];
            // Free indices always have a generation below `u32::MAX`.
            slot.generation += 1;
            slot.alive = true;
            self.alive_count += 1;

            let id = EntityId::new(index, slot.generation);
            debug!(entity = %id, "recycled entity index");
            return Ok(id);
        }

        if self.slots.len() >= self.capacity {
            warn!(capacity = self.capacity, "entity capacity exhausted");
            return Err(EcsError::CapacityExceeded {
                capacity: self.capacity,
            });
        }

        let index = self.slots.len() as u32;
        self.slots.push(EntitySlot {
            generation: 0,
            alive: true,
        });
        self.alive_count += 1;

        Ok(EntityId::new(index, 0))
    }

    /// Checks if an entity is alive.
    #[inline]
    #[must_use]
    pub fn is_alive(&self, id: EntityId) -> bool {
        if id.is_null() {
            return false;
        }
        self.slots
            .get(id.index() as usize)
            .is_some_and(|slot| slot.alive && slot.generation == id.generation())
    }

    /// Returns the live identifier stored at `index`, if any.
    #[inline]
    #[must_use]
    pub fn live_id_at(&self, index: usize) -> Option<EntityId> {
        let slot = self.slots.get(index)?;
        slot.alive
            .then(|| EntityId::new(index as u32, slot.generation))
    }

    /// Retires an entity identifier.
    ///
    /// Under [`IdPolicy::Recycle`] the index becomes reusable unless its
    /// generation is exhausted.
    ///
    /// # Errors
    ///
    /// [`EcsError::InvalidEntity`] if `id` is not alive.
    pub fn release(&mut self, id: EntityId) -> EcsResult<()> {
        if !self.is_alive(id) {
            return Err(EcsError::InvalidEntity(id));
        }

        self.slots[id.index() as usize].alive = false;
        self.alive_count -= 1;

        if self.policy == IdPolicy::Recycle {
            if id.generation() == u32::MAX {
                warn!(entity = %id, "entity index retired, generation exhausted");
            } else {
                self.free_indices.push(id.index());
            }
        }
        Ok(())
    }

    /// Iterates over all alive entity identifiers in ascending index order.
    pub fn iter_alive(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.alive)
            .map(|(index, slot)| EntityId::new(index as u32, slot.generation))
    }
}
