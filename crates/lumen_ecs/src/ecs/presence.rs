//! # Presence Matrix
//!
//! Boolean grid `[entity][component-type]` recording ownership.
//!
//! Each entity index owns one `u64` row; bit `t` is set when the entity has
//! an instance of component type `t`. The grid is pre-allocated for the full
//! entity capacity and zeroed at creation.
//!
//! ## Performance
//!
//! - Test / set / clear: O(1)
//! - Clear a row: O(1)
//! - Iterate owners of a type: O(scanned rows)

use super::component::ComponentTypeId;

/// Ownership table between entity indices and component types.
#[derive(Debug, Clone)]
pub struct PresenceMatrix {
    /// One bitmask row per entity index.
    rows: Box<[u64]>,
}

impl PresenceMatrix {
    /// Creates a zeroed matrix for `entity_capacity` rows.
    #[must_use]
    pub fn new(entity_capacity: usize) -> Self {
        Self {
            rows: vec![0u64; entity_capacity].into_boxed_slice(),
        }
    }

    /// Returns the number of rows.
    #[inline]
    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows.len()
    }

    /// Returns the bitmask row of an entity index (0 if out of range).
    #[inline]
    #[must_use]
    pub fn row(&self, entity: usize) -> u64 {
        self.rows.get(entity).copied().unwrap_or(0)
    }

    /// Checks whether `entity` owns `ty`.
    #[inline]
    #[must_use]
    pub fn contains(&self, entity: usize, ty: ComponentTypeId) -> bool {
        self.row(entity) & bit(ty) != 0
    }

    /// Sets the bit for `(entity, ty)`.
    ///
    /// Returns `true` if the bit was previously clear.
    #[inline]
    pub fn insert(&mut self, entity: usize, ty: ComponentTypeId) -> bool {
        let Some(row) = self.rows.get_mut(entity) else {
            return false;
        };
        let was_clear = *row & bit(ty) == 0;
        *row |= bit(ty);
        was_clear
    }

    /// Clears the bit for `(entity, ty)`.
    ///
    /// Returns `true` if the bit was previously set.
    #[inline]
    pub fn remove(&mut self, entity: usize, ty: ComponentTypeId) -> bool {
        let Some(row) = self.rows.get_mut(entity) else {
            return false;
        };
        let was_set = *row & bit(ty) != 0;
        *row &= !bit(ty);
        was_set
    }

    /// Clears a whole row, returning its previous mask.
    #[inline]
    pub fn clear_row(&mut self, entity: usize) -> u64 {
        self.rows.get_mut(entity).map_or(0, std::mem::take)
    }

    /// Iterates entity indices in `0..end` whose row contains every bit of
    /// `mask`, in ascending order.
    pub fn iter_matching(&self, mask: u64, end: usize) -> impl Iterator<Item = usize> + '_ {
        let end = end.min(self.rows.len());
        self.rows[..end]
            .iter()
            .enumerate()
            .filter(move |(_, row)| **row & mask == mask)
            .map(|(entity, _)| entity)
    }
}

/// Bit of a component type within a row.
#[inline]
#[must_use]
pub const fn bit(ty: ComponentTypeId) -> u64 {
    1u64 << ty.index()
}

/// Iterator over the component types set in a row, lowest first.
pub struct RowTypes {
    remaining: u64,
}

impl RowTypes {
    /// Creates an iterator over the set bits of `row`.
    #[inline]
    #[must_use]
    pub const fn new(row: u64) -> Self {
        Self { remaining: row }
    }
}

impl Iterator for RowTypes {
    type Item = ComponentTypeId;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        // Find lowest set bit, then clear it
        let index = self.remaining.trailing_zeros();
        self.remaining &= self.remaining - 1;
        Some(ComponentTypeId::new(index as u8))
    }
}
