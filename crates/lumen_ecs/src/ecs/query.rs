//! # Query Dispatch
//!
//! Visits every entity that owns a component type.
//!
//! Queries scan entity indices `0..entity_count()` in ascending order and test
//! the presence bit of each one, so the cost is proportional to the number of
//! issued entities, not to the number of owners.

use super::component::ComponentTypeId;
use super::entity::{EntityAllocator, EntityId};
use super::presence::{bit, PresenceMatrix};
use super::registry::Registry;
use super::storage::ErasedStorage;
use crate::error::EcsResult;

/// Iterator over the owners of one component type and their instance bytes.
///
/// Yields `(entity, bytes)` in ascending entity order.
pub struct Query<'a> {
    entities: &'a EntityAllocator,
    presence: &'a PresenceMatrix,
    storage: &'a dyn ErasedStorage,
    ty: ComponentTypeId,
    next: usize,
    end: usize,
}

impl<'a> Iterator for Query<'a> {
    type Item = (EntityId, &'a [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        while self.next < self.end {
            let index = self.next;
            self.next += 1;

            if !self.presence.contains(index, self.ty) {
                continue;
            }
            if let (Some(entity), Some(bytes)) =
                (self.entities.live_id_at(index), self.storage.slot(index))
            {
                return Some((entity, bytes));
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.end - self.next))
    }
}

impl Registry {
    /// Returns an iterator over the owners of `ty`.
    ///
    /// # Errors
    ///
    /// [`EcsError::InvalidType`](crate::EcsError::InvalidType) if `ty` is not
    /// registered.
    pub fn query(&self, ty: ComponentTypeId) -> EcsResult<Query<'_>> {
        let storage = self.components.storage(ty)?;
        Ok(Query {
            entities: &self.entities,
            presence: &self.presence,
            storage,
            ty,
            next: 0,
            end: self.entities.issued(),
        })
    }

    /// Invokes `visitor` once for every owner of `ty`, in ascending entity order.
    ///
    /// # Errors
    ///
    /// [`EcsError::InvalidType`](crate::EcsError::InvalidType) if `ty` is not
    /// registered. The visitor is not called in that case.
    pub fn for_each<F>(&self, ty: ComponentTypeId, mut visitor: F) -> EcsResult<()>
    where
        F: FnMut(EntityId, &[u8]),
    {
        for (entity, bytes) in self.query(ty)? {
            visitor(entity, bytes);
        }
        Ok(())
    }

    /// Like [`for_each`](Self::for_each), with mutable instance bytes.
    ///
    /// # Errors
    ///
    /// [`EcsError::InvalidType`](crate::EcsError::InvalidType) if `ty` is not
    /// registered.
    pub fn for_each_mut<F>(&mut self, ty: ComponentTypeId, mut visitor: F) -> EcsResult<()>
    where
        F: FnMut(EntityId, &mut [u8]),
    {
        let end = self.entities.issued();
        let storage = self.components.storage_mut(ty)?;

        for index in 0..end {
            if !self.presence.contains(index, ty) {
                continue;
            }
            if let (Some(entity), Some(bytes)) =
                (self.entities.live_id_at(index), storage.slot_mut(index))
            {
                visitor(entity, bytes);
            }
        }
        Ok(())
    }

    /// Iterates over the entities that own every type in `types`, ascending.
    ///
    /// An empty list matches every alive entity.
    ///
    /// # Errors
    ///
    /// [`EcsError::InvalidType`](crate::EcsError::InvalidType) for the first
    /// unregistered type in `types`.
    pub fn entities_with(
        &self,
        types: &[ComponentTypeId],
    ) -> EcsResult<impl Iterator<Item = EntityId> + '_> {
        let mut mask = 0u64;
        for &ty in types {
            self.components.info(ty)?;
            mask |= bit(ty);
        }

        Ok(self
            .presence
            .iter_matching(mask, self.entities.issued())
            .filter_map(|index| self.entities.live_id_at(index)))
    }

    /// Counts the owners of `ty`.
    ///
    /// # Errors
    ///
    /// [`EcsError::InvalidType`](crate::EcsError::InvalidType) if `ty` is not
    /// registered.
    pub fn count(&self, ty: ComponentTypeId) -> EcsResult<usize> {
        Ok(self.query(ty)?.count())
    }
}

#[cfg(test)]
mod tests {
    use crate::config::RegistryConfig;
    use crate::ecs::{ComponentTypeId, EntityId, Registry};
    use crate::error::EcsError;

    #[test]
    fn test_for_each_visits_owners_in_order() {
        let mut registry = Registry::new(RegistryConfig::default().with_max_entities(16)).unwrap();
        let ty = registry.register_component(1).unwrap();
        let entities: Vec<_> = (0..10).map(|_| registry.create_entity().unwrap()).collect();

        for &index in &[7usize, 2, 9, 4] {
            registry.attach(entities[index], ty).unwrap()[0] = index as u8;
        }
        registry.detach(entities[9], ty).unwrap();

        let mut visited = Vec::new();
        registry
            .for_each(ty, |entity, bytes| visited.push((entity.index(), bytes[0])))
            .unwrap();
        assert_eq!(visited, vec![(2, 2), (4, 4), (7, 7)]);
        assert_eq!(registry.count(ty), Ok(3));
    }

    #[test]
    fn test_for_each_mut_writes_through() {
        let mut registry = Registry::default();
        let ty = registry.register_component(4).unwrap();
        let a = registry.create_entity().unwrap();
        let b = registry.create_entity().unwrap();
        registry.attach(a, ty).unwrap();
        registry.attach(b, ty).unwrap();

        registry
            .for_each_mut(ty, |entity, bytes| {
                bytes.copy_from_slice(&(entity.index() + 10).to_le_bytes());
            })
            .unwrap();

        assert_eq!(registry.get(a, ty).unwrap().unwrap(), &10u32.to_le_bytes());
        assert_eq!(registry.get(b, ty).unwrap().unwrap(), &11u32.to_le_bytes());
    }

    #[test]
    fn test_destroyed_entities_are_skipped() {
        let mut registry = Registry::default();
        let ty = registry.register_component(2).unwrap();
        let a = registry.create_entity().unwrap();
        let b = registry.create_entity().unwrap();
        registry.attach(a, ty).unwrap();
        registry.attach(b, ty).unwrap();
        registry.destroy_entity(a).unwrap();

        let owners: Vec<EntityId> = registry.query(ty).unwrap().map(|(e, _)| e).collect();
        assert_eq!(owners, vec![b]);
    }

    #[test]
    fn test_unknown_type_never_calls_visitor() {
        let registry = Registry::default();
        let unknown = ComponentTypeId::new(0);
        let mut called = false;

        let result = registry.for_each(unknown, |_, _| called = true);
        assert_eq!(result, Err(EcsError::InvalidType(unknown)));
        assert!(!called);
    }

    #[test]
    fn test_entities_with_all_types() {
        let mut registry = Registry::default();
        let a = registry.register_component(4).unwrap();
        let b = registry.register_component(4).unwrap();
        let e0 = registry.create_entity().unwrap();
        let e1 = registry.create_entity().unwrap();
        let e2 = registry.create_entity().unwrap();

        registry.attach(e0, a).unwrap();
        registry.attach(e1, a).unwrap();
        registry.attach(e1, b).unwrap();
        registry.attach(e2, b).unwrap();

        let both: Vec<_> = registry.entities_with(&[a, b]).unwrap().collect();
        assert_eq!(both, vec![e1]);

        let all: Vec<_> = registry.entities_with(&[]).unwrap().collect();
        assert_eq!(all, vec![e0, e1, e2]);

        let unknown = ComponentTypeId::new(9);
        assert!(matches!(
            registry.entities_with(&[a, unknown]),
            Err(EcsError::InvalidType(ty)) if ty == unknown
        ));
    }
}
