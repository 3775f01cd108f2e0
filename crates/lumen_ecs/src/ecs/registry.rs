//! # Registry
//!
//! The central container for entities, component types, component storage
//! and the presence matrix.
//!
//! Every operation validates all of its inputs before mutating anything, so a
//! failed call never has an observable effect.

use tracing::{debug, trace};

use super::component::{ComponentInfo, ComponentTypeId, ComponentTypeTable};
use super::entity::{EntityAllocator, EntityId};
use super::presence::{PresenceMatrix, RowTypes};
use crate::config::RegistryConfig;
use crate::error::{EcsError, EcsResult};

/// The entity-component registry.
///
/// The presence matrix is pre-allocated for the full entity capacity. Component
/// storage grows on demand, addressed by entity index.
///
/// # Borrowing
///
/// Slots returned by [`attach`](Self::attach), [`get`](Self::get) and friends
/// borrow the registry, so they cannot outlive the next mutating call. Storage
/// growth may move a buffer; the borrow checker rules out dangling slots.
///
/// # Example
///
/// ```rust,ignore
/// let mut registry = Registry::new(RegistryConfig::default())?;
/// let position = registry.register_component(12)?;
///
/// let entity = registry.create_entity()?;
/// registry.attach(entity, position)?.copy_from_slice(&[0u8; 12]);
/// assert!(registry.get(entity, position)?.is_some());
/// ```
#[derive(Debug)]
pub struct Registry {
    /// Entity identifier allocator.
    pub(super) entities: EntityAllocator,
    /// Registered component types and their storage.
    pub(super) components: ComponentTypeTable,
    /// Ownership grid.
    pub(super) presence: PresenceMatrix,
    /// Configuration the registry was built from.
    config: RegistryConfig,
}

impl Registry {
    /// Creates a registry.
    ///
    /// # Errors
    ///
    /// [`EcsError::InvalidConfig`] if the configuration does not validate.
    pub fn new(config: RegistryConfig) -> EcsResult<Self> {
        config.validate()?;
        debug!(
            max_entities = config.max_entities,
            max_component_types = config.max_component_types,
            id_policy = ?config.id_policy,
            "registry created"
        );
        Ok(Self::from_valid(config))
    }

    fn from_valid(config: RegistryConfig) -> Self {
        Self {
            entities: EntityAllocator::new(config.max_entities, config.id_policy),
            components: ComponentTypeTable::new(
                config.max_component_types,
                config.initial_component_capacity,
            ),
            presence: PresenceMatrix::new(config.max_entities),
            config,
        }
    }

    /// Returns the configuration the registry was built from.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    // =========================================================================
    // Entities
    // =========================================================================

    /// Returns the fixed entity capacity.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.entities.capacity()
    }

    /// Returns the number of entity indices issued so far.
    ///
    /// Every live entity index is below this value; queries scan `0..entity_count()`.
    #[inline]
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entities.issued()
    }

    /// Returns the number of currently alive entities.
    #[inline]
    #[must_use]
    pub const fn alive_count(&self) -> usize {
        self.entities.alive_count()
    }

    /// Checks if an entity is alive.
    #[inline]
    #[must_use]
    pub fn is_alive(&self, entity: EntityId) -> bool {
        self.entities.is_alive(entity)
    }

    /// Iterates over all alive entities in ascending index order.
    pub fn entities(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entities.iter_alive()
    }

    /// Creates a new entity.
    ///
    /// # Errors
    ///
    /// [`EcsError::CapacityExceeded`] once the entity capacity is used up.
    pub fn create_entity(&mut self) -> EcsResult<EntityId> {
        let entity = self.entities.allocate()?;
        trace!(%entity, "entity created");
        Ok(entity)
    }

    /// Destroys an entity, detaching all of its components.
    ///
    /// # Errors
    ///
    /// [`EcsError::InvalidEntity`] if `entity` is not alive.
    pub fn destroy_entity(&mut self, entity: EntityId) -> EcsResult<()> {
        let index = self.live_index(entity)?;

        self.entities.release(entity)?;
        let detached = self.presence.clear_row(index);
        for ty in RowTypes::new(detached) {
            trace!(%entity, %ty, "component detached");
        }

        debug!(%entity, components = detached.count_ones(), "entity destroyed");
        Ok(())
    }

    fn live_index(&self, entity: EntityId) -> EcsResult<usize> {
        if self.entities.is_alive(entity) {
            Ok(entity.index() as usize)
        } else {
            Err(EcsError::InvalidEntity(entity))
        }
    }

    // =========================================================================
    // Component types
    // =========================================================================

    /// Registers a component type of `instance_size` bytes.
    ///
    /// The alignment is the largest power of two dividing the size, capped
    /// at 16 bytes.
    ///
    /// # Errors
    ///
    /// [`EcsError::TooManyTypes`] when the type table is full.
    pub fn register_component(&mut self, instance_size: usize) -> EcsResult<ComponentTypeId> {
        self.components
            .register(instance_size, ComponentTypeTable::derived_align(instance_size))
    }

    /// Registers a component type with an explicit alignment.
    ///
    /// # Errors
    ///
    /// - [`EcsError::TooManyTypes`] when the type table is full.
    /// - [`EcsError::InvalidLayout`] for a bad size/alignment pair.
    pub fn register_component_with_align(
        &mut self,
        instance_size: usize,
        align: usize,
    ) -> EcsResult<ComponentTypeId> {
        self.components.register(instance_size, align)
    }

    /// Returns the number of registered component types.
    #[inline]
    #[must_use]
    pub fn component_type_count(&self) -> usize {
        self.components.len()
    }

    /// Returns the registration record of a component type.
    ///
    /// # Errors
    ///
    /// [`EcsError::InvalidType`] if `ty` is not registered.
    pub fn component_info(&self, ty: ComponentTypeId) -> EcsResult<&ComponentInfo> {
        self.components.info(ty)
    }

    /// Iterates over all registered component types.
    pub fn component_types(&self) -> impl Iterator<Item = &ComponentInfo> {
        self.components.iter()
    }

    /// Returns the current storage capacity of a type, in instances.
    ///
    /// # Errors
    ///
    /// [`EcsError::InvalidType`] if `ty` is not registered.
    pub fn storage_capacity(&self, ty: ComponentTypeId) -> EcsResult<usize> {
        Ok(self.components.storage(ty)?.capacity())
    }

    // =========================================================================
    // Components
    // =========================================================================

    /// Attaches a zero-initialized instance of `ty` to `entity`.
    ///
    /// Returns the instance bytes for the caller to populate.
    ///
    /// # Errors
    ///
    /// Checked in this order, before any mutation:
    /// - [`EcsError::InvalidType`] if `ty` is not registered.
    /// - [`EcsError::InvalidEntity`] if `entity` is not alive.
    /// - [`EcsError::AlreadyPresent`] if the entity already owns `ty`.
    /// - [`EcsError::StorageOverflow`] if the storage cannot grow.
    pub fn attach(&mut self, entity: EntityId, ty: ComponentTypeId) -> EcsResult<&mut [u8]> {
        self.components.info(ty)?;
        let index = self.live_index(entity)?;
        if self.presence.contains(index, ty) {
            return Err(EcsError::AlreadyPresent { entity, ty });
        }

        let storage = self.components.storage_mut(ty)?;
        storage.reserve(index)?;
        let slot = storage.reset_slot(index).ok_or(EcsError::StorageOverflow {
            ty,
            requested: index + 1,
        })?;
        self.presence.insert(index, ty);

        trace!(%entity, %ty, "component attached");
        Ok(slot)
    }

    /// Returns the instance bytes of `ty` owned by `entity`.
    ///
    /// `Ok(None)` means the entity does not own `ty`; this is a normal outcome.
    ///
    /// # Errors
    ///
    /// - [`EcsError::InvalidType`] if `ty` is not registered.
    /// - [`EcsError::InvalidEntity`] if `entity` is not alive.
    pub fn get(&self, entity: EntityId, ty: ComponentTypeId) -> EcsResult<Option<&[u8]>> {
        let storage = self.components.storage(ty)?;
        let index = self.live_index(entity)?;
        if !self.presence.contains(index, ty) {
            return Ok(None);
        }
        Ok(storage.slot(index))
    }

    /// Returns the mutable instance bytes of `ty` owned by `entity`.
    ///
    /// # Errors
    ///
    /// As for [`get`](Self::get).
    pub fn get_mut(
        &mut self,
        entity: EntityId,
        ty: ComponentTypeId,
    ) -> EcsResult<Option<&mut [u8]>> {
        self.components.info(ty)?;
        let index = self.live_index(entity)?;
        if !self.presence.contains(index, ty) {
            return Ok(None);
        }
        Ok(self.components.storage_mut(ty)?.slot_mut(index))
    }

    /// Checks whether `entity` owns `ty`.
    ///
    /// # Errors
    ///
    /// As for [`get`](Self::get).
    pub fn has(&self, entity: EntityId, ty: ComponentTypeId) -> EcsResult<bool> {
        self.components.info(ty)?;
        let index = self.live_index(entity)?;
        Ok(self.presence.contains(index, ty))
    }

    /// Detaches `ty` from `entity`.
    ///
    /// Only the presence bit is cleared; the stale bytes stay in the buffer
    /// but are unreachable, and a later attach zero-fills the slot again.
    ///
    /// # Errors
    ///
    /// - [`EcsError::InvalidType`] if `ty` is not registered.
    /// - [`EcsError::InvalidEntity`] if `entity` is not alive.
    /// - [`EcsError::NotPresent`] if the entity does not own `ty`.
    pub fn detach(&mut self, entity: EntityId, ty: ComponentTypeId) -> EcsResult<()> {
        self.components.info(ty)?;
        let index = self.live_index(entity)?;
        if !self.presence.remove(index, ty) {
            return Err(EcsError::NotPresent { entity, ty });
        }

        trace!(%entity, %ty, "component detached");
        Ok(())
    }
}

impl Default for Registry {
    /// A registry with [`RegistryConfig::default`] (always valid).
    fn default() -> Self {
        Self::from_valid(RegistryConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IdPolicy;

    fn small_registry(max_entities: usize) -> Registry {
        Registry::new(RegistryConfig::default().with_max_entities(max_entities)).unwrap()
    }

    #[test]
    fn test_registry_creation() {
        let registry = Registry::default();
        assert_eq!(registry.capacity(), 1000);
        assert_eq!(registry.entity_count(), 0);
        assert_eq!(registry.alive_count(), 0);
        assert_eq!(registry.component_type_count(), 0);
    }

    #[test]
    fn test_rejects_invalid_config() {
        let err = Registry::new(RegistryConfig::default().with_max_entities(0)).unwrap_err();
        assert!(matches!(err, EcsError::InvalidConfig(_)));
    }

    #[test]
    fn test_create_until_capacity() {
        let mut registry = small_registry(3);
        for expected in 0..3 {
            let entity = registry.create_entity().unwrap();
            assert_eq!(entity.index(), expected);
            assert!((entity.index() as usize) < registry.entity_count());
        }

        assert_eq!(
            registry.create_entity(),
            Err(EcsError::CapacityExceeded { capacity: 3 })
        );
        assert_eq!(registry.entity_count(), 3);
        assert_eq!(registry.alive_count(), 3);
    }

    #[test]
    fn test_attach_get_roundtrip() {
        let mut registry = small_registry(8);
        let ty = registry.register_component(4).unwrap();
        let entity = registry.create_entity().unwrap();

        let slot = registry.attach(entity, ty).unwrap();
        assert_eq!(slot, &[0, 0, 0, 0]);
        slot.copy_from_slice(&[1, 2, 3, 4]);

        assert_eq!(registry.get(entity, ty).unwrap(), Some(&[1u8, 2, 3, 4][..]));
        registry.get_mut(entity, ty).unwrap().unwrap()[0] = 9;
        assert_eq!(registry.get(entity, ty).unwrap().unwrap()[0], 9);
    }

    #[test]
    fn test_get_before_attach_is_absent() {
        let mut registry = small_registry(8);
        let ty = registry.register_component(4).unwrap();
        let entity = registry.create_entity().unwrap();

        assert_eq!(registry.get(entity, ty), Ok(None));
        assert_eq!(registry.has(entity, ty), Ok(false));
    }

    #[test]
    fn test_double_attach_rejected() {
        let mut registry = small_registry(8);
        let ty = registry.register_component(2).unwrap();
        let entity = registry.create_entity().unwrap();

        registry.attach(entity, ty).unwrap().copy_from_slice(&[7, 7]);
        assert_eq!(
            registry.attach(entity, ty).unwrap_err(),
            EcsError::AlreadyPresent { entity, ty }
        );
        assert_eq!(registry.get(entity, ty).unwrap(), Some(&[7u8, 7][..]));
    }

    #[test]
    fn test_detach_hides_and_reattach_is_zeroed() {
        let mut registry = small_registry(8);
        let ty = registry.register_component(4).unwrap();
        let entity = registry.create_entity().unwrap();

        registry.attach(entity, ty).unwrap().fill(0xFF);
        registry.detach(entity, ty).unwrap();
        assert_eq!(registry.get(entity, ty), Ok(None));
        assert_eq!(
            registry.detach(entity, ty),
            Err(EcsError::NotPresent { entity, ty })
        );

        assert_eq!(registry.attach(entity, ty).unwrap(), &[0, 0, 0, 0]);
    }

    #[test]
    fn test_invalid_type_and_entity() {
        let mut registry = small_registry(8);
        let ty = registry.register_component(4).unwrap();
        let entity = registry.create_entity().unwrap();
        let unknown = ComponentTypeId::new(7);
        let never = EntityId::new(5, 0);

        assert_eq!(registry.attach(entity, unknown).unwrap_err(), EcsError::InvalidType(unknown));
        assert_eq!(registry.get(entity, unknown), Err(EcsError::InvalidType(unknown)));
        assert_eq!(registry.detach(entity, unknown), Err(EcsError::InvalidType(unknown)));

        assert_eq!(registry.attach(never, ty).unwrap_err(), EcsError::InvalidEntity(never));
        assert_eq!(registry.get(never, ty), Err(EcsError::InvalidEntity(never)));
        assert_eq!(
            registry.attach(EntityId::NULL, ty).unwrap_err(),
            EcsError::InvalidEntity(EntityId::NULL)
        );
    }

    #[test]
    fn test_destroy_detaches_everything() {
        let mut registry = small_registry(8);
        let a = registry.register_component(4).unwrap();
        let b = registry.register_component(8).unwrap();
        let entity = registry.create_entity().unwrap();
        registry.attach(entity, a).unwrap();
        registry.attach(entity, b).unwrap();

        registry.destroy_entity(entity).unwrap();
        assert!(!registry.is_alive(entity));
        assert_eq!(registry.presence.row(entity.index() as usize), 0);
        assert_eq!(registry.get(entity, a), Err(EcsError::InvalidEntity(entity)));
        assert_eq!(
            registry.destroy_entity(entity),
            Err(EcsError::InvalidEntity(entity))
        );

        // Monotonic: the index is not handed out again.
        let next = registry.create_entity().unwrap();
        assert_eq!(next.index(), 1);
    }

    #[test]
    fn test_recycled_index_starts_clean() {
        let config = RegistryConfig::default()
            .with_max_entities(1)
            .with_id_policy(IdPolicy::Recycle);
        let mut registry = Registry::new(config).unwrap();
        let ty = registry.register_component(4).unwrap();

        let old = registry.create_entity().unwrap();
        registry.attach(old, ty).unwrap().fill(1);
        registry.destroy_entity(old).unwrap();

        let new = registry.create_entity().unwrap();
        assert_eq!(new.index(), old.index());
        assert_eq!(registry.get(new, ty), Ok(None));
        assert_eq!(registry.get(old, ty), Err(EcsError::InvalidEntity(old)));
        assert_eq!(registry.attach(new, ty).unwrap(), &[0, 0, 0, 0]);
    }

    #[test]
    fn test_sparse_growth() {
        let mut registry = small_registry(1000);
        let ty = registry.register_component(4).unwrap();
        let entities: Vec<_> = (0..1000).map(|_| registry.create_entity().unwrap()).collect();

        for (n, &index) in [0usize, 50, 999].iter().enumerate() {
            let slot = registry.attach(entities[index], ty).unwrap();
            slot.copy_from_slice(&(n as u32 + 1).to_le_bytes());
            assert!(registry.storage_capacity(ty).unwrap() >= index + 1);
        }

        for (n, &index) in [0usize, 50, 999].iter().enumerate() {
            let bytes = registry.get(entities[index], ty).unwrap().unwrap();
            assert_eq!(bytes, &(n as u32 + 1).to_le_bytes());
        }
        assert_eq!(registry.storage_capacity(ty).unwrap(), 1024);
    }

    #[test]
    fn test_unallocatable_type_is_rejected() {
        let mut registry = small_registry(4);

        // 8 initial instances of 2^56 bytes cannot be allocated.
        let err = registry.register_component(1 << 56).unwrap_err();
        assert_eq!(
            err,
            EcsError::StorageOverflow {
                ty: ComponentTypeId::new(0),
                requested: 8
            }
        );
        assert_eq!(registry.component_type_count(), 0);

        // The failed registration consumed nothing.
        let ty = registry.register_component(4).unwrap();
        assert_eq!(ty, ComponentTypeId::new(0));
    }

    #[test]
    fn test_failed_growth_leaves_registry_intact() {
        let config = RegistryConfig {
            max_entities: 1 << 20,
            initial_component_capacity: 1,
            ..RegistryConfig::default()
        };
        let mut registry = Registry::new(config).unwrap();
        let ty = registry.register_component(1 << 28).unwrap();
        let first = registry.create_entity().unwrap();
        let mut last = first;
        while let Ok(entity) = registry.create_entity() {
            last = entity;
        }
        registry.attach(first, ty).unwrap()[0] = 9;

        // Index 2^20 - 1 needs 2^48 bytes of storage.
        let err = registry.attach(last, ty).unwrap_err();
        assert_eq!(
            err,
            EcsError::StorageOverflow {
                ty,
                requested: 1 << 20
            }
        );
        assert_eq!(registry.has(last, ty), Ok(false));
        assert_eq!(registry.storage_capacity(ty).unwrap(), 1);
        assert_eq!(registry.get(first, ty).unwrap().unwrap()[0], 9);
    }

    #[test]
    fn test_zero_sized_component() {
        let mut registry = small_registry(4);
        let tag = registry.register_component(0).unwrap();
        let entity = registry.create_entity().unwrap();

        assert!(registry.attach(entity, tag).unwrap().is_empty());
        assert_eq!(registry.has(entity, tag), Ok(true));
        assert_eq!(registry.get(entity, tag).unwrap().map(<[u8]>::len), Some(0));
    }
}
