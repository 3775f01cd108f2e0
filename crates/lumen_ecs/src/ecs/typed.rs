//! # Typed Component Access
//!
//! Generic wrappers over the byte-level registry API.
//!
//! A [`ComponentHandle<C>`] is obtained by registering `C`. Every typed call
//! first checks that the handle's type is the one registered under that id,
//! then views the slot bytes as `C` with `bytemuck`. Storage alignment is
//! `align_of::<C>()` and slots sit at multiples of `size_of::<C>()`, so the
//! cast cannot fail for a checked handle.

use std::fmt;
use std::marker::PhantomData;

use super::component::{Component, ComponentTypeId};
use super::entity::EntityId;
use super::registry::Registry;
use crate::error::{EcsError, EcsResult};

/// Typed handle of a registered component type.
pub struct ComponentHandle<C> {
    id: ComponentTypeId,
    _marker: PhantomData<fn() -> C>,
}

impl<C> ComponentHandle<C> {
    /// Returns the untyped handle.
    #[inline]
    #[must_use]
    pub const fn id(self) -> ComponentTypeId {
        self.id
    }
}

impl<C> Clone for ComponentHandle<C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C> Copy for ComponentHandle<C> {}

impl<C> PartialEq for ComponentHandle<C> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<C> Eq for ComponentHandle<C> {}

impl<C: Component> fmt::Debug for ComponentHandle<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComponentHandle<{}>({})", C::NAME, self.id)
    }
}

#[inline]
fn cast<C: Component>(ty: ComponentTypeId, bytes: &[u8]) -> EcsResult<&C> {
    bytemuck::try_from_bytes(bytes).map_err(|_| EcsError::InvalidType(ty))
}

#[inline]
fn cast_mut<C: Component>(ty: ComponentTypeId, bytes: &mut [u8]) -> EcsResult<&mut C> {
    bytemuck::try_from_bytes_mut(bytes).map_err(|_| EcsError::InvalidType(ty))
}

impl Registry {
    /// Registers `C` (or returns its existing handle).
    ///
    /// # Errors
    ///
    /// [`EcsError::TooManyTypes`] when the type table is full.
    pub fn register<C: Component>(&mut self) -> EcsResult<ComponentHandle<C>> {
        let id = self.components.register_typed::<C>()?;
        Ok(ComponentHandle {
            id,
            _marker: PhantomData,
        })
    }

    /// Returns the handle of `C` if it is registered.
    #[must_use]
    pub fn handle<C: Component>(&self) -> Option<ComponentHandle<C>> {
        self.components.lookup::<C>().map(|id| ComponentHandle {
            id,
            _marker: PhantomData,
        })
    }

    fn check_handle<C: Component>(&self, handle: ComponentHandle<C>) -> EcsResult<ComponentTypeId> {
        if self.components.info(handle.id)?.is::<C>() {
            Ok(handle.id)
        } else {
            Err(EcsError::InvalidType(handle.id))
        }
    }

    /// Attaches a zeroed `C` to `entity` and returns it.
    ///
    /// # Errors
    ///
    /// As for [`attach`](Self::attach); [`EcsError::InvalidType`] also covers
    /// a handle from another registry.
    pub fn attach_as<C: Component>(
        &mut self,
        entity: EntityId,
        handle: ComponentHandle<C>,
    ) -> EcsResult<&mut C> {
        let ty = self.check_handle(handle)?;
        cast_mut(ty, self.attach(entity, ty)?)
    }

    /// Attaches `value` to `entity`.
    ///
    /// # Errors
    ///
    /// As for [`attach_as`](Self::attach_as).
    pub fn insert<C: Component>(
        &mut self,
        entity: EntityId,
        handle: ComponentHandle<C>,
        value: C,
    ) -> EcsResult<&mut C> {
        let slot = self.attach_as(entity, handle)?;
        *slot = value;
        Ok(slot)
    }

    /// Returns the `C` owned by `entity`, or `None` if absent.
    ///
    /// # Errors
    ///
    /// As for [`get`](Self::get).
    pub fn get_as<C: Component>(
        &self,
        entity: EntityId,
        handle: ComponentHandle<C>,
    ) -> EcsResult<Option<&C>> {
        let ty = self.check_handle(handle)?;
        self.get(entity, ty)?.map(|bytes| cast(ty, bytes)).transpose()
    }

    /// Returns the mutable `C` owned by `entity`, or `None` if absent.
    ///
    /// # Errors
    ///
    /// As for [`get`](Self::get).
    pub fn get_as_mut<C: Component>(
        &mut self,
        entity: EntityId,
        handle: ComponentHandle<C>,
    ) -> EcsResult<Option<&mut C>> {
        let ty = self.check_handle(handle)?;
        self.get_mut(entity, ty)?
            .map(|bytes| cast_mut(ty, bytes))
            .transpose()
    }

    /// Returns an iterator over the owners of `C` and their values.
    ///
    /// # Errors
    ///
    /// [`EcsError::InvalidType`] for an unknown or mismatched handle.
    pub fn query_as<C: Component>(
        &self,
        handle: ComponentHandle<C>,
    ) -> EcsResult<impl Iterator<Item = (EntityId, &C)> + '_> {
        let ty = self.check_handle(handle)?;
        Ok(self
            .query(ty)?
            .filter_map(move |(entity, bytes)| cast::<C>(ty, bytes).ok().map(|c| (entity, c))))
    }

    /// Invokes `visitor` for every owner of `C`, in ascending entity order.
    ///
    /// # Errors
    ///
    /// [`EcsError::InvalidType`] for an unknown or mismatched handle.
    pub fn for_each_as<C, F>(&self, handle: ComponentHandle<C>, mut visitor: F) -> EcsResult<()>
    where
        C: Component,
        F: FnMut(EntityId, &C),
    {
        let ty = self.check_handle(handle)?;
        for (entity, bytes) in self.query(ty)? {
            visitor(entity, cast(ty, bytes)?);
        }
        Ok(())
    }

    /// Invokes `visitor` with a mutable `C` for every owner, ascending.
    ///
    /// # Errors
    ///
    /// [`EcsError::InvalidType`] for an unknown or mismatched handle.
    pub fn for_each_as_mut<C, F>(
        &mut self,
        handle: ComponentHandle<C>,
        mut visitor: F,
    ) -> EcsResult<()>
    where
        C: Component,
        F: FnMut(EntityId, &mut C),
    {
        let ty = self.check_handle(handle)?;
        let mut failure = None;
        self.for_each_mut(ty, |entity, bytes| {
            if failure.is_some() {
                return;
            }
            match cast_mut(ty, bytes) {
                Ok(value) => visitor(entity, value),
                Err(e) => failure = Some(e),
            }
        })?;
        failure.map_or(Ok(()), Err)
    }
}
