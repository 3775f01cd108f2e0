//! # Scene
//!
//! One registry and one input state per scene. The built-in component types
//! are registered when the scene is created, so their handles are always valid.

use bytemuck::{Pod, Zeroable};
use lumen_ecs::{Component, ComponentHandle, EntityId, Registry, RegistryConfig};
use lumen_ecs::{Position, Velocity};
use tracing::info;

use crate::error::SceneResult;
use crate::input::InputState;

/// Mesh and material a renderer draws an entity with.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
pub struct Renderable {
    /// Mesh handle.
    pub mesh: u32,
    /// Material handle.
    pub material: u32,
}

impl Component for Renderable {
    const NAME: &'static str = "Renderable";
}

/// Handles of the component types every scene registers.
#[derive(Clone, Copy, Debug)]
pub struct BuiltinComponents {
    /// World-space position.
    pub position: ComponentHandle<Position>,
    /// Linear velocity.
    pub velocity: ComponentHandle<Velocity>,
    /// Draw data.
    pub renderable: ComponentHandle<Renderable>,
}

/// A named scene.
#[derive(Debug)]
pub struct Scene {
    name: String,
    registry: Registry,
    input: InputState,
    builtins: BuiltinComponents,
}

impl Scene {
    /// Creates a scene and registers the built-in components.
    ///
    /// # Errors
    ///
    /// Fails if the configuration is invalid or has room for fewer than three
    /// component types.
    pub fn new(name: impl Into<String>, config: RegistryConfig) -> SceneResult<Self> {
        let name = name.into();
        let mut registry = Registry::new(config)?;
        let builtins = BuiltinComponents {
            position: registry.register::<Position>()?,
            velocity: registry.register::<Velocity>()?,
            renderable: registry.register::<Renderable>()?,
        };

        info!(
            scene = %name,
            capacity = registry.capacity(),
            id_policy = ?registry.config().id_policy,
            "scene created"
        );
        Ok(Self {
            name,
            registry,
            input: InputState::new(),
            builtins,
        })
    }

    /// Returns the scene name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the registry.
    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Returns the registry mutably.
    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    /// Returns the input state.
    #[must_use]
    pub fn input(&self) -> &InputState {
        &self.input
    }

    /// Returns the input state mutably.
    pub fn input_mut(&mut self) -> &mut InputState {
        &mut self.input
    }

    /// Splits the scene into its registry and input state.
    pub fn parts_mut(&mut self) -> (&mut Registry, &InputState) {
        (&mut self.registry, &self.input)
    }

    /// Returns the built-in component handles.
    #[must_use]
    pub const fn builtins(&self) -> BuiltinComponents {
        self.builtins
    }

    /// Creates an entity with no components.
    ///
    /// # Errors
    ///
    /// [`EcsError::CapacityExceeded`](lumen_ecs::EcsError::CapacityExceeded)
    /// once the scene is full.
    pub fn spawn(&mut self) -> SceneResult<EntityId> {
        Ok(self.registry.create_entity()?)
    }

    /// Creates an entity at `position`.
    ///
    /// # Errors
    ///
    /// As for [`spawn`](Self::spawn).
    pub fn spawn_at(&mut self, position: Position) -> SceneResult<EntityId> {
        let entity = self.spawn()?;
        self.registry
            .insert(entity, self.builtins.position, position)?;
        Ok(entity)
    }

    /// Creates an entity at `position` moving with `velocity`.
    ///
    /// # Errors
    ///
    /// As for [`spawn`](Self::spawn).
    pub fn spawn_moving(
        &mut self,
        position: Position,
        velocity: Velocity,
    ) -> SceneResult<EntityId> {
        let entity = self.spawn_at(position)?;
        self.registry
            .insert(entity, self.builtins.velocity, velocity)?;
        Ok(entity)
    }

    /// Destroys an entity and all of its components.
    ///
    /// # Errors
    ///
    /// [`EcsError::InvalidEntity`](lumen_ecs::EcsError::InvalidEntity) if the
    /// entity is not alive.
    pub fn despawn(&mut self, entity: EntityId) -> SceneResult<()> {
        Ok(self.registry.destroy_entity(entity)?)
    }

    /// Returns the position of an entity, if it has one.
    ///
    /// # Errors
    ///
    /// [`EcsError::InvalidEntity`](lumen_ecs::EcsError::InvalidEntity) if the
    /// entity is not alive.
    pub fn position(&self, entity: EntityId) -> SceneResult<Option<Position>> {
        Ok(self
            .registry
            .get_as(entity, self.builtins.position)?
            .copied())
    }

    /// Collects every positioned entity, ascending.
    ///
    /// # Errors
    ///
    /// Only on an internal handle mismatch.
    pub fn positions(&self) -> SceneResult<Vec<(EntityId, Position)>> {
        Ok(self
            .registry
            .query_as(self.builtins.position)?
            .map(|(entity, position)| (entity, *position))
            .collect())
    }
}
