//! End-to-end registry scenarios through the public API.

use lumen_ecs::{
    EcsError, EntityId, IdPolicy, Position, Registry, RegistryConfig, SharedRegistry, Velocity,
};

fn position_bytes(x: f32, y: f32, z: f32) -> [u8; 12] {
    let mut bytes = [0u8; 12];
    bytes[0..4].copy_from_slice(&x.to_ne_bytes());
    bytes[4..8].copy_from_slice(&y.to_ne_bytes());
    bytes[8..12].copy_from_slice(&z.to_ne_bytes());
    bytes
}

fn decode_position(bytes: &[u8]) -> (f32, f32, f32) {
    let field = |n: usize| {
        let mut raw = [0u8; 4];
        raw.copy_from_slice(&bytes[n * 4..n * 4 + 4]);
        f32::from_ne_bytes(raw)
    };
    (field(0), field(1), field(2))
}

#[test]
fn position_scenario_with_raw_bytes() {
    let mut registry = Registry::default();
    let position = registry.register_component(12).unwrap();
    let entities: Vec<EntityId> = (0..5).map(|_| registry.create_entity().unwrap()).collect();

    registry
        .attach(entities[1], position)
        .unwrap()
        .copy_from_slice(&position_bytes(1.0, 2.0, 3.0));
    registry
        .attach(entities[3], position)
        .unwrap()
        .copy_from_slice(&position_bytes(4.0, 5.0, 6.0));

    let mut visited = Vec::new();
    registry
        .for_each(position, |entity, bytes| {
            visited.push((entity.index(), decode_position(bytes)));
        })
        .unwrap();
    assert_eq!(visited, vec![(1, (1.0, 2.0, 3.0)), (3, (4.0, 5.0, 6.0))]);

    for index in [0, 2, 4] {
        assert_eq!(registry.get(entities[index], position), Ok(None));
    }
}

#[test]
fn position_scenario_with_typed_handles() {
    let mut registry = Registry::default();
    let position = registry.register::<Position>().unwrap();
    assert_eq!(registry.component_info(position.id()).unwrap().size(), 12);

    let entities: Vec<EntityId> = (0..5).map(|_| registry.create_entity().unwrap()).collect();
    registry
        .insert(entities[1], position, Position::new(1.0, 2.0, 3.0))
        .unwrap();
    registry
        .insert(entities[3], position, Position::new(4.0, 5.0, 6.0))
        .unwrap();

    let visited: Vec<(EntityId, Position)> = registry
        .query_as(position)
        .unwrap()
        .map(|(entity, p)| (entity, *p))
        .collect();
    assert_eq!(
        visited,
        vec![
            (entities[1], Position::new(1.0, 2.0, 3.0)),
            (entities[3], Position::new(4.0, 5.0, 6.0)),
        ]
    );
}

#[test]
fn capacity_exhaustion_leaves_state_unchanged() {
    let mut registry = Registry::new(RegistryConfig::default().with_max_entities(2)).unwrap();
    let first = registry.create_entity().unwrap();
    let second = registry.create_entity().unwrap();

    assert_eq!(
        registry.create_entity(),
        Err(EcsError::CapacityExceeded { capacity: 2 })
    );
    assert_eq!(registry.entity_count(), 2);
    assert_eq!(registry.entities().collect::<Vec<_>>(), vec![first, second]);
}

#[test]
fn monotonic_ids_are_never_reissued() {
    let mut registry = Registry::new(RegistryConfig::default().with_max_entities(2)).unwrap();
    let first = registry.create_entity().unwrap();
    registry.destroy_entity(first).unwrap();
    let second = registry.create_entity().unwrap();

    assert_ne!(first.index(), second.index());
    assert!(registry.create_entity().is_err());
}

#[test]
fn recycle_rejects_stale_ids() {
    let config = RegistryConfig::default()
        .with_max_entities(4)
        .with_id_policy(IdPolicy::Recycle);
    let mut registry = Registry::new(config).unwrap();
    let position = registry.register::<Position>().unwrap();
    let velocity = registry.register::<Velocity>().unwrap();

    let old = registry.create_entity().unwrap();
    registry.insert(old, position, Position::new(1.0, 1.0, 1.0)).unwrap();
    registry.insert(old, velocity, Velocity::new(1.0, 0.0, 0.0)).unwrap();
    registry.destroy_entity(old).unwrap();

    let reused = registry.create_entity().unwrap();
    assert_eq!(reused.index(), old.index());
    assert_ne!(reused, old);

    assert_eq!(registry.has(reused, position.id()), Ok(false));
    assert_eq!(registry.has(reused, velocity.id()), Ok(false));
    assert_eq!(
        registry.get_as(old, position).unwrap_err(),
        EcsError::InvalidEntity(old)
    );
    assert_eq!(registry.destroy_entity(old), Err(EcsError::InvalidEntity(old)));
}

#[test]
fn too_many_types() {
    let config = RegistryConfig {
        max_component_types: 2,
        ..RegistryConfig::default()
    };
    let mut registry = Registry::new(config).unwrap();
    registry.register_component(4).unwrap();
    registry.register_component(8).unwrap();

    assert_eq!(
        registry.register_component(16),
        Err(EcsError::TooManyTypes { max: 2 })
    );
    assert_eq!(registry.component_type_count(), 2);
}

#[test]
fn explicit_alignment_is_validated() {
    let mut registry = Registry::default();
    assert_eq!(
        registry.register_component_with_align(12, 3),
        Err(EcsError::InvalidLayout { size: 12, align: 3 })
    );
    assert_eq!(
        registry.register_component_with_align(12, 8),
        Err(EcsError::InvalidLayout { size: 12, align: 8 })
    );

    let ty = registry.register_component_with_align(32, 16).unwrap();
    let entity = registry.create_entity().unwrap();
    let slot = registry.attach(entity, ty).unwrap();
    assert_eq!(slot.as_ptr() as usize % 16, 0);
}

#[test]
fn sparse_attach_keeps_earlier_instances() {
    let mut registry = Registry::default();
    let position = registry.register::<Position>().unwrap();
    let entities: Vec<EntityId> = (0..1000).map(|_| registry.create_entity().unwrap()).collect();

    for (n, index) in [0usize, 50, 999].into_iter().enumerate() {
        let value = n as f32 + 1.0;
        registry
            .insert(entities[index], position, Position::new(value, value, value))
            .unwrap();
        assert!(registry.storage_capacity(position.id()).unwrap() > index);

        for (m, earlier) in [0usize, 50, 999].into_iter().enumerate().take(n + 1) {
            let expected = m as f32 + 1.0;
            let stored = registry.get_as(entities[earlier], position).unwrap().unwrap();
            assert_eq!(*stored, Position::new(expected, expected, expected));
        }
    }
}

#[test]
fn config_file_drives_registry() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lumen.toml");
    std::fs::write(&path, "max_entities = 3\nid_policy = \"recycle\"\n").unwrap();

    let registry = Registry::new(RegistryConfig::from_file(&path).unwrap()).unwrap();
    assert_eq!(registry.capacity(), 3);
    assert_eq!(registry.config().id_policy, IdPolicy::Recycle);
}

#[test]
fn shared_registry_round_trip() {
    let shared = SharedRegistry::default();
    let position = shared.with_write(|r| r.register::<Position>()).unwrap();

    let entity = shared
        .with_write(|r| -> Result<EntityId, EcsError> {
            let entity = r.create_entity()?;
            r.insert(entity, position, Position::new(7.0, 8.0, 9.0))?;
            Ok(entity)
        })
        .unwrap();

    let reader = shared.clone();
    let stored = std::thread::spawn(move || {
        reader.with_read(|r| r.get_as(entity, position).map(|p| p.copied()))
    })
    .join()
    .unwrap()
    .unwrap();
    assert_eq!(stored, Some(Position::new(7.0, 8.0, 9.0)));
}
