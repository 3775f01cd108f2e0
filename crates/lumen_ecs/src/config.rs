//! # Registry Configuration
//!
//! Capacities and policies for a [`Registry`](crate::Registry), loaded once at
//! startup from TOML or built in code.
//!
//! ```toml
//! max_entities = 1000
//! max_component_types = 32
//! initial_component_capacity = 8
//! id_policy = "monotonic"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ecs::MAX_COMPONENT_TYPES;
use crate::error::{EcsError, EcsResult};

/// Default fixed entity capacity.
pub const DEFAULT_MAX_ENTITIES: usize = 1000;

/// Default maximum number of component types.
pub const DEFAULT_MAX_COMPONENT_TYPES: usize = 32;

/// Default initial storage capacity per component type, in instances.
pub const DEFAULT_INITIAL_COMPONENT_CAPACITY: usize = 8;

/// What happens to an entity index when the entity is destroyed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdPolicy {
    /// Indices are never reissued; every creation consumes capacity for good.
    #[default]
    Monotonic,
    /// Indices are reissued with a bumped generation; stale ids are rejected.
    Recycle,
}

/// Configuration for a registry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegistryConfig {
    /// Fixed entity capacity (1 to `u32::MAX`).
    pub max_entities: usize,
    /// Maximum number of component types (1 to 64).
    pub max_component_types: usize,
    /// Initial storage capacity of each component type, in instances.
    pub initial_component_capacity: usize,
    /// Entity index reuse policy.
    pub id_policy: IdPolicy,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            max_entities: DEFAULT_MAX_ENTITIES,
            max_component_types: DEFAULT_MAX_COMPONENT_TYPES,
            initial_component_capacity: DEFAULT_INITIAL_COMPONENT_CAPACITY,
            id_policy: IdPolicy::Monotonic,
        }
    }
}

impl RegistryConfig {
    /// Parses and validates a TOML document.
    ///
    /// Missing keys take their default values.
    ///
    /// # Errors
    ///
    /// [`EcsError::InvalidConfig`] on parse errors, unknown keys, or values
    /// out of range.
    pub fn from_toml_str(source: &str) -> EcsResult<Self> {
        let config: Self =
            toml::from_str(source).map_err(|e| EcsError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// - [`EcsError::ConfigIo`] if the file cannot be read.
    /// - [`EcsError::InvalidConfig`] as for [`from_toml_str`](Self::from_toml_str).
    pub fn from_file(path: impl AsRef<Path>) -> EcsResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| EcsError::ConfigIo {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_toml_str(&source)
    }

    /// Serializes the configuration as TOML.
    ///
    /// # Errors
    ///
    /// [`EcsError::InvalidConfig`] if serialization fails.
    pub fn to_toml_string(&self) -> EcsResult<String> {
        toml::to_string(self).map_err(|e| EcsError::InvalidConfig(e.to_string()))
    }

    /// Checks that every value is in range.
    ///
    /// # Errors
    ///
    /// [`EcsError::InvalidConfig`] naming the first offending key.
    pub fn validate(&self) -> EcsResult<()> {
        if self.max_entities == 0 || self.max_entities > u32::MAX as usize {
            return Err(EcsError::InvalidConfig(format!(
                "max_entities must be between 1 and {}, got {}",
                u32::MAX,
                self.max_entities
            )));
        }
        if self.max_component_types == 0 || self.max_component_types > MAX_COMPONENT_TYPES {
            return Err(EcsError::InvalidConfig(format!(
                "max_component_types must be between 1 and {MAX_COMPONENT_TYPES}, got {}",
                self.max_component_types
            )));
        }
        if self.initial_component_capacity == 0 {
            return Err(EcsError::InvalidConfig(
                "initial_component_capacity must be at least 1".to_owned(),
            ));
        }
        Ok(())
    }

    /// Returns a copy with the given entity capacity.
    #[must_use]
    pub fn with_max_entities(mut self, max_entities: usize) -> Self {
        self.max_entities = max_entities;
        self
    }

    /// Returns a copy with the given id policy.
    #[must_use]
    pub fn with_id_policy(mut self, id_policy: IdPolicy) -> Self {
        self.id_policy = id_policy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RegistryConfig::default();
        assert_eq!(config.max_entities, 1000);
        assert_eq!(config.max_component_types, 32);
        assert_eq!(config.initial_component_capacity, 8);
        assert_eq!(config.id_policy, IdPolicy::Monotonic);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = RegistryConfig::from_toml_str("max_entities = 50\nid_policy = \"recycle\"\n")
            .unwrap();
        assert_eq!(config.max_entities, 50);
        assert_eq!(config.id_policy, IdPolicy::Recycle);
        assert_eq!(config.max_component_types, DEFAULT_MAX_COMPONENT_TYPES);
    }

    #[test]
    fn test_rejects_unknown_keys() {
        let err = RegistryConfig::from_toml_str("max_entitys = 5").unwrap_err();
        assert!(matches!(err, EcsError::InvalidConfig(_)));
    }

    #[test]
    fn test_rejects_out_of_range() {
        for source in [
            "max_entities = 0",
            "max_component_types = 65",
            "max_component_types = 0",
            "initial_component_capacity = 0",
        ] {
            let err = RegistryConfig::from_toml_str(source).unwrap_err();
            assert!(matches!(err, EcsError::InvalidConfig(_)), "{source}");
        }
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = RegistryConfig::default().with_id_policy(IdPolicy::Recycle);
        let text = config.to_toml_string().unwrap();
        assert_eq!(RegistryConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("registry.toml");
        std::fs::write(&path, "max_entities = 12\n").unwrap();

        let config = RegistryConfig::from_file(&path).unwrap();
        assert_eq!(config.max_entities, 12);

        let missing = RegistryConfig::from_file(dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(missing, EcsError::ConfigIo { .. }));
    }
}
