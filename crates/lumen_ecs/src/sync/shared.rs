use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::config::RegistryConfig;
use crate::ecs::Registry;
use crate::error::EcsResult;

/// Cloneable, thread-safe handle to a [`Registry`].
///
/// ```rust,ignore
/// let shared = SharedRegistry::new(RegistryConfig::default())?;
/// let worker = shared.clone();
/// std::thread::spawn(move || worker.with_write(|r| r.create_entity()));
/// ```
#[derive(Clone, Debug)]
pub struct SharedRegistry {
    inner: Arc<RwLock<Registry>>,
}

impl SharedRegistry {
    /// Creates a shared registry.
    ///
    /// # Errors
    ///
    /// As for [`Registry::new`].
    pub fn new(config: RegistryConfig) -> EcsResult<Self> {
        Ok(Self::from_registry(Registry::new(config)?))
    }

    /// Wraps an existing registry.
    #[must_use]
    pub fn from_registry(registry: Registry) -> Self {
        Self {
            inner: Arc::new(RwLock::new(registry)),
        }
    }

    /// Acquires shared read access.
    pub fn read(&self) -> RwLockReadGuard<'_, Registry> {
        self.inner.read()
    }

    /// Acquires exclusive write access.
    pub fn write(&self) -> RwLockWriteGuard<'_, Registry> {
        self.inner.write()
    }

    /// Runs `f` under a read lock.
    pub fn with_read<R>(&self, f: impl FnOnce(&Registry) -> R) -> R {
        f(&*self.inner.read())
    }

    /// Runs `f` under a write lock.
    pub fn with_write<R>(&self, f: impl FnOnce(&mut Registry) -> R) -> R {
        f(&mut *self.inner.write())
    }

    /// Returns the number of handles sharing this registry.
    #[must_use]
    pub fn handle_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }
}

impl Default for SharedRegistry {
    fn default() -> Self {
        Self::from_registry(Registry::default())
    }
}
