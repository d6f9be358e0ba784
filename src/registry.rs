//! Fixed-capacity effect table keyed by stable ids.

use core::fmt;

use heapless::Vec;

use crate::bus::{EffectCatalog, EffectIdSet};
use crate::effect::{Effect, EffectMetadata, WorkingSetPool};

/// Why an effect could not be registered or removed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryError {
    /// The id is already taken
    Duplicate(u8),
    /// The table is at capacity
    Full,
    /// No effect with this id
    NotRegistered(u8),
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Duplicate(id) => write!(f, "effect id {id} already registered"),
            Self::Full => f.write_str("effect registry is full"),
            Self::NotRegistered(id) => write!(f, "effect id {id} is not registered"),
        }
    }
}

struct Entry<E> {
    id: u8,
    name: &'static str,
    factory: fn() -> E,
    instance: E,
    available: bool,
}

/// Registered effects plus the working-set pool their instances draw from
///
/// Every entry owns one instance built by its factory at registration time.
/// The factory stays around so zones can get fresh, independent instances.
pub struct EffectRegistry<E: Effect, const N: usize> {
    entries: Vec<Entry<E>, N>,
    memory: WorkingSetPool,
}

impl<E: Effect, const N: usize> Default for EffectRegistry<E, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Effect, const N: usize> EffectRegistry<E, N> {
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
            memory: WorkingSetPool::new(),
        }
    }

    /// Add an effect under `id`
    ///
    /// Fails without touching the table on a duplicate id or when full.
    pub fn register(
        &mut self,
        id: u8,
        name: &'static str,
        factory: fn() -> E,
    ) -> Result<(), RegistryError> {
        if self.is_registered(id) {
            engine_log!("[EffectRegistry.register] duplicate id {}", id);
            return Err(RegistryError::Duplicate(id));
        }
        let entry = Entry {
            id,
            name,
            factory,
            instance: factory(),
            available: true,
        };
        self.entries.push(entry).map_err(|_| {
            engine_log!("[EffectRegistry.register] table full, dropping {}", name);
            RegistryError::Full
        })
    }

    /// Remove an effect, releasing whatever its instance holds
    pub fn unregister(&mut self, id: u8) -> Result<(), RegistryError> {
        let index = self.position(id).ok_or(RegistryError::NotRegistered(id))?;
        let mut entry = self.entries.swap_remove(index);
        entry.instance.cleanup(&mut self.memory);
        Ok(())
    }

    pub fn is_registered(&self, id: u8) -> bool {
        self.position(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    pub fn name(&self, id: u8) -> Option<&'static str> {
        self.entry(id).map(|entry| entry.name)
    }

    pub fn metadata(&self, id: u8) -> Option<EffectMetadata> {
        self.entry(id).map(|entry| entry.instance.metadata())
    }

    pub fn instance(&self, id: u8) -> Option<&E> {
        self.entry(id).map(|entry| &entry.instance)
    }

    pub fn instance_mut(&mut self, id: u8) -> Option<&mut E> {
        let index = self.position(id)?;
        Some(&mut self.entries[index].instance)
    }

    /// Shared instance for `id` together with the working-set pool
    pub fn instance_with_memory(&mut self, id: u8) -> Option<(&mut E, &mut WorkingSetPool)> {
        let index = self.position(id)?;
        Some((&mut self.entries[index].instance, &mut self.memory))
    }

    /// Build a fresh instance for `id`, independent of the shared one
    pub fn construct(&self, id: u8) -> Option<E> {
        self.entry(id).map(|entry| (entry.factory)())
    }

    /// Whether `id` is registered and has not failed to initialize
    pub fn is_available(&self, id: u8) -> bool {
        self.entry(id).is_some_and(|entry| entry.available)
    }

    /// Flag an effect whose `init` failed so it is no longer offered
    pub fn mark_unavailable(&mut self, id: u8) {
        if let Some(index) = self.position(id) {
            self.entries[index].available = false;
        }
    }

    /// Offer every registered effect again
    pub fn reset_availability(&mut self) {
        for entry in &mut self.entries {
            entry.available = true;
        }
    }

    /// Registered ids in registration order
    pub fn ids(&self) -> impl Iterator<Item = u8> + '_ {
        self.entries.iter().map(|entry| entry.id)
    }

    pub fn memory(&self) -> &WorkingSetPool {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut WorkingSetPool {
        &mut self.memory
    }

    /// Snapshot of ids and names for other tasks
    pub fn catalog(&self, palette_count: u8) -> EffectCatalog {
        let mut catalog = EffectCatalog {
            available: EffectIdSet::new(),
            names: Vec::new(),
            palette_count,
        };
        for entry in &self.entries {
            if entry.available {
                catalog.available.insert(entry.id);
            }
            // Names past the catalog size are not mirrored
            let _ = catalog.names.push((entry.id, entry.name));
        }
        catalog
    }

    fn position(&self, id: u8) -> Option<usize> {
        self.entries.iter().position(|entry| entry.id == id)
    }

    fn entry(&self, id: u8) -> Option<&Entry<E>> {
        self.entries.iter().find(|entry| entry.id == id)
    }
}
