//! # Component Storage
//!
//! Dense, per-type component storage with O(1) insert, remove and lookup.
//!
//! The storage uses a packed array plus two index maps:
//! - `dense` holds the values back to back, no holes
//! - `entity_to_index` finds an entity's slot
//! - `index_to_entity` finds a slot's owner
//!
//! Removal swaps the last value into the vacated slot and pops the tail, so
//! iteration order changes across removals.

use std::any::Any;
use std::collections::HashMap;

use bytemuck::Pod;

use super::component::Component;
use super::entity::Entity;
use crate::error::{EcsError, EcsResult, OrViolation};

/// Dense storage for a single component type.
///
/// This storage guarantees:
/// - `len() == dense.len() == entity_to_index.len()`
/// - `index_to_entity[entity_to_index[e]] == e` for every stored `e`
/// - no gaps in the value array
///
/// # Example
///
/// ```rust,ignore
/// let mut storage: ComponentStore<Position> = ComponentStore::new();
/// storage.insert(e, Position { x: 1.0, y: 2.0 });
/// for pos in storage.as_slice() { /* ... */ }
/// ```
pub struct ComponentStore<T> {
    /// The packed component values.
    dense: Vec<T>,
    /// Owner of each dense slot.
    index_to_entity: Vec<Entity>,
    /// Slot of each stored entity.
    entity_to_index: HashMap<Entity, usize>,
}

impl<T: Component> ComponentStore<T> {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            dense: Vec::new(),
            index_to_entity: Vec::new(),
            entity_to_index: HashMap::new(),
        }
    }

    /// Creates an empty store with room for `capacity` values.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            dense: Vec::with_capacity(capacity),
            index_to_entity: Vec::with_capacity(capacity),
            entity_to_index: HashMap::with_capacity(capacity),
        }
    }

    /// Number of stored components.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.dense.len()
    }

    /// True when nothing is stored.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dense.is_empty()
    }

    /// Checks whether `entity` has a value here.
    #[inline]
    #[must_use]
    pub fn has(&self, entity: Entity) -> bool {
        self.entity_to_index.contains_key(&entity)
    }

    /// Appends a value for `entity`.
    ///
    /// # Errors
    ///
    /// [`EcsError::DuplicateComponent`] if `entity` already has one. The
    /// existing value is left untouched.
    pub fn try_insert(&mut self, entity: Entity, value: T) -> EcsResult<()> {
        if self.has(entity) {
            return Err(EcsError::DuplicateComponent {
                entity: entity.id(),
                component: std::any::type_name::<T>(),
            });
        }

        let index = self.dense.len();
        self.dense.push(value);
        self.index_to_entity.push(entity);
        self.entity_to_index.insert(entity, index);
        Ok(())
    }

    /// Appends a value for `entity`.
    ///
    /// # Panics
    ///
    /// Panics if `entity` already has a value.
    #[track_caller]
    pub fn insert(&mut self, entity: Entity, value: T) {
        self.try_insert(entity, value).or_violation();
    }

    /// Removes `entity`'s value with swap-and-pop and returns it.
    ///
    /// # Errors
    ///
    /// [`EcsError::MissingComponent`] if `entity` has no value.
    pub fn try_remove(&mut self, entity: Entity) -> EcsResult<T> {
        let Some(removed) = self.entity_to_index.remove(&entity) else {
            return Err(self.missing(entity));
        };

        let last = self.dense.len() - 1;
        if removed != last {
            let moved = self.index_to_entity[last];
            self.entity_to_index.insert(moved, removed);
            self.index_to_entity[removed] = moved;
        }

        self.index_to_entity.pop();
        Ok(self.dense.swap_remove(removed))
    }

    /// Removes `entity`'s value with swap-and-pop and returns it.
    ///
    /// # Panics
    ///
    /// Panics if `entity` has no value.
    #[track_caller]
    pub fn remove(&mut self, entity: Entity) -> T {
        self.try_remove(entity).or_violation()
    }

    /// Gets `entity`'s value.
    ///
    /// # Errors
    ///
    /// [`EcsError::MissingComponent`] if `entity` has no value.
    pub fn try_get(&self, entity: Entity) -> EcsResult<&T> {
        match self.entity_to_index.get(&entity) {
            Some(&index) => Ok(&self.dense[index]),
            None => Err(self.missing(entity)),
        }
    }

    /// Gets `entity`'s value mutably.
    ///
    /// # Errors
    ///
    /// [`EcsError::MissingComponent`] if `entity` has no value.
    pub fn try_get_mut(&mut self, entity: Entity) -> EcsResult<&mut T> {
        match self.entity_to_index.get(&entity) {
            Some(&index) => Ok(&mut self.dense[index]),
            None => Err(self.missing(entity)),
        }
    }

    /// Gets `entity`'s value.
    ///
    /// # Panics
    ///
    /// Panics if `entity` has no value.
    #[inline]
    #[must_use]
    #[track_caller]
    pub fn get(&self, entity: Entity) -> &T {
        self.try_get(entity).or_violation()
    }

    /// Gets `entity`'s value mutably.
    ///
    /// # Panics
    ///
    /// Panics if `entity` has no value.
    #[inline]
    #[track_caller]
    pub fn get_mut(&mut self, entity: Entity) -> &mut T {
        self.try_get_mut(entity).or_violation()
    }

    /// Dense slot currently holding `entity`'s value.
    #[inline]
    #[must_use]
    pub fn index_of(&self, entity: Entity) -> Option<usize> {
        self.entity_to_index.get(&entity).copied()
    }

    /// Owner of dense slot `index`.
    #[inline]
    #[must_use]
    pub fn entity_at(&self, index: usize) -> Option<Entity> {
        self.index_to_entity.get(index).copied()
    }

    /// Returns the packed values.
    ///
    /// Useful for batch processing.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.dense
    }

    /// Returns the packed values mutably.
    ///
    /// Useful for batch processing.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.dense
    }

    /// Owners of the packed values, slot for slot.
    #[inline]
    #[must_use]
    pub fn entities(&self) -> &[Entity] {
        &self.index_to_entity
    }

    /// Iterates `(entity, value)` pairs in dense order.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (Entity, &T)> {
        self.index_to_entity.iter().copied().zip(self.dense.iter())
    }

    /// Iterates `(entity, value)` pairs mutably in dense order.
    #[inline]
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Entity, &mut T)> {
        self.index_to_entity
            .iter()
            .copied()
            .zip(self.dense.iter_mut())
    }

    /// Removes `entity`'s value if there is one.
    pub fn on_entity_destroyed(&mut self, entity: Entity) {
        if self.has(entity) {
            drop(self.remove(entity));
        }
    }

    fn missing(&self, entity: Entity) -> EcsError {
        EcsError::MissingComponent {
            entity: entity.id(),
            component: std::any::type_name::<T>(),
        }
    }

    #[cfg(test)]
    pub(crate) fn assert_consistent(&self) {
        assert_eq!(self.dense.len(), self.entity_to_index.len());
        assert_eq!(self.dense.len(), self.index_to_entity.len());
        for (&entity, &index) in &self.entity_to_index {
            assert_eq!(self.index_to_entity[index], entity);
        }
    }
}

impl<T: Component + Pod> ComponentStore<T> {
    /// Returns the packed values as raw bytes.
    ///
    /// Zero-copy view for handing a whole column to a renderer or other
    /// byte-oriented consumer.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.dense)
    }
}

impl<T: Component> Default for ComponentStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Type-erased view of a [`ComponentStore`].
///
/// The registry keeps one per registered type and only needs to tell each of
/// them about destroyed entities; everything else goes through a downcast.
pub trait AnyComponentStore: Any {
    /// Removes the entity's value if the store has one.
    fn on_entity_destroyed(&mut self, entity: Entity);

    /// Checks whether the entity has a value here.
    fn contains(&self, entity: Entity) -> bool;

    /// Number of stored values.
    fn stored(&self) -> usize;

    /// Upcast for downcasting to the concrete store.
    fn as_any(&self) -> &dyn Any;

    /// Mutable upcast for downcasting to the concrete store.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Component> AnyComponentStore for ComponentStore<T> {
    fn on_entity_destroyed(&mut self, entity: Entity) {
        ComponentStore::on_entity_destroyed(self, entity);
    }

    fn contains(&self, entity: Entity) -> bool {
        self.has(entity)
    }

    fn stored(&self) -> usize {
        self.len()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
