//! # Component Registry
//!
//! Maps each component type to its signature bit and owns the type's store.
//!
//! Bits are handed out in registration order starting at 0 and are never
//! reassigned. Stores live in a `Vec` indexed by that same bit, so the bit is
//! the only key anything else needs.

use std::any::TypeId;
use std::collections::HashMap;

use super::component::Component;
use super::entity::Entity;
use super::signature::{ComponentBit, MAX_COMPONENTS};
use super::storage::{AnyComponentStore, ComponentStore};
use crate::error::{EcsError, EcsResult, OrViolation};

/// Owns every component store and the type-to-bit mapping.
pub struct ComponentRegistry {
    /// Bit assigned to each registered type.
    bits: HashMap<TypeId, ComponentBit>,
    /// One store per registered type, indexed by bit.
    stores: Vec<Box<dyn AnyComponentStore>>,
    /// Type name per bit, for diagnostics.
    names: Vec<&'static str>,
}

impl ComponentRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            bits: HashMap::new(),
            stores: Vec::new(),
            names: Vec::new(),
        }
    }

    /// Number of registered types.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.stores.len()
    }

    /// True when no type is registered.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stores.is_empty()
    }

    /// Assigns `T` the next bit and creates its store.
    ///
    /// # Errors
    ///
    /// [`EcsError::DuplicateComponentType`] if `T` is already registered,
    /// [`EcsError::ComponentLimitReached`] if every bit is taken.
    pub fn try_register<T: Component>(&mut self) -> EcsResult<ComponentBit> {
        let name = std::any::type_name::<T>();
        if self.bits.contains_key(&TypeId::of::<T>()) {
            return Err(EcsError::DuplicateComponentType(name));
        }
        if self.stores.len() == MAX_COMPONENTS {
            return Err(EcsError::ComponentLimitReached(MAX_COMPONENTS));
        }

        let bit = self.stores.len();
        self.bits.insert(TypeId::of::<T>(), bit);
        self.stores.push(Box::new(ComponentStore::<T>::new()));
        self.names.push(name);

        tracing::debug!(component = name, bit, "registered component type");
        Ok(bit)
    }

    /// Assigns `T` the next bit and creates its store.
    ///
    /// # Panics
    ///
    /// Panics if `T` is already registered or every bit is taken.
    #[track_caller]
    pub fn register<T: Component>(&mut self) -> ComponentBit {
        self.try_register::<T>().or_violation()
    }

    /// Checks whether `T` is registered.
    #[inline]
    #[must_use]
    pub fn is_registered<T: Component>(&self) -> bool {
        self.bits.contains_key(&TypeId::of::<T>())
    }

    /// Looks up `T`'s bit.
    ///
    /// # Errors
    ///
    /// [`EcsError::UnregisteredComponentType`] if `T` is not registered.
    pub fn try_bit<T: Component>(&self) -> EcsResult<ComponentBit> {
        self.bits
            .get(&TypeId::of::<T>())
            .copied()
            .ok_or(EcsError::UnregisteredComponentType(
                std::any::type_name::<T>(),
            ))
    }

    /// Looks up `T`'s bit.
    ///
    /// # Panics
    ///
    /// Panics if `T` is not registered.
    #[inline]
    #[must_use]
    #[track_caller]
    pub fn bit<T: Component>(&self) -> ComponentBit {
        self.try_bit::<T>().or_violation()
    }

    /// Type name registered at `bit`.
    #[must_use]
    pub fn type_name(&self, bit: ComponentBit) -> Option<&'static str> {
        self.names.get(bit).copied()
    }

    /// Returns `T`'s store.
    ///
    /// # Panics
    ///
    /// Panics if `T` is not registered.
    #[must_use]
    #[track_caller]
    pub fn store<T: Component>(&self) -> &ComponentStore<T> {
        let bit = self.bit::<T>();
        self.stores[bit]
            .as_any()
            .downcast_ref::<ComponentStore<T>>()
            .unwrap_or_else(|| unreachable!("store at bit {bit} holds another type"))
    }

    /// Returns `T`'s store mutably.
    ///
    /// # Panics
    ///
    /// Panics if `T` is not registered.
    #[track_caller]
    pub fn store_mut<T: Component>(&mut self) -> &mut ComponentStore<T> {
        let bit = self.bit::<T>();
        self.stores[bit]
            .as_any_mut()
            .downcast_mut::<ComponentStore<T>>()
            .unwrap_or_else(|| unreachable!("store at bit {bit} holds another type"))
    }

    /// Attaches `value` to `entity`.
    ///
    /// # Panics
    ///
    /// Panics if `T` is unregistered or `entity` already has one.
    #[track_caller]
    pub fn add<T: Component>(&mut self, entity: Entity, value: T) {
        self.store_mut::<T>().insert(entity, value);
    }

    /// Detaches and returns `entity`'s `T`.
    ///
    /// # Panics
    ///
    /// Panics if `T` is unregistered or `entity` has none.
    #[track_caller]
    pub fn remove<T: Component>(&mut self, entity: Entity) -> T {
        self.store_mut::<T>().remove(entity)
    }

    /// Gets `entity`'s `T`.
    ///
    /// # Panics
    ///
    /// Panics if `T` is unregistered or `entity` has none.
    #[must_use]
    #[track_caller]
    pub fn get<T: Component>(&self, entity: Entity) -> &T {
        self.store::<T>().get(entity)
    }

    /// Gets `entity`'s `T` mutably.
    ///
    /// # Panics
    ///
    /// Panics if `T` is unregistered or `entity` has none.
    #[track_caller]
    pub fn get_mut<T: Component>(&mut self, entity: Entity) -> &mut T {
        self.store_mut::<T>().get_mut(entity)
    }

    /// Checks whether `entity` has a `T`.
    ///
    /// # Panics
    ///
    /// Panics if `T` is unregistered.
    #[must_use]
    #[track_caller]
    pub fn has<T: Component>(&self, entity: Entity) -> bool {
        self.store::<T>().has(entity)
    }

    /// Checks whether `entity` has a value in the store at `bit`.
    #[must_use]
    pub fn has_bit(&self, bit: ComponentBit, entity: Entity) -> bool {
        self.stores
            .get(bit)
            .is_some_and(|store| store.contains(entity))
    }

    /// Tells every store that `entity` is gone.
    pub fn on_entity_destroyed(&mut self, entity: Entity) {
        for store in &mut self.stores {
            store.on_entity_destroyed(entity);
        }
    }
}

impl Default for ComponentRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Health(i32);
    #[derive(Debug, PartialEq)]
    struct Armor(i32);
    #[derive(Debug, PartialEq)]
    struct Name(&'static str);

    fn e(id: u32) -> Entity {
        Entity::from_raw(id)
    }

    #[test]
    fn test_bits_follow_registration_order() {
        let mut registry = ComponentRegistry::new();
        assert_eq!(registry.register::<Health>(), 0);
        assert_eq!(registry.register::<Armor>(), 1);
        assert_eq!(registry.register::<Name>(), 2);

        for _ in 0..3 {
            assert_eq!(registry.bit::<Health>(), 0);
            assert_eq!(registry.bit::<Armor>(), 1);
            assert_eq!(registry.bit::<Name>(), 2);
        }
        assert_eq!(registry.len(), 3);
        assert!(registry.type_name(1).is_some_and(|n| n.ends_with("Armor")));
    }

    #[test]
    fn test_delegates_to_store() {
        let mut registry = ComponentRegistry::new();
        registry.register::<Health>();

        registry.add(e(1), Health(10));
        assert!(registry.has::<Health>(e(1)));
        registry.get_mut::<Health>(e(1)).0 += 5;
        assert_eq!(registry.get::<Health>(e(1)), &Health(15));
        assert_eq!(registry.remove::<Health>(e(1)), Health(15));
        assert!(!registry.has::<Health>(e(1)));
    }

    #[test]
    fn test_entity_destroyed_reaches_every_store() {
        let mut registry = ComponentRegistry::new();
        registry.register::<Health>();
        registry.register::<Armor>();
        registry.register::<Name>();

        registry.add(e(1), Health(1));
        registry.add(e(1), Name("one"));
        assert_eq!(registry.get::<Name>(e(1)).0, "one");
        registry.add(e(2), Armor(2));

        registry.on_entity_destroyed(e(1));

        assert!(!registry.has::<Health>(e(1)));
        assert!(!registry.has::<Name>(e(1)));
        assert_eq!(registry.get::<Armor>(e(2)).0, 2);
        assert!(registry.has_bit(1, e(2)));
        assert!(!registry.has_bit(7, e(2)));
        registry.store::<Health>().assert_consistent();
    }

    #[test]
    fn test_try_register_twice() {
        let mut registry = ComponentRegistry::new();
        registry.register::<Health>();
        assert!(matches!(
            registry.try_register::<Health>(),
            Err(EcsError::DuplicateComponentType(_))
        ));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_component_limit() {
        struct Slot<const N: usize>;

        macro_rules! register_slots {
            ($registry:ident; $($n:literal)*) => { $( $registry.register::<Slot<$n>>(); )* };
        }

        let mut registry = ComponentRegistry::new();
        register_slots!(registry;
            0 1 2 3 4 5 6 7 8 9 10 11 12 13 14 15 16 17 18 19 20 21 22 23 24 25 26 27 28 29 30 31
            32 33 34 35 36 37 38 39 40 41 42 43 44 45 46 47 48 49 50 51 52 53 54 55 56 57 58 59
            60 61 62 63);
        assert_eq!(registry.len(), MAX_COMPONENTS);
        assert_eq!(
            registry.try_register::<Slot<64>>(),
            Err(EcsError::ComponentLimitReached(MAX_COMPONENTS))
        );
    }

    #[test]
    #[should_panic(expected = "registered more than once")]
    fn test_register_twice_panics() {
        let mut registry = ComponentRegistry::new();
        registry.register::<Health>();
        registry.register::<Health>();
    }

    #[test]
    #[should_panic(expected = "not registered before use")]
    fn test_unregistered_access_panics() {
        let registry = ComponentRegistry::new();
        let _ = registry.has::<Health>(e(1));
    }
}
