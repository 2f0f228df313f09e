//! # Systems
//!
//! A system is an update routine plus a required [`Signature`]. The world
//! keeps, for every registered system, the set of entities whose signature
//! contains the required one, and hands that set to the system each frame.
//!
//! Systems never touch their own membership set. The world rewrites it on
//! every component add/remove and entity destroy.

use std::any::{Any, TypeId};
use std::collections::BTreeSet;
use std::fmt;
use std::marker::PhantomData;

use super::entity::Entity;
use super::signature::Signature;
use super::world::World;

/// Per-frame update logic over a set of matching entities.
///
/// `entities` is the system's membership at the moment its turn starts, in
/// ascending id order. Structural changes the system makes while running
/// (destroying entities, adding or removing components) update membership
/// immediately, but this slice stays as it was; check
/// [`World::has_component`] or [`World::is_alive`] before touching an entity
/// that an earlier step may have changed.
///
/// # Example
///
/// ```rust,ignore
/// struct Integrate;
///
/// impl System for Integrate {
///     fn update(&mut self, world: &mut World, entities: &[Entity], dt: f64) {
///         for &e in entities {
///             let v = *world.get_component::<Velocity>(e);
///             let p = world.get_component_mut::<Position>(e);
///             p.x += v.dx * dt;
///             p.y += v.dy * dt;
///         }
///     }
/// }
/// ```
pub trait System: 'static {
    /// Runs one frame of this system.
    fn update(&mut self, world: &mut World, entities: &[Entity], dt: f64);
}

/// A [`System`] backed by a function or closure.
pub struct FnSystem<F>
where
    F: FnMut(&mut World, &[Entity], f64) + 'static,
{
    f: F,
}

impl<F> FnSystem<F>
where
    F: FnMut(&mut World, &[Entity], f64) + 'static,
{
    /// Wraps `f` as a system.
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> System for FnSystem<F>
where
    F: FnMut(&mut World, &[Entity], f64) + 'static,
{
    fn update(&mut self, world: &mut World, entities: &[Entity], dt: f64) {
        (self.f)(world, entities, dt);
    }
}

/// Typed handle to a registered system.
///
/// Cheap to copy; it is just the system's position in update order.
pub struct SystemHandle<S> {
    index: usize,
    _marker: PhantomData<fn() -> S>,
}

impl<S> SystemHandle<S> {
    pub(crate) const fn new(index: usize) -> Self {
        Self {
            index,
            _marker: PhantomData,
        }
    }

    /// Position of the system in update order.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.index
    }
}

impl<S> Clone for SystemHandle<S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S> Copy for SystemHandle<S> {}

impl<S> PartialEq for SystemHandle<S> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl<S> Eq for SystemHandle<S> {}

impl<S> fmt::Debug for SystemHandle<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SystemHandle").field(&self.index).finish()
    }
}

/// Object-safe wrapper so the world can store any system and downcast it back.
pub(crate) trait ErasedSystem {
    fn run(&mut self, world: &mut World, entities: &[Entity], dt: f64);
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<S: System> ErasedSystem for S {
    #[inline]
    fn run(&mut self, world: &mut World, entities: &[Entity], dt: f64) {
        self.update(world, entities, dt);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Everything the world tracks for one registered system.
pub(crate) struct SystemSlot {
    pub(crate) name: String,
    pub(crate) signature: Signature,
    pub(crate) enabled: bool,
    pub(crate) entities: BTreeSet<Entity>,
    /// Concrete type of `system`, kept here so lookups work mid-run.
    pub(crate) type_id: TypeId,
    /// `None` only while the system is running.
    pub(crate) system: Option<Box<dyn ErasedSystem>>,
}

impl SystemSlot {
    pub(crate) fn new<S: System>(name: String, signature: Signature, system: S) -> Self {
        Self {
            name,
            signature,
            enabled: true,
            entities: BTreeSet::new(),
            type_id: TypeId::of::<S>(),
            system: Some(Box::new(system)),
        }
    }

    /// Inserts or erases `entity` depending on whether it now qualifies.
    ///
    /// An entity with no components never qualifies, even for a system that
    /// requires nothing.
    #[inline]
    pub(crate) fn refresh(&mut self, entity: Entity, entity_signature: Signature) {
        if !entity_signature.is_empty() && entity_signature.contains(self.signature) {
            self.entities.insert(entity);
        } else {
            self.entities.remove(&entity);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Counter(u32);

    impl System for Counter {
        fn update(&mut self, _world: &mut World, entities: &[Entity], _dt: f64) {
            self.0 += entities.len() as u32;
        }
    }

    #[test]
    fn test_refresh_inserts_and_erases() {
        let required = Signature::EMPTY.with(0).with(1);
        let mut slot = SystemSlot::new("counter".into(), required, Counter(0));
        let e = Entity::from_raw(1);

        slot.refresh(e, Signature::EMPTY.with(0));
        assert!(!slot.entities.contains(&e));

        slot.refresh(e, Signature::EMPTY.with(0).with(1).with(5));
        assert!(slot.entities.contains(&e));

        slot.refresh(e, Signature::EMPTY.with(1));
        assert!(!slot.entities.contains(&e));
    }

    #[test]
    fn test_empty_requirement_needs_some_component() {
        let mut slot = SystemSlot::new("all".into(), Signature::EMPTY, Counter(0));
        let e = Entity::from_raw(3);

        slot.refresh(e, Signature::EMPTY.with(9));
        assert!(slot.entities.contains(&e));

        slot.refresh(e, Signature::EMPTY);
        assert!(!slot.entities.contains(&e));
    }

    #[test]
    fn test_erased_system_downcasts_to_concrete() {
        let mut slot = SystemSlot::new("counter".into(), Signature::EMPTY, Counter(7));
        let system = slot.system.as_mut().map(|s| s.as_any_mut());
        let counter = system.and_then(|s| s.downcast_mut::<Counter>());
        assert_eq!(counter.map(|c| c.0), Some(7));
    }

    #[test]
    fn test_handles_compare_by_position() {
        let a: SystemHandle<Counter> = SystemHandle::new(2);
        let b = a;
        assert_eq!(a, b);
        assert_eq!(b.index(), 2);
        assert_eq!(format!("{a:?}"), "SystemHandle(2)");
    }
}
