//! # ECS World
//!
//! The central container for all entities, components and systems.
//!
//! The world is the only place where an entity's signature and the systems'
//! membership sets change, and it always changes them together:
//!
//! ```text
//! add_component<T>(e, v)
//!   1. store<T>.insert(e, v)
//!   2. sig = signature(e) | bit<T>
//!   3. set_signature(e, sig)
//!   4. for each system: sig ⊇ system.sig ? insert e : erase e
//! ```
//!
//! All four steps run inside one call, so system code never observes storage,
//! signature and membership out of step.

use std::any::TypeId;
use std::collections::{BTreeSet, HashMap};

use super::component::{Component, ComponentSet};
use super::entity::{Entity, EntityRegistry, MAX_ENTITIES};
use super::registry::ComponentRegistry;
use super::signature::{ComponentBit, Signature};
use super::storage::ComponentStore;
use super::system::{ErasedSystem, System, SystemHandle, SystemSlot};
use crate::config::WorldConfig;
use crate::error::{violation, EcsError};
use crate::runtime::{CommandQueue, Event, EventBus};

/// The ECS World - container for all simulation state.
///
/// # Ordering
///
/// Register component types before any entity uses them, and register
/// systems before creating the entities they should track. A system
/// registered after an entity already matches its signature does not pick
/// that entity up until the entity's signature changes again.
///
/// # Example
///
/// ```rust
/// use strata_core::{Entity, FnSystem, World};
///
/// struct Position { x: f64 }
/// struct Velocity { dx: f64 }
///
/// let mut world = World::new();
/// world.register_component::<Position>();
/// world.register_component::<Velocity>();
///
/// let movers = world.make_signature::<(Position, Velocity)>();
/// world.register_system(
///     "movement",
///     movers,
///     FnSystem::new(|world: &mut World, entities: &[Entity], dt: f64| {
///         for &e in entities {
///             let dx = world.get_component::<Velocity>(e).dx;
///             world.get_component_mut::<Position>(e).x += dx * dt;
///         }
///     }),
/// );
///
/// let e = world.create_entity();
/// world.add_component(e, Position { x: 0.0 });
/// world.add_component(e, Velocity { dx: 2.0 });
/// world.update_systems(0.5);
/// assert_eq!(world.get_component::<Position>(e).x, 1.0);
/// ```
pub struct World {
    /// Id pool and signature table.
    entities: EntityRegistry,
    /// Bits and stores for every component type.
    components: ComponentRegistry,
    /// Registered systems in update order.
    systems: Vec<SystemSlot>,
    /// System name to position in `systems`.
    system_index: HashMap<String, usize>,
    /// Deferred structural changes, applied by `flush_commands`.
    commands: CommandQueue,
    /// Named events, dispatched by `flush_events`.
    events: EventBus,
    /// Reused buffer for the per-system membership snapshot.
    scratch: Vec<Entity>,
}

impl World {
    /// Creates a world with [`MAX_ENTITIES`] entity ids.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(MAX_ENTITIES)
    }

    /// Creates a world with ids `1..=max_entities`.
    ///
    /// # Panics
    ///
    /// Panics if `max_entities` is zero or `u32::MAX`.
    #[must_use]
    pub fn with_capacity(max_entities: u32) -> Self {
        Self {
            entities: EntityRegistry::new(max_entities),
            components: ComponentRegistry::new(),
            systems: Vec::new(),
            system_index: HashMap::new(),
            commands: CommandQueue::new(),
            events: EventBus::new(),
            scratch: Vec::new(),
        }
    }

    /// Creates a world sized by `config`.
    ///
    /// # Panics
    ///
    /// Panics if `config.max_entities` is zero or `u32::MAX`.
    #[must_use]
    pub fn with_config(config: &WorldConfig) -> Self {
        Self::with_capacity(config.max_entities)
    }

    /// Returns the highest valid entity id.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> u32 {
        self.entities.capacity()
    }

    // =========================================================================
    // Entities
    // =========================================================================

    /// Creates an entity with an empty signature.
    ///
    /// # Panics
    ///
    /// Panics if every id is in use.
    #[track_caller]
    pub fn create_entity(&mut self) -> Entity {
        let entity = self.entities.create();
        tracing::trace!(%entity, living = self.entities.living_count(), "created entity");
        entity
    }

    /// Destroys an entity: drops it from every system, removes all of its
    /// components, then recycles its id.
    ///
    /// # Panics
    ///
    /// Panics if the id is out of range or not currently allocated.
    #[track_caller]
    pub fn destroy_entity(&mut self, entity: Entity) {
        self.check_allocated(entity);

        for slot in &mut self.systems {
            slot.entities.remove(&entity);
        }
        self.components.on_entity_destroyed(entity);
        self.entities.destroy(entity);

        tracing::trace!(%entity, living = self.entities.living_count(), "destroyed entity");
    }

    /// Checks whether an entity currently holds at least one component.
    ///
    /// The null id and ids past capacity are never alive.
    #[inline]
    #[must_use]
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.entities.in_range(entity) && !self.entities.signature(entity).is_empty()
    }

    /// Number of allocated entities.
    #[inline]
    #[must_use]
    pub const fn entity_count(&self) -> u32 {
        self.entities.living_count()
    }

    /// Returns the entity's current signature.
    ///
    /// # Panics
    ///
    /// Panics if the id is out of range.
    #[inline]
    #[must_use]
    #[track_caller]
    pub fn signature_of(&self, entity: Entity) -> Signature {
        self.entities.signature(entity)
    }

    // =========================================================================
    // Components
    // =========================================================================

    /// Registers `T` and returns its signature bit.
    ///
    /// # Panics
    ///
    /// Panics if `T` is already registered or the type limit is reached.
    #[track_caller]
    pub fn register_component<T: Component>(&mut self) -> ComponentBit {
        self.components.register::<T>()
    }

    /// Checks whether `T` is registered.
    #[inline]
    #[must_use]
    pub fn is_component_registered<T: Component>(&self) -> bool {
        self.components.is_registered::<T>()
    }

    /// Returns `T`'s signature bit.
    ///
    /// # Panics
    ///
    /// Panics if `T` is not registered.
    #[inline]
    #[must_use]
    #[track_caller]
    pub fn component_bit<T: Component>(&self) -> ComponentBit {
        self.components.bit::<T>()
    }

    /// Attaches `value` to `entity` and refreshes system membership.
    ///
    /// # Panics
    ///
    /// Panics if the entity is not allocated, `T` is not registered, or the
    /// entity already has a `T`.
    #[track_caller]
    pub fn add_component<T: Component>(&mut self, entity: Entity, value: T) {
        self.check_allocated(entity);
        self.components.add(entity, value);

        let signature = self
            .entities
            .signature(entity)
            .with(self.components.bit::<T>());
        self.entities.set_signature(entity, signature);
        self.refresh_membership(entity, signature);
    }

    /// Detaches `entity`'s `T`, refreshes system membership and returns the
    /// value.
    ///
    /// # Panics
    ///
    /// Panics if the entity is not allocated, `T` is not registered, or the
    /// entity has no `T`.
    #[track_caller]
    pub fn remove_component<T: Component>(&mut self, entity: Entity) -> T {
        self.check_allocated(entity);
        let value = self.components.remove::<T>(entity);

        let signature = self
            .entities
            .signature(entity)
            .without(self.components.bit::<T>());
        self.entities.set_signature(entity, signature);
        self.refresh_membership(entity, signature);
        value
    }

    /// Gets `entity`'s `T`.
    ///
    /// # Panics
    ///
    /// Panics if `T` is not registered or the entity has no `T`.
    #[inline]
    #[must_use]
    #[track_caller]
    pub fn get_component<T: Component>(&self, entity: Entity) -> &T {
        self.components.get::<T>(entity)
    }

    /// Gets `entity`'s `T` mutably.
    ///
    /// # Panics
    ///
    /// Panics if `T` is not registered or the entity has no `T`.
    #[inline]
    #[track_caller]
    pub fn get_component_mut<T: Component>(&mut self, entity: Entity) -> &mut T {
        self.components.get_mut::<T>(entity)
    }

    /// Checks whether `entity` has a `T`.
    ///
    /// # Panics
    ///
    /// Panics if `T` is not registered.
    #[inline]
    #[must_use]
    #[track_caller]
    pub fn has_component<T: Component>(&self, entity: Entity) -> bool {
        self.components.has::<T>(entity)
    }

    /// Returns `T`'s store for bulk, read-only traversal.
    ///
    /// # Panics
    ///
    /// Panics if `T` is not registered.
    #[inline]
    #[must_use]
    #[track_caller]
    pub fn component_store<T: Component>(&self) -> &ComponentStore<T> {
        self.components.store::<T>()
    }

    /// Returns all `T` values, packed, for bulk in-place updates.
    ///
    /// Structural changes must still go through
    /// [`add_component`](Self::add_component) and
    /// [`remove_component`](Self::remove_component), so only the values are
    /// exposed here.
    ///
    /// # Panics
    ///
    /// Panics if `T` is not registered.
    #[inline]
    #[track_caller]
    pub fn component_values_mut<T: Component>(&mut self) -> &mut [T] {
        self.components.store_mut::<T>().as_mut_slice()
    }

    /// Builds a signature with exactly the bits of the listed types.
    ///
    /// # Panics
    ///
    /// Panics if any type is not registered.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let sig = world.make_signature::<(Position, Velocity)>();
    /// ```
    #[inline]
    #[must_use]
    #[track_caller]
    pub fn make_signature<S: ComponentSet>(&self) -> Signature {
        S::signature(&self.components)
    }

    // =========================================================================
    // Systems
    // =========================================================================

    /// Appends `system` to the update order under `name`.
    ///
    /// The new system starts enabled with an empty membership set.
    ///
    /// # Panics
    ///
    /// Panics if a system named `name` already exists.
    #[track_caller]
    pub fn register_system<S: System>(
        &mut self,
        name: impl Into<String>,
        signature: Signature,
        system: S,
    ) -> SystemHandle<S> {
        let name = name.into();
        if self.system_index.contains_key(&name) {
            violation(EcsError::DuplicateSystem(name));
        }

        let index = self.systems.len();
        tracing::debug!(
            system = %name,
            index,
            signature = %signature,
            "registered system"
        );
        self.system_index.insert(name.clone(), index);
        self.systems.push(SystemSlot::new(name, signature, system));
        SystemHandle::new(index)
    }

    /// Looks up a system by name.
    ///
    /// Returns `None` if no system has that name or it is not an `S`.
    #[must_use]
    pub fn get_system<S: System>(&self, name: &str) -> Option<SystemHandle<S>> {
        let index = *self.system_index.get(name)?;
        (self.systems[index].type_id == TypeId::of::<S>()).then(|| SystemHandle::new(index))
    }

    /// Borrows a system.
    ///
    /// Returns `None` while that system is the one currently running.
    ///
    /// # Panics
    ///
    /// Panics if the handle was not issued by this world.
    #[must_use]
    #[track_caller]
    pub fn system<S: System>(&self, handle: SystemHandle<S>) -> Option<&S> {
        self.slot(handle)
            .system
            .as_ref()?
            .as_any()
            .downcast_ref::<S>()
    }

    /// Borrows a system mutably.
    ///
    /// Returns `None` while that system is the one currently running.
    ///
    /// # Panics
    ///
    /// Panics if the handle was not issued by this world.
    #[track_caller]
    pub fn system_mut<S: System>(&mut self, handle: SystemHandle<S>) -> Option<&mut S> {
        self.slot_mut(handle)
            .system
            .as_mut()?
            .as_any_mut()
            .downcast_mut::<S>()
    }

    /// Entities currently matching the system's signature.
    ///
    /// # Panics
    ///
    /// Panics if the handle was not issued by this world.
    #[inline]
    #[must_use]
    #[track_caller]
    pub fn system_entities<S: 'static>(&self, handle: SystemHandle<S>) -> &BTreeSet<Entity> {
        &self.slot(handle).entities
    }

    /// The system's required signature.
    ///
    /// # Panics
    ///
    /// Panics if the handle was not issued by this world.
    #[inline]
    #[must_use]
    #[track_caller]
    pub fn system_signature<S: 'static>(&self, handle: SystemHandle<S>) -> Signature {
        self.slot(handle).signature
    }

    /// The name the system was registered under.
    ///
    /// # Panics
    ///
    /// Panics if the handle was not issued by this world.
    #[inline]
    #[must_use]
    #[track_caller]
    pub fn system_name<S: 'static>(&self, handle: SystemHandle<S>) -> &str {
        &self.slot(handle).name
    }

    /// Enables or disables a system. Disabled systems are skipped by
    /// [`update_systems`](Self::update_systems) but keep their membership
    /// up to date.
    ///
    /// # Panics
    ///
    /// Panics if the handle was not issued by this world.
    #[inline]
    #[track_caller]
    pub fn set_system_enabled<S: 'static>(&mut self, handle: SystemHandle<S>, enabled: bool) {
        self.slot_mut(handle).enabled = enabled;
    }

    /// Checks whether a system is enabled.
    ///
    /// # Panics
    ///
    /// Panics if the handle was not issued by this world.
    #[inline]
    #[must_use]
    #[track_caller]
    pub fn is_system_enabled<S: 'static>(&self, handle: SystemHandle<S>) -> bool {
        self.slot(handle).enabled
    }

    /// Number of registered systems.
    #[inline]
    #[must_use]
    pub fn system_count(&self) -> usize {
        self.systems.len()
    }

    /// System names in update order.
    pub fn system_names(&self) -> impl Iterator<Item = &str> {
        self.systems.iter().map(|slot| slot.name.as_str())
    }

    /// Runs every enabled system once, in registration order.
    ///
    /// Each system receives a snapshot of its membership taken when its turn
    /// starts, so changes made by earlier systems in the same frame are
    /// visible to later ones. Systems registered during this call first run
    /// on the next call.
    ///
    /// A system that panics is put back in its slot while unwinding, so a
    /// caller that catches the panic can keep updating the world.
    pub fn update_systems(&mut self, dt: f64) {
        for index in 0..self.systems.len() {
            let slot = &mut self.systems[index];
            if !slot.enabled {
                continue;
            }
            // Already running further up the stack.
            let Some(system) = slot.system.take() else {
                continue;
            };

            let mut entities = std::mem::take(&mut self.scratch);
            entities.clear();
            entities.extend(self.systems[index].entities.iter().copied());

            let mut running = RunningSystem {
                world: &mut *self,
                index,
                system: Some(system),
                entities,
            };
            running.run(dt);
        }
    }

    // =========================================================================
    // Deferred commands
    // =========================================================================

    /// Queues a structural change to run at the next
    /// [`flush_commands`](Self::flush_commands).
    ///
    /// The world never flushes on its own.
    pub fn defer<F>(&mut self, command: F)
    where
        F: FnOnce(&mut World) + 'static,
    {
        self.commands.post(command);
    }

    /// Number of queued commands.
    #[inline]
    #[must_use]
    pub fn pending_commands(&self) -> usize {
        self.commands.len()
    }

    /// Runs queued commands in order until the queue is empty, including any
    /// queued by the commands themselves. Returns how many ran.
    pub fn flush_commands(&mut self) -> usize {
        let mut executed = 0;
        loop {
            let mut batch = std::mem::take(&mut self.commands);
            if batch.is_empty() {
                break;
            }
            executed += batch.flush(self);
        }
        if executed > 0 {
            tracing::trace!(executed, "flushed deferred commands");
        }
        executed
    }

    /// Drops every queued command without running it.
    pub fn clear_commands(&mut self) {
        self.commands.clear();
    }

    // =========================================================================
    // Events
    // =========================================================================

    /// Registers `listener` for events named `name`.
    pub fn subscribe<F>(&mut self, name: impl Into<String>, listener: F)
    where
        F: FnMut(&Event) + 'static,
    {
        self.events.subscribe(name, listener);
    }

    /// Queues `event` for the next [`flush_events`](Self::flush_events).
    pub fn post_event(&mut self, event: Event) {
        self.events.post(event);
    }

    /// Number of queued events.
    #[inline]
    #[must_use]
    pub fn pending_events(&self) -> usize {
        self.events.pending()
    }

    /// Dispatches queued events in order. Returns how many were dispatched.
    ///
    /// The world never flushes events on its own.
    pub fn flush_events(&mut self) -> usize {
        let dispatched = self.events.flush();
        if dispatched > 0 {
            tracing::trace!(dispatched, "flushed events");
        }
        dispatched
    }

    /// The world's event bus.
    #[inline]
    #[must_use]
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// The world's event bus, mutably.
    #[inline]
    pub fn events_mut(&mut self) -> &mut EventBus {
        &mut self.events
    }

    // =========================================================================
    // Internals
    // =========================================================================

    #[track_caller]
    fn slot<S: 'static>(&self, handle: SystemHandle<S>) -> &SystemSlot {
        match self.systems.get(handle.index()) {
            Some(slot) if slot.type_id == TypeId::of::<S>() => slot,
            _ => violation(EcsError::ForeignSystemHandle(handle.index())),
        }
    }

    #[track_caller]
    fn slot_mut<S: 'static>(&mut self, handle: SystemHandle<S>) -> &mut SystemSlot {
        match self.systems.get_mut(handle.index()) {
            Some(slot) if slot.type_id == TypeId::of::<S>() => slot,
            _ => violation(EcsError::ForeignSystemHandle(handle.index())),
        }
    }

    #[track_caller]
    fn check_allocated(&self, entity: Entity) {
        if !self.entities.in_range(entity) {
            violation(EcsError::EntityOutOfRange {
                entity: entity.id(),
                capacity: self.entities.capacity(),
            });
        }
        if !self.entities.is_allocated(entity) {
            violation(EcsError::EntityNotAllocated(entity.id()));
        }
    }

    fn refresh_membership(&mut self, entity: Entity, signature: Signature) {
        for slot in &mut self.systems {
            slot.refresh(entity, signature);
        }
    }

    #[cfg(test)]
    pub(crate) fn assert_membership_consistent(&self) {
        for slot in &self.systems {
            for raw in 1..=self.capacity() {
                let entity = Entity::from_raw(raw);
                let expected = self.is_alive(entity)
                    && self.signature_of(entity).contains(slot.signature);
                assert_eq!(
                    slot.entities.contains(&entity),
                    expected,
                    "system {} membership of entity {entity}",
                    slot.name
                );
            }
        }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("capacity", &self.capacity())
            .field("entities", &self.entity_count())
            .field("component_types", &self.components.len())
            .field("systems", &self.systems.len())
            .field("pending_commands", &self.commands.len())
            .field("pending_events", &self.events.pending())
            .finish()
    }
}

/// A system taken out of its slot for the duration of its update.
///
/// Dropping it puts the system and the scratch buffer back, including when
/// the update unwinds.
struct RunningSystem<'w> {
    world: &'w mut World,
    index: usize,
    system: Option<Box<dyn ErasedSystem>>,
    entities: Vec<Entity>,
}

impl RunningSystem<'_> {
    fn run(&mut self, dt: f64) {
        if let Some(system) = self.system.as_mut() {
            system.run(self.world, &self.entities, dt);
        }
    }
}

impl Drop for RunningSystem<'_> {
    fn drop(&mut self) {
        if let Some(system) = self.system.take() {
            self.world.systems[self.index].system = Some(system);
        }
        self.world.scratch = std::mem::take(&mut self.entities);
    }
}
