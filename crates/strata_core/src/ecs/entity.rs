//! # Entity Management
//!
//! Entities are plain numeric ids in `1..=capacity`. Id `0` is the null
//! sentinel and is never handed out.
//!
//! The [`EntityRegistry`] owns the id pool and the authoritative signature
//! table, one slot per id. Destroyed ids go to the back of a FIFO queue, so
//! reuse order is deterministic.

use std::collections::VecDeque;
use std::fmt;

use super::signature::Signature;
use crate::error::{EcsError, EcsResult, OrViolation};

/// Default number of entity ids in a world.
pub const MAX_ENTITIES: u32 = 4096;

/// Opaque entity identifier.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Entity(u32);

impl Entity {
    /// Null/invalid entity.
    pub const NULL: Self = Self(0);

    /// Wraps a raw id. No validation happens here.
    #[inline]
    #[must_use]
    pub const fn from_raw(id: u32) -> Self {
        Self(id)
    }

    /// Returns the raw id.
    #[inline]
    #[must_use]
    pub const fn id(self) -> u32 {
        self.0
    }

    /// Checks if this is the null entity.
    #[inline]
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Issues and recycles entity ids and stores each id's signature.
///
/// All storage is sized once at construction:
/// - the id queue, pre-seeded with `1..=capacity`
/// - the signature table, indexed directly by id
/// - the allocation flags, indexed directly by id
pub struct EntityRegistry {
    /// FIFO pool of ids ready for reuse.
    available: VecDeque<Entity>,
    /// Signature per id. Slot 0 belongs to the null entity and stays empty.
    signatures: Box<[Signature]>,
    /// Whether each id is currently handed out.
    allocated: Box<[bool]>,
    /// Number of ids currently handed out.
    living: u32,
    /// Highest valid id.
    capacity: u32,
}

impl EntityRegistry {
    /// Creates a registry holding ids `1..=capacity`.
    ///
    /// # Panics
    ///
    /// Panics if capacity is zero or `u32::MAX`.
    #[must_use]
    pub fn new(capacity: u32) -> Self {
        assert!(capacity > 0, "Capacity must be greater than zero");
        assert!(capacity < u32::MAX, "Capacity must be below u32::MAX");

        let slots = capacity as usize + 1;
        Self {
            available: (1..=capacity).map(Entity).collect(),
            signatures: vec![Signature::EMPTY; slots].into_boxed_slice(),
            allocated: vec![false; slots].into_boxed_slice(),
            living: 0,
            capacity,
        }
    }

    /// Returns the highest valid id.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Returns the number of ids currently handed out.
    #[inline]
    #[must_use]
    pub const fn living_count(&self) -> u32 {
        self.living
    }

    /// Checks `0 < entity <= capacity`.
    #[inline]
    #[must_use]
    pub const fn in_range(&self, entity: Entity) -> bool {
        entity.0 != 0 && entity.0 <= self.capacity
    }

    /// Checks whether the id is currently handed out.
    #[inline]
    #[must_use]
    pub fn is_allocated(&self, entity: Entity) -> bool {
        self.in_range(entity) && self.allocated[entity.0 as usize]
    }

    /// Takes the next id from the pool.
    ///
    /// # Errors
    ///
    /// [`EcsError::EntityPoolExhausted`] when every id is in use.
    pub fn try_create(&mut self) -> EcsResult<Entity> {
        let Some(entity) = self.available.pop_front() else {
            return Err(EcsError::EntityPoolExhausted {
                capacity: self.capacity,
            });
        };

        self.allocated[entity.0 as usize] = true;
        self.living += 1;
        Ok(entity)
    }

    /// Takes the next id from the pool.
    ///
    /// # Panics
    ///
    /// Panics when every id is in use.
    #[track_caller]
    pub fn create(&mut self) -> Entity {
        self.try_create().or_violation()
    }

    /// Clears the id's signature and puts it at the back of the pool.
    ///
    /// # Errors
    ///
    /// [`EcsError::EntityOutOfRange`] or [`EcsError::EntityNotAllocated`].
    pub fn try_destroy(&mut self, entity: Entity) -> EcsResult<()> {
        self.check_range(entity)?;
        let idx = entity.0 as usize;
        if !self.allocated[idx] {
            return Err(EcsError::EntityNotAllocated(entity.0));
        }

        self.signatures[idx] = Signature::EMPTY;
        self.allocated[idx] = false;
        self.available.push_back(entity);
        self.living -= 1;
        Ok(())
    }

    /// Clears the id's signature and puts it at the back of the pool.
    ///
    /// # Panics
    ///
    /// Panics if the id is out of range or not allocated.
    #[track_caller]
    pub fn destroy(&mut self, entity: Entity) {
        self.try_destroy(entity).or_violation();
    }

    /// Returns the stored signature.
    ///
    /// # Panics
    ///
    /// Panics if the id is out of range.
    #[inline]
    #[must_use]
    #[track_caller]
    pub fn signature(&self, entity: Entity) -> Signature {
        self.check_range(entity).or_violation();
        self.signatures[entity.0 as usize]
    }

    /// Overwrites the stored signature.
    ///
    /// # Panics
    ///
    /// Panics if the id is out of range.
    #[inline]
    #[track_caller]
    pub fn set_signature(&mut self, entity: Entity, signature: Signature) {
        self.check_range(entity).or_violation();
        self.signatures[entity.0 as usize] = signature;
    }

    #[inline]
    fn check_range(&self, entity: Entity) -> EcsResult<()> {
        if self.in_range(entity) {
            Ok(())
        } else {
            Err(EcsError::EntityOutOfRange {
                entity: entity.0,
                capacity: self.capacity,
            })
        }
    }
}

impl Default for EntityRegistry {
    fn default() -> Self {
        Self::new(MAX_ENTITIES)
    }
}
