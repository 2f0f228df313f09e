//! # Entity Component System
//!
//! The ECS core: ids, signatures, per-type dense storage, systems and the
//! world that ties them together.
//!
//! ## Design Philosophy
//!
//! - Entities are plain ids drawn from a fixed, recycled pool
//! - Components are stored in dense arrays for cache efficiency
//! - Each system tracks the entities whose signature covers its own
//! - Only the world mutates signatures and membership, always together

mod component;
mod entity;
mod registry;
mod signature;
mod storage;
mod system;
mod world;


pub use component::{Component, ComponentSet};
pub use entity::{Entity, EntityRegistry, MAX_ENTITIES};
pub use registry::ComponentRegistry;
pub use signature::{ComponentBit, Signature, MAX_COMPONENTS};
pub use storage::{AnyComponentStore, ComponentStore};
pub use system::{FnSystem, System, SystemHandle};
pub use world::World;
