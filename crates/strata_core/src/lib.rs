//! # STRATA Core
//!
//! A small, single-threaded Entity Component System (ECS) runtime:
//! - Entities are opaque ids from a fixed, recycled pool
//! - Components live in dense per-type arrays with O(1) add/remove/lookup
//! - Systems declare a required signature and see exactly the entities
//!   that satisfy it, updated synchronously on every structural change
//!
//! ## Architecture Rules
//!
//! 1. **Fail fast** - Contract violations panic at the fault site
//! 2. **Data-oriented design** - Components are stored in contiguous arrays
//! 3. **One owner** - All state lives in one [`World`], passed explicitly
//!
//! ## Example
//!
//! ```rust
//! use strata_core::World;
//!
//! struct Position { x: f32, y: f32 }
//!
//! let mut world = World::new();
//! world.register_component::<Position>();
//!
//! let e = world.create_entity();
//! world.add_component(e, Position { x: 1.0, y: 2.0 });
//! assert!(world.is_alive(e));
//! assert_eq!(world.get_component::<Position>(e).y, 2.0);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod ecs;
pub mod error;
pub mod runtime;

pub use config::{EngineConfig, FrameConfig, Pacing, WorldConfig};
pub use ecs::{
    AnyComponentStore, Component, ComponentBit, ComponentRegistry, ComponentSet,
    ComponentStore, Entity, EntityRegistry, FnSystem, Signature, System, SystemHandle, World,
    MAX_COMPONENTS, MAX_ENTITIES,
};
pub use error::{violation, EcsError, EcsResult};
pub use runtime::{Command, CommandQueue, Event, EventBus, EventListener, Runner, StopHandle};
