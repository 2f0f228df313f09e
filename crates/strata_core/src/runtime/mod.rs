//! # Frame Runtime
//!
//! Optional layers on top of the [`World`](crate::World): a queue for
//! deferring structural changes, a named event bus, and a runner that
//! drives frames.
//!
//! ## Frame Order
//!
//! ```text
//! Frame N:
//!   flush deferred commands
//!   dispatch queued events
//!   update systems (dt = duration of frame N-1)
//!   sleep until the frame budget is spent
//! ```
//!
//! Nothing here is needed to use the world directly.

mod commands;
mod events;
mod runner;

pub use commands::{Command, CommandQueue};
pub use events::{Event, EventBus, EventListener};
pub use runner::{Runner, StopHandle};
