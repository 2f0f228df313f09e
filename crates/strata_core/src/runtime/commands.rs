//! # Deferred Commands
//!
//! A FIFO of structural changes recorded now and applied later at a point the
//! caller chooses, typically between frames.
//!
//! ## Invariants
//!
//! - Commands run in the order they were posted.
//! - A command sees the world exactly as the previous command left it.

use std::collections::VecDeque;
use std::fmt;

use crate::ecs::World;

/// A deferred world mutation.
pub type Command = Box<dyn FnOnce(&mut World)>;

/// Ordered queue of deferred world mutations.
///
/// # Example
///
/// ```rust,ignore
/// let mut queue = CommandQueue::new();
/// queue.post(move |world| world.destroy_entity(e));
/// queue.flush(&mut world);
/// ```
#[derive(Default)]
pub struct CommandQueue {
    queue: VecDeque<Command>,
}

impl CommandQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self {
            queue: VecDeque::new(),
        }
    }

    /// Appends a command.
    pub fn post<F>(&mut self, command: F)
    where
        F: FnOnce(&mut World) + 'static,
    {
        self.queue.push_back(Box::new(command));
    }

    /// Number of queued commands.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// True when nothing is queued.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Runs and removes every queued command in order. Returns how many ran.
    pub fn flush(&mut self, world: &mut World) -> usize {
        let mut executed = 0;
        while let Some(command) = self.queue.pop_front() {
            command(world);
            executed += 1;
        }
        executed
    }

    /// Drops every queued command without running it.
    pub fn clear(&mut self) {
        self.queue.clear();
    }
}

impl fmt::Debug for CommandQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandQueue")
            .field("pending", &self.queue.len())
            .finish()
    }
}
