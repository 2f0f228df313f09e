//! # Event Bus
//!
//! Named publish/subscribe messaging with deferred dispatch.
//!
//! ```text
//! post(event)  ──> queue ──flush()──> every listener subscribed to event.name
//! ```
//!
//! ## Invariants
//!
//! - Events are dispatched in the order they were posted.
//! - Listeners of one name run in subscription order.
//! - An event nobody listens to is dropped at flush.

use std::any::Any;
use std::collections::{HashMap, VecDeque};
use std::fmt;

/// A named message with an optional typed payload.
pub struct Event {
    name: String,
    payload: Option<Box<dyn Any>>,
}

impl Event {
    /// Creates an event without a payload.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            payload: None,
        }
    }

    /// Creates an event carrying `payload`.
    #[must_use]
    pub fn with_payload<T: Any>(name: impl Into<String>, payload: T) -> Self {
        Self {
            name: name.into(),
            payload: Some(Box::new(payload)),
        }
    }

    /// The event's name.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// True when a payload is attached.
    #[inline]
    #[must_use]
    pub fn has_payload(&self) -> bool {
        self.payload.is_some()
    }

    /// Borrows the payload as a `T`.
    ///
    /// Returns `None` when there is no payload or it is not a `T`.
    #[must_use]
    pub fn payload<T: Any>(&self) -> Option<&T> {
        self.payload.as_ref()?.downcast_ref::<T>()
    }
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("name", &self.name)
            .field("has_payload", &self.has_payload())
            .finish()
    }
}

/// Callback invoked for every dispatched event of the subscribed name.
pub type EventListener = Box<dyn FnMut(&Event)>;

/// Queue of pending events plus the listeners registered per name.
///
/// # Example
///
/// ```rust
/// use std::cell::Cell;
/// use std::rc::Rc;
/// use strata_core::{Event, EventBus};
///
/// let total = Rc::new(Cell::new(0));
/// let sink = Rc::clone(&total);
///
/// let mut bus = EventBus::new();
/// bus.subscribe("score", move |event| {
///     sink.set(sink.get() + event.payload::<u32>().copied().unwrap_or(0));
/// });
///
/// bus.post(Event::with_payload("score", 10_u32));
/// bus.post(Event::with_payload("score", 5_u32));
/// assert_eq!(bus.flush(), 2);
/// assert_eq!(total.get(), 15);
/// ```
#[derive(Default)]
pub struct EventBus {
    queue: VecDeque<Event>,
    listeners: HashMap<String, Vec<EventListener>>,
}

impl EventBus {
    /// Creates a bus with no listeners and no pending events.
    #[must_use]
    pub fn new() -> Self {
        Self {
            queue: VecDeque::new(),
            listeners: HashMap::new(),
        }
    }

    /// Registers `listener` for events named `name`.
    pub fn subscribe<F>(&mut self, name: impl Into<String>, listener: F)
    where
        F: FnMut(&Event) + 'static,
    {
        self.listeners
            .entry(name.into())
            .or_default()
            .push(Box::new(listener));
    }

    /// Queues `event` for the next [`flush`](Self::flush).
    pub fn post(&mut self, event: Event) {
        self.queue.push_back(event);
    }

    /// Number of queued events.
    #[inline]
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Number of listeners subscribed to `name`.
    #[must_use]
    pub fn listener_count(&self, name: &str) -> usize {
        self.listeners.get(name).map_or(0, Vec::len)
    }

    /// Dispatches every queued event in order. Returns how many were taken
    /// off the queue, including those nobody listened to.
    pub fn flush(&mut self) -> usize {
        let mut dispatched = 0;
        while let Some(event) = self.queue.pop_front() {
            dispatched += 1;
            match self.listeners.get_mut(&event.name) {
                Some(listeners) => {
                    for listener in listeners.iter_mut() {
                        listener(&event);
                    }
                }
                None => tracing::trace!(event = %event.name, "event has no listeners"),
            }
        }
        dispatched
    }

    /// Drops every queued event and every listener.
    pub fn clear(&mut self) {
        self.queue.clear();
        self.listeners.clear();
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("pending", &self.queue.len())
            .field("names", &self.listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn recording_bus(names: &[&'static str]) -> (EventBus, Rc<RefCell<Vec<String>>>) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut bus = EventBus::new();
        for &name in names {
            let log = Rc::clone(&log);
            bus.subscribe(name, move |event| {
                let tag = event.payload::<i32>().map_or(String::new(), i32::to_string);
                log.borrow_mut().push(format!("{}{tag}", event.name()));
            });
        }
        (bus, log)
    }

    #[test]
    fn test_flush_dispatches_in_post_order() {
        let (mut bus, log) = recording_bus(&["hit", "spawn"]);
        bus.post(Event::with_payload("spawn", 1));
        bus.post(Event::with_payload("hit", 2));
        bus.post(Event::with_payload("spawn", 3));
        assert_eq!(bus.pending(), 3);

        assert_eq!(bus.flush(), 3);
        assert_eq!(bus.pending(), 0);
        assert_eq!(*log.borrow(), vec!["spawn1", "hit2", "spawn3"]);

        // Already drained.
        assert_eq!(bus.flush(), 0);
        assert_eq!(log.borrow().len(), 3);
    }

    #[test]
    fn test_unheard_event_is_dropped() {
        let (mut bus, log) = recording_bus(&["hit"]);
        bus.post(Event::new("quit"));
        assert_eq!(bus.flush(), 1);
        assert!(log.borrow().is_empty());
        assert_eq!(bus.pending(), 0);

        // Subscribing later does not bring it back.
        let (mut late, late_log) = recording_bus(&[]);
        late.post(Event::new("quit"));
        late.flush();
        late.subscribe("quit", |_| panic!("dropped event was redelivered"));
        late.flush();
        assert!(late_log.borrow().is_empty());
    }

    #[test]
    fn test_every_listener_of_a_name_receives_event() {
        let (mut bus, log) = recording_bus(&["tick", "tick", "tick"]);
        assert_eq!(bus.listener_count("tick"), 3);
        assert_eq!(bus.listener_count("other"), 0);

        bus.post(Event::new("tick"));
        bus.flush();
        assert_eq!(*log.borrow(), vec!["tick", "tick", "tick"]);
    }

    #[test]
    fn test_clear_removes_listeners_and_pending_events() {
        let (mut bus, log) = recording_bus(&["hit"]);
        bus.post(Event::new("hit"));
        bus.clear();
        assert_eq!(bus.pending(), 0);
        assert_eq!(bus.listener_count("hit"), 0);

        bus.post(Event::new("hit"));
        assert_eq!(bus.flush(), 1);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_payload_downcast_is_typed() {
        let event = Event::with_payload("damage", 25_u32);
        assert!(event.has_payload());
        assert_eq!(event.payload::<u32>(), Some(&25));
        assert_eq!(event.payload::<i64>(), None);

        let bare = Event::new("ping");
        assert!(!bare.has_payload());
        assert_eq!(bare.payload::<u32>(), None);
        assert_eq!(format!("{bare:?}"), r#"Event { name: "ping", has_payload: false }"#);
    }
}
