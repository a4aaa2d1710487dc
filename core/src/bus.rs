use std::fmt;

use crate::Event;

/// Receives every event published on an [`EventBus`].
pub trait Observer {
    /// Called once per event, in emission order.
    fn notify(&mut self, event: &Event);
}

impl<F> Observer for F
where
    F: FnMut(&Event),
{
    fn notify(&mut self, event: &Event) {
        self(event);
    }
}

/// Synchronous, in-order event fan-out owned by the host.
///
/// Observers are notified in registration order, and every observer sees a
/// batch before the next batch is published.
#[derive(Default)]
pub struct EventBus {
    observers: Vec<Box<dyn Observer>>,
}

impl EventBus {
    /// Creates a bus with no observers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an observer that will receive every subsequent event.
    pub fn subscribe(&mut self, observer: impl Observer + 'static) {
        self.observers.push(Box::new(observer));
    }

    /// Delivers the batch to every observer.
    pub fn publish(&mut self, events: &[Event]) {
        for event in events {
            for observer in &mut self.observers {
                observer.notify(event);
            }
        }
    }

    /// Number of registered observers.
    #[must_use]
    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("observers", &self.observers.len())
            .finish()
    }
}
