use std::sync::OnceLock;

use super::{DirectoryEvent, Listener};

static REGISTRY: OnceLock<EventRegistry> = OnceLock::new();

/// Listeners registered at startup, called in registration order.
pub struct EventRegistry {
    listeners: Vec<Box<dyn Listener>>,
}

impl EventRegistry {
    fn new() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }

    pub fn listen(&mut self, listener: impl Listener) -> &mut Self {
        self.listeners.push(Box::new(listener));
        self
    }

    async fn dispatch(&self, event: &DirectoryEvent) {
        for listener in &self.listeners {
            listener.handle(event).await;
        }
    }
}

/// Installs the process-wide listeners. Only the first call takes effect;
/// later calls log a warning and are ignored.
pub fn register_event_listeners<F>(f: F)
where
    F: FnOnce(&mut EventRegistry),
{
    let mut registry = EventRegistry::new();
    f(&mut registry);
    if REGISTRY.set(registry).is_err() {
        log::warn!(
            target: "authgate",
            "msg=\"register_event_listeners called more than once, ignoring\""
        );
    }
}

pub async fn dispatch(event: DirectoryEvent) {
    if let Some(registry) = REGISTRY.get() {
        registry.dispatch(&event).await;
    }
}
