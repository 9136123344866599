//! Change notifications and listener registration.

use serde::{Deserialize, Serialize};

use crate::ObjectId;

/// Notification emitted by the editor after a mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum EditorEvent {
    /// The active selection changed (empty when cleared).
    SelectionChanged(Vec<ObjectId>),
    /// Objects were added, removed or reordered.
    StackChanged,
    /// An object's geometry, style, flags or content changed.
    ObjectModified(ObjectId),
}

impl EditorEvent {
    /// Whether the layer list needs to be re-derived after this event.
    #[must_use]
    pub fn affects_layers(&self) -> bool {
        !matches!(self, Self::ObjectModified(_))
    }
}

type Handler<E> = Box<dyn Fn(&E) + Send + Sync>;

/// Synchronously notified observers of events of type `E`.
pub struct Listeners<E> {
    handlers: Vec<Handler<E>>,
}

impl<E> Listeners<E> {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    /// Register a listener.
    pub fn subscribe(&mut self, handler: impl Fn(&E) + Send + Sync + 'static) {
        self.handlers.push(Box::new(handler));
    }

    /// Deliver `event` to every listener in registration order.
    pub fn emit(&self, event: &E) {
        for handler in &self.handlers {
            handler(event);
        }
    }

    /// Number of registered listeners.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Check if no listener is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl<E> Default for Listeners<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> std::fmt::Debug for Listeners<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listeners")
            .field("count", &self.handlers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_listeners_receive_in_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut listeners = Listeners::new();
        for tag in ["first", "second"] {
            let seen = Arc::clone(&seen);
            listeners.subscribe(move |event: &EditorEvent| {
                seen.lock().expect("lock").push((tag, event.clone()));
            });
        }
        assert_eq!(listeners.len(), 2);

        listeners.emit(&EditorEvent::StackChanged);

        let seen = seen.lock().expect("lock");
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].0, "first");
        assert_eq!(seen[1], ("second", EditorEvent::StackChanged));
    }

    #[test]
    fn test_event_serialization() {
        let id = ObjectId::new();
        let json = serde_json::to_string(&EditorEvent::ObjectModified(id)).expect("serialize");
        assert!(json.contains("object_modified"));
        assert!(!EditorEvent::ObjectModified(id).affects_layers());
        assert!(EditorEvent::SelectionChanged(vec![]).affects_layers());
    }
}
