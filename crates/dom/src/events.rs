//! Event-handler registration for the synthetic document.
//!
//! A registry of callbacks keyed by node and event type. Dispatching
//! fires the target's listeners and bubbles to each ancestor in turn,
//! using the document's parent references. No default actions, capture
//! phase, or propagation control — registration and bubbling dispatch
//! only.

use crate::{Document, NodeId};
use core::fmt::{self, Debug, Formatter};
use std::collections::HashMap;

/// What a listener receives: the event name, the node the event was
/// dispatched on, and the node whose listener is running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchedEvent {
    pub event_type: String,
    pub target: NodeId,
    pub current_target: NodeId,
}

type Listener = Box<dyn FnMut(&DispatchedEvent)>;

/// Listener storage, kept outside [`Document`] so the tree itself stays
/// plain data.
#[derive(Default)]
pub struct EventRegistry {
    listeners: HashMap<NodeId, HashMap<String, Vec<Listener>>>,
}

impl EventRegistry {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback for `event_type` on `node`.
    pub fn add_listener(
        &mut self,
        node: NodeId,
        event_type: &str,
        listener: impl FnMut(&DispatchedEvent) + 'static,
    ) {
        self.listeners
            .entry(node)
            .or_default()
            .entry(event_type.to_owned())
            .or_default()
            .push(Box::new(listener));
    }

    /// Drop every callback for `event_type` on `node`.
    pub fn remove_listeners(&mut self, node: NodeId, event_type: &str) {
        if let Some(by_type) = self.listeners.get_mut(&node) {
            by_type.remove(event_type);
        }
    }

    /// Number of callbacks registered for `event_type` on `node`.
    pub fn listener_count(&self, node: NodeId, event_type: &str) -> usize {
        self.listeners
            .get(&node)
            .and_then(|by_type| by_type.get(event_type))
            .map_or(0, Vec::len)
    }

    /// Dispatch an event on `target`, bubbling to the root. Returns the
    /// number of callbacks that ran.
    pub fn dispatch(&mut self, document: &Document, target: NodeId, event_type: &str) -> usize {
        let mut fired = 0_usize;
        let mut current = Some(target);
        while let Some(node) = current {
            if let Some(callbacks) = self
                .listeners
                .get_mut(&node)
                .and_then(|by_type| by_type.get_mut(event_type))
            {
                let event = DispatchedEvent {
                    event_type: event_type.to_owned(),
                    target,
                    current_target: node,
                };
                for callback in callbacks.iter_mut() {
                    callback(&event);
                    fired = fired.saturating_add(1);
                }
            }
            current = document.parent(node);
        }
        log::trace!("dispatched {event_type:?} on {target:?}: {fired} listener(s)");
        fired
    }
}

impl Debug for EventRegistry {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        let total: usize = self
            .listeners
            .values()
            .flat_map(HashMap::values)
            .map(Vec::len)
            .sum();
        formatter
            .debug_struct("EventRegistry")
            .field("nodes", &self.listeners.len())
            .field("listeners", &total)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Assertions in tests are expected")]

    use super::EventRegistry;
    use crate::Document;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn dispatch_bubbles_from_target_to_root() {
        let mut doc = Document::new();
        let body = doc.create_element("body");
        let div = doc.create_element("div");
        let button = doc.create_element("button");
        doc.append_child(body, div).unwrap();
        doc.append_child(div, button).unwrap();

        let order = Rc::new(RefCell::new(Vec::new()));
        let mut registry = EventRegistry::new();
        for (node, label) in [(button, "button"), (div, "div"), (body, "body")] {
            let order = Rc::clone(&order);
            registry.add_listener(node, "click", move |event| {
                order
                    .borrow_mut()
                    .push((label, event.target, event.current_target));
            });
        }

        let fired = registry.dispatch(&doc, button, "click");
        assert_eq!(fired, 3);
        let seen = order.borrow();
        assert_eq!(seen[0], ("button", button, button));
        assert_eq!(seen[1], ("div", button, div));
        assert_eq!(seen[2], ("body", button, body));
    }

    #[test]
    fn unrelated_event_types_do_not_fire() {
        let mut doc = Document::new();
        let body = doc.create_element("body");
        let mut registry = EventRegistry::new();
        registry.add_listener(body, "click", |_| {});
        assert_eq!(registry.dispatch(&doc, body, "keydown"), 0);
        assert_eq!(registry.listener_count(body, "click"), 1);
        registry.remove_listeners(body, "click");
        assert_eq!(registry.listener_count(body, "click"), 0);
    }
}
