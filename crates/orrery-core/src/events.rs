//! # Event Channel
//!
//! Synchronous notifications fired after every successful mutation.
//!
//! Listeners subscribe to one [`EventKind`] and are invoked in registration
//! order, inside the mutating call, with a borrowed [`GraphEvent`]. Payloads
//! point into the graph's records, so nothing is cloned when an event fires.
//! Listeners receive no graph handle and cannot mutate the graph.

use crate::types::{Attributes, UpdateHints};

/// Kind of attribute mutation carried by `*AttributesUpdated` events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeUpdate {
    /// One attribute was set (or updated through a function).
    Set,
    /// One attribute was removed.
    Remove,
    /// The whole map was replaced.
    Replace,
    /// Another map was shallow-merged in.
    Merge,
    /// The whole map was passed through an updater.
    Update,
}

/// A notification fired by a graph.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GraphEvent<'a> {
    NodeAdded {
        key: &'a str,
        attributes: &'a Attributes,
    },
    NodeDropped {
        key: &'a str,
        attributes: &'a Attributes,
    },
    NodeAttributesUpdated {
        key: &'a str,
        kind: AttributeUpdate,
        attributes: &'a Attributes,
        /// Attribute name for `Set`/`Remove`.
        name: Option<&'a str>,
        /// Merged map for `Merge`.
        data: Option<&'a Attributes>,
    },
    EachNodeAttributesUpdated {
        hints: Option<&'a UpdateHints>,
    },
    EdgeAdded {
        key: &'a str,
        source: &'a str,
        target: &'a str,
        attributes: &'a Attributes,
        undirected: bool,
    },
    EdgeDropped {
        key: &'a str,
        source: &'a str,
        target: &'a str,
        attributes: &'a Attributes,
        undirected: bool,
    },
    EdgeAttributesUpdated {
        key: &'a str,
        kind: AttributeUpdate,
        attributes: &'a Attributes,
        name: Option<&'a str>,
        data: Option<&'a Attributes>,
    },
    EachEdgeAttributesUpdated {
        hints: Option<&'a UpdateHints>,
    },
    EdgesCleared,
    Cleared,
    AttributesUpdated {
        kind: AttributeUpdate,
        attributes: &'a Attributes,
        name: Option<&'a str>,
        data: Option<&'a Attributes>,
    },
}

/// Discriminant of [`GraphEvent`], used to subscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    NodeAdded,
    NodeDropped,
    NodeAttributesUpdated,
    EachNodeAttributesUpdated,
    EdgeAdded,
    EdgeDropped,
    EdgeAttributesUpdated,
    EachEdgeAttributesUpdated,
    EdgesCleared,
    Cleared,
    AttributesUpdated,
}

impl GraphEvent<'_> {
    #[must_use]
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::NodeAdded { .. } => EventKind::NodeAdded,
            Self::NodeDropped { .. } => EventKind::NodeDropped,
            Self::NodeAttributesUpdated { .. } => EventKind::NodeAttributesUpdated,
            Self::EachNodeAttributesUpdated { .. } => EventKind::EachNodeAttributesUpdated,
            Self::EdgeAdded { .. } => EventKind::EdgeAdded,
            Self::EdgeDropped { .. } => EventKind::EdgeDropped,
            Self::EdgeAttributesUpdated { .. } => EventKind::EdgeAttributesUpdated,
            Self::EachEdgeAttributesUpdated { .. } => EventKind::EachEdgeAttributesUpdated,
            Self::EdgesCleared => EventKind::EdgesCleared,
            Self::Cleared => EventKind::Cleared,
            Self::AttributesUpdated { .. } => EventKind::AttributesUpdated,
        }
    }

    /// Key of the node or edge the event is about, if any.
    #[must_use]
    pub const fn key(&self) -> Option<&str> {
        match self {
            Self::NodeAdded { key, .. }
            | Self::NodeDropped { key, .. }
            | Self::NodeAttributesUpdated { key, .. }
            | Self::EdgeAdded { key, .. }
            | Self::EdgeDropped { key, .. }
            | Self::EdgeAttributesUpdated { key, .. } => Some(*key),
            _ => None,
        }
    }
}

/// Token returned by `Graph::on`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Box<dyn FnMut(&GraphEvent<'_>)>;

/// Ordered list of subscribers.
#[derive(Default)]
pub(crate) struct EventChannel {
    listeners: Vec<(ListenerId, EventKind, Listener)>,
    next_id: u64,
}

impl EventChannel {
    pub(crate) fn subscribe(&mut self, kind: EventKind, listener: Listener) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, kind, listener));
        id
    }

    pub(crate) fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener, _, _)| *listener != id);
        self.listeners.len() != before
    }

    pub(crate) fn count(&self, kind: EventKind) -> usize {
        self.listeners.iter().filter(|(_, k, _)| *k == kind).count()
    }

    pub(crate) fn clear(&mut self, kind: Option<EventKind>) {
        match kind {
            Some(kind) => self.listeners.retain(|(_, k, _)| *k != kind),
            None => self.listeners.clear(),
        }
    }

    pub(crate) fn emit(&mut self, event: &GraphEvent<'_>) {
        let kind = event.kind();
        for (_, _, listener) in self.listeners.iter_mut().filter(|(_, k, _)| *k == kind) {
            listener(event);
        }
    }
}

impl std::fmt::Debug for EventChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventChannel")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn listeners_run_in_registration_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut channel = EventChannel::default();

        for tag in ["first", "second"] {
            let log = Rc::clone(&log);
            channel.subscribe(
                EventKind::Cleared,
                Box::new(move |_| log.borrow_mut().push(tag)),
            );
        }
        channel.emit(&GraphEvent::Cleared);

        assert_eq!(*log.borrow(), vec!["first", "second"]);
    }

    #[test]
    fn only_matching_kind_is_notified() {
        let hits = Rc::new(RefCell::new(0));
        let mut channel = EventChannel::default();
        let counter = Rc::clone(&hits);
        channel.subscribe(
            EventKind::EdgesCleared,
            Box::new(move |_| *counter.borrow_mut() += 1),
        );

        channel.emit(&GraphEvent::Cleared);
        assert_eq!(*hits.borrow(), 0);
        channel.emit(&GraphEvent::EdgesCleared);
        assert_eq!(*hits.borrow(), 1);
    }

    #[test]
    fn unsubscribe_and_count() {
        let mut channel = EventChannel::default();
        let id = channel.subscribe(EventKind::Cleared, Box::new(|_| {}));
        channel.subscribe(EventKind::Cleared, Box::new(|_| {}));
        assert_eq!(channel.count(EventKind::Cleared), 2);
        assert!(channel.unsubscribe(id));
        assert!(!channel.unsubscribe(id));
        assert_eq!(channel.count(EventKind::Cleared), 1);
        channel.clear(None);
        assert_eq!(channel.count(EventKind::Cleared), 0);
    }

    #[test]
    fn event_key_accessor() {
        let attributes = Attributes::new();
        let event = GraphEvent::NodeAdded {
            key: "a",
            attributes: &attributes,
        };
        assert_eq!(event.key(), Some("a"));
        assert_eq!(event.kind(), EventKind::NodeAdded);
        assert_eq!(GraphEvent::Cleared.key(), None);
    }
}
