//! Named lifecycle notifications with any number of listeners per channel

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use log::trace;

use crate::loader::{LoadError, PageHandle, PageSource};

/// Notification channels
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    Start,
    Image,
    Ready,
    Error,
    Finish,
}

impl EventKind {
    pub const ALL: [EventKind; 5] = [
        EventKind::Start,
        EventKind::Image,
        EventKind::Ready,
        EventKind::Error,
        EventKind::Finish,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            EventKind::Start => "preload:start",
            EventKind::Image => "preload:image",
            EventKind::Ready => "preload:ready",
            EventKind::Error => "preload:error",
            EventKind::Finish => "preload:finish",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A notification emitted by the preload pipeline
#[derive(Clone, Debug)]
pub enum PreloadEvent {
    /// Emitted once, before the first load is issued
    Start { total: usize },
    /// A page finished loading and is in the cache
    Image { index: usize, page: PageHandle },
    /// Enough pages are loaded for the first draw
    Ready { loaded: usize },
    /// A page could not be loaded and was skipped
    Error {
        index: usize,
        source: PageSource,
        error: Rc<LoadError>,
    },
    /// Every source has settled
    Finish { loaded: usize, failed: usize },
}

impl PreloadEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            PreloadEvent::Start { .. } => EventKind::Start,
            PreloadEvent::Image { .. } => EventKind::Image,
            PreloadEvent::Ready { .. } => EventKind::Ready,
            PreloadEvent::Error { .. } => EventKind::Error,
            PreloadEvent::Finish { .. } => EventKind::Finish,
        }
    }
}

/// Handle returned by [`PreloadEvents::on`], used to unsubscribe
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Rc<dyn Fn(&PreloadEvent)>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    listeners: HashMap<EventKind, Vec<(ListenerId, Listener)>>,
}

/// Publish/subscribe bus for preload notifications.
///
/// Clones share the same listener registry. Listeners run on the emitting
/// thread in subscription order; the registry is not borrowed while they
/// run, so a listener may subscribe or unsubscribe others.
#[derive(Clone, Default)]
pub struct PreloadEvents {
    registry: Rc<RefCell<Registry>>,
}

impl PreloadEvents {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to one channel
    pub fn on(&self, kind: EventKind, listener: impl Fn(&PreloadEvent) + 'static) -> ListenerId {
        let mut registry = self.registry.borrow_mut();
        let id = ListenerId(registry.next_id);
        registry.next_id += 1;
        registry
            .listeners
            .entry(kind)
            .or_default()
            .push((id, Rc::new(listener)));
        id
    }

    /// Remove a listener; returns false if it was not subscribed
    pub fn off(&self, id: ListenerId) -> bool {
        let mut registry = self.registry.borrow_mut();
        for listeners in registry.listeners.values_mut() {
            if let Some(pos) = listeners.iter().position(|(lid, _)| *lid == id) {
                listeners.remove(pos);
                return true;
            }
        }
        false
    }

    #[must_use]
    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.registry
            .borrow()
            .listeners
            .get(&kind)
            .map_or(0, Vec::len)
    }

    /// Deliver an event to every listener of its channel
    pub fn emit(&self, event: &PreloadEvent) {
        let kind = event.kind();
        let listeners: Vec<Listener> = self
            .registry
            .borrow()
            .listeners
            .get(&kind)
            .map(|l| l.iter().map(|(_, f)| Rc::clone(f)).collect())
            .unwrap_or_default();

        trace!("Emitting {kind} to {} listener(s)", listeners.len());
        for listener in listeners {
            listener(event);
        }
    }
}

impl fmt::Debug for PreloadEvents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registry = self.registry.borrow();
        let counts: Vec<_> = EventKind::ALL
            .iter()
            .map(|k| (k.name(), registry.listeners.get(k).map_or(0, Vec::len)))
            .collect();
        f.debug_struct("PreloadEvents")
            .field("listeners", &counts)
            .finish()
    }
}
