//! Session events with a bounded ring buffer.
//!
//! Commands and [`crate::session::GameSession::advance`] emit events into a
//! single chronological [`EventBuffer`]. A UI collaborator either registers
//! passive listeners per [`EventKind`] and calls [`EventBus::deliver`], or
//! pulls everything with [`EventBus::drain`].
//!
//! # Suppression
//!
//! Event kinds can be suppressed via [`EventBus::suppress`]. Suppressed
//! events are never buffered.

use crate::brewing::BrewOutcome;
use crate::discovery::ExplorationOutcome;
use crate::fixed::Seconds;
use crate::id::*;
use crate::recipe::IngredientCategory;
use crate::resource::ResourceKind;

// ---------------------------------------------------------------------------
// Event types
// ---------------------------------------------------------------------------

/// A session event. All events carry the session time at which they occurred.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    // -- Ledger --
    ResourcesChanged {
        changed: Vec<ResourceKind>,
        at: Seconds,
    },

    // -- Buffs --
    BuffApplied {
        spirit: SpiritId,
        expires_at: Seconds,
        at: Seconds,
    },
    /// The buff ran out or was displaced by a new one.
    BuffExpired {
        spirit: SpiritId,
        at: Seconds,
    },

    // -- Brewing --
    BrewStarted {
        recipe: RecipeId,
        duration: Seconds,
        at: Seconds,
    },
    BrewResolved {
        outcome: BrewOutcome,
        at: Seconds,
    },
    BrewCancelled {
        refunded: Vec<IngredientCategory>,
        at: Seconds,
    },

    // -- Exploration --
    ExplorationStarted {
        zone: ZoneId,
        duration: Seconds,
        at: Seconds,
    },
    ExplorationResolved {
        outcome: ExplorationOutcome,
        at: Seconds,
    },
    ExplorationCancelled {
        zone: ZoneId,
        at: Seconds,
    },

    // -- Progress --
    SpiritUnlocked {
        spirit: SpiritId,
        at: Seconds,
    },
    ZoneUnlocked {
        zone: ZoneId,
        at: Seconds,
    },
    UpgradePurchased {
        upgrade: UpgradeId,
        paid: u64,
        at: Seconds,
    },
}

/// Discriminant tag for event types, used for suppression and listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    ResourcesChanged,
    BuffApplied,
    BuffExpired,
    BrewStarted,
    BrewResolved,
    BrewCancelled,
    ExplorationStarted,
    ExplorationResolved,
    ExplorationCancelled,
    SpiritUnlocked,
    ZoneUnlocked,
    UpgradePurchased,
}

const EVENT_KIND_COUNT: usize = 12;

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::ResourcesChanged { .. } => EventKind::ResourcesChanged,
            Event::BuffApplied { .. } => EventKind::BuffApplied,
            Event::BuffExpired { .. } => EventKind::BuffExpired,
            Event::BrewStarted { .. } => EventKind::BrewStarted,
            Event::BrewResolved { .. } => EventKind::BrewResolved,
            Event::BrewCancelled { .. } => EventKind::BrewCancelled,
            Event::ExplorationStarted { .. } => EventKind::ExplorationStarted,
            Event::ExplorationResolved { .. } => EventKind::ExplorationResolved,
            Event::ExplorationCancelled { .. } => EventKind::ExplorationCancelled,
            Event::SpiritUnlocked { .. } => EventKind::SpiritUnlocked,
            Event::ZoneUnlocked { .. } => EventKind::ZoneUnlocked,
            Event::UpgradePurchased { .. } => EventKind::UpgradePurchased,
        }
    }

    /// Session time of the event.
    pub fn at(&self) -> Seconds {
        match self {
            Event::ResourcesChanged { at, .. }
            | Event::BuffApplied { at, .. }
            | Event::BuffExpired { at, .. }
            | Event::BrewStarted { at, .. }
            | Event::BrewResolved { at, .. }
            | Event::BrewCancelled { at, .. }
            | Event::ExplorationStarted { at, .. }
            | Event::ExplorationResolved { at, .. }
            | Event::ExplorationCancelled { at, .. }
            | Event::SpiritUnlocked { at, .. }
            | Event::ZoneUnlocked { at, .. }
            | Event::UpgradePurchased { at, .. } => *at,
        }
    }
}

impl EventKind {
    fn index(self) -> usize {
        self as usize
    }
}

// ---------------------------------------------------------------------------
// EventBuffer: fixed-capacity ring buffer
// ---------------------------------------------------------------------------

/// A ring buffer for events. Fixed capacity; when full, the oldest events
/// are dropped.
#[derive(Debug)]
pub struct EventBuffer {
    events: Vec<Option<Event>>,
    /// Write position (wraps around).
    head: usize,
    len: usize,
    /// Total events ever written (including dropped).
    total_written: u64,
}

impl EventBuffer {
    /// A capacity of 0 is clamped to 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            events: (0..capacity).map(|_| None).collect(),
            head: 0,
            len: 0,
            total_written: 0,
        }
    }

    /// Push an event. If full, the oldest event is dropped.
    pub fn push(&mut self, event: Event) {
        self.events[self.head] = Some(event);
        self.head = (self.head + 1) % self.capacity();
        if self.len < self.capacity() {
            self.len += 1;
        }
        self.total_written += 1;
    }

    pub fn capacity(&self) -> usize {
        self.events.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn total_written(&self) -> u64 {
        self.total_written
    }

    /// Iterate from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &Event> + '_ {
        let start = if self.len < self.capacity() {
            (self.head + self.capacity() - self.len) % self.capacity()
        } else {
            // head points to the next write position, which is the oldest entry
            self.head
        };
        (0..self.len).filter_map(move |i| self.events[(start + i) % self.capacity()].as_ref())
    }

    /// Remove and return every buffered event, oldest first.
    pub fn take_all(&mut self) -> Vec<Event> {
        let start = if self.len < self.capacity() {
            (self.head + self.capacity() - self.len) % self.capacity()
        } else {
            self.head
        };
        let cap = self.capacity();
        let out = (0..self.len)
            .filter_map(|i| self.events[(start + i) % cap].take())
            .collect();
        self.head = 0;
        self.len = 0;
        out
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// A passive listener receives events read-only.
pub type PassiveListener = Box<dyn FnMut(&Event)>;

/// Buffers events, tracks suppression, and fans out to listeners.
pub struct EventBus {
    buffer: EventBuffer,
    suppressed: [bool; EVENT_KIND_COUNT],
    listeners: [Vec<PassiveListener>; EVENT_KIND_COUNT],
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("buffer", &self.buffer)
            .field("suppressed", &self.suppressed)
            .finish_non_exhaustive()
    }
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: EventBuffer::new(capacity),
            suppressed: [false; EVENT_KIND_COUNT],
            listeners: Default::default(),
        }
    }

    /// Stop buffering `kind`.
    pub fn suppress(&mut self, kind: EventKind) {
        self.suppressed[kind.index()] = true;
    }

    pub fn unsuppress(&mut self, kind: EventKind) {
        self.suppressed[kind.index()] = false;
    }

    pub fn is_suppressed(&self, kind: EventKind) -> bool {
        self.suppressed[kind.index()]
    }

    /// Buffer an event. No-op if its kind is suppressed.
    pub fn emit(&mut self, event: Event) {
        if self.suppressed[event.kind().index()] {
            return;
        }
        self.buffer.push(event);
    }

    /// Register a passive listener. Listeners run in registration order.
    pub fn on_passive(&mut self, kind: EventKind, listener: PassiveListener) {
        self.listeners[kind.index()].push(listener);
    }

    /// Hand every buffered event, oldest first, to the listeners of its
    /// kind, then clear the buffer.
    pub fn deliver(&mut self) {
        for event in self.buffer.take_all() {
            for listener in &mut self.listeners[event.kind().index()] {
                listener(&event);
            }
        }
    }

    /// Remove and return buffered events without running listeners.
    pub fn drain(&mut self) -> Vec<Event> {
        self.buffer.take_all()
    }

    pub fn buffered(&self) -> impl Iterator<Item = &Event> + '_ {
        self.buffer.iter()
    }

    pub fn buffered_count(&self) -> usize {
        self.buffer.len()
    }

    /// Total events emitted (including dropped ones).
    pub fn total_emitted(&self) -> u64 {
        self.buffer.total_written()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
