//! Events of the discrete-event kernel.
//!
//! Every message in flight is one [`Event`] on the future event set. An
//! event is either a delivery onto a module's input gate or a self
//! message (timer) that arrives without a gate.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::module::{GateId, Message, ModuleId};
use crate::time::SimTime;

// ── Event ID ──────────────────────────────────────────────────────────

/// Strictly increasing event identifier.
///
/// Breaks ties between events scheduled for the same instant: the one
/// created first fires first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(u64);

impl EventId {
    #[inline]
    pub fn new(raw: u64) -> Self {
        EventId(raw)
    }

    #[inline]
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "E#{}", self.0)
    }
}

/// Mints [`EventId`]s. One per scheduler.
#[derive(Debug, Clone, Default)]
pub struct EventIdGen {
    next: u64,
}

impl EventIdGen {
    pub fn new() -> Self {
        EventIdGen { next: 0 }
    }

    pub fn next_id(&mut self) -> EventId {
        let id = EventId(self.next);
        self.next += 1;
        id
    }

    /// The id the next call to `next_id` will return.
    pub fn peek(&self) -> EventId {
        EventId(self.next)
    }
}

// ── Event kind ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    /// `message` reaches input `gate` of `module`.
    Deliver {
        module: ModuleId,
        gate: GateId,
        message: Message,
    },
    /// `module` receives a message it scheduled for itself.
    SelfMessage { module: ModuleId, message: Message },
}

impl EventKind {
    /// The module this event will be handed to.
    pub fn target(&self) -> ModuleId {
        match self {
            EventKind::Deliver { module, .. } | EventKind::SelfMessage { module, .. } => *module,
        }
    }

    pub fn message(&self) -> &Message {
        match self {
            EventKind::Deliver { message, .. } | EventKind::SelfMessage { message, .. } => message,
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventKind::Deliver {
                module,
                gate,
                message,
            } => write!(f, "Deliver({} @ {}.{})", message, module, gate),
            EventKind::SelfMessage { module, message } => {
                write!(f, "Self({} @ {})", message, module)
            }
        }
    }
}

// ── Event ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub id: EventId,
    pub at: SimTime,
    pub kind: EventKind,
}

impl Event {
    pub fn new(id: EventId, at: SimTime, kind: EventKind) -> Self {
        Event { id, at, kind }
    }
}

/// Smallest `(at, id)` compares greatest, so a `BinaryHeap<Event>` pops
/// the earliest event first.
impl Ord for Event {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .at
            .cmp(&self.at)
            .then_with(|| other.id.cmp(&self.id))
    }
}

impl PartialOrd for Event {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
