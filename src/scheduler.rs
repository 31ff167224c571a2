//! Future event set.
//!
//! A `BinaryHeap` over [`Event`]'s reversed ordering, so it pops by
//! ascending `(at, id)`. Ids come from a single generator, which makes the
//! dispatch order a pure function of the scheduling calls.

use std::collections::BinaryHeap;

use crate::event::{Event, EventId, EventIdGen, EventKind};
use crate::time::SimTime;

#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    queue: BinaryHeap<Event>,
    id_gen: EventIdGen,
}

impl Scheduler {
    pub fn new() -> Self {
        Scheduler::default()
    }

    /// Insert an event for instant `at` and return its id.
    pub fn schedule(&mut self, at: SimTime, kind: EventKind) -> EventId {
        let id = self.id_gen.next_id();
        tracing::trace!(%id, %at, event = %kind, "scheduled");
        self.queue.push(Event::new(id, at, kind));
        id
    }

    /// Remove and return the earliest event.
    pub fn pop_next(&mut self) -> Option<Event> {
        self.queue.pop()
    }

    /// When the earliest pending event fires, if there is one.
    pub fn peek_time(&self) -> Option<SimTime> {
        self.queue.peek().map(|e| e.at)
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn next_event_id(&self) -> EventId {
        self.id_gen.peek()
    }

    /// Empty the queue in dispatch order.
    pub fn drain_ordered(&mut self) -> Vec<Event> {
        let mut events = Vec::with_capacity(self.queue.len());
        while let Some(e) = self.queue.pop() {
            events.push(e);
        }
        events
    }
}
