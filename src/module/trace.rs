//! TraceEntry: one line of the kernel's dispatch record.

use serde::Serialize;

use crate::event::EventId;
use crate::time::SimTime;

use super::gate::GateId;
use super::id::ModuleId;

/// A message dispatched to a module.
///
/// `Simulation` appends one entry per event; tests assert on it and the
/// CLI can dump it as JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TraceEntry {
    pub time: SimTime,
    pub event_id: EventId,
    pub module: ModuleId,
    /// `None` for self messages.
    pub arrival_gate: Option<GateId>,
    pub message: String,
    pub kind: i32,
}

impl std::fmt::Display for TraceEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let gate = match self.arrival_gate {
            Some(g) => g.to_string(),
            None => "self".to_string(),
        };
        write!(
            f,
            "[t={} E#{} {}.{}] {} (kind={})",
            self.time.ticks(),
            self.event_id.raw(),
            self.module,
            gate,
            self.message,
            self.kind,
        )
    }
}
