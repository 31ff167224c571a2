//! Messages exchanged between modules, and their payloads.

use serde::{Deserialize, Serialize};

use crate::time::SimTime;

use super::gate::GateId;
use super::id::ModuleId;

// ── MessagePayload ────────────────────────────────────────────────────

/// Opaque body carried by a [`Message`].
///
/// `Text` exists for readable tests and scenarios; protocol code should
/// encode into `Data`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MessagePayload {
    Data(Vec<u8>),
    Text(String),
    #[default]
    Empty,
}

impl MessagePayload {
    /// Payload size in bits.
    pub fn bit_len(&self) -> u64 {
        match self {
            MessagePayload::Data(d) => d.len() as u64 * 8,
            MessagePayload::Text(s) => s.len() as u64 * 8,
            MessagePayload::Empty => 0,
        }
    }
}

impl std::fmt::Display for MessagePayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessagePayload::Data(d) => write!(f, "Data({} bytes)", d.len()),
            MessagePayload::Text(s) => {
                if s.chars().count() > 32 {
                    let head: String = s.chars().take(32).collect();
                    write!(f, "Text(\"{}…\")", head)
                } else {
                    write!(f, "Text({:?})", s)
                }
            }
            MessagePayload::Empty => write!(f, "Empty"),
        }
    }
}

// ── Message ───────────────────────────────────────────────────────────

/// A simulation message.
///
/// The application owns `name`, `kind`, `payload` and `bit_length`. The
/// kernel stamps the routing metadata (arrival gate, sender, timestamps)
/// when the message is sent and again when it is delivered; modules only
/// read it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Message {
    name: String,
    kind: i32,
    payload: MessagePayload,
    bit_length: u64,
    arrival_gate: Option<GateId>,
    sender_module: Option<ModuleId>,
    sender_gate: Option<GateId>,
    send_time: SimTime,
    arrival_time: SimTime,
}

impl Message {
    pub fn new(name: impl Into<String>) -> Self {
        Message {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_kind(mut self, kind: i32) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_payload(mut self, payload: MessagePayload) -> Self {
        self.payload = payload;
        self
    }

    pub fn with_bit_length(mut self, bits: u64) -> Self {
        self.bit_length = bits;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> i32 {
        self.kind
    }

    pub fn payload(&self) -> &MessagePayload {
        &self.payload
    }

    /// Take the payload out, leaving `Empty` behind.
    pub fn take_payload(&mut self) -> MessagePayload {
        std::mem::take(&mut self.payload)
    }

    pub fn bit_length(&self) -> u64 {
        self.bit_length
    }

    pub fn set_bit_length(&mut self, bits: u64) {
        self.bit_length = bits;
    }

    /// Gate the message last arrived on; `None` for self messages.
    pub fn arrival_gate(&self) -> Option<GateId> {
        self.arrival_gate
    }

    pub fn sender_module(&self) -> Option<ModuleId> {
        self.sender_module
    }

    pub fn sender_gate(&self) -> Option<GateId> {
        self.sender_gate
    }

    pub fn send_time(&self) -> SimTime {
        self.send_time
    }

    pub fn arrival_time(&self) -> SimTime {
        self.arrival_time
    }

    /// A message a module scheduled for itself (a timer).
    pub fn is_self_message(&self) -> bool {
        self.arrival_gate.is_none()
    }

    pub(crate) fn stamp_sent(&mut self, from: ModuleId, gate: Option<GateId>, at: SimTime) {
        self.sender_module = Some(from);
        self.sender_gate = gate;
        self.send_time = at;
    }

    pub(crate) fn stamp_arrival(&mut self, gate: Option<GateId>, at: SimTime) {
        self.arrival_gate = gate;
        self.arrival_time = at;
    }
}

impl std::fmt::Display for Message {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}(kind={}, {})", self.name, self.kind, self.payload)
    }
}
