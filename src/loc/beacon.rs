//! `BeaconLoc`: centroid localization from anchor beacons.
//!
//! Anchors know their position and broadcast it down the stack at a
//! fixed interval. Every other node collects the anchor positions it
//! hears, from beacons on the lower port or reports on the peer port,
//! and estimates its own position as their centroid.
//!
//! Parameters:
//!
//! | name | type | default | |
//! |---|---|---|---|
//! | `headerLength` | int | required | beacon header, bits |
//! | `anchor` | bool | `false` | |
//! | `x`, `y` | double | required for anchors | |
//! | `beaconInterval` | int | required for anchors | ticks |
//! | `maxBeacons` | int | `0` | `0` means no limit |
//! | `startDelay` | int | `0` | ticks before the first beacon |
//! | `queryAt` | int | unset | ask the peer for its position at this tick |

use std::collections::BTreeMap;

use crate::error::{SimError, SimResult};
use crate::module::{Message, MessagePayload, ModuleId};
use crate::time::SimTime;

use super::appl::{LocAlgorithm, LocContext};

pub const BEACON_TIMER: i32 = 100;
pub const LOC_BEACON: i32 = 101;
pub const LOC_QUERY: i32 = 102;
pub const LOC_REPORT: i32 = 103;
pub const ESTIMATE_READY: i32 = 104;
pub const QUERY_TIMER: i32 = 105;

const POSITION_BITS: u64 = 128;

// ── Position ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Position { x, y }
    }

    /// 16 bytes: `x` then `y`, little-endian.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(16);
        out.extend_from_slice(&self.x.to_le_bytes());
        out.extend_from_slice(&self.y.to_le_bytes());
        out
    }

    pub fn decode(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != 16 {
            return None;
        }
        let x = f64::from_le_bytes(bytes[..8].try_into().ok()?);
        let y = f64::from_le_bytes(bytes[8..].try_into().ok()?);
        Some(Position { x, y })
    }

    pub fn from_payload(payload: &MessagePayload) -> Option<Self> {
        match payload {
            MessagePayload::Data(bytes) => Position::decode(bytes),
            _ => None,
        }
    }

    /// Mean of `points`; `None` for an empty set.
    pub fn centroid<'a>(points: impl IntoIterator<Item = &'a Position>) -> Option<Position> {
        let (mut sx, mut sy, mut n) = (0.0, 0.0, 0u32);
        for p in points {
            sx += p.x;
            sy += p.y;
            n += 1;
        }
        (n > 0).then(|| Position::new(sx / n as f64, sy / n as f64))
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.2}, {:.2})", self.x, self.y)
    }
}

// ── BeaconLoc ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct BeaconLoc {
    anchor: bool,
    own_position: Option<Position>,
    interval: u64,
    max_beacons: u64,
    start_delay: u64,
    query_at: Option<u64>,

    pub beacons_sent: u64,
    /// Anchor positions heard so far, by sending module.
    pub anchors: BTreeMap<ModuleId, Position>,
    pub estimate: Option<Position>,
    pub control_events: u64,
    pub queries_answered: u64,
    /// Messages no handler had a use for.
    pub dropped: u64,
}

impl BeaconLoc {
    pub fn new() -> Self {
        BeaconLoc::default()
    }

    pub fn is_anchor(&self) -> bool {
        self.anchor
    }

    /// Anchors report their configured position, others their estimate.
    pub fn position(&self) -> Option<Position> {
        if self.anchor {
            self.own_position
        } else {
            self.estimate
        }
    }

    fn read_params(&mut self, loc: &mut LocContext) -> SimResult<()> {
        let ctx = loc.host();
        self.anchor = match ctx.par_opt("anchor") {
            Some(v) => v.as_bool("anchor")?,
            None => false,
        };
        if let Some(v) = ctx.par_opt("maxBeacons") {
            self.max_beacons = v.as_uint("maxBeacons")?;
        }
        if let Some(v) = ctx.par_opt("startDelay") {
            self.start_delay = v.as_uint("startDelay")?;
        }
        if let Some(v) = ctx.par_opt("queryAt") {
            self.query_at = Some(v.as_uint("queryAt")?);
        }
        if self.anchor {
            let x = ctx.par("x")?.as_double("x")?;
            let y = ctx.par("y")?.as_double("y")?;
            self.own_position = Some(Position::new(x, y));
            self.interval = ctx.par("beaconInterval")?.as_uint("beaconInterval")?;
            if self.interval == 0 {
                return Err(SimError::ParamType {
                    param: "beaconInterval".into(),
                    expected: "positive int",
                    found: "zero",
                });
            }
        }
        Ok(())
    }

    fn beacon(&self, loc: &LocContext, position: Position) -> Message {
        Message::new("beacon")
            .with_kind(LOC_BEACON)
            .with_payload(MessagePayload::Data(position.encode()))
            .with_bit_length(loc.header_length().unwrap_or(0) + POSITION_BITS)
    }

    fn more_beacons_allowed(&self) -> bool {
        self.max_beacons == 0 || self.beacons_sent < self.max_beacons
    }

    fn record_anchor(&mut self, loc: &mut LocContext, msg: &Message) -> SimResult<()> {
        let (Some(sender), Some(position)) =
            (msg.sender_module(), Position::from_payload(msg.payload()))
        else {
            self.dropped += 1;
            return Ok(());
        };
        self.anchors.insert(sender, position);
        if self.anchor {
            return Ok(());
        }

        let first = self.estimate.is_none();
        self.estimate = Position::centroid(self.anchors.values());
        let Some(estimate) = self.estimate else {
            return Ok(());
        };
        tracing::debug!(
            module = loc.host().module_name(),
            anchors = self.anchors.len(),
            %estimate,
            "position estimate updated"
        );

        if first {
            let control_out = loc.gates().map(|g| g.lower_control_out);
            if let Some(gate) = control_out {
                if loc.host().is_connected(gate) {
                    let ready = Message::new("estimate-ready")
                        .with_kind(ESTIMATE_READY)
                        .with_payload(MessagePayload::Data(estimate.encode()));
                    loc.send_control_down(ready)?;
                }
            }
        }
        Ok(())
    }
}

impl LocAlgorithm for BeaconLoc {
    fn initialize(&mut self, stage: usize, loc: &mut LocContext) -> SimResult<()> {
        match stage {
            0 => self.read_params(loc),
            1 => {
                if let Some(at) = self.query_at {
                    let timer = Message::new("query-timer").with_kind(QUERY_TIMER);
                    loc.host().schedule_at(SimTime::new(at), timer)?;
                }
                let Some(position) = self.own_position.filter(|_| self.anchor) else {
                    return Ok(());
                };
                if !self.more_beacons_allowed() {
                    return Ok(());
                }
                let beacon = self.beacon(loc, position);
                loc.send_delayed_down(beacon, self.start_delay)?;
                self.beacons_sent += 1;
                if self.more_beacons_allowed() {
                    let timer = Message::new("beacon-timer").with_kind(BEACON_TIMER);
                    loc.schedule_after(self.start_delay + self.interval, timer)?;
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn handle_lower_msg(&mut self, loc: &mut LocContext, msg: Message) -> SimResult<()> {
        if msg.kind() == LOC_BEACON {
            self.record_anchor(loc, &msg)
        } else {
            self.dropped += 1;
            Ok(())
        }
    }

    fn handle_lower_control(&mut self, _loc: &mut LocContext, msg: Message) -> SimResult<()> {
        self.control_events += 1;
        tracing::trace!(control = %msg, "lower control received");
        Ok(())
    }

    fn handle_loc_msg(&mut self, loc: &mut LocContext, msg: Message) -> SimResult<()> {
        match msg.kind() {
            LOC_QUERY => {
                let payload = match self.position() {
                    Some(p) => MessagePayload::Data(p.encode()),
                    None => MessagePayload::Empty,
                };
                let report = Message::new("loc-report")
                    .with_kind(LOC_REPORT)
                    .with_bit_length(loc.header_length().unwrap_or(0) + payload.bit_len())
                    .with_payload(payload);
                loc.send_loc(report)?;
                self.queries_answered += 1;
                Ok(())
            }
            LOC_REPORT => self.record_anchor(loc, &msg),
            _ => {
                self.dropped += 1;
                Ok(())
            }
        }
    }

    fn handle_self_msg(&mut self, loc: &mut LocContext, msg: Message) -> SimResult<()> {
        if msg.kind() == QUERY_TIMER {
            let query = Message::new("loc-query")
                .with_kind(LOC_QUERY)
                .with_bit_length(loc.header_length().unwrap_or(0));
            loc.send_loc(query)?;
            return Ok(());
        }
        let position = match self.own_position {
            Some(p) if msg.kind() == BEACON_TIMER && self.anchor => p,
            _ => {
                self.dropped += 1;
                return Ok(());
            }
        };
        if !self.more_beacons_allowed() {
            return Ok(());
        }
        let beacon = self.beacon(loc, position);
        loc.send_down(beacon)?;
        self.beacons_sent += 1;
        if self.more_beacons_allowed() {
            loc.schedule_after(self.interval, msg)?;
        }
        Ok(())
    }

    fn finish(&mut self) {
        tracing::info!(
            anchor = self.anchor,
            beacons_sent = self.beacons_sent,
            anchors_heard = self.anchors.len(),
            estimate = ?self.estimate,
            "localization finished"
        );
    }
}
