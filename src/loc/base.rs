//! `BaseLocAppl`: gate bookkeeping and dispatch shared by every
//! localization application.

use crate::error::{SimError, SimResult};
use crate::event::EventId;
use crate::module::{GateDecl, GateId, Message};
use crate::simulation::ModuleContext;

pub const LOWER_GATE_IN: &str = "lowergateIn";
pub const LOWER_GATE_OUT: &str = "lowergateOut";
pub const LOWER_CONTROL_IN: &str = "lowerControlIn";
pub const LOWER_CONTROL_OUT: &str = "lowerControlOut";
pub const LOC_GATE_IN: &str = "locgateIn";
pub const LOC_GATE_OUT: &str = "locgateOut";

/// Parameter holding the header size, in bits.
pub const HEADER_LENGTH_PARAM: &str = "headerLength";

/// Stages a localization application takes part in. Only stage 0 does
/// anything in the base.
pub const BASE_INIT_STAGES: usize = 2;

/// The interface every localization application declares.
pub const LOC_GATES: [GateDecl; 6] = [
    GateDecl::input(LOWER_GATE_IN),
    GateDecl::output(LOWER_GATE_OUT),
    GateDecl::input(LOWER_CONTROL_IN),
    GateDecl::output(LOWER_CONTROL_OUT),
    GateDecl::input(LOC_GATE_IN),
    GateDecl::output(LOC_GATE_OUT),
];

/// Gate ids resolved in stage 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocGates {
    pub lower_in: GateId,
    pub lower_out: GateId,
    pub lower_control_in: GateId,
    pub lower_control_out: GateId,
    pub loc_in: GateId,
    pub loc_out: GateId,
}

impl LocGates {
    fn resolve(ctx: &ModuleContext) -> SimResult<Self> {
        Ok(LocGates {
            lower_out: ctx.find_gate(LOWER_GATE_OUT)?,
            lower_in: ctx.find_gate(LOWER_GATE_IN)?,
            lower_control_in: ctx.find_gate(LOWER_CONTROL_IN)?,
            lower_control_out: ctx.find_gate(LOWER_CONTROL_OUT)?,
            loc_in: ctx.find_gate(LOC_GATE_IN)?,
            loc_out: ctx.find_gate(LOC_GATE_OUT)?,
        })
    }
}

/// Which handler a message goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocInput {
    /// Arrived on `lowergateIn`.
    Lower,
    /// Arrived on `lowerControlIn`.
    LowerControl,
    /// Arrived on `locgateIn`.
    Loc,
    /// Anything else, timers included.
    SelfMsg,
}

/// Resolved state of a localization application.
///
/// Empty until stage 0 has run; from then on the gate ids and header
/// length never change.
#[derive(Debug, Clone, Default)]
pub struct BaseLocAppl {
    resolved: Option<(u64, LocGates)>,
}

impl BaseLocAppl {
    pub fn new() -> Self {
        BaseLocAppl::default()
    }

    /// A base that is already resolved, for driving handlers without a
    /// kernel.
    pub fn resolved(header_length: u64, gates: LocGates) -> Self {
        BaseLocAppl {
            resolved: Some((header_length, gates)),
        }
    }

    /// Stage 0 reads `headerLength` and resolves the six gates. Other
    /// stages do nothing.
    ///
    /// Resolving twice is refused and keeps the first values.
    pub fn initialize(&mut self, stage: usize, ctx: &mut ModuleContext) -> SimResult<()> {
        if stage != 0 {
            return Ok(());
        }
        if self.resolved.is_some() {
            tracing::warn!(module = ctx.module_name(), "stage 0 requested twice");
            return Err(SimError::AlreadyInitialized(ctx.module_name().to_string()));
        }
        let header_length = ctx
            .par(HEADER_LENGTH_PARAM)?
            .as_uint(HEADER_LENGTH_PARAM)?;
        let gates = LocGates::resolve(ctx)?;
        tracing::debug!(
            module = ctx.module_name(),
            header_length,
            "localization gates resolved"
        );
        self.resolved = Some((header_length, gates));
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.resolved.is_some()
    }

    pub fn header_length(&self) -> Option<u64> {
        self.resolved.map(|(len, _)| len)
    }

    pub fn gates(&self) -> Option<&LocGates> {
        self.resolved.as_ref().map(|(_, gates)| gates)
    }

    fn require(&self, ctx: &ModuleContext) -> SimResult<&LocGates> {
        self.gates()
            .ok_or_else(|| SimError::NotInitialized(ctx.module_name().to_string()))
    }

    /// Map an arrival gate to its handler. Checked in the order lower
    /// data, lower control, localization; everything else is a self
    /// message.
    pub fn classify(&self, arrival: Option<GateId>) -> Option<LocInput> {
        let gates = self.gates()?;
        Some(match arrival {
            Some(g) if g == gates.lower_in => LocInput::Lower,
            Some(g) if g == gates.lower_control_in => LocInput::LowerControl,
            Some(g) if g == gates.loc_in => LocInput::Loc,
            _ => LocInput::SelfMsg,
        })
    }

    pub(crate) fn dispatch_target(&self, ctx: &ModuleContext, msg: &Message) -> SimResult<LocInput> {
        self.classify(msg.arrival_gate())
            .ok_or_else(|| SimError::NotInitialized(ctx.module_name().to_string()))
    }

    pub fn send_down(&self, ctx: &mut ModuleContext, msg: Message) -> SimResult<EventId> {
        let gate = self.require(ctx)?.lower_out;
        ctx.send(msg, gate)
    }

    pub fn send_delayed_down(
        &self,
        ctx: &mut ModuleContext,
        msg: Message,
        delay: u64,
    ) -> SimResult<EventId> {
        let gate = self.require(ctx)?.lower_out;
        ctx.send_delayed(msg, delay, gate)
    }

    pub fn send_control_down(&self, ctx: &mut ModuleContext, msg: Message) -> SimResult<EventId> {
        let gate = self.require(ctx)?.lower_control_out;
        ctx.send(msg, gate)
    }

    pub fn send_loc(&self, ctx: &mut ModuleContext, msg: Message) -> SimResult<EventId> {
        let gate = self.require(ctx)?.loc_out;
        ctx.send(msg, gate)
    }
}
