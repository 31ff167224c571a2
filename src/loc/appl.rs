//! `LocAlgorithm` trait and the `LocApplModule` adapter that turns an
//! algorithm into a kernel module.

use crate::error::SimResult;
use crate::event::EventId;
use crate::module::{GateDecl, Message, SimpleModule};
use crate::simulation::ModuleContext;
use crate::time::SimTime;

use super::base::{BaseLocAppl, LocGates, LocInput, BASE_INIT_STAGES, LOC_GATES};

// ── LocContext ────────────────────────────────────────────────────────

/// What an algorithm can do while handling a message: the base module's
/// four send helpers plus the rest of the host context.
pub struct LocContext<'a, 'k> {
    base: &'a BaseLocAppl,
    ctx: &'a mut ModuleContext<'k>,
}

impl<'a, 'k> LocContext<'a, 'k> {
    pub fn new(base: &'a BaseLocAppl, ctx: &'a mut ModuleContext<'k>) -> Self {
        LocContext { base, ctx }
    }

    pub fn now(&self) -> SimTime {
        self.ctx.now()
    }

    /// `headerLength` as read in stage 0.
    pub fn header_length(&self) -> Option<u64> {
        self.base.header_length()
    }

    pub fn gates(&self) -> Option<&LocGates> {
        self.base.gates()
    }

    /// The underlying host context, for parameters and timers.
    pub fn host(&mut self) -> &mut ModuleContext<'k> {
        &mut *self.ctx
    }

    /// Send to the lower layer now.
    pub fn send_down(&mut self, msg: Message) -> SimResult<EventId> {
        self.base.send_down(self.ctx, msg)
    }

    /// Send to the lower layer `delay` ticks from now.
    pub fn send_delayed_down(&mut self, msg: Message, delay: u64) -> SimResult<EventId> {
        self.base.send_delayed_down(self.ctx, msg, delay)
    }

    /// Send on the lower control port now.
    pub fn send_control_down(&mut self, msg: Message) -> SimResult<EventId> {
        self.base.send_control_down(self.ctx, msg)
    }

    /// Send to the peer localization module now.
    pub fn send_loc(&mut self, msg: Message) -> SimResult<EventId> {
        self.base.send_loc(self.ctx, msg)
    }

    /// Schedule a timer; it comes back through `handle_self_msg`.
    pub fn schedule_after(&mut self, delay: u64, msg: Message) -> SimResult<EventId> {
        self.ctx.schedule_after(delay, msg)
    }
}

// ── LocAlgorithm ──────────────────────────────────────────────────────

/// A localization algorithm.
///
/// Implement the four handlers; [`LocApplModule`] decides which one a
/// message goes to by the gate it arrived on. Each handler owns the
/// message and either drops it or sends it on.
pub trait LocAlgorithm: 'static {
    /// Stages the algorithm needs. The module runs at least
    /// [`BASE_INIT_STAGES`].
    fn num_init_stages(&self) -> usize {
        BASE_INIT_STAGES
    }

    /// Runs after the base for every stage, so gates are already
    /// resolved in stage 0.
    fn initialize(&mut self, _stage: usize, _loc: &mut LocContext) -> SimResult<()> {
        Ok(())
    }

    /// Data from the layer below (`lowergateIn`).
    fn handle_lower_msg(&mut self, loc: &mut LocContext, msg: Message) -> SimResult<()>;

    /// Control information from the layer below (`lowerControlIn`).
    fn handle_lower_control(&mut self, loc: &mut LocContext, msg: Message) -> SimResult<()>;

    /// A message from the peer localization module (`locgateIn`).
    fn handle_loc_msg(&mut self, loc: &mut LocContext, msg: Message) -> SimResult<()>;

    /// Timers and anything that did not arrive on one of the three gates
    /// above.
    fn handle_self_msg(&mut self, loc: &mut LocContext, msg: Message) -> SimResult<()>;

    fn finish(&mut self) {}
}

// ── LocApplModule ─────────────────────────────────────────────────────

/// Kernel module wrapping a [`LocAlgorithm`] with the base localization
/// gates and dispatch.
#[derive(Debug, Clone, Default)]
pub struct LocApplModule<A> {
    base: BaseLocAppl,
    algorithm: A,
}

impl<A: LocAlgorithm> LocApplModule<A> {
    pub fn new(algorithm: A) -> Self {
        LocApplModule {
            base: BaseLocAppl::new(),
            algorithm,
        }
    }

    pub fn base(&self) -> &BaseLocAppl {
        &self.base
    }

    pub fn algorithm(&self) -> &A {
        &self.algorithm
    }

    pub fn algorithm_mut(&mut self) -> &mut A {
        &mut self.algorithm
    }
}

impl<A: LocAlgorithm> SimpleModule for LocApplModule<A> {
    fn gates(&self) -> Vec<GateDecl> {
        LOC_GATES.to_vec()
    }

    fn num_init_stages(&self) -> usize {
        self.algorithm.num_init_stages().max(BASE_INIT_STAGES)
    }

    fn initialize(&mut self, stage: usize, ctx: &mut ModuleContext) -> SimResult<()> {
        self.base.initialize(stage, ctx)?;
        let mut loc = LocContext::new(&self.base, ctx);
        self.algorithm.initialize(stage, &mut loc)
    }

    fn handle_message(&mut self, ctx: &mut ModuleContext, msg: Message) -> SimResult<()> {
        let target = self.base.dispatch_target(ctx, &msg)?;
        let mut loc = LocContext::new(&self.base, ctx);
        match target {
            LocInput::Lower => self.algorithm.handle_lower_msg(&mut loc, msg),
            LocInput::LowerControl => {
                tracing::debug!(module = loc.host().module_name(), "handle lower control");
                self.algorithm.handle_lower_control(&mut loc, msg)
            }
            LocInput::Loc => {
                tracing::debug!(module = loc.host().module_name(), "handle localization message");
                self.algorithm.handle_loc_msg(&mut loc, msg)
            }
            LocInput::SelfMsg => self.algorithm.handle_self_msg(&mut loc, msg),
        }
    }

    fn finish(&mut self) {
        self.algorithm.finish();
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}
