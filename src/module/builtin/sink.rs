//! `SinkModule`: records every message it receives.

use crate::error::SimResult;
use crate::simulation::ModuleContext;
use crate::time::SimTime;

use crate::module::gate::GateDecl;
use crate::module::message::Message;
use crate::module::traits::SimpleModule;

/// A module with a single input gate `in` that keeps everything.
///
/// It has no behavior of its own, which makes it the natural far end of
/// a link under test: assert on `received` to check what was sent, when
/// it arrived and whether it was modified on the way.
#[derive(Debug, Clone, Default)]
pub struct SinkModule {
    /// `(arrival time, message)` in delivery order.
    pub received: Vec<(SimTime, Message)>,
}

impl SinkModule {
    pub const GATE_IN: &'static str = "in";

    pub fn new() -> Self {
        SinkModule::default()
    }
}

impl SimpleModule for SinkModule {
    fn gates(&self) -> Vec<GateDecl> {
        vec![GateDecl::input(Self::GATE_IN)]
    }

    fn handle_message(&mut self, ctx: &mut ModuleContext, msg: Message) -> SimResult<()> {
        self.received.push((ctx.now(), msg));
        Ok(())
    }

    fn finish(&mut self) {
        tracing::debug!(received = self.received.len(), "sink finished");
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}
