//! `SimpleModule` trait and the sending half of `ModuleContext`.

use crate::error::{SimError, SimResult};
use crate::event::{EventId, EventKind};
use crate::simulation::ModuleContext;

use super::gate::{GateDecl, GateDirection, GateId};
use super::message::Message;

// ── SimpleModule ──────────────────────────────────────────────────────

/// Trait implemented by every module the kernel can host.
///
/// # Contract
///
/// Implementations **must**:
/// - Declare their full gate interface in [`gates`](Self::gates); the
///   kernel never adds gates later.
/// - Route every side effect through the [`ModuleContext`] they are given.
/// - Be deterministic for equal inputs.
///
/// # Example
///
/// ```rust
/// use locsim::module::{GateDecl, Message, SimpleModule};
/// use locsim::{ModuleContext, SimResult};
///
/// struct Counter { seen: u32 }
///
/// impl SimpleModule for Counter {
///     fn gates(&self) -> Vec<GateDecl> {
///         vec![GateDecl::input("in")]
///     }
///     fn handle_message(&mut self, _ctx: &mut ModuleContext, _msg: Message) -> SimResult<()> {
///         self.seen += 1;
///         Ok(())
///     }
///     fn as_any(&self) -> &dyn std::any::Any { self }
///     fn as_any_mut(&mut self) -> &mut dyn std::any::Any { self }
/// }
/// ```
pub trait SimpleModule {
    /// The gates this module exposes. Ids follow the order returned here.
    fn gates(&self) -> Vec<GateDecl>;

    /// How many initialization stages this module takes part in.
    fn num_init_stages(&self) -> usize {
        1
    }

    /// Called once per stage in `0..num_init_stages()`.
    fn initialize(&mut self, _stage: usize, _ctx: &mut ModuleContext) -> SimResult<()> {
        Ok(())
    }

    /// Called once for every message delivered to this module.
    fn handle_message(&mut self, ctx: &mut ModuleContext, msg: Message) -> SimResult<()>;

    /// Called by [`Simulation::finish`](crate::Simulation::finish).
    fn finish(&mut self) {}

    /// Downcast support for `Simulation::module::<T>()`.
    fn as_any(&self) -> &dyn std::any::Any;
    fn as_any_mut(&mut self) -> &mut dyn std::any::Any;
}

// ── ModuleContext sending ─────────────────────────────────────────────

impl ModuleContext<'_> {
    /// Send `msg` out of output gate `gate` now.
    ///
    /// The message reaches the connected input gate after the link's own
    /// delay.
    pub fn send(&mut self, msg: Message, gate: GateId) -> SimResult<EventId> {
        self.send_delayed(msg, 0, gate)
    }

    /// Send `msg` out of `gate` as if it left `delay` ticks from now.
    ///
    /// Fails if `gate` is not one of this module's output gates or has no
    /// link attached.
    pub fn send_delayed(&mut self, mut msg: Message, delay: u64, gate: GateId) -> SimResult<EventId> {
        let decl = self.gates.decl(gate).ok_or_else(|| SimError::GateNotFound {
            module: self.name.to_string(),
            gate: gate.to_string(),
        })?;
        if decl.direction != GateDirection::Output {
            return Err(SimError::WrongGateDirection {
                module: self.name.to_string(),
                gate: decl.name.to_string(),
                expected: GateDirection::Output,
            });
        }
        let link = *self
            .links
            .get(&(self.module, gate))
            .ok_or_else(|| SimError::GateNotConnected {
                module: self.name.to_string(),
                gate: decl.name.to_string(),
            })?;

        let at = self
            .now
            .checked_add(delay)
            .and_then(|t| t.checked_add(link.delay))
            .ok_or(SimError::TimeOverflow)?;

        msg.stamp_sent(self.module, Some(gate), self.now);
        tracing::trace!(
            module = self.name,
            gate = decl.name,
            msg = %msg,
            %at,
            "send"
        );
        Ok(self.scheduler.schedule(
            at,
            EventKind::Deliver {
                module: link.to,
                gate: link.gate,
                message: msg,
            },
        ))
    }
}
