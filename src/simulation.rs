//! The simulation kernel.
//!
//! [`Simulation`] owns the module instances, the gate connections between
//! them and the future event set. It runs the staged initialization,
//! then pops events one by one, advances time and hands each message to
//! the module it is addressed to. Everything is single-threaded: a module
//! is never re-entered while it is handling a message.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::{SimError, SimResult};
use crate::event::{EventId, EventKind};
use crate::module::{
    GateDirection, GateId, GateTable, Message, ModuleId, ParamValue, Params, SimpleModule,
    TraceEntry,
};
use crate::scheduler::Scheduler;
use crate::time::SimTime;

// ── Links ─────────────────────────────────────────────────────────────

/// Where an output gate leads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Link {
    pub to: ModuleId,
    pub gate: GateId,
    /// Propagation delay added to every message sent over this link.
    pub delay: u64,
}

// ── Module context ────────────────────────────────────────────────────

/// The host services a module sees while it is initializing or handling
/// a message.
///
/// The context is rebuilt for every call and borrows the kernel, so a
/// module can only affect the simulation through it. Sending lives in
/// [`crate::module::traits`].
pub struct ModuleContext<'a> {
    pub(crate) scheduler: &'a mut Scheduler,
    pub(crate) links: &'a BTreeMap<(ModuleId, GateId), Link>,
    pub(crate) module: ModuleId,
    pub(crate) name: &'a str,
    pub(crate) gates: &'a GateTable,
    pub(crate) params: &'a Params,
    pub(crate) now: SimTime,
}

impl<'a> ModuleContext<'a> {
    #[inline]
    pub fn now(&self) -> SimTime {
        self.now
    }

    #[inline]
    pub fn module_id(&self) -> ModuleId {
        self.module
    }

    pub fn module_name(&self) -> &str {
        self.name
    }

    /// Look up a configured parameter of this module.
    pub fn par(&self, name: &str) -> SimResult<&ParamValue> {
        self.params.get(name).ok_or_else(|| SimError::ParamNotFound {
            module: self.name.to_string(),
            param: name.to_string(),
        })
    }

    /// Like [`par`](Self::par) but `None` when the parameter is not set.
    pub fn par_opt(&self, name: &str) -> Option<&ParamValue> {
        self.params.get(name)
    }

    /// Resolve one of this module's declared gates by name.
    pub fn find_gate(&self, name: &str) -> SimResult<GateId> {
        self.gates.find(name).ok_or_else(|| SimError::GateNotFound {
            module: self.name.to_string(),
            gate: name.to_string(),
        })
    }

    pub fn gate_name(&self, gate: GateId) -> Option<&'static str> {
        self.gates.name(gate)
    }

    /// Whether `gate` is an output gate with a link attached.
    pub fn is_connected(&self, gate: GateId) -> bool {
        self.links.contains_key(&(self.module, gate))
    }

    /// Schedule a self message for the absolute instant `at`.
    pub fn schedule_at(&mut self, at: SimTime, mut msg: Message) -> SimResult<EventId> {
        if at < self.now {
            return Err(SimError::NonCausalEvent {
                requested: at,
                current: self.now,
            });
        }
        msg.stamp_sent(self.module, None, self.now);
        Ok(self.scheduler.schedule(
            at,
            EventKind::SelfMessage {
                module: self.module,
                message: msg,
            },
        ))
    }

    /// Schedule a self message `delay` ticks from now.
    pub fn schedule_after(&mut self, delay: u64, msg: Message) -> SimResult<EventId> {
        let at = self.now.checked_add(delay).ok_or(SimError::TimeOverflow)?;
        self.schedule_at(at, msg)
    }
}

// ── Simulation ────────────────────────────────────────────────────────

struct ModuleSlot {
    name: String,
    gates: GateTable,
    params: Params,
    module: Box<dyn SimpleModule>,
}

/// Top-level driver: topology, lifecycle and the event loop.
pub struct Simulation {
    scheduler: Scheduler,
    current_time: SimTime,
    events_processed: u64,
    modules: Vec<ModuleSlot>,
    by_name: BTreeMap<String, ModuleId>,
    links: BTreeMap<(ModuleId, GateId), Link>,
    initialized: bool,
    /// Message of the error that aborted initialization, if any.
    init_failure: Option<String>,
    /// Append-only record of every dispatched message.
    pub trace: Vec<TraceEntry>,
}

impl Simulation {
    pub fn new() -> Self {
        Simulation {
            scheduler: Scheduler::new(),
            current_time: SimTime::ZERO,
            events_processed: 0,
            modules: Vec::new(),
            by_name: BTreeMap::new(),
            links: BTreeMap::new(),
            initialized: false,
            init_failure: None,
            trace: Vec::new(),
        }
    }

    // ── Topology ──────────────────────────────────────────────

    /// Register a module instance under a unique name.
    ///
    /// The module's gate table is built from [`SimpleModule::gates`] here.
    pub fn add_module(
        &mut self,
        name: impl Into<String>,
        params: Params,
        module: Box<dyn SimpleModule>,
    ) -> SimResult<ModuleId> {
        let name = name.into();
        if self.initialized {
            return Err(SimError::InvalidScenario(format!(
                "cannot add module `{}` after initialization",
                name
            )));
        }
        if self.by_name.contains_key(&name) {
            return Err(SimError::DuplicateModule(name));
        }
        let id = ModuleId::new(self.modules.len() as u32);
        let gates = GateTable::new(module.gates());
        tracing::debug!(module = %name, %id, gates = gates.len(), "module added");
        self.by_name.insert(name.clone(), id);
        self.modules.push(ModuleSlot {
            name,
            gates,
            params,
            module,
        });
        Ok(id)
    }

    /// Connect output gate `from.from_gate` to input gate `to.to_gate`.
    pub fn connect(
        &mut self,
        from: &str,
        from_gate: &str,
        to: &str,
        to_gate: &str,
        delay: u64,
    ) -> SimResult<()> {
        let src = self.lookup(from)?;
        let src_gate = self.gate_with_direction(src, from_gate, GateDirection::Output)?;
        let dst = self.lookup(to)?;
        let dst_gate = self.gate_with_direction(dst, to_gate, GateDirection::Input)?;

        if self.links.contains_key(&(src, src_gate)) {
            return Err(SimError::GateAlreadyConnected {
                module: from.to_string(),
                gate: from_gate.to_string(),
            });
        }
        self.links.insert(
            (src, src_gate),
            Link {
                to: dst,
                gate: dst_gate,
                delay,
            },
        );
        tracing::debug!(%from, %from_gate, %to, %to_gate, delay, "connected");
        Ok(())
    }

    pub fn module_id(&self, name: &str) -> Option<ModuleId> {
        self.by_name.get(name).copied()
    }

    pub fn module_name(&self, id: ModuleId) -> Option<&str> {
        self.modules.get(id.index()).map(|s| s.name.as_str())
    }

    pub fn module_count(&self) -> usize {
        self.modules.len()
    }

    /// Resolve a gate of a registered module by name.
    pub fn gate_id(&self, module: ModuleId, gate: &str) -> Option<GateId> {
        self.modules.get(module.index())?.gates.find(gate)
    }

    /// The link leaving `module.gate`, if that output is connected.
    pub fn link(&self, module: ModuleId, gate: GateId) -> Option<&Link> {
        self.links.get(&(module, gate))
    }

    /// Downcast a module for inspection.
    pub fn module<T: SimpleModule + 'static>(&self, id: ModuleId) -> Option<&T> {
        self.modules.get(id.index())?.module.as_any().downcast_ref::<T>()
    }

    pub fn module_mut<T: SimpleModule + 'static>(&mut self, id: ModuleId) -> Option<&mut T> {
        self.modules
            .get_mut(id.index())?
            .module
            .as_any_mut()
            .downcast_mut::<T>()
    }

    pub fn module_by_name<T: SimpleModule + 'static>(&self, name: &str) -> Option<&T> {
        self.module(self.module_id(name)?)
    }

    fn lookup(&self, name: &str) -> SimResult<ModuleId> {
        self.module_id(name)
            .ok_or_else(|| SimError::ModuleNotFound(name.to_string()))
    }

    fn gate_with_direction(
        &self,
        module: ModuleId,
        gate: &str,
        expected: GateDirection,
    ) -> SimResult<GateId> {
        let slot = &self.modules[module.index()];
        let id = slot.gates.find(gate).ok_or_else(|| SimError::GateNotFound {
            module: slot.name.clone(),
            gate: gate.to_string(),
        })?;
        if slot.gates.direction(id) != Some(expected) {
            return Err(SimError::WrongGateDirection {
                module: slot.name.clone(),
                gate: gate.to_string(),
                expected,
            });
        }
        Ok(id)
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Run the staged initialization protocol.
    ///
    /// Stage `s` is run for every module (in registration order) before
    /// any module sees stage `s + 1`; a module only sees the stages below
    /// its own [`SimpleModule::num_init_stages`]. Calling this again after
    /// it succeeded does nothing.
    ///
    /// A failed initialization is not retried: later calls (including the
    /// implicit one in [`step`](Self::step)) return
    /// [`SimError::InitFailed`] naming the first error.
    pub fn initialize(&mut self) -> SimResult<()> {
        if self.initialized {
            return Ok(());
        }
        if let Some(cause) = &self.init_failure {
            return Err(SimError::InitFailed(cause.clone()));
        }
        let stages = match self.run_init_stages() {
            Ok(stages) => stages,
            Err(e) => {
                tracing::error!(error = %e, "initialization failed");
                self.init_failure = Some(e.to_string());
                return Err(e);
            }
        };

        self.initialized = true;
        tracing::info!(
            modules = self.modules.len(),
            links = self.links.len(),
            stages,
            "simulation initialized"
        );
        Ok(())
    }

    fn run_init_stages(&mut self) -> SimResult<usize> {
        let stages = self
            .modules
            .iter()
            .map(|s| s.module.num_init_stages())
            .max()
            .unwrap_or(0);

        for stage in 0..stages {
            for (idx, slot) in self.modules.iter_mut().enumerate() {
                if stage >= slot.module.num_init_stages() {
                    continue;
                }
                let mut ctx = ModuleContext {
                    scheduler: &mut self.scheduler,
                    links: &self.links,
                    module: ModuleId::new(idx as u32),
                    name: &slot.name,
                    gates: &slot.gates,
                    params: &slot.params,
                    now: self.current_time,
                };
                slot.module.initialize(stage, &mut ctx)?;
            }
            tracing::debug!(stage, "init stage complete");
        }
        Ok(stages)
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Let every module wrap up, in registration order.
    pub fn finish(&mut self) {
        for slot in &mut self.modules {
            slot.module.finish();
        }
        tracing::info!(
            time = %self.current_time,
            events = self.events_processed,
            "simulation finished"
        );
    }

    // ── Seeding ───────────────────────────────────────────────

    /// Deliver `msg` to input gate `module.gate` at instant `at`, as if it
    /// came from outside the simulated network.
    pub fn inject(
        &mut self,
        at: SimTime,
        module: &str,
        gate: &str,
        msg: Message,
    ) -> SimResult<EventId> {
        let id = self.lookup(module)?;
        let gate = self.gate_with_direction(id, gate, GateDirection::Input)?;
        self.ensure_not_past(at)?;
        Ok(self.scheduler.schedule(
            at,
            EventKind::Deliver {
                module: id,
                gate,
                message: msg,
            },
        ))
    }

    /// Fire `msg` at `module` at instant `at` with no arrival gate.
    pub fn schedule_self_message(
        &mut self,
        at: SimTime,
        module: &str,
        msg: Message,
    ) -> SimResult<EventId> {
        let id = self.lookup(module)?;
        self.ensure_not_past(at)?;
        Ok(self
            .scheduler
            .schedule(at, EventKind::SelfMessage { module: id, message: msg }))
    }

    fn ensure_not_past(&self, at: SimTime) -> SimResult<()> {
        if at < self.current_time {
            return Err(SimError::NonCausalEvent {
                requested: at,
                current: self.current_time,
            });
        }
        Ok(())
    }

    // ── Event loop ────────────────────────────────────────────

    /// Dispatch exactly one event.
    ///
    /// Initializes the network first if that has not happened yet.
    /// Returns `None` once the future event set is empty.
    pub fn step(&mut self) -> SimResult<Option<TraceEntry>> {
        self.initialize()?;
        let Some(event) = self.scheduler.pop_next() else {
            return Ok(None);
        };

        debug_assert!(
            event.at >= self.current_time,
            "time went backward: now={}, event={}",
            self.current_time,
            event.at
        );
        self.current_time = event.at;
        self.events_processed += 1;

        let (module, gate, mut message) = match event.kind {
            EventKind::Deliver {
                module,
                gate,
                message,
            } => (module, Some(gate), message),
            EventKind::SelfMessage { module, message } => (module, None, message),
        };
        message.stamp_arrival(gate, self.current_time);

        let slot = self
            .modules
            .get_mut(module.index())
            .ok_or(SimError::UnknownModule(module))?;

        let entry = TraceEntry {
            time: self.current_time,
            event_id: event.id,
            module,
            arrival_gate: gate,
            message: message.name().to_string(),
            kind: message.kind(),
        };
        tracing::trace!(%entry, "dispatch");
        self.trace.push(entry.clone());

        let mut ctx = ModuleContext {
            scheduler: &mut self.scheduler,
            links: &self.links,
            module,
            name: &slot.name,
            gates: &slot.gates,
            params: &slot.params,
            now: self.current_time,
        };
        slot.module.handle_message(&mut ctx, message)?;

        Ok(Some(entry))
    }

    /// Run until no events are left. Returns how many were dispatched.
    pub fn run(&mut self) -> SimResult<u64> {
        let start = self.events_processed;
        while self.step()?.is_some() {}
        Ok(self.events_processed - start)
    }

    /// Run at most `max_steps` events.
    pub fn run_for(&mut self, max_steps: u64) -> SimResult<u64> {
        let start = self.events_processed;
        let mut steps = 0u64;
        while steps < max_steps {
            if self.step()?.is_none() {
                break;
            }
            steps += 1;
        }
        Ok(self.events_processed - start)
    }

    /// Run every event scheduled at or before `limit`.
    pub fn run_until(&mut self, limit: SimTime) -> SimResult<u64> {
        self.initialize()?;
        let start = self.events_processed;
        while matches!(self.scheduler.peek_time(), Some(at) if at <= limit) {
            self.step()?;
        }
        Ok(self.events_processed - start)
    }

    /// Run events scheduled at or before `limit`, stopping after
    /// `max_steps` of them.
    pub fn run_bounded(&mut self, limit: SimTime, max_steps: u64) -> SimResult<u64> {
        self.initialize()?;
        let start = self.events_processed;
        while self.events_processed - start < max_steps
            && matches!(self.scheduler.peek_time(), Some(at) if at <= limit)
        {
            self.step()?;
        }
        Ok(self.events_processed - start)
    }

    // ── Inspection ────────────────────────────────────────────

    pub fn current_time(&self) -> SimTime {
        self.current_time
    }

    pub fn events_processed(&self) -> u64 {
        self.events_processed
    }

    pub fn pending_events(&self) -> usize {
        self.scheduler.len()
    }

    pub fn is_finished(&self) -> bool {
        self.scheduler.is_empty()
    }

    /// The dispatch trace as pretty-printed JSON.
    pub fn trace_json(&self) -> SimResult<String> {
        Ok(serde_json::to_string_pretty(&self.trace)?)
    }
}

impl Default for Simulation {
    fn default() -> Self {
        Self::new()
    }
}
