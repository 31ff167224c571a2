//! Kernel tests: topology, staged initialization, delivery and timers.

use std::cell::RefCell;
use std::rc::Rc;

use crate::error::{SimError, SimResult};
use crate::module::{GateDecl, GateId, Message, MessagePayload, Params, SimpleModule, SinkModule};
use crate::simulation::{ModuleContext, Simulation};
use crate::time::SimTime;

// ── Test modules ──────────────────────────────────────────────────────

/// Forwards everything from `in` to `out`, `hold` ticks later.
struct Forwarder {
    out: Option<GateId>,
    hold: u64,
}

impl Forwarder {
    fn new() -> Self {
        Forwarder { out: None, hold: 0 }
    }
}

impl SimpleModule for Forwarder {
    fn gates(&self) -> Vec<GateDecl> {
        vec![GateDecl::input("in"), GateDecl::output("out")]
    }

    fn initialize(&mut self, _stage: usize, ctx: &mut ModuleContext) -> SimResult<()> {
        self.out = Some(ctx.find_gate("out")?);
        if let Some(hold) = ctx.par_opt("hold") {
            self.hold = hold.as_uint("hold")?;
        }
        Ok(())
    }

    fn handle_message(&mut self, ctx: &mut ModuleContext, msg: Message) -> SimResult<()> {
        let out = self.out.ok_or_else(|| SimError::NotInitialized(ctx.module_name().into()))?;
        ctx.send_delayed(msg, self.hold, out)?;
        Ok(())
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}

/// Appends `(name, stage)` to a shared log on every init call.
struct StageProbe {
    name: &'static str,
    stages: usize,
    log: Rc<RefCell<Vec<(&'static str, usize)>>>,
}

impl SimpleModule for StageProbe {
    fn gates(&self) -> Vec<GateDecl> {
        Vec::new()
    }

    fn num_init_stages(&self) -> usize {
        self.stages
    }

    fn initialize(&mut self, stage: usize, _ctx: &mut ModuleContext) -> SimResult<()> {
        self.log.borrow_mut().push((self.name, stage));
        Ok(())
    }

    fn handle_message(&mut self, _ctx: &mut ModuleContext, _msg: Message) -> SimResult<()> {
        Ok(())
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}

/// Starts a timer chain in stage 0 and records when each tick fires.
struct Ticker {
    fired: Vec<SimTime>,
}

impl SimpleModule for Ticker {
    fn gates(&self) -> Vec<GateDecl> {
        Vec::new()
    }

    fn initialize(&mut self, _stage: usize, ctx: &mut ModuleContext) -> SimResult<()> {
        ctx.schedule_after(5, Message::new("tick"))?;
        Ok(())
    }

    fn handle_message(&mut self, ctx: &mut ModuleContext, msg: Message) -> SimResult<()> {
        assert!(msg.is_self_message());
        self.fired.push(ctx.now());
        if self.fired.len() < 3 {
            ctx.schedule_after(5, msg)?;
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}

fn chain(link_delay: u64, hold: u64) -> Simulation {
    let mut sim = Simulation::new();
    sim.add_module("fwd", Params::new().with("hold", hold as i64), Box::new(Forwarder::new()))
        .unwrap();
    sim.add_module("sink", Params::new(), Box::new(SinkModule::new()))
        .unwrap();
    sim.connect("fwd", "out", "sink", "in", link_delay).unwrap();
    sim
}

// ── Delivery ──────────────────────────────────────────────────────────

#[test]
fn test_forward_over_link_adds_link_delay() {
    let mut sim = chain(3, 0);
    let msg = Message::new("data").with_payload(MessagePayload::Text("hello".into()));
    sim.inject(SimTime::new(10), "fwd", "in", msg).unwrap();

    let processed = sim.run().unwrap();
    assert_eq!(processed, 2);

    let sink = sim.module_by_name::<SinkModule>("sink").unwrap();
    assert_eq!(sink.received.len(), 1);
    let (at, got) = &sink.received[0];
    assert_eq!(*at, SimTime::new(13));
    assert_eq!(got.payload(), &MessagePayload::Text("hello".into()));
    assert_eq!(got.send_time(), SimTime::new(10));
    assert_eq!(got.sender_module(), sim.module_id("fwd"));
}

#[test]
fn test_send_delayed_adds_to_link_delay() {
    let mut sim = chain(2, 7);
    sim.inject(SimTime::ZERO, "fwd", "in", Message::new("m")).unwrap();
    sim.run().unwrap();

    let sink = sim.module_by_name::<SinkModule>("sink").unwrap();
    assert_eq!(sink.received[0].0, SimTime::new(9));
}

#[test]
fn test_arrival_gate_is_stamped() {
    let mut sim = chain(0, 0);
    sim.inject(SimTime::ZERO, "fwd", "in", Message::new("m")).unwrap();
    sim.run().unwrap();

    let sink_id = sim.module_id("sink").unwrap();
    let sink_in = sim.gate_id(sink_id, "in").unwrap();
    let sink = sim.module::<SinkModule>(sink_id).unwrap();
    assert_eq!(sink.received[0].1.arrival_gate(), Some(sink_in));
    assert!(!sink.received[0].1.is_self_message());
}

#[test]
fn test_same_instant_messages_keep_send_order() {
    let mut sim = chain(1, 0);
    for name in ["a", "b", "c"] {
        sim.inject(SimTime::new(4), "fwd", "in", Message::new(name)).unwrap();
    }
    sim.run().unwrap();

    let sink = sim.module_by_name::<SinkModule>("sink").unwrap();
    let names: Vec<&str> = sink.received.iter().map(|(_, m)| m.name()).collect();
    assert_eq!(names, vec!["a", "b", "c"]);
}

#[test]
fn test_send_on_unconnected_gate_fails_run() {
    let mut sim = Simulation::new();
    sim.add_module("fwd", Params::new(), Box::new(Forwarder::new()))
        .unwrap();
    sim.inject(SimTime::ZERO, "fwd", "in", Message::new("m")).unwrap();

    let err = sim.run().unwrap_err();
    assert!(matches!(
        err,
        SimError::GateNotConnected { ref module, ref gate } if module == "fwd" && gate == "out"
    ));
}

// ── Topology errors ───────────────────────────────────────────────────

#[test]
fn test_duplicate_module_name_rejected() {
    let mut sim = Simulation::new();
    sim.add_module("a", Params::new(), Box::new(SinkModule::new()))
        .unwrap();
    let err = sim
        .add_module("a", Params::new(), Box::new(SinkModule::new()))
        .unwrap_err();
    assert!(matches!(err, SimError::DuplicateModule(ref n) if n == "a"));
}

#[test]
fn test_connect_checks_directions() {
    let mut sim = chain(0, 0);
    let err = sim.connect("sink", "in", "fwd", "in", 0).unwrap_err();
    assert!(matches!(err, SimError::WrongGateDirection { .. }));

    sim.add_module("other", Params::new(), Box::new(Forwarder::new()))
        .unwrap();
    let err = sim.connect("fwd", "in", "other", "out", 0).unwrap_err();
    assert!(matches!(err, SimError::WrongGateDirection { .. }));
}

#[test]
fn test_output_connects_once() {
    let mut sim = chain(0, 0);
    sim.add_module("sink2", Params::new(), Box::new(SinkModule::new()))
        .unwrap();
    let err = sim.connect("fwd", "out", "sink2", "in", 0).unwrap_err();
    assert!(matches!(err, SimError::GateAlreadyConnected { .. }));
}

#[test]
fn test_connect_unknown_module_and_gate() {
    let mut sim = chain(0, 0);
    assert!(matches!(
        sim.connect("ghost", "out", "sink", "in", 0),
        Err(SimError::ModuleNotFound(_))
    ));
    assert!(matches!(
        sim.connect("fwd", "nope", "sink", "in", 0),
        Err(SimError::GateNotFound { .. })
    ));
}

#[test]
fn test_inject_must_target_input_gate() {
    let mut sim = chain(0, 0);
    let err = sim
        .inject(SimTime::ZERO, "fwd", "out", Message::new("m"))
        .unwrap_err();
    assert!(matches!(err, SimError::WrongGateDirection { .. }));
}

#[test]
fn test_cannot_add_module_after_init() {
    let mut sim = chain(0, 0);
    sim.initialize().unwrap();
    assert!(sim
        .add_module("late", Params::new(), Box::new(SinkModule::new()))
        .is_err());
}

// ── Initialization ────────────────────────────────────────────────────

#[test]
fn test_init_runs_stage_major() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let mut sim = Simulation::new();
    for (name, stages) in [("a", 2), ("b", 3), ("c", 1)] {
        sim.add_module(
            name,
            Params::new(),
            Box::new(StageProbe {
                name,
                stages,
                log: Rc::clone(&log),
            }),
        )
        .unwrap();
    }
    sim.initialize().unwrap();

    assert_eq!(
        *log.borrow(),
        vec![("a", 0), ("b", 0), ("c", 0), ("a", 1), ("b", 1), ("b", 2)]
    );
}

#[test]
fn test_initialize_is_run_once() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let mut sim = Simulation::new();
    sim.add_module(
        "a",
        Params::new(),
        Box::new(StageProbe {
            name: "a",
            stages: 1,
            log: Rc::clone(&log),
        }),
    )
    .unwrap();

    sim.initialize().unwrap();
    sim.initialize().unwrap();
    sim.run().unwrap();
    assert_eq!(log.borrow().len(), 1);
    assert!(sim.is_initialized());
}

#[test]
fn test_missing_gate_fails_initialization() {
    struct Broken;
    impl SimpleModule for Broken {
        fn gates(&self) -> Vec<GateDecl> {
            vec![GateDecl::input("in")]
        }
        fn initialize(&mut self, _stage: usize, ctx: &mut ModuleContext) -> SimResult<()> {
            ctx.find_gate("lowergateIn")?;
            Ok(())
        }
        fn handle_message(&mut self, _ctx: &mut ModuleContext, _msg: Message) -> SimResult<()> {
            Ok(())
        }
        fn as_any(&self) -> &dyn std::any::Any {
            self
        }
        fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
            self
        }
    }

    let mut sim = Simulation::new();
    sim.add_module("broken", Params::new(), Box::new(Broken))
        .unwrap();
    let err = sim.initialize().unwrap_err();
    assert_eq!(err.to_string(), "module `broken` has no gate named `lowergateIn`");
    assert!(!sim.is_initialized());
}

// ── Timers and run control ────────────────────────────────────────────

#[test]
fn test_self_messages_from_init() {
    let mut sim = Simulation::new();
    let id = sim
        .add_module("ticker", Params::new(), Box::new(Ticker { fired: Vec::new() }))
        .unwrap();
    sim.run().unwrap();

    let ticker = sim.module::<Ticker>(id).unwrap();
    assert_eq!(
        ticker.fired,
        vec![SimTime::new(5), SimTime::new(10), SimTime::new(15)]
    );
    assert!(sim.trace.iter().all(|e| e.arrival_gate.is_none()));
}

#[test]
fn test_run_until_stops_at_limit() {
    let mut sim = Simulation::new();
    let id = sim
        .add_module("ticker", Params::new(), Box::new(Ticker { fired: Vec::new() }))
        .unwrap();

    let processed = sim.run_until(SimTime::new(10)).unwrap();
    assert_eq!(processed, 2);
    assert_eq!(sim.current_time(), SimTime::new(10));
    assert_eq!(sim.pending_events(), 1);
    assert_eq!(sim.module::<Ticker>(id).unwrap().fired.len(), 2);
}

#[test]
fn test_run_for_limits_steps() {
    let mut sim = chain(0, 0);
    for t in 0..20 {
        sim.inject(SimTime::new(t), "fwd", "in", Message::new("m")).unwrap();
    }
    assert_eq!(sim.run_for(5).unwrap(), 5);
    assert_eq!(sim.events_processed(), 5);
    assert!(!sim.is_finished());
}

#[test]
fn test_run_bounded_stops_at_first_limit() {
    let mut sim = Simulation::new();
    sim.add_module("ticker", Params::new(), Box::new(Ticker { fired: Vec::new() }))
        .unwrap();
    assert_eq!(sim.run_bounded(SimTime::new(100), 1).unwrap(), 1);
    assert_eq!(sim.current_time(), SimTime::new(5));
    assert_eq!(sim.run_bounded(SimTime::new(12), 10).unwrap(), 1);
    assert_eq!(sim.current_time(), SimTime::new(10));
}

#[test]
fn test_inject_in_the_past_rejected() {
    let mut sim = chain(0, 0);
    sim.inject(SimTime::new(10), "fwd", "in", Message::new("m")).unwrap();
    sim.run().unwrap();
    let err = sim
        .inject(SimTime::new(5), "fwd", "in", Message::new("late"))
        .unwrap_err();
    assert!(matches!(err, SimError::NonCausalEvent { .. }));
}

#[test]
fn test_empty_simulation() {
    let mut sim = Simulation::new();
    assert_eq!(sim.run().unwrap(), 0);
    assert!(sim.is_finished());
    assert!(sim.step().unwrap().is_none());
}

// ── Determinism and trace ─────────────────────────────────────────────

#[test]
fn test_deterministic_trace() {
    fn run_trace() -> Vec<(u64, u64, u32)> {
        let mut sim = chain(2, 1);
        for (t, name) in [(0u64, "a"), (0, "b"), (3, "c")] {
            sim.inject(SimTime::new(t), "fwd", "in", Message::new(name)).unwrap();
        }
        sim.run().unwrap();
        sim.trace
            .iter()
            .map(|e| (e.time.ticks(), e.event_id.raw(), e.module.raw()))
            .collect()
    }

    assert_eq!(run_trace(), run_trace());
}

#[test]
fn test_trace_json() {
    let mut sim = chain(0, 0);
    sim.inject(SimTime::ZERO, "fwd", "in", Message::new("m").with_kind(4))
        .unwrap();
    sim.run().unwrap();

    let json = sim.trace_json().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value.as_array().unwrap().len(), 2);
    assert_eq!(value[0]["message"], "m");
    assert_eq!(value[0]["kind"], 4);
    assert_eq!(value[0]["arrival_gate"], 0);
}

#[test]
fn test_trace_entry_display() {
    let mut sim = chain(0, 0);
    sim.schedule_self_message(SimTime::new(2), "sink", Message::new("t"))
        .unwrap();
    let entry = sim.step().unwrap().unwrap();
    assert_eq!(entry.to_string(), "[t=2 E#0 M1.self] t (kind=0)");
}
