//! # locsim — localization applications on a deterministic event kernel
//!
//! A small discrete-event network simulator in the style of module/gate
//! frameworks, plus the base module localization algorithms are built
//! on. Single-threaded, no wall clock: modules are state machines driven
//! by a virtual clock.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────┐
//! │  LocApplModule<A>             │ ← gate dispatch → LocAlgorithm handlers
//! │  ┌────────────────────────┐  │
//! │  │  Simulation             │  │ ← topology, staged init, event loop
//! │  │  ┌──────────────────┐  │  │
//! │  │  │ ModuleContext     │  │  │ ← par / find_gate / send / timers
//! │  │  └──────────────────┘  │  │
//! │  │  ┌──────────────────┐  │  │
//! │  │  │ Scheduler         │  │  │ ← (time, id) min-heap
//! │  │  └──────────────────┘  │  │
//! │  │  ┌──────────────────┐  │  │
//! │  │  │ SimTime           │  │  │ ← logical clock
//! │  │  └──────────────────┘  │  │
//! │  └────────────────────────┘  │
//! └──────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod event;
pub mod loc;
pub mod logging;
pub mod module;
pub mod scheduler;
pub mod simulation;
pub mod time;

pub use config::ScenarioConfig;
pub use error::{SimError, SimResult};
pub use event::{Event, EventId, EventIdGen, EventKind};
pub use loc::{BaseLocAppl, BeaconLoc, LocAlgorithm, LocApplModule, LocContext};
pub use module::{
    GateDecl, GateDirection, GateId, Message, MessagePayload, ModuleId, ModuleRegistry, Params,
    SimpleModule, SinkModule,
};
pub use scheduler::Scheduler;
pub use simulation::{Link, ModuleContext, Simulation};
pub use time::SimTime;
