//! Structured error types for locsim.
//!
//! Configuration problems (unknown gates, missing parameters, bad
//! scenario files) and misuse of the send API all surface as a
//! [`SimError`] from the kernel entry points. Modules propagate them with
//! `?`; the kernel never swallows them.

use thiserror::Error;

use crate::module::{GateDirection, ModuleId};
use crate::time::SimTime;

#[derive(Error, Debug)]
pub enum SimError {
    // ── Topology ──────────────────────────────────────────

    #[error("module `{0}` not found")]
    ModuleNotFound(String),

    #[error("module {0} is not registered")]
    UnknownModule(ModuleId),

    #[error("module name `{0}` is already in use")]
    DuplicateModule(String),

    #[error("unknown module type `{0}`")]
    UnknownModuleType(String),

    #[error("module `{module}` has no gate named `{gate}`")]
    GateNotFound { module: String, gate: String },

    #[error("gate `{gate}` of module `{module}` is not an {expected} gate")]
    WrongGateDirection {
        module: String,
        gate: String,
        expected: GateDirection,
    },

    #[error("gate `{gate}` of module `{module}` is not connected")]
    GateNotConnected { module: String, gate: String },

    #[error("gate `{gate}` of module `{module}` is already connected")]
    GateAlreadyConnected { module: String, gate: String },

    // ── Parameters ────────────────────────────────────────

    #[error("module `{module}` has no parameter `{param}`")]
    ParamNotFound { module: String, param: String },

    #[error("parameter `{param}` should be {expected}, found {found}")]
    ParamType {
        param: String,
        expected: &'static str,
        found: &'static str,
    },

    // ── Lifecycle & scheduling ────────────────────────────

    #[error("module `{0}` received a message before it was initialized")]
    NotInitialized(String),

    #[error("module `{0}` was already initialized")]
    AlreadyInitialized(String),

    #[error("initialization failed earlier: {0}")]
    InitFailed(String),

    #[error("cannot schedule at {requested}, current time is {current}")]
    NonCausalEvent { requested: SimTime, current: SimTime },

    #[error("simulation time overflow")]
    TimeOverflow,

    // ── Scenario files ────────────────────────────────────

    #[error("invalid scenario: {0}")]
    InvalidScenario(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias for `Result<T, SimError>`.
pub type SimResult<T> = Result<T, SimError>;
