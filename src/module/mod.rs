//! Module abstraction: the building blocks a simulated network is made of.
//!
//! A module is a state machine with named gates. It receives messages on
//! its input gates (or as self messages), and sends messages out of its
//! output gates through the [`ModuleContext`](crate::ModuleContext) the
//! kernel hands it.
//!
//! # Module structure
//!
//! | Sub-module | Contents |
//! |---|---|
//! | [`id`] | [`ModuleId`] newtype |
//! | [`gate`] | [`GateId`], [`GateDirection`], [`GateDecl`], [`GateTable`] |
//! | [`message`] | [`Message`], [`MessagePayload`] |
//! | [`params`] | [`ParamValue`], [`Params`] |
//! | [`traits`] | [`SimpleModule`] trait + `ModuleContext` send API |
//! | [`trace`] | [`TraceEntry`] struct |
//! | [`registry`] | [`ModuleRegistry`] |
//! | [`builtin`] | [`SinkModule`] |

pub mod builtin;
pub mod gate;
pub mod id;
pub mod message;
pub mod params;
pub mod registry;
pub mod trace;
pub mod traits;

pub use builtin::SinkModule;
pub use gate::{GateDecl, GateDirection, GateId, GateTable};
pub use id::ModuleId;
pub use message::{Message, MessagePayload};
pub use params::{ParamValue, Params};
pub use registry::{ModuleFactory, ModuleRegistry};
pub use trace::TraceEntry;
pub use traits::SimpleModule;

#[cfg(test)]
mod tests;
