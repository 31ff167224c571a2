//! Built-in utility modules.
//!
//! The localization modules live in [`crate::loc`]; this holds
//! protocol-agnostic helpers used to terminate links in tests and demos.

pub mod sink;

pub use sink::SinkModule;
