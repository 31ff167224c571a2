//! Localization applications.
//!
//! A localization application sits on top of a lower layer (data and
//! control ports) and next to a peer localization module. [`BaseLocAppl`]
//! resolves those six gates once at start-up and routes every incoming
//! message by the gate it arrived on:
//!
//! | arrival gate | handler |
//! |---|---|
//! | `lowergateIn` | [`LocAlgorithm::handle_lower_msg`] |
//! | `lowerControlIn` | [`LocAlgorithm::handle_lower_control`] |
//! | `locgateIn` | [`LocAlgorithm::handle_loc_msg`] |
//! | anything else | [`LocAlgorithm::handle_self_msg`] |
//!
//! Concrete algorithms implement [`LocAlgorithm`] and are hosted by
//! [`LocApplModule`]. [`BeaconLoc`] is the reference algorithm.

pub mod appl;
pub mod base;
pub mod beacon;

pub use appl::{LocAlgorithm, LocApplModule, LocContext};
pub use base::{BaseLocAppl, LocGates, LocInput, BASE_INIT_STAGES, HEADER_LENGTH_PARAM, LOC_GATES};
pub use beacon::{BeaconLoc, Position};
