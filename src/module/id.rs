//! Module ID: index of a module inside its simulation.

use serde::{Deserialize, Serialize};

/// Identifies one module instance within a [`Simulation`](crate::Simulation).
///
/// Ids are handed out densely in registration order, so they double as
/// the module's slot index and give a deterministic iteration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleId(u32);

impl ModuleId {
    #[inline]
    pub fn new(raw: u32) -> Self {
        ModuleId(raw)
    }

    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for ModuleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "M{}", self.0)
    }
}
