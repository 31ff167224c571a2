//! Simulation time.
//!
//! Time is a logical tick counter. It only moves when the kernel pops the
//! next event; nothing in the crate ever reads the wall clock.

use serde::{Deserialize, Serialize};

/// A point on the simulation timeline, measured in ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SimTime(u64);

impl SimTime {
    /// Start of every simulation.
    pub const ZERO: SimTime = SimTime(0);

    /// Latest representable instant.
    pub const MAX: SimTime = SimTime(u64::MAX);

    #[inline]
    pub fn new(ticks: u64) -> Self {
        SimTime(ticks)
    }

    #[inline]
    pub fn ticks(self) -> u64 {
        self.0
    }

    /// The instant `delay` ticks after `self`, or `None` past [`SimTime::MAX`].
    #[inline]
    pub fn checked_add(self, delay: u64) -> Option<SimTime> {
        self.0.checked_add(delay).map(SimTime)
    }

    /// Ticks elapsed from `earlier` to `self`; `None` if `earlier` is later.
    #[inline]
    pub fn duration_since(self, earlier: SimTime) -> Option<u64> {
        self.0.checked_sub(earlier.0)
    }
}

impl From<u64> for SimTime {
    fn from(ticks: u64) -> Self {
        SimTime(ticks)
    }
}

impl std::fmt::Display for SimTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "t={}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_is_default() {
        assert_eq!(SimTime::default(), SimTime::ZERO);
        assert_eq!(SimTime::ZERO.ticks(), 0);
    }

    #[test]
    fn test_checked_add() {
        assert_eq!(SimTime::new(100).checked_add(25), Some(SimTime::new(125)));
        assert!(SimTime::MAX.checked_add(1).is_none());
    }

    #[test]
    fn test_duration_since() {
        let early = SimTime::new(10);
        let late = SimTime::new(30);
        assert_eq!(late.duration_since(early), Some(20));
        assert_eq!(early.duration_since(late), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(SimTime::new(42).to_string(), "t=42");
    }

    #[test]
    fn test_serializes_as_bare_ticks() {
        let json = serde_json::to_string(&SimTime::new(7)).unwrap();
        assert_eq!(json, "7");
    }
}
