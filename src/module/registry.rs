//! Module type registry used to build networks from scenario files.

use std::collections::BTreeMap;

use crate::error::{SimError, SimResult};
use crate::loc::{BeaconLoc, LocApplModule};

use super::builtin::SinkModule;
use super::traits::SimpleModule;

/// Creates a fresh, uninitialized module instance.
pub type ModuleFactory = fn() -> Box<dyn SimpleModule>;

/// Maps scenario `type` names to factories.
#[derive(Debug, Clone, Default)]
pub struct ModuleRegistry {
    factories: BTreeMap<String, ModuleFactory>,
}

impl ModuleRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        ModuleRegistry::default()
    }

    /// A registry knowing the modules shipped with the crate:
    /// `Sink` and `BeaconLoc`.
    pub fn with_builtins() -> Self {
        let mut registry = ModuleRegistry::new();
        registry.register("Sink", sink);
        registry.register("BeaconLoc", beacon_loc);
        registry
    }

    /// Register (or replace) a module type.
    pub fn register(&mut self, type_name: impl Into<String>, factory: ModuleFactory) {
        self.factories.insert(type_name.into(), factory);
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.factories.contains_key(type_name)
    }

    pub fn create(&self, type_name: &str) -> SimResult<Box<dyn SimpleModule>> {
        let factory = self
            .factories
            .get(type_name)
            .ok_or_else(|| SimError::UnknownModuleType(type_name.to_string()))?;
        Ok(factory())
    }

    /// Registered type names, sorted.
    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }
}

fn sink() -> Box<dyn SimpleModule> {
    Box::new(SinkModule::new())
}

fn beacon_loc() -> Box<dyn SimpleModule> {
    Box::new(LocApplModule::new(BeaconLoc::new()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_are_registered() {
        let registry = ModuleRegistry::with_builtins();
        let names: Vec<&str> = registry.type_names().collect();
        assert_eq!(names, vec!["BeaconLoc", "Sink"]);
    }

    #[test]
    fn test_create_declares_gates() {
        let registry = ModuleRegistry::with_builtins();
        let sink = registry.create("Sink").unwrap();
        assert_eq!(sink.gates().len(), 1);
        let loc = registry.create("BeaconLoc").unwrap();
        assert_eq!(loc.gates().len(), 6);
    }

    #[test]
    fn test_unknown_type() {
        let err = ModuleRegistry::new().create("Mac80211").err().unwrap();
        assert!(matches!(err, SimError::UnknownModuleType(ref t) if t == "Mac80211"));
    }
}
