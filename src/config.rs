//! Scenario files.
//!
//! A scenario is a TOML document listing module instances, their
//! parameters and the links between their gates:
//!
//! ```toml
//! [simulation]
//! name = "anchors"
//! until = 200
//!
//! [[modules]]
//! name = "anchor0"
//! type = "BeaconLoc"
//! params = { headerLength = 64, anchor = true, x = 0.0, y = 0.0, beaconInterval = 10 }
//!
//! [[connections]]
//! from = "anchor0.lowergateOut"
//! to = "node0.lowergateIn"
//! delay = 2
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};
use crate::module::{ModuleRegistry, Params};
use crate::simulation::Simulation;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScenarioConfig {
    #[serde(default)]
    pub simulation: RunConfig,
    #[serde(default)]
    pub modules: Vec<ModuleConfig>,
    #[serde(default)]
    pub connections: Vec<ConnectionConfig>,
}

/// Run limits. Both are optional; without them the run ends when the
/// event set is empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunConfig {
    pub name: Option<String>,
    /// Stop after the last event at or before this tick.
    pub until: Option<u64>,
    /// Stop after this many events.
    pub max_events: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleConfig {
    pub name: String,
    pub r#type: String,
    #[serde(default)]
    pub params: Params,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// `module.gate` of an output gate.
    pub from: String,
    /// `module.gate` of an input gate.
    pub to: String,
    #[serde(default)]
    pub delay: u64,
}

impl ScenarioConfig {
    pub fn from_file(path: impl AsRef<Path>) -> SimResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_toml_str(&content)?;
        tracing::info!(
            path = %path.as_ref().display(),
            modules = config.modules.len(),
            connections = config.connections.len(),
            "scenario loaded"
        );
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> SimResult<Self> {
        let config: ScenarioConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Structural checks that do not need the module registry.
    pub fn validate(&self) -> SimResult<()> {
        if self.modules.is_empty() {
            return Err(SimError::InvalidScenario("no modules defined".into()));
        }
        for m in &self.modules {
            if m.name.is_empty() || m.name.contains(char::is_whitespace) {
                return Err(SimError::InvalidScenario(format!(
                    "invalid module name `{}`",
                    m.name
                )));
            }
        }
        for c in &self.connections {
            split_endpoint(&c.from)?;
            split_endpoint(&c.to)?;
        }
        if self.simulation.max_events == Some(0) {
            return Err(SimError::InvalidScenario("max_events must be positive".into()));
        }
        Ok(())
    }
}

/// `"host0.appl.lowergateOut"` → `("host0.appl", "lowergateOut")`.
fn split_endpoint(endpoint: &str) -> SimResult<(&str, &str)> {
    match endpoint.rsplit_once('.') {
        Some((module, gate)) if !module.is_empty() && !gate.is_empty() => Ok((module, gate)),
        _ => Err(SimError::InvalidScenario(format!(
            "endpoint `{}` is not of the form module.gate",
            endpoint
        ))),
    }
}

impl Simulation {
    /// Build a network from a scenario, creating modules through `registry`.
    pub fn from_scenario(config: &ScenarioConfig, registry: &ModuleRegistry) -> SimResult<Self> {
        config.validate()?;
        let mut sim = Simulation::new();
        for m in &config.modules {
            let module = registry.create(&m.r#type)?;
            sim.add_module(m.name.clone(), m.params.clone(), module)?;
        }
        for c in &config.connections {
            let (from, from_gate) = split_endpoint(&c.from)?;
            let (to, to_gate) = split_endpoint(&c.to)?;
            sim.connect(from, from_gate, to, to_gate, c.delay)?;
        }
        Ok(sim)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::ParamValue;

    const SCENARIO: &str = r#"
        [simulation]
        name = "pair"
        until = 50

        [[modules]]
        name = "host0.appl"
        type = "BeaconLoc"
        params = { headerLength = 64, anchor = true, x = 1.0, y = 2.0, beaconInterval = 10 }

        [[modules]]
        name = "host1.appl"
        type = "BeaconLoc"
        params = { headerLength = 64 }

        [[connections]]
        from = "host0.appl.lowergateOut"
        to = "host1.appl.lowergateIn"
        delay = 2
    "#;

    #[test]
    fn test_parse_scenario() {
        let config = ScenarioConfig::from_toml_str(SCENARIO).unwrap();
        assert_eq!(config.simulation.name.as_deref(), Some("pair"));
        assert_eq!(config.simulation.until, Some(50));
        assert_eq!(config.modules.len(), 2);
        assert_eq!(
            config.modules[0].params.get("x"),
            Some(&ParamValue::Double(1.0))
        );
        assert_eq!(config.connections[0].delay, 2);
    }

    #[test]
    fn test_split_endpoint_uses_last_dot() {
        assert_eq!(
            split_endpoint("host0.appl.lowergateOut").unwrap(),
            ("host0.appl", "lowergateOut")
        );
        assert!(split_endpoint("nodot").is_err());
        assert!(split_endpoint("trailing.").is_err());
    }

    #[test]
    fn test_build_from_scenario() {
        let config = ScenarioConfig::from_toml_str(SCENARIO).unwrap();
        let sim = Simulation::from_scenario(&config, &ModuleRegistry::with_builtins()).unwrap();
        assert_eq!(sim.module_count(), 2);

        let src = sim.module_id("host0.appl").unwrap();
        let out = sim.gate_id(src, "lowergateOut").unwrap();
        let link = sim.link(src, out).unwrap();
        assert_eq!(link.to, sim.module_id("host1.appl").unwrap());
        assert_eq!(link.delay, 2);
    }

    #[test]
    fn test_empty_scenario_rejected() {
        assert!(matches!(
            ScenarioConfig::from_toml_str(""),
            Err(SimError::InvalidScenario(_))
        ));
    }

    #[test]
    fn test_unknown_type_rejected() {
        let config = ScenarioConfig::from_toml_str(
            "[[modules]]\nname = \"a\"\ntype = \"Nope\"\n",
        )
        .unwrap();
        assert!(matches!(
            Simulation::from_scenario(&config, &ModuleRegistry::with_builtins()),
            Err(SimError::UnknownModuleType(_))
        ));
    }

    #[test]
    fn test_bad_toml() {
        assert!(matches!(
            ScenarioConfig::from_toml_str("[[modules]\n"),
            Err(SimError::Toml(_))
        ));
    }
}
