//! Run configuration, read from and written to JSON.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::error::ConfigError;
use crate::finite_volume::boundary::BoundaryCondition;
use crate::finite_volume::initial::InitialCondition;
use crate::finite_volume::unknowns::{IdealGas, Primitive};
use crate::mesh::grid::Strictness;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverConfig {
    /// Ratio of specific heats.
    #[serde(default = "default_gamma")]
    pub gamma: f64,

    #[serde(default = "default_cfl")]
    pub cfl: f64,

    #[serde(default = "default_end_time")]
    pub end_time: f64,

    /// Fail with an error instead of stepping past this many iterations.
    #[serde(default)]
    pub max_iterations: Option<usize>,

    /// How face assembly treats malformed topology.
    #[serde(default)]
    pub strictness: Strictness,

    /// Check density, pressure and the time step after every iteration.
    #[serde(default)]
    pub check_state: bool,

    /// Conditions by boundary group name. Groups not listed use
    /// [`BoundaryCondition::Outflow`].
    #[serde(default)]
    pub boundaries: BTreeMap<String, BoundaryCondition>,

    #[serde(default)]
    pub initial: InitialCondition,

    /// Write a snapshot every this many iterations.
    #[serde(default)]
    pub output_interval: Option<usize>,
}

fn default_gamma() -> f64 {
    1.4
}

fn default_cfl() -> f64 {
    0.7
}

fn default_end_time() -> f64 {
    0.3
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig {
            gamma: default_gamma(),
            cfl: default_cfl(),
            end_time: default_end_time(),
            max_iterations: None,
            strictness: Strictness::default(),
            check_state: false,
            boundaries: BTreeMap::new(),
            initial: InitialCondition::default(),
            output_interval: None,
        }
    }
}

impl SolverConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let config: SolverConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path.as_ref(), content)?;
        Ok(())
    }

    pub fn gas(&self) -> IdealGas {
        IdealGas::new(self.gamma)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.cfl > 0. && self.cfl <= 1.) {
            return Err(ConfigError::InvalidValue {
                key: "cfl",
                value: self.cfl.to_string(),
                reason: "must lie in (0, 1]",
            });
        }
        if !(self.gamma > 1. && self.gamma.is_finite()) {
            return Err(ConfigError::InvalidValue {
                key: "gamma",
                value: self.gamma.to_string(),
                reason: "must be greater than 1",
            });
        }
        if !(self.end_time > 0. && self.end_time.is_finite()) {
            return Err(ConfigError::InvalidValue {
                key: "end_time",
                value: self.end_time.to_string(),
                reason: "must be positive",
            });
        }
        if self.max_iterations == Some(0) {
            return Err(ConfigError::InvalidValue {
                key: "max_iterations",
                value: "0".to_string(),
                reason: "must be positive",
            });
        }
        if self.output_interval == Some(0) {
            return Err(ConfigError::InvalidValue {
                key: "output_interval",
                value: "0".to_string(),
                reason: "must be positive",
            });
        }
        for w in self.initial.states() {
            check_physical("initial", w)?;
        }
        for w in self.boundaries.values().filter_map(|bc| bc.primitive()) {
            check_physical("boundaries", w)?;
        }
        Ok(())
    }
}

fn check_physical(key: &'static str, w: &Primitive) -> Result<(), ConfigError> {
    if !(w.rho > 0. && w.p > 0.) || !(w.vx.is_finite() && w.vy.is_finite()) {
        return Err(ConfigError::InvalidValue {
            key,
            value: format!("{:?}", w),
            reason: "density and pressure must be positive",
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finite_volume::initial::riemann_quadrants;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = SolverConfig::from_json("{}").unwrap();
        assert_eq!(config, SolverConfig::default());
        assert_eq!(config.gas(), IdealGas { gamma: 1.4 });
        assert_eq!(config.initial, riemann_quadrants());
        assert_eq!(config.strictness, Strictness::Lenient);
        assert_that!(config.boundaries).is_empty();
    }

    #[test]
    fn test_partial_json() {
        let config = SolverConfig::from_json(
            r#"{
                "cfl": 0.35,
                "strictness": "strict",
                "boundaries": {"left": {"type": "farfield", "rho": 1.0, "vx": 2.0, "vy": 0.0, "p": 1.0}}
            }"#,
        )
        .unwrap();
        assert_eq!(config.cfl, 0.35);
        assert_eq!(config.end_time, 0.3);
        assert_eq!(config.strictness, Strictness::Strict);
        assert_that!(config.boundaries).has_key("left");
    }

    #[test]
    fn test_rejects_bad_values() {
        for json in &[
            r#"{"cfl": 0.0}"#,
            r#"{"cfl": 1.5}"#,
            r#"{"gamma": 1.0}"#,
            r#"{"end_time": -1.0}"#,
            r#"{"max_iterations": 0}"#,
            r#"{"initial": {"type": "uniform", "rho": 1.0, "vx": 0.0, "vy": 0.0, "p": -1.0}}"#,
            r#"{"boundaries": {"top": {"type": "farfield", "rho": 0.0, "vx": 0.0, "vy": 0.0, "p": 1.0}}}"#,
        ] {
            match SolverConfig::from_json(json) {
                Err(ConfigError::InvalidValue { .. }) => {}
                other => panic!("expected InvalidValue for {}, got {:?}", json, other),
            }
        }
    }

    #[test]
    fn test_rejects_malformed_json() {
        match SolverConfig::from_json("{\"cfl\": ") {
            Err(ConfigError::Parse(_)) => {}
            other => panic!("expected Parse, got {:?}", other),
        }
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let mut config = SolverConfig::default();
        config.cfl = 0.5;
        config.max_iterations = Some(1000);
        config.boundaries.insert("top".to_string(), BoundaryCondition::Outflow);
        config.save_to_file(&path).unwrap();
        assert_eq!(SolverConfig::from_file(&path).unwrap(), config);
    }
}
