use serde::Deserialize;

use crate::sim::{ExperimentMode, SimParams};

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    pub experiment: String,
    pub physics: PhysicsConfig,
    pub display: DisplayConfig,
    pub particles: usize,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    pub flow_speed: f64,
    pub viscosity: f64,
    pub density: f64,
    pub diameter: f64,
    pub trail_fade: f64,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub width: usize,
    pub height: usize,
    pub target_fps: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            experiment: "uniform".to_string(),
            physics: PhysicsConfig::default(),
            display: DisplayConfig::default(),
            particles: 800,
        }
    }
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            flow_speed: 1.0,
            viscosity: 0.001,
            density: 1000.0,
            diameter: 0.2,
            trail_fade: 0.5,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: 800,
            // Status bar rides below the 800x560 display area.
            height: 572,
            target_fps: 60,
        }
    }
}

impl Config {
    /// Build the startup parameter snapshot. Out-of-range config values are
    /// clamped into the UI ranges rather than rejected.
    pub fn initial_params(&self) -> SimParams {
        let mut params = SimParams {
            mode: ExperimentMode::from_name(&self.experiment),
            flow_speed: self.physics.flow_speed,
            viscosity: self.physics.viscosity,
            density: self.physics.density,
            diameter: self.physics.diameter,
            particle_count: self.particles,
            trail_fade: self.physics.trail_fade,
            ..SimParams::default()
        };
        params.clamp_to_ranges();
        params
    }
}

pub fn load() -> Config {
    let path = std::path::Path::new("flowlab.yaml");
    if path.exists() {
        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_yaml::from_str(&contents) {
                Ok(cfg) => cfg,
                Err(e) => {
                    log::warn!("failed to parse flowlab.yaml: {e}; using defaults");
                    Config::default()
                }
            },
            Err(e) => {
                log::warn!("failed to read flowlab.yaml: {e}; using defaults");
                Config::default()
            }
        }
    } else {
        Config::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let cfg = Config::default();
        assert_eq!(cfg.experiment, "uniform");
        assert_eq!(cfg.physics.flow_speed, 1.0);
        assert_eq!(cfg.physics.viscosity, 0.001);
        assert_eq!(cfg.physics.density, 1000.0);
        assert_eq!(cfg.physics.diameter, 0.2);
        assert_eq!(cfg.display.width, 800);
        assert_eq!(cfg.display.height, 572);
        assert_eq!(cfg.display.target_fps, 60);
        assert_eq!(cfg.particles, 800);
    }

    #[test]
    fn test_partial_yaml() {
        let yaml = "experiment: cylinder\nphysics:\n  flow_speed: 0.8\nparticles: 1200\n";
        let cfg: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.experiment, "cylinder");
        assert_eq!(cfg.physics.flow_speed, 0.8);
        assert_eq!(cfg.physics.viscosity, 0.001); // default
        assert_eq!(cfg.particles, 1200);
        assert_eq!(cfg.display.width, 800); // default
    }

    #[test]
    fn test_full_yaml() {
        let yaml = r#"
experiment: venturi
physics:
  flow_speed: 1.5
  viscosity: 0.01
  density: 998.0
  diameter: 0.1
  trail_fade: 0.7
display:
  width: 1024
  height: 640
  target_fps: 30
particles: 600
"#;
        let cfg: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.experiment, "venturi");
        assert_eq!(cfg.physics.flow_speed, 1.5);
        assert_eq!(cfg.physics.viscosity, 0.01);
        assert_eq!(cfg.physics.density, 998.0);
        assert_eq!(cfg.physics.diameter, 0.1);
        assert_eq!(cfg.physics.trail_fade, 0.7);
        assert_eq!(cfg.display.width, 1024);
        assert_eq!(cfg.display.height, 640);
        assert_eq!(cfg.display.target_fps, 30);
        assert_eq!(cfg.particles, 600);
    }

    #[test]
    fn test_initial_params_mode_and_clamping() {
        let yaml = "experiment: pipe\nphysics:\n  flow_speed: 99.0\n";
        let cfg: Config = serde_yaml::from_str(yaml).unwrap();
        let params = cfg.initial_params();
        assert_eq!(params.mode, ExperimentMode::PipeProfile);
        assert_eq!(params.flow_speed, 6.0, "Config values beyond the UI range are clamped");
    }

    #[test]
    fn test_load_missing_file() {
        let cfg = load();
        assert_eq!(cfg.particles, 800);
    }
}
