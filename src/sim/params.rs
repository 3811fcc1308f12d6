/// Experiment selection. Each variant picks one closed-form flow field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExperimentMode {
    Uniform,
    Venturi,
    Cylinder,
    PipeProfile,
    OpenChannel,
}

impl Default for ExperimentMode {
    fn default() -> Self {
        Self::Uniform
    }
}

impl ExperimentMode {
    /// Cycle order used by the mode-switch key.
    pub fn next(self) -> Self {
        match self {
            Self::Uniform => Self::Venturi,
            Self::Venturi => Self::Cylinder,
            Self::Cylinder => Self::PipeProfile,
            Self::PipeProfile => Self::OpenChannel,
            Self::OpenChannel => Self::Uniform,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Uniform => "uniform",
            Self::Venturi => "venturi",
            Self::Cylinder => "cylinder",
            Self::PipeProfile => "pipe",
            Self::OpenChannel => "channel",
        }
    }

    /// Parse a config-file experiment name. Unknown names fall back to uniform.
    pub fn from_name(name: &str) -> Self {
        match name {
            "venturi" => Self::Venturi,
            "cylinder" => Self::Cylinder,
            "pipe" | "pipe-profile" => Self::PipeProfile,
            "channel" | "open-channel" => Self::OpenChannel,
            _ => Self::Uniform,
        }
    }
}

/// UI-enforced parameter ranges. Values arriving from outside (config file,
/// overlay) are clamped into these before the engine sees them.
pub const FLOW_SPEED_RANGE: (f64, f64) = (0.05, 6.0);
pub const VISCOSITY_RANGE: (f64, f64) = (0.0001, 2.0);
pub const DENSITY_RANGE: (f64, f64) = (1.0, 13600.0);
pub const DIAMETER_RANGE: (f64, f64) = (0.02, 1.0);
pub const PARTICLE_RANGE: (usize, usize) = (0, 4000);
pub const TRAIL_FADE_RANGE: (f64, f64) = (0.0, 0.95);

/// One mutable snapshot of every simulation parameter. The host owns the
/// authoritative copy and ships whole clones to the engine on each edit.
#[derive(Clone, Debug, PartialEq)]
pub struct SimParams {
    pub mode: ExperimentMode,
    /// Free-stream speed, m/s.
    pub flow_speed: f64,
    /// Dynamic viscosity, Pa·s.
    pub viscosity: f64,
    /// Fluid density, kg/m³.
    pub density: f64,
    /// Characteristic diameter, m. Drives throat width / cylinder radius.
    pub diameter: f64,
    pub particle_count: usize,
    /// Trail strength, 0 = no trails (display-only).
    pub trail_fade: f64,
    /// Streamline traces on/off (display-only).
    pub show_streamlines: bool,
    /// Explicit Reynolds value supplied by a preset, bypassing the formula.
    pub reynolds_override: Option<f64>,
}

impl Default for SimParams {
    fn default() -> Self {
        Self {
            mode: ExperimentMode::Uniform,
            flow_speed: 1.0,
            viscosity: 0.001,
            density: 1000.0,
            diameter: 0.2,
            particle_count: 800,
            trail_fade: 0.5,
            show_streamlines: false,
            reynolds_override: None,
        }
    }
}

impl SimParams {
    /// Default parameter set for the given experiment.
    pub fn preset(mode: ExperimentMode) -> Self {
        let base = Self::default();
        match mode {
            ExperimentMode::Uniform => Self { mode, ..base },
            ExperimentMode::Venturi => Self {
                mode,
                flow_speed: 1.5,
                ..base
            },
            ExperimentMode::Cylinder => Self {
                mode,
                flow_speed: 0.8,
                diameter: 0.3,
                ..base
            },
            ExperimentMode::PipeProfile => Self {
                mode,
                viscosity: 0.05,
                trail_fade: 0.7,
                ..base
            },
            ExperimentMode::OpenChannel => Self {
                mode,
                flow_speed: 0.6,
                ..base
            },
        }
    }

    /// Clamp every physical parameter into its UI range. Degenerate values
    /// from the config file end up here before the engine ever divides by them.
    pub fn clamp_to_ranges(&mut self) {
        self.flow_speed = self.flow_speed.clamp(FLOW_SPEED_RANGE.0, FLOW_SPEED_RANGE.1);
        self.viscosity = self.viscosity.clamp(VISCOSITY_RANGE.0, VISCOSITY_RANGE.1);
        self.density = self.density.clamp(DENSITY_RANGE.0, DENSITY_RANGE.1);
        self.diameter = self.diameter.clamp(DIAMETER_RANGE.0, DIAMETER_RANGE.1);
        self.particle_count = self.particle_count.clamp(PARTICLE_RANGE.0, PARTICLE_RANGE.1);
        self.trail_fade = self.trail_fade.clamp(TRAIL_FADE_RANGE.0, TRAIL_FADE_RANGE.1);
    }
}
