use std::collections::VecDeque;

use super::params::SimParams;

/// Denominator floors for the Reynolds formula. UI ranges already forbid
/// zero, but externally supplied snapshots get clamped here regardless.
const EPS_DIAMETER: f64 = 0.001;
const EPS_VISCOSITY: f64 = 1e-6;

/// Most history entries the log retains; oldest entries roll off.
pub const HISTORY_CAP: usize = 600;

/// Derived display quantities. Recomputed from the scalar parameters, never
/// from particle statistics.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Readouts {
    /// Dimensionless, clamped to >= 1, pre-rounded for integer display.
    pub reynolds: f64,
    /// m/s, 2 decimals.
    pub avg_velocity: f64,
    /// kPa, 3 decimals.
    pub dynamic_pressure: f64,
}

impl Readouts {
    pub fn compute(params: &SimParams) -> Self {
        let reynolds = match params.reynolds_override {
            Some(re) => re.max(1.0),
            None => {
                let d = params.diameter.max(EPS_DIAMETER);
                let mu = params.viscosity.max(EPS_VISCOSITY);
                (params.density * params.flow_speed * d / mu).max(1.0)
            }
        }
        .round();
        Self {
            reynolds,
            avg_velocity: round_to(params.flow_speed, 2),
            dynamic_pressure: round_to(0.5 * params.density * params.flow_speed.powi(2) / 1000.0, 3),
        }
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

/// Bounded log of readout recomputations, consumed by the CSV exporter.
#[derive(Default)]
pub struct ReadoutLog {
    entries: VecDeque<(f64, Readouts)>,
}

impl ReadoutLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one entry stamped with simulated time.
    pub fn record(&mut self, sim_time: f64, readouts: Readouts) {
        if self.entries.len() == HISTORY_CAP {
            self.entries.pop_front();
        }
        self.entries.push_back((sim_time, readouts));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(f64, Readouts)> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_water_pipe_reynolds() {
        let params = SimParams {
            flow_speed: 1.0,
            viscosity: 0.001,
            density: 1000.0,
            diameter: 0.2,
            ..SimParams::default()
        };
        let r = Readouts::compute(&params);
        // 1000 * 1 * 0.2 / 0.001 = 200_000
        assert_eq!(r.reynolds, 200_000.0);
        assert_eq!(r.avg_velocity, 1.0);
        assert_eq!(r.dynamic_pressure, 0.5);
    }

    #[test]
    fn test_reynolds_finite_for_degenerate_denominators() {
        let mut params = SimParams {
            viscosity: 0.0,
            diameter: 0.0,
            ..SimParams::default()
        };
        let r = Readouts::compute(&params);
        assert!(r.reynolds.is_finite(), "Zero viscosity/diameter must not blow up");
        assert!(r.reynolds >= 1.0);

        params.viscosity = -1.0;
        params.diameter = -0.5;
        let r = Readouts::compute(&params);
        assert!(r.reynolds.is_finite());
        assert!(r.reynolds >= 1.0);
    }

    #[test]
    fn test_reynolds_clamped_to_one() {
        let params = SimParams {
            flow_speed: 0.05,
            viscosity: 2.0,
            density: 1.0,
            diameter: 0.02,
            ..SimParams::default()
        };
        let r = Readouts::compute(&params);
        assert_eq!(r.reynolds, 1.0, "Tiny Re must clamp to 1");
    }

    #[test]
    fn test_reynolds_override_wins() {
        let params = SimParams {
            reynolds_override: Some(2500.0),
            viscosity: 123.0,
            ..SimParams::default()
        };
        let r = Readouts::compute(&params);
        assert_eq!(r.reynolds, 2500.0);
    }

    #[test]
    fn test_dynamic_pressure_quadratic() {
        let base = SimParams {
            flow_speed: 1.0,
            ..SimParams::default()
        };
        let doubled = SimParams {
            flow_speed: 2.0,
            ..base.clone()
        };
        let q1 = Readouts::compute(&base).dynamic_pressure;
        let q2 = Readouts::compute(&doubled).dynamic_pressure;
        assert!((q2 - 4.0 * q1).abs() < 1e-9, "q should scale with V²");
    }

    #[test]
    fn test_rounding_precision() {
        let params = SimParams {
            flow_speed: 1.23456,
            density: 998.2,
            ..SimParams::default()
        };
        let r = Readouts::compute(&params);
        assert_eq!(r.avg_velocity, 1.23);
        let q = r.dynamic_pressure;
        assert_eq!((q * 1000.0).round() / 1000.0, q, "q should carry 3 decimals");
    }

    #[test]
    fn test_log_caps_at_limit() {
        let mut log = ReadoutLog::new();
        let r = Readouts::compute(&SimParams::default());
        for i in 0..HISTORY_CAP + 50 {
            log.record(i as f64 * 0.1, r);
        }
        assert_eq!(log.len(), HISTORY_CAP);
        // Oldest entries rolled off: first surviving stamp is entry 50.
        let first = log.iter().next().unwrap().0;
        assert!((first - 5.0).abs() < 1e-9, "Oldest entries should be dropped, got {}", first);
    }
}
