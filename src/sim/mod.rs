pub mod field;
pub mod integrator;
pub mod params;
pub mod particles;
pub mod readouts;

pub use params::{ExperimentMode, SimParams};
pub use particles::{ParticleStore, Xor128, TRAIL_LEN};
pub use readouts::{ReadoutLog, Readouts};

/// Visible simulation area in pixels. Matches the render display area 1:1.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Domain {
    pub width: f64,
    pub height: f64,
}

impl Domain {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width: width as f64,
            height: height as f64,
        }
    }
}

/// Readouts are also refreshed on this tick cadence while parameters sit
/// still, to pick up override-driven changes.
const READOUT_INTERVAL: u64 = 10;

/// Control messages from the host to the physics thread. Replaces the
/// broadcast-event wiring of a browser host with an enumerable queue.
#[derive(Clone, Debug)]
pub enum Command {
    /// Whole-snapshot parameter replacement.
    Params(SimParams),
    Pause(bool),
    Reset,
    /// Domain changed (window resize); implies a full reset.
    Domain(Domain),
    /// Write the readout history as CSV to this path.
    ExportCsv(std::path::PathBuf),
}

/// Per-frame state handed to the renderer. Allocated once and recycled
/// between the physics and render threads.
pub struct FrameSnapshot {
    pub params: SimParams,
    pub domain: Domain,
    pub particles_x: Vec<f64>,
    pub particles_y: Vec<f64>,
    /// Past particle positions ordered oldest to newest.
    pub trail_xs: Vec<Vec<f64>>,
    pub trail_ys: Vec<Vec<f64>>,
    pub readouts: Readouts,
    pub running: bool,
}

impl FrameSnapshot {
    /// Pre-allocate a snapshot buffer for the given population size.
    pub fn new_empty(particle_count: usize) -> Self {
        let params = SimParams::default();
        FrameSnapshot {
            readouts: Readouts::compute(&params),
            params,
            domain: Domain::new(800, 560),
            particles_x: vec![0.0; particle_count],
            particles_y: vec![0.0; particle_count],
            trail_xs: vec![Vec::new(); TRAIL_LEN],
            trail_ys: vec![Vec::new(); TRAIL_LEN],
            running: true,
        }
    }
}

/// The simulation core: particle store, current parameter snapshot, injected
/// randomness, and derived readouts, advanced one tick at a time. Mutated by
/// exactly one thread; the renderer only ever sees snapshots.
pub struct Engine {
    params: SimParams,
    domain: Domain,
    store: ParticleStore,
    rng: Xor128,
    readouts: Readouts,
    log: ReadoutLog,
    running: bool,
    tick: u64,
    sim_time: f64,
}

impl Engine {
    pub fn new(mut params: SimParams, domain: Domain, seed: u32) -> Self {
        params.clamp_to_ranges();
        let mut rng = Xor128::new(seed);
        let store = ParticleStore::new(&params, &domain, &mut rng);
        let readouts = Readouts::compute(&params);
        let mut log = ReadoutLog::new();
        log.record(0.0, readouts);
        Self {
            params,
            domain,
            store,
            rng,
            readouts,
            log,
            running: true,
            tick: 0,
            sim_time: 0.0,
        }
    }

    pub fn params(&self) -> &SimParams {
        &self.params
    }

    pub fn readouts(&self) -> Readouts {
        self.readouts
    }

    pub fn readout_log(&self) -> &ReadoutLog {
        &self.log
    }

    pub fn particles(&self) -> impl Iterator<Item = &particles::Particle> {
        self.store.iter()
    }

    pub fn population(&self) -> usize {
        self.store.len()
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn set_running(&mut self, running: bool) {
        self.running = running;
    }

    /// Discard all particles and respawn to the configured population.
    pub fn reset(&mut self) {
        self.store.reset(&self.params, &self.domain, &mut self.rng);
    }

    /// Window resize: adopt the new domain and start over.
    pub fn set_domain(&mut self, domain: Domain) {
        self.domain = domain;
        self.reset();
    }

    /// Whole-snapshot parameter replacement. A mode or geometry change resets
    /// the population outright; a population change resizes it in place.
    /// Readouts are recomputed synchronously. Applies even while paused.
    pub fn apply_params(&mut self, mut new: SimParams) {
        new.clamp_to_ranges();
        let geometry_changed =
            new.mode != self.params.mode || new.diameter != self.params.diameter;
        let target = new.particle_count;
        self.params = new;
        if geometry_changed {
            self.reset();
        } else if target != self.store.len() {
            self.store
                .resize(target, &self.params, &self.domain, &mut self.rng);
        }
        self.recompute_readouts();
    }

    fn recompute_readouts(&mut self) {
        self.readouts = Readouts::compute(&self.params);
        self.log.record(self.sim_time, self.readouts);
    }

    /// One simulation tick. Paused engines keep their state untouched but
    /// still accept parameter edits through `apply_params`.
    pub fn step(&mut self, dt: f64) {
        if !self.running {
            return;
        }
        integrator::step(&mut self.store, &self.params, &self.domain, dt, &mut self.rng);
        if dt > 0.0 {
            self.sim_time += dt.min(integrator::MAX_DT);
            self.tick += 1;
            if self.tick % READOUT_INTERVAL == 0 {
                self.recompute_readouts();
            }
        }
    }

    /// Copy current state into a pre-allocated snapshot, avoiding allocation.
    pub fn snapshot_into(&mut self, dst: &mut FrameSnapshot) {
        self.store.push_trail();
        let n = self.store.len();
        dst.particles_x.resize(n, 0.0);
        dst.particles_y.resize(n, 0.0);
        for (i, p) in self.store.iter().enumerate() {
            dst.particles_x[i] = p.x;
            dst.particles_y[i] = p.y;
        }
        self.store
            .copy_trails_into(&mut dst.trail_xs, &mut dst.trail_ys);
        dst.params = self.params.clone();
        dst.domain = self.domain;
        dst.readouts = self.readouts;
        dst.running = self.running;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_engine(count: usize) -> Engine {
        let params = SimParams {
            particle_count: count,
            ..SimParams::default()
        };
        Engine::new(params, Domain::new(800, 560), 42)
    }

    #[test]
    fn test_population_matches_target_across_ticks() {
        let mut engine = test_engine(250);
        for _ in 0..200 {
            engine.step(1.0 / 60.0);
            assert_eq!(engine.population(), 250);
        }
    }

    #[test]
    fn test_apply_params_resizes_in_place() {
        let mut engine = test_engine(300);
        engine.step(1.0 / 60.0);
        let survivor = engine.particles().next().unwrap().id;
        let mut params = engine.params().clone();
        params.particle_count = 100;
        engine.apply_params(params);
        assert_eq!(engine.population(), 100);
        assert_eq!(
            engine.particles().next().unwrap().id,
            survivor,
            "Plain population change must not reset survivors"
        );
    }

    #[test]
    fn test_mode_change_resets() {
        let mut engine = test_engine(100);
        for _ in 0..120 {
            engine.step(1.0 / 60.0);
        }
        let mut params = engine.params().clone();
        params.mode = ExperimentMode::Cylinder;
        engine.apply_params(params);
        assert_eq!(engine.population(), 100);
        let max_age = engine.particles().map(|p| p.age).fold(0.0_f64, f64::max);
        assert_eq!(max_age, 0.0, "Mode change should discard in-flight particles");
    }

    #[test]
    fn test_diameter_change_resets() {
        let mut engine = test_engine(100);
        for _ in 0..60 {
            engine.step(1.0 / 60.0);
        }
        let mut params = engine.params().clone();
        params.diameter = 0.5;
        engine.apply_params(params);
        let max_age = engine.particles().map(|p| p.age).fold(0.0_f64, f64::max);
        assert_eq!(max_age, 0.0, "Geometry change should discard in-flight particles");
    }

    #[test]
    fn test_flow_speed_change_does_not_reset() {
        let mut engine = test_engine(100);
        for _ in 0..60 {
            engine.step(1.0 / 60.0);
        }
        let mut params = engine.params().clone();
        params.flow_speed = 3.0;
        engine.apply_params(params);
        let max_age = engine.particles().map(|p| p.age).fold(0.0_f64, f64::max);
        assert!(max_age > 0.0, "Speed edits must preserve in-flight particles");
    }

    #[test]
    fn test_pause_freezes_state_but_accepts_params() {
        let mut engine = test_engine(50);
        engine.set_running(false);
        let before: Vec<f64> = engine.particles().map(|p| p.x).collect();
        for _ in 0..30 {
            engine.step(1.0 / 60.0);
        }
        let after: Vec<f64> = engine.particles().map(|p| p.x).collect();
        assert_eq!(before, after, "Paused engine must not advance");

        let mut params = engine.params().clone();
        params.flow_speed = 2.5;
        engine.apply_params(params);
        assert_eq!(engine.params().flow_speed, 2.5);
        assert_eq!(engine.readouts().avg_velocity, 2.5, "Edits while paused still land");
    }

    #[test]
    fn test_reset_idempotent() {
        let mut engine = test_engine(200);
        engine.reset();
        let first: Vec<(f64, f64)> = engine.particles().map(|p| (p.x, p.y)).collect();
        engine.reset();
        assert_eq!(engine.population(), 200);
        let second: Vec<(f64, f64)> = engine.particles().map(|p| (p.x, p.y)).collect();
        assert_ne!(first, second, "Resets share population, not positions");
    }

    #[test]
    fn test_resize_to_zero_keeps_readouts_alive() {
        let mut engine = test_engine(100);
        let mut params = engine.params().clone();
        params.particle_count = 0;
        engine.apply_params(params);
        assert_eq!(engine.population(), 0);
        engine.step(1.0 / 60.0);
        assert!(engine.readouts().reynolds >= 1.0);
    }

    #[test]
    fn test_decimated_readout_log() {
        let mut engine = test_engine(10);
        let initial = engine.readout_log().len();
        for _ in 0..95 {
            engine.step(1.0 / 60.0);
        }
        // 95 ticks at interval 10 -> 9 periodic recomputes.
        assert_eq!(engine.readout_log().len(), initial + 9);
    }

    #[test]
    fn test_snapshot_into_round_trip() {
        let mut engine = test_engine(40);
        for _ in 0..10 {
            engine.step(1.0 / 60.0);
        }
        let mut snap = FrameSnapshot::new_empty(40);
        engine.snapshot_into(&mut snap);
        assert_eq!(snap.particles_x.len(), 40);
        assert_eq!(snap.params.particle_count, 40);
        assert!(snap.running);
        let xs: Vec<f64> = engine.particles().map(|p| p.x).collect();
        assert_eq!(snap.particles_x, xs);
    }

    #[test]
    fn test_snapshot_buffer_reuse_tracks_resize() {
        let mut engine = test_engine(40);
        let mut snap = FrameSnapshot::new_empty(40);
        engine.snapshot_into(&mut snap);
        let mut params = engine.params().clone();
        params.particle_count = 15;
        engine.apply_params(params);
        engine.snapshot_into(&mut snap);
        assert_eq!(snap.particles_x.len(), 15, "Reused buffer must shrink with the store");
    }

    #[test]
    fn test_domain_change_resets() {
        let mut engine = test_engine(60);
        for _ in 0..60 {
            engine.step(1.0 / 60.0);
        }
        engine.set_domain(Domain::new(1024, 640));
        let max_age = engine.particles().map(|p| p.age).fold(0.0_f64, f64::max);
        assert_eq!(max_age, 0.0);
        assert_eq!(engine.population(), 60);
    }
}
