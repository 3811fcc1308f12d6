use super::params::SimParams;
use super::Domain;

/// Ring depth for trail rendering.
pub const TRAIL_LEN: usize = 8;

/// How far off-canvas new particles spawn, px.
const SPAWN_BAND: f64 = 20.0;
/// Horizontal spawn-speed jitter range around flow_speed.
const SPAWN_JITTER: (f64, f64) = (0.7, 1.3);
/// Vertical spawn-speed jitter, m/s.
const SPAWN_VY: f64 = 0.025;

pub struct Xor128 {
    x: u32,
    y: u32,
    z: u32,
    w: u32,
}

impl Xor128 {
    pub fn new(seed: u32) -> Self {
        Self {
            x: seed,
            y: seed.wrapping_mul(1812433253).wrapping_add(1),
            z: seed.wrapping_mul(1812433253).wrapping_mul(2).wrapping_add(2),
            w: seed.wrapping_mul(1812433253).wrapping_mul(3).wrapping_add(3),
        }
    }

    pub fn next(&mut self) -> u32 {
        let t = self.x ^ (self.x << 11);
        self.x = self.y;
        self.y = self.z;
        self.z = self.w;
        self.w = self.w ^ (self.w >> 19) ^ (t ^ (t >> 8));
        self.w
    }

    /// Returns a float in [-1.0, 1.0)
    pub fn next_f64(&mut self) -> f64 {
        (self.next() as f64 / u32::MAX as f64) * 2.0 - 1.0
    }

    /// Returns a float in [0.0, 1.0)
    pub fn next_unit(&mut self) -> f64 {
        self.next() as f64 / (u32::MAX as f64 + 1.0)
    }
}

/// One visual tracer. Position and velocity are pixel-space / m/s
/// respectively; age is simulated seconds since spawn.
#[derive(Clone, Copy, Debug)]
pub struct Particle {
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    pub age: f64,
    pub id: u64,
}

/// Owns the particle population. The integrator mutates it in place; the
/// renderer only reads the per-frame snapshot.
pub struct ParticleStore {
    particles: Vec<Particle>,
    next_id: u64,
    trail_xs: Vec<Vec<f64>>,
    trail_ys: Vec<Vec<f64>>,
    trail_cursor: usize,
    trail_count: usize,
}

impl ParticleStore {
    pub fn new(params: &SimParams, domain: &Domain, rng: &mut Xor128) -> Self {
        let mut store = Self {
            particles: Vec::new(),
            next_id: 0,
            trail_xs: vec![Vec::new(); TRAIL_LEN],
            trail_ys: vec![Vec::new(); TRAIL_LEN],
            trail_cursor: 0,
            trail_count: 0,
        };
        store.reset(params, domain, rng);
        store
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Particle> {
        self.particles.iter()
    }

    pub fn get(&self, index: usize) -> Particle {
        self.particles[index]
    }

    pub fn get_mut(&mut self, index: usize) -> &mut Particle {
        &mut self.particles[index]
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Particle> {
        self.particles.iter_mut()
    }

    /// Spawn one particle near the left inflow edge, slightly off-canvas,
    /// with jittered velocity so fresh particles don't march in rows.
    pub fn spawn_one(&mut self, params: &SimParams, domain: &Domain, rng: &mut Xor128) -> Particle {
        let id = self.next_id;
        self.next_id += 1;
        let (jlo, jhi) = SPAWN_JITTER;
        Particle {
            x: -SPAWN_BAND * rng.next_unit(),
            y: domain.height * rng.next_unit(),
            vx: params.flow_speed * (jlo + (jhi - jlo) * rng.next_unit()),
            vy: SPAWN_VY * rng.next_f64(),
            age: 0.0,
            id,
        }
    }

    /// Replace the particle at `index` with a fresh spawn. Population size is
    /// unchanged; the retired particle's id is never reused.
    pub fn recycle(&mut self, index: usize, params: &SimParams, domain: &Domain, rng: &mut Xor128) {
        let fresh = self.spawn_one(params, domain, rng);
        self.particles[index] = fresh;
    }

    /// Discard everything and respawn to the target population.
    pub fn reset(&mut self, params: &SimParams, domain: &Domain, rng: &mut Xor128) {
        self.particles.clear();
        for _ in 0..params.particle_count {
            let p = self.spawn_one(params, domain, rng);
            self.particles.push(p);
        }
        for t in &mut self.trail_xs {
            t.clear();
        }
        for t in &mut self.trail_ys {
            t.clear();
        }
        self.trail_cursor = 0;
        self.trail_count = 0;
    }

    /// Grow or shrink toward a new target population. Shrinking removes the
    /// excess from the tail; growing spawns the shortfall. Survivors keep
    /// their state.
    pub fn resize(&mut self, target: usize, params: &SimParams, domain: &Domain, rng: &mut Xor128) {
        if target < self.particles.len() {
            self.particles.truncate(target);
        } else {
            while self.particles.len() < target {
                let p = self.spawn_one(params, domain, rng);
                self.particles.push(p);
            }
        }
    }

    /// Record current positions into the trail ring buffer.
    pub fn push_trail(&mut self) {
        let xs: Vec<f64> = self.particles.iter().map(|p| p.x).collect();
        let ys: Vec<f64> = self.particles.iter().map(|p| p.y).collect();
        self.trail_xs[self.trail_cursor] = xs;
        self.trail_ys[self.trail_cursor] = ys;
        self.trail_cursor = (self.trail_cursor + 1) % TRAIL_LEN;
        if self.trail_count < TRAIL_LEN {
            self.trail_count += 1;
        }
    }

    /// Copy trails into `dst_xs`/`dst_ys` in chronological order, oldest first.
    pub fn copy_trails_into(&self, dst_xs: &mut Vec<Vec<f64>>, dst_ys: &mut Vec<Vec<f64>>) {
        let count = self.trail_count;
        dst_xs.resize_with(count, Vec::new);
        dst_ys.resize_with(count, Vec::new);
        for i in 0..count {
            let slot = if count < TRAIL_LEN {
                i
            } else {
                (self.trail_cursor + i) % TRAIL_LEN
            };
            let src_x = &self.trail_xs[slot];
            let src_y = &self.trail_ys[slot];
            dst_xs[i].resize(src_x.len(), 0.0);
            dst_ys[i].resize(src_y.len(), 0.0);
            dst_xs[i].copy_from_slice(src_x);
            dst_ys[i].copy_from_slice(src_y);
        }
    }
}
