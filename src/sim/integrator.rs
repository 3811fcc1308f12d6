use super::field;
use super::params::SimParams;
use super::particles::{ParticleStore, Xor128};
use super::Domain;

/// Pixels per metre: converts physical velocities for pixel-space advection.
pub const VEL_TO_PX: f64 = 60.0;
/// Viscosity damping scale in exp(-DAMP_SCALE·μ·dt). Visual tuning value.
const DAMP_SCALE: f64 = 200.0;
/// How quickly particle velocity relaxes toward the local field per tick.
const BLEND_RATE: f64 = 0.08;
/// Recycle margin beyond the visible domain, px.
const BOUNDS_MARGIN: f64 = 24.0;
/// Maximum particle lifetime, simulated seconds.
pub const MAX_AGE: f64 = 18.0;
/// Largest tick we integrate; longer wall-clock gaps are truncated.
pub const MAX_DT: f64 = 0.05;

/// Advance every particle by one tick: sample the local field, damp and blend
/// the particle's velocity toward it, move, age, and recycle anything that
/// left the domain or outlived the age ceiling. Population size is preserved
/// exactly. Non-positive dt skips the tick entirely.
pub fn step(
    store: &mut ParticleStore,
    params: &SimParams,
    domain: &Domain,
    dt: f64,
    rng: &mut Xor128,
) {
    if dt <= 0.0 {
        return;
    }
    let dt = dt.min(MAX_DT);
    let damping = (-DAMP_SCALE * params.viscosity * dt).exp();

    for i in 0..store.len() {
        let p = store.get(i);
        let (fu, fv) = field::velocity_at(p.x, p.y, domain, params, rng);

        let recycled = {
            let p = store.get_mut(i);
            p.vx = p.vx * damping + (fu - p.vx) * BLEND_RATE;
            p.vy = p.vy * damping + (fv - p.vy) * BLEND_RATE;
            p.x += p.vx * dt * VEL_TO_PX;
            p.y += p.vy * dt * VEL_TO_PX;
            p.age += dt;

            p.x > domain.width + BOUNDS_MARGIN
                || p.y < -BOUNDS_MARGIN
                || p.y > domain.height + BOUNDS_MARGIN
                || p.age > MAX_AGE
        };
        if recycled {
            store.recycle(i, params, domain, rng);
        }
    }
}
