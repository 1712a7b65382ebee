use cgmath::{Point2, Vector2, Zero};

use crate::{
    body::Body,
    params::{PairExclusion, StepParams},
    sim::kernels::{advance, pair_strength},
};

/// Phase A: overwrite every body's acceleration with the pull of all other bodies.
pub fn compute_forces(bodies: &mut [Body], g: f32, eps: f32, exclusion: PairExclusion) {
    for body in bodies.iter_mut() {
        body.acc = Vector2::zero();
    }

    let eps_sq = eps * eps;
    for i in 0..bodies.len() {
        let current = bodies[i];
        let mut acc = Vector2::zero();
        for (j, other) in bodies.iter().enumerate() {
            let excluded = match exclusion {
                PairExclusion::Index => i == j,
                PairExclusion::Position => current.coincides_with(other),
            };
            if excluded {
                continue;
            }

            let dx = other.pos.x - current.pos.x;
            let dy = other.pos.y - current.pos.y;
            let strength = pair_strength(g, eps_sq, dx, dy, other.mass);
            acc.x += dx * strength;
            acc.y += dy * strength;
        }
        bodies[i].acc = acc;
    }
}

/// Phase B: advance every body that is not held, wrapping at the domain edges.
pub fn integrate_bodies(bodies: &mut [Body], params: &StepParams) {
    for body in bodies.iter_mut() {
        if body.is_held(params.fixed_mass_threshold) {
            continue;
        }
        let (pos, vel) = advance(
            body.pos.into(),
            body.vel.into(),
            body.acc.into(),
            params.dt,
            params.width,
            params.height,
        );
        body.pos = Point2::from(pos);
        body.vel = Vector2::from(vel);
    }
}

/// One full step on the calling thread.
pub fn step(bodies: &mut [Body], params: &StepParams) {
    compute_forces(bodies, params.g, params.eps, params.exclusion);
    integrate_bodies(bodies, params);
}
