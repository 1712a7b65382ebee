//! Scalar physics shared by the sequential evaluator and the host device.
//!
//! The arithmetic here is written in the same order as `forces.wgsl` and
//! `integrate.wgsl` so the host paths and the GPU path round identically
//! wherever the hardware allows it.

use nbody_shaders::{EXCLUDE_BY_POSITION, StepConstants};

/// Acceleration scale `G * m / (d² + eps²)^1.5` applied to the displacement `(dx, dy)`.
#[inline(always)]
pub fn pair_strength(g: f32, eps_sq: f32, dx: f32, dy: f32, other_mass: f32) -> f32 {
    let dist_sq = dx * dx + dy * dy + eps_sq;
    let inv_dist_cubed = 1.0 / (dist_sq * dist_sq.sqrt());
    g * other_mass * inv_dist_cubed
}

/// Moves a coordinate that left `[-extent/2, extent/2]` back in from the opposite edge.
///
/// Only one correction is applied, a coordinate more than one extent outside stays outside.
#[inline(always)]
pub fn wrap(value: f32, extent: u32) -> f32 {
    let half_extent = (extent / 2) as f32;
    if value < -half_extent {
        value + extent as f32
    } else if value > half_extent {
        value - extent as f32
    } else {
        value
    }
}

/// Semi-implicit Euler: velocity first, then position from the new velocity, then wrap.
#[inline(always)]
pub fn advance(
    pos: [f32; 2],
    vel: [f32; 2],
    acc: [f32; 2],
    dt: f32,
    width: u32,
    height: u32,
) -> ([f32; 2], [f32; 2]) {
    let vx = vel[0] + acc[0] * dt;
    let vy = vel[1] + acc[1] * dt;
    let x = pos[0] + vx * dt;
    let y = pos[1] + vy * dt;
    ([wrap(x, width), wrap(y, height)], [vx, vy])
}

/// Acceleration of body `i` from every other body, reading only positions and masses.
pub fn force_task(
    i: usize,
    x: &[f32],
    y: &[f32],
    mass: &[f32],
    constants: &StepConstants,
) -> (f32, f32) {
    let (xi, yi) = (x[i], y[i]);
    let eps_sq = constants.eps * constants.eps;
    let by_position = constants.exclusion == EXCLUDE_BY_POSITION;

    let mut ax = 0.0;
    let mut ay = 0.0;
    for (j, ((&xj, &yj), &mj)) in x.iter().zip(y).zip(mass).enumerate() {
        let excluded = if by_position {
            xj == xi && yj == yi
        } else {
            j == i
        };
        if excluded {
            continue;
        }

        let dx = xj - xi;
        let dy = yj - yi;
        let strength = pair_strength(constants.g, eps_sq, dx, dy, mj);
        ax += dx * strength;
        ay += dy * strength;
    }
    (ax, ay)
}

/// Whether body `i` is skipped by the integration kernel.
#[inline(always)]
pub fn held_task(i: usize, mass: &[f32], pinned: &[u32], constants: &StepConstants) -> bool {
    pinned[i] != 0
        || (constants.use_mass_threshold != 0 && mass[i] >= constants.fixed_mass_threshold)
}
