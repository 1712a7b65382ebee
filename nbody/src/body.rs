use std::f32::consts::TAU;

use cgmath::{Point2, Vector2, Zero};
use rand::Rng;

use crate::constants::{
    MAX_RANDOM_MASS, MAX_RANDOM_SPEED, MIN_RANDOM_MASS, MIN_SPAWN_RADIUS, SPAWN_EDGE_MARGIN,
};

/// A point mass in the plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Body {
    pub pos: Point2<f32>,
    pub vel: Vector2<f32>,
    /// Recomputed from scratch at the start of every step, never carried over.
    pub acc: Vector2<f32>,
    pub mass: f32,
    /// Fixed bodies attract others but are never integrated.
    pub fixed: bool,
}

impl Body {
    pub fn new(pos: Point2<f32>, vel: Vector2<f32>, mass: f32) -> Self {
        Self {
            pos,
            vel,
            acc: Vector2::zero(),
            mass,
            fixed: false,
        }
    }

    /// Whether both bodies sit on exactly the same coordinates.
    #[inline]
    pub fn coincides_with(&self, other: &Body) -> bool {
        self.pos.x == other.pos.x && self.pos.y == other.pos.y
    }

    /// Whether integration must leave this body in place.
    #[inline]
    pub fn is_held(&self, fixed_mass_threshold: Option<f32>) -> bool {
        self.fixed || fixed_mass_threshold.is_some_and(|threshold| self.mass >= threshold)
    }
}

/// Outer radius of the ring random bodies are placed on.
///
/// Domains too small for the ring collapse it onto the inner radius.
pub fn spawn_radius_limit(width: u32, height: u32) -> f32 {
    let limit = width.min(height) as f32 / 2.0 - SPAWN_EDGE_MARGIN;
    limit.max(MIN_SPAWN_RADIUS)
}

/// Draws a body on a ring around the origin with a small random velocity.
///
/// The draw order (angle, radius, velocity, mass) is fixed so a seeded
/// generator reproduces the same bodies.
pub fn make_random_body<R: Rng + ?Sized>(rng: &mut R, width: u32, height: u32) -> Body {
    let angle = rng.random_range(0.0..TAU);
    let radius = rng.random_range(MIN_SPAWN_RADIUS..=spawn_radius_limit(width, height));

    let pos = Point2::new(radius * angle.cos(), radius * angle.sin());
    let vel = Vector2::new(
        rng.random_range(-MAX_RANDOM_SPEED..=MAX_RANDOM_SPEED),
        rng.random_range(-MAX_RANDOM_SPEED..=MAX_RANDOM_SPEED),
    );
    let mass = rng.random_range(MIN_RANDOM_MASS..=MAX_RANDOM_MASS);

    Body::new(pos, vel, mass)
}

/// A motionless fixed body at the origin.
///
/// The bounds are accepted to mirror [`make_random_body`], placement does not depend on them.
pub fn make_central_body(mass: f32, _width: u32, _height: u32) -> Body {
    Body {
        fixed: true,
        ..Body::new(Point2::new(0.0, 0.0), Vector2::zero(), mass)
    }
}

#[cfg(test)]
mod tests {
    use cgmath::{EuclideanSpace, InnerSpace};
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    #[test]
    fn random_bodies_stay_on_the_spawn_ring() {
        let mut rng = StdRng::seed_from_u64(7);
        let limit = spawn_radius_limit(1920, 1080);
        assert_eq!(limit, 520.0);

        for _ in 0..500 {
            let body = make_random_body(&mut rng, 1920, 1080);
            let radius = body.pos.to_vec().magnitude();
            assert!(radius >= MIN_SPAWN_RADIUS - 1e-3 && radius <= limit + 1e-3);
            assert!(body.vel.x.abs() <= 1.0 && body.vel.y.abs() <= 1.0);
            assert!((MIN_RANDOM_MASS..=MAX_RANDOM_MASS).contains(&body.mass));
            assert_eq!(body.acc, Vector2::zero());
            assert!(!body.fixed);
        }
    }

    #[test]
    fn same_seed_same_bodies() {
        let mut a = StdRng::seed_from_u64(42);
        let mut b = StdRng::seed_from_u64(42);
        for _ in 0..10 {
            assert_eq!(
                make_random_body(&mut a, 800, 600),
                make_random_body(&mut b, 800, 600)
            );
        }
    }

    #[test]
    fn tiny_domain_collapses_ring() {
        let mut rng = StdRng::seed_from_u64(1);
        let body = make_random_body(&mut rng, 10, 10);
        assert!((body.pos.to_vec().magnitude() - MIN_SPAWN_RADIUS).abs() < 1e-3);
    }

    #[test]
    fn central_body_ignores_bounds() {
        let a = make_central_body(1000.0, 1920, 1080);
        let b = make_central_body(1000.0, 10, 10);
        assert_eq!(a, b);
        assert_eq!(a.pos, Point2::new(0.0, 0.0));
        assert_eq!(a.vel, Vector2::zero());
        assert!(a.fixed);
    }

    #[test]
    fn held_by_flag_or_threshold() {
        let light = Body::new(Point2::new(1.0, 1.0), Vector2::zero(), 5.0);
        assert!(!light.is_held(Some(1000.0)));
        assert!(!light.is_held(None));

        let heavy = Body::new(Point2::new(1.0, 1.0), Vector2::zero(), 1000.0);
        assert!(heavy.is_held(Some(1000.0)));
        assert!(!heavy.is_held(None));

        let central = make_central_body(1.0, 0, 0);
        assert!(central.is_held(None));
    }
}
