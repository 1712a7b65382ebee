use cgmath::{EuclideanSpace, InnerSpace, Vector2};
use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::{
    body::{Body, make_central_body, make_random_body},
    constants::{BODY_COUNT, CENTRAL_MASS, G, HEIGHT, SEED, WIDTH},
};

/// How random bodies get their initial velocity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum InitialVelocity {
    /// Uniform draw per component.
    #[default]
    Random,
    /// Circular orbit around the central body, counter-clockwise.
    Orbital,
}

/// Speed of a circular orbit of radius `r` around a mass `central_mass`.
pub fn orbital_speed(g: f32, central_mass: f32, r: f32) -> f32 {
    (g * central_mass / r).sqrt()
}

/// Replace a body's velocity with the circular orbit velocity around the origin.
pub fn circularize(body: &mut Body, g: f32, central_mass: f32) {
    let radial = body.pos.to_vec();
    let r = radial.magnitude();
    if r == 0.0 {
        return;
    }
    let tangent = Vector2::new(-radial.y, radial.x) / r;
    body.vel = tangent * orbital_speed(g, central_mass, r);
}

/// `count` random bodies followed by the central body.
pub fn startup_bodies<R: Rng + ?Sized>(
    rng: &mut R,
    count: usize,
    central_mass: f32,
    width: u32,
    height: u32,
) -> Vec<Body> {
    let mut bodies = Vec::with_capacity(count + 1);
    for _ in 0..count {
        bodies.push(make_random_body(rng, width, height));
    }
    bodies.push(make_central_body(central_mass, width, height));
    bodies
}

/// Reproducible startup configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Scenario {
    pub body_count: usize,
    pub central_mass: f32,
    pub width: u32,
    pub height: u32,
    pub seed: u64,
    pub initial_velocity: InitialVelocity,
    /// Only used to size orbital velocities.
    pub g: f32,
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            body_count: BODY_COUNT,
            central_mass: CENTRAL_MASS,
            width: WIDTH,
            height: HEIGHT,
            seed: SEED,
            initial_velocity: InitialVelocity::Random,
            g: G,
        }
    }
}

impl Scenario {
    pub fn build(&self) -> Vec<Body> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut bodies = startup_bodies(
            &mut rng,
            self.body_count,
            self.central_mass,
            self.width,
            self.height,
        );
        if self.initial_velocity == InitialVelocity::Orbital {
            for body in bodies.iter_mut().filter(|body| !body.fixed) {
                circularize(body, self.g, self.central_mass);
            }
        }
        bodies
    }
}

#[cfg(test)]
mod tests {
    use cgmath::Point2;

    use super::*;

    #[test]
    fn central_body_comes_last() {
        let bodies = Scenario::default().build();
        assert_eq!(bodies.len(), BODY_COUNT + 1);
        let central = bodies.last().unwrap();
        assert!(central.fixed);
        assert_eq!(central.mass, CENTRAL_MASS);
        assert!(bodies[..BODY_COUNT].iter().all(|body| !body.fixed));
    }

    #[test]
    fn same_seed_same_scenario() {
        let scenario = Scenario {
            seed: 9,
            ..Default::default()
        };
        assert_eq!(scenario.build(), scenario.build());
        let other = Scenario {
            seed: 10,
            ..Default::default()
        };
        assert_ne!(scenario.build(), other.build());
    }

    #[test]
    fn orbital_velocity_is_tangential() {
        let mut body = Body::new(Point2::new(100.0, 0.0), Vector2::new(5.0, 5.0), 1.0);
        circularize(&mut body, 1.0, 1000.0);
        assert!(body.vel.x.abs() < 1e-6);
        assert!((body.vel.y - 10.0f32.sqrt()).abs() < 1e-5);
        assert!(body.vel.dot(body.pos.to_vec()).abs() < 1e-3);
    }

    #[test]
    fn orbital_scenario_keeps_central_body_still() {
        let bodies = Scenario {
            initial_velocity: InitialVelocity::Orbital,
            ..Default::default()
        }
        .build();
        assert_eq!(bodies.last().unwrap().vel, Vector2::new(0.0, 0.0));
        for body in &bodies[..bodies.len() - 1] {
            let r = body.pos.to_vec().magnitude();
            assert!((body.vel.magnitude() - orbital_speed(1.0, 1000.0, r)).abs() < 1e-3);
        }
    }
}
