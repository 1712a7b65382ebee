use std::fmt::Display;

use cgmath::{InnerSpace, Vector2, Zero};

use crate::body::Body;

pub fn total_momentum(bodies: &[Body]) -> Vector2<f32> {
    bodies
        .iter()
        .fold(Vector2::zero(), |acc, body| acc + body.vel * body.mass)
}

pub fn kinetic_energy(bodies: &[Body]) -> f32 {
    bodies
        .iter()
        .map(|body| 0.5 * body.mass * body.vel.magnitude2())
        .sum()
}

/// Snapshot for periodic logging.
#[derive(Debug, Clone, Copy)]
pub struct Summary {
    pub steps: u64,
    pub elapsed: f32,
    pub momentum: Vector2<f32>,
    pub kinetic_energy: f32,
}

impl Summary {
    pub fn new(bodies: &[Body], steps: u64, dt: f32) -> Self {
        Self {
            steps,
            elapsed: steps as f32 * dt,
            momentum: total_momentum(bodies),
            kinetic_energy: kinetic_energy(bodies),
        }
    }
}

impl Display for Summary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "t={:.2} ({} steps) p=({:.4}, {:.4}) E_k={:.4}",
            self.elapsed, self.steps, self.momentum.x, self.momentum.y, self.kinetic_energy
        )
    }
}

#[cfg(test)]
mod tests {
    use cgmath::Point2;

    use super::*;

    #[test]
    fn momentum_and_energy() {
        let bodies = [
            Body::new(Point2::new(0.0, 0.0), Vector2::new(1.0, 0.0), 2.0),
            Body::new(Point2::new(1.0, 0.0), Vector2::new(0.0, -3.0), 1.0),
        ];
        assert_eq!(total_momentum(&bodies), Vector2::new(2.0, -3.0));
        assert_eq!(kinetic_energy(&bodies), 1.0 + 4.5);
        assert_eq!(total_momentum(&[]), Vector2::zero());
    }

    #[test]
    fn summary_formats() {
        let bodies = [Body::new(Point2::new(0.0, 0.0), Vector2::new(1.0, 0.0), 2.0)];
        let summary = Summary::new(&bodies, 10, 0.1);
        assert_eq!(
            summary.to_string(),
            "t=1.00 (10 steps) p=(2.0000, 0.0000) E_k=1.0000"
        );
    }
}
