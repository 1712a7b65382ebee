use crate::{body::Body, error::StepError};

/// Structure-of-arrays view of a body collection.
///
/// Every sequence has the length of the collection it was built from and
/// entry `i` always belongs to body `i`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Batch {
    pub x: Vec<f32>,
    pub y: Vec<f32>,
    pub vx: Vec<f32>,
    pub vy: Vec<f32>,
    pub ax: Vec<f32>,
    pub ay: Vec<f32>,
    pub mass: Vec<f32>,
    /// 1 for bodies flagged fixed, 0 otherwise. `u32` to match the kernel's storage layout.
    pub pinned: Vec<u32>,
}

impl Batch {
    pub fn with_len(len: usize) -> Self {
        Self {
            x: vec![0.0; len],
            y: vec![0.0; len],
            vx: vec![0.0; len],
            vy: vec![0.0; len],
            ax: vec![0.0; len],
            ay: vec![0.0; len],
            mass: vec![0.0; len],
            pinned: vec![0; len],
        }
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Copy every body into the batch. Accelerations start at zero.
    pub fn load(&mut self, bodies: &[Body]) {
        if self.len() != bodies.len() {
            *self = Self::with_len(bodies.len());
        }
        for (i, body) in bodies.iter().enumerate() {
            self.x[i] = body.pos.x;
            self.y[i] = body.pos.y;
            self.vx[i] = body.vel.x;
            self.vy[i] = body.vel.y;
            self.ax[i] = 0.0;
            self.ay[i] = 0.0;
            self.mass[i] = body.mass;
            self.pinned[i] = body.fixed as u32;
        }
    }

    /// Write position, velocity and acceleration back. Mass and the fixed flag are left alone.
    ///
    /// Only the slots both sides have are written.
    pub fn store(&self, bodies: &mut [Body]) {
        let slots = self
            .x
            .iter()
            .zip(&self.y)
            .zip(&self.vx)
            .zip(&self.vy)
            .zip(&self.ax)
            .zip(&self.ay);
        for (body, (((((&x, &y), &vx), &vy), &ax), &ay)) in bodies.iter_mut().zip(slots) {
            body.pos.x = x;
            body.pos.y = y;
            body.vel.x = vx;
            body.vel.y = vy;
            body.acc.x = ax;
            body.acc.y = ay;
        }
    }
}

pub fn to_batch(bodies: &[Body]) -> Batch {
    let mut batch = Batch::with_len(bodies.len());
    batch.load(bodies);
    batch
}

/// Write a batch back into the collection it was built from.
///
/// Nothing is written when the lengths differ.
pub fn from_batch(batch: &Batch, bodies: &mut [Body]) -> Result<(), StepError> {
    if batch.len() != bodies.len() {
        return Err(StepError::BodyCountMismatch {
            expected: batch.len(),
            actual: bodies.len(),
        });
    }
    batch.store(bodies);
    Ok(())
}
