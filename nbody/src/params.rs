use nbody_shaders::{EXCLUDE_BY_INDEX, EXCLUDE_BY_POSITION, StepConstants};

use crate::constants::{DELTA, FIXED_MASS_THRESHOLD, G, HEIGHT, SOFTENING, WIDTH};

/// Rule deciding which pairs are left out of force accumulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum PairExclusion {
    /// A body never attracts itself, every distinct pair interacts.
    #[default]
    Index,
    /// Any two bodies on exactly the same coordinates skip each other,
    /// including distinct bodies that happen to coincide.
    Position,
}

/// Everything one step needs besides the bodies themselves.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepParams {
    pub g: f32,
    pub eps: f32,
    pub dt: f32,
    pub width: u32,
    pub height: u32,
    /// Bodies at or above this mass are held fixed. `None` leaves it to [`Body::fixed`].
    ///
    /// [`Body::fixed`]: crate::Body::fixed
    pub fixed_mass_threshold: Option<f32>,
    pub exclusion: PairExclusion,
}

impl Default for StepParams {
    fn default() -> Self {
        Self::new(G, SOFTENING, DELTA, WIDTH, HEIGHT)
    }
}

impl StepParams {
    pub fn new(g: f32, eps: f32, dt: f32, width: u32, height: u32) -> Self {
        Self {
            g,
            eps,
            dt,
            width,
            height,
            fixed_mass_threshold: Some(FIXED_MASS_THRESHOLD),
            exclusion: PairExclusion::Index,
        }
    }

    pub fn with_fixed_mass_threshold(mut self, threshold: Option<f32>) -> Self {
        self.fixed_mass_threshold = threshold;
        self
    }

    pub fn with_exclusion(mut self, exclusion: PairExclusion) -> Self {
        self.exclusion = exclusion;
        self
    }

    /// Uniform block handed to the device kernels.
    pub fn shader_constants(&self, body_count: u32) -> StepConstants {
        StepConstants {
            g: self.g,
            eps: self.eps,
            dt: self.dt,
            fixed_mass_threshold: self.fixed_mass_threshold.unwrap_or(0.0),
            width: self.width,
            height: self.height,
            body_count,
            exclusion: match self.exclusion {
                PairExclusion::Index => EXCLUDE_BY_INDEX,
                PairExclusion::Position => EXCLUDE_BY_POSITION,
            },
            use_mass_threshold: self.fixed_mass_threshold.is_some() as u32,
            _pad: [0; 3],
        }
    }
}
