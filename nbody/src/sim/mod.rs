use crate::{
    body::Body,
    device::{DeviceConfig, DeviceContext},
    error::{InitError, StepError},
    params::StepParams,
};

pub mod batch;
pub mod kernels;
pub mod sequential;

/// The per-frame step contract shared by every execution strategy.
///
/// A call returns only once the whole step has finished, the bodies are
/// updated in place.
pub trait StepStrategy {
    fn step(&mut self, bodies: &mut [Body], params: &StepParams) -> Result<(), StepError>;

    fn name(&self) -> &'static str;
}

/// Force accumulation and integration on the calling thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct Sequential;

impl StepStrategy for Sequential {
    fn step(&mut self, bodies: &mut [Body], params: &StepParams) -> Result<(), StepError> {
        sequential::step(bodies, params);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "sequential"
    }
}

impl StepStrategy for DeviceContext {
    fn step(&mut self, bodies: &mut [Body], params: &StepParams) -> Result<(), StepError> {
        DeviceContext::step(self, bodies, params)
    }

    fn name(&self) -> &'static str {
        self.kind().name()
    }
}

/// Execution strategy, chosen once before the run loop.
pub enum Strategy {
    Sequential(Sequential),
    Device(Box<DeviceContext>),
}

impl Strategy {
    pub fn sequential() -> Self {
        Self::Sequential(Sequential)
    }

    /// Acquire a device sized for `body_count` bodies.
    pub fn device(body_count: usize, config: &DeviceConfig) -> Result<Self, InitError> {
        DeviceContext::new(body_count, config).map(|ctx| Self::Device(Box::new(ctx)))
    }

    /// Release whatever the strategy holds. Dropping has the same effect.
    pub fn shutdown(self) {
        if let Self::Device(ctx) = self {
            (*ctx).shutdown();
        }
    }
}

impl StepStrategy for Strategy {
    fn step(&mut self, bodies: &mut [Body], params: &StepParams) -> Result<(), StepError> {
        match self {
            Self::Sequential(sim) => sim.step(bodies, params),
            Self::Device(ctx) => ctx.step(bodies, params),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Sequential(sim) => sim.name(),
            Self::Device(ctx) => StepStrategy::name(ctx.as_ref()),
        }
    }
}
