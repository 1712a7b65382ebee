//! Device-offloaded stepping over the structure-of-arrays layout.
//!
//! A [`DeviceContext`] owns everything the device needs for the run: kernels,
//! one buffer per body attribute sized to the body count, and the queue used to
//! move data in and out. Every step is
//!
//! 1. transcode the bodies into a [`Batch`],
//! 2. upload the batch and wait for the upload,
//! 3. dispatch the force kernel (one task per body) and wait,
//! 4. dispatch the integration kernel (one task per body) and wait,
//! 5. download positions, velocities and accelerations,
//! 6. transcode the batch back into the bodies.
//!
//! The wait between 3 and 4 is a full queue join, integration reads the
//! accelerations the force kernel just wrote.
//!
//! Two backends implement the same kernels: [`DeviceKind::Gpu`] runs the WGSL
//! kernels from `nbody-shaders` through wgpu, [`DeviceKind::Host`] runs the
//! matching functions in [`crate::sim::kernels`] on a rayon pool.

use std::{path::PathBuf, time::Instant};

use log::{debug, info};
use nbody_shaders::StepConstants;

use crate::{
    body::Body,
    error::{InitError, StepError, TransferError},
    params::StepParams,
    sim::batch::Batch,
};

mod gpu;
mod host;

use gpu::GpuBackend;
use host::HostBackend;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum DeviceKind {
    /// A wgpu compute adapter.
    #[default]
    Gpu,
    /// A rayon thread pool on the host.
    Host,
}

impl DeviceKind {
    pub fn name(&self) -> &'static str {
        match self {
            DeviceKind::Gpu => "device/gpu",
            DeviceKind::Host => "device/host",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DeviceConfig {
    pub kind: DeviceKind,
    /// Directory holding `forces.wgsl` and `integrate.wgsl`. The embedded kernels are used when unset.
    pub kernel_dir: Option<PathBuf>,
    /// Ask wgpu for a software adapter.
    pub force_fallback_adapter: bool,
}

impl DeviceConfig {
    pub fn host() -> Self {
        Self {
            kind: DeviceKind::Host,
            ..Default::default()
        }
    }

    pub fn gpu() -> Self {
        Self::default()
    }
}

/// The operations a backend performs within one step, in call order.
trait ComputeBackend {
    fn upload(&mut self, batch: &Batch, constants: &StepConstants) -> Result<(), TransferError>;

    fn dispatch_forces(&mut self) -> Result<(), TransferError>;

    fn dispatch_integrate(&mut self) -> Result<(), TransferError>;

    fn download(&mut self, batch: &mut Batch) -> Result<(), TransferError>;
}

enum Backend {
    Gpu(GpuBackend),
    Host(HostBackend),
}

impl Backend {
    fn as_compute(&mut self) -> &mut dyn ComputeBackend {
        match self {
            Backend::Gpu(gpu) => gpu,
            Backend::Host(host) => host,
        }
    }
}

/// Resources for the device strategy.
///
/// Construction acquires everything, dropping releases it, so a context that
/// failed half way through [`DeviceContext::new`] never exists.
pub struct DeviceContext {
    backend: Backend,
    batch: Batch,
    body_count: usize,
    kind: DeviceKind,
}

impl DeviceContext {
    /// Acquire a device for a collection of exactly `body_count` bodies.
    pub fn new(body_count: usize, config: &DeviceConfig) -> Result<Self, InitError> {
        let backend = match config.kind {
            DeviceKind::Gpu => Backend::Gpu(GpuBackend::new(body_count, config)?),
            DeviceKind::Host => Backend::Host(HostBackend::new(body_count)?),
        };
        info!("{} ready for {} bodies", config.kind.name(), body_count);

        Ok(Self {
            backend,
            batch: Batch::with_len(body_count),
            body_count,
            kind: config.kind,
        })
    }

    pub fn body_count(&self) -> usize {
        self.body_count
    }

    pub fn kind(&self) -> DeviceKind {
        self.kind
    }

    /// Run one step on the device. Returns after the bodies hold the results.
    pub fn step(&mut self, bodies: &mut [Body], params: &StepParams) -> Result<(), StepError> {
        if bodies.len() != self.body_count {
            return Err(StepError::BodyCountMismatch {
                expected: self.body_count,
                actual: bodies.len(),
            });
        }
        if bodies.is_empty() {
            return Ok(());
        }

        let start = Instant::now();
        let constants = params.shader_constants(self.body_count as u32);
        self.batch.load(bodies);

        let backend = self.backend.as_compute();
        backend.upload(&self.batch, &constants)?;
        backend.dispatch_forces()?;
        backend.dispatch_integrate()?;
        backend.download(&mut self.batch)?;

        self.batch.store(bodies);
        debug!("{} step took {:?}", self.kind.name(), start.elapsed());
        Ok(())
    }

    /// Release the device. Kernels, buffers, queue and context go in reverse order of acquisition.
    pub fn shutdown(self) {
        info!("{} released", self.kind.name());
    }
}
