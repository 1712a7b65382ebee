use log::debug;
use nbody_shaders::StepConstants;
use rayon::{
    ThreadPool, ThreadPoolBuilder,
    iter::{IndexedParallelIterator, IntoParallelRefMutIterator, ParallelIterator},
};

use crate::{
    constants::{BODIES_PER_THREAD, MAX_THREADS},
    error::{InitError, TransferError},
    sim::{
        batch::Batch,
        kernels::{advance, force_task, held_task},
    },
};

use super::ComputeBackend;

fn compute_target_threads(n_bodies: usize) -> usize {
    n_bodies.div_ceil(BODIES_PER_THREAD).clamp(1, MAX_THREADS)
}

/// Runs the kernels as rayon tasks, one per body.
///
/// The backend keeps its own copy of the batch as "device memory", so uploads
/// and downloads are copies just as they are for the GPU.
pub struct HostBackend {
    buffers: Batch,
    constants: StepConstants,
    pool: ThreadPool,
}

impl HostBackend {
    pub fn new(body_count: usize) -> Result<Self, InitError> {
        let n_threads = compute_target_threads(body_count);
        let pool = ThreadPoolBuilder::new()
            .num_threads(n_threads)
            .thread_name(|idx| format!("nbody-host-{idx}"))
            .build()?;
        debug!("host device using {n_threads} threads");

        Ok(Self {
            buffers: Batch::with_len(body_count),
            constants: StepConstants::default(),
            pool,
        })
    }
}

impl ComputeBackend for HostBackend {
    fn upload(&mut self, batch: &Batch, constants: &StepConstants) -> Result<(), TransferError> {
        self.buffers.clone_from(batch);
        self.constants = *constants;
        Ok(())
    }

    fn dispatch_forces(&mut self) -> Result<(), TransferError> {
        let constants = &self.constants;
        let Batch {
            x,
            y,
            ax,
            ay,
            mass,
            ..
        } = &mut self.buffers;
        let (x, y, mass) = (&*x, &*y, &*mass);

        // `install` blocks until every task has written its slot.
        self.pool.install(|| {
            ax.par_iter_mut()
                .zip(ay.par_iter_mut())
                .enumerate()
                .for_each(|(i, (ax, ay))| {
                    (*ax, *ay) = force_task(i, x, y, mass, constants);
                });
        });
        Ok(())
    }

    fn dispatch_integrate(&mut self) -> Result<(), TransferError> {
        let constants = &self.constants;
        let Batch {
            x,
            y,
            vx,
            vy,
            ax,
            ay,
            mass,
            pinned,
        } = &mut self.buffers;
        let (ax, ay, mass, pinned) = (&*ax, &*ay, &*mass, &*pinned);

        self.pool.install(|| {
            x.par_iter_mut()
                .zip(y.par_iter_mut())
                .zip(vx.par_iter_mut())
                .zip(vy.par_iter_mut())
                .enumerate()
                .for_each(|(i, (((x, y), vx), vy))| {
                    if held_task(i, mass, pinned, constants) {
                        return;
                    }
                    let (pos, vel) = advance(
                        [*x, *y],
                        [*vx, *vy],
                        [ax[i], ay[i]],
                        constants.dt,
                        constants.width,
                        constants.height,
                    );
                    [*x, *y] = pos;
                    [*vx, *vy] = vel;
                });
        });
        Ok(())
    }

    fn download(&mut self, batch: &mut Batch) -> Result<(), TransferError> {
        batch.x.copy_from_slice(&self.buffers.x);
        batch.y.copy_from_slice(&self.buffers.y);
        batch.vx.copy_from_slice(&self.buffers.vx);
        batch.vy.copy_from_slice(&self.buffers.vy);
        batch.ax.copy_from_slice(&self.buffers.ax);
        batch.ay.copy_from_slice(&self.buffers.ay);
        Ok(())
    }
}
