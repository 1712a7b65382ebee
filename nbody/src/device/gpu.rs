use std::{borrow::Cow, fs, path::Path};

use futures::channel::oneshot;
use log::{debug, info};
use nbody_shaders::{
    FORCES_ENTRY, FORCES_FILE, FORCES_SRC, INTEGRATE_ENTRY, INTEGRATE_FILE, INTEGRATE_SRC,
    StepConstants, dispatch_size,
};
use pollster::FutureExt;
use wgpu::{
    BindGroup, BindGroupDescriptor, BindGroupEntry, Buffer, BufferDescriptor, BufferUsages,
    CommandEncoderDescriptor, ComputePassDescriptor, ComputePipeline, ComputePipelineDescriptor,
    Device, Queue, ShaderModuleDescriptor, ShaderSource,
};

use crate::{
    error::{InitError, TransferError},
    sim::batch::Batch,
};

use super::{ComputeBackend, DeviceConfig};

const F32_SIZE: u64 = std::mem::size_of::<f32>() as u64;
/// Arrays copied back per step: x, y, vx, vy, ax, ay.
const DOWNLOADED_ARRAYS: u64 = 6;

/// Read the kernels from `dir`, or fall back to the copies compiled into `nbody-shaders`.
pub(crate) fn load_kernel_sources(
    dir: Option<&Path>,
) -> Result<(Cow<'static, str>, Cow<'static, str>), InitError> {
    let Some(dir) = dir else {
        return Ok((Cow::Borrowed(FORCES_SRC), Cow::Borrowed(INTEGRATE_SRC)));
    };

    let read = |file: &str| {
        let path = dir.join(file);
        fs::read_to_string(&path)
            .map(Cow::Owned)
            .map_err(|source| InitError::KernelSource { path, source })
    };
    Ok((read(FORCES_FILE)?, read(INTEGRATE_FILE)?))
}

/// One storage buffer per body attribute.
struct DeviceBuffers {
    pos_x: Buffer,
    pos_y: Buffer,
    vel_x: Buffer,
    vel_y: Buffer,
    acc_x: Buffer,
    acc_y: Buffer,
    mass: Buffer,
    pinned: Buffer,
}

impl DeviceBuffers {
    fn new(device: &Device, bytes: u64) -> Self {
        let read_write = BufferUsages::STORAGE | BufferUsages::COPY_DST | BufferUsages::COPY_SRC;
        let read_only = BufferUsages::STORAGE | BufferUsages::COPY_DST;
        let create = |label: &str, usage: BufferUsages| {
            device.create_buffer(&BufferDescriptor {
                label: Some(label),
                size: bytes,
                usage,
                mapped_at_creation: false,
            })
        };

        Self {
            pos_x: create("pos_x", read_write),
            pos_y: create("pos_y", read_write),
            vel_x: create("vel_x", read_write),
            vel_y: create("vel_y", read_write),
            acc_x: create("acc_x", read_write),
            acc_y: create("acc_y", read_write),
            mass: create("mass", read_only),
            pinned: create("pinned", read_only),
        }
    }

    /// Download order, matching the staging buffer layout.
    fn downloaded(&self) -> [&Buffer; DOWNLOADED_ARRAYS as usize] {
        [
            &self.pos_x,
            &self.pos_y,
            &self.vel_x,
            &self.vel_y,
            &self.acc_x,
            &self.acc_y,
        ]
    }
}

/// Result of a `map_async` request once the queue has been drained.
///
/// The callback is only awaited when the wait succeeded.
fn mapping_outcome(
    waited: Result<(), TransferError>,
    received: impl FnOnce() -> Result<Result<(), wgpu::BufferAsyncError>, oneshot::Canceled>,
) -> Result<(), TransferError> {
    waited?;
    received()
        .map_err(|_| TransferError::ChannelClosed)?
        .map_err(TransferError::from)
}

fn entry(binding: u32, buffer: &Buffer) -> BindGroupEntry<'_> {
    BindGroupEntry {
        binding,
        resource: buffer.as_entire_binding(),
    }
}

fn compile_kernel(
    device: &Device,
    kernel: &'static str,
    source: Cow<'static, str>,
) -> Result<ComputePipeline, InitError> {
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let module = device.create_shader_module(ShaderModuleDescriptor {
        label: Some(kernel),
        source: ShaderSource::Wgsl(source),
    });
    let pipeline = device.create_compute_pipeline(&ComputePipelineDescriptor {
        label: Some(kernel),
        layout: None,
        module: &module,
        entry_point: Some(kernel),
        compilation_options: Default::default(),
        cache: None,
    });
    if let Some(err) = device.pop_error_scope().block_on() {
        return Err(InitError::KernelCompile {
            kernel,
            message: err.to_string(),
        });
    }
    Ok(pipeline)
}

/// wgpu compute backend.
///
/// Fields drop in declaration order, which releases bind groups and buffers
/// before the pipelines and the pipelines before the queue and device.
pub struct GpuBackend {
    forces_bind_group: BindGroup,
    integrate_bind_group: BindGroup,
    staging: Buffer,
    buffers: DeviceBuffers,
    uniform: Buffer,
    integrate_pipeline: ComputePipeline,
    forces_pipeline: ComputePipeline,
    queue: Queue,
    device: Device,
    body_count: usize,
}

impl GpuBackend {
    pub fn new(body_count: usize, config: &DeviceConfig) -> Result<Self, InitError> {
        let (forces_src, integrate_src) = load_kernel_sources(config.kernel_dir.as_deref())?;

        let backends = wgpu::Backends::from_env().unwrap_or(wgpu::Backends::all());
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends,
            ..Default::default()
        });
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                force_fallback_adapter: config.force_fallback_adapter,
                compatible_surface: None,
            })
            .block_on()
            .map_err(|err| InitError::AdapterNotFound(err.to_string()))?;
        let adapter_info = adapter.get_info();
        info!("using adapter {} ({:?})", adapter_info.name, adapter_info.backend);

        // The integration kernel binds eight storage buffers.
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("nbody device"),
                required_limits: wgpu::Limits {
                    max_storage_buffers_per_shader_stage: 8,
                    ..wgpu::Limits::downlevel_defaults()
                },
                ..Default::default()
            })
            .block_on()?;

        let forces_pipeline = compile_kernel(&device, FORCES_ENTRY, forces_src)?;
        let integrate_pipeline = compile_kernel(&device, INTEGRATE_ENTRY, integrate_src)?;

        // Zero-sized storage bindings are invalid, keep at least one slot.
        let bytes = body_count.max(1) as u64 * F32_SIZE;
        let uniform = device.create_buffer(&BufferDescriptor {
            label: Some("step constants"),
            size: std::mem::size_of::<StepConstants>() as u64,
            usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let buffers = DeviceBuffers::new(&device, bytes);
        let staging = device.create_buffer(&BufferDescriptor {
            label: Some("download staging"),
            size: DOWNLOADED_ARRAYS * bytes,
            usage: BufferUsages::MAP_READ | BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let forces_bind_group = device.create_bind_group(&BindGroupDescriptor {
            label: Some("forces bind group"),
            layout: &forces_pipeline.get_bind_group_layout(0),
            entries: &[
                entry(0, &uniform),
                entry(1, &buffers.pos_x),
                entry(2, &buffers.pos_y),
                entry(3, &buffers.acc_x),
                entry(4, &buffers.acc_y),
                entry(5, &buffers.mass),
            ],
        });
        let integrate_bind_group = device.create_bind_group(&BindGroupDescriptor {
            label: Some("integrate bind group"),
            layout: &integrate_pipeline.get_bind_group_layout(0),
            entries: &[
                entry(0, &uniform),
                entry(1, &buffers.pos_x),
                entry(2, &buffers.pos_y),
                entry(3, &buffers.vel_x),
                entry(4, &buffers.vel_y),
                entry(5, &buffers.acc_x),
                entry(6, &buffers.acc_y),
                entry(7, &buffers.mass),
                entry(8, &buffers.pinned),
            ],
        });

        Ok(Self {
            forces_bind_group,
            integrate_bind_group,
            staging,
            buffers,
            uniform,
            integrate_pipeline,
            forces_pipeline,
            queue,
            device,
            body_count,
        })
    }

    fn array_bytes(&self) -> u64 {
        self.body_count as u64 * F32_SIZE
    }

    /// Block until everything submitted so far has finished.
    fn wait(&self) -> Result<(), TransferError> {
        self.device
            .poll(wgpu::PollType::Wait)
            .map(|_| ())
            .map_err(TransferError::from)
    }

    fn dispatch(
        &self,
        label: &str,
        pipeline: &ComputePipeline,
        bind_group: &BindGroup,
    ) -> Result<(), TransferError> {
        let mut encoder = self
            .device
            .create_command_encoder(&CommandEncoderDescriptor { label: Some(label) });
        {
            let mut pass = encoder.begin_compute_pass(&ComputePassDescriptor {
                label: Some(label),
                timestamp_writes: None,
            });
            pass.set_pipeline(pipeline);
            pass.set_bind_group(0, bind_group, &[]);
            pass.dispatch_workgroups(dispatch_size(self.body_count as u32), 1, 1);
        }
        self.queue.submit(Some(encoder.finish()));
        self.wait()
    }
}

impl ComputeBackend for GpuBackend {
    fn upload(&mut self, batch: &Batch, constants: &StepConstants) -> Result<(), TransferError> {
        let queue = &self.queue;
        let buffers = &self.buffers;
        queue.write_buffer(&self.uniform, 0, bytemuck::bytes_of(constants));
        queue.write_buffer(&buffers.pos_x, 0, bytemuck::cast_slice(&batch.x));
        queue.write_buffer(&buffers.pos_y, 0, bytemuck::cast_slice(&batch.y));
        queue.write_buffer(&buffers.vel_x, 0, bytemuck::cast_slice(&batch.vx));
        queue.write_buffer(&buffers.vel_y, 0, bytemuck::cast_slice(&batch.vy));
        queue.write_buffer(&buffers.acc_x, 0, bytemuck::cast_slice(&batch.ax));
        queue.write_buffer(&buffers.acc_y, 0, bytemuck::cast_slice(&batch.ay));
        queue.write_buffer(&buffers.mass, 0, bytemuck::cast_slice(&batch.mass));
        queue.write_buffer(&buffers.pinned, 0, bytemuck::cast_slice(&batch.pinned));

        // Staged writes are flushed by the next submission.
        queue.submit(std::iter::empty());
        self.wait()
    }

    fn dispatch_forces(&mut self) -> Result<(), TransferError> {
        self.dispatch(FORCES_ENTRY, &self.forces_pipeline, &self.forces_bind_group)
    }

    fn dispatch_integrate(&mut self) -> Result<(), TransferError> {
        self.dispatch(
            INTEGRATE_ENTRY,
            &self.integrate_pipeline,
            &self.integrate_bind_group,
        )
    }

    fn download(&mut self, batch: &mut Batch) -> Result<(), TransferError> {
        let bytes = self.array_bytes();
        let mut encoder = self
            .device
            .create_command_encoder(&CommandEncoderDescriptor {
                label: Some("download"),
            });
        for (idx, buffer) in self.buffers.downloaded().into_iter().enumerate() {
            encoder.copy_buffer_to_buffer(buffer, 0, &self.staging, idx as u64 * bytes, bytes);
        }
        self.queue.submit(Some(encoder.finish()));

        let slice = self.staging.slice(..DOWNLOADED_ARRAYS * bytes);
        let (tx, rx) = oneshot::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        let mapped = mapping_outcome(self.wait(), || rx.block_on());
        if let Err(err) = mapped {
            // Cancels a map that is still pending so the next download can map again.
            self.staging.unmap();
            return Err(err);
        }

        let expected = DOWNLOADED_ARRAYS as usize * self.body_count;
        let copied = {
            let view = slice.get_mapped_range();
            let values: &[f32] = bytemuck::cast_slice(&view);
            if values.len() == expected && batch.len() == self.body_count {
                let targets = [
                    &mut batch.x,
                    &mut batch.y,
                    &mut batch.vx,
                    &mut batch.vy,
                    &mut batch.ax,
                    &mut batch.ay,
                ];
                for (target, chunk) in targets.into_iter().zip(values.chunks_exact(self.body_count)) {
                    target.copy_from_slice(chunk);
                }
                Ok(())
            } else {
                Err(TransferError::LengthMismatch {
                    expected,
                    actual: values.len(),
                })
            }
        };
        self.staging.unmap();
        copied?;
        debug!("downloaded {} bytes", DOWNLOADED_ARRAYS * bytes);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn mapping_outcome_reports_each_failure() {
        assert!(mapping_outcome(Ok(()), || Ok(Ok(()))).is_ok());
        assert!(matches!(
            mapping_outcome(Ok(()), || Err(oneshot::Canceled)),
            Err(TransferError::ChannelClosed)
        ));
        assert!(matches!(
            mapping_outcome(Ok(()), || Ok(Err(wgpu::BufferAsyncError))),
            Err(TransferError::Map(_))
        ));
    }

    #[test]
    fn failed_wait_skips_the_callback() {
        let mut called = false;
        let outcome = mapping_outcome(Err(TransferError::ChannelClosed), || {
            called = true;
            Ok(Ok(()))
        });
        assert!(matches!(outcome, Err(TransferError::ChannelClosed)));
        assert!(!called);
    }

    #[test]
    fn embedded_kernels_by_default() {
        let (forces, integrate) = load_kernel_sources(None).unwrap();
        assert_eq!(forces, FORCES_SRC);
        assert_eq!(integrate, INTEGRATE_SRC);
    }

    #[test]
    fn missing_kernel_file_names_the_path() {
        let dir = PathBuf::from("/nonexistent/kernels");
        let err = load_kernel_sources(Some(&dir)).unwrap_err();
        match err {
            InitError::KernelSource { path, .. } => assert_eq!(path, dir.join(FORCES_FILE)),
            other => panic!("unexpected error {other:?}"),
        }
    }
}
