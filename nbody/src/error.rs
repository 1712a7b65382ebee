use std::{io, path::PathBuf};

use thiserror::Error;

/// Failure to bring up a device strategy. Nothing is left allocated when this is returned.
#[derive(Debug, Error)]
pub enum InitError {
    #[error("no compatible compute adapter: {0}")]
    AdapterNotFound(String),
    #[error("failed to open compute device")]
    DeviceRequest(#[from] wgpu::RequestDeviceError),
    #[error("failed to read kernel source {}", .path.display())]
    KernelSource {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("kernel `{kernel}` failed to compile: {message}")]
    KernelCompile {
        kernel: &'static str,
        message: String,
    },
    #[error("failed to build host thread pool")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// An upload or download that did not complete. The step's results must not be used.
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("waiting on the device queue failed")]
    Poll(#[from] wgpu::PollError),
    #[error("failed to map the download buffer")]
    Map(#[from] wgpu::BufferAsyncError),
    #[error("download callback dropped before it reported")]
    ChannelClosed,
    #[error("downloaded {actual} values, expected {expected}")]
    LengthMismatch { expected: usize, actual: usize },
}

#[derive(Debug, Error)]
pub enum StepError {
    #[error(transparent)]
    Transfer(#[from] TransferError),
    #[error("expected {expected} bodies, got {actual}")]
    BodyCountMismatch { expected: usize, actual: usize },
}
