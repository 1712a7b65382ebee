//! Device kernels for the n-body step.
//!
//! Both kernels run one invocation per body. An invocation reads every body's
//! position and mass but writes only the slots at its own index, so a dispatch
//! needs no synchronization inside the kernel.
#![cfg_attr(not(test), no_std)]

use bytemuck::{Pod, Zeroable};

/// Force accumulation kernel: fills the acceleration arrays.
pub const FORCES_SRC: &str = include_str!("forces.wgsl");
/// Integration kernel: advances velocity and position, wraps at the domain edge.
pub const INTEGRATE_SRC: &str = include_str!("integrate.wgsl");

pub const FORCES_ENTRY: &str = "compute_forces";
pub const INTEGRATE_ENTRY: &str = "integrate_bodies";

/// File names used when kernels are loaded from a directory at runtime.
pub const FORCES_FILE: &str = "forces.wgsl";
pub const INTEGRATE_FILE: &str = "integrate.wgsl";

/// Must match `@workgroup_size` in both kernels.
pub const WORKGROUP_SIZE: u32 = 64;

pub const EXCLUDE_BY_INDEX: u32 = 0;
pub const EXCLUDE_BY_POSITION: u32 = 1;

/// Uniform block bound at `@group(0) @binding(0)` in both kernels.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct StepConstants {
    pub g: f32,
    pub eps: f32,
    pub dt: f32,
    pub fixed_mass_threshold: f32,
    pub width: u32,
    pub height: u32,
    pub body_count: u32,
    pub exclusion: u32,
    pub use_mass_threshold: u32,
    pub _pad: [u32; 3],
}

/// Number of workgroups needed to give every body its own invocation.
pub const fn dispatch_size(body_count: u32) -> u32 {
    body_count.div_ceil(WORKGROUP_SIZE)
}
