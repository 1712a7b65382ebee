// PHYSICAL
/// Gravitational constant in simulation units.
pub const G: f32 = 1.0;
/// Seconds per step.
pub const DELTA: f32 = 0.1;
/// Softening length, added in quadrature to every pair distance.
pub const SOFTENING: f32 = 0.1;

// SCENARIO
/// Number of randomized bodies at startup, the central body comes on top.
pub const BODY_COUNT: usize = 50;
/// Mass assigned to the central body.
pub const CENTRAL_MASS: f32 = 1000.0;
/// Bodies at or above this mass are held fixed, in addition to bodies flagged as fixed.
pub const FIXED_MASS_THRESHOLD: f32 = 1000.0;
/// Domain width, centered on the origin.
pub const WIDTH: u32 = 1920;
/// Domain height, centered on the origin.
pub const HEIGHT: u32 = 1080;
/// Seed for the startup configuration.
pub const SEED: u64 = 42;

// RANDOM BODIES
/// Closest a random body is placed to the origin.
pub const MIN_SPAWN_RADIUS: f32 = 50.0;
/// Gap kept between the spawn ring and the domain edge.
pub const SPAWN_EDGE_MARGIN: f32 = 20.0;
pub const MIN_RANDOM_MASS: f32 = 0.5;
pub const MAX_RANDOM_MASS: f32 = 10.0;
/// Bound on each random velocity component.
pub const MAX_RANDOM_SPEED: f32 = 1.0;

// HOST DEVICE
/// Hard cap on number of threads to use.
pub const MAX_THREADS: usize = 20;
/// Minimum number of bodies per thread.
pub const BODIES_PER_THREAD: usize = 256;
