use std::{
    path::PathBuf,
    time::{Duration, Instant},
};

use anyhow::Context;
use clap::{Parser, ValueEnum};
use log::{info, warn};
use nbody::{
    DeviceConfig, DeviceKind, InitialVelocity, PairExclusion, Scenario, StepParams, StepStrategy,
    Strategy, constants, diagnostics::Summary,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum StrategyArg {
    Sequential,
    Device,
}

/// Headless n-body run: builds the startup scenario and steps it.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Execution strategy, fixed for the whole run.
    #[arg(long, value_enum, default_value_t = StrategyArg::Sequential)]
    strategy: StrategyArg,

    /// Device backend when running the device strategy.
    #[arg(long, value_enum, default_value_t = DeviceKind::Gpu)]
    backend: DeviceKind,

    /// Number of random bodies, the central body is added on top.
    #[arg(short, long, default_value_t = constants::BODY_COUNT)]
    bodies: usize,

    /// Number of steps to run.
    #[arg(short, long, default_value_t = 1000)]
    steps: u64,

    #[arg(long, default_value_t = constants::SEED)]
    seed: u64,

    #[arg(long, default_value_t = constants::WIDTH)]
    width: u32,

    #[arg(long, default_value_t = constants::HEIGHT)]
    height: u32,

    #[arg(long, default_value_t = constants::G)]
    g: f32,

    /// Softening length.
    #[arg(long, default_value_t = constants::SOFTENING)]
    eps: f32,

    #[arg(long, default_value_t = constants::DELTA)]
    dt: f32,

    #[arg(long, default_value_t = constants::CENTRAL_MASS)]
    central_mass: f32,

    /// Bodies at or above this mass are held fixed.
    #[arg(long, default_value_t = constants::FIXED_MASS_THRESHOLD)]
    fixed_mass_threshold: f32,

    /// Only hold bodies flagged as fixed, ignoring mass.
    #[arg(long, default_value_t = false)]
    no_mass_threshold: bool,

    /// Which pairs skip each other during force accumulation.
    #[arg(long, value_enum, default_value_t = PairExclusion::Index)]
    exclusion: PairExclusion,

    /// How random bodies start moving.
    #[arg(long, value_enum, default_value_t = InitialVelocity::Random)]
    initial_velocity: InitialVelocity,

    /// Load `forces.wgsl` and `integrate.wgsl` from this directory.
    #[arg(long)]
    kernel_dir: Option<PathBuf>,

    /// Ask wgpu for a software adapter.
    #[arg(long, default_value_t = false)]
    fallback_adapter: bool,

    /// Log a summary every this many steps, 0 disables it.
    #[arg(long, default_value_t = 100)]
    log_every: u64,
}

/// Mean wall time per step, the whole run when no steps were taken.
fn per_step(elapsed: Duration, steps: u64) -> Duration {
    elapsed.div_f64(steps.max(1) as f64)
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let scenario = Scenario {
        body_count: args.bodies,
        central_mass: args.central_mass,
        width: args.width,
        height: args.height,
        seed: args.seed,
        initial_velocity: args.initial_velocity,
        g: args.g,
    };
    let params = StepParams::new(args.g, args.eps, args.dt, args.width, args.height)
        .with_fixed_mass_threshold((!args.no_mass_threshold).then_some(args.fixed_mass_threshold))
        .with_exclusion(args.exclusion);

    let mut bodies = scenario.build();

    let mut strategy = match args.strategy {
        StrategyArg::Sequential => Strategy::sequential(),
        StrategyArg::Device => {
            let config = DeviceConfig {
                kind: args.backend,
                kernel_dir: args.kernel_dir.clone(),
                force_fallback_adapter: args.fallback_adapter,
            };
            match Strategy::device(bodies.len(), &config) {
                Ok(strategy) => strategy,
                Err(err) => {
                    let err = anyhow::Error::from(err);
                    warn!("device unavailable ({err:#}), falling back to sequential");
                    Strategy::sequential()
                }
            }
        }
    };
    info!(
        "running {} bodies for {} steps on {}",
        bodies.len(),
        args.steps,
        strategy.name()
    );

    let start = Instant::now();
    for step in 1..=args.steps {
        strategy
            .step(&mut bodies, &params)
            .with_context(|| format!("step {step} failed"))?;
        if args.log_every > 0 && step % args.log_every == 0 {
            info!("{}", Summary::new(&bodies, step, params.dt));
        }
    }
    let elapsed = start.elapsed();
    info!(
        "{} steps in {:?} ({:?} per step)",
        args.steps,
        elapsed,
        per_step(elapsed, args.steps)
    );

    strategy.shutdown();
    Ok(())
}
