use cgmath::{Point2, Vector2, Zero};
use nbody::{
    Body, DeviceConfig, DeviceContext, InitError, PairExclusion, Scenario, StepParams,
    StepStrategy, make_central_body, sim::sequential,
};

fn two_bodies() -> Vec<Body> {
    vec![
        Body::new(Point2::new(-40.0, 10.0), Vector2::new(0.0, 0.5), 3.0),
        Body::new(Point2::new(60.0, -20.0), Vector2::new(-0.25, 0.0), 7.0),
    ]
}

fn run_sequential(mut bodies: Vec<Body>, params: &StepParams, steps: usize) -> Vec<Body> {
    for _ in 0..steps {
        sequential::step(&mut bodies, params);
    }
    bodies
}

fn run_device(
    ctx: &mut DeviceContext,
    mut bodies: Vec<Body>,
    params: &StepParams,
    steps: usize,
) -> Vec<Body> {
    for _ in 0..steps {
        ctx.step(&mut bodies, params).unwrap();
    }
    bodies
}

fn close(a: f32, b: f32, rel: f32) -> bool {
    (a - b).abs() <= rel * a.abs().max(b.abs()).max(1.0)
}

fn assert_close(expected: &[Body], actual: &[Body], rel: f32) {
    assert_eq!(expected.len(), actual.len());
    for (i, (e, a)) in expected.iter().zip(actual).enumerate() {
        for (what, x, y) in [
            ("x", e.pos.x, a.pos.x),
            ("y", e.pos.y, a.pos.y),
            ("vx", e.vel.x, a.vel.x),
            ("vy", e.vel.y, a.vel.y),
        ] {
            assert!(close(x, y, rel), "body {i} {what}: {x} vs {y}");
        }
        assert_eq!(e.mass, a.mass);
    }
}

/// `None` when this machine has no usable adapter.
fn gpu_context(body_count: usize) -> Option<DeviceContext> {
    match DeviceContext::new(body_count, &DeviceConfig::gpu()) {
        Ok(ctx) => Some(ctx),
        Err(err @ (InitError::AdapterNotFound(_) | InitError::DeviceRequest(_))) => {
            eprintln!("skipping gpu comparison: {err}");
            None
        }
        Err(err) => panic!("gpu device failed to initialise: {err}"),
    }
}

// ==================================================================================
// Host device
// ==================================================================================

#[test]
fn host_matches_sequential_for_two_bodies() {
    let params = StepParams::default();
    let expected = run_sequential(two_bodies(), &params, 1);

    let mut ctx = DeviceContext::new(2, &DeviceConfig::host()).unwrap();
    let actual = run_device(&mut ctx, two_bodies(), &params, 1);

    assert_eq!(expected, actual);
}

#[test]
fn host_matches_sequential_for_startup_configuration() {
    let scenario = Scenario::default();
    let params = StepParams::default();
    let bodies = scenario.build();
    assert_eq!(bodies.len(), 51);

    let expected = run_sequential(bodies.clone(), &params, 1);
    let mut ctx = DeviceContext::new(bodies.len(), &DeviceConfig::host()).unwrap();
    let actual = run_device(&mut ctx, bodies, &params, 1);

    assert_eq!(expected, actual);
}

#[test]
fn host_tracks_sequential_over_many_steps() {
    let scenario = Scenario {
        body_count: 300,
        seed: 9,
        ..Scenario::default()
    };
    let variants = [
        StepParams::default(),
        StepParams::default().with_exclusion(PairExclusion::Position),
        StepParams::default().with_fixed_mass_threshold(None),
    ];

    for params in variants {
        let bodies = scenario.build();
        let expected = run_sequential(bodies.clone(), &params, 25);
        let mut ctx = DeviceContext::new(bodies.len(), &DeviceConfig::host()).unwrap();
        let actual = run_device(&mut ctx, bodies, &params, 25);
        assert_close(&expected, &actual, 1e-4);
    }
}

#[test]
fn host_reports_accelerations() {
    let params = StepParams::default();
    let mut bodies = vec![
        Body::new(Point2::new(100.0, 0.0), Vector2::zero(), 1.0),
        make_central_body(1000.0, params.width, params.height),
    ];
    let mut ctx = DeviceContext::new(2, &DeviceConfig::host()).unwrap();
    ctx.step(&mut bodies, &params).unwrap();

    assert!(bodies[0].acc.x < 0.0);
    assert!(bodies[1].acc.x > 0.0);
    assert_eq!(bodies[1].pos, Point2::new(0.0, 0.0));
}

#[test]
fn context_is_reusable_across_steps() {
    let params = StepParams::default();
    let mut ctx = DeviceContext::new(2, &DeviceConfig::host()).unwrap();
    let mut bodies = two_bodies();
    ctx.step(&mut bodies, &params).unwrap();
    let first = bodies.clone();
    ctx.step(&mut bodies, &params).unwrap();
    assert_ne!(first, bodies);
    assert_eq!(ctx.body_count(), 2);
    assert_eq!(StepStrategy::name(&ctx), "device/host");
}

// ==================================================================================
// GPU device
// ==================================================================================

#[test]
fn gpu_matches_sequential_for_two_bodies() {
    let Some(mut ctx) = gpu_context(2) else {
        return;
    };
    let params = StepParams::default();
    let expected = run_sequential(two_bodies(), &params, 1);
    let actual = run_device(&mut ctx, two_bodies(), &params, 1);
    assert_close(&expected, &actual, 1e-4);
    ctx.shutdown();
}

#[test]
fn gpu_matches_sequential_for_startup_configuration() {
    let scenario = Scenario::default();
    let bodies = scenario.build();
    let Some(mut ctx) = gpu_context(bodies.len()) else {
        return;
    };
    let params = StepParams::default();
    let expected = run_sequential(bodies.clone(), &params, 1);
    let actual = run_device(&mut ctx, bodies, &params, 1);
    assert_close(&expected, &actual, 1e-4);
}

#[test]
fn gpu_handles_empty_collection() {
    let Some(mut ctx) = gpu_context(0) else {
        return;
    };
    let mut bodies: Vec<Body> = Vec::new();
    ctx.step(&mut bodies, &StepParams::default()).unwrap();
    assert!(bodies.is_empty());
}
