use std::process::ExitCode;
use std::time::Instant;

use tessera::{
    DemoConfig, GpuContext, Harness, LoggingConfig, Routine, RoutineError, RoutineRenderer,
    Transforms, init_logging,
};

const USAGE: &str = "usage: tessera [routine] [period]
  1 = Original red triangle.
  2 = Rotating vertex-coloured cube.
  3 = Rotating textured cube.
  4 = Rotating vertex-coloured sphere.
  period = run time in seconds (default 5.0)";

const WIDTH: u32 = 640;
const HEIGHT: u32 = 480;

fn parse_args() -> Result<DemoConfig, RoutineError> {
    let mut args = std::env::args().skip(1);
    let mut config = DemoConfig::new();
    if let Some(routine) = args.next() {
        config = config.routine(routine.parse::<Routine>()?);
    }
    if let Some(period) = args.next() {
        match period.parse::<f32>() {
            Ok(seconds) => config = config.period(seconds),
            Err(_) => log::warn!("ignoring period {period:?}"),
        }
    }
    Ok(config)
}

struct Demo {
    gpu: GpuContext,
    renderer: RoutineRenderer,
    config: DemoConfig,
    transforms: Transforms,
}

fn run() -> Result<(), RoutineError> {
    let config = parse_args()?;
    log::info!("routine {}, period {:.3}s", config.routine, config.period);

    let gpu = GpuContext::new_headless()?;
    let renderer = RoutineRenderer::new(&gpu, &config, WIDTH, HEIGHT)?;
    let period = config.period;

    let mut harness = Harness::new(
        WIDTH,
        HEIGHT,
        Demo {
            gpu,
            renderer,
            config,
            transforms: Transforms::default(),
        },
    );

    harness.register_update(|ctx, _dt| {
        let aspect = ctx.aspect();
        let frame = ctx.frame() as f32;
        let demo = &mut ctx.user_data;
        if !demo.renderer.routine().animated() {
            return;
        }
        let angle = frame * demo.config.degrees_per_frame;
        let y = frame * demo.config.rise_per_frame;
        if let Err(err) = demo.transforms.update(&demo.config, angle, y, aspect) {
            log::error!("{err}");
            ctx.request_exit();
        }
    });

    harness.register_draw(|ctx| {
        let demo = &ctx.user_data;
        if let Err(err) = demo.renderer.render(&demo.gpu, &demo.transforms) {
            log::error!("{err}");
            ctx.request_exit();
        }
    });

    let mut last = Instant::now();
    harness.run(period, move || {
        let now = Instant::now();
        let dt = now.duration_since(last).as_secs_f32();
        last = now;
        dt
    });

    Ok(())
}

fn main() -> ExitCode {
    init_logging(LoggingConfig::default());

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err @ RoutineError::Unknown(_)) => {
            eprintln!("{err}\n{USAGE}");
            ExitCode::FAILURE
        }
        Err(err) => {
            log::error!("{err}");
            ExitCode::FAILURE
        }
    }
}
