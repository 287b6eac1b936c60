//! Translates CLI input into a `RendererConfig` and launches the render loop.

use anyhow::Result;
use oscillator::PhaseDurations;
use renderer::{Renderer, RendererConfig};
use tracing_subscriber::EnvFilter;

use crate::cli::RunArgs;

pub fn initialise_tracing() {
    let default_filter =
        "warn,duofade=info,renderer=info,oscillator=info,naga=error,wgpu=error,wgpu_core=error,wgpu_hal=error,winit=error";
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

pub fn run(args: RunArgs) -> Result<()> {
    let durations = PhaseDurations {
        fade_in_ms: args.fade_in_ms,
        fade_out_ms: args.fade_out_ms,
    };
    if durations.fade_in_ms <= 0.0 || durations.fade_out_ms <= 0.0 {
        tracing::warn!(
            fade_in_ms = durations.fade_in_ms,
            fade_out_ms = durations.fade_out_ms,
            "non-positive fade duration; the animation will hold until it is raised"
        );
    }

    let config = RendererConfig {
        surface_size: args.size.unwrap_or((1280, 720)),
        durations,
        color1: args.color1,
        color2: args.color2,
        antialiasing: args.antialias,
    };

    tracing::info!(
        fade_in_ms = config.durations.fade_in_ms,
        fade_out_ms = config.durations.fade_out_ms,
        width = config.surface_size.0,
        height = config.surface_size.1,
        "starting duofade"
    );

    let mut renderer = Renderer::new(config);
    renderer.run()
}
