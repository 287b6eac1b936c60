//! Renderer crate for duofade.
//!
//! Glues the winit window, the `wgpu` pipeline, and the oscillation state
//! machine together. The overall flow is:
//!
//! ```text
//!   CLI / duofade
//!          │ RendererConfig
//!          ▼
//!   Renderer::run ──▶ WindowState ──▶ winit event loop ──▶ render_frame()
//!          ▲                                      │
//!          │                                      └─▶ FrameDriver::tick ─▶ GPU UBO
//! ```
//!
//! Each redraw performs exactly one state-machine step and one draw call; the
//! loop re-requests a redraw unconditionally from `AboutToWait`, so a failed
//! frame never stops the next one. Arrow keys mutate the fade durations in the
//! configuration store between ticks.

mod compile;
mod driver;
mod gpu;

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, Event, KeyEvent, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::window::{Window, WindowBuilder};

use oscillator::{display_seconds, FadeConfig, Phase, PhaseDurations, Rgb};

pub use driver::{BoxedTimeSource, FrameDriver, SystemTimeSource, TimeSource};
use gpu::GpuState;

/// Anti-aliasing policy for the render pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Antialiasing {
    /// Pick the highest sample count supported by the surface format (up to 4x).
    Auto,
    /// Disable MSAA and render directly into the swapchain.
    Off,
    /// Request a specific MSAA sample count (clamped to what the device supports).
    Samples(u32),
}

impl Default for Antialiasing {
    fn default() -> Self {
        Self::Auto
    }
}

/// Immutable configuration passed to the renderer at start-up.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Window size in physical pixels.
    pub surface_size: (u32, u32),
    /// Initial fade-in/fade-out durations in milliseconds.
    pub durations: PhaseDurations,
    /// Color shown below the sweeping threshold.
    pub color1: Rgb,
    /// Color shown above the sweeping threshold.
    pub color2: Rgb,
    /// Anti-aliasing mode requested by the caller.
    pub antialiasing: Antialiasing,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            surface_size: (1280, 720),
            durations: PhaseDurations {
                fade_in_ms: 3000.0,
                fade_out_ms: 5000.0,
            },
            color1: [1.0, 1.0, 1.0],
            color2: [0.0, 0.0, 0.0],
            antialiasing: Antialiasing::default(),
        }
    }
}

/// High-level entry point that owns the chosen configuration.
pub struct Renderer {
    config: RendererConfig,
}

impl Renderer {
    pub fn new(config: RendererConfig) -> Self {
        Self { config }
    }

    /// Opens the window and drives the `winit` event loop for the lifetime of
    /// the view.
    ///
    /// Returns an error only for setup failures (no event loop, no window, no
    /// GPU context); once the loop runs, per-frame failures are logged and the
    /// next tick proceeds regardless.
    pub fn run(&mut self) -> Result<()> {
        let event_loop = EventLoop::new().context("failed to initialize event loop")?;
        let window_size = PhysicalSize::new(self.config.surface_size.0, self.config.surface_size.1);
        let window = WindowBuilder::new()
            .with_title("duofade")
            .with_inner_size(window_size)
            .build(&event_loop)
            .context("failed to create window")?;
        let window = Arc::new(window);

        let mut state = WindowState::new(window.clone(), &self.config)?;
        state.window().request_redraw();

        event_loop
            .run(move |event, elwt| {
                elwt.set_control_flow(ControlFlow::Wait);

                match event {
                    Event::WindowEvent { window_id, event } if window_id == state.window().id() => {
                        match event {
                            WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                                elwt.exit();
                            }
                            WindowEvent::KeyboardInput { event, .. } => {
                                state.handle_key(&event);
                            }
                            WindowEvent::Resized(new_size) => {
                                state.resize(new_size);
                            }
                            WindowEvent::ScaleFactorChanged {
                                mut inner_size_writer,
                                ..
                            } => {
                                // Keep the current physical size when the scale factor changes.
                                let _ = inner_size_writer.request_inner_size(state.size());
                            }
                            WindowEvent::RedrawRequested => match state.render_frame() {
                                Ok(()) => {}
                                Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                                    state.resize(state.size());
                                }
                                Err(wgpu::SurfaceError::OutOfMemory) => {
                                    tracing::error!("surface out of memory; exiting");
                                    elwt.exit();
                                }
                                Err(wgpu::SurfaceError::Timeout) => {
                                    tracing::warn!("surface timeout; retrying next frame");
                                }
                                Err(other) => {
                                    tracing::warn!("surface error: {other:?}; retrying next frame");
                                }
                            },
                            _ => {}
                        }
                    }
                    Event::AboutToWait => {
                        // Re-arm unconditionally so the loop is self-sustaining.
                        state.window().request_redraw();
                    }
                    _ => {}
                }
            })
            .map_err(|err| anyhow!("event loop error: {err}"))
    }
}

/// Aggregates the window, GPU state, frame driver, and configuration store.
struct WindowState {
    window: Arc<Window>,
    gpu: GpuState,
    driver: FrameDriver,
    fade: FadeConfig,
}

impl WindowState {
    fn new(window: Arc<Window>, config: &RendererConfig) -> Result<Self> {
        let size = window.inner_size();
        let gpu = GpuState::new(window.as_ref(), size, config.antialiasing)?;
        let fade = FadeConfig::new(config.durations, config.color1, config.color2);
        let driver = FrameDriver::new(Box::new(SystemTimeSource::new()));

        let state = Self {
            window,
            gpu,
            driver,
            fade,
        };
        state.refresh_title();
        Ok(state)
    }

    fn window(&self) -> &Window {
        self.window.as_ref()
    }

    fn size(&self) -> PhysicalSize<u32> {
        self.gpu.size()
    }

    fn resize(&mut self, new_size: PhysicalSize<u32>) {
        self.gpu.resize(new_size);
    }

    /// One tick: advance the oscillation, push uniforms, draw.
    ///
    /// The color pair is pushed only when the store reports a change; the
    /// scalar progress is pushed every frame.
    fn render_frame(&mut self) -> Result<(), wgpu::SurfaceError> {
        let progress = self.driver.tick(&self.fade);
        if let Some((color1, color2)) = self.fade.take_color_change() {
            self.gpu.set_colors(color1, color2);
        }
        self.gpu.render(progress as f32)
    }

    /// Arrow keys adjust the durations: Up/Down for fade-in, Right/Left for
    /// fade-out. Decrements are gated at the floor, like a disabled button.
    fn handle_key(&mut self, event: &KeyEvent) {
        if event.state != ElementState::Pressed {
            return;
        }

        let (phase, decrement) = match event.logical_key {
            Key::Named(NamedKey::ArrowUp) => (Phase::In, false),
            Key::Named(NamedKey::ArrowDown) => (Phase::In, true),
            Key::Named(NamedKey::ArrowRight) => (Phase::Out, false),
            Key::Named(NamedKey::ArrowLeft) => (Phase::Out, true),
            _ => return,
        };

        if decrement {
            if !self.fade.can_decrement(phase) {
                tracing::debug!(?phase, "fade duration already at the floor");
                return;
            }
            self.fade.decrement_duration(phase);
        } else {
            self.fade.increment_duration(phase);
        }

        tracing::info!(
            ?phase,
            seconds = %display_seconds(self.fade.duration_ms(phase)),
            "fade duration adjusted"
        );
        self.refresh_title();
    }

    fn refresh_title(&self) {
        let durations = self.fade.durations();
        self.window.set_title(&format!(
            "duofade (in {}s, out {}s)",
            display_seconds(durations.fade_in_ms),
            display_seconds(durations.fade_out_ms)
        ));
    }
}
