use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use pixels::Error as PixelsError;
use thiserror::Error;
use tracing::{info, warn};
use winit::dpi::LogicalSize;
use winit::error::{EventLoopError, OsError};
use winit::event::{Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::window::WindowBuilder;

use super::input::InputCollector;
use super::metrics::MetricsAccumulator;
use super::pacing::FramePacer;
use super::rendering::{LOGICAL_HEIGHT, LOGICAL_WIDTH};
use super::{Renderer, Scene, SceneCommand, Viewport};

pub const SLOW_FRAME_ENV_VAR: &str = "ESCAPE_SLOW_FRAME_MS";

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub window_title: String,
    pub window_width: u32,
    pub window_height: u32,
    pub logical_width: u32,
    pub logical_height: u32,
    pub target_tps: u32,
    pub max_frame_delta: Duration,
    pub max_ticks_per_frame: u32,
    pub metrics_log_interval: Duration,
    pub simulated_slow_frame_ms: u64,
    pub max_render_fps: Option<u32>,
    pub sprites_dir: PathBuf,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            window_title: "Escape Room".to_string(),
            window_width: 1280,
            window_height: 720,
            logical_width: LOGICAL_WIDTH,
            logical_height: LOGICAL_HEIGHT,
            target_tps: 60,
            max_frame_delta: Duration::from_millis(250),
            max_ticks_per_frame: 5,
            metrics_log_interval: Duration::from_secs(1),
            simulated_slow_frame_ms: 0,
            max_render_fps: None,
            sprites_dir: PathBuf::from("assets").join("sprites"),
        }
    }
}

impl LoopConfig {
    pub fn logical_viewport(&self) -> Viewport {
        Viewport {
            width: self.logical_width.max(1),
            height: self.logical_height.max(1),
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to create event loop: {0}")]
    CreateEventLoop(#[source] EventLoopError),
    #[error("failed to create application window: {0}")]
    CreateWindow(#[source] OsError),
    #[error("failed to initialize renderer: {0}")]
    CreateRenderer(#[source] PixelsError),
    #[error("event loop failed: {0}")]
    EventLoopRun(#[source] EventLoopError),
}

pub fn run_app(config: LoopConfig, mut scene: Box<dyn Scene>) -> Result<(), AppError> {
    let logical = config.logical_viewport();
    let event_loop = EventLoop::new().map_err(AppError::CreateEventLoop)?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(config.window_title.clone())
            .with_inner_size(LogicalSize::new(
                f64::from(config.window_width),
                f64::from(config.window_height),
            ))
            .build(&event_loop)
            .map_err(AppError::CreateWindow)?,
    );
    let mut renderer = Renderer::new(Arc::clone(&window), config.sprites_dir.clone(), logical)
        .map_err(AppError::CreateRenderer)?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut pacer = FramePacer::new(
        config.target_tps,
        config.max_frame_delta,
        config.max_ticks_per_frame,
        config.max_render_fps,
        Instant::now(),
    );
    let fixed_dt_seconds = pacer.fixed_dt().as_secs_f32();
    let metrics_interval = if config.metrics_log_interval.is_zero() {
        Duration::from_secs(1)
    } else {
        config.metrics_log_interval
    };
    let slow_frame_delay = slow_frame_delay(config.simulated_slow_frame_ms);
    let mut input = InputCollector::new(renderer.viewport(), logical);
    let mut metrics = MetricsAccumulator::new(metrics_interval);
    let mut applied_title: Option<String> = None;

    scene.load();
    info!(
        logical_width = logical.width,
        logical_height = logical.height,
        sprites_dir = %config.sprites_dir.display(),
        target_tps = config.target_tps.max(1),
        max_frame_delta_ms = pacer.max_frame_delta().as_millis() as u64,
        max_ticks_per_frame = pacer.max_ticks_per_frame(),
        slow_frame_delay_ms = slow_frame_delay.as_millis() as u64,
        render_fps_cap = pacer.render_fps_cap().unwrap_or(0),
        "loop_config"
    );

    event_loop
        .run(move |event, window_target| match event {
            Event::WindowEvent { window_id, event } if window_id == window.id() => match event {
                WindowEvent::CloseRequested => {
                    input.request_quit();
                    info!(reason = "window_close", "shutdown_requested");
                    window_target.exit();
                }
                WindowEvent::Resized(size) => {
                    input.resized(size.width, size.height);
                    if let Err(error) = renderer.resize(size.width, size.height) {
                        warn!(error = %error, "renderer_resize_failed");
                        window_target.exit();
                    }
                }
                WindowEvent::ScaleFactorChanged { .. } => {
                    let size = window.inner_size();
                    input.resized(size.width, size.height);
                    if let Err(error) = renderer.resize(size.width, size.height) {
                        warn!(error = %error, "renderer_resize_failed");
                        window_target.exit();
                    }
                }
                WindowEvent::Focused(false) => input.release_all(),
                WindowEvent::CursorMoved { position, .. } => {
                    input.cursor_moved(position.x as f32, position.y as f32);
                }
                WindowEvent::CursorLeft { .. } => input.cursor_left(),
                WindowEvent::MouseInput { state, button, .. } => input.mouse_button(button, state),
                WindowEvent::KeyboardInput { event, .. } => input.key_event(&event),
                WindowEvent::RedrawRequested => {
                    if !slow_frame_delay.is_zero() {
                        thread::sleep(slow_frame_delay);
                    }

                    let frame_start = Instant::now();
                    let budget = pacer.begin_frame(frame_start);
                    for _ in 0..budget.ticks {
                        let snapshot = input.take_snapshot();
                        metrics.record_tick();
                        if scene.update(fixed_dt_seconds, &snapshot) == SceneCommand::Quit {
                            info!(reason = "scene_quit", "shutdown_requested");
                            window_target.exit();
                            break;
                        }
                    }
                    if !budget.dropped_backlog.is_zero() {
                        metrics.record_dropped_backlog(budget.dropped_backlog);
                        warn!(
                            dropped_backlog_ms = budget.dropped_backlog.as_millis() as u64,
                            max_ticks_per_frame = pacer.max_ticks_per_frame(),
                            "sim_clamp_triggered"
                        );
                    }

                    let delay = pacer.present_delay(Instant::now());
                    if !delay.is_zero() {
                        thread::sleep(delay);
                    }
                    if let Err(error) = renderer.render_scene(scene.as_mut()) {
                        warn!(error = %error, "renderer_draw_failed");
                        window_target.exit();
                    }
                    pacer.mark_presented(Instant::now());

                    let title = scene.title();
                    if title != applied_title {
                        window.set_title(title.as_deref().unwrap_or(&config.window_title));
                        applied_title = title;
                    }

                    metrics.record_frame(budget.raw_frame_dt);
                    if let Some(snapshot) = metrics.maybe_snapshot(frame_start) {
                        info!(
                            fps = snapshot.fps,
                            tps = snapshot.tps,
                            frame_time_ms = snapshot.frame_time_ms,
                            dropped_backlog_ms = snapshot.dropped_backlog_ms,
                            "loop_metrics"
                        );
                    }
                }
                _ => {}
            },
            Event::AboutToWait => window.request_redraw(),
            Event::LoopExiting => {
                scene.unload();
                info!("shutdown");
            }
            _ => {}
        })
        .map_err(AppError::EventLoopRun)
}

/// The env var overrides the configured delay; unparsable values are ignored.
fn slow_frame_delay(configured_ms: u64) -> Duration {
    Duration::from_millis(parse_slow_frame_ms(env::var(SLOW_FRAME_ENV_VAR), configured_ms))
}

fn parse_slow_frame_ms(value: Result<String, env::VarError>, configured_ms: u64) -> u64 {
    match value {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!(env_var = SLOW_FRAME_ENV_VAR, value = raw.as_str(), "slow_frame_env_ignored");
            configured_ms
        }),
        Err(env::VarError::NotPresent) => configured_ms,
        Err(error) => {
            warn!(env_var = SLOW_FRAME_ENV_VAR, error = %error, "slow_frame_env_ignored");
            configured_ms
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_uses_full_hd_logical_canvas() {
        let viewport = LoopConfig::default().logical_viewport();
        assert_eq!((viewport.width, viewport.height), (1920, 1080));
    }

    #[test]
    fn degenerate_logical_size_is_bumped_to_one_pixel() {
        let config = LoopConfig {
            logical_width: 0,
            logical_height: 0,
            ..LoopConfig::default()
        };
        let viewport = config.logical_viewport();
        assert_eq!((viewport.width, viewport.height), (1, 1));
    }

    #[test]
    fn slow_frame_env_overrides_config() {
        assert_eq!(parse_slow_frame_ms(Ok(" 40 ".to_string()), 0), 40);
        assert_eq!(parse_slow_frame_ms(Err(env::VarError::NotPresent), 7), 7);
    }

    #[test]
    fn invalid_slow_frame_env_falls_back_to_config() {
        assert_eq!(parse_slow_frame_ms(Ok("fast".to_string()), 12), 12);
    }
}
