mod input;
mod loop_runner;
mod metrics;
mod pacing;
mod rendering;
mod scene;

pub use input::InputAction;
pub use loop_runner::{run_app, AppError, LoopConfig, SLOW_FRAME_ENV_VAR};
pub use metrics::LoopMetricsSnapshot;
pub use rendering::{
    logical_to_physical_rect, physical_to_logical, room_to_screen_px, Canvas, Renderer, Rgba,
    Viewport, LOGICAL_HEIGHT, LOGICAL_WIDTH,
};
pub use scene::{InputSnapshot, Rect, Scene, SceneCommand, Vec2};
