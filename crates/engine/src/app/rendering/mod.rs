mod canvas;
mod renderer;
mod transform;

pub use canvas::{Canvas, Rgba};
pub use renderer::Renderer;
pub use transform::{
    logical_to_physical_rect, physical_to_logical, room_to_screen_px, Viewport, LOGICAL_HEIGHT,
    LOGICAL_WIDTH,
};
