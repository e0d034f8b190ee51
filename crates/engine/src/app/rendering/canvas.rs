use crate::app::Rect;

pub type Rgba = [u8; 4];

/// Drawing surface handed to scenes. All rects are in logical canvas pixels.
pub trait Canvas {
    fn logical_size(&self) -> (u32, u32);
    fn clear(&mut self, color: Rgba);
    /// Alpha-blends `color` over the rect.
    fn fill_rect(&mut self, rect: Rect, color: Rgba);
    fn outline_rect(&mut self, rect: Rect, thickness: i32, color: Rgba);
    /// Stretches the sprite to `rect`. Missing sprites draw a placeholder instead.
    fn blit_sprite(&mut self, key: &str, rect: Rect, mirrored: bool);
}
