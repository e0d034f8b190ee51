use crate::app::{Rect, Vec2};

pub const LOGICAL_WIDTH: u32 = 1920;
pub const LOGICAL_HEIGHT: u32 = 1080;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// Room coordinates have their origin at the canvas center with Y pointing up.
pub fn room_to_screen_px(room_x: i32, room_y: i32, canvas: Viewport) -> (i32, i32) {
    let half_width = (canvas.width / 2) as i32;
    let half_height = (canvas.height / 2) as i32;
    (room_x + half_width, half_height - room_y)
}

pub fn logical_to_physical_rect(rect: Rect, logical: Viewport, physical: Viewport) -> Rect {
    let scale_x = axis_scale(logical.width, physical.width);
    let scale_y = axis_scale(logical.height, physical.height);
    let left = (rect.x as f32 * scale_x).round() as i32;
    let top = (rect.y as f32 * scale_y).round() as i32;
    let right = (rect.right() as f32 * scale_x).round() as i32;
    let bottom = (rect.bottom() as f32 * scale_y).round() as i32;
    Rect::new(left, top, right - left, bottom - top)
}

pub fn physical_to_logical(point: Vec2, logical: Viewport, physical: Viewport) -> Vec2 {
    Vec2 {
        x: point.x * axis_scale(physical.width, logical.width),
        y: point.y * axis_scale(physical.height, logical.height),
    }
}

fn axis_scale(from: u32, to: u32) -> f32 {
    if from == 0 || to == 0 {
        1.0
    } else {
        to as f32 / from as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOGICAL: Viewport = Viewport {
        width: LOGICAL_WIDTH,
        height: LOGICAL_HEIGHT,
    };

    #[test]
    fn room_origin_maps_to_canvas_center() {
        assert_eq!(room_to_screen_px(0, 0, LOGICAL), (960, 540));
    }

    #[test]
    fn room_y_axis_points_up() {
        assert_eq!(room_to_screen_px(100, 200, LOGICAL), (1060, 340));
        assert_eq!(room_to_screen_px(-960, -540, LOGICAL), (0, 1080));
    }

    #[test]
    fn half_size_window_halves_rects() {
        let physical = Viewport {
            width: 960,
            height: 540,
        };
        let rect = logical_to_physical_rect(Rect::new(100, 50, 200, 100), LOGICAL, physical);
        assert_eq!(rect, Rect::new(50, 25, 100, 50));
    }

    #[test]
    fn physical_cursor_maps_back_to_logical() {
        let physical = Viewport {
            width: 1280,
            height: 720,
        };
        let point = physical_to_logical(Vec2 { x: 640.0, y: 360.0 }, LOGICAL, physical);
        assert!((point.x - 960.0).abs() < 0.001);
        assert!((point.y - 540.0).abs() < 0.001);
    }

    #[test]
    fn zero_sized_viewport_keeps_identity_scale() {
        let physical = Viewport {
            width: 0,
            height: 0,
        };
        let rect = Rect::new(1, 2, 3, 4);
        assert_eq!(logical_to_physical_rect(rect, LOGICAL, physical), rect);
    }
}
