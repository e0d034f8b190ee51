use engine::{Canvas, InputAction, InputSnapshot, Rect, Viewport};

use super::interaction::Interaction;
use super::level::Level;
use super::session::Session;
use super::sound::{SoundBoard, SoundCue};

pub(crate) const PLAYER_BASE_SIZE_PX: i32 = 135;
pub(crate) const DEFAULT_PLAYER_SPEED_PX: i32 = 10;
pub(crate) const DEFAULT_WALK_TOP_LIMIT_PX: i32 = 200;
pub(crate) const DEFAULT_INTERACT_COOLDOWN_SECS: f64 = 0.5;
const WALK_FRAMES: [&str; 3] = ["player/idle", "player/walk_1", "player/walk_2"];

/// Where the player was before this tick's move, and by how much it tried to move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Movement {
    pub(crate) old: Rect,
    pub(crate) dx: i32,
    pub(crate) dy: i32,
}

#[derive(Debug, Clone)]
pub(crate) struct Player {
    rect: Rect,
    canvas: Viewport,
    speed_px: i32,
    walk_top_limit_px: i32,
    interact_cooldown_secs: f64,
    last_interact: Option<f64>,
    frame_index: f32,
    animation_speed: f32,
    moving: bool,
    facing_right: bool,
}

impl Player {
    pub(crate) fn new(
        canvas: Viewport,
        speed_px: i32,
        walk_top_limit_px: i32,
        interact_cooldown_secs: f64,
    ) -> Self {
        let speed_px = speed_px.max(1);
        let center = canvas_center(canvas);
        Self {
            rect: Rect::from_center(center, PLAYER_BASE_SIZE_PX, PLAYER_BASE_SIZE_PX),
            canvas,
            speed_px,
            walk_top_limit_px,
            interact_cooldown_secs,
            last_interact: None,
            frame_index: 0.0,
            animation_speed: 3.0 / speed_px as f32,
            moving: false,
            facing_right: true,
        }
    }

    pub(crate) fn rect(&self) -> Rect {
        self.rect
    }

    pub(crate) fn rect_mut(&mut self) -> &mut Rect {
        &mut self.rect
    }

    #[cfg(test)]
    pub(crate) fn is_moving(&self) -> bool {
        self.moving
    }

    pub(crate) fn facing_right(&self) -> bool {
        self.facing_right
    }

    pub(crate) fn frame_key(&self) -> &'static str {
        WALK_FRAMES[(self.frame_index as usize).min(WALK_FRAMES.len() - 1)]
    }

    pub(crate) fn handle_input(&mut self, input: &InputSnapshot) -> Movement {
        let old = self.rect;
        let mut dx = 0;
        let mut dy = 0;
        self.moving = false;

        if input.is_down(InputAction::MoveUp) {
            dy -= self.speed_px;
            self.moving = true;
        }
        if input.is_down(InputAction::MoveDown) {
            dy += self.speed_px;
            self.moving = true;
        }
        if input.is_down(InputAction::MoveLeft) {
            dx -= self.speed_px;
            self.moving = true;
            self.facing_right = false;
        }
        if input.is_down(InputAction::MoveRight) {
            dx += self.speed_px;
            self.moving = true;
            self.facing_right = true;
        }

        self.rect.x += dx;
        self.rect.y += dy;
        self.clamp_to_room();
        Movement { old, dx, dy }
    }

    fn clamp_to_room(&mut self) {
        let width = self.canvas.width as i32;
        let height = self.canvas.height as i32;
        self.rect.x = self.rect.x.min(width - self.rect.w).max(0);
        self.rect.y = self
            .rect
            .y
            .min(height - self.rect.h)
            .max(self.walk_top_limit_px);
    }

    /// Footsteps only start when nothing else is playing.
    pub(crate) fn animate(&mut self, sounds: &dyn SoundBoard) {
        if self.moving {
            self.frame_index += self.animation_speed;
            if sounds.is_idle() {
                sounds.play(SoundCue::Footstep);
            }
        } else {
            self.frame_index = 0.0;
        }
        if self.frame_index >= WALK_FRAMES.len() as f32 {
            self.frame_index = 0.0;
        }
    }

    /// Scales from the base size, keeping the current center.
    pub(crate) fn resize(&mut self, scale: f32) {
        let scale = if scale.is_finite() && scale > 0.0 {
            scale
        } else {
            1.0
        };
        let size = ((PLAYER_BASE_SIZE_PX as f32 * scale).round() as i32).max(1);
        let center = self.rect.center();
        self.rect = Rect::from_center(center, size, size);
    }

    pub(crate) fn recenter(&mut self) {
        self.rect.set_center(canvas_center(self.canvas));
    }

    /// Presses during the cooldown, or while a melody is still playing, are dropped.
    pub(crate) fn try_interact(
        &mut self,
        now: f64,
        level: &mut Level,
        session: &mut Session,
        sounds: &dyn SoundBoard,
    ) -> Option<Interaction> {
        if self
            .last_interact
            .is_some_and(|last| now - last < self.interact_cooldown_secs)
        {
            return None;
        }
        if level.is_awaiting_audio() {
            return None;
        }
        let index = level.interactable_index_for(&self.rect)?;
        sounds.stop_all();
        let interaction = level.interact(index, session);
        self.last_interact = Some(now);
        Some(interaction)
    }

    pub(crate) fn draw(&self, canvas: &mut dyn Canvas) {
        canvas.blit_sprite(self.frame_key(), self.rect, !self.facing_right);
    }
}

fn canvas_center(canvas: Viewport) -> (i32, i32) {
    ((canvas.width / 2) as i32, (canvas.height / 2) as i32)
}
