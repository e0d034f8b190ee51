use engine::{Canvas, InputAction, InputSnapshot, Rect, Rgba, Vec2};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;

use super::{Minigame, MinigameOutcome};
use crate::app::gameplay::sound::{SoundBoard, SoundCue};

pub(crate) const HOLE_COUNT: usize = 9;
pub(crate) const GAME_OVER_HOLD_SECS: f32 = 1.5;
const HOLE_POSITIONS: [(i32, i32); HOLE_COUNT] = [
    (710, 690),
    (960, 690),
    (1210, 690),
    (710, 540),
    (960, 540),
    (1210, 540),
    (710, 390),
    (960, 390),
    (1210, 390),
];
const MOLE_RADIUS_PX: i32 = 30;
const MOLE_SPRITE_PX: i32 = 120;
const HOLE_SPRITE_SIZE: (i32, i32) = (140, 70);
const HOLE_DROP_PX: i32 = 20;
const POP_INTERVAL_SECS: (f32, f32) = (0.8, 1.5);
const MOLE_UP_SECS: (f32, f32) = (0.5, 1.2);
const BACKGROUND_COLOR: Rgba = [36, 30, 26, 255];
const TIMER_BAR_COLOR: Rgba = [200, 180, 90, 255];
const SCORE_PIP_COLOR: Rgba = [240, 240, 240, 255];

pub(crate) struct WhackAMoleGame {
    rng: StdRng,
    duration_secs: f32,
    elapsed_secs: f32,
    next_pop_in: f32,
    /// Seconds left above ground per hole.
    moles: [Option<f32>; HOLE_COUNT],
    score: u32,
    game_over_for: Option<f32>,
}

impl WhackAMoleGame {
    pub(crate) fn new(duration_secs: f32, mut rng: StdRng) -> Self {
        let next_pop_in = rng.gen_range(POP_INTERVAL_SECS.0..=POP_INTERVAL_SECS.1);
        Self {
            rng,
            duration_secs: duration_secs.max(0.0),
            elapsed_secs: 0.0,
            next_pop_in,
            moles: [None; HOLE_COUNT],
            score: 0,
            game_over_for: None,
        }
    }

    pub(crate) fn score(&self) -> u32 {
        self.score
    }

    pub(crate) fn time_left_secs(&self) -> f32 {
        (self.duration_secs - self.elapsed_secs).max(0.0)
    }

    pub(crate) fn is_game_over(&self) -> bool {
        self.game_over_for.is_some()
    }

    pub(crate) fn up_holes(&self) -> Vec<usize> {
        (0..HOLE_COUNT).filter(|hole| self.moles[*hole].is_some()).collect()
    }

    pub(crate) fn mole_rect(hole: usize) -> Option<Rect> {
        let center = *HOLE_POSITIONS.get(hole)?;
        Some(Rect::from_center(center, MOLE_SPRITE_PX, MOLE_SPRITE_PX))
    }

    /// Hits the first raised mole under `point`.
    pub(crate) fn whack_at(&mut self, point: Vec2, sounds: &dyn SoundBoard) -> bool {
        let hole = (0..HOLE_COUNT).find(|hole| {
            self.moles[*hole].is_some()
                && Self::mole_rect(*hole).is_some_and(|rect| rect.contains_point(point))
        });
        match hole {
            Some(hole) => self.whack_hole(hole, sounds),
            None => false,
        }
    }

    fn whack_hole(&mut self, hole: usize, sounds: &dyn SoundBoard) -> bool {
        if self.is_game_over() || self.moles.get(hole).copied().flatten().is_none() {
            return false;
        }
        self.score += 1;
        sounds.play(SoundCue::Whack);
        self.moles[hole] = None;
        self.pop_mole(sounds);
        true
    }

    fn pop_mole(&mut self, sounds: &dyn SoundBoard) {
        let hidden: Vec<usize> = (0..HOLE_COUNT)
            .filter(|hole| self.moles[*hole].is_none())
            .collect();
        if let Some(&hole) = hidden.choose(&mut self.rng) {
            sounds.play(SoundCue::Taunt);
            self.moles[hole] = Some(self.rng.gen_range(MOLE_UP_SECS.0..=MOLE_UP_SECS.1));
        }
        self.next_pop_in = self
            .rng
            .gen_range(POP_INTERVAL_SECS.0..=POP_INTERVAL_SECS.1);
    }

    fn tick_moles(&mut self, dt: f32) {
        for mole in &mut self.moles {
            if let Some(left) = mole {
                *left -= dt;
                if *left <= 0.0 {
                    *mole = None;
                }
            }
        }
    }
}

impl Minigame for WhackAMoleGame {
    fn update(
        &mut self,
        fixed_dt_seconds: f32,
        input: &InputSnapshot,
        sounds: &dyn SoundBoard,
    ) -> Option<MinigameOutcome> {
        if input.was_pressed(InputAction::Cancel) {
            return Some(MinigameOutcome::Aborted);
        }
        if let Some(held) = self.game_over_for.as_mut() {
            *held += fixed_dt_seconds;
            return (*held >= GAME_OVER_HOLD_SECS).then_some(MinigameOutcome::Score(self.score));
        }

        self.elapsed_secs += fixed_dt_seconds;
        if self.elapsed_secs >= self.duration_secs {
            self.moles = [None; HOLE_COUNT];
            self.game_over_for = Some(0.0);
            return None;
        }

        if let Some(digit) = input.digit_pressed() {
            if let Some(hole) = (digit as usize).checked_sub(1) {
                self.whack_hole(hole, sounds);
            }
        } else if input.left_click_pressed() {
            if let Some(cursor) = input.cursor_position() {
                self.whack_at(cursor, sounds);
            }
        }

        self.tick_moles(fixed_dt_seconds);
        self.next_pop_in -= fixed_dt_seconds;
        if self.next_pop_in <= 0.0 {
            self.pop_mole(sounds);
        }
        None
    }

    fn render(&self, canvas: &mut dyn Canvas) {
        canvas.clear(BACKGROUND_COLOR);
        for (hole, (x, y)) in HOLE_POSITIONS.iter().enumerate() {
            let hole_rect = Rect::from_center(
                (*x, *y + HOLE_DROP_PX),
                HOLE_SPRITE_SIZE.0,
                HOLE_SPRITE_SIZE.1,
            );
            canvas.blit_sprite("level_3/hole", hole_rect, false);
            if self.moles[hole].is_some() {
                if let Some(rect) = Self::mole_rect(hole) {
                    canvas.blit_sprite("level_3/mole", rect, false);
                }
            }
        }

        let (width, _) = canvas.logical_size();
        let fraction = if self.duration_secs > 0.0 {
            self.time_left_secs() / self.duration_secs
        } else {
            0.0
        };
        let bar_width = (fraction * (width as f32 - 100.0)) as i32;
        canvas.fill_rect(Rect::new(50, 20, bar_width, 16), TIMER_BAR_COLOR);
        for pip in 0..self.score as i32 {
            canvas.fill_rect(
                Rect::new(50 + pip * (MOLE_RADIUS_PX + 6), 50, MOLE_RADIUS_PX, MOLE_RADIUS_PX),
                SCORE_PIP_COLOR,
            );
        }
    }

    fn status_line(&self) -> String {
        if self.is_game_over() {
            format!("Time's up! Score: {}", self.score)
        } else {
            format!(
                "Whack the moles! Score: {}  Time: {}s",
                self.score,
                self.time_left_secs() as u32
            )
        }
    }
}
