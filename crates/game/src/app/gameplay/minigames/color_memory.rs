use engine::{Canvas, InputAction, InputSnapshot, Rect, Rgba, LOGICAL_WIDTH};
use rand::rngs::StdRng;
use rand::Rng;

use super::{Minigame, MinigameOutcome};
use crate::app::gameplay::sound::{SoundBoard, SoundCue};

pub(crate) const COLOR_COUNT: usize = 4;
const COLORS: [Rgba; COLOR_COUNT] = [
    [255, 0, 0, 255],
    [0, 255, 0, 255],
    [0, 0, 255, 255],
    [128, 128, 128, 255],
];
const COLOR_NAMES: [&str; COLOR_COUNT] = ["red", "green", "blue", "gray"];
const DIM_COLOR: Rgba = [50, 50, 50, 255];
const BACKGROUND_COLOR: Rgba = [0, 0, 0, 255];
const FLASH_SECS: f32 = 0.7;
const PAUSE_SECS: f32 = 0.5;
const BOX_SIZE_PX: i32 = 120;
const BOX_SPACING_PX: i32 = 60;
const BOX_TOP_PX: i32 = 490;
const PICK_HIGHLIGHT: u8 = 70;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Phase {
    Intro,
    Showing { step: usize, elapsed: f32 },
    Pause { elapsed: f32 },
    Input { matched: usize },
}

pub(crate) struct ColorMemoryGame {
    sequence: Vec<usize>,
    phase: Phase,
    boxes: [Rect; COLOR_COUNT],
    last_pick: Option<usize>,
}

impl ColorMemoryGame {
    pub(crate) fn new(sequence_len: usize, mut rng: StdRng) -> Self {
        Self {
            sequence: generate_sequence(&mut rng, sequence_len.max(1)),
            phase: Phase::Intro,
            boxes: layout_boxes(),
            last_pick: None,
        }
    }

    pub(crate) fn sequence(&self) -> &[usize] {
        &self.sequence
    }

    pub(crate) fn box_rect(&self, color: usize) -> Option<Rect> {
        self.boxes.get(color).copied()
    }

    pub(crate) fn is_accepting_input(&self) -> bool {
        matches!(self.phase, Phase::Input { .. })
    }

    /// Ignored unless the sequence has finished playing.
    pub(crate) fn pick(&mut self, color: usize) -> Option<MinigameOutcome> {
        let Phase::Input { matched } = self.phase else {
            return None;
        };
        self.last_pick = Some(color);
        if self.sequence.get(matched) != Some(&color) {
            return Some(MinigameOutcome::Failure);
        }
        let matched = matched + 1;
        if matched == self.sequence.len() {
            return Some(MinigameOutcome::Success);
        }
        self.phase = Phase::Input { matched };
        None
    }

    fn advance_playback(&mut self, dt: f32) {
        self.phase = match self.phase {
            Phase::Showing { step, elapsed } => {
                let elapsed = elapsed + dt;
                if elapsed < FLASH_SECS {
                    Phase::Showing { step, elapsed }
                } else if step + 1 < self.sequence.len() {
                    Phase::Showing {
                        step: step + 1,
                        elapsed: 0.0,
                    }
                } else {
                    Phase::Pause { elapsed: 0.0 }
                }
            }
            Phase::Pause { elapsed } => {
                let elapsed = elapsed + dt;
                if elapsed < PAUSE_SECS {
                    Phase::Pause { elapsed }
                } else {
                    Phase::Input { matched: 0 }
                }
            }
            other => other,
        };
    }

    fn picked_color(&self, input: &InputSnapshot) -> Option<usize> {
        if let Some(digit) = input.digit_pressed() {
            let index = (digit as usize).checked_sub(1)?;
            return (index < COLOR_COUNT).then_some(index);
        }
        if !input.left_click_pressed() {
            return None;
        }
        let cursor = input.cursor_position()?;
        self.boxes.iter().position(|rect| rect.contains_point(cursor))
    }
}

impl Minigame for ColorMemoryGame {
    fn update(
        &mut self,
        fixed_dt_seconds: f32,
        input: &InputSnapshot,
        sounds: &dyn SoundBoard,
    ) -> Option<MinigameOutcome> {
        if input.was_pressed(InputAction::Cancel) {
            return Some(MinigameOutcome::Aborted);
        }
        match self.phase {
            Phase::Intro => {
                if input.was_pressed(InputAction::Confirm) || input.was_pressed(InputAction::Interact)
                {
                    self.phase = Phase::Showing {
                        step: 0,
                        elapsed: 0.0,
                    };
                }
                None
            }
            Phase::Showing { .. } | Phase::Pause { .. } => {
                self.advance_playback(fixed_dt_seconds);
                None
            }
            Phase::Input { .. } => {
                let color = self.picked_color(input)?;
                sounds.play(SoundCue::Ding);
                self.pick(color)
            }
        }
    }

    fn render(&self, canvas: &mut dyn Canvas) {
        canvas.clear(BACKGROUND_COLOR);
        for (index, rect) in self.boxes.iter().enumerate() {
            let color = match self.phase {
                Phase::Intro | Phase::Pause { .. } => DIM_COLOR,
                Phase::Showing { step, .. } if self.sequence.get(step) == Some(&index) => {
                    COLORS[index]
                }
                Phase::Showing { .. } => DIM_COLOR,
                Phase::Input { .. } if self.last_pick == Some(index) => brighten(COLORS[index]),
                Phase::Input { .. } => COLORS[index],
            };
            canvas.fill_rect(*rect, color);
        }
    }

    fn status_line(&self) -> String {
        match self.phase {
            Phase::Intro => {
                "Color memory: press Space to start, Esc to leave. Wait for the flashing to stop."
                    .to_string()
            }
            Phase::Showing { step, .. } => format!(
                "Watch closely... {} ({}/{})",
                COLOR_NAMES[self.sequence[step]],
                step + 1,
                self.sequence.len()
            ),
            Phase::Pause { .. } => "Your turn in a moment...".to_string(),
            Phase::Input { matched } => format!(
                "Repeat the colors with the mouse or keys 1-4 ({matched}/{})",
                self.sequence.len()
            ),
        }
    }
}

/// No color appears twice in a row.
fn generate_sequence(rng: &mut impl Rng, len: usize) -> Vec<usize> {
    let mut sequence: Vec<usize> = Vec::with_capacity(len);
    for _ in 0..len {
        let next = match sequence.last() {
            None => rng.gen_range(0..COLOR_COUNT),
            Some(&previous) => {
                let candidate = rng.gen_range(0..COLOR_COUNT - 1);
                if candidate >= previous {
                    candidate + 1
                } else {
                    candidate
                }
            }
        };
        sequence.push(next);
    }
    sequence
}

fn layout_boxes() -> [Rect; COLOR_COUNT] {
    let count = COLOR_COUNT as i32;
    let total_width = count * BOX_SIZE_PX + (count - 1) * BOX_SPACING_PX;
    let start_x = LOGICAL_WIDTH as i32 / 2 - total_width / 2;
    std::array::from_fn(|index| {
        Rect::new(
            start_x + index as i32 * (BOX_SIZE_PX + BOX_SPACING_PX),
            BOX_TOP_PX,
            BOX_SIZE_PX,
            BOX_SIZE_PX,
        )
    })
}

fn brighten(color: Rgba) -> Rgba {
    [
        color[0].saturating_add(PICK_HIGHLIGHT),
        color[1].saturating_add(PICK_HIGHLIGHT),
        color[2].saturating_add(PICK_HIGHLIGHT),
        color[3],
    ]
}
