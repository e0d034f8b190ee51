mod bookshelf;
mod color_memory;
mod keypad;
mod whack_a_mole;

use engine::{Canvas, InputSnapshot};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::sound::SoundBoard;

use bookshelf::BookshelfGame;
pub(crate) use color_memory::ColorMemoryGame;
use keypad::KeypadGame;
pub(crate) use whack_a_mole::WhackAMoleGame;

/// What an item runs when it needs a puzzle solved in a modal sub-game.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum MinigameSpec {
    ColorMemory { sequence_len: usize },
    Bookshelf { books: Vec<String>, solution: Vec<usize> },
    Keypad { code: Vec<u8> },
    WhackAMole { win_score: u32, duration_secs: f32 },
}

impl MinigameSpec {
    pub(crate) fn name(&self) -> &'static str {
        match self {
            MinigameSpec::ColorMemory { .. } => "color_memory",
            MinigameSpec::Bookshelf { .. } => "bookshelf",
            MinigameSpec::Keypad { .. } => "keypad",
            MinigameSpec::WhackAMole { .. } => "whack_a_mole",
        }
    }

    /// Whether the outcome counts as solving the item's puzzle.
    pub(crate) fn judge(&self, outcome: MinigameOutcome) -> bool {
        match (self, outcome) {
            (_, MinigameOutcome::Aborted | MinigameOutcome::Failure) => false,
            (MinigameSpec::WhackAMole { win_score, .. }, MinigameOutcome::Score(score)) => {
                score >= *win_score
            }
            (MinigameSpec::WhackAMole { .. }, MinigameOutcome::Success) => false,
            (_, MinigameOutcome::Success) => true,
            (_, MinigameOutcome::Score(_)) => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MinigameOutcome {
    Success,
    Failure,
    Score(u32),
    Aborted,
}

pub(crate) trait Minigame {
    /// Returns `Some` on the tick the game ends.
    fn update(
        &mut self,
        fixed_dt_seconds: f32,
        input: &InputSnapshot,
        sounds: &dyn SoundBoard,
    ) -> Option<MinigameOutcome>;
    fn render(&self, canvas: &mut dyn Canvas);
    fn status_line(&self) -> String;
}

pub(crate) fn start_minigame(spec: &MinigameSpec, rng: &mut StdRng) -> Box<dyn Minigame> {
    let child_rng = StdRng::seed_from_u64(rng.gen());
    match spec {
        MinigameSpec::ColorMemory { sequence_len } => {
            Box::new(ColorMemoryGame::new(*sequence_len, child_rng))
        }
        MinigameSpec::Bookshelf { books, solution } => {
            Box::new(BookshelfGame::new(books.clone(), solution.clone()))
        }
        MinigameSpec::Keypad { code } => Box::new(KeypadGame::new(code.clone())),
        MinigameSpec::WhackAMole { duration_secs, .. } => {
            Box::new(WhackAMoleGame::new(*duration_secs, child_rng))
        }
    }
}
