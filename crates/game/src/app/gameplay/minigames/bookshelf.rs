use engine::{Canvas, InputAction, InputSnapshot, Rect, Rgba, LOGICAL_WIDTH};

use super::{Minigame, MinigameOutcome};
use crate::app::gameplay::sound::{SoundBoard, SoundCue};

const BACKGROUND_COLOR: Rgba = [40, 26, 16, 255];
const SHELF_COLOR: Rgba = [92, 60, 34, 255];
const CURSOR_COLOR: Rgba = [255, 236, 120, 255];
const PICKED_SHADE: Rgba = [0, 0, 0, 150];
const BOOK_WIDTH_PX: i32 = 100;
const BOOK_HEIGHT_PX: i32 = 300;
const BOOK_SPACING_PX: i32 = 20;
const BOOK_TOP_PX: i32 = 390;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ShelfPick {
    Pending,
    Solved,
    WrongOrder,
    AlreadyPicked,
    OutOfRange,
}

/// Ordered selection of every book; a wrong full selection clears the picks.
#[derive(Debug, Clone)]
pub(crate) struct BookshelfPuzzle {
    books: Vec<String>,
    solution: Vec<usize>,
    picked: Vec<usize>,
}

impl BookshelfPuzzle {
    pub(crate) fn new(books: Vec<String>, solution: Vec<usize>) -> Self {
        Self {
            books,
            solution,
            picked: Vec::new(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.books.len()
    }

    pub(crate) fn picked(&self) -> &[usize] {
        &self.picked
    }

    pub(crate) fn pick(&mut self, index: usize) -> ShelfPick {
        if index >= self.books.len() {
            return ShelfPick::OutOfRange;
        }
        if self.picked.contains(&index) {
            return ShelfPick::AlreadyPicked;
        }
        self.picked.push(index);
        if self.picked.len() < self.solution.len() {
            return ShelfPick::Pending;
        }
        if self.picked == self.solution {
            ShelfPick::Solved
        } else {
            self.picked.clear();
            ShelfPick::WrongOrder
        }
    }
}

pub(crate) struct BookshelfGame {
    puzzle: BookshelfPuzzle,
    cursor: usize,
    book_rects: Vec<Rect>,
}

impl BookshelfGame {
    pub(crate) fn new(books: Vec<String>, solution: Vec<usize>) -> Self {
        let book_rects = layout_books(books.len());
        Self {
            puzzle: BookshelfPuzzle::new(books, solution),
            cursor: 0,
            book_rects,
        }
    }

    pub(crate) fn cursor(&self) -> usize {
        self.cursor
    }

    pub(crate) fn puzzle(&self) -> &BookshelfPuzzle {
        &self.puzzle
    }

    fn move_cursor(&mut self, forward: bool) {
        let count = self.puzzle.len();
        if count == 0 {
            return;
        }
        self.cursor = if forward {
            (self.cursor + 1) % count
        } else {
            (self.cursor + count - 1) % count
        };
    }

    fn chosen_book(&self, input: &InputSnapshot) -> Option<usize> {
        if input.was_pressed(InputAction::Confirm) || input.was_pressed(InputAction::Interact) {
            return Some(self.cursor);
        }
        if let Some(digit) = input.digit_pressed() {
            return (digit as usize).checked_sub(1);
        }
        if !input.left_click_pressed() {
            return None;
        }
        let cursor = input.cursor_position()?;
        self.book_rects
            .iter()
            .position(|rect| rect.contains_point(cursor))
    }
}

impl Minigame for BookshelfGame {
    fn update(
        &mut self,
        _fixed_dt_seconds: f32,
        input: &InputSnapshot,
        sounds: &dyn SoundBoard,
    ) -> Option<MinigameOutcome> {
        if input.was_pressed(InputAction::Cancel) {
            return Some(MinigameOutcome::Aborted);
        }
        if input.was_pressed(InputAction::MoveLeft) {
            self.move_cursor(false);
        }
        if input.was_pressed(InputAction::MoveRight) {
            self.move_cursor(true);
        }
        let book = self.chosen_book(input)?;
        match self.puzzle.pick(book) {
            ShelfPick::Pending => {
                sounds.play(SoundCue::Ding);
                None
            }
            ShelfPick::Solved => Some(MinigameOutcome::Success),
            ShelfPick::WrongOrder => Some(MinigameOutcome::Failure),
            ShelfPick::AlreadyPicked | ShelfPick::OutOfRange => None,
        }
    }

    fn render(&self, canvas: &mut dyn Canvas) {
        canvas.clear(BACKGROUND_COLOR);
        if let (Some(first), Some(last)) = (self.book_rects.first(), self.book_rects.last()) {
            let shelf = Rect::new(first.x - 40, last.bottom(), last.right() - first.x + 80, 40);
            canvas.fill_rect(shelf, SHELF_COLOR);
        }
        for (index, (rect, title)) in self.book_rects.iter().zip(&self.puzzle.books).enumerate() {
            canvas.fill_rect(*rect, book_color(title));
            if self.puzzle.picked.contains(&index) {
                canvas.fill_rect(*rect, PICKED_SHADE);
            }
            if index == self.cursor {
                canvas.outline_rect(*rect, 6, CURSOR_COLOR);
            }
        }
    }

    fn status_line(&self) -> String {
        let picked = self
            .puzzle
            .picked
            .iter()
            .filter_map(|index| self.puzzle.books.get(*index))
            .map(String::as_str)
            .collect::<Vec<_>>();
        let current = self
            .puzzle
            .books
            .get(self.cursor)
            .map(String::as_str)
            .unwrap_or("");
        if picked.is_empty() {
            format!("Bookshelf: pull the books in the right order. Selected book: {current}")
        } else {
            format!(
                "Bookshelf: pulled {} so far. Selected book: {current}",
                picked.join(", ")
            )
        }
    }
}

fn layout_books(count: usize) -> Vec<Rect> {
    let count_px = count as i32;
    let total_width = count_px * BOOK_WIDTH_PX + (count_px - 1).max(0) * BOOK_SPACING_PX;
    let start_x = LOGICAL_WIDTH as i32 / 2 - total_width / 2;
    (0..count_px)
        .map(|index| {
            Rect::new(
                start_x + index * (BOOK_WIDTH_PX + BOOK_SPACING_PX),
                BOOK_TOP_PX,
                BOOK_WIDTH_PX,
                BOOK_HEIGHT_PX,
            )
        })
        .collect()
}

fn book_color(title: &str) -> Rgba {
    match title {
        "red" => [178, 34, 34, 255],
        "blue" => [30, 70, 170, 255],
        "green" => [34, 120, 60, 255],
        "yellow" => [220, 190, 40, 255],
        "purple" => [110, 50, 140, 255],
        "orange" => [220, 120, 30, 255],
        "black" => [25, 25, 25, 255],
        "white" => [230, 230, 220, 255],
        _ => [140, 120, 100, 255],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::gameplay::test_support::ScriptedSounds;

    fn books() -> Vec<String> {
        ["red", "blue", "green", "yellow"]
            .into_iter()
            .map(String::from)
            .collect()
    }

    fn puzzle() -> BookshelfPuzzle {
        BookshelfPuzzle::new(books(), vec![2, 0, 3, 1])
    }

    #[test]
    fn exact_order_solves() {
        let mut puzzle = puzzle();
        assert_eq!(puzzle.pick(2), ShelfPick::Pending);
        assert_eq!(puzzle.pick(0), ShelfPick::Pending);
        assert_eq!(puzzle.pick(3), ShelfPick::Pending);
        assert_eq!(puzzle.pick(1), ShelfPick::Solved);
    }

    #[test]
    fn complete_wrong_order_resets_picks() {
        let mut puzzle = puzzle();
        for index in [0, 1, 2] {
            assert_eq!(puzzle.pick(index), ShelfPick::Pending);
        }
        assert_eq!(puzzle.pick(3), ShelfPick::WrongOrder);
        assert!(puzzle.picked().is_empty());

        for index in [2, 0, 3] {
            assert_eq!(puzzle.pick(index), ShelfPick::Pending);
        }
        assert_eq!(puzzle.pick(1), ShelfPick::Solved);
    }

    #[test]
    fn a_book_cannot_be_picked_twice() {
        let mut puzzle = puzzle();
        assert_eq!(puzzle.pick(2), ShelfPick::Pending);
        assert_eq!(puzzle.pick(2), ShelfPick::AlreadyPicked);
        assert_eq!(puzzle.picked(), &[2]);
        assert_eq!(puzzle.pick(9), ShelfPick::OutOfRange);
    }

    #[test]
    fn cursor_wraps_and_confirm_picks_under_cursor() {
        let mut game = BookshelfGame::new(books(), vec![3, 0, 1, 2]);
        let sounds = ScriptedSounds::default();
        let left = InputSnapshot::empty().with_action_pressed(InputAction::MoveLeft);
        let confirm = InputSnapshot::empty().with_action_pressed(InputAction::Confirm);

        assert_eq!(game.update(0.0, &left, &sounds), None);
        assert_eq!(game.cursor(), 3);
        assert_eq!(game.update(0.0, &confirm, &sounds), None);
        assert_eq!(game.puzzle().picked(), &[3]);
        assert_eq!(sounds.played(), vec![SoundCue::Ding]);
    }

    #[test]
    fn game_reports_failure_then_allows_retry() {
        let mut game = BookshelfGame::new(books(), vec![0, 1, 2, 3]);
        let sounds = ScriptedSounds::default();
        let outcomes: Vec<_> = [1u8, 2, 3, 4, 4, 3, 2, 1]
            .into_iter()
            .map(|digit| {
                game.update(0.0, &InputSnapshot::empty().with_digit_pressed(digit), &sounds)
            })
            .collect();

        assert_eq!(outcomes[3], Some(MinigameOutcome::Success));

        let mut game = BookshelfGame::new(books(), vec![0, 1, 2, 3]);
        let mut last = None;
        for digit in [4u8, 3, 2, 1] {
            last = game.update(0.0, &InputSnapshot::empty().with_digit_pressed(digit), &sounds);
        }
        assert_eq!(last, Some(MinigameOutcome::Failure));
        assert!(game.puzzle().picked().is_empty());
    }

    #[test]
    fn cancel_aborts() {
        let mut game = BookshelfGame::new(books(), vec![0, 1, 2, 3]);
        let sounds = ScriptedSounds::default();
        let cancel = InputSnapshot::empty().with_action_pressed(InputAction::Cancel);
        assert_eq!(
            game.update(0.0, &cancel, &sounds),
            Some(MinigameOutcome::Aborted)
        );
    }
}
