use engine::{Canvas, InputAction, InputSnapshot, Rect, Rgba, LOGICAL_WIDTH};

use super::{Minigame, MinigameOutcome};
use crate::app::gameplay::sound::{SoundBoard, SoundCue};

const BACKGROUND_COLOR: Rgba = [18, 22, 28, 255];
const KEY_COLOR: Rgba = [70, 78, 90, 255];
const ERASE_KEY_COLOR: Rgba = [150, 60, 50, 255];
const ENTER_KEY_COLOR: Rgba = [50, 130, 70, 255];
const DISPLAY_COLOR: Rgba = [10, 40, 20, 255];
const DIGIT_SLOT_COLOR: Rgba = [90, 220, 120, 255];
const KEY_SIZE_PX: i32 = 110;
const KEY_SPACING_PX: i32 = 20;
const PAD_TOP_PX: i32 = 360;
const DISPLAY_TOP_PX: i32 = 220;
const DISPLAY_HEIGHT_PX: i32 = 100;
const PAD_COLUMNS: i32 = 3;
const PAD_ROWS: i32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum KeypadEntry {
    Pending,
    Accepted,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PadKey {
    Digit(u8),
    Erase,
    Enter,
}

/// Digit entry that submits itself once it reaches the code length.
#[derive(Debug, Clone)]
pub(crate) struct Keypad {
    code: Vec<u8>,
    entered: Vec<u8>,
}

impl Keypad {
    pub(crate) fn new(code: Vec<u8>) -> Self {
        Self {
            code,
            entered: Vec::new(),
        }
    }

    pub(crate) fn entered(&self) -> &[u8] {
        &self.entered
    }

    pub(crate) fn code_len(&self) -> usize {
        self.code.len()
    }

    pub(crate) fn press(&mut self, digit: u8) -> KeypadEntry {
        if digit > 9 {
            return KeypadEntry::Pending;
        }
        self.entered.push(digit);
        if self.entered.len() < self.code.len() {
            KeypadEntry::Pending
        } else {
            self.submit()
        }
    }

    pub(crate) fn erase(&mut self) {
        self.entered.pop();
    }

    /// Clears the entry whatever the result.
    pub(crate) fn submit(&mut self) -> KeypadEntry {
        let accepted = self.entered == self.code;
        self.entered.clear();
        if accepted {
            KeypadEntry::Accepted
        } else {
            KeypadEntry::Rejected
        }
    }
}

pub(crate) struct KeypadGame {
    keypad: Keypad,
    keys: Vec<(PadKey, Rect)>,
}

impl KeypadGame {
    pub(crate) fn new(code: Vec<u8>) -> Self {
        Self {
            keypad: Keypad::new(code),
            keys: layout_pad(),
        }
    }

    pub(crate) fn keypad(&self) -> &Keypad {
        &self.keypad
    }

    pub(crate) fn key_rect_for_digit(&self, digit: u8) -> Option<Rect> {
        self.keys
            .iter()
            .find(|(key, _)| *key == PadKey::Digit(digit))
            .map(|(_, rect)| *rect)
    }

    fn pressed_key(&self, input: &InputSnapshot) -> Option<PadKey> {
        if let Some(digit) = input.digit_pressed() {
            return Some(PadKey::Digit(digit));
        }
        if input.was_pressed(InputAction::Erase) {
            return Some(PadKey::Erase);
        }
        if input.was_pressed(InputAction::Confirm) {
            return Some(PadKey::Enter);
        }
        if !input.left_click_pressed() {
            return None;
        }
        let cursor = input.cursor_position()?;
        self.keys
            .iter()
            .find(|(_, rect)| rect.contains_point(cursor))
            .map(|(key, _)| *key)
    }
}

impl Minigame for KeypadGame {
    fn update(
        &mut self,
        _fixed_dt_seconds: f32,
        input: &InputSnapshot,
        sounds: &dyn SoundBoard,
    ) -> Option<MinigameOutcome> {
        if input.was_pressed(InputAction::Cancel) {
            return Some(MinigameOutcome::Aborted);
        }
        let entry = match self.pressed_key(input)? {
            PadKey::Digit(digit) => {
                sounds.play(SoundCue::Ding);
                self.keypad.press(digit)
            }
            PadKey::Erase => {
                self.keypad.erase();
                KeypadEntry::Pending
            }
            PadKey::Enter if self.keypad.entered().is_empty() => KeypadEntry::Pending,
            PadKey::Enter => self.keypad.submit(),
        };
        match entry {
            KeypadEntry::Pending => None,
            KeypadEntry::Accepted => Some(MinigameOutcome::Success),
            KeypadEntry::Rejected => Some(MinigameOutcome::Failure),
        }
    }

    fn render(&self, canvas: &mut dyn Canvas) {
        canvas.clear(BACKGROUND_COLOR);
        let pad_width = PAD_COLUMNS * KEY_SIZE_PX + (PAD_COLUMNS - 1) * KEY_SPACING_PX;
        let pad_left = LOGICAL_WIDTH as i32 / 2 - pad_width / 2;
        canvas.fill_rect(
            Rect::new(pad_left, DISPLAY_TOP_PX, pad_width, DISPLAY_HEIGHT_PX),
            DISPLAY_COLOR,
        );

        let slots = self.keypad.code_len().max(1) as i32;
        let slot_width = pad_width / slots;
        for index in 0..self.keypad.entered().len() as i32 {
            let slot = Rect::new(
                pad_left + index * slot_width + 10,
                DISPLAY_TOP_PX + 30,
                slot_width - 20,
                DISPLAY_HEIGHT_PX - 60,
            );
            canvas.fill_rect(slot, DIGIT_SLOT_COLOR);
        }

        for (key, rect) in &self.keys {
            let color = match key {
                PadKey::Digit(_) => KEY_COLOR,
                PadKey::Erase => ERASE_KEY_COLOR,
                PadKey::Enter => ENTER_KEY_COLOR,
            };
            canvas.fill_rect(*rect, color);
        }
    }

    fn status_line(&self) -> String {
        let typed: String = self
            .keypad
            .entered()
            .iter()
            .map(|digit| char::from(b'0' + digit))
            .collect();
        let blanks = "_".repeat(self.keypad.code_len().saturating_sub(typed.len()));
        format!("Keypad: {typed}{blanks} (Backspace erases, Esc leaves)")
    }
}

/// Rows 1-2-3, 4-5-6, 7-8-9 then erase, 0, enter.
fn layout_pad() -> Vec<(PadKey, Rect)> {
    let pad_width = PAD_COLUMNS * KEY_SIZE_PX + (PAD_COLUMNS - 1) * KEY_SPACING_PX;
    let pad_left = LOGICAL_WIDTH as i32 / 2 - pad_width / 2;
    let mut keys = Vec::with_capacity((PAD_COLUMNS * PAD_ROWS) as usize);
    for row in 0..PAD_ROWS {
        for column in 0..PAD_COLUMNS {
            let key = match (row, column) {
                (3, 0) => PadKey::Erase,
                (3, 1) => PadKey::Digit(0),
                (3, _) => PadKey::Enter,
                _ => PadKey::Digit((row * PAD_COLUMNS + column + 1) as u8),
            };
            let rect = Rect::new(
                pad_left + column * (KEY_SIZE_PX + KEY_SPACING_PX),
                PAD_TOP_PX + row * (KEY_SIZE_PX + KEY_SPACING_PX),
                KEY_SIZE_PX,
                KEY_SIZE_PX,
            );
            keys.push((key, rect));
        }
    }
    keys
}
