use winit::event::{ElementState, KeyEvent, MouseButton};
use winit::keyboard::{KeyCode, PhysicalKey};

use super::rendering::physical_to_logical;
use super::{InputSnapshot, Vec2, Viewport};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputAction {
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    Interact,
    Confirm,
    Cancel,
    Erase,
}

impl InputAction {
    const ALL: [InputAction; 8] = [
        InputAction::MoveUp,
        InputAction::MoveDown,
        InputAction::MoveLeft,
        InputAction::MoveRight,
        InputAction::Interact,
        InputAction::Confirm,
        InputAction::Cancel,
        InputAction::Erase,
    ];

    fn index(self) -> usize {
        self as usize
    }

    fn for_key(code: KeyCode) -> Option<Self> {
        let action = match code {
            KeyCode::KeyW | KeyCode::ArrowUp => InputAction::MoveUp,
            KeyCode::KeyS | KeyCode::ArrowDown => InputAction::MoveDown,
            KeyCode::KeyA | KeyCode::ArrowLeft => InputAction::MoveLeft,
            KeyCode::KeyD | KeyCode::ArrowRight => InputAction::MoveRight,
            KeyCode::KeyE => InputAction::Interact,
            KeyCode::Space | KeyCode::Enter | KeyCode::NumpadEnter => InputAction::Confirm,
            KeyCode::Escape => InputAction::Cancel,
            KeyCode::Backspace | KeyCode::Delete => InputAction::Erase,
            _ => return None,
        };
        Some(action)
    }
}

/// One bit per action.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct ActionStates {
    down: [bool; InputAction::ALL.len()],
}

impl ActionStates {
    pub(crate) fn set(&mut self, action: InputAction, is_down: bool) {
        self.down[action.index()] = is_down;
    }

    pub(crate) fn is_down(&self, action: InputAction) -> bool {
        self.down[action.index()]
    }

    pub(crate) fn clear(&mut self) {
        *self = Self::default();
    }
}

fn digit_for_key(code: KeyCode) -> Option<u8> {
    const ROWS: [(KeyCode, KeyCode); 10] = [
        (KeyCode::Digit0, KeyCode::Numpad0),
        (KeyCode::Digit1, KeyCode::Numpad1),
        (KeyCode::Digit2, KeyCode::Numpad2),
        (KeyCode::Digit3, KeyCode::Numpad3),
        (KeyCode::Digit4, KeyCode::Numpad4),
        (KeyCode::Digit5, KeyCode::Numpad5),
        (KeyCode::Digit6, KeyCode::Numpad6),
        (KeyCode::Digit7, KeyCode::Numpad7),
        (KeyCode::Digit8, KeyCode::Numpad8),
        (KeyCode::Digit9, KeyCode::Numpad9),
    ];
    ROWS.iter()
        .position(|(top_row, numpad)| *top_row == code || *numpad == code)
        .map(|digit| digit as u8)
}

/// Folds window events into per-tick snapshots.
///
/// Press edges survive until the next snapshot is taken, so a tap that lands
/// between two ticks is still seen exactly once.
#[derive(Debug)]
pub(crate) struct InputCollector {
    quit_requested: bool,
    held: ActionStates,
    pressed: ActionStates,
    digit_edge: Option<u8>,
    cursor_px: Option<Vec2>,
    left_mouse_down: bool,
    left_click_edge: bool,
    window: Viewport,
    logical: Viewport,
}

impl InputCollector {
    pub(crate) fn new(window: Viewport, logical: Viewport) -> Self {
        Self {
            quit_requested: false,
            held: ActionStates::default(),
            pressed: ActionStates::default(),
            digit_edge: None,
            cursor_px: None,
            left_mouse_down: false,
            left_click_edge: false,
            window,
            logical,
        }
    }

    pub(crate) fn request_quit(&mut self) {
        self.quit_requested = true;
    }

    pub(crate) fn key_event(&mut self, event: &KeyEvent) {
        self.key(event.physical_key, event.state, event.repeat);
    }

    fn key(&mut self, key: PhysicalKey, state: ElementState, repeat: bool) {
        let PhysicalKey::Code(code) = key else {
            return;
        };
        let is_down = state == ElementState::Pressed;
        if let Some(action) = InputAction::for_key(code) {
            if is_down && !self.held.is_down(action) {
                self.pressed.set(action, true);
            }
            self.held.set(action, is_down);
        }
        if is_down && !repeat && self.digit_edge.is_none() {
            self.digit_edge = digit_for_key(code);
        }
    }

    pub(crate) fn mouse_button(&mut self, button: MouseButton, state: ElementState) {
        if button != MouseButton::Left {
            return;
        }
        let is_down = state == ElementState::Pressed;
        if is_down && !self.left_mouse_down {
            self.left_click_edge = true;
        }
        self.left_mouse_down = is_down;
    }

    pub(crate) fn cursor_moved(&mut self, x: f32, y: f32) {
        self.cursor_px = Some(Vec2 { x, y });
    }

    pub(crate) fn cursor_left(&mut self) {
        self.cursor_px = None;
    }

    pub(crate) fn resized(&mut self, width: u32, height: u32) {
        self.window = Viewport { width, height };
    }

    /// Focus loss: nothing stays held, pending edges are kept.
    pub(crate) fn release_all(&mut self) {
        self.held.clear();
        self.left_mouse_down = false;
    }

    pub(crate) fn take_snapshot(&mut self) -> InputSnapshot {
        let cursor = self
            .cursor_px
            .map(|point| physical_to_logical(point, self.logical, self.window));
        InputSnapshot::new(
            self.quit_requested,
            self.held,
            std::mem::take(&mut self.pressed),
            self.digit_edge.take(),
            cursor,
            std::mem::take(&mut self.left_click_edge),
            self.window.width,
            self.window.height,
        )
    }
}
