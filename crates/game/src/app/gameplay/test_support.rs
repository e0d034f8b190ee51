use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use engine::{Canvas, Rect, Rgba, Viewport};

use super::item::{ItemKind, ItemSpec, SpriteRef};
use super::level::LevelServices;
use super::message::{Message, MessageSink};
use super::sound::{SoundBoard, SoundCue};

pub(crate) const CANVAS: Viewport = Viewport {
    width: 1920,
    height: 1080,
};

pub(crate) fn player_at(x: i32, y: i32) -> Rect {
    Rect::from_center((x, y), 135, 135)
}

pub(crate) fn spec(key: &str, kind: ItemKind) -> ItemSpec {
    ItemSpec::new(key, kind, key, SpriteRef::new(format!("test/{key}"), 100, 100))
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum CanvasOp {
    Clear(Rgba),
    Fill(Rect, Rgba),
    Outline(Rect, Rgba),
    Sprite(String, Rect, bool),
}

#[derive(Debug, Default)]
pub(crate) struct RecordingCanvas {
    pub(crate) ops: Vec<CanvasOp>,
}

impl RecordingCanvas {
    pub(crate) fn sprite_keys(&self) -> Vec<String> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                CanvasOp::Sprite(key, _, _) => Some(key.clone()),
                _ => None,
            })
            .collect()
    }
}

impl Canvas for RecordingCanvas {
    fn logical_size(&self) -> (u32, u32) {
        (CANVAS.width, CANVAS.height)
    }

    fn clear(&mut self, color: Rgba) {
        self.ops.push(CanvasOp::Clear(color));
    }

    fn fill_rect(&mut self, rect: Rect, color: Rgba) {
        self.ops.push(CanvasOp::Fill(rect, color));
    }

    fn outline_rect(&mut self, rect: Rect, _thickness: i32, color: Rgba) {
        self.ops.push(CanvasOp::Outline(rect, color));
    }

    fn blit_sprite(&mut self, key: &str, rect: Rect, mirrored: bool) {
        self.ops.push(CanvasOp::Sprite(key.to_string(), rect, mirrored));
    }
}

#[derive(Debug, Default)]
pub(crate) struct RecordingMessages {
    messages: RefCell<Vec<Message>>,
}

impl RecordingMessages {
    pub(crate) fn texts(&self) -> Vec<String> {
        self.messages
            .borrow()
            .iter()
            .map(|message| message.text.clone())
            .collect()
    }

    pub(crate) fn last_text(&self) -> Option<String> {
        self.messages
            .borrow()
            .last()
            .map(|message| message.text.clone())
    }
}

impl MessageSink for RecordingMessages {
    fn show(&self, message: Message) {
        self.messages.borrow_mut().push(message);
    }
}

/// Cues keep playing until a test calls `finish`.
#[derive(Debug, Default)]
pub(crate) struct ScriptedSounds {
    played: RefCell<Vec<SoundCue>>,
    playing: RefCell<HashSet<SoundCue>>,
    stop_count: RefCell<u32>,
}

impl ScriptedSounds {
    pub(crate) fn played(&self) -> Vec<SoundCue> {
        self.played.borrow().clone()
    }

    pub(crate) fn finish(&self, cue: SoundCue) {
        self.playing.borrow_mut().remove(&cue);
    }

    pub(crate) fn stop_count(&self) -> u32 {
        *self.stop_count.borrow()
    }
}

impl SoundBoard for ScriptedSounds {
    fn play(&self, cue: SoundCue) {
        self.played.borrow_mut().push(cue);
        self.playing.borrow_mut().insert(cue);
    }

    fn is_playing(&self, cue: SoundCue) -> bool {
        self.playing.borrow().contains(&cue)
    }

    fn is_idle(&self) -> bool {
        self.playing.borrow().is_empty()
    }

    fn stop_all(&self) {
        self.playing.borrow_mut().clear();
        *self.stop_count.borrow_mut() += 1;
    }
}

pub(crate) struct Fixture {
    pub(crate) messages: Rc<RecordingMessages>,
    pub(crate) sounds: Rc<ScriptedSounds>,
}

impl Fixture {
    pub(crate) fn new() -> Self {
        Self {
            messages: Rc::new(RecordingMessages::default()),
            sounds: Rc::new(ScriptedSounds::default()),
        }
    }

    pub(crate) fn services(&self) -> LevelServices {
        LevelServices {
            messages: self.messages.clone(),
            sounds: self.sounds.clone(),
        }
    }
}
