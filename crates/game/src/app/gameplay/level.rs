use std::collections::HashMap;
use std::rc::Rc;

use engine::{Canvas, Rect, Viewport};
use thiserror::Error;
use tracing::{debug, info};

use super::interaction::{self, InteractContext, Interaction};
use super::item::{Item, ItemSpec};
use super::message::{Message, MessageSink};
use super::minigames::MinigameOutcome;
use super::session::Session;
use super::sound::{SoundBoard, SoundCue};
use crate::app::content::{RoomCatalog, RoomDef};

/// Collaborators every level is built with.
#[derive(Clone)]
pub(crate) struct LevelServices {
    pub(crate) messages: Rc<dyn MessageSink>,
    pub(crate) sounds: Rc<dyn SoundBoard>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub(crate) enum LevelError {
    #[error("no room is declared for level {level_id}")]
    UnknownLevel { level_id: u32 },
    #[error("level {level_id} has no exit door")]
    MissingDoor { level_id: u32 },
    #[error("level {level_id} has {count} exit doors, expected exactly one")]
    MultipleDoors { level_id: u32, count: usize },
    #[error("level {level_id} declares item key `{key}` more than once")]
    DuplicateItemKey { level_id: u32, key: String },
    #[error("item `{item}` in level {level_id} unlocks unknown item `{target}`")]
    UnknownUnlockTarget {
        level_id: u32,
        item: String,
        target: String,
    },
}

pub(crate) struct Level {
    level_id: u32,
    name: String,
    background: String,
    player_scale: f32,
    items: Vec<Item>,
    /// Finishing `items[source]` enables every item in `targets`.
    unlock_edges: Vec<(usize, Vec<usize>)>,
    door_index: usize,
    remaining_puzzles: usize,
    puzzles_solved: u32,
    services: LevelServices,
    pending_minigame: Option<usize>,
    pending_melodies: Vec<(usize, SoundCue)>,
}

impl Level {
    pub(crate) fn new(
        level_id: u32,
        catalog: &RoomCatalog,
        canvas: Viewport,
        services: LevelServices,
    ) -> Result<Self, LevelError> {
        let room = catalog
            .room(level_id)
            .ok_or(LevelError::UnknownLevel { level_id })?;
        Self::from_room(room, canvas, services)
    }

    pub(crate) fn from_room(
        room: &RoomDef,
        canvas: Viewport,
        services: LevelServices,
    ) -> Result<Self, LevelError> {
        let mut level = Self::from_items(room.id, room.items.clone(), canvas, services)?;
        level.name = room.name.clone();
        level.background = room.background.clone();
        level.player_scale = room.player_scale;
        for line in &room.intro {
            level
                .services
                .messages
                .show(Message::new(line.as_str()).queued());
        }
        info!(
            level = level.level_id,
            name = %level.name,
            items = level.items.len(),
            "level_loaded"
        );
        Ok(level)
    }

    pub(crate) fn from_items(
        level_id: u32,
        specs: Vec<ItemSpec>,
        canvas: Viewport,
        services: LevelServices,
    ) -> Result<Self, LevelError> {
        let mut index_by_key = HashMap::with_capacity(specs.len());
        for (index, spec) in specs.iter().enumerate() {
            if index_by_key.insert(spec.key.clone(), index).is_some() {
                return Err(LevelError::DuplicateItemKey {
                    level_id,
                    key: spec.key.clone(),
                });
            }
        }

        let items: Vec<Item> = specs
            .into_iter()
            .map(|spec| Item::new(spec, canvas))
            .collect();

        let doors: Vec<usize> = (0..items.len()).filter(|i| items[*i].is_door()).collect();
        let door_index = match doors.as_slice() {
            [] => return Err(LevelError::MissingDoor { level_id }),
            [single] => *single,
            many => {
                return Err(LevelError::MultipleDoors {
                    level_id,
                    count: many.len(),
                })
            }
        };

        let mut unlock_edges = Vec::new();
        for (source, item) in items.iter().enumerate() {
            let mut targets = Vec::new();
            for target in item.unlock_targets() {
                let index = index_by_key.get(target).copied().ok_or_else(|| {
                    LevelError::UnknownUnlockTarget {
                        level_id,
                        item: item.key().to_string(),
                        target: target.to_string(),
                    }
                })?;
                targets.push(index);
            }
            if !targets.is_empty() {
                unlock_edges.push((source, targets));
            }
        }

        let mut level = Self {
            level_id,
            name: format!("level {level_id}"),
            background: String::new(),
            player_scale: 1.0,
            items,
            unlock_edges,
            door_index,
            remaining_puzzles: 0,
            puzzles_solved: 0,
            services,
            pending_minigame: None,
            pending_melodies: Vec::new(),
        };
        level.remaining_puzzles = level.count_remaining();
        Ok(level)
    }

    pub(crate) fn level_id(&self) -> u32 {
        self.level_id
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn player_scale(&self) -> f32 {
        self.player_scale
    }

    pub(crate) fn items(&self) -> &[Item] {
        &self.items
    }

    pub(crate) fn item(&self, key: &str) -> Option<&Item> {
        self.items.iter().find(|item| item.key() == key)
    }

    #[cfg(test)]
    pub(crate) fn index_of(&self, key: &str) -> Option<usize> {
        self.items.iter().position(|item| item.key() == key)
    }

    pub(crate) fn door(&self) -> &Item {
        &self.items[self.door_index]
    }

    pub(crate) fn remaining_puzzles(&self) -> usize {
        self.remaining_puzzles
    }

    pub(crate) fn puzzles_solved(&self) -> u32 {
        self.puzzles_solved
    }

    #[cfg(test)]
    pub(crate) fn pending_minigame(&self) -> Option<&super::minigames::MinigameSpec> {
        self.pending_minigame
            .and_then(|index| self.items.get(index))
            .and_then(Item::minigame)
    }

    pub(crate) fn is_awaiting_audio(&self) -> bool {
        !self.pending_melodies.is_empty()
    }

    /// Highlights only the closest enabled item; earlier items win exact ties.
    pub(crate) fn update_interactable(&mut self, player: &Rect) {
        let (px, py) = player.center();
        let mut closest: Option<(usize, i64)> = None;
        for (index, item) in self.items.iter().enumerate() {
            if !item.is_active || !item.interactable {
                continue;
            }
            let (cx, cy) = item.rect().center();
            let dx = i64::from(cx - px);
            let dy = i64::from(cy - py);
            let distance_sq = dx * dx + dy * dy;
            if closest.map_or(true, |(_, best)| distance_sq < best) {
                closest = Some((index, distance_sq));
            }
        }
        let chosen = closest.map(|(index, _)| index);
        for (index, item) in self.items.iter_mut().enumerate() {
            let is_chosen = chosen == Some(index);
            item.glow = is_chosen;
            item.can_interact_now = is_chosen;
        }
    }

    /// Refreshes the puzzle count, enables unlocked items and gates the door.
    /// True only once the unlocked door itself has been used.
    pub(crate) fn is_finished(&mut self) -> bool {
        self.remaining_puzzles = self.count_remaining();
        self.apply_unlocks();

        if self.remaining_puzzles != 0 {
            self.items[self.door_index].can_open = false;
            return false;
        }

        if !self.items[self.door_index].can_open {
            let door = &mut self.items[self.door_index];
            if let Some(sprite) = door.swap_sprite().cloned() {
                door.set_sprite(sprite);
            }
            door.can_open = true;
            self.services.sounds.play(SoundCue::DoorUnlocked);
            info!(level = self.level_id, door = door.key(), "door_unlocked");
        }
        self.items[self.door_index].is_finished
    }

    fn count_remaining(&self) -> usize {
        self.items
            .iter()
            .filter(|item| item.counts_toward_completion() && !item.is_finished)
            .count()
    }

    fn apply_unlocks(&mut self) {
        for (source, targets) in &self.unlock_edges {
            if !self.items[*source].is_finished {
                continue;
            }
            for target in targets {
                let item = &mut self.items[*target];
                if item.reinteractable && !item.interactable {
                    item.interactable = true;
                    debug!(level = self.level_id, item = item.key(), "item_enabled");
                }
            }
        }
    }

    /// The single item the player could use right now, if any.
    pub(crate) fn interactable_index_for(&self, player: &Rect) -> Option<usize> {
        self.items
            .iter()
            .position(|item| item.accepts_interaction(player))
    }

    pub(crate) fn interact(&mut self, index: usize, session: &mut Session) -> Interaction {
        if self.pending_minigame == Some(index)
            || self.pending_melodies.iter().any(|(pending, _)| *pending == index)
        {
            return Interaction::Done;
        }
        let Some(item) = self.items.get_mut(index) else {
            return Interaction::Done;
        };
        let outcome = {
            let mut ctx = InteractContext {
                flags: session.flags_mut(),
                messages: self.services.messages.as_ref(),
                sounds: self.services.sounds.as_ref(),
                remaining_puzzles: self.remaining_puzzles,
                puzzles_solved: &mut self.puzzles_solved,
            };
            interaction::interact(item, &mut ctx)
        };
        info!(
            level = self.level_id,
            item = item.key(),
            kind = item.kind().as_token(),
            finished = item.is_finished,
            "item_interacted"
        );
        match &outcome {
            Interaction::StartMinigame(spec) => {
                self.pending_minigame = Some(index);
                info!(level = self.level_id, minigame = spec.name(), "minigame_started");
            }
            Interaction::AwaitingAudio(cue) => self.pending_melodies.push((index, *cue)),
            Interaction::Done => {}
        }
        outcome
    }

    /// Routes a finished minigame to the item that started it.
    pub(crate) fn resolve_minigame(&mut self, outcome: MinigameOutcome, session: &mut Session) -> bool {
        let Some(index) = self.pending_minigame.take() else {
            return false;
        };
        let Some(item) = self.items.get_mut(index) else {
            return false;
        };
        let mut ctx = InteractContext {
            flags: session.flags_mut(),
            messages: self.services.messages.as_ref(),
            sounds: self.services.sounds.as_ref(),
            remaining_puzzles: self.remaining_puzzles,
            puzzles_solved: &mut self.puzzles_solved,
        };
        let solved = interaction::resolve_minigame(item, outcome, &mut ctx);
        info!(
            level = self.level_id,
            item = item.key(),
            outcome = ?outcome,
            solved,
            "minigame_finished"
        );
        solved
    }

    /// Completes melody items whose cue has stopped playing.
    pub(crate) fn poll_deferred(&mut self, session: &mut Session) {
        if self.pending_melodies.is_empty() {
            return;
        }
        let sounds = Rc::clone(&self.services.sounds);
        let (ready, waiting): (Vec<_>, Vec<_>) = self
            .pending_melodies
            .drain(..)
            .partition(|(_, cue)| !sounds.is_playing(*cue));
        self.pending_melodies = waiting;
        for (index, _) in ready {
            let Some(item) = self.items.get_mut(index) else {
                continue;
            };
            let mut ctx = InteractContext {
                flags: session.flags_mut(),
                messages: self.services.messages.as_ref(),
                sounds: sounds.as_ref(),
                remaining_puzzles: self.remaining_puzzles,
                puzzles_solved: &mut self.puzzles_solved,
            };
            interaction::complete(item, &mut ctx);
            info!(level = self.level_id, item = item.key(), "melody_finished");
        }
    }

    pub(crate) fn update_hints(&mut self, player: &Rect, now: f64, delay_secs: f64) {
        for item in &mut self.items {
            if let Some(hint) = item.track_proximity(player, now, delay_secs) {
                self.services.messages.show(Message::new(hint));
            }
        }
    }

    pub(crate) fn draw(&self, canvas: &mut dyn Canvas, player: &Rect) {
        if !self.background.is_empty() {
            let (width, height) = canvas.logical_size();
            canvas.blit_sprite(
                &self.background,
                Rect::new(0, 0, width as i32, height as i32),
                false,
            );
        }
        for item in &self.items {
            item.draw(canvas, player);
        }
    }

    /// Undoes the part of the move that ran into a solid item, so the player slides along it.
    pub(crate) fn collide_player(&self, old: Rect, player: &mut Rect, dx: i32, dy: i32) {
        let blocked = |rect: &Rect| {
            self.items
                .iter()
                .any(|item| item.collision && item.collides_with(rect))
        };
        if !blocked(player) {
            return;
        }
        let mut resolved = *player;
        if dx != 0 && blocked(&Rect { y: old.y, ..*player }) {
            resolved.x = old.x;
        }
        if dy != 0 && blocked(&Rect { x: old.x, ..*player }) {
            resolved.y = old.y;
        }
        if blocked(&resolved) {
            if dx != 0 {
                resolved.x = old.x;
            }
            if dy != 0 {
                resolved.y = old.y;
            }
        }
        *player = resolved;
    }
}

#[cfg(test)]
pub(crate) fn item_mut<'a>(level: &'a mut Level, key: &str) -> &'a mut Item {
    level
        .items
        .iter_mut()
        .find(|item| item.key() == key)
        .unwrap_or_else(|| panic!("no item `{key}`"))
}
