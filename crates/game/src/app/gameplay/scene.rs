use std::rc::Rc;

use engine::{Canvas, InputAction, InputSnapshot, Rect, Rgba, Scene, SceneCommand, Viewport};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{error, info};

use super::interaction::Interaction;
use super::level::{Level, LevelError, LevelServices};
use super::message::{Message, MessageBoard, MessageSink};
use super::minigames::{start_minigame, Minigame};
use super::player::Player;
use super::session::Session;
use super::sound::TimedSoundBoard;
use crate::app::content::RoomCatalog;
use crate::app::settings::GameSettings;

const CLEAR_COLOR: Rgba = [18, 16, 22, 255];
const ESCAPED_COLOR: Rgba = [236, 228, 200, 255];
const MESSAGE_BAR_COLOR: Rgba = [0, 0, 0, 170];
const ESCAPED_TEXT: &str = "You escaped! Press Enter or Esc to leave.";
const ESCAPED_MESSAGE_SECS: f32 = 3600.0;

enum Phase {
    Exploring,
    Minigame(Box<dyn Minigame>),
    Escaped,
}

/// One playthrough: the current room, the player walking it, and any minigame on top.
pub(crate) struct EscapeScene {
    catalog: RoomCatalog,
    canvas: Viewport,
    window_title: String,
    hint_delay_secs: f64,
    messages: Rc<MessageBoard>,
    sounds: Rc<TimedSoundBoard>,
    rng: StdRng,
    session: Session,
    level: Level,
    player: Player,
    phase: Phase,
}

impl EscapeScene {
    pub(crate) fn new(
        catalog: RoomCatalog,
        settings: &GameSettings,
        canvas: Viewport,
    ) -> Result<Self, LevelError> {
        let messages = Rc::new(MessageBoard::new(
            settings.message_duration_secs,
            settings.message_size,
        ));
        let sounds = Rc::new(TimedSoundBoard::new());
        let rng = match settings.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let level = Level::new(
            settings.start_level,
            &catalog,
            canvas,
            services(&messages, &sounds),
        )?;
        let mut player = Player::new(
            canvas,
            settings.player_speed_px,
            settings.walk_top_limit_px,
            settings.interact_cooldown_secs,
        );
        player.resize(level.player_scale());

        Ok(Self {
            catalog,
            canvas,
            window_title: settings.window_title.clone(),
            hint_delay_secs: settings.hint_delay_secs,
            messages,
            sounds,
            rng,
            session: Session::new(),
            level,
            player,
            phase: Phase::Exploring,
        })
    }

    fn update_exploring(&mut self, input: &InputSnapshot) -> SceneCommand {
        if input.was_pressed(InputAction::Cancel) {
            info!(level = self.level.level_id(), "shutdown_requested");
            return SceneCommand::Quit;
        }

        let movement = self.player.handle_input(input);
        self.level.collide_player(
            movement.old,
            self.player.rect_mut(),
            movement.dx,
            movement.dy,
        );
        self.player.animate(self.sounds.as_ref());

        let player_rect = self.player.rect();
        let now = self.session.now();
        self.level.update_interactable(&player_rect);
        self.level.update_hints(&player_rect, now, self.hint_delay_secs);

        if input.was_pressed(InputAction::Interact) {
            let interaction = self.player.try_interact(
                now,
                &mut self.level,
                &mut self.session,
                self.sounds.as_ref(),
            );
            if let Some(Interaction::StartMinigame(spec)) = interaction {
                self.phase = Phase::Minigame(start_minigame(&spec, &mut self.rng));
                return SceneCommand::None;
            }
        }

        self.level.poll_deferred(&mut self.session);
        if self.level.is_finished() {
            return self.advance_level();
        }
        SceneCommand::None
    }

    fn advance_level(&mut self) -> SceneCommand {
        let cleared = self.session.record_level_cleared();
        info!(
            level = self.level.level_id(),
            puzzles_solved = self.level.puzzles_solved(),
            levels_cleared = cleared,
            "level_completed"
        );

        let next_id = self.level.level_id() + 1;
        if next_id > self.catalog.max_level_id() {
            self.phase = Phase::Escaped;
            self.messages
                .show(Message::new(ESCAPED_TEXT).with_duration(ESCAPED_MESSAGE_SECS));
            info!(
                levels_cleared = cleared,
                elapsed_secs = self.session.now(),
                "playthrough_complete"
            );
            return SceneCommand::None;
        }

        match Level::new(
            next_id,
            &self.catalog,
            self.canvas,
            services(&self.messages, &self.sounds),
        ) {
            Ok(level) => {
                self.level = level;
                self.player.recenter();
                self.player.resize(self.level.player_scale());
                SceneCommand::None
            }
            Err(err) => {
                error!(error = %err, level = next_id, "level_load_failed");
                SceneCommand::Quit
            }
        }
    }

    fn draw_message_bar(&self, canvas: &mut dyn Canvas) {
        let Some(shown) = self.messages.current() else {
            return;
        };
        let (width, height) = canvas.logical_size();
        let bar_height = i32::from(shown.size) * 3;
        canvas.fill_rect(
            Rect::new(0, height as i32 - bar_height, width as i32, bar_height),
            MESSAGE_BAR_COLOR,
        );
    }
}

fn services(messages: &Rc<MessageBoard>, sounds: &Rc<TimedSoundBoard>) -> LevelServices {
    LevelServices {
        messages: messages.clone(),
        sounds: sounds.clone(),
    }
}

impl Scene for EscapeScene {
    fn load(&mut self) {
        info!(
            level = self.level.level_id(),
            name = self.level.name(),
            rooms = self.catalog.len(),
            "scene_loaded"
        );
    }

    fn update(&mut self, fixed_dt_seconds: f32, input: &InputSnapshot) -> SceneCommand {
        if input.quit_requested() {
            info!(level = self.level.level_id(), "shutdown_requested");
            return SceneCommand::Quit;
        }
        self.session.advance_clock(fixed_dt_seconds);
        self.messages.advance(fixed_dt_seconds);
        self.sounds.advance(fixed_dt_seconds);

        if let Phase::Minigame(game) = &mut self.phase {
            if let Some(outcome) = game.update(fixed_dt_seconds, input, self.sounds.as_ref()) {
                self.phase = Phase::Exploring;
                self.level.resolve_minigame(outcome, &mut self.session);
            }
            return SceneCommand::None;
        }
        if matches!(self.phase, Phase::Escaped) {
            if input.was_pressed(InputAction::Confirm) || input.was_pressed(InputAction::Cancel) {
                info!("shutdown_requested");
                return SceneCommand::Quit;
            }
            return SceneCommand::None;
        }
        self.update_exploring(input)
    }

    fn render(&mut self, canvas: &mut dyn Canvas) {
        match &self.phase {
            Phase::Exploring => {
                canvas.clear(CLEAR_COLOR);
                let player_rect = self.player.rect();
                self.level.draw(canvas, &player_rect);
                self.player.draw(canvas);
            }
            Phase::Minigame(game) => {
                canvas.clear(CLEAR_COLOR);
                game.render(canvas);
            }
            Phase::Escaped => canvas.clear(ESCAPED_COLOR),
        }
        self.draw_message_bar(canvas);
    }

    fn unload(&mut self) {
        info!(
            level = self.level.level_id(),
            levels_cleared = self.session.levels_cleared(),
            flags = self.session.flags().len(),
            "scene_unload"
        );
    }

    /// No text rendering, so the current message rides in the window title.
    fn title(&self) -> Option<String> {
        let status = match &self.phase {
            Phase::Minigame(game) => Some(game.status_line()),
            Phase::Exploring | Phase::Escaped => self.messages.current().map(|shown| shown.text),
        };
        let base = format!("{} | {}", self.window_title, self.level.name());
        Some(match status {
            Some(status) => format!("{base} | {status}"),
            None => base,
        })
    }
}

#[cfg(test)]
impl EscapeScene {
    pub(crate) fn level(&self) -> &Level {
        &self.level
    }

    pub(crate) fn player_mut(&mut self) -> &mut Player {
        &mut self.player
    }

    pub(crate) fn session(&self) -> &Session {
        &self.session
    }

    pub(crate) fn in_minigame(&self) -> bool {
        matches!(self.phase, Phase::Minigame(_))
    }

    pub(crate) fn is_escaped(&self) -> bool {
        matches!(self.phase, Phase::Escaped)
    }

    pub(crate) fn current_message(&self) -> Option<String> {
        self.messages.current().map(|shown| shown.text)
    }
}
