use engine::{room_to_screen_px, Canvas, Rect, Rgba, Viewport};

use super::minigames::MinigameSpec;
use super::session::SessionFlag;
use super::sound::SoundCue;

pub(crate) const MIN_INTERACT_RADIUS_PX: i32 = 150;
const GLOW_COLOR: Rgba = [255, 255, 210, 90];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum ItemKind {
    Door,
    Carpet,
    Picture,
    Statue,
    Knife,
    Shovel,
    Trash,
    Chest,
    MusicBox,
    Bookshelf,
    Dresser,
    Microwave,
    Ladder,
    SmokeDetector,
    Nightlight,
    ColorCode,
    HammerChest,
    Hole,
    Vent,
    Barrel,
    CheeseToy,
    Mouse,
    PowerBank,
    CodeBox,
    Barrier,
}

impl ItemKind {
    pub(crate) const ALL: [ItemKind; 25] = [
        ItemKind::Door,
        ItemKind::Carpet,
        ItemKind::Picture,
        ItemKind::Statue,
        ItemKind::Knife,
        ItemKind::Shovel,
        ItemKind::Trash,
        ItemKind::Chest,
        ItemKind::MusicBox,
        ItemKind::Bookshelf,
        ItemKind::Dresser,
        ItemKind::Microwave,
        ItemKind::Ladder,
        ItemKind::SmokeDetector,
        ItemKind::Nightlight,
        ItemKind::ColorCode,
        ItemKind::HammerChest,
        ItemKind::Hole,
        ItemKind::Vent,
        ItemKind::Barrel,
        ItemKind::CheeseToy,
        ItemKind::Mouse,
        ItemKind::PowerBank,
        ItemKind::CodeBox,
        ItemKind::Barrier,
    ];

    pub(crate) const fn as_token(self) -> &'static str {
        match self {
            ItemKind::Door => "door",
            ItemKind::Carpet => "carpet",
            ItemKind::Picture => "picture",
            ItemKind::Statue => "statue",
            ItemKind::Knife => "knife",
            ItemKind::Shovel => "shovel",
            ItemKind::Trash => "trash",
            ItemKind::Chest => "chest",
            ItemKind::MusicBox => "music_box",
            ItemKind::Bookshelf => "bookshelf",
            ItemKind::Dresser => "dresser",
            ItemKind::Microwave => "microwave",
            ItemKind::Ladder => "ladder",
            ItemKind::SmokeDetector => "smoke_detector",
            ItemKind::Nightlight => "nightlight",
            ItemKind::ColorCode => "color_code",
            ItemKind::HammerChest => "hammer_chest",
            ItemKind::Hole => "hole",
            ItemKind::Vent => "vent",
            ItemKind::Barrel => "barrel",
            ItemKind::CheeseToy => "cheese_toy",
            ItemKind::Mouse => "mouse",
            ItemKind::PowerBank => "power_bank",
            ItemKind::CodeBox => "code_box",
            ItemKind::Barrier => "barrier",
        }
    }

    pub(crate) fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_token() == token)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SpriteRef {
    pub(crate) key: String,
    pub(crate) width: u32,
    pub(crate) height: u32,
}

impl SpriteRef {
    pub(crate) fn new(key: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            key: key.into(),
            width,
            height,
        }
    }
}

/// Behavior tags. The level and the interaction pipeline read these, never the kind.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Capability {
    ExitDoor,
    GatesOnFlag(SessionFlag),
    ProducesFlag(SessionFlag),
    Unlocks(Vec<String>),
    RunsMinigame(MinigameSpec),
    PlaysMelody(SoundCue),
    MovesTo((i32, i32)),
    SwapsSprite(SpriteRef),
    ConsumedOnSuccess,
    CountsAsSolve,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct ItemTexts {
    pub(crate) success: Option<String>,
    pub(crate) failure: Option<String>,
    pub(crate) locked: Option<String>,
    pub(crate) hint: Option<String>,
}

/// Placement and behavior of one item, as declared by room content.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ItemSpec {
    pub(crate) key: String,
    pub(crate) kind: ItemKind,
    pub(crate) name: String,
    pub(crate) sprite: SpriteRef,
    pub(crate) position: (i32, i32),
    pub(crate) scale: (f32, f32),
    pub(crate) collision: bool,
    pub(crate) interactable: bool,
    pub(crate) reinteractable: bool,
    pub(crate) never_interactable: bool,
    pub(crate) capabilities: Vec<Capability>,
    pub(crate) texts: ItemTexts,
}

impl ItemSpec {
    pub(crate) fn new(key: &str, kind: ItemKind, name: &str, sprite: SpriteRef) -> Self {
        Self {
            key: key.to_string(),
            kind,
            name: name.to_string(),
            sprite,
            position: (0, 0),
            scale: (1.0, 1.0),
            collision: false,
            interactable: true,
            reinteractable: true,
            never_interactable: false,
            capabilities: Vec::new(),
            texts: ItemTexts::default(),
        }
    }

    pub(crate) fn at(mut self, x: i32, y: i32) -> Self {
        self.position = (x, y);
        self
    }

    pub(crate) fn locked(mut self) -> Self {
        self.interactable = false;
        self
    }

    pub(crate) fn colliding(mut self) -> Self {
        self.collision = true;
        self
    }

    pub(crate) fn decorative(mut self) -> Self {
        self.never_interactable = true;
        self
    }

    pub(crate) fn with(mut self, capability: Capability) -> Self {
        self.capabilities.push(capability);
        self
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Item {
    key: String,
    name: String,
    kind: ItemKind,
    sprite: SpriteRef,
    rect: Rect,
    interact_radius: (i32, i32),
    canvas: Viewport,
    capabilities: Vec<Capability>,
    texts: ItemTexts,
    near_since: Option<f64>,
    hint_fired: bool,
    pub(crate) is_active: bool,
    pub(crate) interactable: bool,
    pub(crate) reinteractable: bool,
    pub(crate) is_finished: bool,
    pub(crate) collision: bool,
    pub(crate) glow: bool,
    pub(crate) can_interact_now: bool,
    pub(crate) never_interactable: bool,
    /// Only meaningful for the exit door; set by the level once every puzzle is done.
    pub(crate) can_open: bool,
}

impl Item {
    pub(crate) fn new(spec: ItemSpec, canvas: Viewport) -> Self {
        let (width, height) = scaled_size(&spec.sprite, spec.scale);
        let rect = place_in_room(spec.position, width, height, canvas);
        let never_interactable = spec.never_interactable;
        Self {
            key: spec.key,
            name: spec.name,
            kind: spec.kind,
            sprite: spec.sprite,
            rect,
            interact_radius: (
                width.max(MIN_INTERACT_RADIUS_PX),
                height.max(MIN_INTERACT_RADIUS_PX),
            ),
            canvas,
            capabilities: spec.capabilities,
            texts: spec.texts,
            near_since: None,
            hint_fired: false,
            is_active: true,
            interactable: spec.interactable && !never_interactable,
            reinteractable: spec.reinteractable && !never_interactable,
            is_finished: never_interactable,
            collision: spec.collision,
            glow: false,
            can_interact_now: false,
            never_interactable,
            can_open: false,
        }
    }

    pub(crate) fn key(&self) -> &str {
        &self.key
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn kind(&self) -> ItemKind {
        self.kind
    }

    pub(crate) fn rect(&self) -> Rect {
        self.rect
    }

    pub(crate) fn interact_radius(&self) -> (i32, i32) {
        self.interact_radius
    }

    pub(crate) fn sprite_key(&self) -> &str {
        &self.sprite.key
    }

    /// Rectangular proximity: both axis deltas must be strictly inside the radius.
    pub(crate) fn is_near(&self, player: &Rect) -> bool {
        let (cx, cy) = self.rect.center();
        let (px, py) = player.center();
        (cx - px).abs() < self.interact_radius.0 && (cy - py).abs() < self.interact_radius.1
    }

    pub(crate) fn collides_with(&self, other: &Rect) -> bool {
        self.is_active && self.rect.intersects(other)
    }

    pub(crate) fn shows_glow(&self, player: &Rect) -> bool {
        self.is_active && self.is_near(player) && self.interactable && self.glow && self.reinteractable
    }

    pub(crate) fn accepts_interaction(&self, player: &Rect) -> bool {
        self.is_active
            && self.is_near(player)
            && self.interactable
            && self.reinteractable
            && self.can_interact_now
    }

    /// Scripted repositioning. The new center is clamped like the initial one.
    pub(crate) fn move_to(&mut self, position: (i32, i32)) {
        self.rect = place_in_room(position, self.rect.w, self.rect.h, self.canvas);
    }

    /// Keeps the current rect; the new art is stretched to it.
    pub(crate) fn set_sprite(&mut self, sprite: SpriteRef) {
        self.sprite = sprite;
    }

    pub(crate) fn is_door(&self) -> bool {
        self.capabilities
            .iter()
            .any(|capability| matches!(capability, Capability::ExitDoor))
    }

    pub(crate) fn counts_toward_completion(&self) -> bool {
        !self.is_door() && !self.never_interactable
    }

    pub(crate) fn gate_flag(&self) -> Option<SessionFlag> {
        self.capabilities.iter().find_map(|capability| match capability {
            Capability::GatesOnFlag(flag) => Some(*flag),
            _ => None,
        })
    }

    pub(crate) fn produced_flag(&self) -> Option<SessionFlag> {
        self.capabilities.iter().find_map(|capability| match capability {
            Capability::ProducesFlag(flag) => Some(*flag),
            _ => None,
        })
    }

    pub(crate) fn unlock_targets(&self) -> impl Iterator<Item = &str> {
        self.capabilities
            .iter()
            .filter_map(|capability| match capability {
                Capability::Unlocks(keys) => Some(keys),
                _ => None,
            })
            .flatten()
            .map(String::as_str)
    }

    pub(crate) fn minigame(&self) -> Option<&MinigameSpec> {
        self.capabilities.iter().find_map(|capability| match capability {
            Capability::RunsMinigame(spec) => Some(spec),
            _ => None,
        })
    }

    pub(crate) fn melody(&self) -> Option<SoundCue> {
        self.capabilities.iter().find_map(|capability| match capability {
            Capability::PlaysMelody(cue) => Some(*cue),
            _ => None,
        })
    }

    pub(crate) fn move_target(&self) -> Option<(i32, i32)> {
        self.capabilities.iter().find_map(|capability| match capability {
            Capability::MovesTo(position) => Some(*position),
            _ => None,
        })
    }

    pub(crate) fn swap_sprite(&self) -> Option<&SpriteRef> {
        self.capabilities.iter().find_map(|capability| match capability {
            Capability::SwapsSprite(sprite) => Some(sprite),
            _ => None,
        })
    }

    pub(crate) fn is_consumed_on_success(&self) -> bool {
        self.capabilities
            .iter()
            .any(|capability| matches!(capability, Capability::ConsumedOnSuccess))
    }

    pub(crate) fn counts_as_solve(&self) -> bool {
        self.capabilities
            .iter()
            .any(|capability| matches!(capability, Capability::CountsAsSolve))
    }

    pub(crate) fn success_text(&self) -> String {
        self.texts
            .success
            .clone()
            .unwrap_or_else(|| format!("The {} is taken care of.", self.name))
    }

    pub(crate) fn failure_text(&self) -> String {
        self.texts
            .failure
            .clone()
            .unwrap_or_else(|| format!("I can't do anything with the {} yet.", self.name))
    }

    pub(crate) fn locked_text(&self, remaining: usize) -> String {
        match &self.texts.locked {
            Some(text) => text.replace("{remaining}", &remaining.to_string()),
            None => format!("The {} is locked. {remaining} puzzles remain.", self.name),
        }
    }

    fn hint_text(&self) -> String {
        self.texts
            .hint
            .clone()
            .unwrap_or_else(|| format!("Press E to inspect the {}.", self.name))
    }

    /// Returns the hint once per continuous stretch of highlighted proximity.
    pub(crate) fn track_proximity(
        &mut self,
        player: &Rect,
        now: f64,
        delay_secs: f64,
    ) -> Option<String> {
        if !self.shows_glow(player) {
            self.near_since = None;
            self.hint_fired = false;
            return None;
        }
        let since = *self.near_since.get_or_insert(now);
        if self.hint_fired || now - since < delay_secs {
            return None;
        }
        self.hint_fired = true;
        Some(self.hint_text())
    }

    pub(crate) fn draw(&self, canvas: &mut dyn Canvas, player: &Rect) {
        if !self.is_active {
            return;
        }
        canvas.blit_sprite(&self.sprite.key, self.rect, false);
        if self.shows_glow(player) {
            canvas.fill_rect(self.rect, GLOW_COLOR);
        }
    }
}

fn scaled_size(sprite: &SpriteRef, scale: (f32, f32)) -> (i32, i32) {
    let axis = |native: u32, factor: f32| {
        let factor = if factor.is_finite() && factor > 0.0 {
            factor
        } else {
            1.0
        };
        ((native as f32 * factor).round() as i32).max(1)
    };
    (axis(sprite.width, scale.0), axis(sprite.height, scale.1))
}

/// Clamps the room position so the rect stays inside the canvas, then converts to screen space.
fn place_in_room(position: (i32, i32), width: i32, height: i32, canvas: Viewport) -> Rect {
    let half_width = (canvas.width / 2) as i32;
    let half_height = (canvas.height / 2) as i32;
    let x = position.0.min(half_width - width / 2).max(-half_width + width / 2);
    let y = position.1.min(half_height - height / 2).max(-half_height + height / 2);
    Rect::from_center(room_to_screen_px(x, y, canvas), width, height)
}
