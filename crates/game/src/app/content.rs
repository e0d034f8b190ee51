use std::collections::{HashMap, HashSet};
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use engine::validate_sprite_key;
use roxmltree::{Document, Node};

use super::gameplay::{
    Capability, ItemKind, ItemSpec, ItemTexts, MinigameSpec, SessionFlag, SoundCue, SpriteRef,
};

const BUILTIN_ROOMS_XML: &str = include_str!("../../assets/rooms.xml");
const BUILTIN_SOURCE_NAME: &str = "builtin:rooms.xml";
const DEFAULT_COLOR_SEQUENCE_LEN: usize = 4;
const DEFAULT_WHACK_DURATION_SECS: f32 = 15.0;

const ROOM_ATTRIBUTES: &[&str] = &["id", "name", "background", "player_scale"];
const ITEM_ATTRIBUTES: &[&str] = &[
    "key",
    "kind",
    "name",
    "sprite",
    "sprite_size",
    "pos",
    "size",
    "collision",
    "interactable",
    "reinteractable",
    "never_interactable",
    "requires",
    "produces",
    "unlocks",
    "consumed",
    "scores",
    "moves_to",
    "open_sprite",
    "melody",
    "minigame",
    "length",
    "code",
    "books",
    "solution",
    "win_score",
    "duration_secs",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SourceLocation {
    pub(crate) line: usize,
    pub(crate) column: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ContentErrorCode {
    ReadFile,
    XmlMalformed,
    InvalidRoot,
    UnknownElement,
    UnknownAttribute,
    MissingAttribute,
    InvalidValue,
    DuplicateRoom,
    NonContiguousRooms,
    DuplicateItemKey,
    DoorCount,
    UnknownUnlockTarget,
    FlagProducedInSeveralRooms,
}

#[derive(Debug, Clone)]
pub(crate) struct ContentError {
    pub(crate) code: ContentErrorCode,
    pub(crate) message: String,
    pub(crate) source_name: String,
    pub(crate) location: Option<SourceLocation>,
}

impl fmt::Display for ContentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.location {
            Some(loc) => write!(
                f,
                "{:?}: {} (file={}, line={}, column={})",
                self.code, self.message, self.source_name, loc.line, loc.column
            ),
            None => write!(
                f,
                "{:?}: {} (file={})",
                self.code, self.message, self.source_name
            ),
        }
    }
}

impl std::error::Error for ContentError {}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RoomDef {
    pub(crate) id: u32,
    pub(crate) name: String,
    pub(crate) background: String,
    pub(crate) player_scale: f32,
    pub(crate) intro: Vec<String>,
    pub(crate) items: Vec<ItemSpec>,
}

/// Every room of a playthrough, ordered by id starting at 1.
#[derive(Debug, Clone)]
pub(crate) struct RoomCatalog {
    rooms: Vec<RoomDef>,
}

impl RoomCatalog {
    pub(crate) fn builtin() -> Result<Self, ContentError> {
        Self::parse(BUILTIN_ROOMS_XML, BUILTIN_SOURCE_NAME)
    }

    pub(crate) fn load(path: &Path) -> Result<Self, ContentError> {
        let raw = fs::read_to_string(path).map_err(|error| ContentError {
            code: ContentErrorCode::ReadFile,
            message: format!("failed to read rooms file: {error}"),
            source_name: path.display().to_string(),
            location: None,
        })?;
        Self::parse(&raw, &path.display().to_string())
    }

    pub(crate) fn parse(raw: &str, source_name: &str) -> Result<Self, ContentError> {
        let doc = Document::parse(raw).map_err(|error| ContentError {
            code: ContentErrorCode::XmlMalformed,
            message: format!("malformed XML: {error}"),
            source_name: source_name.to_string(),
            location: Some(SourceLocation {
                line: error.pos().row as usize,
                column: error.pos().col as usize,
            }),
        })?;
        let parser = Parser {
            source_name,
            doc: &doc,
        };
        let mut rooms = parser.parse_rooms()?;
        rooms.sort_by_key(|room| room.id);
        for (expected, room) in (1u32..).zip(&rooms) {
            if room.id != expected {
                return Err(ContentError {
                    code: ContentErrorCode::NonContiguousRooms,
                    message: format!(
                        "room ids must run 1..{} without gaps; expected {expected}, found {}",
                        rooms.len(),
                        room.id
                    ),
                    source_name: source_name.to_string(),
                    location: None,
                });
            }
        }
        check_flag_owners(&rooms, source_name)?;
        Ok(Self { rooms })
    }

    pub(crate) fn room(&self, id: u32) -> Option<&RoomDef> {
        self.rooms.iter().find(|room| room.id == id)
    }

    #[cfg(test)]
    pub(crate) fn rooms(&self) -> &[RoomDef] {
        &self.rooms
    }

    pub(crate) fn max_level_id(&self) -> u32 {
        self.rooms.last().map_or(0, |room| room.id)
    }

    pub(crate) fn len(&self) -> usize {
        self.rooms.len()
    }
}

/// Flags outlive the room that set them, so each one may only be produced in a single room.
fn check_flag_owners(rooms: &[RoomDef], source_name: &str) -> Result<(), ContentError> {
    let mut owners: HashMap<SessionFlag, u32> = HashMap::new();
    for room in rooms {
        let produced = room
            .items
            .iter()
            .flat_map(|item| &item.capabilities)
            .filter_map(|capability| match capability {
                Capability::ProducesFlag(flag) => Some(*flag),
                _ => None,
            });
        for flag in produced {
            let owner = *owners.entry(flag).or_insert(room.id);
            if owner != room.id {
                return Err(ContentError {
                    code: ContentErrorCode::FlagProducedInSeveralRooms,
                    message: format!(
                        "flag '{flag}' is produced in room {owner} and again in room {}",
                        room.id
                    ),
                    source_name: source_name.to_string(),
                    location: None,
                });
            }
        }
    }
    Ok(())
}

struct Parser<'a, 'input> {
    source_name: &'a str,
    doc: &'a Document<'input>,
}

impl<'a, 'input> Parser<'a, 'input> {
    fn error_at(&self, code: ContentErrorCode, message: String, node: Node<'_, '_>) -> ContentError {
        let pos = self.doc.text_pos_at(node.range().start);
        ContentError {
            code,
            message,
            source_name: self.source_name.to_string(),
            location: Some(SourceLocation {
                line: pos.row as usize,
                column: pos.col as usize,
            }),
        }
    }

    fn parse_rooms(&self) -> Result<Vec<RoomDef>, ContentError> {
        let root = self.doc.root_element();
        if root.tag_name().name() != "Rooms" {
            return Err(self.error_at(
                ContentErrorCode::InvalidRoot,
                "root element must be <Rooms>".to_string(),
                root,
            ));
        }

        let mut seen_ids = HashSet::new();
        let mut rooms = Vec::new();
        for child in root.children().filter(|node| node.is_element()) {
            if child.tag_name().name() != "Room" {
                return Err(self.error_at(
                    ContentErrorCode::UnknownElement,
                    format!("unsupported element <{}> in <Rooms>", child.tag_name().name()),
                    child,
                ));
            }
            let room = self.parse_room(child)?;
            if !seen_ids.insert(room.id) {
                return Err(self.error_at(
                    ContentErrorCode::DuplicateRoom,
                    format!("room id {} is declared more than once", room.id),
                    child,
                ));
            }
            rooms.push(room);
        }

        if rooms.is_empty() {
            return Err(self.error_at(
                ContentErrorCode::InvalidRoot,
                "<Rooms> must declare at least one <Room>".to_string(),
                root,
            ));
        }
        Ok(rooms)
    }

    fn parse_room(&self, node: Node<'_, '_>) -> Result<RoomDef, ContentError> {
        self.reject_unknown_attributes(node, ROOM_ATTRIBUTES)?;
        let id: u32 = self.parsed_attr(node, "id")?.ok_or_else(|| self.missing(node, "id"))?;
        if id == 0 {
            return Err(self.error_at(
                ContentErrorCode::InvalidValue,
                "room id must be at least 1".to_string(),
                node,
            ));
        }
        let name = self.required_attr(node, "name")?.to_string();
        let background = self.sprite_attr(node, "background")?.unwrap_or_default();
        let player_scale: f32 = self.parsed_attr(node, "player_scale")?.unwrap_or(1.0);
        if !player_scale.is_finite() || player_scale <= 0.0 {
            return Err(self.error_at(
                ContentErrorCode::InvalidValue,
                "player_scale must be finite and > 0".to_string(),
                node,
            ));
        }

        let mut intro = Vec::new();
        let mut items = Vec::new();
        let mut keys = HashSet::new();
        let mut doors = 0usize;
        for child in node.children().filter(|child| child.is_element()) {
            match child.tag_name().name() {
                "Intro" => intro.push(self.required_text(child)?),
                "Item" => {
                    let item = self.parse_item(child)?;
                    if !keys.insert(item.key.clone()) {
                        return Err(self.error_at(
                            ContentErrorCode::DuplicateItemKey,
                            format!("item key '{}' is used twice in room {id}", item.key),
                            child,
                        ));
                    }
                    if item.kind == ItemKind::Door {
                        doors += 1;
                    }
                    items.push(item);
                }
                other => {
                    return Err(self.error_at(
                        ContentErrorCode::UnknownElement,
                        format!("unsupported element <{other}> in <Room>"),
                        child,
                    ))
                }
            }
        }

        if doors != 1 {
            return Err(self.error_at(
                ContentErrorCode::DoorCount,
                format!("room {id} must contain exactly one door, found {doors}"),
                node,
            ));
        }
        for item in &items {
            for capability in &item.capabilities {
                let Capability::Unlocks(targets) = capability else {
                    continue;
                };
                if let Some(missing) = targets.iter().find(|target| !keys.contains(*target)) {
                    return Err(self.error_at(
                        ContentErrorCode::UnknownUnlockTarget,
                        format!(
                            "item '{}' in room {id} unlocks unknown item '{missing}'",
                            item.key
                        ),
                        node,
                    ));
                }
            }
        }

        Ok(RoomDef {
            id,
            name,
            background,
            player_scale,
            intro,
            items,
        })
    }

    fn parse_item(&self, node: Node<'_, '_>) -> Result<ItemSpec, ContentError> {
        self.reject_unknown_attributes(node, ITEM_ATTRIBUTES)?;
        let key = self.required_attr(node, "key")?;
        let kind_token = self.required_attr(node, "kind")?;
        let kind = ItemKind::from_token(kind_token).ok_or_else(|| {
            self.error_at(
                ContentErrorCode::InvalidValue,
                format!("unknown item kind '{kind_token}'"),
                node,
            )
        })?;
        let name = node.attribute("name").unwrap_or(key);
        let sprite_key = self
            .sprite_attr(node, "sprite")?
            .ok_or_else(|| self.missing(node, "sprite"))?;
        let (width, height): (u32, u32) = self
            .pair_attr(node, "sprite_size")?
            .ok_or_else(|| self.missing(node, "sprite_size"))?;

        let mut spec = ItemSpec::new(key, kind, name, SpriteRef::new(sprite_key, width, height));
        spec.position = self.pair_attr(node, "pos")?.unwrap_or((0, 0));
        let scale: (f32, f32) = self.pair_attr(node, "size")?.unwrap_or((1.0, 1.0));
        if !(scale.0.is_finite() && scale.1.is_finite() && scale.0 > 0.0 && scale.1 > 0.0) {
            return Err(self.error_at(
                ContentErrorCode::InvalidValue,
                "size factors must be finite and > 0".to_string(),
                node,
            ));
        }
        spec.scale = scale;
        spec.collision = self.bool_attr(node, "collision", false)?;
        spec.interactable = self.bool_attr(node, "interactable", true)?;
        spec.reinteractable = self.bool_attr(node, "reinteractable", true)?;
        spec.never_interactable = self.bool_attr(node, "never_interactable", false)?;

        if kind == ItemKind::Door {
            spec.capabilities.push(Capability::ExitDoor);
        }
        if let Some(flag) = self.flag_attr(node, "requires")? {
            spec.capabilities.push(Capability::GatesOnFlag(flag));
        }
        if let Some(minigame) = self.minigame_attr(node)? {
            spec.capabilities.push(Capability::RunsMinigame(minigame));
        }
        if let Some(token) = node.attribute("melody") {
            let cue = SoundCue::from_token(token).ok_or_else(|| {
                self.error_at(
                    ContentErrorCode::InvalidValue,
                    format!("unknown melody '{token}'"),
                    node,
                )
            })?;
            spec.capabilities.push(Capability::PlaysMelody(cue));
        }
        if let Some(flag) = self.flag_attr(node, "produces")? {
            spec.capabilities.push(Capability::ProducesFlag(flag));
        }
        if let Some(raw) = node.attribute("unlocks") {
            let targets: Vec<String> = raw.split_whitespace().map(ToString::to_string).collect();
            if !targets.is_empty() {
                spec.capabilities.push(Capability::Unlocks(targets));
            }
        }
        if let Some(position) = self.pair_attr(node, "moves_to")? {
            spec.capabilities.push(Capability::MovesTo(position));
        }
        if let Some(open_key) = self.sprite_attr(node, "open_sprite")? {
            spec.capabilities
                .push(Capability::SwapsSprite(SpriteRef::new(open_key, width, height)));
        }
        if self.bool_attr(node, "consumed", false)? {
            spec.capabilities.push(Capability::ConsumedOnSuccess);
        }
        if self.bool_attr(node, "scores", false)? {
            spec.capabilities.push(Capability::CountsAsSolve);
        }

        spec.texts = self.parse_texts(node)?;
        Ok(spec)
    }

    fn parse_texts(&self, node: Node<'_, '_>) -> Result<ItemTexts, ContentError> {
        let mut texts = ItemTexts::default();
        for child in node.children().filter(|child| child.is_element()) {
            let slot = match child.tag_name().name() {
                "Success" => &mut texts.success,
                "Failure" => &mut texts.failure,
                "Locked" => &mut texts.locked,
                "Hint" => &mut texts.hint,
                other => {
                    return Err(self.error_at(
                        ContentErrorCode::UnknownElement,
                        format!("unsupported element <{other}> in <Item>"),
                        child,
                    ))
                }
            };
            if slot.is_some() {
                return Err(self.error_at(
                    ContentErrorCode::UnknownElement,
                    format!("duplicate <{}> in <Item>", child.tag_name().name()),
                    child,
                ));
            }
            *slot = Some(self.required_text(child)?);
        }
        Ok(texts)
    }

    fn minigame_attr(&self, node: Node<'_, '_>) -> Result<Option<MinigameSpec>, ContentError> {
        let Some(name) = node.attribute("minigame") else {
            return Ok(None);
        };
        let spec = match name {
            "color_memory" => {
                let sequence_len: usize = self
                    .parsed_attr(node, "length")?
                    .unwrap_or(DEFAULT_COLOR_SEQUENCE_LEN);
                if sequence_len == 0 {
                    return Err(self.invalid(node, "length must be at least 1"));
                }
                MinigameSpec::ColorMemory { sequence_len }
            }
            "bookshelf" => {
                let books: Vec<String> = self
                    .required_attr(node, "books")?
                    .split_whitespace()
                    .map(ToString::to_string)
                    .collect();
                let solution = self
                    .required_attr(node, "solution")?
                    .split_whitespace()
                    .map(str::parse::<usize>)
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(|_| self.invalid(node, "solution must list book indices"))?;
                let mut sorted = solution.clone();
                sorted.sort_unstable();
                if books.is_empty() || sorted != (0..books.len()).collect::<Vec<_>>() {
                    return Err(self.invalid(
                        node,
                        "solution must use every book index exactly once",
                    ));
                }
                MinigameSpec::Bookshelf { books, solution }
            }
            "keypad" => {
                let raw = self.required_attr(node, "code")?;
                let code = raw
                    .chars()
                    .map(|ch| ch.to_digit(10).map(|digit| digit as u8))
                    .collect::<Option<Vec<_>>>()
                    .filter(|code| !code.is_empty())
                    .ok_or_else(|| self.invalid(node, "code must be one or more digits"))?;
                MinigameSpec::Keypad { code }
            }
            "whack_a_mole" => {
                let win_score: u32 = self
                    .parsed_attr(node, "win_score")?
                    .ok_or_else(|| self.missing(node, "win_score"))?;
                let duration_secs: f32 = self
                    .parsed_attr(node, "duration_secs")?
                    .unwrap_or(DEFAULT_WHACK_DURATION_SECS);
                if !duration_secs.is_finite() || duration_secs <= 0.0 {
                    return Err(self.invalid(node, "duration_secs must be finite and > 0"));
                }
                MinigameSpec::WhackAMole {
                    win_score,
                    duration_secs,
                }
            }
            other => {
                return Err(self.invalid(
                    node,
                    &format!(
                        "unknown minigame '{other}'; allowed values: color_memory, bookshelf, keypad, whack_a_mole"
                    ),
                ))
            }
        };
        Ok(Some(spec))
    }

    fn reject_unknown_attributes(
        &self,
        node: Node<'_, '_>,
        allowed: &[&str],
    ) -> Result<(), ContentError> {
        match node
            .attributes()
            .find(|attribute| !allowed.contains(&attribute.name()))
        {
            Some(attribute) => Err(self.error_at(
                ContentErrorCode::UnknownAttribute,
                format!(
                    "unknown attribute '{}' on <{}>",
                    attribute.name(),
                    node.tag_name().name()
                ),
                node,
            )),
            None => Ok(()),
        }
    }

    fn required_attr<'n>(&self, node: Node<'n, '_>, name: &str) -> Result<&'n str, ContentError> {
        match node.attribute(name).map(str::trim) {
            Some(value) if !value.is_empty() => Ok(value),
            _ => Err(self.missing(node, name)),
        }
    }

    fn parsed_attr<T: FromStr>(
        &self,
        node: Node<'_, '_>,
        name: &str,
    ) -> Result<Option<T>, ContentError> {
        let Some(raw) = node.attribute(name) else {
            return Ok(None);
        };
        raw.trim().parse::<T>().map(Some).map_err(|_| {
            self.error_at(
                ContentErrorCode::InvalidValue,
                format!("attribute '{name}' has invalid value '{raw}'"),
                node,
            )
        })
    }

    fn pair_attr<T: FromStr>(
        &self,
        node: Node<'_, '_>,
        name: &str,
    ) -> Result<Option<(T, T)>, ContentError> {
        let Some(raw) = node.attribute(name) else {
            return Ok(None);
        };
        let invalid = || {
            self.error_at(
                ContentErrorCode::InvalidValue,
                format!("attribute '{name}' must be two comma-separated numbers, got '{raw}'"),
                node,
            )
        };
        let (first, second) = raw.split_once(',').ok_or_else(invalid)?;
        let first = first.trim().parse::<T>().map_err(|_| invalid())?;
        let second = second.trim().parse::<T>().map_err(|_| invalid())?;
        Ok(Some((first, second)))
    }

    fn bool_attr(&self, node: Node<'_, '_>, name: &str, default: bool) -> Result<bool, ContentError> {
        match node.attribute(name).map(str::trim) {
            None => Ok(default),
            Some("true") => Ok(true),
            Some("false") => Ok(false),
            Some(other) => Err(self.error_at(
                ContentErrorCode::InvalidValue,
                format!("attribute '{name}' must be true or false, got '{other}'"),
                node,
            )),
        }
    }

    fn flag_attr(
        &self,
        node: Node<'_, '_>,
        name: &str,
    ) -> Result<Option<SessionFlag>, ContentError> {
        let Some(token) = node.attribute(name) else {
            return Ok(None);
        };
        SessionFlag::from_token(token.trim()).map(Some).ok_or_else(|| {
            self.error_at(
                ContentErrorCode::InvalidValue,
                format!("attribute '{name}' names unknown flag '{token}'"),
                node,
            )
        })
    }

    fn sprite_attr(&self, node: Node<'_, '_>, name: &str) -> Result<Option<String>, ContentError> {
        let Some(key) = node.attribute(name) else {
            return Ok(None);
        };
        validate_sprite_key(key).map_err(|error| {
            self.error_at(
                ContentErrorCode::InvalidValue,
                format!("attribute '{name}' is not a valid sprite key: {error}"),
                node,
            )
        })?;
        Ok(Some(key.to_string()))
    }

    fn required_text(&self, node: Node<'_, '_>) -> Result<String, ContentError> {
        let text = node
            .text()
            .unwrap_or_default()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");
        if text.is_empty() {
            return Err(self.error_at(
                ContentErrorCode::MissingAttribute,
                format!("<{}> must not be empty", node.tag_name().name()),
                node,
            ));
        }
        Ok(text)
    }

    fn missing(&self, node: Node<'_, '_>, name: &str) -> ContentError {
        self.error_at(
            ContentErrorCode::MissingAttribute,
            format!(
                "missing required attribute '{name}' on <{}>",
                node.tag_name().name()
            ),
            node,
        )
    }

    fn invalid(&self, node: Node<'_, '_>, message: &str) -> ContentError {
        self.error_at(ContentErrorCode::InvalidValue, message.to_string(), node)
    }
}
