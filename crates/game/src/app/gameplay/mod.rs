mod interaction;
mod item;
mod level;
mod message;
mod minigames;
mod player;
mod scene;
mod session;
mod sound;

#[cfg(test)]
mod test_support;
#[cfg(test)]
mod tests;

use engine::{Scene, Viewport};

use super::content::RoomCatalog;
use super::settings::GameSettings;

pub(crate) use item::{Capability, ItemKind, ItemSpec, ItemTexts, SpriteRef};
pub(crate) use level::LevelError;
pub(crate) use minigames::MinigameSpec;
pub(crate) use session::SessionFlag;
pub(crate) use sound::SoundCue;

use scene::EscapeScene;

pub(crate) fn build_scene(
    catalog: RoomCatalog,
    settings: &GameSettings,
    canvas: Viewport,
) -> Result<Box<dyn Scene>, LevelError> {
    let scene = EscapeScene::new(catalog, settings, canvas)?;
    Ok(Box::new(scene))
}
