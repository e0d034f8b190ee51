use engine::{InputAction, InputSnapshot, Scene, SceneCommand};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::minigames::{ColorMemoryGame, Minigame, WhackAMoleGame};
use super::scene::EscapeScene;
use super::session::SessionFlag;
use super::test_support::{RecordingCanvas, ScriptedSounds, CANVAS};
use crate::app::content::RoomCatalog;
use crate::app::settings::GameSettings;

const DT: f32 = 1.0 / 60.0;
const SEED: u64 = 0x5eed;

fn scene_at(level: u32) -> EscapeScene {
    let settings = GameSettings {
        start_level: level,
        rng_seed: Some(SEED),
        ..GameSettings::default()
    };
    let catalog = RoomCatalog::builtin().expect("builtin rooms");
    let mut scene = EscapeScene::new(catalog, &settings, CANVAS).expect("scene");
    scene.load();
    scene
}

/// The generator the scene hands its `nth` minigame, replayed outside the scene.
fn minigame_rng(nth: usize) -> StdRng {
    let mut scene_rng = StdRng::seed_from_u64(SEED);
    for _ in 0..nth {
        let _: u64 = scene_rng.gen();
    }
    StdRng::seed_from_u64(scene_rng.gen())
}

fn press(action: InputAction) -> InputSnapshot {
    InputSnapshot::empty().with_action_pressed(action)
}

fn digit(value: u8) -> InputSnapshot {
    InputSnapshot::empty().with_digit_pressed(value)
}

fn tick(scene: &mut EscapeScene, input: InputSnapshot) -> SceneCommand {
    scene.update(DT, &input)
}

fn wait(scene: &mut EscapeScene, secs: f32) {
    for _ in 0..(secs / DT).ceil() as usize {
        tick(scene, InputSnapshot::empty());
    }
}

fn walk_to(scene: &mut EscapeScene, key: &str) {
    let center = scene
        .level()
        .item(key)
        .unwrap_or_else(|| panic!("no item `{key}`"))
        .rect()
        .center();
    scene.player_mut().rect_mut().set_center(center);
}

/// Waits out the interact cooldown, stands on the item and presses E.
fn use_item(scene: &mut EscapeScene, key: &str) -> SceneCommand {
    wait(scene, 0.6);
    walk_to(scene, key);
    tick(scene, press(InputAction::Interact))
}

fn type_digits(scene: &mut EscapeScene, digits: &[u8]) {
    for value in digits {
        tick(scene, digit(*value));
    }
}

fn finished(scene: &EscapeScene, key: &str) -> bool {
    scene.level().item(key).expect(key).is_finished
}

fn enabled(scene: &EscapeScene, key: &str) -> bool {
    scene.level().item(key).expect(key).interactable
}

fn has_flag(scene: &EscapeScene, flag: SessionFlag) -> bool {
    scene.session().flags().is_set(flag)
}

/// Opens the dresser and repeats the colours shown by a game seeded like the scene's.
fn solve_color_drawer(scene: &mut EscapeScene, rng: StdRng) {
    let sequence = ColorMemoryGame::new(4, rng).sequence().to_vec();
    use_item(scene, "dresser");
    assert!(scene.in_minigame());
    tick(scene, press(InputAction::Confirm));
    wait(scene, 5.5);
    let picks: Vec<u8> = sequence.iter().map(|color| *color as u8 + 1).collect();
    type_digits(scene, &picks);
    assert!(!scene.in_minigame());
}

/// Hits whichever hole a shadow game shows first until the round ends.
fn whack_every_mole(scene: &mut EscapeScene, rng: StdRng) -> u32 {
    let mut shadow = WhackAMoleGame::new(15.0, rng);
    let sounds = ScriptedSounds::default();
    for _ in 0..(20.0 / DT) as usize {
        if !scene.in_minigame() {
            break;
        }
        let input = match shadow.up_holes().first() {
            Some(hole) => digit(*hole as u8 + 1),
            None => InputSnapshot::empty(),
        };
        shadow.update(DT, &input, &sounds);
        tick(scene, input);
    }
    assert!(!scene.in_minigame());
    tick(scene, InputSnapshot::empty());
    shadow.score()
}

#[test]
fn attic_opens_with_queued_intro() {
    let mut scene = scene_at(1);
    assert_eq!(
        scene.current_message().as_deref(),
        Some("Oh no, I've been kidnapped. I must ESCAPE!")
    );
    wait(&mut scene, 2.1);
    assert_eq!(
        scene.current_message().as_deref(),
        Some("I can use W, A, S, D to get around.")
    );
    let title = scene.title().expect("title");
    assert!(title.contains("attic"));
    assert!(title.contains("W, A, S, D"));
}

#[test]
fn carpet_reveals_trapdoor_and_picture_only() {
    let mut scene = scene_at(1);
    assert!(!enabled(&scene, "trapdoor"));

    use_item(&mut scene, "carpet");

    assert!(finished(&scene, "carpet"));
    assert!(enabled(&scene, "trapdoor"));
    assert!(enabled(&scene, "picture"));
    assert!(!enabled(&scene, "statue_m"));
    assert!(!enabled(&scene, "bookshelf"));
    assert!(enabled(&scene, "chest"));
    assert_eq!(
        scene.level().item("carpet").expect("carpet").rect().center(),
        (1220, 700)
    );
}

#[test]
fn locked_trapdoor_reports_what_is_left() {
    let mut scene = scene_at(1);
    use_item(&mut scene, "carpet");

    use_item(&mut scene, "trapdoor");

    assert!(!finished(&scene, "trapdoor"));
    assert_eq!(
        scene.current_message().as_deref(),
        Some("The trapdoor won't budge. 8 things still feel unfinished up here.")
    );
    assert_eq!(scene.level().level_id(), 1);
}

#[test]
fn statue_waits_for_the_wine() {
    let mut scene = scene_at(1);
    use_item(&mut scene, "carpet");
    use_item(&mut scene, "picture");

    use_item(&mut scene, "statue_m");
    assert!(!finished(&scene, "statue_m"));
    assert_eq!(scene.level().puzzles_solved(), 0);
    assert_eq!(
        scene.current_message().as_deref(),
        Some("He is holding an empty glass. Maybe he wants something to drink.")
    );

    use_item(&mut scene, "chest");
    assert!(has_flag(&scene, SessionFlag::Wine));
    assert_eq!(
        scene.level().item("chest").expect("chest").sprite_key(),
        "level_1/chest_open"
    );

    use_item(&mut scene, "statue_m");
    assert!(finished(&scene, "statue_m"));
    assert_eq!(scene.level().puzzles_solved(), 1);
}

#[test]
fn wrong_book_order_resets_the_shelf() {
    let mut scene = scene_at(1);
    use_item(&mut scene, "carpet");
    use_item(&mut scene, "picture");

    use_item(&mut scene, "bookshelf");
    assert!(scene.in_minigame());
    type_digits(&mut scene, &[1, 2, 3, 4, 5]);

    assert!(!scene.in_minigame());
    assert!(!has_flag(&scene, SessionFlag::Feather));
    assert!(!finished(&scene, "bookshelf"));
    assert!(enabled(&scene, "bookshelf"));
    assert_eq!(
        scene.current_message().as_deref(),
        Some("The books slide back into place. That wasn't the right order.")
    );

    use_item(&mut scene, "bookshelf");
    type_digits(&mut scene, &[4, 1, 5, 2, 3]);

    assert!(has_flag(&scene, SessionFlag::Feather));
    assert!(finished(&scene, "bookshelf"));
}

#[test]
fn escape_leaves_a_minigame_before_it_quits_the_game() {
    let mut scene = scene_at(1);
    use_item(&mut scene, "carpet");
    use_item(&mut scene, "picture");
    use_item(&mut scene, "bookshelf");
    assert!(scene.in_minigame());
    assert!(scene.title().expect("title").contains("Bookshelf"));

    assert_eq!(tick(&mut scene, press(InputAction::Cancel)), SceneCommand::None);
    assert!(!scene.in_minigame());
    assert!(!finished(&scene, "bookshelf"));

    assert_eq!(tick(&mut scene, press(InputAction::Cancel)), SceneCommand::Quit);
}

#[test]
fn music_box_finishes_once_the_melody_ends() {
    let mut scene = scene_at(1);
    use_item(&mut scene, "carpet");
    use_item(&mut scene, "picture");

    use_item(&mut scene, "music_box");
    assert!(scene.level().is_awaiting_audio());
    assert!(!finished(&scene, "music_box"));

    use_item(&mut scene, "chest");
    assert!(!finished(&scene, "chest"));

    wait(&mut scene, 6.0);
    assert!(!scene.level().is_awaiting_audio());
    assert!(finished(&scene, "music_box"));
    assert_eq!(
        scene.current_message().as_deref(),
        Some("The melody fades. What a haunting little tune.")
    );
}

#[test]
fn walking_into_the_bookshelf_slides_along_it() {
    let mut scene = scene_at(1);
    scene.player_mut().rect_mut().set_center((1605, 705));
    let before = scene.player_mut().rect();

    let input = InputSnapshot::empty()
        .with_action_down(InputAction::MoveRight, true)
        .with_action_down(InputAction::MoveDown, true);
    tick(&mut scene, input);

    let after = scene.player_mut().rect();
    assert_eq!(after.x, before.x);
    assert_eq!(after.y, before.y + 10);
}

#[test]
fn attic_walkthrough_drops_into_the_bedroom() {
    let mut scene = scene_at(1);
    use_item(&mut scene, "carpet");
    use_item(&mut scene, "picture");
    use_item(&mut scene, "chest");
    use_item(&mut scene, "statue_m");
    use_item(&mut scene, "shovel");
    assert!(!scene.level().item("shovel").expect("shovel").is_active);
    use_item(&mut scene, "trash");
    assert!(!scene.level().item("trash").expect("trash").is_active);
    use_item(&mut scene, "music_box");
    wait(&mut scene, 6.2);
    use_item(&mut scene, "bookshelf");
    type_digits(&mut scene, &[4, 1, 5, 2, 3]);
    assert!(!scene.level().door().can_open);
    use_item(&mut scene, "statue_f");

    assert_eq!(scene.level().remaining_puzzles(), 0);
    assert!(scene.level().door().can_open);
    assert_eq!(scene.level().puzzles_solved(), 2);
    assert_eq!(scene.level().level_id(), 1);
    assert_eq!(scene.level().door().sprite_key(), "level_1/trapdoor_open");

    use_item(&mut scene, "trapdoor");

    assert_eq!(scene.level().level_id(), 2);
    assert_eq!(scene.session().levels_cleared(), 1);
    assert!(has_flag(&scene, SessionFlag::Wine));
    assert_eq!(scene.player_mut().rect().w, 68);
    assert_eq!(scene.player_mut().rect().center(), (960, 540));
    assert_eq!(
        scene.current_message().as_deref(),
        Some("The trapdoor creaks open. Down I go!")
    );
    wait(&mut scene, 2.1);
    assert_eq!(
        scene.current_message().as_deref(),
        Some("I made it downstairs, but the door is locked!")
    );
}

#[test]
fn bedroom_walkthrough_with_the_color_drawer() {
    let mut scene = scene_at(2);

    use_item(&mut scene, "color_code");
    assert!(!finished(&scene, "color_code"));

    solve_color_drawer(&mut scene, minigame_rng(0));
    assert!(has_flag(&scene, SessionFlag::ColorCard));

    use_item(&mut scene, "color_code");
    assert!(enabled(&scene, "bedroom_door"));

    use_item(&mut scene, "smoke_detector");
    assert!(!finished(&scene, "smoke_detector"));
    use_item(&mut scene, "ladder");
    assert_eq!(
        scene.level().item("ladder").expect("ladder").rect().center(),
        (1360, 290)
    );
    use_item(&mut scene, "smoke_detector");
    assert!(has_flag(&scene, SessionFlag::Battery));
    use_item(&mut scene, "nightlight");
    use_item(&mut scene, "microwave");

    use_item(&mut scene, "bedroom_door");
    assert_eq!(scene.level().level_id(), 3);
    assert_eq!(scene.player_mut().rect().w, 135);
}

#[test]
fn basement_hole_needs_the_hammer_and_ten_whacks() {
    let mut scene = scene_at(3);
    use_item(&mut scene, "hole");
    assert!(!scene.in_minigame());

    use_item(&mut scene, "hammer_chest");
    assert!(has_flag(&scene, SessionFlag::HasHammer));
    use_item(&mut scene, "hole");
    assert!(scene.in_minigame());

    assert!(whack_every_mole(&mut scene, minigame_rng(0)) >= 10);
    assert!(finished(&scene, "hole"));
    assert!(enabled(&scene, "pit"));

    use_item(&mut scene, "pit");
    assert_eq!(scene.level().level_id(), 4);
}

#[test]
fn quitting_whack_a_mole_counts_as_a_miss() {
    let mut scene = scene_at(3);
    use_item(&mut scene, "hammer_chest");
    use_item(&mut scene, "hole");
    wait(&mut scene, 2.0);

    tick(&mut scene, press(InputAction::Cancel));

    assert!(!scene.in_minigame());
    assert!(!finished(&scene, "hole"));
    assert_eq!(
        scene.current_message().as_deref(),
        Some("The moles are too quick. I need to whack at least ten of them.")
    );
}

#[test]
fn sewer_keypad_leads_outside() {
    let mut scene = scene_at(4);
    assert!(finished(&scene, "barrier_1"));

    use_item(&mut scene, "grey_mouse");
    assert!(!finished(&scene, "grey_mouse"));
    use_item(&mut scene, "cheese_toy");
    use_item(&mut scene, "grey_mouse");
    use_item(&mut scene, "red_mouse");
    use_item(&mut scene, "power_bank");
    assert!(has_flag(&scene, SessionFlag::ChargedBattery));

    use_item(&mut scene, "code_box");
    assert!(scene.in_minigame());
    type_digits(&mut scene, &[7, 3, 1, 4]);
    assert!(!finished(&scene, "code_box"));
    use_item(&mut scene, "code_box");
    type_digits(&mut scene, &[7, 3, 1, 5]);
    assert!(finished(&scene, "code_box"));

    for key in [
        "vent_1", "vent_2", "vent_3", "vent_4", "barrel_1", "barrel_2", "barrel_3",
    ] {
        use_item(&mut scene, key);
        assert!(finished(&scene, key), "{key} should be done");
    }
    assert!(scene.level().door().can_open);

    use_item(&mut scene, "door");
    assert!(scene.is_escaped());
    assert_eq!(scene.session().levels_cleared(), 1);
    assert!(scene
        .current_message()
        .is_some_and(|text| text.starts_with("You escaped!")));
    assert_eq!(tick(&mut scene, InputSnapshot::empty()), SceneCommand::None);
    assert_eq!(tick(&mut scene, press(InputAction::Confirm)), SceneCommand::Quit);
}

#[test]
fn bedroom_battery_does_not_power_the_sewer_code_box() {
    let mut scene = scene_at(2);
    solve_color_drawer(&mut scene, minigame_rng(0));
    for key in [
        "color_code",
        "ladder",
        "smoke_detector",
        "nightlight",
        "microwave",
        "bedroom_door",
    ] {
        use_item(&mut scene, key);
    }
    assert_eq!(scene.level().level_id(), 3);

    use_item(&mut scene, "hammer_chest");
    use_item(&mut scene, "hole");
    assert!(whack_every_mole(&mut scene, minigame_rng(1)) >= 10);
    use_item(&mut scene, "pit");
    assert_eq!(scene.level().level_id(), 4);
    assert_eq!(scene.session().levels_cleared(), 2);

    assert!(has_flag(&scene, SessionFlag::Battery));
    assert!(!has_flag(&scene, SessionFlag::ChargedBattery));
    use_item(&mut scene, "code_box");
    assert!(!scene.in_minigame());
    assert!(!finished(&scene, "code_box"));
    assert_eq!(
        scene.current_message().as_deref(),
        Some("The code box buzzes angrily. Wrong code.")
    );

    use_item(&mut scene, "cheese_toy");
    use_item(&mut scene, "grey_mouse");
    use_item(&mut scene, "power_bank");
    use_item(&mut scene, "code_box");
    assert!(scene.in_minigame());
}

#[test]
fn closing_the_window_quits_from_any_phase() {
    let mut scene = scene_at(1);
    use_item(&mut scene, "carpet");
    use_item(&mut scene, "picture");
    use_item(&mut scene, "bookshelf");
    assert!(scene.in_minigame());

    let command = tick(&mut scene, InputSnapshot::empty().with_quit_requested(true));
    assert_eq!(command, SceneCommand::Quit);
}

#[test]
fn render_draws_room_items_and_player() {
    let mut scene = scene_at(1);
    use_item(&mut scene, "carpet");
    use_item(&mut scene, "picture");
    use_item(&mut scene, "shovel");
    let mut canvas = RecordingCanvas::default();

    scene.render(&mut canvas);

    let keys = canvas.sprite_keys();
    assert_eq!(keys.first().map(String::as_str), Some("level_1/attic"));
    assert!(keys.iter().any(|key| key == "level_1/carpet_folded"));
    assert!(keys.iter().any(|key| key == "level_1/knife"));
    assert!(!keys.iter().any(|key| key == "level_1/shovel"));
    assert_eq!(keys.last().map(String::as_str), Some("player/idle"));
}

#[test]
fn every_room_in_the_catalog_loads() {
    let catalog = RoomCatalog::builtin().expect("builtin rooms");
    for level in 1..=catalog.max_level_id() {
        let scene = scene_at(level);
        assert_eq!(scene.level().level_id(), level);
        assert_eq!(scene.level().door().kind().as_token(), "door");
    }
}
