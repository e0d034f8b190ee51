use super::item::Item;
use super::message::{Message, MessageSink};
use super::minigames::{MinigameOutcome, MinigameSpec};
use super::session::SessionFlags;
use super::sound::{SoundBoard, SoundCue};

/// What the caller has to do after an item was interacted with.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Interaction {
    Done,
    StartMinigame(MinigameSpec),
    AwaitingAudio(SoundCue),
}

pub(crate) struct InteractContext<'a> {
    pub(crate) flags: &'a mut SessionFlags,
    pub(crate) messages: &'a dyn MessageSink,
    pub(crate) sounds: &'a dyn SoundBoard,
    pub(crate) remaining_puzzles: usize,
    pub(crate) puzzles_solved: &'a mut u32,
}

pub(crate) fn interact(item: &mut Item, ctx: &mut InteractContext<'_>) -> Interaction {
    if item.is_door() {
        open_door(item, ctx);
        return Interaction::Done;
    }
    if let Some(flag) = item.gate_flag() {
        if !ctx.flags.is_set(flag) {
            fail(item, ctx);
            return Interaction::Done;
        }
    }
    if let Some(spec) = item.minigame() {
        return Interaction::StartMinigame(spec.clone());
    }
    if let Some(cue) = item.melody() {
        ctx.sounds.play(cue);
        return Interaction::AwaitingAudio(cue);
    }
    complete(item, ctx);
    Interaction::Done
}

fn open_door(item: &mut Item, ctx: &mut InteractContext<'_>) {
    if !item.can_open {
        ctx.messages
            .show(Message::new(item.locked_text(ctx.remaining_puzzles)));
        return;
    }
    item.is_finished = true;
    item.interactable = false;
    item.reinteractable = false;
    ctx.messages.show(Message::new(item.success_text()));
}

/// Applies every success effect the item declares, then retires it.
pub(crate) fn complete(item: &mut Item, ctx: &mut InteractContext<'_>) {
    if let Some(flag) = item.produced_flag() {
        ctx.flags.set(flag);
    }
    if let Some(sprite) = item.swap_sprite().cloned() {
        item.set_sprite(sprite);
    }
    if let Some(position) = item.move_target() {
        item.move_to(position);
    }
    if item.is_consumed_on_success() {
        item.is_active = false;
    }
    if item.counts_as_solve() {
        *ctx.puzzles_solved += 1;
    }
    item.is_finished = true;
    item.interactable = false;
    item.reinteractable = false;
    item.glow = false;
    item.can_interact_now = false;
    ctx.messages.show(Message::new(item.success_text()));
}

/// Nothing persists; the item stays available for another attempt.
pub(crate) fn fail(item: &Item, ctx: &mut InteractContext<'_>) {
    ctx.messages.show(Message::new(item.failure_text()));
}

/// Returns whether the outcome solved the item.
pub(crate) fn resolve_minigame(
    item: &mut Item,
    outcome: MinigameOutcome,
    ctx: &mut InteractContext<'_>,
) -> bool {
    let solved = item.minigame().is_some_and(|spec| spec.judge(outcome));
    if solved {
        complete(item, ctx);
    } else {
        fail(item, ctx);
    }
    solved
}
