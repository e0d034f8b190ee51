use std::cell::RefCell;

use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum SoundCue {
    DoorUnlocked,
    MusicBoxMelody,
    Ding,
    Whack,
    Taunt,
    Footstep,
}

impl SoundCue {
    pub(crate) const ALL: [SoundCue; 6] = [
        SoundCue::DoorUnlocked,
        SoundCue::MusicBoxMelody,
        SoundCue::Ding,
        SoundCue::Whack,
        SoundCue::Taunt,
        SoundCue::Footstep,
    ];

    pub(crate) const fn as_token(self) -> &'static str {
        match self {
            SoundCue::DoorUnlocked => "door_unlocked",
            SoundCue::MusicBoxMelody => "music_box",
            SoundCue::Ding => "ding",
            SoundCue::Whack => "whack",
            SoundCue::Taunt => "taunt",
            SoundCue::Footstep => "footstep",
        }
    }

    pub(crate) fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|cue| cue.as_token() == token)
    }

    pub(crate) const fn nominal_duration_secs(self) -> f32 {
        match self {
            SoundCue::DoorUnlocked => 1.5,
            SoundCue::MusicBoxMelody => 6.0,
            SoundCue::Ding => 0.3,
            SoundCue::Whack => 0.25,
            SoundCue::Taunt => 0.6,
            SoundCue::Footstep => 0.35,
        }
    }
}

pub(crate) trait SoundBoard {
    fn play(&self, cue: SoundCue);
    fn is_playing(&self, cue: SoundCue) -> bool;
    fn is_idle(&self) -> bool;
    fn stop_all(&self);
}

#[derive(Debug, Default)]
struct MixerState {
    now: f64,
    channels: Vec<(SoundCue, f64)>,
}

/// Tracks which cues would still be audible, using each cue's nominal length.
#[derive(Debug, Default)]
pub(crate) struct TimedSoundBoard {
    state: RefCell<MixerState>,
}

impl TimedSoundBoard {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn advance(&self, dt_seconds: f32) {
        let mut state = self.state.borrow_mut();
        state.now += dt_seconds.max(0.0) as f64;
        let now = state.now;
        state.channels.retain(|(_, ends_at)| *ends_at > now);
    }
}

impl SoundBoard for TimedSoundBoard {
    fn play(&self, cue: SoundCue) {
        let mut state = self.state.borrow_mut();
        let ends_at = state.now + cue.nominal_duration_secs() as f64;
        state.channels.push((cue, ends_at));
        if cue == SoundCue::Footstep {
            debug!(cue = cue.as_token(), "sound_played");
        } else {
            info!(cue = cue.as_token(), "sound_played");
        }
    }

    fn is_playing(&self, cue: SoundCue) -> bool {
        self.state
            .borrow()
            .channels
            .iter()
            .any(|(playing, _)| *playing == cue)
    }

    fn is_idle(&self) -> bool {
        self.state.borrow().channels.is_empty()
    }

    fn stop_all(&self) {
        self.state.borrow_mut().channels.clear();
    }
}
