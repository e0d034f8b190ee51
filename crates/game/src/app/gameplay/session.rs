use std::collections::BTreeSet;
use std::fmt;

/// Facts shared between items within one playthrough ("player has the wine").
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) enum SessionFlag {
    Wine,
    Feather,
    HasShovel,
    HasHammer,
    HasCheese,
    Battery,
    ChargedBattery,
    LadderPlaced,
    ColorCard,
    PowerCable,
}

impl SessionFlag {
    pub(crate) const ALL: [SessionFlag; 10] = [
        SessionFlag::Wine,
        SessionFlag::Feather,
        SessionFlag::HasShovel,
        SessionFlag::HasHammer,
        SessionFlag::HasCheese,
        SessionFlag::Battery,
        SessionFlag::ChargedBattery,
        SessionFlag::LadderPlaced,
        SessionFlag::ColorCard,
        SessionFlag::PowerCable,
    ];

    pub(crate) const fn as_token(self) -> &'static str {
        match self {
            SessionFlag::Wine => "wine",
            SessionFlag::Feather => "feather",
            SessionFlag::HasShovel => "has_shovel",
            SessionFlag::HasHammer => "has_hammer",
            SessionFlag::HasCheese => "has_cheese",
            SessionFlag::Battery => "battery",
            SessionFlag::ChargedBattery => "charged_battery",
            SessionFlag::LadderPlaced => "ladder_placed",
            SessionFlag::ColorCard => "color_card",
            SessionFlag::PowerCable => "power_cable",
        }
    }

    pub(crate) fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|flag| flag.as_token() == token)
    }
}

impl fmt::Display for SessionFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_token())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct SessionFlags {
    set: BTreeSet<SessionFlag>,
}

impl SessionFlags {
    pub(crate) fn is_set(&self, flag: SessionFlag) -> bool {
        self.set.contains(&flag)
    }

    /// Returns true when the flag was not already set.
    pub(crate) fn set(&mut self, flag: SessionFlag) -> bool {
        self.set.insert(flag)
    }

    pub(crate) fn len(&self) -> usize {
        self.set.len()
    }
}

/// State scoped to a single playthrough. Dropped and rebuilt on restart.
#[derive(Debug, Default)]
pub(crate) struct Session {
    flags: SessionFlags,
    clock_seconds: f64,
    levels_cleared: u32,
}

impl Session {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn flags(&self) -> &SessionFlags {
        &self.flags
    }

    pub(crate) fn flags_mut(&mut self) -> &mut SessionFlags {
        &mut self.flags
    }

    pub(crate) fn advance_clock(&mut self, dt_seconds: f32) {
        self.clock_seconds += dt_seconds.max(0.0) as f64;
    }

    pub(crate) fn now(&self) -> f64 {
        self.clock_seconds
    }

    pub(crate) fn record_level_cleared(&mut self) -> u32 {
        self.levels_cleared = self.levels_cleared.saturating_add(1);
        self.levels_cleared
    }

    pub(crate) fn levels_cleared(&self) -> u32 {
        self.levels_cleared
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_round_trip_for_every_flag() {
        for flag in SessionFlag::ALL {
            assert_eq!(SessionFlag::from_token(flag.as_token()), Some(flag));
        }
        assert_eq!(SessionFlag::from_token("gold"), None);
    }

    #[test]
    fn setting_a_flag_twice_reports_first_set_only() {
        let mut flags = SessionFlags::default();
        assert!(flags.set(SessionFlag::Wine));
        assert!(!flags.set(SessionFlag::Wine));
        assert!(flags.is_set(SessionFlag::Wine));
        assert!(!flags.is_set(SessionFlag::Feather));
        assert_eq!(flags.len(), 1);
    }

    #[test]
    fn separate_sessions_do_not_share_flags() {
        let mut first = Session::new();
        first.flags_mut().set(SessionFlag::HasShovel);
        let second = Session::new();

        assert!(first.flags().is_set(SessionFlag::HasShovel));
        assert!(!second.flags().is_set(SessionFlag::HasShovel));
    }

    #[test]
    fn clock_ignores_negative_steps() {
        let mut session = Session::new();
        session.advance_clock(0.5);
        session.advance_clock(-1.0);
        assert!((session.now() - 0.5).abs() < 1e-9);
    }
}
