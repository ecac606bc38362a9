use std::time::Duration;

use tokio::time::Instant;

use crate::domain::Game;

pub const DEFAULT_TRAP_CUE_DURATION: Duration = Duration::from_millis(1500);

/// Turns the service's level-triggered `isResetted` flag into a one-shot event.
///
/// One detector per mounted session. The flag usually stays raised for several
/// snapshots; only the first of them fires.
#[derive(Clone, Debug, Default)]
pub struct TrapEdgeDetector {
    last_observed_reset: bool,
}

impl TrapEdgeDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` exactly on a rising edge of the local player's reset flag.
    pub fn observe(&mut self, game: &Game, local_player: &str) -> bool {
        let currently_reset = game
            .score_of(local_player)
            .is_some_and(|score| score.is_resetted);
        self.observe_flag(currently_reset)
    }

    pub fn observe_flag(&mut self, currently_reset: bool) -> bool {
        let fired = currently_reset && !self.last_observed_reset;
        self.last_observed_reset = currently_reset;
        fired
    }

    pub fn last_observed_reset(&self) -> bool {
        self.last_observed_reset
    }
}

/// Fixed-duration local effect armed when a trap springs.
#[derive(Clone, Debug)]
pub struct TrapCue {
    duration: Duration,
    active_until: Option<Instant>,
}

impl TrapCue {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            active_until: None,
        }
    }

    pub fn trigger(&mut self, now: Instant) {
        self.active_until = Some(now + self.duration);
    }

    pub fn is_active(&self, now: Instant) -> bool {
        self.active_until.is_some_and(|until| now < until)
    }

    /// Time left before the cue expires, if it is running.
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.active_until
            .filter(|until| now < *until)
            .map(|until| until - now)
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }
}

impl Default for TrapCue {
    fn default() -> Self {
        Self::new(DEFAULT_TRAP_CUE_DURATION)
    }
}
