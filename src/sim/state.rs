//! Session state and core simulation types
//!
//! Everything the presentation layer reads lives here.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Current phase of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SessionPhase {
    /// Configured (or fresh), not running
    #[default]
    Idle,
    /// Timers running, balloons spawning
    Active,
    /// Target reached
    Complete,
    /// Time ran out short of the target
    Failed,
}

impl SessionPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionPhase::Complete | SessionPhase::Failed)
    }
}

/// Whether a balloon adds or removes points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Polarity {
    Positive,
    Negative,
}

/// Balloon handle, scoped to one session generation
///
/// The serial restarts at 1 on every `start`, so the generation is what keeps
/// an id from a finished session from matching a balloon in the next one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BalloonId {
    pub generation: u32,
    pub serial: u32,
}

/// A balloon entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Balloon {
    pub id: BalloonId,
    pub pos: Vec2,
    pub polarity: Polarity,
    pub points: u32,
    pub color_index: u8,
    /// Session clock at spawn (seconds)
    pub spawned_at: f32,
    /// Seconds until it floats away
    pub lifetime: f32,
}

impl Balloon {
    /// Session clock at which the balloon expires
    #[inline]
    pub fn expires_at(&self) -> f32 {
        self.spawned_at + self.lifetime
    }

    /// Fraction of lifetime used, 0..=1 (drives the rise animation)
    pub fn age_fraction(&self, clock: f32) -> f32 {
        if self.lifetime <= 0.0 {
            return 1.0;
        }
        ((clock - self.spawned_at) / self.lifetime).clamp(0.0, 1.0)
    }
}

/// Pop counters for one session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStats {
    pub total_popped: u32,
    pub positive_popped: u32,
    pub negative_popped: u32,
}

impl SessionStats {
    pub fn record(&mut self, polarity: Polarity) {
        self.total_popped += 1;
        match polarity {
            Polarity::Positive => self.positive_popped += 1,
            Polarity::Negative => self.negative_popped += 1,
        }
    }
}

/// Authoritative score/time state for the live session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub level: u32,
    pub points_needed: u32,
    pub score: u32,
    pub time_remaining: u32,
    /// Cap for time bonuses
    pub initial_time_limit: u32,
    pub phase: SessionPhase,
    pub stats: SessionStats,
    /// 0 until the session completes
    pub star_rating: u8,
}

impl SessionState {
    pub fn target_reached(&self) -> bool {
        self.score >= self.points_needed
    }

    /// Progress toward the target, 0..=1
    pub fn progress(&self) -> f32 {
        if self.points_needed == 0 {
            return 1.0;
        }
        (self.score as f32 / self.points_needed as f32).min(1.0)
    }
}

/// How a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutcomeKind {
    Completed,
    Failed,
}

/// Result handed to progression when a session ends
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionOutcome {
    pub level: u32,
    pub kind: OutcomeKind,
    pub score: u32,
    pub points_needed: u32,
    pub stars: u8,
    pub stats: SessionStats,
    pub message: String,
}

/// Events for the presentation layer (drained each frame)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SessionEvent {
    Started {
        level: u32,
        generation: u32,
    },
    BalloonSpawned {
        id: BalloonId,
        pos: Vec2,
        polarity: Polarity,
        points: u32,
    },
    BalloonPopped {
        id: BalloonId,
        pos: Vec2,
        polarity: Polarity,
        points: u32,
        /// Seconds added (positive) or removed (negative)
        time_delta: i32,
    },
    BalloonExpired {
        id: BalloonId,
    },
    /// Once per countdown second
    TimeChanged {
        time_remaining: u32,
    },
    Completed {
        stars: u8,
    },
    Failed {
        message: String,
    },
    /// Emitted after the acknowledgment delay that follows `Completed`/`Failed`
    ResultReady(SessionOutcome),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn balloon(spawned_at: f32, lifetime: f32) -> Balloon {
        Balloon {
            id: BalloonId {
                generation: 1,
                serial: 1,
            },
            pos: Vec2::ZERO,
            polarity: Polarity::Positive,
            points: 1,
            color_index: 0,
            spawned_at,
            lifetime,
        }
    }

    #[test]
    fn test_age_fraction_is_clamped() {
        let b = balloon(2.0, 4.0);
        assert_eq!(b.age_fraction(0.0), 0.0);
        assert!((b.age_fraction(3.0) - 0.25).abs() < 1e-6);
        assert_eq!(b.age_fraction(10.0), 1.0);
        assert_eq!(b.expires_at(), 6.0);
    }

    #[test]
    fn test_zero_lifetime_counts_as_expired() {
        assert_eq!(balloon(1.0, 0.0).age_fraction(1.0), 1.0);
    }

    #[test]
    fn test_progress() {
        let mut state = SessionState {
            points_needed: 10,
            score: 4,
            ..Default::default()
        };
        assert!((state.progress() - 0.4).abs() < 1e-6);
        state.score = 15;
        assert_eq!(state.progress(), 1.0);
        state.points_needed = 0;
        state.score = 0;
        assert_eq!(state.progress(), 1.0);
    }
}
