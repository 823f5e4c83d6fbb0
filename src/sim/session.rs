//! Session engine: the single writer for score, time and balloons
//!
//! The host drives the engine with `tick(dt)` from its game loop and feeds
//! player input through `pop`. Time is tracked in whole milliseconds so the
//! 1 Hz countdown and the spawn cadence never drift.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use thiserror::Error;

use super::level::Level;
use super::placer::{SpawnPlacer, Viewport};
use super::policy::{self, SpawnLedger};
use super::state::{
    Balloon, BalloonId, OutcomeKind, Polarity, SessionEvent, SessionOutcome, SessionPhase,
    SessionState,
};
use crate::consts::*;
use crate::tuning::Tuning;

/// Commands rejected by the engine (state is left untouched)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("level {0} is out of range")]
    InvalidLevel(u32),
    #[error("level {0} is locked")]
    LevelLocked(u32),
    #[error("cannot set up a level while a session is active")]
    SessionActive,
    #[error("no level has been set up")]
    NotConfigured,
    #[error("retry is only valid after a session ends (phase {0:?})")]
    NotFinished(SessionPhase),
}

/// Owns one session at a time
#[derive(Debug, Clone)]
pub struct SessionEngine {
    tuning: Tuning,
    rng: Pcg32,
    level: Option<Level>,
    placer: Option<SpawnPlacer>,
    state: SessionState,
    /// Alive balloons, in spawn order
    balloons: Vec<Balloon>,
    /// Bumped on every start/stop; tags balloon ids
    generation: u32,
    next_serial: u32,
    clock_ms: u64,
    /// Sub-millisecond remainder of host deltas
    carry_ms: f64,
    countdown_ms: u64,
    spawn_ms: u64,
    spawn_interval_ms: u64,
    ledger: SpawnLedger,
    /// Countdown to the `ResultReady` event
    result_delay_ms: Option<u64>,
    outcome: Option<SessionOutcome>,
    events: Vec<SessionEvent>,
}

impl SessionEngine {
    pub fn new(seed: u64, tuning: Tuning) -> Self {
        Self {
            tuning: tuning.sanitized(),
            rng: Pcg32::seed_from_u64(seed),
            level: None,
            placer: None,
            state: SessionState::default(),
            balloons: Vec::new(),
            generation: 0,
            next_serial: 1,
            clock_ms: 0,
            carry_ms: 0.0,
            countdown_ms: 0,
            spawn_ms: 0,
            spawn_interval_ms: 0,
            ledger: SpawnLedger::default(),
            result_delay_ms: None,
            outcome: None,
            events: Vec::new(),
        }
    }

    /// Configure a level and precompute spawn positions; timers stay stopped
    pub fn setup(&mut self, level: u32, viewport: &Viewport) -> Result<(), SessionError> {
        if self.state.phase == SessionPhase::Active {
            log::warn!("Rejected setup of level {} during an active session", level);
            return Err(SessionError::SessionActive);
        }
        let params = Level::get(level).ok_or(SessionError::InvalidLevel(level))?;

        self.teardown();
        self.placer = Some(SpawnPlacer::precompute(viewport, &self.tuning, &mut self.rng));
        self.spawn_interval_ms = ((params.spawn_interval_secs * 1000.0).round() as u64).max(1);
        self.state = SessionState {
            level,
            points_needed: params.points_needed,
            time_remaining: params.time_allowed_secs,
            initial_time_limit: params.time_allowed_secs,
            ..Default::default()
        };
        self.level = Some(params);

        log::info!(
            "Level {} set up: {} points in {}s, spawn every {}ms",
            level,
            params.points_needed,
            params.time_allowed_secs,
            self.spawn_interval_ms
        );
        Ok(())
    }

    /// Begin (or restart) the configured level
    pub fn start(&mut self) -> Result<(), SessionError> {
        let level = self.level.ok_or(SessionError::NotConfigured)?;

        self.teardown();
        self.next_serial = 1;
        self.clock_ms = 0;
        self.carry_ms = 0.0;
        self.countdown_ms = 0;
        self.spawn_ms = 0;
        self.ledger = SpawnLedger::default();
        if let Some(placer) = self.placer.as_mut() {
            placer.reset();
        }
        self.state = SessionState {
            level: level.number,
            points_needed: level.points_needed,
            score: 0,
            time_remaining: level.time_allowed_secs,
            initial_time_limit: level.time_allowed_secs,
            phase: SessionPhase::Active,
            ..Default::default()
        };

        log::info!(
            "Level {} started (generation {})",
            level.number,
            self.generation
        );
        self.events.push(SessionEvent::Started {
            level: level.number,
            generation: self.generation,
        });
        Ok(())
    }

    /// Start again after the session ended
    pub fn retry(&mut self) -> Result<(), SessionError> {
        if !self.state.phase.is_terminal() {
            return Err(SessionError::NotFinished(self.state.phase));
        }
        self.start()
    }

    /// Abandon the session (back to Idle), cancelling everything pending
    pub fn stop(&mut self) {
        if self.state.phase == SessionPhase::Idle {
            return;
        }
        log::info!("Level {} stopped", self.state.level);
        self.teardown();
        self.state.phase = SessionPhase::Idle;
    }

    /// Drop balloons and pending timers; invalidates every outstanding id
    fn teardown(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        self.balloons.clear();
        self.result_delay_ms = None;
        self.outcome = None;
    }

    /// Advance the session by `dt` seconds
    pub fn tick(&mut self, dt: f32) {
        if !dt.is_finite() || dt <= 0.0 {
            return;
        }
        self.carry_ms += dt as f64 * 1000.0;
        let whole = self.carry_ms.floor();
        self.carry_ms -= whole;
        let mut remaining = whole as u64;

        while remaining > 0 {
            let step = remaining.min(MAX_STEP_MS);
            remaining -= step;
            match self.state.phase {
                SessionPhase::Active => self.step(step),
                SessionPhase::Complete | SessionPhase::Failed => {
                    if !self.step_result(step) {
                        return;
                    }
                }
                SessionPhase::Idle => return,
            }
        }
    }

    /// One bounded sub-step of active play
    fn step(&mut self, step_ms: u64) {
        self.clock_ms += step_ms;
        self.expire_due();

        self.spawn_ms += step_ms;
        while self.spawn_ms >= self.spawn_interval_ms {
            self.spawn_ms -= self.spawn_interval_ms;
            self.try_spawn();
        }

        self.countdown_ms += step_ms;
        while self.countdown_ms >= COUNTDOWN_PERIOD_MS
            && self.state.phase == SessionPhase::Active
        {
            self.countdown_ms -= COUNTDOWN_PERIOD_MS;
            self.countdown();
        }
    }

    /// Count down the acknowledgment delay; false once nothing is pending
    fn step_result(&mut self, step_ms: u64) -> bool {
        let Some(remaining) = self.result_delay_ms else {
            return false;
        };
        let remaining = remaining.saturating_sub(step_ms);
        if remaining == 0 {
            self.emit_result();
            false
        } else {
            self.result_delay_ms = Some(remaining);
            true
        }
    }

    fn emit_result(&mut self) {
        self.result_delay_ms = None;
        if let Some(outcome) = self.outcome.clone() {
            self.events.push(SessionEvent::ResultReady(outcome));
        }
    }

    fn countdown(&mut self) {
        self.state.time_remaining = self.state.time_remaining.saturating_sub(1);
        self.events.push(SessionEvent::TimeChanged {
            time_remaining: self.state.time_remaining,
        });
        if self.state.time_remaining == 0 {
            if self.state.target_reached() {
                self.complete();
            } else {
                self.fail();
            }
        }
    }

    fn expire_due(&mut self) {
        let now = self.clock_secs();
        let mut expired = Vec::new();
        self.balloons.retain(|b| {
            if b.expires_at() <= now {
                expired.push(b.id);
                false
            } else {
                true
            }
        });
        for id in expired {
            self.events.push(SessionEvent::BalloonExpired { id });
        }
    }

    fn try_spawn(&mut self) {
        if self.balloons.len() >= self.tuning.max_balloons || self.state.target_reached() {
            return;
        }
        let Some(level) = self.level else {
            return;
        };
        let pos = match self.placer.as_mut() {
            Some(placer) => placer.next_position().pos,
            None => return,
        };

        let polarity = policy::choose_polarity(
            level.number,
            self.clock_secs(),
            self.state.initial_time_limit as f32,
            &self.ledger,
            level.points_needed,
            &mut self.rng,
        );
        let points = policy::roll_points(&level, polarity, &mut self.rng);
        let lifetime = level.sample_lifetime(&mut self.rng);
        let color_index = self.rng.random_range(0..BALLOON_COLORS);

        let balloon = Balloon {
            id: self.allocate_id(),
            pos,
            polarity,
            points,
            color_index,
            spawned_at: self.clock_secs(),
            lifetime,
        };
        self.ledger.record(polarity, points);
        log::debug!(
            "Spawned {:?} balloon #{} worth {} at ({:.0}, {:.0})",
            polarity,
            balloon.id.serial,
            points,
            pos.x,
            pos.y
        );
        self.events.push(SessionEvent::BalloonSpawned {
            id: balloon.id,
            pos,
            polarity,
            points,
        });
        self.balloons.push(balloon);
    }

    fn allocate_id(&mut self) -> BalloonId {
        let serial = self.next_serial;
        self.next_serial += 1;
        BalloonId {
            generation: self.generation,
            serial,
        }
    }

    /// Pop a balloon; returns false (and changes nothing) if the id is not
    /// alive in the current session
    pub fn pop(&mut self, id: BalloonId) -> bool {
        if self.state.phase != SessionPhase::Active || id.generation != self.generation {
            return false;
        }
        let Some(index) = self.balloons.iter().position(|b| b.id == id) else {
            return false;
        };
        let balloon = self.balloons.remove(index);

        let before = self.state.time_remaining as i32;
        match balloon.polarity {
            Polarity::Positive => {
                let (lo, hi) = self.tuning.time_bonus;
                let bonus = self.rng.random_range(lo..=hi);
                self.state.score = self.state.score.saturating_add(balloon.points);
                self.state.time_remaining = self
                    .state
                    .time_remaining
                    .saturating_add(bonus)
                    .min(self.state.initial_time_limit);
            }
            Polarity::Negative => {
                let (lo, hi) = self.tuning.time_penalty;
                let penalty = self.rng.random_range(lo..=hi);
                self.state.score = self.state.score.saturating_sub(balloon.points);
                self.state.time_remaining = self.state.time_remaining.saturating_sub(penalty);
            }
        }
        let time_delta = self.state.time_remaining as i32 - before;
        self.state.stats.record(balloon.polarity);

        log::debug!(
            "Popped {:?} balloon #{} ({} pts, {:+}s): score {}/{}",
            balloon.polarity,
            id.serial,
            balloon.points,
            time_delta,
            self.state.score,
            self.state.points_needed
        );
        self.events.push(SessionEvent::BalloonPopped {
            id,
            pos: balloon.pos,
            polarity: balloon.polarity,
            points: balloon.points,
            time_delta,
        });

        if self.state.target_reached() {
            self.complete();
        }
        true
    }

    /// Remove a balloon whose lifetime ran out (for hosts that schedule
    /// expiry themselves); stale ids are ignored
    pub fn expire(&mut self, id: BalloonId) -> bool {
        if self.state.phase != SessionPhase::Active || id.generation != self.generation {
            return false;
        }
        let Some(index) = self.balloons.iter().position(|b| b.id == id) else {
            return false;
        };
        self.balloons.remove(index);
        self.events.push(SessionEvent::BalloonExpired { id });
        true
    }

    fn complete(&mut self) {
        let stars = self
            .level
            .map(|level| level.stars_for(self.state.stats.total_popped))
            .unwrap_or(1);
        let message = format!("Level {} complete!", self.state.level);
        log::info!(
            "Level {} complete: {} points, {} popped, {} stars",
            self.state.level,
            self.state.score,
            self.state.stats.total_popped,
            stars
        );
        self.enter_terminal(SessionPhase::Complete, stars, message);
        self.events.push(SessionEvent::Completed { stars });
    }

    fn fail(&mut self) {
        let message = format!(
            "Time's up! You scored {} of {} points.",
            self.state.score, self.state.points_needed
        );
        log::info!(
            "Level {} failed: {}/{} points",
            self.state.level,
            self.state.score,
            self.state.points_needed
        );
        self.enter_terminal(SessionPhase::Failed, 0, message.clone());
        self.events.push(SessionEvent::Failed { message });
    }

    fn enter_terminal(&mut self, phase: SessionPhase, stars: u8, message: String) {
        self.balloons.clear();
        self.state.phase = phase;
        self.state.star_rating = stars;
        self.outcome = Some(SessionOutcome {
            level: self.state.level,
            kind: match phase {
                SessionPhase::Complete => OutcomeKind::Completed,
                _ => OutcomeKind::Failed,
            },
            score: self.state.score,
            points_needed: self.state.points_needed,
            stars,
            stats: self.state.stats,
            message,
        });
        self.result_delay_ms = Some((self.tuning.result_delay_secs * 1000.0).round() as u64);
    }

    /// Take all events produced since the last call
    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        let mut events = std::mem::take(&mut self.events);
        // A zero delay means the result is due immediately
        if self.result_delay_ms == Some(0) {
            self.emit_result();
            events.append(&mut self.events);
        }
        events
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn phase(&self) -> SessionPhase {
        self.state.phase
    }

    pub fn balloons(&self) -> &[Balloon] {
        &self.balloons
    }

    pub fn balloon(&self, id: BalloonId) -> Option<&Balloon> {
        self.balloons.iter().find(|b| b.id == id)
    }

    pub fn level(&self) -> Option<&Level> {
        self.level.as_ref()
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn ledger(&self) -> &SpawnLedger {
        &self.ledger
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    /// Outcome of the finished session, if it has ended
    pub fn outcome(&self) -> Option<&SessionOutcome> {
        self.outcome.as_ref()
    }

    /// Seconds since `start`
    pub fn clock_secs(&self) -> f32 {
        self.clock_ms as f32 / 1000.0
    }
}

#[cfg(test)]
impl SessionEngine {
    /// Place a balloon directly, bypassing the spawn policy and cap
    fn inject(&mut self, polarity: Polarity, points: u32, lifetime: f32) -> BalloonId {
        let id = self.allocate_id();
        self.balloons.push(Balloon {
            id,
            pos: glam::Vec2::new(100.0, 300.0),
            polarity,
            points,
            color_index: 0,
            spawned_at: self.clock_secs(),
            lifetime,
        });
        id
    }

    fn pop_injected(&mut self, polarity: Polarity, points: u32) -> bool {
        let id = self.inject(polarity, points, 10.0);
        self.pop(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn viewport() -> Viewport {
        Viewport::new(390.0, 844.0).with_bands(60.0, 50.0, 80.0)
    }

    fn started(level: u32, seed: u64) -> SessionEngine {
        let mut engine = SessionEngine::new(seed, Tuning::default());
        engine.setup(level, &viewport()).unwrap();
        engine.start().unwrap();
        engine
    }

    #[test]
    fn test_setup_then_start() {
        let mut engine = SessionEngine::new(1, Tuning::default());
        assert_eq!(engine.start(), Err(SessionError::NotConfigured));

        engine.setup(2, &viewport()).unwrap();
        assert_eq!(engine.phase(), SessionPhase::Idle);
        engine.tick(5.0);
        assert!(engine.balloons().is_empty(), "setup must not start timers");

        engine.start().unwrap();
        assert_eq!(engine.phase(), SessionPhase::Active);
        assert_eq!(engine.state().time_remaining, 45);
        assert_eq!(engine.state().initial_time_limit, 45);
        assert_eq!(engine.state().points_needed, 25);
    }

    #[test]
    fn test_setup_rejections() {
        let mut engine = started(1, 1);
        assert_eq!(
            engine.setup(2, &viewport()),
            Err(SessionError::SessionActive)
        );
        assert_eq!(engine.state().level, 1);

        engine.stop();
        assert_eq!(
            engine.setup(0, &viewport()),
            Err(SessionError::InvalidLevel(0))
        );
        assert_eq!(
            engine.setup(51, &viewport()),
            Err(SessionError::InvalidLevel(51))
        );
        assert!(engine.setup(50, &viewport()).is_ok());
    }

    #[test]
    fn test_spawning_respects_cap() {
        let mut engine = started(10, 42);
        for _ in 0..200 {
            engine.tick(0.1);
            assert!(engine.balloons().len() <= engine.tuning().max_balloons);
            if engine.phase() != SessionPhase::Active {
                break;
            }
        }
        let spawned = engine
            .drain_events()
            .iter()
            .filter(|e| matches!(e, SessionEvent::BalloonSpawned { .. }))
            .count();
        assert!(spawned > 8, "balloons should keep spawning as others expire");
    }

    #[test]
    fn test_ids_are_monotonic_and_reset_on_start() {
        let mut engine = started(1, 3);
        engine.tick(3.0);
        let serials: Vec<u32> = engine.balloons().iter().map(|b| b.id.serial).collect();
        assert!(!serials.is_empty());
        assert!(serials.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(serials[0], 1);

        engine.start().unwrap();
        engine.tick(0.5);
        assert_eq!(engine.balloons()[0].id.serial, 1);
    }

    #[test]
    fn test_completion_is_immediate() {
        let mut engine = started(1, 5);
        for _ in 0..9 {
            assert!(engine.pop_injected(Polarity::Positive, 1));
            assert_eq!(engine.phase(), SessionPhase::Active);
        }
        assert!(engine.pop_injected(Polarity::Positive, 1));
        assert_eq!(engine.phase(), SessionPhase::Complete);
        assert!(engine.balloons().is_empty());
        // optimal for level 1 is ceil(10/1) + 2 = 12
        assert_eq!(engine.state().star_rating, 3);
        assert_eq!(engine.outcome().unwrap().kind, OutcomeKind::Completed);
    }

    fn finish_level_five(pops: &[(u32, u32)]) -> u8 {
        let mut engine = started(5, 11);
        for &(count, points) in pops {
            for _ in 0..count {
                assert_eq!(engine.phase(), SessionPhase::Active);
                engine.pop_injected(Polarity::Positive, points);
            }
        }
        assert_eq!(engine.phase(), SessionPhase::Complete);
        assert_eq!(engine.state().stats.total_popped, pops.iter().map(|p| p.0).sum::<u32>());
        engine.state().star_rating
    }

    #[test]
    fn test_star_ratings_level_five() {
        // 22 pops -> 3 stars
        assert_eq!(finish_level_five(&[(20, 4), (2, 10)]), 3);
        // 30 pops -> 2 stars
        assert_eq!(finish_level_five(&[(29, 3), (1, 13)]), 2);
        // 40 pops -> 1 star
        assert_eq!(finish_level_five(&[(39, 2), (1, 22)]), 1);
    }

    #[test]
    fn test_failure_when_time_runs_out() {
        let mut engine = started(1, 8);
        for _ in 0..29 {
            engine.tick(1.0);
        }
        assert_eq!(engine.phase(), SessionPhase::Active);
        assert_eq!(engine.state().time_remaining, 1);

        engine.tick(1.0);
        assert_eq!(engine.phase(), SessionPhase::Failed);
        assert_eq!(engine.state().star_rating, 0);
        assert!(engine.balloons().is_empty());

        let events = engine.drain_events();
        assert!(events.iter().any(|e| matches!(e, SessionEvent::Failed { .. })));
    }

    #[test]
    fn test_fractional_ticks_do_not_drift() {
        let mut engine = started(1, 8);
        for _ in 0..299 {
            engine.tick(0.1);
        }
        assert_eq!(engine.phase(), SessionPhase::Active);
        engine.tick(0.1);
        assert_eq!(engine.phase(), SessionPhase::Failed);
    }

    #[test]
    fn test_negative_pop_clamps_score_and_time() {
        let mut engine = started(3, 9);
        engine.pop_injected(Polarity::Positive, 2);
        assert_eq!(engine.state().score, 2);

        engine.pop_injected(Polarity::Negative, 3);
        assert_eq!(engine.state().score, 0);
        let time = engine.state().time_remaining;
        assert!((55..=57).contains(&time), "penalty of 3-5s, got {time}");
        assert_eq!(engine.state().stats.negative_popped, 1);
        assert_eq!(engine.state().stats.positive_popped, 1);
    }

    #[test]
    fn test_time_bonus_is_capped() {
        let mut engine = started(1, 10);
        engine.pop_injected(Polarity::Positive, 1);
        assert_eq!(engine.state().time_remaining, 30);

        engine.tick(5.0);
        engine.pop_injected(Polarity::Positive, 1);
        let time = engine.state().time_remaining;
        assert!((26..=27).contains(&time), "bonus of 1-2s, got {time}");
    }

    #[test]
    fn test_penalty_to_zero_waits_for_countdown() {
        let mut engine = started(1, 12);
        engine.tick(28.0);
        assert_eq!(engine.state().time_remaining, 2);
        engine.pop_injected(Polarity::Negative, 1);
        assert_eq!(engine.state().time_remaining, 0);
        assert_eq!(engine.phase(), SessionPhase::Active);

        engine.tick(1.0);
        assert_eq!(engine.phase(), SessionPhase::Failed);
    }

    #[test]
    fn test_bonus_after_penalty_to_zero_keeps_session_alive() {
        let mut engine = started(1, 12);
        engine.tick(28.0);
        engine.pop_injected(Polarity::Negative, 1);
        assert_eq!(engine.state().time_remaining, 0);

        assert!(engine.pop_injected(Polarity::Positive, 1));
        assert_eq!(engine.state().score, 1);
        let time = engine.state().time_remaining;
        assert!((1..=2).contains(&time), "bonus of 1-2s, got {time}");
        assert_eq!(engine.phase(), SessionPhase::Active);

        engine.tick(2.0);
        assert_eq!(engine.phase(), SessionPhase::Failed);
    }

    #[test]
    fn test_pop_at_zero_time_can_still_complete() {
        let mut engine = started(1, 15);
        engine.tick(28.0);
        engine.pop_injected(Polarity::Negative, 1);
        assert_eq!(engine.state().time_remaining, 0);

        assert!(engine.pop_injected(Polarity::Positive, 10));
        assert_eq!(engine.phase(), SessionPhase::Complete);
    }

    #[test]
    fn test_pop_is_idempotent() {
        let mut engine = started(4, 13);
        let id = engine.inject(Polarity::Positive, 3, 10.0);
        assert!(engine.pop(id));
        let snapshot = engine.state().clone();
        assert!(!engine.pop(id));
        assert_eq!(engine.state(), &snapshot);
    }

    #[test]
    fn test_stale_ids_do_not_leak_into_new_session() {
        let mut engine = started(2, 14);
        let old = engine.inject(Polarity::Positive, 2, 3.0);

        engine.start().unwrap();
        let fresh = engine.inject(Polarity::Positive, 2, 3.0);
        assert_eq!(old.serial, fresh.serial);
        assert_ne!(old, fresh);

        assert!(!engine.expire(old));
        assert!(!engine.pop(old));
        assert!(engine.balloon(fresh).is_some());
        assert_eq!(engine.state().score, 0);

        assert!(engine.expire(fresh));
        assert!(engine.balloon(fresh).is_none());
    }

    #[test]
    fn test_stop_cancels_pending_work() {
        let mut engine = started(1, 15);
        let id = engine.inject(Polarity::Positive, 1, 1.0);
        engine.stop();
        assert_eq!(engine.phase(), SessionPhase::Idle);
        assert!(engine.balloons().is_empty());
        engine.tick(3.0);
        assert!(!engine.pop(id));
        assert_eq!(engine.phase(), SessionPhase::Idle);
    }

    #[test]
    fn test_natural_expiry_is_silent() {
        let mut engine = started(1, 16);
        // Fill to the cap so nothing else spawns over the window
        for _ in 0..8 {
            engine.inject(Polarity::Positive, 1, 2.0);
        }
        engine.drain_events();
        engine.tick(2.0);
        let events = engine.drain_events();
        let expired = events
            .iter()
            .filter(|e| matches!(e, SessionEvent::BalloonExpired { .. }))
            .count();
        assert_eq!(expired, 8);
        assert_eq!(engine.state().score, 0);
        assert_eq!(engine.state().stats.total_popped, 0);
    }

    #[test]
    fn test_result_event_waits_for_delay() {
        let mut engine = started(1, 17);
        for _ in 0..10 {
            engine.pop_injected(Polarity::Positive, 1);
        }
        let events = engine.drain_events();
        assert!(events.iter().any(|e| matches!(e, SessionEvent::Completed { stars: 3 })));
        assert!(!events.iter().any(|e| matches!(e, SessionEvent::ResultReady(_))));

        engine.tick(1.0);
        assert!(engine.drain_events().is_empty());
        engine.tick(0.5);
        let events = engine.drain_events();
        match events.as_slice() {
            [SessionEvent::ResultReady(outcome)] => {
                assert_eq!(outcome.level, 1);
                assert_eq!(outcome.stars, 3);
                assert_eq!(outcome.score, 10);
            }
            other => panic!("unexpected events: {other:?}"),
        }
    }

    #[test]
    fn test_zero_result_delay_emits_on_drain() {
        let tuning = Tuning {
            result_delay_secs: 0.0,
            ..Default::default()
        };
        let mut engine = SessionEngine::new(18, tuning);
        engine.setup(1, &viewport()).unwrap();
        engine.start().unwrap();
        for _ in 0..10 {
            engine.pop_injected(Polarity::Positive, 1);
        }
        let events = engine.drain_events();
        assert!(matches!(events.last(), Some(SessionEvent::ResultReady(_))));
    }

    #[test]
    fn test_retry_only_after_end() {
        let mut engine = started(1, 19);
        assert_eq!(
            engine.retry(),
            Err(SessionError::NotFinished(SessionPhase::Active))
        );
        engine.tick(30.0);
        assert_eq!(engine.phase(), SessionPhase::Failed);
        engine.retry().unwrap();
        assert_eq!(engine.phase(), SessionPhase::Active);
        assert_eq!(engine.state().time_remaining, 30);
        assert_eq!(engine.state().stats.total_popped, 0);
        assert!(engine.outcome().is_none());
    }

    #[test]
    fn test_determinism() {
        let mut a = started(7, 99999);
        let mut b = started(7, 99999);
        for _ in 0..40 {
            a.tick(0.25);
            b.tick(0.25);
            if let Some(id) = a.balloons().first().map(|x| x.id) {
                a.pop(id);
                b.pop(id);
            }
        }
        assert_eq!(a.state(), b.state());
        assert_eq!(a.balloons().len(), b.balloons().len());
        for (x, y) in a.balloons().iter().zip(b.balloons()) {
            assert_eq!(x.pos, y.pos);
            assert_eq!(x.points, y.points);
        }
    }

    proptest! {
        #[test]
        fn prop_score_and_time_stay_in_bounds(
            seed in any::<u64>(),
            level in 1u32..=50,
            actions in proptest::collection::vec((0u32..2000, any::<prop::sample::Index>()), 1..120),
        ) {
            let mut engine = started(level, seed);
            for (dt_ms, pick) in actions {
                engine.tick(dt_ms as f32 / 1000.0);
                if !engine.balloons().is_empty() {
                    let id = engine.balloons()[pick.index(engine.balloons().len())].id;
                    engine.pop(id);
                }
                let state = engine.state();
                prop_assert!(state.time_remaining <= state.initial_time_limit);
                prop_assert!(engine.balloons().len() <= engine.tuning().max_balloons);
                match state.phase {
                    SessionPhase::Active => {
                        prop_assert!(state.score < state.points_needed);
                    }
                    SessionPhase::Complete => prop_assert!(state.score >= state.points_needed),
                    SessionPhase::Failed => prop_assert_eq!(state.star_rating, 0),
                    SessionPhase::Idle => prop_assert!(false, "session fell back to idle"),
                }
            }
        }
    }
}
