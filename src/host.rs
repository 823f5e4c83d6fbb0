//! Game host: one session engine wired to progression, settings and feedback
//!
//! Both front ends (the headless binary and the browser bindings) drive the
//! game through this type, so the rules for recording a finished session live
//! in one place.

use crate::feedback::{self, FeedbackSink};
use crate::persistence::{Store, StoreError};
use crate::platform;
use crate::progression::ProgressionTracker;
use crate::settings::Settings;
use crate::sim::{BalloonId, SessionEngine, SessionError, SessionEvent, Viewport};
use crate::tuning::Tuning;

pub struct GameHost<S: Store> {
    engine: SessionEngine,
    progression: ProgressionTracker<S>,
    settings: Settings,
    viewport: Viewport,
    /// Generation whose outcome progression has already recorded
    recorded: Option<u32>,
}

impl<S: Store> GameHost<S> {
    pub fn new(store: S, seed: u64, tuning: Tuning, viewport: Viewport) -> Self {
        let settings = Settings::load(&store);
        let progression = ProgressionTracker::load(store, tuning.save_debounce_secs);
        Self {
            engine: SessionEngine::new(seed, tuning),
            progression,
            settings,
            viewport,
            recorded: None,
        }
    }

    pub fn engine(&self) -> &SessionEngine {
        &self.engine
    }

    /// Direct engine access for bots and tools
    pub fn engine_mut(&mut self) -> &mut SessionEngine {
        &mut self.engine
    }

    pub fn progression(&self) -> &ProgressionTracker<S> {
        &self.progression
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// New screen size; used from the next `setup`
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub fn select_level(&mut self, level: u32) -> bool {
        self.progression.select_level(level)
    }

    /// Configure a level for play; locked levels are refused
    pub fn setup(&mut self, level: u32) -> Result<(), SessionError> {
        if !self.progression.is_unlocked(level) {
            log::warn!("Refusing to set up locked level {}", level);
            return Err(SessionError::LevelLocked(level));
        }
        self.engine.setup(level, &self.viewport)
    }

    /// Set up and start the currently selected level
    pub fn play_selected(&mut self) -> Result<(), SessionError> {
        let level = self.progression.selected_level();
        self.setup(level)?;
        self.engine.start()
    }

    pub fn start(&mut self) -> Result<(), SessionError> {
        self.engine.start()
    }

    pub fn retry(&mut self) -> Result<(), SessionError> {
        self.engine.retry()
    }

    pub fn stop(&mut self) {
        self.engine.stop();
    }

    /// Advance the session and the save debouncer
    pub fn tick(&mut self, dt: f32) {
        self.engine.tick(dt);
        self.progression.tick(dt);
    }

    pub fn pop(&mut self, id: BalloonId) -> bool {
        self.engine.pop(id)
    }

    /// Drain session events, forwarding their cues to `sink`
    pub fn drain_events(&mut self, sink: &mut dyn FeedbackSink) -> Vec<SessionEvent> {
        let events = self.engine.drain_events();
        feedback::dispatch(&events, &self.settings, sink);
        events
    }

    /// Record the finished session in progression (once per session)
    pub fn apply_outcome(&mut self) -> bool {
        let generation = self.engine.generation();
        if self.recorded == Some(generation) {
            return false;
        }
        let Some(outcome) = self.engine.outcome().cloned() else {
            return false;
        };
        self.progression.apply_outcome(&outcome, platform::now_ms());
        self.recorded = Some(generation);
        true
    }

    pub fn flush(&mut self) -> Result<(), StoreError> {
        self.progression.flush()
    }
}
