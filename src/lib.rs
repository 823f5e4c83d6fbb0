//! Balloon Pop - A timed balloon-popping arcade game
//!
//! Core modules:
//! - `sim`: Deterministic session engine (levels, spawning, scoring)
//! - `progression`: Unlocked/completed levels, stars and lifetime stats
//! - `persistence`: Key-value stores and debounced saving
//! - `platform`: Browser/native platform abstraction
//! - `tuning`: Data-driven game balance
//! - `feedback`: Fire-and-forget audio/haptic/particle cues
//! - `host`: Engine wired to progression and settings for the front ends
//! - `web`: JS bindings (wasm32 only)

pub mod feedback;
pub mod host;
pub mod persistence;
pub mod platform;
pub mod progression;
pub mod settings;
pub mod sim;
pub mod tuning;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use feedback::{FeedbackCue, FeedbackSink};
pub use host::GameHost;
pub use progression::{ProgressionState, ProgressionTracker};
pub use settings::Settings;
pub use tuning::Tuning;

/// Game configuration constants
pub mod consts {
    /// Number of levels in the game
    pub const MAX_LEVEL: u32 = 50;

    /// Largest sub-step a single `tick` call is split into (milliseconds)
    pub const MAX_STEP_MS: u64 = 50;

    /// Countdown period (1 Hz)
    pub const COUNTDOWN_PERIOD_MS: u64 = 1000;

    /// Spawn interval floor (seconds)
    pub const MIN_SPAWN_INTERVAL: f32 = 0.2;

    /// Shortest base lifetime a balloon can have (seconds)
    pub const MIN_LIFETIME_BASE: f32 = 2.5;
    /// Width of the lifetime sampling window above the base (seconds)
    pub const LIFETIME_SPREAD: f32 = 1.0;

    /// Positive points spawned over a full session, as a multiple of the target
    pub const POSITIVE_BUDGET_FACTOR: f32 = 1.8;
    /// Negative points spawned over a full session, as a multiple of the target
    pub const NEGATIVE_BUDGET_FACTOR: f32 = 0.6;

    /// Upper bound on the precomputed spawn grid; larger areas get a wider spacing
    pub const MAX_SPAWN_CANDIDATES: usize = 4096;

    /// Number of failures in a row that locks the previous level
    pub const FAILURES_BEFORE_LOCK: u32 = 3;

    /// Number of distinct balloon colors the renderer knows about
    pub const BALLOON_COLORS: u8 = 6;
}
