//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Host-supplied time deltas only (no timers, no wall clock)
//! - Seeded RNG only
//! - Stable iteration order (spawn order)
//! - No rendering or platform dependencies

pub mod autoplay;
pub mod level;
pub mod placer;
pub mod policy;
pub mod session;
pub mod state;

pub use autoplay::AutoPlayer;
pub use level::{Level, StarThresholds};
pub use placer::{Placement, SpawnPlacer, Viewport};
pub use policy::{SpawnLedger, choose_polarity, roll_points, should_spawn_positive};
pub use session::{SessionEngine, SessionError};
pub use state::{
    Balloon, BalloonId, OutcomeKind, Polarity, SessionEvent, SessionOutcome, SessionPhase,
    SessionState, SessionStats,
};
