//! Data-driven game balance
//!
//! Constants that were picked empirically live here rather than in
//! `consts`, so they can be tweaked from a JSON file without a rebuild.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced while loading tuning data
#[derive(Debug, Error)]
pub enum TuningError {
    #[error("invalid tuning JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Tunable balance constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Concurrent balloon cap
    pub max_balloons: usize,
    /// Spacing between candidate spawn points
    pub grid_spacing: f32,
    /// Inset from the edges of the safe area (keeps balloons fully on screen)
    pub edge_margin: f32,
    /// Minimum distance from recently used spawn points
    pub min_spawn_distance: f32,
    /// How many recent spawn points the distance rule looks at
    pub recent_window: usize,
    /// Candidates tried before the distance rule is relaxed
    pub placement_attempts: u32,
    /// Seconds added by a positive pop (inclusive range)
    pub time_bonus: (u32, u32),
    /// Seconds removed by a negative pop (inclusive range)
    pub time_penalty: (u32, u32),
    /// Delay between the terminal phase and the result event (seconds)
    pub result_delay_secs: f32,
    /// Quiet period before progression changes are written (seconds)
    pub save_debounce_secs: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            max_balloons: 8,
            grid_spacing: 35.0,
            edge_margin: 40.0,
            min_spawn_distance: 50.0,
            recent_window: 8,
            placement_attempts: 10,
            time_bonus: (1, 2),
            time_penalty: (3, 5),
            result_delay_secs: 1.5,
            save_debounce_secs: 0.5,
        }
    }
}

impl Tuning {
    /// Parse tuning from JSON; missing fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        Ok(tuning.sanitized())
    }

    /// Clamp values that would otherwise stall or break the engine
    pub fn sanitized(mut self) -> Self {
        self.max_balloons = self.max_balloons.max(1);
        self.grid_spacing = if self.grid_spacing.is_finite() {
            self.grid_spacing.max(1.0)
        } else {
            Self::default().grid_spacing
        };
        self.edge_margin = self.edge_margin.max(0.0);
        self.min_spawn_distance = self.min_spawn_distance.max(0.0);
        self.recent_window = self.recent_window.max(1);
        self.placement_attempts = self.placement_attempts.max(1);
        if self.time_bonus.0 > self.time_bonus.1 {
            self.time_bonus = (self.time_bonus.1, self.time_bonus.0);
        }
        if self.time_penalty.0 > self.time_penalty.1 {
            self.time_penalty = (self.time_penalty.1, self.time_penalty.0);
        }
        self.result_delay_secs = self.result_delay_secs.max(0.0);
        self.save_debounce_secs = self.save_debounce_secs.max(0.0);
        self
    }
}
