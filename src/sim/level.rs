//! Level table: difficulty curve for levels 1..=50
//!
//! Everything here is a pure function of the level number, except the
//! per-balloon lifetime which is sampled from the level's range.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Balloon-count thresholds for the star rating
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StarThresholds {
    /// Pop at most this many balloons for 3 stars
    pub three: u32,
    /// Pop at most this many balloons for 2 stars
    pub two: u32,
}

/// Derived parameters for a single level
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Level {
    pub number: u32,
    pub points_needed: u32,
    pub time_allowed_secs: u32,
    pub spawn_interval_secs: f32,
    /// Lifetime sampling range (seconds, inclusive)
    pub lifetime_range: (f32, f32),
    pub positive_point_range: (u32, u32),
    pub negative_point_range: (u32, u32),
    /// Chance of a positive balloon while both spawn budgets are open
    pub positive_bias: f32,
    pub star_thresholds: StarThresholds,
}

impl Level {
    /// Look up a level, `None` outside 1..=MAX_LEVEL
    pub fn get(number: u32) -> Option<Self> {
        if !is_valid(number) {
            return None;
        }
        let base = lifetime_base(number);
        Some(Self {
            number,
            points_needed: points_needed(number),
            time_allowed_secs: time_allowed(number),
            spawn_interval_secs: spawn_interval(number),
            lifetime_range: (base, base + LIFETIME_SPREAD),
            positive_point_range: point_range(number),
            negative_point_range: point_range(number),
            positive_bias: positive_bias(number),
            star_thresholds: star_thresholds(number),
        })
    }

    /// Sample a fresh lifetime for one balloon
    pub fn sample_lifetime<R: Rng>(&self, rng: &mut R) -> f32 {
        let (lo, hi) = self.lifetime_range;
        rng.random_range(lo..=hi)
    }

    /// Stars earned for completing this level with `popped` balloons
    pub fn stars_for(&self, popped: u32) -> u8 {
        if popped <= self.star_thresholds.three {
            3
        } else if popped <= self.star_thresholds.two {
            2
        } else {
            1
        }
    }
}

/// Whether `level` is a playable level number
#[inline]
pub fn is_valid(level: u32) -> bool {
    (1..=MAX_LEVEL).contains(&level)
}

#[inline]
fn clamp_level(level: u32) -> u32 {
    level.clamp(1, MAX_LEVEL)
}

/// Score target for a level
pub fn points_needed(level: u32) -> u32 {
    match clamp_level(level) {
        1 => 10,
        2 => 25,
        3 => 45,
        4 => 70,
        5 => 100,
        n => 100 + (n - 5) * 30,
    }
}

/// Time limit for a level (seconds)
pub fn time_allowed(level: u32) -> u32 {
    match clamp_level(level) {
        1 => 30,
        2 => 45,
        3 => 60,
        4 => 75,
        _ => 90,
    }
}

/// Seconds between spawn attempts, floored at MIN_SPAWN_INTERVAL
pub fn spawn_interval(level: u32) -> f32 {
    let steps = (clamp_level(level) - 1) as f32;
    (0.4 - steps * 0.02).max(MIN_SPAWN_INTERVAL)
}

/// Lower bound of the lifetime window
pub fn lifetime_base(level: u32) -> f32 {
    let steps = (clamp_level(level) - 1) as f32;
    (4.5 - steps * 0.2).max(MIN_LIFETIME_BASE)
}

/// Point range for both polarities: 1..=level
///
/// Uncapped on purpose: late levels can award more than the remaining target
/// in a single pop.
pub fn point_range(level: u32) -> (u32, u32) {
    (1, clamp_level(level))
}

/// Chance of positive while both spawn budgets are still open
pub fn positive_bias(level: u32) -> f32 {
    (0.8 - clamp_level(level) as f32 * 0.05).max(0.5)
}

/// Chance of positive once both spawn budgets are exhausted
pub fn fallback_positive_bias(level: u32) -> f32 {
    (0.7 - clamp_level(level) as f32 * 0.05).max(0.4)
}

/// Estimated minimum number of pops needed to clear a level
pub fn optimal_balloons(level: u32) -> u32 {
    let level = clamp_level(level);
    points_needed(level).div_ceil(level) + 2
}

pub fn star_thresholds(level: u32) -> StarThresholds {
    let optimal = optimal_balloons(level);
    StarThresholds {
        three: optimal,
        // popped <= optimal * 1.5
        two: optimal * 3 / 2,
    }
}
