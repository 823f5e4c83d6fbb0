//! Positive/negative balancing for new balloons
//!
//! Over a whole session the spawner aims to offer 1.8x the target in
//! positive points and 0.6x in negative points, spread evenly in time.
//! While a budget is behind schedule it gets priority; once both are met the
//! mix falls back to a flatter random split.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::level;
use super::state::Polarity;
use crate::consts::{NEGATIVE_BUDGET_FACTOR, POSITIVE_BUDGET_FACTOR};

/// Points spawned so far this session, per polarity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnLedger {
    pub positive_points: u32,
    pub negative_points: u32,
}

impl SpawnLedger {
    pub fn record(&mut self, polarity: Polarity, points: u32) {
        match polarity {
            Polarity::Positive => self.positive_points += points,
            Polarity::Negative => self.negative_points += points,
        }
    }
}

/// Decide whether the next balloon is positive
pub fn should_spawn_positive<R: Rng>(
    level: u32,
    elapsed_secs: f32,
    total_secs: f32,
    positive_spawned: u32,
    negative_spawned: u32,
    points_needed: u32,
    rng: &mut R,
) -> bool {
    let progress = if total_secs > 0.0 {
        (elapsed_secs / total_secs).clamp(0.0, 1.0)
    } else {
        1.0
    };
    let needed = points_needed as f32;
    let positive_target = needed * POSITIVE_BUDGET_FACTOR * progress;
    let negative_target = needed * NEGATIVE_BUDGET_FACTOR * progress;

    let positive_behind = (positive_spawned as f32) < positive_target;
    let negative_behind = (negative_spawned as f32) < negative_target;

    match (positive_behind, negative_behind) {
        (true, true) => rng.random_bool(level::positive_bias(level) as f64),
        (true, false) => true,
        (false, true) => false,
        (false, false) => rng.random_bool(level::fallback_positive_bias(level) as f64),
    }
}

/// Pick the polarity for the next balloon from the session ledger
pub fn choose_polarity<R: Rng>(
    level: u32,
    elapsed_secs: f32,
    total_secs: f32,
    ledger: &SpawnLedger,
    points_needed: u32,
    rng: &mut R,
) -> Polarity {
    if should_spawn_positive(
        level,
        elapsed_secs,
        total_secs,
        ledger.positive_points,
        ledger.negative_points,
        points_needed,
        rng,
    ) {
        Polarity::Positive
    } else {
        Polarity::Negative
    }
}

/// Roll a point value for a balloon of the given polarity
pub fn roll_points<R: Rng>(level: &level::Level, polarity: Polarity, rng: &mut R) -> u32 {
    let (lo, hi) = match polarity {
        Polarity::Positive => level.positive_point_range,
        Polarity::Negative => level.negative_point_range,
    };
    rng.random_range(lo..=hi.max(lo))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_forces_positive_when_only_positive_behind() {
        let mut rng = Pcg32::seed_from_u64(1);
        // Halfway through level 3: targets are 40.5 positive, 13.5 negative
        for _ in 0..50 {
            assert!(should_spawn_positive(3, 30.0, 60.0, 10, 20, 45, &mut rng));
        }
    }

    #[test]
    fn test_forces_negative_when_only_negative_behind() {
        let mut rng = Pcg32::seed_from_u64(2);
        for _ in 0..50 {
            assert!(!should_spawn_positive(3, 30.0, 60.0, 60, 0, 45, &mut rng));
        }
    }

    #[test]
    fn test_both_behind_uses_level_bias() {
        let mut rng = Pcg32::seed_from_u64(3);
        let trials = 4000;
        let positives = (0..trials)
            .filter(|_| should_spawn_positive(1, 15.0, 30.0, 0, 0, 10, &mut rng))
            .count();
        let ratio = positives as f32 / trials as f32;
        // positive_bias(1) = 0.75
        assert!((ratio - 0.75).abs() < 0.05, "ratio {ratio}");
    }

    #[test]
    fn test_both_ahead_uses_fallback_bias() {
        let mut rng = Pcg32::seed_from_u64(4);
        let trials = 4000;
        // At the very start both targets are zero, so neither budget is behind
        let positives = (0..trials)
            .filter(|_| should_spawn_positive(20, 0.0, 90.0, 0, 0, 550, &mut rng))
            .count();
        let ratio = positives as f32 / trials as f32;
        // fallback_positive_bias(20) = 0.4
        assert!((ratio - 0.4).abs() < 0.05, "ratio {ratio}");
    }

    #[test]
    fn test_zero_total_time_counts_as_finished() {
        let mut rng = Pcg32::seed_from_u64(5);
        // progress = 1.0: positive target 18, negative target 6
        assert!(should_spawn_positive(1, 0.0, 0.0, 0, 10, 10, &mut rng));
    }

    #[test]
    fn test_roll_points_within_level_range() {
        let mut rng = Pcg32::seed_from_u64(6);
        let level = level::Level::get(12).unwrap();
        for _ in 0..500 {
            let pts = roll_points(&level, Polarity::Negative, &mut rng);
            assert!((1..=12).contains(&pts));
        }
        let first = level::Level::get(1).unwrap();
        assert_eq!(roll_points(&first, Polarity::Positive, &mut rng), 1);
    }

    #[test]
    fn test_ledger_records_by_polarity() {
        let mut ledger = SpawnLedger::default();
        ledger.record(Polarity::Positive, 4);
        ledger.record(Polarity::Negative, 2);
        ledger.record(Polarity::Positive, 1);
        assert_eq!(ledger.positive_points, 5);
        assert_eq!(ledger.negative_points, 2);
    }
}
