//! Cross-session progression: unlocked levels, stars, lifetime stats
//!
//! Persisted to the platform store under a single key. Writes are
//! debounced; finishing a session flushes immediately.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::consts::{FAILURES_BEFORE_LOCK, MAX_LEVEL};
use crate::persistence::{SaveDebouncer, Store, StoreError, load_json, save_json};
use crate::sim::level;
use crate::sim::{OutcomeKind, SessionOutcome, SessionStats};

/// Totals across every session ever played
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LifetimeStats {
    pub sessions_played: u32,
    pub sessions_completed: u32,
    pub sessions_failed: u32,
    pub total_popped: u64,
    pub positive_popped: u64,
    pub negative_popped: u64,
    pub total_score: u64,
    pub total_stars_earned: u32,
    /// Unix timestamp (ms) of the last finished session
    pub last_played_ms: f64,
}

/// On-disk layout; map keys are strings for flat key-value stores
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct SaveData {
    unlocked_levels: Vec<u32>,
    completed_levels: Vec<u32>,
    level_failures: BTreeMap<String, u32>,
    selected_level: u32,
    level_stars: BTreeMap<String, u8>,
    lifetime_stats: LifetimeStats,
}

/// Progression record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "SaveData", into = "SaveData")]
pub struct ProgressionState {
    pub unlocked_levels: BTreeSet<u32>,
    pub completed_levels: BTreeSet<u32>,
    pub level_failure_counts: BTreeMap<u32, u32>,
    pub best_stars: BTreeMap<u32, u8>,
    pub selected_level: u32,
    pub lifetime: LifetimeStats,
}

impl Default for ProgressionState {
    fn default() -> Self {
        Self {
            unlocked_levels: BTreeSet::from([1]),
            completed_levels: BTreeSet::new(),
            level_failure_counts: BTreeMap::new(),
            best_stars: BTreeMap::new(),
            selected_level: 1,
            lifetime: LifetimeStats::default(),
        }
    }
}

impl ProgressionState {
    pub fn max_unlocked(&self) -> u32 {
        self.unlocked_levels.last().copied().unwrap_or(1)
    }

    /// Restore the invariants a loaded (or edited) record must hold
    fn sanitize(&mut self) {
        self.unlocked_levels.retain(|&l| level::is_valid(l));
        self.completed_levels.retain(|&l| level::is_valid(l));
        self.level_failure_counts
            .retain(|&l, count| level::is_valid(l) && *count > 0);
        self.best_stars
            .retain(|&l, stars| level::is_valid(l) && *stars > 0);
        for stars in self.best_stars.values_mut() {
            *stars = (*stars).min(3);
        }
        self.unlocked_levels.insert(1);
        if !self.unlocked_levels.contains(&self.selected_level) {
            self.selected_level = self.max_unlocked();
        }
    }
}

fn parse_level_map<V>(map: BTreeMap<String, V>) -> BTreeMap<u32, V> {
    map.into_iter()
        .filter_map(|(key, value)| key.trim().parse::<u32>().ok().map(|l| (l, value)))
        .collect()
}

impl From<SaveData> for ProgressionState {
    fn from(data: SaveData) -> Self {
        let mut state = Self {
            unlocked_levels: data.unlocked_levels.into_iter().collect(),
            completed_levels: data.completed_levels.into_iter().collect(),
            level_failure_counts: parse_level_map(data.level_failures),
            best_stars: parse_level_map(data.level_stars),
            selected_level: data.selected_level,
            lifetime: data.lifetime_stats,
        };
        state.sanitize();
        state
    }
}

impl From<ProgressionState> for SaveData {
    fn from(state: ProgressionState) -> Self {
        Self {
            unlocked_levels: state.unlocked_levels.into_iter().collect(),
            completed_levels: state.completed_levels.into_iter().collect(),
            level_failures: state
                .level_failure_counts
                .into_iter()
                .map(|(l, count)| (l.to_string(), count))
                .collect(),
            selected_level: state.selected_level,
            level_stars: state
                .best_stars
                .into_iter()
                .map(|(l, stars)| (l.to_string(), stars))
                .collect(),
            lifetime_stats: state.lifetime,
        }
    }
}

/// Owns the progression record and its store
pub struct ProgressionTracker<S: Store> {
    state: ProgressionState,
    store: S,
    debouncer: SaveDebouncer,
}

impl<S: Store> ProgressionTracker<S> {
    /// Store key for the progression record
    pub const STORAGE_KEY: &'static str = "balloon_pop_progress";

    /// Load progression, falling back to a fresh record on any problem
    pub fn load(store: S, save_debounce_secs: f32) -> Self {
        let state = match load_json::<ProgressionState>(&store, Self::STORAGE_KEY) {
            Ok(Some(state)) => {
                log::info!(
                    "Loaded progression: {} unlocked, {} completed",
                    state.unlocked_levels.len(),
                    state.completed_levels.len()
                );
                state
            }
            Ok(None) => {
                log::info!("No progression found, starting fresh");
                ProgressionState::default()
            }
            Err(e) => {
                log::warn!("Discarding unreadable progression: {}", e);
                ProgressionState::default()
            }
        };
        Self {
            state,
            store,
            debouncer: SaveDebouncer::new(save_debounce_secs),
        }
    }

    pub fn state(&self) -> &ProgressionState {
        &self.state
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn unlocked_levels(&self) -> &BTreeSet<u32> {
        &self.state.unlocked_levels
    }

    pub fn completed_levels(&self) -> &BTreeSet<u32> {
        &self.state.completed_levels
    }

    pub fn is_unlocked(&self, level: u32) -> bool {
        self.state.unlocked_levels.contains(&level)
    }

    /// Best star rating for a level (0 if never completed)
    pub fn best_stars(&self, level: u32) -> u8 {
        self.state.best_stars.get(&level).copied().unwrap_or(0)
    }

    pub fn failure_count(&self, level: u32) -> u32 {
        self.state
            .level_failure_counts
            .get(&level)
            .copied()
            .unwrap_or(0)
    }

    pub fn selected_level(&self) -> u32 {
        self.state.selected_level
    }

    pub fn lifetime(&self) -> &LifetimeStats {
        &self.state.lifetime
    }

    /// Select a level; locked or out-of-range levels are ignored
    pub fn select_level(&mut self, level: u32) -> bool {
        if !self.is_unlocked(level) {
            log::debug!("Ignoring selection of locked level {}", level);
            return false;
        }
        if self.state.selected_level != level {
            self.state.selected_level = level;
            self.debouncer.mark_dirty();
        }
        true
    }

    /// Record a completed level
    pub fn complete_level(&mut self, level: u32, stars: u8, stats: &SessionStats) {
        if !level::is_valid(level) {
            log::warn!("Ignoring completion of invalid level {}", level);
            return;
        }
        let stars = stars.clamp(1, 3);

        self.state.completed_levels.insert(level);
        let best = self.state.best_stars.entry(level).or_insert(0);
        if stars > *best {
            *best = stars;
        }
        if level < MAX_LEVEL && self.state.unlocked_levels.insert(level + 1) {
            log::info!("Level {} unlocked", level + 1);
        }
        self.state.level_failure_counts.remove(&level);

        let lifetime = &mut self.state.lifetime;
        lifetime.sessions_completed += 1;
        lifetime.total_stars_earned += stars as u32;
        self.record_session(stats);
    }

    /// Record a failed attempt; repeated failures lock the previous level
    pub fn fail_level(&mut self, level: u32) {
        if !level::is_valid(level) {
            log::warn!("Ignoring failure of invalid level {}", level);
            return;
        }
        let count = self.state.level_failure_counts.entry(level).or_insert(0);
        *count += 1;
        let count = *count;
        self.debouncer.mark_dirty();

        if level > 1 && count >= FAILURES_BEFORE_LOCK {
            let previous = level - 1;
            log::info!(
                "Level {} failed {} times in a row, locking level {}",
                level,
                count,
                previous
            );
            // Level 1 can lose its completion but never its unlock
            if previous > 1 {
                self.state.unlocked_levels.remove(&previous);
            }
            self.state.completed_levels.remove(&previous);
            self.state.level_failure_counts.remove(&level);

            if !self.is_unlocked(self.state.selected_level) {
                self.state.selected_level = self.state.max_unlocked();
            }
        }
    }

    /// Apply a finished session and persist immediately
    pub fn apply_outcome(&mut self, outcome: &SessionOutcome, now_ms: f64) {
        match outcome.kind {
            OutcomeKind::Completed => {
                self.complete_level(outcome.level, outcome.stars, &outcome.stats);
            }
            OutcomeKind::Failed => {
                self.fail_level(outcome.level);
                self.state.lifetime.sessions_failed += 1;
                self.record_session(&outcome.stats);
            }
        }
        self.state.lifetime.total_score += outcome.score as u64;
        self.state.lifetime.last_played_ms = now_ms;
        // flush logs its own failures and stays dirty for the next tick
        let _ = self.flush();
    }

    fn record_session(&mut self, stats: &SessionStats) {
        let lifetime = &mut self.state.lifetime;
        lifetime.sessions_played += 1;
        lifetime.total_popped += stats.total_popped as u64;
        lifetime.positive_popped += stats.positive_popped as u64;
        lifetime.negative_popped += stats.negative_popped as u64;
        self.debouncer.mark_dirty();
    }

    /// Wipe all progress back to a fresh record
    pub fn reset_progress(&mut self) {
        log::info!("Progression reset");
        self.state = ProgressionState::default();
        self.debouncer.mark_dirty();
    }

    /// Advance the save debouncer; writes when the quiet period has passed
    pub fn tick(&mut self, dt: f32) {
        if self.debouncer.tick(dt) {
            let _ = self.flush();
        }
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.debouncer.is_dirty()
    }

    /// Write now (session end, app backgrounded); stays dirty on failure
    pub fn flush(&mut self) -> Result<(), StoreError> {
        match save_json(&mut self.store, Self::STORAGE_KEY, &self.state) {
            Ok(()) => {
                self.debouncer.clear();
                log::info!("Progression saved");
                Ok(())
            }
            Err(e) => {
                log::warn!("Failed to save progression: {}", e);
                self.debouncer.mark_dirty();
                Err(e)
            }
        }
    }
}
