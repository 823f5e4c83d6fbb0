//! Spawn placement with anti-clustering
//!
//! A grid of candidate points is computed once per session and shuffled.
//! Placement walks the grid with a rolling cursor and skips candidates that
//! sit too close to recently used points, but only for a bounded number of
//! attempts: the placer always returns a position.

use std::collections::VecDeque;

use glam::Vec2;
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::consts::MAX_SPAWN_CANDIDATES;
use crate::tuning::Tuning;

/// Screen size plus the bands reserved for UI chrome
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
    /// Title/back-button band at the top
    pub header_height: f32,
    /// Score/timer band below the header
    pub stats_height: f32,
    /// Bottom controls band
    pub controls_height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            header_height: 0.0,
            stats_height: 0.0,
            controls_height: 0.0,
        }
    }

    pub fn with_bands(mut self, header: f32, stats: f32, controls: f32) -> Self {
        self.header_height = header;
        self.stats_height = stats;
        self.controls_height = controls;
        self
    }

    /// Rectangle balloons may spawn in, inset by `margin`
    ///
    /// Returns `None` when the bands and margin leave no room, or when the
    /// area is not finite.
    pub fn safe_area(&self, margin: f32) -> Option<(Vec2, Vec2)> {
        let min = Vec2::new(margin, self.header_height + self.stats_height + margin);
        let max = Vec2::new(
            self.width - margin,
            self.height - self.controls_height - margin,
        );
        if (max - min).is_finite() && min.x <= max.x && min.y <= max.y {
            Some((min, max))
        } else {
            None
        }
    }

    /// Screen center (origin if the size is not finite)
    pub fn center(&self) -> Vec2 {
        let center = Vec2::new(self.width / 2.0, self.height / 2.0);
        if center.is_finite() { center } else { Vec2::ZERO }
    }
}

/// A position handed out by the placer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub pos: Vec2,
    /// True when the attempt budget ran out and the distance rule was skipped
    pub relaxed: bool,
}

/// Hands out spawn positions for one session
#[derive(Debug, Clone)]
pub struct SpawnPlacer {
    candidates: Vec<Vec2>,
    cursor: usize,
    recent: VecDeque<Vec2>,
    min_distance: f32,
    recent_window: usize,
    attempts: u32,
}

impl SpawnPlacer {
    /// Build and shuffle the candidate grid for a viewport
    pub fn precompute<R: Rng>(viewport: &Viewport, tuning: &Tuning, rng: &mut R) -> Self {
        let mut candidates = Vec::new();

        match viewport.safe_area(tuning.edge_margin) {
            Some((min, max)) => {
                let extent = max - min;
                let mut spacing = tuning.grid_spacing.max(1.0);
                let (cols, rows) = loop {
                    let cols = (extent.x / spacing).floor() + 1.0;
                    let rows = (extent.y / spacing).floor() + 1.0;
                    if cols * rows <= MAX_SPAWN_CANDIDATES as f32 {
                        break (cols as usize, rows as usize);
                    }
                    spacing *= 2.0;
                };
                if spacing > tuning.grid_spacing {
                    log::debug!("Spawn grid spacing widened to {}", spacing);
                }
                candidates.reserve(cols * rows);
                for row in 0..rows {
                    for col in 0..cols {
                        candidates.push(Vec2::new(
                            min.x + col as f32 * spacing,
                            min.y + row as f32 * spacing,
                        ));
                    }
                }
            }
            None => {
                log::warn!(
                    "Viewport {}x{} leaves no safe spawn area, using center",
                    viewport.width,
                    viewport.height
                );
                candidates.push(viewport.center());
            }
        }

        candidates.shuffle(rng);
        log::debug!("Precomputed {} spawn candidates", candidates.len());

        Self {
            candidates,
            cursor: 0,
            recent: VecDeque::with_capacity(tuning.recent_window),
            min_distance: tuning.min_spawn_distance,
            recent_window: tuning.recent_window.max(1),
            attempts: tuning.placement_attempts.max(1),
        }
    }

    /// Forget recently used positions and rewind the cursor
    pub fn reset(&mut self) {
        self.cursor = 0;
        self.recent.clear();
    }

    pub fn candidate_count(&self) -> usize {
        self.candidates.len()
    }

    /// Positions handed out most recently (oldest first)
    pub fn recent(&self) -> impl Iterator<Item = Vec2> + '_ {
        self.recent.iter().copied()
    }

    /// Pick the next spawn position
    pub fn next_position(&mut self) -> Placement {
        let mut placement = None;
        for _ in 0..self.attempts {
            let candidate = self.advance();
            if self.is_clear(candidate) {
                placement = Some(Placement {
                    pos: candidate,
                    relaxed: false,
                });
                break;
            }
        }

        let placement = placement.unwrap_or_else(|| Placement {
            pos: self.advance(),
            relaxed: true,
        });

        self.recent.push_back(placement.pos);
        while self.recent.len() > self.recent_window {
            self.recent.pop_front();
        }
        placement
    }

    fn advance(&mut self) -> Vec2 {
        let pos = self.candidates[self.cursor];
        self.cursor = (self.cursor + 1) % self.candidates.len();
        pos
    }

    fn is_clear(&self, candidate: Vec2) -> bool {
        self.recent
            .iter()
            .all(|used| used.distance(candidate) >= self.min_distance)
    }
}
