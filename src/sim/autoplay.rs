//! Idle/demo mode - a bot that plays a session through the public API
//!
//! Used by the headless binary and by tests that need a realistic player.

use super::session::SessionEngine;
use super::state::{BalloonId, Polarity, SessionPhase};

/// Simple bot: every `reaction_secs` it pops the most valuable positive
/// balloon, preferring the one closest to floating away
#[derive(Debug, Clone)]
pub struct AutoPlayer {
    reaction_secs: f32,
    cooldown: f32,
}

impl AutoPlayer {
    pub fn new(reaction_secs: f32) -> Self {
        Self {
            reaction_secs: reaction_secs.max(0.0),
            cooldown: reaction_secs.max(0.0),
        }
    }

    /// Let the bot act after `dt` seconds; returns the balloon it popped
    pub fn update(&mut self, engine: &mut SessionEngine, dt: f32) -> Option<BalloonId> {
        if engine.phase() != SessionPhase::Active {
            return None;
        }
        self.cooldown -= dt;
        if self.cooldown > 0.0 {
            return None;
        }

        let target = engine
            .balloons()
            .iter()
            .filter(|b| b.polarity == Polarity::Positive)
            .max_by(|a, b| {
                a.points.cmp(&b.points).then(
                    b.expires_at()
                        .partial_cmp(&a.expires_at())
                        .unwrap_or(std::cmp::Ordering::Equal),
                )
            })
            .map(|b| b.id)?;

        engine.pop(target);
        self.cooldown = self.reaction_secs;
        Some(target)
    }
}
