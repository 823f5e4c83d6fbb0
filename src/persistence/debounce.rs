//! Debounced save scheduling
//!
//! Callers mark state dirty as often as they like; a save becomes due once
//! `delay` seconds pass without another change.

#[derive(Debug, Clone)]
pub struct SaveDebouncer {
    delay: f32,
    /// Seconds until the pending save is due (None = clean)
    pending: Option<f32>,
}

impl SaveDebouncer {
    pub fn new(delay_secs: f32) -> Self {
        Self {
            delay: delay_secs.max(0.0),
            pending: None,
        }
    }

    /// Record a change, restarting the quiet period
    pub fn mark_dirty(&mut self) {
        self.pending = Some(self.delay);
    }

    pub fn is_dirty(&self) -> bool {
        self.pending.is_some()
    }

    /// Advance time; returns true when a save is due (and clears the flag)
    pub fn tick(&mut self, dt: f32) -> bool {
        match self.pending {
            Some(remaining) if remaining - dt <= 0.0 => {
                self.pending = None;
                true
            }
            Some(remaining) => {
                self.pending = Some(remaining - dt);
                false
            }
            None => false,
        }
    }

    /// Clear the flag after an out-of-band save
    pub fn clear(&mut self) {
        self.pending = None;
    }
}
