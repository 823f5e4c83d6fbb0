//! Player preferences
//!
//! Persisted separately from progression. Only affects the feedback side
//! channel, never score or time.

use serde::{Deserialize, Serialize};

use crate::persistence::{Store, load_json, save_json};

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Feedback channels ===
    /// Pop/result sound effects
    pub sound: bool,
    /// Vibration on pops and results
    pub haptics: bool,
    /// Particle bursts on pops
    pub particles: bool,

    // === Audio ===
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,

    /// Seconds left at which the low-time warning starts
    pub low_time_warning_secs: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sound: true,
            haptics: true,
            particles: true,
            master_volume: 0.8,
            sfx_volume: 1.0,
            low_time_warning_secs: 5,
        }
    }
}

impl Settings {
    /// Store key
    pub const STORAGE_KEY: &'static str = "balloon_pop_settings";

    /// Volume actually applied to sound effects
    pub fn effective_sfx_volume(&self) -> f32 {
        if !self.sound {
            0.0
        } else {
            (self.master_volume * self.sfx_volume).clamp(0.0, 1.0)
        }
    }

    /// Load settings, defaulting on a missing or unreadable record
    pub fn load(store: &impl Store) -> Self {
        match load_json::<Settings>(store, Self::STORAGE_KEY) {
            Ok(Some(settings)) => {
                log::info!("Loaded settings");
                settings
            }
            Ok(None) => {
                log::info!("Using default settings");
                Self::default()
            }
            Err(e) => {
                log::warn!("Using default settings ({})", e);
                Self::default()
            }
        }
    }

    pub fn save(&self, store: &mut impl Store) {
        match save_json(store, Self::STORAGE_KEY, self) {
            Ok(()) => log::info!("Settings saved"),
            Err(e) => log::warn!("Failed to save settings: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;

    #[test]
    fn test_effective_volume() {
        let mut settings = Settings::default();
        assert!((settings.effective_sfx_volume() - 0.8).abs() < 1e-6);
        settings.sound = false;
        assert_eq!(settings.effective_sfx_volume(), 0.0);
    }

    #[test]
    fn test_save_and_load() {
        let mut store = MemoryStore::new();
        assert_eq!(Settings::load(&store), Settings::default());

        let settings = Settings {
            haptics: false,
            ..Default::default()
        };
        settings.save(&mut store);
        assert_eq!(Settings::load(&store), settings);
    }

    #[test]
    fn test_partial_record_keeps_defaults() {
        let mut store = MemoryStore::new();
        store
            .write(Settings::STORAGE_KEY, r#"{ "particles": false }"#)
            .unwrap();
        let settings = Settings::load(&store);
        assert!(!settings.particles);
        assert!(settings.sound);
    }
}
