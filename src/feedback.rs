//! Fire-and-forget feedback cues (sound, haptics, particles)
//!
//! Cues are derived from session events after the fact, so whatever a sink
//! does can never feed back into score or time.

use glam::Vec2;
use serde::Serialize;

use crate::settings::Settings;
use crate::sim::{Polarity, SessionEvent};

/// Output device a cue is meant for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Sound,
    Haptic,
    Particles,
}

/// Feedback cue types
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum FeedbackCue {
    /// Balloon popped
    PopSound(Polarity),
    /// Short buzz on a pop
    PopHaptic(Polarity),
    /// Particle burst at the pop position
    Burst { pos: Vec2, polarity: Polarity },
    /// Countdown tick while time is low
    LowTimeTick { time_remaining: u32 },
    /// Level cleared
    LevelComplete { stars: u8 },
    /// Time ran out
    LevelFailed,
    /// Success/failure rumble
    ResultHaptic { success: bool },
}

impl FeedbackCue {
    pub fn channel(&self) -> Channel {
        match self {
            FeedbackCue::PopSound(_)
            | FeedbackCue::LowTimeTick { .. }
            | FeedbackCue::LevelComplete { .. }
            | FeedbackCue::LevelFailed => Channel::Sound,
            FeedbackCue::PopHaptic(_) | FeedbackCue::ResultHaptic { .. } => Channel::Haptic,
            FeedbackCue::Burst { .. } => Channel::Particles,
        }
    }
}

/// Receives cues; implementations must not block
pub trait FeedbackSink {
    fn emit(&mut self, cue: FeedbackCue);
}

/// Discards every cue
#[derive(Debug, Default, Clone, Copy)]
pub struct NullFeedback;

impl FeedbackSink for NullFeedback {
    fn emit(&mut self, _cue: FeedbackCue) {}
}

/// Logs cues at debug level (headless runs)
#[derive(Debug, Default, Clone, Copy)]
pub struct LogFeedback;

impl FeedbackSink for LogFeedback {
    fn emit(&mut self, cue: FeedbackCue) {
        log::debug!("feedback: {:?}", cue);
    }
}

/// Cues for a single event, before channel filtering
pub fn cues_for(event: &SessionEvent, settings: &Settings) -> Vec<FeedbackCue> {
    match event {
        SessionEvent::BalloonPopped { pos, polarity, .. } => vec![
            FeedbackCue::PopSound(*polarity),
            FeedbackCue::PopHaptic(*polarity),
            FeedbackCue::Burst {
                pos: *pos,
                polarity: *polarity,
            },
        ],
        SessionEvent::TimeChanged { time_remaining }
            if *time_remaining > 0 && *time_remaining <= settings.low_time_warning_secs =>
        {
            vec![FeedbackCue::LowTimeTick {
                time_remaining: *time_remaining,
            }]
        }
        SessionEvent::Completed { stars } => vec![
            FeedbackCue::LevelComplete { stars: *stars },
            FeedbackCue::ResultHaptic { success: true },
        ],
        SessionEvent::Failed { .. } => vec![
            FeedbackCue::LevelFailed,
            FeedbackCue::ResultHaptic { success: false },
        ],
        _ => Vec::new(),
    }
}

fn channel_enabled(channel: Channel, settings: &Settings) -> bool {
    match channel {
        Channel::Sound => settings.effective_sfx_volume() > 0.0,
        Channel::Haptic => settings.haptics,
        Channel::Particles => settings.particles,
    }
}

/// Forward the cues for `events` to `sink`, honoring the player's settings
///
/// Returns the number of cues emitted.
pub fn dispatch(events: &[SessionEvent], settings: &Settings, sink: &mut dyn FeedbackSink) -> usize {
    let mut emitted = 0;
    for event in events {
        for cue in cues_for(event, settings) {
            if channel_enabled(cue.channel(), settings) {
                sink.emit(cue);
                emitted += 1;
            }
        }
    }
    emitted
}
