//! Browser bindings
//!
//! The page owns rendering and input; it calls `tick` from its animation
//! frame and reads state, balloons and events back as JSON.

use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::feedback::{FeedbackCue, FeedbackSink};
use crate::host::GameHost;
use crate::persistence::Store;
use crate::platform;
use crate::sim::{BalloonId, SessionEvent, Viewport};
use crate::tuning::Tuning;

#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_err() {
        web_sys::console::warn_1(&"Logger already initialized".into());
    }
    log::info!("Balloon Pop (web) ready");
}

fn js_err(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, JsValue> {
    serde_json::to_string(value).map_err(js_err)
}

/// Collects cues so the page can play them after a frame
#[derive(Default)]
struct CueBuffer(Vec<FeedbackCue>);

impl FeedbackSink for CueBuffer {
    fn emit(&mut self, cue: FeedbackCue) {
        self.0.push(cue);
    }
}

#[derive(Serialize)]
struct Frame {
    events: Vec<SessionEvent>,
    cues: Vec<FeedbackCue>,
}

#[wasm_bindgen]
pub struct WebGame {
    host: GameHost<Box<dyn Store>>,
}

#[wasm_bindgen]
impl WebGame {
    /// `tuning_json` overrides balance values; bad JSON falls back to defaults
    #[wasm_bindgen(constructor)]
    pub fn new(width: f32, height: f32, tuning_json: Option<String>) -> WebGame {
        let tuning = match tuning_json.as_deref().map(Tuning::from_json) {
            Some(Ok(tuning)) => tuning,
            Some(Err(e)) => {
                log::warn!("Ignoring tuning: {}", e);
                Tuning::default()
            }
            None => Tuning::default(),
        };
        let seed = platform::now_ms() as u64;
        WebGame {
            host: GameHost::new(
                platform::default_store(),
                seed,
                tuning,
                Viewport::new(width, height),
            ),
        }
    }

    /// Screen size and the UI bands balloons must stay clear of
    pub fn resize(&mut self, width: f32, height: f32, header: f32, stats: f32, controls: f32) {
        self.host
            .set_viewport(Viewport::new(width, height).with_bands(header, stats, controls));
    }

    pub fn select_level(&mut self, level: u32) -> bool {
        self.host.select_level(level)
    }

    pub fn selected_level(&self) -> u32 {
        self.host.progression().selected_level()
    }

    pub fn setup(&mut self, level: u32) -> Result<(), JsValue> {
        self.host.setup(level).map_err(js_err)
    }

    pub fn start(&mut self) -> Result<(), JsValue> {
        self.host.start().map_err(js_err)
    }

    pub fn retry(&mut self) -> Result<(), JsValue> {
        self.host.retry().map_err(js_err)
    }

    pub fn stop(&mut self) {
        self.host.stop();
    }

    pub fn tick(&mut self, dt: f32) {
        self.host.tick(dt);
    }

    pub fn pop(&mut self, generation: u32, serial: u32) -> bool {
        self.host.pop(BalloonId { generation, serial })
    }

    pub fn state_json(&self) -> Result<String, JsValue> {
        to_json(self.host.engine().state())
    }

    pub fn balloons_json(&self) -> Result<String, JsValue> {
        to_json(self.host.engine().balloons())
    }

    /// Events since the last call plus the feedback cues they produced
    pub fn drain_events_json(&mut self) -> Result<String, JsValue> {
        let mut cues = CueBuffer::default();
        let events = self.host.drain_events(&mut cues);
        to_json(&Frame {
            events,
            cues: cues.0,
        })
    }

    pub fn progression_json(&self) -> Result<String, JsValue> {
        to_json(self.host.progression().state())
    }

    pub fn apply_outcome(&mut self) -> bool {
        self.host.apply_outcome()
    }

    pub fn flush(&mut self) -> Result<(), JsValue> {
        self.host.flush().map_err(js_err)
    }
}
